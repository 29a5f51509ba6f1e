//! `dtrack` binary

use std::path::PathBuf;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let matches = dtrack_cli::cli().get_matches();

    let config = dtrack_cli::load_config(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    dtrack_cli::init_logging(&config.logging)?;
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "dtrack starting");

    dtrack_cli::run(&matches, &config).await
}
