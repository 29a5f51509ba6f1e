//! `dtrack` command line
//!
//! ```text
//! dtrack [--config dtrack.toml] next-number --sequence areas --scope P-12
//! dtrack [--config dtrack.toml] validate --input edit.json
//! dtrack [--config dtrack.toml] check-config
//! ```
//!
//! Results go to stdout, logs to stderr.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use anyhow::Context;
use clap::{value_parser, Arg, ArgMatches, Command};
use dtrack_core::{LoggingConfig, TrackerConfig};
use dtrack_model::{Gate, GateSet};
use dtrack_progress::{ProgressValidator, ValidationOutcome, ValidationRequest};
use dtrack_sequence::{ODataSequenceSource, SequenceAllocator};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Document read by `dtrack validate`
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateInput {
    /// Edit to judge
    pub request: ValidationRequest,
    /// Known gates
    #[serde(default)]
    pub gates: Vec<Gate>,
}

/// Build the command definition
#[must_use]
pub fn cli() -> Command {
    Command::new("dtrack")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Deliverable tracking: sequence suggestions and progress validation")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file; defaults apply when omitted"),
        )
        .subcommand(
            Command::new("next-number")
                .about("Suggest the next value of a configured sequence")
                .arg(
                    Arg::new("sequence")
                        .long("sequence")
                        .short('s')
                        .required(true)
                        .help("Sequence name from [sequences.<name>]"),
                )
                .arg(
                    Arg::new("scope")
                        .long("scope")
                        .help("Scope value for scoped sequences, e.g. a project id"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a proposed deliverable edit")
                .arg(
                    Arg::new("input")
                        .long("input")
                        .short('i')
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON file with { request, gates }; '-' reads stdin"),
                ),
        )
        .subcommand(
            Command::new("check-config").about("Validate configuration and print it normalized"),
        )
}

/// Load configuration, falling back to defaults without a path
///
/// # Errors
/// Returns an error if the file cannot be read or is invalid.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<TrackerConfig> {
    match path {
        Some(path) => TrackerConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(TrackerConfig::default()),
    }
}

/// Install the global subscriber; `RUST_LOG` overrides the configured filter
///
/// # Errors
/// Returns an error if the filter does not parse or a subscriber is already set.
pub fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .with_context(|| format!("invalid log filter '{}'", logging.filter))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if logging.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    installed.context("installing log subscriber")
}

/// Query the configured backend for the next value of `sequence`
///
/// The bearer token is read from the variable named by `backend.token_env`.
///
/// # Errors
/// Returns an error for an unknown sequence, a missing scope or a malformed
/// base URL. Lookup failures are not errors; they yield the start value.
pub async fn next_number(
    config: &TrackerConfig,
    sequence: &str,
    scope: Option<&str>,
) -> anyhow::Result<String> {
    let spec = config.allocator_spec(sequence, scope)?;
    let mut source =
        ODataSequenceSource::with_timeout(&config.backend.base_url, config.backend.timeout())?;
    match std::env::var(&config.backend.token_env) {
        Ok(token) => source = source.with_bearer_token(token),
        Err(_) => tracing::debug!(
            variable = %config.backend.token_env,
            "no bearer token set, querying anonymously"
        ),
    }

    let allocator = SequenceAllocator::new(Arc::new(source), spec);
    Ok(allocator.compute_next().await)
}

/// Judge the edit described by a `validate` input document
///
/// # Errors
/// Returns an error if `json` is not a valid input document.
pub fn validate_input(json: &str) -> anyhow::Result<ValidationOutcome> {
    let input: ValidateInput = serde_json::from_str(json).context("parsing validate input")?;
    let gates = GateSet::from(input.gates);
    Ok(ProgressValidator::new().validate(&input.request, &gates))
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Execute the parsed subcommand and write its result to stdout
///
/// # Errors
/// Returns an error if the subcommand fails.
pub async fn run(matches: &ArgMatches, config: &TrackerConfig) -> anyhow::Result<ExitCode> {
    match matches.subcommand() {
        Some(("next-number", args)) => {
            let sequence = args
                .get_one::<String>("sequence")
                .context("--sequence is required")?;
            let scope = args.get_one::<String>("scope").map(String::as_str);
            println!("{}", next_number(config, sequence, scope).await?);
            Ok(ExitCode::SUCCESS)
        }
        Some(("validate", args)) => {
            let path = args
                .get_one::<PathBuf>("input")
                .context("--input is required")?;
            let outcome = validate_input(&read_input(path)?)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(if outcome.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Some(("check-config", _)) => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
        Some((other, _)) => anyhow::bail!("unknown command '{other}'"),
        None => anyhow::bail!("no command given"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn parses_next_number() {
        let matches = cli()
            .try_get_matches_from([
                "dtrack", "next-number", "--sequence", "areas", "--scope", "P1", "-c", "x.toml",
            ])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("config"),
            Some(&PathBuf::from("x.toml"))
        );
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "next-number");
        assert_eq!(args.get_one::<String>("scope").map(String::as_str), Some("P1"));
    }

    #[test]
    fn subcommand_and_sequence_are_required() {
        assert!(cli().try_get_matches_from(["dtrack"]).is_err());
        assert!(cli()
            .try_get_matches_from(["dtrack", "next-number"])
            .is_err());
    }

    #[test]
    fn config_defaults_without_path() {
        assert_eq!(load_config(None).unwrap(), TrackerConfig::default());
    }

    #[test]
    fn config_error_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nmax_capacity = 0").unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().starts_with("loading configuration from"));
        assert!(format!("{err:#}").contains("cache.max_capacity must be positive"));
    }

    #[test]
    fn validate_rejects_below_reported() {
        let outcome = validate_input(
            r#"{
                "request": {
                    "original": { "id": "D-1", "gateId": "IFR", "totalHours": 200 },
                    "patch": { "totalPercentageEarned": 10 },
                    "entries": [ { "period": 1, "units": 40 } ],
                    "currentPeriod": 2
                },
                "gates": [ { "id": "IFR", "maxPercentage": 0.8 } ]
            }"#,
        )
        .unwrap();

        assert!(!outcome.valid);
        assert_eq!(
            outcome.error_text.as_deref(),
            Some(
                "Total earned percentage (10.00%) cannot be less than what's already \
                 reported in previous periods (20.00%)."
            )
        );
    }

    #[test]
    fn validate_accepts_within_bounds() {
        let outcome = validate_input(
            r#"{
                "request": {
                    "original": { "id": "D-1", "gateId": "IFR", "totalHours": 200 },
                    "patch": { "totalPercentageEarned": 0.5 },
                    "currentPeriod": 2
                },
                "gates": [ { "id": "IFR", "maxPercentage": 0.8 } ]
            }"#,
        )
        .unwrap();
        assert!(outcome.valid);
        assert_eq!(outcome.percentage, Some(0.5));
    }

    #[test]
    fn validate_input_must_be_well_formed() {
        assert!(validate_input(r#"{ "gates": [] }"#).is_err());
    }

    #[tokio::test]
    async fn unreachable_backend_yields_start_value() {
        let mut config = TrackerConfig::default().with_base_url("http://127.0.0.1:9/odata");
        config.backend.timeout_secs = 1;

        assert_eq!(next_number(&config, "projects", None).await.unwrap(), "01");
        assert!(next_number(&config, "areas", None).await.is_err());
    }

    #[tokio::test]
    async fn check_config_prints_toml() {
        let matches = cli().try_get_matches_from(["dtrack", "check-config"]).unwrap();
        let code = run(&matches, &TrackerConfig::default()).await.unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }
}
