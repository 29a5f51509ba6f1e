//! dtrack service layer
//!
//! Wires the sequence allocator and the progress validator to a store, a
//! shared reference cache and TOML configuration, and exposes every editing
//! grid callback as a typed [`GridRequest`].
//!
//! # Architecture
//!
//! ```text
//! GridRequest ──► TrackerService ──┬─► SequenceAllocator ──► SequenceSource
//!                                  ├─► ProgressValidator
//!                                  ├─► ReferenceCache (gates, single flight)
//!                                  └─► TrackerStore
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use dtrack_core::prelude::*;
//!
//! let (service, store) = TrackerService::in_memory(TrackerConfig::default());
//! let response = service
//!     .handle(GridRequest::Init { sequence: "projects".into(), scope: None })
//!     .await?;
//! assert_eq!(response, GridResponse::Defaults { number: "01".into() });
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod config;
pub mod error;
pub mod grid;
pub mod service;
pub mod store;

pub use cache::{CacheStats, ReferenceCache, ResourceKey};
pub use config::{
    BackendConfig, CacheConfig, LoggingConfig, ProgressConfig, SequenceConfig, TrackerConfig,
};
pub use error::{CacheError, ConfigError, StoreError, TrackerError, TrackerResult};
pub use grid::{GridRequest, GridResponse};
pub use service::TrackerService;
pub use store::{InMemoryStore, TrackerStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::TrackerConfig;
    pub use crate::error::{TrackerError, TrackerResult};
    pub use crate::grid::{GridRequest, GridResponse};
    pub use crate::service::TrackerService;
    pub use crate::store::{InMemoryStore, TrackerStore};
    pub use dtrack_model::{DeliverableId, DeliverablePatch, DeliverableRecord, Gate, GateSet};
    pub use dtrack_progress::ValidationOutcome;
}
