//! Error types for the dtrack service layer
//!
//! Validation rejections are not errors: they travel as
//! [`ValidationOutcome`](dtrack_progress::ValidationOutcome) values. The types
//! here cover configuration, storage and cache failures.

use dtrack_model::DeliverableId;
use dtrack_sequence::SourceError;
use std::path::PathBuf;

/// Errors loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or shape error
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Semantically invalid value
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Errors from the persistence collaborator
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Row does not exist
    #[error("{collection} '{key}' not found")]
    NotFound { collection: String, key: String },

    /// Backend rejected or failed the operation
    #[error("backend error: {0}")]
    Backend(String),

    /// Query against a sequence collection failed
    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

/// Errors during reference-cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Cached value has a different type than requested
    #[error("type mismatch for '{key}': expected {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// Loader failed; every caller waiting on the same load sees this
    #[error("loading '{key}' failed: {message}")]
    Load { key: String, message: String },
}

/// Combined service error
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Configuration failure
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Reference cache failure
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// No `[sequences.<name>]` entry
    #[error("unknown sequence: '{0}'")]
    UnknownSequence(String),

    /// Sequence is scoped but the request carried no scope value
    #[error("sequence '{0}' requires a scope value")]
    ScopeRequired(String),

    /// Edited deliverable does not exist
    #[error("deliverable not found: {0}")]
    DeliverableNotFound(DeliverableId),
}

/// Result type alias for service operations
pub type TrackerResult<T> = Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::NotFound {
            collection: "Deliverables".to_string(),
            key: "D-9".to_string(),
        };
        assert_eq!(err.to_string(), "Deliverables 'D-9' not found");
    }

    #[test]
    fn error_conversions() {
        let source = SourceError::UnknownCollection("Areas".to_string());
        let store: StoreError = source.into();
        let tracker: TrackerError = store.into();
        assert!(matches!(tracker, TrackerError::Store(StoreError::Source(_))));
    }

    #[test]
    fn scope_error_display() {
        let err = TrackerError::ScopeRequired("areas".to_string());
        assert_eq!(err.to_string(), "sequence 'areas' requires a scope value");
    }
}
