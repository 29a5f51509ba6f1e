//! Service configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! [backend]
//! base_url = "https://tracker.example.com/odata"
//! token_env = "DTRACK_TOKEN"
//!
//! [progress]
//! current_period = 14
//!
//! [sequences.areas]
//! endpoint = "Areas"
//! field = "areaNumber"
//! scope_field = "projectId"
//! ```

use crate::error::{ConfigError, TrackerError, TrackerResult};
use dtrack_model::Period;
use dtrack_sequence::{extract_digits, AllocatorSpec, SequenceFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Remote OData service
    pub backend: BackendConfig,
    /// Reference cache sizing
    pub cache: CacheConfig,
    /// Progress tracking
    pub progress: ProgressConfig,
    /// Log output
    pub logging: LoggingConfig,
    /// Named sequences the allocator serves
    pub sequences: BTreeMap<String, SequenceConfig>,
}

impl TrackerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, does not parse, or fails
    /// [`TrackerConfig::validate`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    ///
    /// # Errors
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check semantic constraints
    ///
    /// # Errors
    /// Returns [`ConfigError::Validation`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_capacity == 0 {
            return Err(ConfigError::Validation(
                "cache.max_capacity must be positive".to_string(),
            ));
        }
        for (name, sequence) in &self.sequences {
            sequence
                .validate()
                .map_err(|reason| ConfigError::Validation(format!("sequences.{name}: {reason}")))?;
        }
        Ok(())
    }

    /// Allocator spec for the sequence `name`
    ///
    /// # Errors
    /// [`TrackerError::UnknownSequence`] for an unconfigured name and
    /// [`TrackerError::ScopeRequired`] when a scoped sequence gets no scope.
    pub fn allocator_spec(&self, name: &str, scope: Option<&str>) -> TrackerResult<AllocatorSpec> {
        let sequence = self
            .sequences
            .get(name)
            .ok_or_else(|| TrackerError::UnknownSequence(name.to_string()))?;
        if sequence.scope_field.is_some() && scope.is_none() {
            return Err(TrackerError::ScopeRequired(name.to_string()));
        }
        Ok(sequence.allocator_spec(scope))
    }

    /// With sequence
    #[must_use]
    pub fn with_sequence(mut self, name: impl Into<String>, sequence: SequenceConfig) -> Self {
        self.sequences.insert(name.into(), sequence);
        self
    }

    /// With active reporting period
    #[inline]
    #[must_use]
    pub fn with_current_period(mut self, period: u32) -> Self {
        self.progress.current_period = period;
        self
    }

    /// With backend service root
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.backend.base_url = base_url.into();
        self
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let sequences = BTreeMap::from([
            (
                "areas".to_string(),
                SequenceConfig::new("Areas", "areaNumber").with_scope_field("projectId"),
            ),
            (
                "projects".to_string(),
                SequenceConfig::new("Projects", "projectNumber"),
            ),
        ]);
        Self {
            backend: BackendConfig::default(),
            cache: CacheConfig::default(),
            progress: ProgressConfig::default(),
            logging: LoggingConfig::default(),
            sequences,
        }
    }
}

/// Remote OData service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Service root URL
    pub base_url: String,
    /// Environment variable holding the bearer token
    pub token_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl BackendConfig {
    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/odata".to_string(),
            token_env: "DTRACK_TOKEN".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Reference cache sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached collections
    pub max_capacity: u64,
    /// Entry lifetime in seconds; absent means entries live until invalidated
    pub ttl_secs: Option<u64>,
}

impl CacheConfig {
    /// Entry lifetime
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 1_000,
            ttl_secs: Some(300),
        }
    }
}

/// Progress tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Active reporting period
    pub current_period: u32,
}

impl ProgressConfig {
    /// Active reporting period
    #[inline]
    #[must_use]
    pub fn period(&self) -> Period {
        Period::new(self.current_period)
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { current_period: 1 }
    }
}

/// Log output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `dtrack_sequence=debug`
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

fn default_pad_length() -> usize {
    2
}

fn default_start_from() -> String {
    "01".to_string()
}

/// One named sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Collection locator
    pub endpoint: String,
    /// Sequence field
    pub field: String,
    /// Minimum width of suggestions
    #[serde(default = "default_pad_length")]
    pub pad_length: usize,
    /// Suggestion when nothing can be inferred
    #[serde(default = "default_start_from")]
    pub start_from: String,
    /// Field that scopes the sequence (e.g. parent project)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_field: Option<String>,
}

impl SequenceConfig {
    /// Sequence with default padding and start value
    #[must_use]
    pub fn new(endpoint: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            field: field.into(),
            pad_length: default_pad_length(),
            start_from: default_start_from(),
            scope_field: None,
        }
    }

    /// With scope field
    #[inline]
    #[must_use]
    pub fn with_scope_field(mut self, field: impl Into<String>) -> Self {
        self.scope_field = Some(field.into());
        self
    }

    /// With pad length
    #[inline]
    #[must_use]
    pub fn with_pad_length(mut self, pad_length: usize) -> Self {
        self.pad_length = pad_length;
        self
    }

    /// With start value
    #[inline]
    #[must_use]
    pub fn with_start_from(mut self, start_from: impl Into<String>) -> Self {
        self.start_from = start_from.into();
        self
    }

    fn validate(&self) -> Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("endpoint is empty".to_string());
        }
        if self.field.trim().is_empty() {
            return Err("field is empty".to_string());
        }
        if self.pad_length == 0 {
            return Err("pad_length must be positive".to_string());
        }
        if extract_digits(&self.start_from).is_none() {
            return Err(format!("start_from '{}' contains no digits", self.start_from));
        }
        Ok(())
    }

    /// Scope filter for a scope value, if this sequence is scoped
    #[must_use]
    pub fn scope_filter(&self, scope: &str) -> Option<SequenceFilter> {
        self.scope_field
            .as_ref()
            .map(|field| SequenceFilter::eq(field.as_str(), scope))
    }

    /// Allocator spec, narrowed to `scope` when the sequence is scoped
    #[must_use]
    pub fn allocator_spec(&self, scope: Option<&str>) -> AllocatorSpec {
        let spec = AllocatorSpec::new(&self.endpoint, &self.field)
            .with_pad_length(self.pad_length)
            .with_start_from(&self.start_from);
        match scope.and_then(|s| self.scope_filter(s)) {
            Some(filter) => spec.with_filter(filter),
            None => spec,
        }
    }
}
