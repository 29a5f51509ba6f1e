//! Sequence source errors

/// Failure to read from a sequence source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Base URL or endpoint could not be turned into a request URL
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Network-level failure
    #[error("transport error for '{endpoint}': {message}")]
    Transport { endpoint: String, message: String },

    /// Backend answered with a non-success status
    #[error("'{endpoint}' returned status {status}")]
    Status { endpoint: String, status: u16 },

    /// Response body was not a collection
    #[error("could not decode response from '{endpoint}': {message}")]
    Decode { endpoint: String, message: String },

    /// Collection is not known to the source
    #[error("unknown collection: '{0}'")]
    UnknownCollection(String),
}

impl SourceError {
    /// Create transport error for endpoint
    pub fn transport(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// Create decode error for endpoint
    pub fn decode(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// Check if the failure is an authorization rejection
    #[inline]
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}
