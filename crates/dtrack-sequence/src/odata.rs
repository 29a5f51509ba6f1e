//! OData collection reader
//!
//! Translates a [`SequenceQuery`] into
//! `GET {base}/{endpoint}?$orderby={field} desc&$top=1&$filter=...` and reads
//! the `value` array of the response.

use crate::error::SourceError;
use crate::query::SequenceQuery;
use crate::source::SequenceSource;
use async_trait::async_trait;
use dtrack_model::Record;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ODataCollection {
    #[serde(default)]
    value: Vec<Record>,
}

/// Sequence source backed by an OData service over HTTPS
#[derive(Debug, Clone)]
pub struct ODataSequenceSource {
    client: reqwest::Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl ODataSequenceSource {
    /// Default request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    /// Create source for a service root such as `https://host/odata`
    ///
    /// # Errors
    /// Returns [`SourceError::InvalidUrl`] if `base_url` does not parse or the
    /// HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, SourceError> {
        Self::with_timeout(base_url, Self::DEFAULT_TIMEOUT)
    }

    /// Create source with an explicit request timeout
    ///
    /// # Errors
    /// See [`ODataSequenceSource::new`].
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let mut root = base_url.trim().to_string();
        if !root.ends_with('/') {
            root.push('/');
        }
        let base_url =
            Url::parse(&root).map_err(|e| SourceError::InvalidUrl(format!("{base_url}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::InvalidUrl(format!("http client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            bearer_token: None,
        })
    }

    /// With bearer token sent as `Authorization`
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Service root
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the request URL for a query
    ///
    /// # Errors
    /// Returns [`SourceError::InvalidUrl`] if the endpoint cannot be joined to
    /// the service root.
    pub fn request_url(&self, query: &SequenceQuery) -> Result<Url, SourceError> {
        let endpoint = query.endpoint.trim_start_matches('/');
        let mut url = self
            .base_url
            .join(endpoint)
            .map_err(|e| SourceError::InvalidUrl(format!("{endpoint}: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("$orderby", &query.order_by());
            pairs.append_pair("$top", &query.top.to_string());
            if let Some(filter) = &query.filter {
                pairs.append_pair("$filter", &filter.to_odata());
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl SequenceSource for ODataSequenceSource {
    async fn fetch(&self, query: &SequenceQuery) -> Result<Vec<Record>, SourceError> {
        let url = self.request_url(query)?;
        tracing::debug!(%url, "querying sequence source");

        let mut request = self.client.get(url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::transport(&query.endpoint, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                endpoint: query.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body: ODataCollection = response
            .json()
            .await
            .map_err(|e| SourceError::decode(&query.endpoint, e))?;
        Ok(body.value)
    }
}
