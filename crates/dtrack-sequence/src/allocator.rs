//! Next-value suggestion for a sequence field

use crate::query::{SequenceFilter, SequenceQuery};
use crate::source::SequenceSource;
use dtrack_model::record_field_text;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn default_pad_length() -> usize {
    2
}

fn default_start_from() -> String {
    "01".to_string()
}

/// Where a sequence lives and how its values are formatted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocatorSpec {
    /// Collection locator
    pub endpoint: String,
    /// Sequence field
    pub field: String,
    /// Minimum width of the suggestion, zero-padded
    #[serde(default = "default_pad_length")]
    pub pad_length: usize,
    /// Suggestion when nothing can be inferred
    #[serde(default = "default_start_from")]
    pub start_from: String,
    /// Optional scope, e.g. the parent project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<SequenceFilter>,
}

impl AllocatorSpec {
    /// Spec with pad length 2 and start value `"01"`
    #[must_use]
    pub fn new(endpoint: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            field: field.into(),
            pad_length: default_pad_length(),
            start_from: default_start_from(),
            filter: None,
        }
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

    /// With scope filter
    #[inline]
    #[must_use]
    pub fn with_filter(mut self, filter: SequenceFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// The "highest row first, one row" query for this sequence
    #[must_use]
    pub fn query(&self) -> SequenceQuery {
        SequenceQuery::latest(&self.endpoint, &self.field).with_filter(self.filter.clone())
    }
}

/// Longest run of ASCII digits in `value`; the rightmost run wins ties
///
/// ```rust
/// use dtrack_sequence::extract_digits;
///
/// assert_eq!(extract_digits("AREA-04"), Some("04"));
/// assert_eq!(extract_digits("P1-07"), Some("07"));
/// assert_eq!(extract_digits("ABC"), None);
/// ```
#[must_use]
pub fn extract_digits(value: &str) -> Option<&str> {
    let bytes = value.as_bytes();
    let mut best: Option<(usize, usize)> = None;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if best.map_or(true, |(s, e)| i - start >= e - s) {
                best = Some((start, i));
            }
        } else {
            i += 1;
        }
    }
    // ASCII digit boundaries are always char boundaries
    best.map(|(s, e)| &value[s..e])
}

/// Increment a digit string and left-pad with `'0'` to at least `pad_length`
///
/// Returns `None` if `digits` is not a base-10 number or the increment would
/// overflow. Wider results are never truncated.
#[must_use]
pub fn increment_padded(digits: &str, pad_length: usize) -> Option<String> {
    let next = digits.parse::<u128>().ok()?.checked_add(1)?;
    Some(format!("{next:0pad_length$}"))
}

/// Suggests the next value of one sequence field
///
/// Each call performs a single lookup; nothing is cached or reserved. Callers
/// re-invoke [`SequenceAllocator::compute_next`] after inserting or removing
/// rows of the same collection.
#[derive(Clone)]
pub struct SequenceAllocator {
    source: Arc<dyn SequenceSource>,
    spec: AllocatorSpec,
}

impl std::fmt::Debug for SequenceAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceAllocator")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl SequenceAllocator {
    /// Create allocator over a source
    #[inline]
    #[must_use]
    pub fn new(source: Arc<dyn SequenceSource>, spec: AllocatorSpec) -> Self {
        Self { source, spec }
    }

    /// Sequence description
    #[inline]
    #[must_use]
    pub fn spec(&self) -> &AllocatorSpec {
        &self.spec
    }

    /// Suggest the next value
    ///
    /// Falls back to `start_from` when the collection is empty, the latest
    /// value has no digits, or the lookup fails. Lookup failures are logged,
    /// never returned.
    #[tracing::instrument(
        level = "debug",
        skip(self),
        fields(endpoint = %self.spec.endpoint, field = %self.spec.field)
    )]
    pub async fn compute_next(&self) -> String {
        let query = self.spec.query();
        let rows = match self.source.fetch(&query).await {
            Ok(rows) => rows,
            Err(error) if error.is_unauthorized() => {
                tracing::warn!(%error, "sequence lookup not authorized, check the bearer token");
                return self.spec.start_from.clone();
            }
            Err(error) => {
                tracing::warn!(%error, "sequence lookup failed, suggesting start value");
                return self.spec.start_from.clone();
            }
        };

        let Some(latest) = rows
            .first()
            .and_then(|row| record_field_text(row, &self.spec.field))
        else {
            tracing::debug!("no existing value");
            return self.spec.start_from.clone();
        };

        let Some(digits) = extract_digits(&latest) else {
            tracing::debug!(%latest, "latest value has no digits");
            return self.spec.start_from.clone();
        };

        match increment_padded(digits, self.spec.pad_length) {
            Some(next) => {
                tracing::debug!(%latest, %next, "suggested next value");
                next
            }
            None => {
                tracing::warn!(%latest, "latest value too large to increment");
                self.spec.start_from.clone()
            }
        }
    }
}
