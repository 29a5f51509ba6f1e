//! Grid operations as explicit request and response messages
//!
//! Each editing-grid callback maps to one [`GridRequest`] variant, so payloads
//! are checked when they are deserialized instead of when a field is first read.
//!
//! ```text
//! Init     -> Defaults   { number }
//! Insert   -> Inserted   { number, nextNumber }
//! Update   -> Updated    { record }     | Rejected { errorText }
//! Remove   -> Removed    { removed, nextNumber }
//! Validate -> Validation { valid, errorText?, percentage? }
//! ```

use dtrack_model::{DeliverableId, DeliverablePatch, DeliverableRecord, Record};
use dtrack_progress::ValidationOutcome;
use serde::{Deserialize, Serialize};

/// Request from an editing grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GridRequest {
    /// New row opened; suggest its sequence number
    Init {
        /// Configured sequence name
        sequence: String,
        /// Scope value for scoped sequences
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<String>,
    },

    /// Row saved as new
    Insert {
        /// Configured sequence name
        sequence: String,
        /// Scope value for scoped sequences
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<String>,
        /// Row contents; the sequence field is filled in when missing
        record: Record,
    },

    /// Existing deliverable edited
    Update {
        /// Edited deliverable
        deliverable_id: DeliverableId,
        /// Changed fields
        patch: DeliverablePatch,
    },

    /// Row deleted
    Remove {
        /// Configured sequence name
        sequence: String,
        /// Scope value for scoped sequences
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<String>,
        /// Sequence value of the deleted row
        key: String,
    },

    /// Edit checked without saving
    Validate {
        /// Edited deliverable
        deliverable_id: DeliverableId,
        /// Changed fields
        patch: DeliverablePatch,
    },
}

impl GridRequest {
    /// Operation name for logs
    #[must_use]
    pub fn op(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Insert { .. } => "insert",
            Self::Update { .. } => "update",
            Self::Remove { .. } => "remove",
            Self::Validate { .. } => "validate",
        }
    }
}

/// Answer to a [`GridRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GridResponse {
    /// Suggested number for a new row
    Defaults {
        /// Suggestion
        number: String,
    },

    /// Row stored
    Inserted {
        /// Number the row was stored with
        number: String,
        /// Suggestion for the following row
        next_number: String,
    },

    /// Edit persisted
    Updated {
        /// Record as stored
        record: DeliverableRecord,
    },

    /// Edit refused; nothing was persisted
    Rejected {
        /// Message for display next to the edited field
        error_text: String,
    },

    /// Rows deleted
    Removed {
        /// Number of rows removed
        removed: usize,
        /// Suggestion for the next new row
        next_number: String,
    },

    /// Verdict of a validate request
    Validation(ValidationOutcome),
}
