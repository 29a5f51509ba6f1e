//! dtrack domain model
//!
//! Plain data shared by the identifier allocator, the progress validator and
//! the service layer.
//!
//! # Core Concepts
//!
//! - [`ProgressEntry`]: effort units reported against a deliverable for one [`Period`]
//! - [`Gate`]: workflow checkpoint with a ceiling and an optional automatic percentage
//! - [`DeliverableRecord`] / [`DeliverablePatch`]: stored row and proposed edit
//! - [`DeliverableProgressContext`]: the numbers the progress bounds are derived from
//! - [`Record`]: loosely-typed remote row used by sequence sources
//!
//! # Example
//!
//! ```rust
//! use dtrack_model::{normalize_percentage, format_percentage};
//!
//! assert_eq!(normalize_percentage(75.0), 0.75);
//! assert_eq!(format_percentage(0.3), "30.00%");
//! ```

#![warn(unreachable_pub)]

mod deliverable;
mod gate;
mod ids;
mod percent;
mod progress;
mod record;

pub use deliverable::{DeliverablePatch, DeliverableRecord};
pub use gate::{Gate, GateSet};
pub use ids::{DeliverableId, GateId};
pub use percent::{format_percentage, normalize_percentage};
pub use progress::{DeliverableProgressContext, Period, ProgressEntry};
pub use record::{record_field_text, Record};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
