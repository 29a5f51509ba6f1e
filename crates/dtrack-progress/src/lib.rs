//! Period-scoped progress validation
//!
//! Decides whether a proposed cumulative earned percentage for a deliverable
//! is legal in the active reporting period.
//!
//! # Bounds
//!
//! ```text
//! min = Σ units(period < current) / total_hours
//! max = min(gate.max_percentage, 1 − Σ units(period > current) / total_hours)
//! ```
//!
//! Effort already reported in earlier periods cannot be un-reported, and the
//! current claim cannot crowd out effort already committed to later periods.
//! A deliverable with no positive `total_hours` is unconstrained.
//!
//! Rejections are ordinary results carrying a display message, not errors.
//!
//! # Example
//!
//! ```rust
//! use dtrack_model::{DeliverableProgressContext, Period, ProgressEntry};
//! use dtrack_progress::ProgressValidator;
//!
//! let ctx = DeliverableProgressContext {
//!     total_hours: 100.0,
//!     current_gate_max_percentage: 0.8,
//!     current_period: Period::new(3),
//!     progress_entries: vec![ProgressEntry::new(2, 40.0)],
//! };
//!
//! let err = ProgressValidator::new().check_context(&ctx, 0.3).unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "Total earned percentage (30.00%) cannot be less than what's already reported in previous periods (40.00%)."
//! );
//! ```

#![warn(unreachable_pub)]

pub mod bounds;
pub mod edit;
pub mod validator;

pub use bounds::{BoundViolation, ProgressBounds, TOLERANCE};
pub use edit::ProgressEdit;
pub use validator::{ProgressValidator, ValidationOutcome, ValidationRequest};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
