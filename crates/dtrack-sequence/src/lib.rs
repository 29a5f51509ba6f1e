//! Sequential identifier suggestions
//!
//! Derives the next human-readable sequence number for a new record (area
//! "02", project "07", ...) by reading the highest existing value from a
//! remote collection and incrementing its numeric part.
//!
//! # Architecture
//!
//! ```text
//! AllocatorSpec ──► SequenceAllocator ──► SequenceQuery ──► SequenceSource
//!                          │                                (OData / in-memory)
//!                          ▼
//!              extract_digits → +1 → zero-pad
//! ```
//!
//! Suggestions are best-effort: a failed lookup falls back to the configured
//! start value, and nothing is reserved, so two concurrent callers may be
//! offered the same number. Uniqueness, if required, belongs to the backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use dtrack_sequence::{AllocatorSpec, InMemorySequenceSource, SequenceAllocator};
//! use std::sync::Arc;
//!
//! let source = Arc::new(InMemorySequenceSource::new());
//! let allocator = SequenceAllocator::new(source, AllocatorSpec::new("Areas", "areaNumber"));
//! assert_eq!(allocator.compute_next().await, "01");
//! ```

#![warn(unreachable_pub)]

pub mod allocator;
pub mod error;
pub mod odata;
pub mod query;
pub mod source;

pub use allocator::{extract_digits, increment_padded, AllocatorSpec, SequenceAllocator};
pub use error::SourceError;
pub use odata::ODataSequenceSource;
pub use query::{FilterClause, FilterOp, FilterValue, SequenceFilter, SequenceQuery};
pub use source::{InMemorySequenceSource, SequenceSource};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
