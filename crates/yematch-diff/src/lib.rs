//! Comparison engine for legacy/new record sets
//!
//! Records are aligned by a business key and classified as:
//! - only in legacy
//! - only in new
//! - matched clean, or matched with field differences
//!
//! Field comparison is driven by a declared registry ([`TrackedField`]) with a
//! [`Tolerance`] per field. Discrepancies are data, not errors.

pub mod checksum;
pub mod engine;
pub mod error;
pub mod field;

pub use checksum::{checksum, checksum_mismatches};
pub use engine::{diff, diff_tracked, DiffResult, DiffSummary, FieldDifference, Matched};
pub use error::{DiffError, Side};
pub use field::{to_cent, FieldValue, Tolerance, Tracked, TrackedField};
