//! Diff errors

use serde::Serialize;
use std::fmt;

/// Which system produced a record set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    /// The mainframe-era system
    Legacy,
    /// The replacement system
    New,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Legacy => "legacy",
            Self::New => "new",
        })
    }
}

/// Comparison could not be carried out
///
/// Discrepancies are never errors; only malformed inputs are.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// A key occurs twice within one side
    #[error("duplicate key {key} in {side} records")]
    DuplicateKey {
        /// Side holding the duplicate
        side: Side,
        /// Key as displayed
        key: String,
    },
}

impl DiffError {
    /// Create duplicate key error
    pub fn duplicate_key(side: Side, key: impl Into<String>) -> Self {
        Self::DuplicateKey { side, key: key.into() }
    }
}
