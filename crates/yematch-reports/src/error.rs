//! Error types for report extraction
//!
//! Line-level problems never surface here; extractors skip malformed lines.
//! These errors describe a report that as a whole cannot be trusted:
//! - no detail rows recognised
//! - trailer missing or unreadable
//! - detail rows that do not reconcile with the trailer

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use yematch_diff::DiffError;
use yematch_fixedwidth::FieldError;

/// Detail rows disagree with the trailer the legacy writer printed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{report} validation failed: summed {field} ({computed}) does not match declared {field} ({declared})")]
pub struct ValidationError {
    /// Report identifier
    pub report: String,
    /// Reconciled quantity, e.g. `wages` or `under-21 count`
    pub field: &'static str,
    /// Figure derived from detail rows
    pub computed: String,
    /// Figure printed in the trailer
    pub declared: String,
}

impl ValidationError {
    /// Build a mismatch error
    pub fn mismatch(report: impl Into<String>, field: &'static str, computed: impl fmt::Display, declared: impl fmt::Display) -> Self {
        Self {
            report: report.into(),
            field,
            computed: computed.to_string(),
            declared: declared.to_string(),
        }
    }
}

/// Compare a computed figure against its declared value
///
/// # Errors
/// [`ValidationError`] when they differ.
pub fn reconcile<T>(report: &str, field: &'static str, computed: T, declared: T) -> Result<(), ValidationError>
where
    T: PartialEq + fmt::Display,
{
    if computed == declared {
        Ok(())
    } else {
        Err(ValidationError::mismatch(report, field, computed, declared))
    }
}

/// Report-level extraction failures
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Discriminator matched nothing; a layout change upstream looks like this
    #[error("{report}: no detail rows recognised")]
    NoDetailRows {
        /// Report id
        report: String,
    },

    /// A required trailer line was not found
    #[error("{report}: trailer '{marker}' not found")]
    MissingTrailer {
        /// Report id
        report: String,
        /// Label that was looked for
        marker: &'static str,
    },

    /// A trailer line was found but could not be read
    #[error("{report}: unreadable trailer: {message}")]
    Trailer {
        /// Report id
        report: String,
        /// What could not be read
        message: String,
    },

    /// Totals do not reconcile
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Trailer field coercion failed
    #[error("field error: {0}")]
    Field(#[from] FieldError),

    /// Discriminator pattern failed to compile
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// No extractor registered under this id
    #[error("no extractor registered for report '{0}'")]
    UnknownReport(String),

    /// New-system records could not be decoded
    #[error("{report}: cannot decode new-system records: {source}")]
    Decode {
        /// Report id
        report: String,
        /// Decoder failure
        #[source]
        source: serde_json::Error,
    },

    /// Record sets could not be compared
    #[error("comparison failed: {0}")]
    Diff(#[from] DiffError),
}

impl ReportError {
    /// Create no-detail-rows error
    pub fn no_detail_rows(report: impl Into<String>) -> Self {
        Self::NoDetailRows { report: report.into() }
    }

    /// Create missing trailer error
    pub fn missing_trailer(report: impl Into<String>, marker: &'static str) -> Self {
        Self::MissingTrailer {
            report: report.into(),
            marker,
        }
    }

    /// Create unreadable trailer error
    pub fn trailer(report: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Trailer {
            report: report.into(),
            message: message.into(),
        }
    }
}

/// Result alias for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Borrow a lazily compiled discriminator
pub(crate) fn compiled(pattern: &'static Lazy<Result<Regex, regex::Error>>) -> ReportResult<&'static Regex> {
    pattern.as_ref().map_err(|e| ReportError::Pattern(e.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn mismatch_names_field_and_both_values() {
        let err = reconcile("PAY426", "wages", Decimal::new(100_001, 2), Decimal::new(100_000, 2)).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("wages"));
        assert!(text.contains("1000.01"));
        assert!(text.contains("1000.00"));
        assert!(text.starts_with("PAY426 validation failed"));
    }

    #[test]
    fn equal_figures_reconcile() {
        assert!(reconcile("QPAY066", "count", 3, 3).is_ok());
    }
}
