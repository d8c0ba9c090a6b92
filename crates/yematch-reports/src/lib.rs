//! Legacy report extractors
//!
//! Turns fixed-width legacy report text into typed records and reconciles the
//! detail rows against the trailer the legacy job printed:
//! - PAY426: year-end profit-share report
//! - PAY426N-01..08, 10: per-criteria profit-share sub-reports
//! - QPAY066: termination / profit-share breakdown
//!
//! Every record type declares its business key and tracked fields so the
//! diff engine can compare it against New-system JSON.

pub mod criteria;
pub mod error;
pub mod extractor;
pub mod pay426;
pub mod pay426n;
pub mod profit_share;
pub mod qpay066;

pub use criteria::{CriteriaRequest, Pay426NCriteria, PAY426N_CRITERIA, PAY426_ALL};
pub use error::{reconcile, ReportError, ReportResult, ValidationError};
pub use extractor::{
    decode_records, default_extractors, find_records, Comparison, DynReportExtractor, ExtractorRegistry, Report, ReportExtractor,
    ReportSummary,
};
pub use pay426::Pay426Extractor;
pub use pay426n::Pay426NExtractor;
pub use profit_share::{EmployeeStatus, ProfitShareRecord, ReportTotals};
pub use qpay066::{PsnKey, QPay066Extractor, QPay066Record, QPay066Totals};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
