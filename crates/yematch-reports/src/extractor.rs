//! Extractor trait and the report-id registry
//!
//! - [`ReportExtractor`] is implemented once per legacy format
//! - [`DynReportExtractor`] erases the record type so extractors for different
//!   formats can sit in one [`ExtractorRegistry`]
//! - New-system records arrive as JSON and are diffed against the parsed rows

use crate::criteria::PAY426N_CRITERIA;
use crate::error::{ReportError, ReportResult};
use crate::pay426::Pay426Extractor;
use crate::pay426n::Pay426NExtractor;
use crate::qpay066::QPay066Extractor;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::sync::Arc;
use yematch_diff::{checksum, checksum_mismatches, diff_tracked, DiffSummary, Tracked};

/// Entries listed per section in a comparison report
const TEXT_LIMIT: usize = 25;

/// Detail rows plus the trailer figures of one report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report<R, T> {
    /// Detail rows in report order
    pub records: Vec<R>,
    /// Trailer figures, as declared once reconciled
    pub totals: T,
}

/// Parser for one legacy report format
pub trait ReportExtractor: Send + Sync + 'static {
    /// Detail row type
    type Record: Tracked + Serialize + DeserializeOwned + Send + Sync;

    /// Trailer figures
    type Totals: Serialize + fmt::Debug;

    /// Report identifier, e.g. `PAY426N-03`
    fn report_id(&self) -> &str;

    /// Parse and reconcile a whole report
    ///
    /// # Errors
    /// [`ReportError`] when the report as a whole cannot be trusted.
    fn parse(&self, text: &str) -> ReportResult<Report<Self::Record, Self::Totals>>;
}

/// Parsed report reduced to what the runner and CLI print
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    /// Report identifier
    pub report: String,
    /// Detail rows recognised
    pub records: usize,
    /// Trailer figures as JSON
    pub totals: serde_json::Value,
}

impl ReportSummary {
    /// Short text rendering
    #[must_use]
    pub fn generate_text(&self) -> String {
        let totals = serde_json::to_string_pretty(&self.totals).unwrap_or_default();
        format!("{}: {} records\n{totals}\n", self.report, self.records)
    }
}

/// Legacy report compared with New-system records
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    /// Report identifier
    pub report: String,
    /// Key-set and field counts
    pub summary: DiffSummary,
    /// Numeric columns whose sums disagree
    pub checksum_mismatches: Vec<&'static str>,
    /// Human-readable detail
    pub text: String,
}

impl Comparison {
    /// Every key matched cleanly and every column sum agrees
    #[must_use]
    pub fn passed(&self) -> bool {
        self.summary.passed() && self.checksum_mismatches.is_empty()
    }

    /// Text rendering including the checksum verdict
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = format!("{} parity: {}\n", self.report, if self.passed() { "CLEAN" } else { "DIFFERENT" });
        out.push_str(&self.text);
        if !self.checksum_mismatches.is_empty() {
            let _ = writeln!(out, "Checksum mismatches: {}", self.checksum_mismatches.join(", "));
        }
        out
    }
}

/// Type-erased extractor for storage in the registry
pub trait DynReportExtractor: Send + Sync {
    /// Report identifier
    fn report_id(&self) -> &str;

    /// Parse and reconcile, keeping only counts and totals
    ///
    /// # Errors
    /// See [`ReportExtractor::parse`].
    fn check(&self, text: &str) -> ReportResult<ReportSummary>;

    /// Parse the legacy text and diff it against New-system JSON records
    ///
    /// # Errors
    /// Parse failures, undecodable JSON or duplicate keys on either side.
    fn compare_json(&self, legacy_text: &str, new_json: &str) -> ReportResult<Comparison>;
}

impl<E> DynReportExtractor for E
where
    E: ReportExtractor,
{
    fn report_id(&self) -> &str {
        ReportExtractor::report_id(self)
    }

    fn check(&self, text: &str) -> ReportResult<ReportSummary> {
        let report = self.parse(text)?;
        Ok(ReportSummary {
            report: ReportExtractor::report_id(self).to_string(),
            records: report.records.len(),
            totals: serde_json::to_value(&report.totals).map_err(|source| ReportError::Decode {
                report: ReportExtractor::report_id(self).to_string(),
                source,
            })?,
        })
    }

    fn compare_json(&self, legacy_text: &str, new_json: &str) -> ReportResult<Comparison> {
        let id = ReportExtractor::report_id(self);
        let legacy = self.parse(legacy_text)?.records;
        let new: Vec<E::Record> = decode_records(id, new_json)?;

        let result = diff_tracked(&legacy, &new)?;
        let fields = <E::Record as Tracked>::fields();
        let mismatches = checksum_mismatches(&checksum(&legacy, fields), &checksum(&new, fields), fields);

        tracing::debug!(report = id, legacy = legacy.len(), new = new.len(), "compared");
        Ok(Comparison {
            report: id.to_string(),
            summary: result.summary(),
            checksum_mismatches: mismatches,
            text: result.generate_text(TEXT_LIMIT),
        })
    }
}

/// Decode New-system records from a bare array or a paged envelope
/// (`{"results": [...]}` or `{"response": {"results": [...]}}`).
///
/// # Errors
/// [`ReportError::Decode`] when the JSON is malformed or holds no record array.
pub fn decode_records<R: DeserializeOwned>(report: &str, json: &str) -> ReportResult<Vec<R>> {
    let decode = |source| ReportError::Decode {
        report: report.to_string(),
        source,
    };
    let value: serde_json::Value = serde_json::from_str(json).map_err(decode)?;
    let array = find_records(value).unwrap_or(serde_json::Value::Null);
    serde_json::from_value(array).map_err(decode)
}

/// Locate the record array in a New-system response: a bare array or one
/// nested under `results` / `response`
#[must_use]
pub fn find_records(value: serde_json::Value) -> Option<serde_json::Value> {
    match value {
        serde_json::Value::Array(_) => Some(value),
        serde_json::Value::Object(mut map) => ["results", "Results", "response", "Response"]
            .iter()
            .find_map(|k| map.remove(*k))
            .and_then(find_records),
        _ => None,
    }
}

/// Extractors keyed by report id
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: IndexMap<String, Arc<dyn DynReportExtractor>>,
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("reports", &self.extractors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ExtractorRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extractor under its own report id; a later registration wins
    pub fn register<E: ReportExtractor>(&mut self, extractor: E) {
        let id = ReportExtractor::report_id(&extractor).to_string();
        self.extractors.insert(id, Arc::new(extractor));
    }

    /// Look up by report id
    #[must_use]
    pub fn get(&self, report: &str) -> Option<Arc<dyn DynReportExtractor>> {
        self.extractors.get(report).cloned()
    }

    /// Look up, failing with [`ReportError::UnknownReport`]
    ///
    /// # Errors
    /// When nothing is registered under `report`.
    pub fn require(&self, report: &str) -> ReportResult<Arc<dyn DynReportExtractor>> {
        self.get(report).ok_or_else(|| ReportError::UnknownReport(report.to_string()))
    }

    /// Registered ids in registration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.extractors.keys().map(String::as_str)
    }

    /// Number of registered extractors
    #[must_use]
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

/// Registry with every built-in format
#[must_use]
pub fn default_extractors() -> ExtractorRegistry {
    let mut registry = ExtractorRegistry::new();
    registry.register(Pay426Extractor);
    for criteria in PAY426N_CRITERIA {
        registry.register(Pay426NExtractor::new(criteria.report_id));
    }
    registry.register(QPay066Extractor);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profit_share::ProfitShareRecord;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_registry_knows_every_format() {
        let registry = default_extractors();
        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(ids.first(), Some(&"PAY426"));
        assert_eq!(ids.last(), Some(&"QPAY066"));
        assert!(ids.contains(&"PAY426N-03"));
        assert!(ids.contains(&"PAY426N-10"));
        assert!(!ids.contains(&"PAY426N-09"));
        assert_eq!(registry.len(), 11);
    }

    #[test]
    fn unknown_report_is_an_error() {
        let err = default_extractors().require("PAY999").err().unwrap();
        assert!(matches!(err, ReportError::UnknownReport(ref id) if id == "PAY999"));
    }

    #[test]
    fn paged_envelopes_are_unwrapped() {
        let bare = "[]";
        let paged = r#"{"results": []}"#;
        let nested = r#"{"reportName": "x", "response": {"total": 0, "results": []}}"#;
        for json in [bare, paged, nested] {
            let records: Vec<ProfitShareRecord> = decode_records("PAY426", json).unwrap();
            assert!(records.is_empty());
        }
    }

    #[test]
    fn object_without_records_fails_to_decode() {
        let err = decode_records::<ProfitShareRecord>("PAY426", r#"{"total": 3}"#).unwrap_err();
        assert!(matches!(err, ReportError::Decode { .. }));
    }
}
