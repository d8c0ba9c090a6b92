//! Assert activities
//!
//! A parity activity loads a report the Legacy side already downloaded,
//! fetches the same report from the New system as JSON and diffs the two
//! record sets. Only a fully clean comparison is `Ok`.

use crate::activity::Activity;
use crate::client::NewSystemApi;
use crate::new_system::{base_query, request_body, PROFIT_SHARING_REPORT_PATH};
use crate::outcome::Outcome;
use crate::steps::Body;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use yematch_reports::{DynReportExtractor, Pay426NCriteria};

/// Where the New side of a comparison comes from
#[derive(Debug, Clone, Copy)]
pub enum NewSource {
    /// Year-end report endpoint with a criteria body
    Criteria(&'static Pay426NCriteria),
    /// GET with the standard year and page parameters
    Get(&'static str),
    /// POST with a generated body
    Post { path: &'static str, body: Body },
}

impl NewSource {
    fn describe(&self) -> String {
        match self {
            Self::Criteria(c) => format!("POST {PROFIT_SHARING_REPORT_PATH} ({})", c.report_id),
            Self::Get(path) => format!("GET {path}"),
            Self::Post { path, .. } => format!("POST {path}"),
        }
    }
}

/// Compares one Legacy report file with its New-system counterpart
pub struct ParityActivity {
    name: String,
    legacy_file: PathBuf,
    source: NewSource,
    extractor: Arc<dyn DynReportExtractor>,
    api: Arc<dyn NewSystemApi>,
    profit_year: i32,
}

impl ParityActivity {
    /// Compare `legacy_file` with what `source` returns
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        legacy_file: impl Into<PathBuf>,
        source: NewSource,
        extractor: Arc<dyn DynReportExtractor>,
        api: Arc<dyn NewSystemApi>,
        profit_year: i32,
    ) -> Self {
        Self {
            name: name.into(),
            legacy_file: legacy_file.into(),
            source,
            extractor,
            api,
            profit_year,
        }
    }

    /// Where the New response is kept next to the Legacy file
    #[must_use]
    pub fn new_side_file(&self) -> PathBuf {
        self.legacy_file.with_extension("new.json")
    }

    async fn fetch_new(&self) -> Result<String, String> {
        let value = match self.source {
            NewSource::Criteria(criteria) => {
                let body = serde_json::to_value(criteria.request(self.profit_year)).map_err(|e| e.to_string())?;
                self.api.post_json(PROFIT_SHARING_REPORT_PATH, body).await
            }
            NewSource::Get(path) => {
                return self
                    .api
                    .get_text(path, base_query(self.profit_year))
                    .await
                    .map_err(|e| e.to_string())
            }
            NewSource::Post { path, body } => {
                self.api.post_json(path, request_body(body, self.profit_year)?).await
            }
        };
        let value = value.map_err(|e| e.to_string())?;
        serde_json::to_string(&value).map_err(|e| e.to_string())
    }

    async fn compare(&self) -> Result<(bool, String), String> {
        let legacy = tokio::fs::read_to_string(&self.legacy_file)
            .await
            .map_err(|e| format!("cannot read legacy report {}: {e}", self.legacy_file.display()))?;
        let new = self.fetch_new().await?;

        let keep = self.new_side_file();
        if let Err(e) = tokio::fs::write(&keep, &new).await {
            warn!(activity = %self.name, path = %keep.display(), error = %e, "cannot keep new-side response");
        }

        let comparison = self.extractor.compare_json(&legacy, &new).map_err(|e| e.to_string())?;
        info!(
            activity = %self.name,
            report = %comparison.report,
            passed = comparison.passed(),
            "parity compared"
        );
        Ok((comparison.passed(), comparison.generate_text()))
    }
}

#[async_trait::async_trait]
impl Activity for ParityActivity {
    fn name(&self) -> &str {
        &self.name
    }

    fn uses_new_system(&self) -> bool {
        true
    }

    async fn execute(&self) -> Outcome {
        let report = self.extractor.report_id().to_string();
        let started = Instant::now();
        let outcome = match self.compare().await {
            Ok((true, text)) => Outcome::ok(&self.name, &report, text),
            Ok((false, text)) | Err(text) => Outcome::error(&self.name, &report, text),
        };
        outcome
            .with_command(self.source.describe())
            .with_duration(started.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockNewSystemApi;
    use crate::outcome::Status;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use yematch_reports::criteria::find;
    use yematch_reports::{Pay426NExtractor, ReportExtractor};
    use yematch_test_utils::fixtures::{Pay426NFixture, Pay426NRow};

    const REPORT: &str = "PAY426N-02";

    fn legacy_text() -> String {
        Pay426NFixture::employees()
            .row(Pay426NRow::new(700_123, "SMITH, JO", 4).wages(45_000_00).hours(2_080_50).points(450))
            .row(Pay426NRow::new(700_124, "JONES, AL", 4).wages(12_000_00).hours(1_200_00).points(120))
            .row(Pay426NRow::new(700_125, "BROWN, ED", 7).wages(30_500_25).hours(1_900_00).points(305))
            .render()
    }

    fn new_records(text: &str) -> Value {
        let report = Pay426NExtractor::new(REPORT).parse(text).unwrap();
        serde_json::to_value(report.records).unwrap()
    }

    fn activity(dir: &TempDir, respond: Value) -> ParityActivity {
        let text = legacy_text();
        let legacy = dir.path().join("R17-PAY426N-02.txt");
        std::fs::write(&legacy, &text).unwrap();

        let mut api = MockNewSystemApi::new();
        api.expect_post_json()
            .withf(|path, body| path == PROFIT_SHARING_REPORT_PATH && body["reportId"] == REPORT)
            .times(1)
            .returning(move |_, _| Ok(json!({ "response": { "results": respond.clone() } })));

        let extractor = yematch_reports::default_extractors().require(REPORT).unwrap();
        ParityActivity::new(
            "ParityPAY426N-02",
            legacy,
            NewSource::Criteria(find(REPORT).unwrap()),
            extractor,
            Arc::new(api),
            2024,
        )
    }

    #[tokio::test]
    async fn identical_sides_pass() {
        let dir = TempDir::new().unwrap();
        let records = new_records(&legacy_text());
        let parity = activity(&dir, records);
        let outcome = parity.execute().await;
        assert_eq!(outcome.status, Status::Ok, "{}", outcome.message);
        assert!(outcome.message.starts_with("PAY426N-02 parity: CLEAN"));
        assert!(parity.new_side_file().exists());
    }

    #[tokio::test]
    async fn wage_difference_fails_with_detail() {
        let dir = TempDir::new().unwrap();
        let mut records = new_records(&legacy_text());
        records[1]["wages"] = serde_json::to_value(Decimal::new(12_000_01, 2)).unwrap();
        let outcome = activity(&dir, records).execute().await;
        assert_eq!(outcome.status, Status::Error);
        assert!(outcome.message.contains("DIFFERENT"), "{}", outcome.message);
        assert!(outcome.message.contains("700124"), "{}", outcome.message);
    }

    #[tokio::test]
    async fn missing_employee_on_new_side_fails() {
        let dir = TempDir::new().unwrap();
        let mut records = new_records(&legacy_text());
        records.as_array_mut().unwrap().pop();
        let outcome = activity(&dir, records).execute().await;
        assert_eq!(outcome.status, Status::Error);
    }

    #[tokio::test]
    async fn missing_legacy_file_fails_without_calling_new_system() {
        let dir = TempDir::new().unwrap();
        let extractor = yematch_reports::default_extractors().require("QPAY066").unwrap();
        let mut api = MockNewSystemApi::new();
        api.expect_post_json().never();
        let outcome = ParityActivity::new(
            "ParityQPAY066",
            dir.path().join("R03-QPAY066.txt"),
            NewSource::Post {
                path: "api/yearend/terminated-employees",
                body: Body::DateRange,
            },
            extractor,
            Arc::new(api),
            2024,
        )
        .execute()
        .await;
        assert_eq!(outcome.status, Status::Error);
        assert!(outcome.message.starts_with("cannot read legacy report"));
        assert_eq!(outcome.command, "POST api/yearend/terminated-employees");
    }
}
