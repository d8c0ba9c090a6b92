//! Catalog and runner end to end, with a scripted Legacy host and an
//! in-memory New system

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use yematch_connector::{PathMap, RemoteConfig};
use yematch_harness::client::ClientResult;
use yematch_harness::AppVersion;
use yematch_harness::new_system::PROFIT_SHARING_REPORT_PATH;
use yematch_harness::prelude::*;
use yematch_harness::NewSystemApi;
use yematch_reports::{Pay426NExtractor, ReportExtractor};
use yematch_test_utils::fixtures::{Pay426NFixture, Pay426NRow};
use yematch_test_utils::FakeTransport;

const LOG_LINE: &str = "PROF-SHARE started\nLogFile: /logs/PROF-SHARE_20250103.log\n";

#[derive(Default)]
struct FakeNewSystem {
    reports: HashMap<String, Value>,
}

#[async_trait]
impl NewSystemApi for FakeNewSystem {
    async fn get_json(&self, _path: &str, _query: Vec<(String, String)>) -> ClientResult<Value> {
        Ok(json!([]))
    }

    async fn post_json(&self, path: &str, body: Value) -> ClientResult<Value> {
        if path != PROFIT_SHARING_REPORT_PATH {
            return Ok(Value::Null);
        }
        let report = body["reportId"].as_str().unwrap_or_default();
        let records = self.reports.get(report).cloned().unwrap_or_else(|| json!([]));
        Ok(json!({ "reportName": report, "response": { "total": 0, "results": records } }))
    }

    async fn get_text(&self, _path: &str, _query: Vec<(String, String)>) -> ClientResult<String> {
        Ok("[]".to_string())
    }

    async fn app_version(&self) -> ClientResult<AppVersion> {
        Ok(AppVersion {
            build_number: "1482".to_string(),
            short_git_hash: "9f3c2ab".to_string(),
        })
    }
}

fn legacy_report() -> String {
    Pay426NFixture::employees()
        .row(Pay426NRow::new(700_201, "GARCIA, MA", 12).wages(52_300_00).hours(2_010_00).points(523))
        .row(Pay426NRow::new(700_202, "LEE, KIM", 12).wages(18_450_75).hours(1_150_25).points(185))
        .render()
}

fn new_records() -> Value {
    let report = Pay426NExtractor::new("PAY426N-02").parse(&legacy_report()).unwrap();
    serde_json::to_value(report.records).unwrap()
}

fn setup(dir: &TempDir, transport: FakeTransport, records: Value) -> (Catalog, Arc<FakeTransport>) {
    let (catalog, transport, _) = setup_with_api(dir, transport, records);
    (catalog, transport)
}

fn setup_with_api(
    dir: &TempDir,
    transport: FakeTransport,
    records: Value,
) -> (Catalog, Arc<FakeTransport>, Arc<FakeNewSystem>) {
    let config = HarnessConfig {
        data_directory: dir.path().to_path_buf(),
        remote: RemoteConfig {
            path_map: PathMap::new(3).with_path("REPORT_DIR", "/data/reports"),
            ..RemoteConfig::new("legacy-host")
        },
        ..HarnessConfig::default()
    };
    let api = Arc::new(FakeNewSystem {
        reports: HashMap::from([("PAY426N-02".to_string(), records)]),
    });
    let transport = Arc::new(transport);
    let context = CatalogContext::new(
        config,
        Arc::clone(&transport) as _,
        Arc::clone(&api) as _,
        Arc::new(yematch_reports::default_extractors()),
    );
    (Catalog::build(&context).unwrap(), transport, api)
}

fn scripted_edit_run() -> FakeTransport {
    FakeTransport::new()
        .succeed("PROF-SHARE", LOG_LINE)
        .file("/data/reports/PAY426N-02_20250103.txt", &legacy_report())
}

#[tokio::test]
async fn edit_run_then_parity_passes() {
    let dir = TempDir::new().unwrap();
    let (catalog, transport) = setup(&dir, scripted_edit_run(), new_records());

    let activities = Runner::specify(&catalog, &["P17", "ParityPAY426N-02"]).unwrap();
    let runner = Runner::new(dir.path());
    let report = runner.run(&activities).await.unwrap();

    assert!(report.passed(), "{}", report.generate_text());
    assert_eq!(transport.invocations()[0].args, "RUN=EDIT YEAR=2024");
    assert!(dir.path().join("R17-PAY426N-02.txt").exists());

    let edit = &report.outcomes[0];
    assert!(edit.message.contains("PAY426N-02: 2 records"), "{}", edit.message);
    assert!(edit.message.contains("PAY426N-10: skipped"), "{}", edit.message);
    assert!(report.outcomes[1].message.contains("CLEAN"));

    let written: Vec<Outcome> =
        serde_json::from_str(&std::fs::read_to_string(runner.outcome_path()).unwrap()).unwrap();
    assert_eq!(written.len(), 2);
}

#[tokio::test]
async fn parity_runs_report_the_new_system_build() {
    let dir = TempDir::new().unwrap();
    let (catalog, _, api) = setup_with_api(&dir, scripted_edit_run(), new_records());

    let activities = Runner::specify(&catalog, &["P17", "ParityPAY426N-02"]).unwrap();
    let report = Runner::new(dir.path()).with_new_system(api).run(&activities).await.unwrap();

    assert!(report.passed(), "{}", report.generate_text());
    let version = report.new_system.as_ref().unwrap();
    assert_eq!(version.build_number, "1482");
    assert!(report.generate_text().contains("New system: build 1482 git-hash 9f3c2ab"));
}

#[tokio::test]
async fn parity_difference_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let mut records = new_records();
    records[0]["wages"] = serde_json::to_value(Decimal::new(52_300_10, 2)).unwrap();
    let (catalog, _) = setup(&dir, scripted_edit_run(), records);

    let activities = Runner::specify(&catalog, &["P17", "ParityPAY426N-02", "P18"]).unwrap();
    let report = Runner::new(dir.path()).run(&activities).await.unwrap();

    assert!(!report.passed());
    assert_eq!(report.outcomes[1].status, Status::Error);
    assert!(report.outcomes[1].message.contains("700201"), "{}", report.outcomes[1].message);
    assert_eq!(report.skipped, vec!["P18".to_string()]);
}

#[tokio::test]
async fn legacy_failure_stops_before_parity() {
    let dir = TempDir::new().unwrap();
    let transport = FakeTransport::new().fail("PROF-SHARE", 12, "partial", "abend U0012");
    let (catalog, _) = setup(&dir, transport, new_records());

    let activities = Runner::specify(&catalog, &["P17", "ParityPAY426N-02"]).unwrap();
    let report = Runner::new(dir.path()).run(&activities).await.unwrap();

    let edit = &report.outcomes[0];
    assert_eq!(edit.status, Status::Error);
    assert!(edit.stderr.contains("[legacy] abend U0012"));
    assert_eq!(report.skipped, vec!["ParityPAY426N-02".to_string()]);
}

#[test]
fn unknown_names_are_rejected() {
    let dir = TempDir::new().unwrap();
    let (catalog, _) = setup(&dir, FakeTransport::new(), json!([]));
    let err = Runner::specify(&catalog, &["P17", "P99"]).err().unwrap();
    assert!(matches!(err, HarnessError::UnknownActivity(name) if name == "P99"));
}
