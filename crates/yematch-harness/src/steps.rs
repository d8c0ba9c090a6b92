//! The year-end step table
//!
//! One row per step, 00 through 29 plus 13A, 13B and 24B. Each row names the
//! Legacy job (a `!` prefix disables it), the reports that job leaves behind,
//! and what the New system is asked to do for the same step.

/// A report file a Legacy job writes next to its log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportArtifact {
    /// File stem on the Legacy host, before `_{log id}.txt`
    pub legacy_file: &'static str,
    /// Extractor id, also used in the local file name
    pub report_id: &'static str,
}

impl ReportArtifact {
    const fn same(report_id: &'static str) -> Self {
        Self {
            legacy_file: report_id,
            report_id,
        }
    }

    /// Remote path for the run identified by `log_id`
    #[must_use]
    pub fn remote_path(&self, report_dir: &str, log_id: &str) -> String {
        format!("{}/{}_{log_id}.txt", report_dir.trim_end_matches('/'), self.legacy_file)
    }

    /// Local file name for the activity that fetched it
    #[must_use]
    pub fn local_name(&self, activity: &str) -> String {
        format!("{activity}-{}.txt", self.report_id)
    }
}

/// Verb of a New-system call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Query string only
    Get,
    /// JSON body
    Post,
}

/// JSON body sent with a New-system call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body {
    /// No body at all
    None,
    /// `{}`
    Empty,
    /// `{"profitYear": Y}`
    ProfitYear,
    /// Freeze demographics as of early January after the profit year
    Freeze,
    /// The profit year as a date range
    DateRange,
}

/// One New-system call whose response holds a record list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fetch {
    /// Request verb
    pub method: HttpMethod,
    /// Endpoint relative to the base URL
    pub path: &'static str,
    /// Query parameters beyond `profitYear` and `take`
    pub params: &'static [(&'static str, &'static str)],
    /// Body for POST calls
    pub body: Body,
    /// Message prefix for the record count
    pub label: &'static str,
    /// Whether the profit-share adjustment parameters are sent
    pub profit_share: bool,
}

impl Fetch {
    const fn get(path: &'static str, label: &'static str) -> Self {
        Self {
            method: HttpMethod::Get,
            path,
            params: &[],
            body: Body::None,
            label,
            profit_share: false,
        }
    }

    const fn post(path: &'static str, body: Body, label: &'static str) -> Self {
        Self {
            method: HttpMethod::Post,
            path,
            params: &[],
            body,
            label,
            profit_share: false,
        }
    }

    const fn with_params(self, params: &'static [(&'static str, &'static str)]) -> Self {
        Self { params, ..self }
    }

    const fn with_profit_share(self) -> Self {
        Self {
            profit_share: true,
            ..self
        }
    }
}

/// What the New system does for a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewCall {
    /// No New counterpart
    Nothing,
    /// Counterpart not implemented yet
    Pending(&'static str),
    /// Record-returning calls, one message line each
    Fetch(&'static [Fetch]),
    /// State-changing call with a fixed success message
    Post {
        /// Endpoint relative to the base URL
        path: &'static str,
        /// Request body
        body: Body,
        /// Outcome message on success
        message: &'static str,
    },
    /// One year-end report request per PAY426N criteria entry
    ProfitSharingReports,
    /// Profit master update, reporting the affected counts
    MasterUpdate,
}

/// One row of the year-end table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Step number such as `17` or `13A`
    pub id: &'static str,
    /// Descriptive step name
    pub name: &'static str,
    /// Legacy job script; `!` prefix marks it disabled
    pub legacy_job: &'static str,
    /// Argument string; `{year}` is replaced by the profit year
    pub legacy_args: &'static str,
    /// Reports the Legacy job writes
    pub reports: &'static [ReportArtifact],
    /// New-system counterpart
    pub new_call: NewCall,
}

impl Step {
    /// Legacy catalog name
    #[must_use]
    pub fn legacy_name(&self) -> String {
        format!("R{}", self.id)
    }

    /// New catalog name
    #[must_use]
    pub fn new_name(&self) -> String {
        format!("S{}", self.id)
    }

    /// Parallel catalog name
    #[must_use]
    pub fn parallel_name(&self) -> String {
        format!("P{}", self.id)
    }
}

const YEAR: &str = "YEAR={year}";
const RECORDS_LOADED: &str = "Records Loaded = ";

const PAY426N_REPORTS: &[ReportArtifact] = &[
    ReportArtifact::same("PAY426N-01"),
    ReportArtifact::same("PAY426N-02"),
    ReportArtifact::same("PAY426N-03"),
    ReportArtifact::same("PAY426N-04"),
    ReportArtifact::same("PAY426N-05"),
    ReportArtifact::same("PAY426N-06"),
    ReportArtifact::same("PAY426N-07"),
    ReportArtifact::same("PAY426N-08"),
    ReportArtifact::same("PAY426N-10"),
];

const QPAY066: &[ReportArtifact] = &[ReportArtifact::same("QPAY066")];
const PAY426: &[ReportArtifact] = &[ReportArtifact::same("PAY426")];

const CLEANUP_REPORTS: &[Fetch] = &[
    Fetch::get("api/yearend/negative-evta-ssn", "Negative Etva for Ssns - records loaded: "),
    Fetch::get("api/yearend/duplicate-ssns", "Duplicate Ssns - records loaded: "),
    Fetch::get(
        "api/yearend/demographic-badges-not-in-payprofit",
        "Badges Not In PayProfit - records loaded: ",
    ),
    Fetch::get(
        "api/yearend/duplicate-names-and-birthdays",
        "Duplicate Names And Birthdays - records loaded: ",
    ),
];

const TERMINATIONS: &[Fetch] = &[Fetch::post(
    "api/yearend/terminated-employees",
    Body::DateRange,
    "Records Loaded ",
)];
const DISTRIBUTIONS: &[Fetch] = &[Fetch::post(
    "api/yearend/distributions-and-forfeitures",
    Body::Empty,
    "Records Loaded ",
)];
const EXECUTIVE_HOURS: &[Fetch] = &[Fetch::get("api/yearend/executive-hours-and-dollars", RECORDS_LOADED)];
const WAGES: &[Fetch] =
    &[Fetch::get("api/yearend/wages-current-year", "Record Count: ").with_params(&[("useFrozenData", "false")])];
const FROZEN_WAGES: &[Fetch] =
    &[Fetch::get("api/yearend/wages-current-year", "Record Count: ").with_params(&[("useFrozenData", "true")])];
const ELIGIBLE: &[Fetch] = &[Fetch::get("api/yearend/eligible-employees", RECORDS_LOADED)];
const FORFEITURES: &[Fetch] = &[Fetch::get("api/yearend/frozen/forfeitures-and-points", RECORDS_LOADED)
    .with_params(&[("useFrozenData", "true")])];
const PROFIT_SHARE_UPDATE: &[Fetch] =
    &[Fetch::get("api/yearend/profit-sharing-update", RECORDS_LOADED).with_profit_share()];
const PROFIT_SHARE_EDIT: &[Fetch] = &[Fetch::get("api/yearend/profit-share-edit", RECORDS_LOADED).with_profit_share()];
const BREAKDOWN: &[Fetch] = &[Fetch::get("api/yearend/breakdown", "records returned = ")];

const fn step(
    id: &'static str,
    name: &'static str,
    legacy_job: &'static str,
    legacy_args: &'static str,
    reports: &'static [ReportArtifact],
    new_call: NewCall,
) -> Step {
    Step {
        id,
        name,
        legacy_job,
        legacy_args,
        reports,
        new_call,
    }
}

/// Every year-end step in run order
pub const STEPS: &[Step] = &[
    step("00", "BuildDatabase", "YE-BUILD-DATABASE", "SCHEMA=profitshare", &[], NewCall::Nothing),
    step("01", "CleanUpReports", "PROF-CLEANUP", YEAR, &[], NewCall::Fetch(CLEANUP_REPORTS)),
    step(
        "02",
        "MilitaryAndRehire",
        "TERM-REHIRE",
        YEAR,
        &[],
        NewCall::Pending("Changed to use POST, invocation requires update"),
    ),
    step(
        "03",
        "ProfTermination",
        "PROF-TERM",
        YEAR,
        QPAY066,
        NewCall::Fetch(TERMINATIONS),
    ),
    step(
        "04",
        "ProfShareLoanBalance",
        "QRY-PSLOAN",
        YEAR,
        &[],
        NewCall::Fetch(DISTRIBUTIONS),
    ),
    step(
        "05",
        "ExtractExecutiveHoursAndDollars",
        "PROF-DOLLAR-EXEC-EXTRACT",
        YEAR,
        &[],
        NewCall::Fetch(EXECUTIVE_HOURS),
    ),
    step(
        "06",
        "ClearExecutiveHoursAndDollars",
        "PAYPROFIT-CLEAR-EXEC",
        YEAR,
        &[],
        NewCall::Nothing,
    ),
    step(
        "07",
        "ReadyScreen00809",
        "!SCREEN-008-09",
        "",
        &[],
        NewCall::Pending("Should update some executives hours and dollars"),
    ),
    step(
        "08",
        "ProfitShareReport",
        "PROF-SHARE",
        "RUN=REPORT YEAR={year}",
        PAY426,
        NewCall::Pending("Summary report not yet complete."),
    ),
    step("09", "YEOraclePayrollProcessing", "!YE-ORACLE-PAYROLL", "", &[], NewCall::Nothing),
    step("10", "LoadOraclePayProfit", "LOAD-ORACLE-PAYPROFIT", YEAR, &[], NewCall::Nothing),
    step(
        "11",
        "ProfitSharingYTDWagesExtract",
        "PROF-DOLLAR-EXTRACT",
        YEAR,
        &[],
        NewCall::Fetch(WAGES),
    ),
    step(
        "12",
        "ProfLoadYrEndDemoProfitShare",
        "PROF-LOAD-YREND-DEMO-PROFSHARE",
        YEAR,
        &[],
        NewCall::Post {
            path: "api/itdevops/freeze",
            body: Body::Freeze,
            message: "Demographics frozen.",
        },
    ),
    step("13A", "PayProfitShiftPartTime", "PAYPROFIT-SHIFT", "SHIFT=PT", &[], NewCall::Nothing),
    step("13B", "PayProfitShiftWeekly", "PAYPROFIT-SHIFT", "SHIFT=WEEKLY", &[], NewCall::Nothing),
    step("14", "ZeroPyPdPayProfit", "ZERO-PY-PD-PAYPROFIT", YEAR, &[], NewCall::Nothing),
    step(
        "15",
        "ProfitSharingYTDWagesExtract2",
        "PROF-DOLLAR-EXTRACT",
        YEAR,
        &[],
        NewCall::Fetch(FROZEN_WAGES),
    ),
    step(
        "16",
        "ReadyScreen00809Second",
        "!SCREEN-008-09",
        "",
        &[],
        NewCall::Pending("Enter executive hours and dollars (second chance)"),
    ),
    step(
        "17",
        "ProfitShareReportEditRun",
        "PROF-SHARE",
        "RUN=EDIT YEAR={year}",
        PAY426N_REPORTS,
        NewCall::ProfitSharingReports,
    ),
    step(
        "18",
        "ProfitShareReportFinalRun",
        "PROF-SHARE",
        "RUN=FINAL YEAR={year}",
        PAY426,
        NewCall::Post {
            path: "api/yearend/final",
            body: Body::ProfitYear,
            message: "Final run complete.",
        },
    ),
    step(
        "19",
        "GetEligibleEmployees",
        "GET-ELIGIBLE-EMPS",
        YEAR,
        &[],
        NewCall::Fetch(ELIGIBLE),
    ),
    step(
        "20",
        "ProfitForfeit",
        "PROF-FORT",
        YEAR,
        &[],
        NewCall::Fetch(FORFEITURES),
    ),
    step(
        "21",
        "ProfitShareUpdate",
        "PROF-UPD1",
        YEAR,
        &[],
        NewCall::Fetch(PROFIT_SHARE_UPDATE),
    ),
    step(
        "22",
        "ProfitShareEdit",
        "PROF-EDIT",
        YEAR,
        &[],
        NewCall::Fetch(PROFIT_SHARE_EDIT),
    ),
    step("23", "ProfitMasterUpdate", "PROF-DBUPD", YEAR, &[], NewCall::MasterUpdate),
    step(
        "24",
        "ProfPayMasterUpdate",
        "PROF-UPD2",
        YEAR,
        &[],
        NewCall::Post {
            path: "api/yearend/enrollments",
            body: Body::ProfitYear,
            message: "Updated enrollment.",
        },
    ),
    step("24B", "ProfPayMasterUpdatePartTwo", "PROF-UPD2", "PART=2 YEAR={year}", &[], NewCall::Nothing),
    step("25", "ProfShareReportByAge", "PROFSHARE-RPT", YEAR, &[], NewCall::Pending("")),
    step("26", "ProfShareGrossReport", "PROFGROSS", YEAR, &[], NewCall::Pending("")),
    step(
        "27",
        "ProfShareByStore",
        "PROF-BREAK",
        YEAR,
        QPAY066,
        NewCall::Fetch(BREAKDOWN),
    ),
    step("28", "PrintProfitCerts", "PROF-CERT01", YEAR, &[], NewCall::Pending("")),
    step("29", "SaveProfPayMstr", "SAVE-PROF-PAYMSTR", YEAR, &[], NewCall::Nothing),
];

/// Look up a step by id (`17`, `13A`)
#[must_use]
pub fn find(id: &str) -> Option<&'static Step> {
    STEPS.iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::parse_step_identifier;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn table_covers_every_step_once() {
        assert_eq!(STEPS.len(), 32);
        let ids: HashSet<&str> = STEPS.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), STEPS.len());
        for id in ["00", "13A", "13B", "24B", "29"] {
            assert!(find(id).is_some(), "{id}");
        }
        assert_eq!(STEPS.first().map(|s| s.id), Some("00"));
        assert_eq!(STEPS.last().map(|s| s.id), Some("29"));
    }

    #[test]
    fn edit_run_produces_every_criteria_report() {
        let edit = find("17").unwrap();
        let ids: Vec<&str> = edit.reports.iter().map(|r| r.report_id).collect();
        let criteria: Vec<&str> = yematch_reports::PAY426N_CRITERIA.iter().map(|c| c.report_id).collect();
        assert_eq!(ids, criteria);
        assert_eq!(find("27").unwrap().reports[0].report_id, "QPAY066");
    }

    #[test]
    fn every_report_has_an_extractor() {
        let registry = yematch_reports::default_extractors();
        for step in STEPS {
            for report in step.reports {
                assert!(registry.get(report.report_id).is_some(), "{}", report.report_id);
            }
        }
    }

    #[test]
    fn screens_are_disabled_on_the_legacy_side() {
        assert!(!parse_step_identifier(find("07").unwrap().legacy_job).0);
        assert!(parse_step_identifier(find("17").unwrap().legacy_job).0);
    }

    #[test]
    fn artifact_paths() {
        let artifact = ReportArtifact::same("PAY426N-03");
        assert_eq!(artifact.remote_path("/data/reports/", "20240104"), "/data/reports/PAY426N-03_20240104.txt");
        assert_eq!(artifact.local_name("R17"), "R17-PAY426N-03.txt");
        assert_eq!(find("13A").unwrap().legacy_name(), "R13A");
    }
}
