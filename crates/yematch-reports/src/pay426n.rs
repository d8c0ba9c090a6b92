//! PAY426N per-criteria profit-share sub-reports
//!
//! Same population as PAY426 but split by criteria (see [`crate::criteria`]).
//! The trailer only states a headcount and total wages, both over every row;
//! the remaining totals are derived from the rows themselves.

use crate::error::{compiled, reconcile, ReportError, ReportResult};
use crate::extractor::{Report, ReportExtractor};
use crate::profit_share::{EmployeeStatus, ProfitShareRecord, ReportTotals};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use yematch_fixedwidth::{self as fw, FieldResult, FieldSpec, ParsedRecord};

/// Trailer of employee sub-reports
pub const TOTAL_EMPS: &str = "TOTAL EMPS:";

/// Trailer of the beneficiary sub-report, spelled as the legacy writer prints it
pub const TOTAL_BENEFICIARIES: &str = "TOTAL NON-EMP BENEFICIAIRIES:";

static DETAIL: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"^(I\s+|\s+)\d{1,7}"));
static TRAILER: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"(?:TOTAL EMPS:|TOTAL NON-EMP BENEFICIAIRIES:)\s+(.+)"));

/// Column layout of a PAY426N detail row
pub const LAYOUT: &[FieldSpec] = &[
    FieldSpec::new("Status", 0, 1),
    FieldSpec::new("Badge", 3, 7),
    FieldSpec::new("Name", 10, 26),
    FieldSpec::new("Store", 36, 4),
    FieldSpec::new("TypeCode", 40, 1),
    FieldSpec::new("DateOfBirth", 42, 9),
    FieldSpec::new("Age", 51, 5),
    FieldSpec::new("Ssn", 56, 12),
    FieldSpec::new("Wages", 72, 12),
    FieldSpec::new("Hours", 84, 12),
    FieldSpec::from_triple("Points", 91, -1),
    FieldSpec::new("Marker", 98, 6),
    FieldSpec::new("TermDate", 104, 8),
    FieldSpec::new("Balance", 118, 14),
    FieldSpec::new("YearsInPlan", 132, 3),
];

const MIN_DETAIL_LEN: usize = 96;

/// Parser for one PAY426N sub-report
#[derive(Debug, Clone)]
pub struct Pay426NExtractor {
    report_id: String,
}

impl Pay426NExtractor {
    /// Create an extractor labelled with a sub-report id such as `PAY426N-03`
    #[must_use]
    pub fn new(report_id: impl Into<String>) -> Self {
        Self {
            report_id: report_id.into(),
        }
    }

    /// Points run from their start column up to the marker's `(`
    fn points_text(line: &str) -> &str {
        let start = 91;
        let Some(tail) = line.get(start..) else { return "" };
        match tail.find('(') {
            Some(pos) if pos > 0 => &tail[..pos],
            _ => tail,
        }
    }

    fn parse_detail(line: &str) -> FieldResult<Option<ProfitShareRecord>> {
        let rec = ParsedRecord::from_line(line, LAYOUT);

        let Ok(badge) = rec.int("Badge") else { return Ok(None) };
        let Ok(store) = rec.int("Store") else { return Ok(None) };

        let Some(hours_token) = rec.text("Hours")?.split_whitespace().next() else {
            return Ok(None);
        };
        let hours = fw::parse_decimal("Hours", hours_token)?;

        let status = rec.raw("Status")?.chars().next().and_then(EmployeeStatus::from_column);
        let age = rec
            .text("Age")?
            .trim_matches(|c: char| c == '(' || c == ')')
            .trim()
            .parse::<i64>()
            .unwrap_or(0);
        let points = fw::parse_signed_decimal("Points", Self::points_text(line)).unwrap_or(Decimal::ZERO);

        let marker = rec.raw("Marker").unwrap_or_default();
        let termination_date = rec
            .text("TermDate")
            .ok()
            .filter(|t| t.contains('/'))
            .and_then(|t| fw::parse_mdy("TermDate", t).ok().flatten());
        let balance = rec.signed_decimal("Balance").unwrap_or(Decimal::ZERO);
        let years_in_plan = rec.nullable_int("YearsInPlan").ok().flatten().unwrap_or(0);

        let employee_status = match (status, termination_date) {
            (Some(EmployeeStatus::Active), Some(_)) => Some(EmployeeStatus::Terminated),
            (s, _) => s,
        };

        Ok(Some(ProfitShareRecord {
            badge_number: badge,
            employee_name: rec.text("Name")?.to_string(),
            store_number: store,
            employee_type_code: rec.text("TypeCode")?.to_string(),
            date_of_birth: rec.date_mdy("DateOfBirth")?.unwrap_or_else(fw::unknown_date),
            age,
            ssn: rec.text("Ssn")?.replace('-', ""),
            wages: rec.signed_decimal("Wages")?,
            hours: hours.trunc(),
            points,
            is_new: marker.contains("NEW"),
            // a (NEW) marker hides (<21), so age decides
            is_under_21: age < 21,
            employee_status,
            balance,
            years_in_plan,
            termination_date,
        }))
    }

    /// Collect detail rows up to the trailer
    ///
    /// # Errors
    /// Only when the discriminator pattern fails to compile.
    pub fn parse_records(&self, text: &str) -> ReportResult<Vec<ProfitShareRecord>> {
        let detail = compiled(&DETAIL)?;
        let mut records = Vec::new();

        for line in fw::lines(text) {
            if line.contains(TOTAL_EMPS) || line.contains(TOTAL_BENEFICIARIES) {
                break;
            }
            if line.len() < MIN_DETAIL_LEN {
                continue;
            }
            if !detail.is_match(line.get(..10).unwrap_or(line)) {
                continue;
            }
            match Self::parse_detail(line) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => tracing::trace!(report = %self.report_id, error = %e, "skipping malformed detail line"),
            }
        }
        Ok(records)
    }

    /// Read the declared headcount and wages
    ///
    /// # Errors
    /// [`ReportError::MissingTrailer`] or [`ReportError::Trailer`].
    pub fn parse_trailer(&self, text: &str) -> ReportResult<(usize, Decimal)> {
        let trailer = compiled(&TRAILER)?;
        let caps = fw::lines(text)
            .find_map(|line| trailer.captures(line))
            .ok_or_else(|| ReportError::missing_trailer(&self.report_id, TOTAL_EMPS))?;

        let parts: Vec<&str> = caps[1].split_whitespace().collect();
        let [count, wages, ..] = parts.as_slice() else {
            return Err(ReportError::trailer(&self.report_id, "expected headcount and wages"));
        };
        let count = fw::parse_int("count", &count.replace(',', ""))?;
        let count = usize::try_from(count).map_err(|_| ReportError::trailer(&self.report_id, format!("negative headcount {count}")))?;
        Ok((count, fw::parse_signed_decimal("wages", wages)?))
    }

    /// Totals implied by the rows plus the declared headcount and wages
    #[must_use]
    pub fn totals(records: &[ProfitShareRecord], declared_count: usize, declared_wages: Decimal) -> ReportTotals {
        ReportTotals {
            wages: declared_wages,
            hours: records.iter().map(|r| fw::truncate_hours(r.hours)).sum(),
            points: records.iter().map(|r| r.points).sum(),
            all_employees: declared_count,
            new_employees: records.iter().filter(|r| r.is_new).count(),
            under_21: records.iter().filter(|r| r.is_under_21).count(),
            in_plan: records.iter().filter(|r| r.in_plan()).count(),
        }
    }
}

impl ReportExtractor for Pay426NExtractor {
    type Record = ProfitShareRecord;
    type Totals = ReportTotals;

    fn report_id(&self) -> &str {
        &self.report_id
    }

    fn parse(&self, text: &str) -> ReportResult<Report<ProfitShareRecord, ReportTotals>> {
        let records = self.parse_records(text)?;
        if records.is_empty() {
            return Err(ReportError::no_detail_rows(&self.report_id));
        }
        let (count, wages) = self.parse_trailer(text)?;

        let summed: Decimal = records.iter().map(|r| r.wages).sum();
        reconcile(&self.report_id, "wages", summed, wages)?;
        reconcile(&self.report_id, "employee count", records.len(), count)?;

        tracing::debug!(report = %self.report_id, records = records.len(), "parsed");
        Ok(Report {
            totals: Self::totals(&records, count, wages),
            records,
        })
    }
}
