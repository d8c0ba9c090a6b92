//! PAY426 year-end profit-share report
//!
//! Detail rows run until the `-SECTION TOTAL-` line, which states wages,
//! hours and points for everyone except under-21 rows. An `EMPLOYEE TOTALS`
//! block follows with the all/new/under-21/in-plan headcounts.

use crate::error::{compiled, reconcile, ReportError, ReportResult};
use crate::extractor::{Report, ReportExtractor};
use crate::profit_share::{ProfitShareRecord, ReportTotals};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use yematch_fixedwidth::{self as fw, FieldResult, FieldSpec, ParsedRecord};

/// Report identifier
pub const REPORT_ID: &str = "PAY426";

/// Trailer that ends the detail section
pub const SECTION_TOTAL: &str = "-SECTION TOTAL-";

static DETAIL: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"^(I\s+|\s+)\d{6,7}"));
static SECTION: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"-SECTION TOTAL-\s+(.+)"));

/// Column layout of a PAY426 detail row
pub const LAYOUT: &[FieldSpec] = &[
    FieldSpec::new("Prefix", 0, 3),
    FieldSpec::new("Badge", 3, 7),
    FieldSpec::new("Name", 13, 28),
    FieldSpec::new("Store", 41, 6),
    FieldSpec::new("TypeCode", 47, 1),
    FieldSpec::new("DateOfBirth", 52, 8),
    FieldSpec::new("Age", 60, 7),
    FieldSpec::new("Ssn", 67, 12),
    FieldSpec::new("Wages", 80, 14),
    FieldSpec::new("Hours", 101, 8),
    FieldSpec::new("Points", 111, 4),
    FieldSpec::new("Marker", 115, 5),
];

/// Lines shorter than the end of the hours column cannot be detail rows
const MIN_DETAIL_LEN: usize = 109;

/// Parser for PAY426 text
#[derive(Debug, Clone, Copy, Default)]
pub struct Pay426Extractor;

impl Pay426Extractor {
    /// Parse one candidate detail line; `Ok(None)` for rows that are not employees
    fn parse_detail(line: &str) -> FieldResult<Option<ProfitShareRecord>> {
        let rec = ParsedRecord::from_line(line, LAYOUT);

        let Ok(badge) = rec.int("Badge") else { return Ok(None) };
        let Ok(store) = rec.int("Store") else { return Ok(None) };
        let Ok(age) = rec.int("Age") else { return Ok(None) };
        if !rec.has_value("Hours") {
            return Ok(None);
        }

        let hours = rec.decimal("Hours")?;
        let points = if rec.has_value("Points") {
            rec.decimal("Points")?
        } else {
            Decimal::ZERO
        };
        let marker = rec.text("Marker").unwrap_or_default();

        Ok(Some(ProfitShareRecord {
            badge_number: badge,
            employee_name: rec.text("Name")?.to_string(),
            store_number: store,
            employee_type_code: rec.text("TypeCode")?.to_string(),
            date_of_birth: rec.date_mdy("DateOfBirth")?.unwrap_or_else(fw::unknown_date),
            age,
            ssn: rec.text("Ssn")?.replace(' ', ""),
            wages: rec.signed_decimal("Wages")?,
            hours: hours.trunc(),
            points,
            is_new: marker.contains("NEW"),
            is_under_21: marker.contains("<21"),
            employee_status: None,
            balance: Decimal::ZERO,
            years_in_plan: 0,
            termination_date: None,
        }))
    }

    /// Collect detail rows up to the section total
    ///
    /// # Errors
    /// Only when the discriminator pattern fails to compile.
    pub fn parse_records(text: &str) -> ReportResult<Vec<ProfitShareRecord>> {
        let detail = compiled(&DETAIL)?;
        let mut records = Vec::new();

        for line in fw::lines(text) {
            if line.contains(SECTION_TOTAL) {
                break;
            }
            if line.len() < MIN_DETAIL_LEN {
                continue;
            }
            let head = line.get(..11).unwrap_or(line);
            if !detail.is_match(head) {
                continue;
            }
            match Self::parse_detail(line) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => tracing::trace!(report = REPORT_ID, error = %e, "skipping malformed detail line"),
            }
        }
        Ok(records)
    }

    /// Read the section total and the headcount block
    ///
    /// # Errors
    /// [`ReportError::MissingTrailer`] or [`ReportError::Trailer`].
    pub fn parse_totals(text: &str) -> ReportResult<ReportTotals> {
        let section = compiled(&SECTION)?;
        let mut figures: Option<(Decimal, i64, Decimal)> = None;
        let mut in_headcount = false;
        let mut counts: Option<[usize; 4]> = None;

        for line in fw::lines(text) {
            if figures.is_none() {
                if let Some(caps) = section.captures(line) {
                    let parts: Vec<&str> = caps[1].split_whitespace().collect();
                    if parts.len() < 3 {
                        return Err(ReportError::trailer(REPORT_ID, format!("section total has {} figures", parts.len())));
                    }
                    figures = Some((
                        fw::parse_signed_decimal("wages", parts[0])?,
                        fw::truncate_hours(fw::parse_signed_decimal("hours", parts[1])?),
                        fw::parse_signed_decimal("points", parts[2])?,
                    ));
                }
            }
            if line.contains("EMPLOYEE TOTALS") && line.contains("ALL-EMP") {
                in_headcount = true;
                continue;
            }
            if in_headcount && line.chars().any(|c| c.is_ascii_digit()) {
                counts = Some(parse_headcounts(line)?);
                break;
            }
        }

        let (wages, hours, points) = figures.ok_or_else(|| ReportError::missing_trailer(REPORT_ID, SECTION_TOTAL))?;
        let [all_employees, new_employees, under_21, in_plan] =
            counts.ok_or_else(|| ReportError::missing_trailer(REPORT_ID, "EMPLOYEE TOTALS"))?;

        Ok(ReportTotals {
            wages,
            hours,
            points,
            all_employees,
            new_employees,
            under_21,
            in_plan,
        })
    }

    /// Reconcile detail rows against the trailer
    ///
    /// # Errors
    /// The first figure that disagrees.
    pub fn validate(records: &[ProfitShareRecord], totals: &ReportTotals) -> ReportResult<()> {
        let counted: Vec<&ProfitShareRecord> = records.iter().filter(|r| !r.is_under_21).collect();
        let wages: Decimal = counted.iter().map(|r| r.wages).sum();
        let hours: i64 = counted.iter().map(|r| fw::truncate_hours(r.hours)).sum();

        reconcile(REPORT_ID, "wages", wages, totals.wages)?;
        reconcile(REPORT_ID, "hours", hours, totals.hours)?;
        reconcile(REPORT_ID, "employee count", records.len(), totals.all_employees)?;
        reconcile(REPORT_ID, "new employee count", records.iter().filter(|r| r.is_new).count(), totals.new_employees)?;
        reconcile(REPORT_ID, "under-21 count", records.iter().filter(|r| r.is_under_21).count(), totals.under_21)?;
        reconcile(REPORT_ID, "in-plan count", records.iter().filter(|r| r.in_plan()).count(), totals.in_plan)?;
        Ok(())
    }
}

fn parse_headcounts(line: &str) -> ReportResult<[usize; 4]> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(ReportError::trailer(REPORT_ID, format!("headcount line has {} figures", parts.len())));
    }
    let mut counts = [0usize; 4];
    for (slot, raw) in counts.iter_mut().zip(&parts) {
        let n = fw::parse_int("headcount", &raw.replace(',', ""))?;
        *slot = usize::try_from(n).map_err(|_| ReportError::trailer(REPORT_ID, format!("negative headcount {n}")))?;
    }
    Ok(counts)
}

impl ReportExtractor for Pay426Extractor {
    type Record = ProfitShareRecord;
    type Totals = ReportTotals;

    fn report_id(&self) -> &str {
        REPORT_ID
    }

    fn parse(&self, text: &str) -> ReportResult<Report<ProfitShareRecord, ReportTotals>> {
        let records = Self::parse_records(text)?;
        if records.is_empty() {
            return Err(ReportError::no_detail_rows(REPORT_ID));
        }
        let totals = Self::parse_totals(text)?;
        Self::validate(&records, &totals)?;
        tracing::debug!(report = REPORT_ID, records = records.len(), "parsed");
        Ok(Report { records, totals })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use yematch_test_utils::fixtures::{Pay426Fixture, Pay426Row};

    fn fixture() -> Pay426Fixture {
        Pay426Fixture::new()
            .row(Pay426Row::new(700_123, "SMITH, JO", 4).wages(12_345_67).hours(1_040_75).points(123))
            .row(Pay426Row::new(700_456, "JONES, AL", 12).wages(8_000_00).hours(999_99).inactive())
            .row(Pay426Row::new(701_001, "YOUNG, KID", 12).wages(2_500_00).hours(300_00).age(19).under_21())
            .row(Pay426Row::new(701_777, "NEWMAN, ED", 7).wages(1_000_01).hours(1_200_50).new_hire())
    }

    #[test]
    fn parses_rows_and_totals() {
        let report = Pay426Extractor.parse(&fixture().render()).unwrap();
        assert_eq!(report.records.len(), 4);
        assert_eq!(report.totals.all_employees, 4);
        assert_eq!(report.totals.wages, Decimal::new(21_345_68, 2));
        assert_eq!(report.totals.hours, 1040 + 999 + 1200);

        let smith = &report.records[0];
        assert_eq!(smith.badge_number, 700_123);
        assert_eq!(smith.employee_name, "SMITH, JO");
        assert_eq!(smith.store_number, 4);
        assert_eq!(smith.hours, Decimal::from(1040));
        assert_eq!(smith.points, Decimal::from(123));
        assert!(smith.in_plan());

        assert!(report.records[2].is_under_21);
        assert!(report.records[3].is_new);
    }

    #[test]
    fn corrupted_wage_total_names_both_values() {
        let text = fixture().wage_total_adjustment(1).render();
        let err = Pay426Extractor.parse(&text).unwrap_err();
        let ReportError::Validation(v) = err else { panic!("expected validation error, got {err}") };
        assert_eq!(v.field, "wages");
        assert_eq!(v.computed, "21345.68");
        assert_eq!(v.declared, "21345.69");
    }

    #[test]
    fn headcount_mismatch_is_reported() {
        let text = fixture().headcounts([5, 1, 1, 2]).render();
        let err = Pay426Extractor.parse(&text).unwrap_err();
        assert!(err.to_string().contains("employee count"), "{err}");
    }

    #[test]
    fn zero_rows_is_an_error() {
        let err = Pay426Extractor.parse(&Pay426Fixture::new().render()).unwrap_err();
        assert!(matches!(err, ReportError::NoDetailRows { .. }));
    }

    #[test]
    fn missing_trailer_is_an_error() {
        let text = fixture().render();
        let cut = text.find(SECTION_TOTAL).unwrap();
        let err = Pay426Extractor.parse(&text[..cut]).unwrap_err();
        assert!(matches!(err, ReportError::MissingTrailer { marker: SECTION_TOTAL, .. }));
    }

    #[test]
    fn header_noise_is_skipped() {
        let text = format!("REPORT PAY426     PAGE 1\n   BADGE   NAME\n{}", fixture().render());
        assert_eq!(Pay426Extractor.parse(&text).unwrap().records.len(), 4);
    }
}
