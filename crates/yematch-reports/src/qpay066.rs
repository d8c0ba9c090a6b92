//! QPAY066 termination / profit-share breakdown report
//!
//! Data rows start with a badge (employees) or badge+PSN suffix
//! (beneficiaries). Every money column may carry a trailing minus. The report
//! ends with four labelled totals which must all be present.

use crate::error::{reconcile, ReportError, ReportResult};
use crate::extractor::{Report, ReportExtractor};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use yematch_diff::{FieldValue, Tracked, TrackedField};
use yematch_fixedwidth::{self as fw, FieldResult, FieldSpec, ParsedRecord};

/// Report identifier
pub const REPORT_ID: &str = "QPAY066";

const AMOUNT_IN_PROFIT_SHARING: &str = "AMOUNT IN PROFIT SHARING";
const VESTED_AMOUNT: &str = "VESTED AMOUNT";
const TOTAL_FORFEITURES: &str = "TOTAL FORFEITURES";
/// Spelled as the legacy writer prints it
const TOTAL_BENEFICIARY_ALLOCATIONS: &str = "TOTAL BENEFICIARY ALLOCTIONS";

const TOTAL_LABELS: [&str; 4] = [
    AMOUNT_IN_PROFIT_SHARING,
    VESTED_AMOUNT,
    TOTAL_FORFEITURES,
    TOTAL_BENEFICIARY_ALLOCATIONS,
];

const MIN_DETAIL_LEN: usize = 108;

/// Column layout of a QPAY066 data row
pub const LAYOUT: &[FieldSpec] = &[
    FieldSpec::new("BadgeOrPsn", 0, 12),
    FieldSpec::new("Name", 12, 19),
    FieldSpec::new("BeginningBalance", 31, 13),
    FieldSpec::new("BeneficiaryAllocation", 44, 14),
    FieldSpec::new("Distribution", 58, 13),
    FieldSpec::new("Forfeit", 70, 13),
    FieldSpec::new("EndingBalance", 83, 13),
    FieldSpec::new("VestedBalance", 96, 14),
    FieldSpec::new("DateTerm", 110, 6),
    FieldSpec::new("YtdVestedHours", 118, 7),
    FieldSpec::to_end("Trailing", 125),
];

/// Badge plus the beneficiary suffix, zero for employees
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PsnKey {
    /// Employee badge
    pub badge: i64,
    /// Beneficiary suffix
    pub psn_suffix: i64,
}

impl fmt::Display for PsnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.psn_suffix == 0 {
            write!(f, "{}", self.badge)
        } else {
            write!(f, "{}{:04}", self.badge, self.psn_suffix)
        }
    }
}

/// One employee or beneficiary row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QPay066Record {
    /// Employee badge
    pub badge_number: i64,
    /// Beneficiary suffix, zero for employees
    #[serde(default)]
    pub psn_suffix: i64,
    /// Name as printed
    pub employee_name: String,
    /// Balance at the start of the year
    pub beginning_balance: Decimal,
    /// Amount allocated to a beneficiary
    pub beneficiary_allocation: Decimal,
    /// Paid out this year
    pub distribution_amount: Decimal,
    /// Forfeited this year
    pub forfeit: Decimal,
    /// Balance at the end of the year
    pub ending_balance: Decimal,
    /// Vested part of the ending balance
    pub vested_balance: Decimal,
    /// Termination date
    #[serde(default)]
    pub date_term: Option<NaiveDate>,
    /// Vesting hours this year
    #[serde(default)]
    pub ytd_vst_ps_hours: Decimal,
    /// Vesting percentage
    #[serde(default)]
    pub vested_percent: Decimal,
    /// Age when printed
    #[serde(default)]
    pub age: Option<i64>,
    /// Executive flag column
    #[serde(default)]
    pub executive_code: Option<String>,
}

/// The four labelled totals ending the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QPay066Totals {
    /// Sum of ending balances
    pub amount_in_profit_sharing: Decimal,
    /// Sum of vested balances
    pub vested_amount: Decimal,
    /// Sum of forfeits
    pub total_forfeitures: Decimal,
    /// Sum of beneficiary allocations
    pub total_beneficiary_allocations: Decimal,
}

impl QPay066Totals {
    /// Totals as the detail rows imply them
    #[must_use]
    pub fn compute(records: &[QPay066Record]) -> Self {
        Self {
            amount_in_profit_sharing: records.iter().map(|r| r.ending_balance).sum(),
            vested_amount: records.iter().map(|r| r.vested_balance).sum(),
            total_forfeitures: records.iter().map(|r| r.forfeit).sum(),
            total_beneficiary_allocations: records.iter().map(|r| r.beneficiary_allocation).sum(),
        }
    }
}

const QPAY066_FIELDS: &[TrackedField<QPay066Record>] = &[
    TrackedField::exact("employeeName", |r| FieldValue::Text(r.employee_name.clone())),
    TrackedField::cents("beginningBalance", |r| FieldValue::Decimal(r.beginning_balance)),
    TrackedField::cents("beneficiaryAllocation", |r| FieldValue::Decimal(r.beneficiary_allocation)),
    TrackedField::cents("distributionAmount", |r| FieldValue::Decimal(r.distribution_amount)),
    TrackedField::cents("forfeit", |r| FieldValue::Decimal(r.forfeit)),
    TrackedField::cents("endingBalance", |r| FieldValue::Decimal(r.ending_balance)),
    TrackedField::cents("vestedBalance", |r| FieldValue::Decimal(r.vested_balance)),
    TrackedField::exact("dateTerm", |r| FieldValue::Date(r.date_term)),
    TrackedField::cents("ytdVstPsHours", |r| FieldValue::Decimal(r.ytd_vst_ps_hours)),
    TrackedField::cents("vestedPercent", |r| FieldValue::Decimal(r.vested_percent)),
    TrackedField::exact("age", |r| FieldValue::OptInt(r.age)),
];

impl Tracked for QPay066Record {
    type Key = PsnKey;

    fn fields() -> &'static [TrackedField<Self>] {
        QPAY066_FIELDS
    }

    fn key(&self) -> PsnKey {
        PsnKey {
            badge: self.badge_number,
            psn_suffix: self.psn_suffix,
        }
    }
}

/// Parser for QPAY066 text
#[derive(Debug, Clone, Copy, Default)]
pub struct QPay066Extractor;

impl QPay066Extractor {
    fn parse_badge(raw: &str) -> FieldResult<PsnKey> {
        if raw.len() > 7 {
            let (badge, suffix) = raw.split_at(raw.len() - 4);
            Ok(PsnKey {
                badge: fw::parse_int("BadgeOrPsn", badge)?,
                psn_suffix: fw::parse_int("BadgeOrPsn", suffix)?,
            })
        } else {
            Ok(PsnKey {
                badge: fw::parse_int("BadgeOrPsn", raw)?,
                psn_suffix: 0,
            })
        }
    }

    fn parse_detail(line: &str) -> FieldResult<QPay066Record> {
        let rec = ParsedRecord::from_line(line, LAYOUT);
        let key = Self::parse_badge(rec.text("BadgeOrPsn")?)?;

        let date_term = rec.date_yymmdd("DateTerm").ok().flatten();
        let ytd_vst_ps_hours = rec
            .text("YtdVestedHours")
            .ok()
            .and_then(|t| fw::parse_signed_decimal("YtdVestedHours", t).ok())
            .unwrap_or(Decimal::ZERO);

        let trailing: Vec<&str> = rec.text("Trailing").map(|t| t.split_whitespace().collect()).unwrap_or_default();
        let vested_percent = trailing
            .first()
            .and_then(|t| fw::parse_signed_decimal("Pct", t).ok())
            .unwrap_or(Decimal::ZERO);
        let age = trailing.get(1).and_then(|t| t.parse::<i64>().ok());
        let executive_code = trailing.get(2).and_then(|t| t.chars().next()).map(String::from);

        Ok(QPay066Record {
            badge_number: key.badge,
            psn_suffix: key.psn_suffix,
            employee_name: rec.text("Name")?.to_string(),
            beginning_balance: rec.signed_decimal("BeginningBalance")?,
            beneficiary_allocation: rec.signed_decimal("BeneficiaryAllocation")?,
            distribution_amount: rec.signed_decimal("Distribution")?,
            forfeit: rec.signed_decimal("Forfeit")?,
            ending_balance: rec.signed_decimal("EndingBalance")?,
            vested_balance: rec.signed_decimal("VestedBalance")?,
            date_term,
            ytd_vst_ps_hours,
            vested_percent,
            age,
            executive_code,
        })
    }

    /// Collect the data rows ahead of the first total label
    #[must_use]
    pub fn parse_records(text: &str) -> Vec<QPay066Record> {
        fw::lines(text)
            .take_while(|line| !Self::is_total_line(line))
            .filter(|line| line.len() >= MIN_DETAIL_LEN)
            .filter(|line| line.trim_start().starts_with(|c: char| c.is_ascii_digit()))
            .filter_map(|line| match Self::parse_detail(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::trace!(report = REPORT_ID, error = %e, "skipping malformed data line");
                    None
                }
            })
            .collect()
    }

    fn is_total_line(line: &str) -> bool {
        let trimmed = line.trim_start();
        TOTAL_LABELS.iter().any(|label| trimmed.starts_with(label))
    }

    /// Read the four labelled totals
    ///
    /// # Errors
    /// [`ReportError::MissingTrailer`] naming the first label not found.
    pub fn parse_totals(text: &str) -> ReportResult<QPay066Totals> {
        let mut found: [Option<Decimal>; 4] = [None; 4];

        for line in fw::lines(text) {
            let trimmed = line.trim();
            for (slot, label) in found.iter_mut().zip(TOTAL_LABELS) {
                if let Some(value) = trimmed.strip_prefix(label) {
                    *slot = Some(fw::parse_signed_decimal("total", value).map_err(|_| {
                        ReportError::trailer(REPORT_ID, format!("cannot read value of '{trimmed}'"))
                    })?);
                    break;
                }
            }
        }

        let mut values = [Decimal::ZERO; 4];
        for ((value, slot), label) in values.iter_mut().zip(found).zip(TOTAL_LABELS) {
            *value = slot.ok_or_else(|| ReportError::missing_trailer(REPORT_ID, label))?;
        }
        let [amount_in_profit_sharing, vested_amount, total_forfeitures, total_beneficiary_allocations] = values;
        Ok(QPay066Totals {
            amount_in_profit_sharing,
            vested_amount,
            total_forfeitures,
            total_beneficiary_allocations,
        })
    }
}

impl ReportExtractor for QPay066Extractor {
    type Record = QPay066Record;
    type Totals = QPay066Totals;

    fn report_id(&self) -> &str {
        REPORT_ID
    }

    fn parse(&self, text: &str) -> ReportResult<Report<QPay066Record, QPay066Totals>> {
        let records = Self::parse_records(text);
        if records.is_empty() {
            return Err(ReportError::no_detail_rows(REPORT_ID));
        }
        let declared = Self::parse_totals(text)?;
        let computed = QPay066Totals::compute(&records);

        reconcile(REPORT_ID, "ending balance", computed.amount_in_profit_sharing, declared.amount_in_profit_sharing)?;
        reconcile(REPORT_ID, "vested amount", computed.vested_amount, declared.vested_amount)?;
        reconcile(REPORT_ID, "forfeitures", computed.total_forfeitures, declared.total_forfeitures)?;
        reconcile(
            REPORT_ID,
            "beneficiary allocations",
            computed.total_beneficiary_allocations,
            declared.total_beneficiary_allocations,
        )?;

        tracing::debug!(report = REPORT_ID, records = records.len(), "parsed");
        Ok(Report {
            records,
            totals: declared,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use yematch_test_utils::fixtures::{QPay066Fixture, QPay066Row};

    const ACOSTA: &str = "     705900 ACOSTA, EVELYN         1,369.58         0.00         0.00         0.00     1,369.58     1,369.58  240406    0.00 100  27 4";

    #[test]
    fn parses_known_line() {
        let rec = QPay066Extractor::parse_detail(ACOSTA).unwrap();
        assert_eq!(rec.badge_number, 705_900);
        assert_eq!(rec.psn_suffix, 0);
        assert_eq!(rec.employee_name, "ACOSTA, EVELYN");
        assert_eq!(rec.beginning_balance, Decimal::new(136_958, 2));
        assert_eq!(rec.vested_balance, Decimal::new(136_958, 2));
        assert_eq!(rec.date_term, NaiveDate::from_ymd_opt(2024, 4, 6));
        assert_eq!(rec.vested_percent, Decimal::from(100));
        assert_eq!(rec.age, Some(27));
        assert_eq!(rec.executive_code.as_deref(), Some("4"));
    }

    #[test]
    fn psn_suffix_split() {
        assert_eq!(
            QPay066Extractor::parse_badge("7039171000").unwrap(),
            PsnKey { badge: 703_917, psn_suffix: 1000 }
        );
        assert_eq!(PsnKey { badge: 703_917, psn_suffix: 1000 }.to_string(), "7039171000");
        assert_eq!(PsnKey { badge: 705_900, psn_suffix: 0 }.to_string(), "705900");
    }

    fn fixture() -> QPay066Fixture {
        QPay066Fixture::new()
            .row(QPay066Row::new("705900", "ACOSTA, EVELYN").beginning(1_369_58).ending(1_369_58).vested(1_369_58))
            .row(QPay066Row::new("7039171000", "ALLEN, RAYMOND").beneficiary(99_801_68).ending(99_801_68).vested(99_801_68))
            .row(QPay066Row::new("702043", "ACOSTA, GREGORY").beginning(50_000_00).forfeit(-6_376_74).ending(43_623_26).vested(43_623_26))
    }

    #[test]
    fn parses_rows_and_reconciles_totals() {
        let report = QPay066Extractor.parse(&fixture().render()).unwrap();
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.totals.total_forfeitures, Decimal::new(-6_376_74, 2));
        assert_eq!(report.totals.total_beneficiary_allocations, Decimal::new(99_801_68, 2));
        assert_eq!(report.totals, QPay066Totals::compute(&report.records));
    }

    #[test]
    fn rows_after_the_totals_are_ignored() {
        let text = format!("{}{ACOSTA}\n", fixture().render());
        let records = QPay066Extractor::parse_records(&text);
        assert_eq!(records.len(), 3);
        assert_eq!(records.iter().filter(|r| r.badge_number == 705_900).count(), 1);
        assert!(QPay066Extractor.parse(&text).is_ok());
    }

    #[test]
    fn missing_total_label_fails() {
        let text = fixture().render().replace(TOTAL_BENEFICIARY_ALLOCATIONS, "SOMETHING ELSE");
        let err = QPay066Extractor.parse(&text).unwrap_err();
        assert!(matches!(err, ReportError::MissingTrailer { marker: TOTAL_BENEFICIARY_ALLOCATIONS, .. }));
    }

    #[test]
    fn forfeit_off_by_a_cent_fails() {
        let text = fixture().forfeit_total_adjustment(1).render();
        let err = QPay066Extractor.parse(&text).unwrap_err();
        let ReportError::Validation(v) = err else { panic!("expected validation error") };
        assert_eq!(v.field, "forfeitures");
        assert_eq!(v.computed, "-6376.74");
        assert_eq!(v.declared, "-6376.73");
    }
}
