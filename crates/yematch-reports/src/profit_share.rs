//! Profit-share detail rows shared by PAY426 and its per-criteria variant

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use yematch_diff::{FieldValue, Tracked, TrackedField};

/// Employment status column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmployeeStatus {
    /// Blank status column
    #[serde(rename = "A")]
    Active,
    /// `I`
    #[serde(rename = "I")]
    Inactive,
    /// `T`, or any row carrying a termination date
    #[serde(rename = "T")]
    Terminated,
}

impl EmployeeStatus {
    /// Decode the single status column; blank is active
    #[must_use]
    pub fn from_column(c: char) -> Option<Self> {
        match c {
            ' ' | 'A' => Some(Self::Active),
            'I' => Some(Self::Inactive),
            'T' => Some(Self::Terminated),
            _ => None,
        }
    }

    /// Single-letter code
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Active => "A",
            Self::Inactive => "I",
            Self::Terminated => "T",
        }
    }
}

/// One employee or beneficiary row of a profit-share report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitShareRecord {
    /// Employee badge, the comparison key
    pub badge_number: i64,
    /// `LAST, FIRST` as printed
    pub employee_name: String,
    /// Home store
    pub store_number: i64,
    /// Single-letter employee type
    pub employee_type_code: String,
    /// Birth date, a placeholder when unknown
    pub date_of_birth: NaiveDate,
    /// Age at the profit year end
    pub age: i64,
    /// Digits only
    pub ssn: String,
    /// Profit-year wages
    pub wages: Decimal,
    /// Already truncated to whole hours
    pub hours: Decimal,
    /// Allocation points
    pub points: Decimal,
    /// Hired during the profit year
    pub is_new: bool,
    /// Younger than 21
    #[serde(rename = "isUnder21")]
    pub is_under_21: bool,
    /// Status column, `Terminated` when a termination date is printed
    #[serde(default)]
    pub employee_status: Option<EmployeeStatus>,
    /// Current profit-share balance
    #[serde(default)]
    pub balance: Decimal,
    /// Vesting years
    #[serde(default)]
    pub years_in_plan: i64,
    /// Set for terminated employees
    #[serde(default)]
    pub termination_date: Option<NaiveDate>,
}

impl ProfitShareRecord {
    /// Neither new nor under 21
    #[inline]
    #[must_use]
    pub fn in_plan(&self) -> bool {
        !self.is_new && !self.is_under_21
    }
}

/// Trailer figures of a profit-share report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    /// Profit-year wages
    pub wages: Decimal,
    /// Whole hours, each row truncated before summing
    pub hours: i64,
    /// Allocation points
    pub points: Decimal,
    /// Headcount of every row
    pub all_employees: usize,
    /// Rows hired this year
    pub new_employees: usize,
    /// Rows younger than 21
    pub under_21: usize,
    /// Rows neither new nor under 21
    pub in_plan: usize,
}

const PROFIT_SHARE_FIELDS: &[TrackedField<ProfitShareRecord>] = &[
    TrackedField::exact("employeeName", |r| FieldValue::Text(r.employee_name.clone())),
    TrackedField::exact("storeNumber", |r| FieldValue::Int(r.store_number)),
    TrackedField::exact("employeeTypeCode", |r| FieldValue::Text(r.employee_type_code.clone())),
    TrackedField::exact("dateOfBirth", |r| FieldValue::Date(Some(r.date_of_birth))),
    TrackedField::exact("age", |r| FieldValue::Int(r.age)),
    TrackedField::exact("ssn", |r| FieldValue::Text(r.ssn.clone())),
    TrackedField::cents("wages", |r| FieldValue::Decimal(r.wages)),
    TrackedField::cents("hours", |r| FieldValue::Decimal(r.hours)),
    TrackedField::cents("points", |r| FieldValue::Decimal(r.points)),
    TrackedField::exact("isNew", |r| FieldValue::Bool(r.is_new)),
    TrackedField::exact("isUnder21", |r| FieldValue::Bool(r.is_under_21)),
    TrackedField::exact("employeeStatus", |r| {
        FieldValue::Text(r.employee_status.map(EmployeeStatus::code).unwrap_or_default().to_string())
    }),
    TrackedField::cents("balance", |r| FieldValue::Decimal(r.balance)),
    TrackedField::exact("yearsInPlan", |r| FieldValue::Int(r.years_in_plan)),
    TrackedField::exact("terminationDate", |r| FieldValue::Date(r.termination_date)),
];

impl Tracked for ProfitShareRecord {
    type Key = i64;

    fn fields() -> &'static [TrackedField<Self>] {
        PROFIT_SHARE_FIELDS
    }

    fn key(&self) -> i64 {
        self.badge_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_column_decoding() {
        assert_eq!(EmployeeStatus::from_column(' '), Some(EmployeeStatus::Active));
        assert_eq!(EmployeeStatus::from_column('I'), Some(EmployeeStatus::Inactive));
        assert_eq!(EmployeeStatus::from_column('T'), Some(EmployeeStatus::Terminated));
        assert_eq!(EmployeeStatus::from_column('X'), None);
    }

    #[test]
    fn decodes_new_system_json() {
        let json = r#"{
            "badgeNumber": 700123, "employeeName": "SMITH, JO", "storeNumber": 4,
            "employeeTypeCode": "H", "dateOfBirth": "1965-03-15", "age": 59,
            "ssn": "000008004", "wages": "1234.56", "hours": 1040, "points": 12,
            "isNew": false, "isUnder21": false, "employeeStatus": "T",
            "terminationDate": "2024-04-06"
        }"#;
        let rec: ProfitShareRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.badge_number, 700_123);
        assert_eq!(rec.wages, Decimal::new(123_456, 2));
        assert_eq!(rec.employee_status, Some(EmployeeStatus::Terminated));
        assert_eq!(rec.balance, Decimal::ZERO);
        assert!(rec.in_plan());
    }
}
