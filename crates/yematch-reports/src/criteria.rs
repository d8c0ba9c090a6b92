//! PAY426N selection criteria
//!
//! The legacy job prints one sub-report per criteria entry. The New system
//! produces the same sub-report when sent the entry as a request body.

use rust_decimal::Decimal;
use serde::Serialize;

const HOURS_999_9: Decimal = Decimal::from_parts(9_999, 0, 0, false, 1);
const HOURS_999_99: Decimal = Decimal::from_parts(99_999, 0, 0, false, 2);
const HOURS_1000: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);
const HOURS_4000: Decimal = Decimal::from_parts(4_000, 0, 0, false, 0);

/// One PAY426N sub-report definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pay426NCriteria {
    /// Sub-report id such as `PAY426N-03`
    pub report_id: &'static str,
    /// Heading printed on the Legacy report
    pub title: &'static str,
    /// Year-end population rather than a mid-year snapshot
    pub is_year_end: bool,
    /// Youngest age included
    pub minimum_age_inclusive: u32,
    /// Oldest age included
    pub maximum_age_inclusive: u32,
    /// Fewest hours included
    pub minimum_hours_inclusive: Decimal,
    /// Most hours included
    pub maximum_hours_inclusive: Decimal,
    /// Active employees
    pub include_active_employees: bool,
    /// Inactive employees
    pub include_inactive_employees: bool,
    /// Terminated during the profit year
    pub include_employees_terminated_this_year: bool,
    /// Terminated in earlier years
    pub include_terminated_employees: bool,
    /// Non-employee beneficiaries
    pub include_beneficiaries: bool,
    /// Employees with a prior balance
    pub include_employees_with_prior_profit_sharing_amounts: bool,
    /// Employees without a prior balance
    pub include_employees_with_no_prior_profit_sharing_amounts: bool,
}

/// Request body for the New system's year-end report endpoint
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaRequest<'a> {
    /// Filter fields, flattened into the body
    #[serde(flatten)]
    pub criteria: &'a Pay426NCriteria,
    /// Year being closed
    pub profit_year: i32,
}

impl Pay426NCriteria {
    /// Attach the profit year for a New-system request
    #[inline]
    #[must_use]
    pub fn request(&self, profit_year: i32) -> CriteriaRequest<'_> {
        CriteriaRequest {
            criteria: self,
            profit_year,
        }
    }

    /// Whether the sub-report lists beneficiaries instead of employees
    #[inline]
    #[must_use]
    pub fn is_beneficiary_report(&self) -> bool {
        self.include_beneficiaries
    }
}

const fn employees(
    report_id: &'static str,
    title: &'static str,
    ages: (u32, u32),
    hours: (Decimal, Decimal),
    terminated: bool,
    prior: (bool, bool),
) -> Pay426NCriteria {
    Pay426NCriteria {
        report_id,
        title,
        is_year_end: true,
        minimum_age_inclusive: ages.0,
        maximum_age_inclusive: ages.1,
        minimum_hours_inclusive: hours.0,
        maximum_hours_inclusive: hours.1,
        include_active_employees: !terminated,
        include_inactive_employees: !terminated,
        include_employees_terminated_this_year: terminated,
        include_terminated_employees: terminated,
        include_beneficiaries: false,
        include_employees_with_prior_profit_sharing_amounts: prior.0,
        include_employees_with_no_prior_profit_sharing_amounts: prior.1,
    }
}

/// Every PAY426N sub-report, in report order. There is no `-09`.
pub const PAY426N_CRITERIA: &[Pay426NCriteria] = &[
    employees(
        "PAY426N-01",
        "ALL ACTIVE/INACTIVE EMPLOYEES AGE 18-20 WITH >= 1000 PS HOURS",
        (17, 20),
        (HOURS_999_9, HOURS_4000),
        false,
        (true, true),
    ),
    employees(
        "PAY426N-02",
        "ALL ACTIVE/INACTIVE EMPLOYEES >= AGE 21 WITH >= 1000 PS HOURS",
        (21, 200),
        (HOURS_999_9, HOURS_4000),
        false,
        (true, true),
    ),
    employees(
        "PAY426N-03",
        "ALL ACTIVE/INACTIVE EMPLOYEES < AGE 18",
        (0, 17),
        (Decimal::ZERO, HOURS_4000),
        false,
        (true, true),
    ),
    employees(
        "PAY426N-04",
        "ALL ACTIVE/INACTIVE EMPLOYEES >= AGE 18 WITH < 1000 PS HOURS AND PRIOR PS AMOUNT",
        (18, 200),
        (Decimal::ZERO, HOURS_999_99),
        false,
        (true, false),
    ),
    employees(
        "PAY426N-05",
        "ALL ACTIVE/INACTIVE EMPLOYEES >= AGE 18 WITH < 1000 PS HOURS AND NO PRIOR PS AMOUNT",
        (18, 200),
        (Decimal::ZERO, HOURS_999_99),
        false,
        (false, true),
    ),
    employees(
        "PAY426N-06",
        "ALL TERMINATED EMPLOYEES >= AGE 18 WITH >= 1000 PS HOURS",
        (18, 200),
        (HOURS_1000, HOURS_4000),
        true,
        (true, true),
    ),
    employees(
        "PAY426N-07",
        "ALL TERMINATED EMPLOYEES >= AGE 18 WITH < 1000 PS HOURS AND NO PRIOR PS AMOUNT",
        (18, 200),
        (Decimal::ZERO, HOURS_999_99),
        true,
        (false, true),
    ),
    employees(
        "PAY426N-08",
        "ALL TERMINATED EMPLOYEES >= AGE 18 WITH < 1000 PS HOURS AND PRIOR PS AMOUNT",
        (18, 200),
        (Decimal::ZERO, HOURS_999_99),
        true,
        (true, false),
    ),
    Pay426NCriteria {
        report_id: "PAY426N-10",
        title: "ALL NON-EMPLOYEE BENEFICIARIES",
        is_year_end: true,
        minimum_age_inclusive: 0,
        maximum_age_inclusive: 200,
        minimum_hours_inclusive: Decimal::ZERO,
        maximum_hours_inclusive: HOURS_4000,
        include_active_employees: false,
        include_inactive_employees: false,
        include_employees_terminated_this_year: false,
        include_terminated_employees: false,
        include_beneficiaries: true,
        include_employees_with_prior_profit_sharing_amounts: false,
        include_employees_with_no_prior_profit_sharing_amounts: false,
    },
];

/// The whole PAY426 report expressed as one criteria entry
pub const PAY426_ALL: Pay426NCriteria = Pay426NCriteria {
    report_id: "PAY426",
    title: "ALL EMPLOYEES",
    is_year_end: true,
    minimum_age_inclusive: 0,
    maximum_age_inclusive: 200,
    minimum_hours_inclusive: Decimal::ZERO,
    maximum_hours_inclusive: HOURS_4000,
    include_active_employees: true,
    include_inactive_employees: true,
    include_employees_terminated_this_year: true,
    include_terminated_employees: true,
    include_beneficiaries: false,
    include_employees_with_prior_profit_sharing_amounts: true,
    include_employees_with_no_prior_profit_sharing_amounts: true,
};

/// Look up a sub-report by id
#[must_use]
pub fn find(report_id: &str) -> Option<&'static Pay426NCriteria> {
    PAY426N_CRITERIA.iter().find(|c| c.report_id == report_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ids_are_unique_and_ordered() {
        let ids: Vec<&str> = PAY426N_CRITERIA.iter().map(|c| c.report_id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted);
        assert_eq!(ids.len(), 9);
    }

    #[test]
    fn only_the_last_entry_is_beneficiaries() {
        let (last, rest) = PAY426N_CRITERIA.split_last().unwrap();
        assert!(last.is_beneficiary_report());
        assert!(rest.iter().all(|c| !c.is_beneficiary_report()));
    }

    #[test]
    fn request_body_uses_camel_case_and_profit_year() {
        let body = serde_json::to_value(find("PAY426N-04").unwrap().request(2024)).unwrap();
        assert_eq!(body["reportId"], "PAY426N-04");
        assert_eq!(body["profitYear"], 2024);
        assert_eq!(body["minimumAgeInclusive"], 18);
        assert_eq!(body["includeEmployeesWithNoPriorProfitSharingAmounts"], false);
        assert_eq!(find("PAY426N-04").unwrap().maximum_hours_inclusive.to_string(), "999.99");
    }
}
