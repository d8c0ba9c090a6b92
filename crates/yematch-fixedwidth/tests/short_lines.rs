//! Lines the legacy writer cut short

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use yematch_fixedwidth::{FieldError, FieldSpec, ParsedRecord};

const LAYOUT: &[FieldSpec] = &[FieldSpec::new("Badge", 0, 7), FieldSpec::new("Wages", 10, 12)];

#[test]
fn truncated_wages_column_is_absent_not_partial() {
    let rec = ParsedRecord::from_line("0700123     45,0", LAYOUT);

    assert_eq!(rec.int("Badge").unwrap(), 700_123);
    assert_eq!(
        rec.raw("Wages"),
        Err(FieldError::Absent {
            field: "Wages",
            line_len: 16,
            needed: 22,
        })
    );
    assert!(matches!(rec.signed_decimal("Wages"), Err(FieldError::Absent { field: "Wages", .. })));
}

#[test]
fn full_width_wages_column_is_read() {
    let rec = ParsedRecord::from_line("0700123      45,000.00", LAYOUT);
    assert_eq!(rec.signed_decimal("Wages").unwrap(), Decimal::new(45_000_00, 2));
}
