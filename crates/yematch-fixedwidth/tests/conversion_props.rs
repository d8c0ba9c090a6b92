//! Property tests for legacy value coercion

use proptest::prelude::*;
use rust_decimal::Decimal;
use yematch_fixedwidth::{parse_nullable_int, parse_signed_decimal, truncate_hours, FieldSpec};

/// Render cents the way the legacy writer does: thousands commas, sign after digits
fn legacy_amount(cents: i64) -> String {
    let abs = cents.unsigned_abs();
    let whole = (abs / 100).to_string();
    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if cents < 0 { "-" } else { "" };
    format!("{grouped}.{:02}{sign}", abs % 100)
}

proptest! {
    #[test]
    fn prop_trailing_sign_round_trips(cents in -99_999_999_999i64..99_999_999_999i64) {
        let text = legacy_amount(cents);
        let parsed = parse_signed_decimal("amount", &format!("{text:>16}")).unwrap();
        prop_assert_eq!(parsed, Decimal::new(cents, 2));
    }

    #[test]
    fn prop_blank_amount_is_zero(width in 0usize..20) {
        let blank = " ".repeat(width);
        prop_assert_eq!(parse_signed_decimal("amount", &blank).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn prop_blank_int_is_null_zero_is_zero(width in 1usize..10) {
        prop_assert_eq!(parse_nullable_int("n", &" ".repeat(width)).unwrap(), None);
        prop_assert_eq!(parse_nullable_int("n", &format!("{:>width$}", 0)).unwrap(), Some(0));
    }

    #[test]
    fn prop_truncation_never_exceeds_value(hundredths in 0i64..10_000_000) {
        let hours = Decimal::new(hundredths, 2);
        let truncated = truncate_hours(hours);
        prop_assert!(Decimal::from(truncated) <= hours);
        prop_assert!(hours - Decimal::from(truncated) < Decimal::ONE);
    }

    #[test]
    fn prop_extract_never_panics(line in ".{0,40}", start in 0usize..50, len in 0usize..30) {
        let spec = FieldSpec::new("any", start, len);
        let got = spec.extract(&line);
        if line.len() < start + len {
            prop_assert!(got.is_none());
        }
        let _ = spec.extract_clamped(&line);
    }
}
