//! Legacy value coercion
//!
//! Conventions of the legacy report writer:
//! - Signed amounts carry the sign *after* the digits (`1,234.56-`)
//! - Blank amount columns mean zero
//! - Blank integer columns mean "not recorded", which is not zero
//! - Dates come as `MM/DD/YY`, `MM/DD/YYYY` or `YYMMDD`, with all-zero meaning no date

use crate::error::{FieldError, FieldResult};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Two-digit years up to this pivot land in 20xx, later ones in 19xx
pub const TWO_DIGIT_YEAR_MAX: i32 = 2049;

/// Placeholder the legacy system stores for an unknown birth date
#[must_use]
pub fn unknown_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Parse an amount whose sign trails the digits.
///
/// `"1,234.56-"` is `-1234.56`, `"1,234.56"` is `1234.56` and a blank slice is
/// zero. A leading `-` is tolerated for columns the writer left-signs.
///
/// # Errors
/// [`FieldError::InvalidDecimal`] when the digits do not form a number.
pub fn parse_signed_decimal(field: &'static str, raw: &str) -> FieldResult<Decimal> {
    let text = raw.trim();
    let (negative, digits) = if let Some(rest) = text.strip_suffix('-') {
        (true, rest)
    } else if let Some(rest) = text.strip_suffix('+') {
        (false, rest)
    } else if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else {
        (false, text)
    };

    let cleaned: String = digits.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Ok(Decimal::ZERO);
    }
    if !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(FieldError::invalid_decimal(field, raw));
    }

    let value = Decimal::from_str(&cleaned).map_err(|_| FieldError::invalid_decimal(field, raw))?;
    Ok(if negative { -value } else { value })
}

/// Parse an unsigned amount; blank is an error here since callers need a value
///
/// # Errors
/// [`FieldError::Blank`] or [`FieldError::InvalidDecimal`].
pub fn parse_decimal(field: &'static str, raw: &str) -> FieldResult<Decimal> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(FieldError::Blank(field));
    }
    parse_signed_decimal(field, text)
}

/// Parse an integer column where blank means "not recorded"
///
/// # Errors
/// [`FieldError::InvalidInteger`] on non-numeric text.
pub fn parse_nullable_int(field: &'static str, raw: &str) -> FieldResult<Option<i64>> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<i64>()
        .map(Some)
        .map_err(|_| FieldError::invalid_integer(field, raw))
}

/// Parse a required integer column
///
/// # Errors
/// [`FieldError::Blank`] or [`FieldError::InvalidInteger`].
pub fn parse_int(field: &'static str, raw: &str) -> FieldResult<i64> {
    parse_nullable_int(field, raw)?.ok_or(FieldError::Blank(field))
}

/// Drop the fraction of an hours figure; the legacy writer truncates before summing
#[must_use]
pub fn truncate_hours(hours: Decimal) -> i64 {
    hours.trunc().to_i64().unwrap_or(0)
}

/// Parse `MM/DD/YY` or `MM/DD/YYYY`; `00/00/00` yields `None`
///
/// # Errors
/// [`FieldError::InvalidDate`] on malformed text or an impossible calendar date.
pub fn parse_mdy(field: &'static str, raw: &str) -> FieldResult<Option<NaiveDate>> {
    let text = raw.trim();
    if text.is_empty() || text.chars().all(|c| c == '0' || c == '/') {
        return Ok(None);
    }
    let invalid = || FieldError::invalid_date(field, "MM/DD/YY", raw);

    let mut parts = text.split('/');
    let (Some(m), Some(d), Some(y), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    let month: u32 = m.parse().map_err(|_| invalid())?;
    let day: u32 = d.parse().map_err(|_| invalid())?;
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let year = match y.len() {
        2 => expand_two_digit_year(year),
        4 => year,
        _ => return Err(invalid()),
    };
    NaiveDate::from_ymd_opt(year, month, day).map(Some).ok_or_else(invalid)
}

/// Parse `YYMMDD` where the century is always 2000; `000000` yields `None`
///
/// # Errors
/// [`FieldError::InvalidDate`] on malformed text.
pub fn parse_yymmdd(field: &'static str, raw: &str) -> FieldResult<Option<NaiveDate>> {
    let text = raw.trim();
    if text.is_empty() || text.chars().all(|c| c == '0') {
        return Ok(None);
    }
    let invalid = || FieldError::invalid_date(field, "YYMMDD", raw);
    if text.len() != 6 || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let year: i32 = text[0..2].parse().map_err(|_| invalid())?;
    let month: u32 = text[2..4].parse().map_err(|_| invalid())?;
    let day: u32 = text[4..6].parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(2000 + year, month, day)
        .map(Some)
        .ok_or_else(invalid)
}

/// Map a two-digit year onto a century using [`TWO_DIGIT_YEAR_MAX`]
#[must_use]
pub fn expand_two_digit_year(yy: i32) -> i32 {
    let century = TWO_DIGIT_YEAR_MAX - TWO_DIGIT_YEAR_MAX % 100;
    let candidate = century + yy;
    if candidate > TWO_DIGIT_YEAR_MAX {
        candidate - 100
    } else {
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn trailing_minus_negates() {
        assert_eq!(parse_signed_decimal("amt", "1,234.56-").unwrap(), dec("-1234.56"));
        assert_eq!(parse_signed_decimal("amt", "  1,234.56").unwrap(), dec("1234.56"));
        assert_eq!(parse_signed_decimal("amt", "-12.00").unwrap(), dec("-12.00"));
    }

    #[test]
    fn blank_amount_is_zero() {
        assert_eq!(parse_signed_decimal("amt", "      ").unwrap(), Decimal::ZERO);
        assert_eq!(parse_signed_decimal("amt", " - ").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn junk_amount_is_error() {
        assert!(matches!(
            parse_signed_decimal("amt", "12a.00"),
            Err(FieldError::InvalidDecimal { field: "amt", .. })
        ));
        assert_eq!(parse_decimal("hrs", "   "), Err(FieldError::Blank("hrs")));
    }

    #[test]
    fn nullable_int_distinguishes_blank_from_zero() {
        assert_eq!(parse_nullable_int("yrs", "   ").unwrap(), None);
        assert_eq!(parse_nullable_int("yrs", "  0").unwrap(), Some(0));
        assert_eq!(parse_int("yrs", " 12 ").unwrap(), 12);
        assert!(parse_nullable_int("yrs", "1x").is_err());
    }

    #[test]
    fn hours_truncate_toward_zero() {
        assert_eq!(truncate_hours(dec("1999.99")), 1999);
        assert_eq!(truncate_hours(dec("0.50")), 0);
        assert_eq!(truncate_hours(dec("-3.7")), -3);
        assert_eq!(truncate_hours(dec("42")), 42);
    }

    #[test]
    fn mdy_dates() {
        assert_eq!(
            parse_mdy("dob", "03/15/65").unwrap(),
            NaiveDate::from_ymd_opt(1965, 3, 15)
        );
        assert_eq!(
            parse_mdy("dob", "03/15/04").unwrap(),
            NaiveDate::from_ymd_opt(2004, 3, 15)
        );
        assert_eq!(
            parse_mdy("dob", "12/31/1999").unwrap(),
            NaiveDate::from_ymd_opt(1999, 12, 31)
        );
        assert_eq!(parse_mdy("dob", "00/00/00").unwrap(), None);
        assert!(parse_mdy("dob", "13/40/99").is_err());
    }

    #[test]
    fn yymmdd_dates() {
        assert_eq!(
            parse_yymmdd("term", "240406").unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 6)
        );
        assert_eq!(parse_yymmdd("term", "000000").unwrap(), None);
        assert_eq!(parse_yymmdd("term", "      ").unwrap(), None);
        assert!(parse_yymmdd("term", "24046").is_err());
    }

    #[test]
    fn two_digit_year_pivot() {
        assert_eq!(expand_two_digit_year(49), 2049);
        assert_eq!(expand_two_digit_year(50), 1950);
        assert_eq!(expand_two_digit_year(0), 2000);
    }
}
