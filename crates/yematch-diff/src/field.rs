//! Tagged-field registry
//!
//! A record type declares the fields it exposes for comparison as a static
//! slice of [`TrackedField`]s. Each entry pairs a name with an accessor and a
//! tolerance rule, so the comparison surface is known at compile time.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt;

/// A comparable field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free text, compared after trimming
    Text(String),
    /// Whole number
    Int(i64),
    /// Whole number where absence is meaningful
    OptInt(Option<i64>),
    /// Amount or fractional quantity
    Decimal(Decimal),
    /// Date, absent for the legacy all-zero placeholder
    Date(Option<NaiveDate>),
    /// Flag
    Bool(bool),
}

impl FieldValue {
    /// Numeric view used by checksums; text, dates and flags have none
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Int(v) | Self::OptInt(Some(v)) => Some(Decimal::from(*v)),
            Self::Decimal(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Int(v) | Self::OptInt(Some(v)) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Date(Some(d)) => write!(f, "{d}"),
            Self::OptInt(None) | Self::Date(None) => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// How two values of one field are judged equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Tolerance {
    /// Values must be identical
    #[default]
    Exact,
    /// Amounts are equal when they round to the same cent
    Cent,
}

impl Tolerance {
    /// Whether `legacy` and `new` agree under this rule
    #[must_use]
    pub fn agrees(self, legacy: &FieldValue, new: &FieldValue) -> bool {
        match (self, legacy, new) {
            (Self::Cent, FieldValue::Decimal(a), FieldValue::Decimal(b)) => to_cent(*a) == to_cent(*b),
            (_, FieldValue::Text(a), FieldValue::Text(b)) => a.trim() == b.trim(),
            (_, FieldValue::Int(a), FieldValue::OptInt(Some(b)))
            | (_, FieldValue::OptInt(Some(a)), FieldValue::Int(b)) => a == b,
            _ => legacy == new,
        }
    }
}

/// Round half away from zero to two places
#[must_use]
pub fn to_cent(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// One declared comparison field of record type `R`
pub struct TrackedField<R> {
    /// Field name as it appears in diff output
    pub name: &'static str,
    /// Equality rule
    pub tolerance: Tolerance,
    /// Value accessor
    pub accessor: fn(&R) -> FieldValue,
}

impl<R> TrackedField<R> {
    /// Declare an exactly compared field
    #[must_use]
    pub const fn exact(name: &'static str, accessor: fn(&R) -> FieldValue) -> Self {
        Self {
            name,
            tolerance: Tolerance::Exact,
            accessor,
        }
    }

    /// Declare a currency field compared to the cent
    #[must_use]
    pub const fn cents(name: &'static str, accessor: fn(&R) -> FieldValue) -> Self {
        Self {
            name,
            tolerance: Tolerance::Cent,
            accessor,
        }
    }

    /// Read this field from a record
    #[inline]
    pub fn read(&self, record: &R) -> FieldValue {
        (self.accessor)(record)
    }
}

impl<R> Clone for TrackedField<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for TrackedField<R> {}

impl<R> fmt::Debug for TrackedField<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedField")
            .field("name", &self.name)
            .field("tolerance", &self.tolerance)
            .finish_non_exhaustive()
    }
}

/// A record type with a declared comparison surface
pub trait Tracked: Sized {
    /// Business key that aligns legacy and new rows
    type Key: Ord + Clone + fmt::Display;

    /// Declared comparison fields
    fn fields() -> &'static [TrackedField<Self>];

    /// Key for this record
    fn key(&self) -> Self::Key;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cent_tolerance_rounds_both_sides() {
        let a = FieldValue::Decimal(Decimal::new(100_004, 5)); // 1.00004
        let b = FieldValue::Decimal(Decimal::new(1_000, 3)); // 1.000
        assert!(Tolerance::Cent.agrees(&a, &b));
        assert!(!Tolerance::Exact.agrees(&a, &b));

        let c = FieldValue::Decimal(Decimal::new(101, 2));
        assert!(!Tolerance::Cent.agrees(&b, &c));
    }

    #[test]
    fn half_cent_rounds_away_from_zero() {
        assert_eq!(to_cent(Decimal::new(1_005, 3)), Decimal::new(101, 2));
        assert_eq!(to_cent(Decimal::new(-1_005, 3)), Decimal::new(-101, 2));
    }

    #[test]
    fn text_compares_trimmed() {
        let a = FieldValue::Text("SMITH, JO ".into());
        let b = FieldValue::Text("SMITH, JO".into());
        assert!(Tolerance::Exact.agrees(&a, &b));
    }

    #[test]
    fn null_and_zero_differ() {
        assert!(!Tolerance::Exact.agrees(&FieldValue::OptInt(None), &FieldValue::OptInt(Some(0))));
        assert!(Tolerance::Exact.agrees(&FieldValue::Int(3), &FieldValue::OptInt(Some(3))));
    }

    #[test]
    fn decimal_view_for_checksums() {
        assert_eq!(FieldValue::Int(4).as_decimal(), Some(Decimal::from(4)));
        assert_eq!(FieldValue::OptInt(None).as_decimal(), None);
        assert_eq!(FieldValue::Text("x".into()).as_decimal(), None);
    }
}
