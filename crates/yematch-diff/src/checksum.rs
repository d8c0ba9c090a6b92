//! Per-field column sums over a record set

use crate::field::{Tolerance, TrackedField};
use indexmap::IndexMap;
use rust_decimal::Decimal;

/// Sum every numeric tracked field across `records`.
///
/// Fields whose values are never numeric (text, dates, flags) are left out.
/// Missing integers contribute nothing.
#[must_use]
pub fn checksum<R>(records: &[R], fields: &[TrackedField<R>]) -> IndexMap<&'static str, Decimal> {
    let mut sums = IndexMap::new();
    for field in fields {
        let mut numeric = false;
        let mut total = Decimal::ZERO;
        for record in records {
            if let Some(v) = field.read(record).as_decimal() {
                numeric = true;
                total += v;
            }
        }
        if numeric {
            sums.insert(field.name, total);
        }
    }
    sums
}

/// Names of checksum columns that disagree between two sides
#[must_use]
pub fn checksum_mismatches<R>(
    legacy: &IndexMap<&'static str, Decimal>,
    new: &IndexMap<&'static str, Decimal>,
    fields: &[TrackedField<R>],
) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|f| legacy.contains_key(f.name) || new.contains_key(f.name))
        .filter(|f| {
            let l = legacy.get(f.name).copied().unwrap_or_default();
            let n = new.get(f.name).copied().unwrap_or_default();
            match f.tolerance {
                Tolerance::Cent => crate::field::to_cent(l) != crate::field::to_cent(n),
                Tolerance::Exact => l != n,
            }
        })
        .map(|f| f.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;

    struct Row(i64, Decimal, &'static str);

    const FIELDS: &[TrackedField<Row>] = &[
        TrackedField::exact("count", |r| FieldValue::Int(r.0)),
        TrackedField::cents("amount", |r| FieldValue::Decimal(r.1)),
        TrackedField::exact("name", |r| FieldValue::Text(r.2.to_string())),
    ];

    #[test]
    fn sums_numeric_fields_only() {
        let rows = [Row(1, Decimal::new(150, 2), "a"), Row(2, Decimal::new(-50, 2), "b")];
        let sums = checksum(&rows, FIELDS);
        assert_eq!(sums.get("count"), Some(&Decimal::from(3)));
        assert_eq!(sums.get("amount"), Some(&Decimal::ONE));
        assert!(!sums.contains_key("name"));
    }

    #[test]
    fn mismatching_columns_reported() {
        let a = checksum(&[Row(1, Decimal::new(100, 2), "a")], FIELDS);
        let b = checksum(&[Row(2, Decimal::new(1_004, 3), "a")], FIELDS);
        assert_eq!(checksum_mismatches(&a, &b, FIELDS), vec!["count"]);
    }
}
