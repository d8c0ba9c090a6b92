//! Keyed comparison of two record sets

use crate::error::{DiffError, Side};
use crate::field::{FieldValue, Tracked, TrackedField};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

/// One field that disagrees between the two sides
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDifference {
    /// Tracked field name
    pub field: &'static str,
    /// Value on the legacy side
    pub legacy: FieldValue,
    /// Value on the new side
    pub new: FieldValue,
}

impl fmt::Display for FieldDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: legacy={} new={}", self.field, self.legacy, self.new)
    }
}

/// A key present on both sides
#[derive(Debug, Clone)]
pub struct Matched<'a, K, R> {
    /// Shared key
    pub key: K,
    /// Legacy record
    pub legacy: &'a R,
    /// New record
    pub new: &'a R,
    /// Disagreeing fields; empty for a clean match
    pub differences: Vec<FieldDifference>,
}

impl<K, R> Matched<'_, K, R> {
    /// No tracked field disagrees
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.differences.is_empty()
    }
}

/// Outcome of comparing two record sets
///
/// All three collections are ordered by key.
#[derive(Debug, Clone)]
pub struct DiffResult<'a, K, R> {
    /// Keys only the legacy side produced
    pub only_legacy: Vec<(K, &'a R)>,
    /// Keys only the new side produced
    pub only_new: Vec<(K, &'a R)>,
    /// Keys both sides produced
    pub matched: Vec<Matched<'a, K, R>>,
}

impl<'a, K, R> DiffResult<'a, K, R>
where
    K: fmt::Display,
{
    /// Matches with no disagreement
    pub fn clean(&self) -> impl Iterator<Item = &Matched<'a, K, R>> {
        self.matched.iter().filter(|m| m.is_clean())
    }

    /// Matches with at least one disagreement
    pub fn with_differences(&self) -> impl Iterator<Item = &Matched<'a, K, R>> {
        self.matched.iter().filter(|m| !m.is_clean())
    }

    /// Both sides agree on every key and every tracked field
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.only_legacy.is_empty() && self.only_new.is_empty() && self.matched.iter().all(Matched::is_clean)
    }

    /// Count summary
    #[must_use]
    pub fn summary(&self) -> DiffSummary {
        let matched_clean = self.clean().count();
        DiffSummary {
            legacy_count: self.only_legacy.len() + self.matched.len(),
            new_count: self.only_new.len() + self.matched.len(),
            only_legacy: self.only_legacy.len(),
            only_new: self.only_new.len(),
            matched_clean,
            matched_with_differences: self.matched.len() - matched_clean,
        }
    }

    /// Human-readable report listing at most `limit` entries per section
    #[must_use]
    pub fn generate_text(&self, limit: usize) -> String {
        let mut out = self.summary().generate_text();
        let only_legacy: Vec<String> = self.only_legacy.iter().map(|(k, _)| k.to_string()).collect();
        let only_new: Vec<String> = self.only_new.iter().map(|(k, _)| k.to_string()).collect();
        let differing: Vec<String> = self
            .with_differences()
            .map(|m| {
                let fields: Vec<String> = m.differences.iter().map(ToString::to_string).collect();
                format!("{}  {}", m.key, fields.join("; "))
            })
            .collect();
        section(&mut out, "Only in legacy", &only_legacy, limit);
        section(&mut out, "Only in new", &only_new, limit);
        section(&mut out, "Field differences", &differing, limit);
        out
    }
}

fn section(out: &mut String, title: &str, lines: &[String], limit: usize) {
    let total = lines.len();
    if total == 0 {
        return;
    }
    let _ = writeln!(out, "{title} ({total}):");
    for line in lines.iter().take(limit) {
        let _ = writeln!(out, "  {line}");
    }
    if total > limit {
        let _ = writeln!(out, "  ... {} more", total - limit);
    }
}

/// Counts from a [`DiffResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DiffSummary {
    /// Records on the legacy side
    pub legacy_count: usize,
    /// Records on the new side
    pub new_count: usize,
    /// Keys only in legacy
    pub only_legacy: usize,
    /// Keys only in new
    pub only_new: usize,
    /// Matched with no differences
    pub matched_clean: usize,
    /// Matched with at least one difference
    pub matched_with_differences: usize,
}

impl DiffSummary {
    /// Whether nothing disagrees
    #[must_use]
    pub fn passed(&self) -> bool {
        self.only_legacy == 0 && self.only_new == 0 && self.matched_with_differences == 0
    }

    /// One-paragraph text rendering
    #[must_use]
    pub fn generate_text(&self) -> String {
        format!(
            "Legacy records: {}\nNew records: {}\nMatched clean: {}\nMatched with differences: {}\nOnly in legacy: {}\nOnly in new: {}\n",
            self.legacy_count,
            self.new_count,
            self.matched_clean,
            self.matched_with_differences,
            self.only_legacy,
            self.only_new,
        )
    }
}

fn index_by_key<'a, K, R, F>(records: &'a [R], key_fn: &F, side: Side) -> Result<BTreeMap<K, &'a R>, DiffError>
where
    K: Ord + fmt::Display,
    F: Fn(&R) -> K,
{
    let mut map = BTreeMap::new();
    for record in records {
        let key = key_fn(record);
        if map.contains_key(&key) {
            return Err(DiffError::duplicate_key(side, key.to_string()));
        }
        map.insert(key, record);
    }
    Ok(map)
}

/// Compare two record sets keyed by `key_fn` over the declared `fields`.
///
/// # Errors
/// [`DiffError::DuplicateKey`] when either side repeats a key.
pub fn diff<'a, K, R, F>(
    legacy: &'a [R],
    new: &'a [R],
    key_fn: F,
    fields: &[TrackedField<R>],
) -> Result<DiffResult<'a, K, R>, DiffError>
where
    K: Ord + Clone + fmt::Display,
    F: Fn(&R) -> K,
{
    let legacy_map = index_by_key(legacy, &key_fn, Side::Legacy)?;
    let mut new_map = index_by_key(new, &key_fn, Side::New)?;

    let mut only_legacy = Vec::new();
    let mut matched = Vec::new();

    for (key, legacy_record) in legacy_map {
        match new_map.remove(&key) {
            Some(new_record) => {
                let differences = fields
                    .iter()
                    .filter_map(|field| {
                        let l = field.read(legacy_record);
                        let n = field.read(new_record);
                        (!field.tolerance.agrees(&l, &n)).then_some(FieldDifference {
                            field: field.name,
                            legacy: l,
                            new: n,
                        })
                    })
                    .collect();
                matched.push(Matched {
                    key,
                    legacy: legacy_record,
                    new: new_record,
                    differences,
                });
            }
            None => only_legacy.push((key, legacy_record)),
        }
    }

    Ok(DiffResult {
        only_legacy,
        only_new: new_map.into_iter().collect(),
        matched,
    })
}

/// [`diff`] using the record type's declared key and fields
///
/// # Errors
/// See [`diff`].
pub fn diff_tracked<'a, R: Tracked + 'static>(legacy: &'a [R], new: &'a [R]) -> Result<DiffResult<'a, R::Key, R>, DiffError> {
    diff(legacy, new, R::key, R::fields())
}
