//! Named-field bag produced from one report line

use crate::convert;
use crate::error::{FieldError, FieldResult};
use crate::spec::FieldSpec;
use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::Decimal;

/// Raw text of every field a line carries, in layout order.
///
/// A fixed-width field the line ends inside is missing, never partial; typed
/// getters report it as [`FieldError::Absent`]. Only a to-end field takes
/// whatever the line holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    line_len: usize,
    fields: IndexMap<&'static str, String>,
    layout: &'static [FieldSpec],
}

impl ParsedRecord {
    /// Slice `line` according to `layout`
    #[must_use]
    pub fn from_line(line: &str, layout: &'static [FieldSpec]) -> Self {
        let fields = layout
            .iter()
            .filter_map(|spec| spec.extract(line).map(|raw| (spec.name, raw.to_string())))
            .collect();
        Self {
            line_len: line.len(),
            fields,
            layout,
        }
    }

    /// Raw, untrimmed text of a field
    ///
    /// # Errors
    /// [`FieldError::Undeclared`] or [`FieldError::Absent`].
    pub fn raw(&self, name: &str) -> FieldResult<&str> {
        if let Some(text) = self.fields.get(name) {
            return Ok(text.as_str());
        }
        let spec = self
            .layout
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| FieldError::Undeclared(name.to_string()))?;
        Err(FieldError::Absent {
            field: spec.name,
            line_len: self.line_len,
            needed: spec.required_len(),
        })
    }

    /// Trimmed text of a field
    ///
    /// # Errors
    /// See [`ParsedRecord::raw`].
    pub fn text(&self, name: &str) -> FieldResult<&str> {
        self.raw(name).map(str::trim)
    }

    /// Whether the field is present and non-blank
    #[must_use]
    pub fn has_value(&self, name: &str) -> bool {
        self.text(name).is_ok_and(|t| !t.is_empty())
    }

    fn spec_name(&self, name: &str) -> FieldResult<&'static str> {
        self.layout
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.name)
            .ok_or_else(|| FieldError::Undeclared(name.to_string()))
    }

    /// Trailing-sign amount; blank is zero
    ///
    /// # Errors
    /// Absent field or malformed number.
    pub fn signed_decimal(&self, name: &str) -> FieldResult<Decimal> {
        convert::parse_signed_decimal(self.spec_name(name)?, self.raw(name)?)
    }

    /// Required unsigned amount
    ///
    /// # Errors
    /// Absent or blank field, or malformed number.
    pub fn decimal(&self, name: &str) -> FieldResult<Decimal> {
        convert::parse_decimal(self.spec_name(name)?, self.raw(name)?)
    }

    /// Integer where blank means not recorded
    ///
    /// # Errors
    /// Absent field or malformed number.
    pub fn nullable_int(&self, name: &str) -> FieldResult<Option<i64>> {
        convert::parse_nullable_int(self.spec_name(name)?, self.raw(name)?)
    }

    /// Required integer
    ///
    /// # Errors
    /// Absent or blank field, or malformed number.
    pub fn int(&self, name: &str) -> FieldResult<i64> {
        convert::parse_int(self.spec_name(name)?, self.raw(name)?)
    }

    /// `MM/DD/YY` date, `None` for the all-zero placeholder
    ///
    /// # Errors
    /// Absent field or malformed date.
    pub fn date_mdy(&self, name: &str) -> FieldResult<Option<NaiveDate>> {
        convert::parse_mdy(self.spec_name(name)?, self.raw(name)?)
    }

    /// `YYMMDD` date, `None` for blank or all-zero
    ///
    /// # Errors
    /// Absent field or malformed date.
    pub fn date_yymmdd(&self, name: &str) -> FieldResult<Option<NaiveDate>> {
        convert::parse_yymmdd(self.spec_name(name)?, self.raw(name)?)
    }

    /// Field names present on this line, in layout order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }
}
