//! Column specifications and raw slicing
//!
//! A layout is a `&'static [FieldSpec]` declared once per report format.
//! Offsets are byte columns; legacy report text is ASCII.

use crate::error::{FieldError, FieldResult};

/// Width of a fixed-width field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    /// Exactly this many columns
    Fixed(usize),
    /// Everything from the start column to the end of the line
    ToEnd,
}

/// One named column span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    /// Field name, unique within a layout
    pub name: &'static str,
    /// Zero-based start column
    pub start: usize,
    /// Span width
    pub width: Width,
}

impl FieldSpec {
    /// Declare a fixed-width field
    #[inline]
    #[must_use]
    pub const fn new(name: &'static str, start: usize, length: usize) -> Self {
        Self {
            name,
            start,
            width: Width::Fixed(length),
        }
    }

    /// Declare a field running to end of line
    #[inline]
    #[must_use]
    pub const fn to_end(name: &'static str, start: usize) -> Self {
        Self {
            name,
            start,
            width: Width::ToEnd,
        }
    }

    /// Build from the legacy `(name, start, length)` triple where `-1` means to end of line
    #[must_use]
    pub const fn from_triple(name: &'static str, start: usize, length: i32) -> Self {
        if length < 0 {
            Self::to_end(name, start)
        } else {
            #[allow(clippy::cast_sign_loss)]
            let length = length as usize;
            Self::new(name, start, length)
        }
    }

    /// First column past this field, if the width is fixed
    #[inline]
    #[must_use]
    pub const fn end(&self) -> Option<usize> {
        match self.width {
            Width::Fixed(len) => Some(self.start + len),
            Width::ToEnd => None,
        }
    }

    /// Minimum line length needed for this field to be present
    #[inline]
    #[must_use]
    pub const fn required_len(&self) -> usize {
        match self.width {
            Width::Fixed(len) => self.start + len,
            Width::ToEnd => self.start,
        }
    }

    /// Slice this field out of `line`; `None` when the line is too short
    #[must_use]
    pub fn extract<'a>(&self, line: &'a str) -> Option<&'a str> {
        match self.width {
            Width::Fixed(len) => line.get(self.start..self.start + len),
            Width::ToEnd => line.get(self.start..),
        }
    }

    /// Slice and trim
    #[must_use]
    pub fn extract_trimmed<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.extract(line).map(str::trim)
    }

    /// Slice whatever part of the field the line holds.
    ///
    /// Legacy writers strip trailing blanks, so the last column of a row is
    /// often shorter than declared. Returns `None` only when the line ends
    /// before the field starts.
    #[must_use]
    pub fn extract_clamped<'a>(&self, line: &'a str) -> Option<&'a str> {
        if line.len() < self.start {
            return None;
        }
        let end = match self.width {
            Width::Fixed(len) => (self.start + len).min(line.len()),
            Width::ToEnd => line.len(),
        };
        line.get(self.start..end)
    }

    /// Like [`FieldSpec::extract`] but reporting absence as an error
    ///
    /// # Errors
    /// Returns [`FieldError::Absent`] when the line is shorter than the span.
    pub fn require<'a>(&self, line: &'a str) -> FieldResult<&'a str> {
        self.extract(line).ok_or(FieldError::Absent {
            field: self.name,
            line_len: line.len(),
            needed: self.required_len(),
        })
    }
}

/// Look a field up by name in a layout
#[must_use]
pub fn find(layout: &[FieldSpec], name: &str) -> Option<FieldSpec> {
    layout.iter().copied().find(|f| f.name == name)
}

/// Slice a named field from a line using a layout
///
/// # Errors
/// [`FieldError::Undeclared`] for unknown names, [`FieldError::Absent`] for short lines.
pub fn extract_named<'a>(layout: &[FieldSpec], line: &'a str, name: &str) -> FieldResult<&'a str> {
    find(layout, name)
        .ok_or_else(|| FieldError::Undeclared(name.to_string()))?
        .require(line)
}
