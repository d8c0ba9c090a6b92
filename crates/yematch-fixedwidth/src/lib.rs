//! Fixed-width record parsing for legacy report text
//!
//! Provides:
//! - Declarative column layouts ([`FieldSpec`])
//! - Bounds-safe slicing where a short line means "field absent"
//! - Legacy value coercion: trailing-sign amounts, nullable integers, two-digit-year dates
//!
//! Nothing here knows about any particular report.

pub mod convert;
pub mod error;
pub mod record;
pub mod spec;

pub use convert::{
    parse_decimal, parse_int, parse_mdy, parse_nullable_int, parse_signed_decimal, parse_yymmdd,
    truncate_hours, unknown_date,
};
pub use error::{FieldError, FieldResult};
pub use record::ParsedRecord;
pub use spec::{extract_named, FieldSpec, Width};

/// Split report text into non-blank lines, accepting CR/LF or LF separators
pub fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !l.trim().is_empty())
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_drop_blanks_and_carriage_returns() {
        let text = "first\r\n\r\n   \nsecond\n";
        assert_eq!(lines(text).collect::<Vec<_>>(), vec!["first", "second"]);
    }
}
