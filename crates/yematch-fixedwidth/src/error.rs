//! Error types for field extraction and coercion

/// A single field could not be extracted or converted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// Line too short to contain the field
    #[error("field '{field}' absent: line has {line_len} columns, field needs {needed}")]
    Absent {
        /// Field name
        field: &'static str,
        /// Columns the line has
        line_len: usize,
        /// Columns the field needs
        needed: usize,
    },

    /// Field name not declared in the layout
    #[error("field '{0}' is not part of this layout")]
    Undeclared(String),

    /// Decimal text did not parse
    #[error("field '{field}': invalid decimal '{raw}'")]
    InvalidDecimal {
        /// Field name
        field: &'static str,
        /// Text as sliced
        raw: String,
    },

    /// Integer text did not parse
    #[error("field '{field}': invalid integer '{raw}'")]
    InvalidInteger {
        /// Field name
        field: &'static str,
        /// Text as sliced
        raw: String,
    },

    /// Date text did not match the expected encoding
    #[error("field '{field}': invalid {encoding} date '{raw}'")]
    InvalidDate {
        /// Field name
        field: &'static str,
        /// Expected layout such as `MM/DD/YY`
        encoding: &'static str,
        /// Text as sliced
        raw: String,
    },

    /// Required field was blank
    #[error("field '{0}' is blank")]
    Blank(&'static str),
}

impl FieldError {
    /// Create decimal error for field
    pub fn invalid_decimal(field: &'static str, raw: impl Into<String>) -> Self {
        Self::InvalidDecimal {
            field,
            raw: raw.into(),
        }
    }

    /// Create integer error for field
    pub fn invalid_integer(field: &'static str, raw: impl Into<String>) -> Self {
        Self::InvalidInteger {
            field,
            raw: raw.into(),
        }
    }

    /// Create date error for field
    pub fn invalid_date(field: &'static str, encoding: &'static str, raw: impl Into<String>) -> Self {
        Self::InvalidDate {
            field,
            encoding,
            raw: raw.into(),
        }
    }

    /// Name of the field this error is about, when known statically
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Absent { field, .. }
            | Self::InvalidDecimal { field, .. }
            | Self::InvalidInteger { field, .. }
            | Self::InvalidDate { field, .. }
            | Self::Blank(field) => Some(field),
            Self::Undeclared(_) => None,
        }
    }
}

/// Result alias for field operations
pub type FieldResult<T> = Result<T, FieldError>;
