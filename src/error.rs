//! Error types for schema building, value coercion and row mapping.
//!
//! Every failure in the engine surfaces as a [`MarshalError`]. Errors are never
//! retried internally; a conversion failure partway through a file aborts the
//! whole call and no partial result is returned.

use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::schema::FieldKind;

/// Result type for marshaling operations.
pub type MarshalResult<T> = Result<T, MarshalError>;

/// Top-level error for the marshaling engine.
#[derive(Debug, Error)]
pub enum MarshalError {
    /// The declared schema is invalid (duplicate field ids).
    #[error("schema error for {record}: {message}")]
    Schema { record: &'static str, message: String },

    /// A cell could not be parsed into its field kind, or a value could not be formatted.
    #[error(transparent)]
    FieldConversion(Box<FieldConversionError>),

    /// A fixed-width value does not fit its declared length.
    #[error(transparent)]
    FieldOverflow(Box<FieldOverflowError>),

    /// Degenerate row layout (missing header row, empty fixed-width output, bad mapping).
    #[error("row shape error: {0}")]
    RowShape(String),

    /// Options that cannot be honoured (e.g. a multi-byte delimiter).
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

impl MarshalError {
    pub(crate) fn schema(record: &'static str, message: impl Into<String>) -> Self {
        Self::Schema {
            record,
            message: message.into(),
        }
    }

    pub(crate) fn row_shape(message: impl Into<String>) -> Self {
        Self::RowShape(message.into())
    }

    /// Attach the 1-based source line number to a conversion or overflow error.
    #[must_use]
    pub fn at_line(mut self, line: u64) -> Self {
        match &mut self {
            Self::FieldConversion(e) => e.line = Some(line),
            Self::FieldOverflow(e) => e.line = Some(line),
            _ => {}
        }
        self
    }

    /// Attach the source file name to a conversion or overflow error.
    #[must_use]
    pub fn in_file(mut self, path: impl AsRef<Path>) -> Self {
        let name = path.as_ref().display().to_string();
        match &mut self {
            Self::FieldConversion(e) => e.file = Some(name),
            Self::FieldOverflow(e) => e.file = Some(name),
            _ => {}
        }
        self
    }

    /// The conversion error, if this is one.
    pub fn as_conversion(&self) -> Option<&FieldConversionError> {
        match self {
            Self::FieldConversion(e) => Some(e),
            _ => None,
        }
    }

    /// The overflow error, if this is one.
    pub fn as_overflow(&self) -> Option<&FieldOverflowError> {
        match self {
            Self::FieldOverflow(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FieldConversionError> for MarshalError {
    fn from(e: FieldConversionError) -> Self {
        Self::FieldConversion(Box::new(e))
    }
}

impl From<FieldOverflowError> for MarshalError {
    fn from(e: FieldOverflowError) -> Self {
        Self::FieldOverflow(Box::new(e))
    }
}

/// A single cell failed to convert to or from its field kind.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConversionError {
    pub field_id: u32,
    pub field_name: Option<String>,
    pub raw: String,
    pub kind: FieldKind,
    pub reason: String,
    pub line: Option<u64>,
    pub file: Option<String>,
}

impl FieldConversionError {
    pub(crate) fn new(
        field_id: u32,
        field_name: Option<&str>,
        raw: impl Into<String>,
        kind: FieldKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            field_id,
            field_name: field_name.map(str::to_string),
            raw: raw.into(),
            kind,
            reason: reason.into(),
            line: None,
            file: None,
        }
    }
}

impl fmt::Display for FieldConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field {}", self.field_id)?;
        if let Some(ref name) = self.field_name {
            write!(f, " ({name})")?;
        }
        write!(
            f,
            ": cannot convert <{}> as {}: {}",
            self.raw, self.kind, self.reason
        )?;
        if let Some(line) = self.line {
            write!(f, " at line {line}")?;
        }
        if let Some(ref file) = self.file {
            write!(f, " in {file}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldConversionError {}

/// A fixed-width value is wider than its declared field length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOverflowError {
    pub field_id: u32,
    pub field_name: Option<String>,
    pub value: String,
    pub length: usize,
    pub line: Option<u64>,
    pub file: Option<String>,
}

impl fmt::Display for FieldOverflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fixed-width field {}", self.field_id)?;
        if let Some(ref name) = self.field_name {
            write!(f, " ({name})")?;
        }
        write!(
            f,
            ": <{}> is {} characters, longer than field length {}",
            self.value,
            self.value.chars().count(),
            self.length
        )?;
        if let Some(line) = self.line {
            write!(f, " at record line {line}")?;
        }
        if let Some(ref file) = self.file {
            write!(f, " in {file}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldOverflowError {}
