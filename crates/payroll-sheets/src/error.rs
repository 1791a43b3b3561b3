//! Fill error types and data-quality diagnostics

use std::fmt;

use payroll_sheets_core::HomeCompany;
use thiserror::Error;

/// Result type for fill operations
pub type FillResult<T> = std::result::Result<T, FillError>;

/// Errors that abort a fill operation
///
/// Data-quality problems (unmatched names, unclassified notes) are not errors;
/// they are collected as [`Diagnostic`]s on the report.
#[derive(Debug, Error)]
pub enum FillError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Workbook error
    #[error(transparent)]
    Xlsx(#[from] payroll_sheets_xlsx::XlsxError),

    /// Input CSV error
    #[error(transparent)]
    Csv(#[from] payroll_sheets_csv::CsvError),

    /// Core error
    #[error(transparent)]
    Core(#[from] payroll_sheets_core::Error),

    /// Roster or layout JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A section needs more rows than the template has and insertion is off
    #[error("{company} section holds {capacity} rows but {requested} employees were assigned")]
    RosterCapacityExceeded {
        company: HomeCompany,
        capacity: usize,
        requested: usize,
    },

    /// Template layout is inconsistent
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// The finished output could not be moved into place
    #[error("Cannot persist output: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Which input a source name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    Hours,
    Tips,
}

impl fmt::Display for NameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameSource::Hours => f.write_str("hours"),
            NameSource::Tips => f.write_str("tips"),
        }
    }
}

/// A data-quality issue reported alongside a successful fill
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A source name matched no roster entry; its amounts were not placed
    UnmatchedIdentity { source: NameSource, name: String },
    /// A tip note named no company; the amount went to a fallback column
    AmbiguousNote(String),
    /// An hours row named no known company; its hours were skipped
    UnknownSourceCompany(String),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnmatchedIdentity { source, name } => {
                write!(f, "unmatched {source} name: {name}")
            }
            Diagnostic::AmbiguousNote(note) => write!(f, "tip note without company: {note}"),
            Diagnostic::UnknownSourceCompany(label) => write!(f, "unknown company: {label}"),
        }
    }
}
