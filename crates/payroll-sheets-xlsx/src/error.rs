//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur while opening, patching or reassembling a workbook
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Required part or element missing, or a part that is not UTF-8 XML
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    /// No worksheet with the requested name
    #[error("Worksheet not found: {0}")]
    SheetNotFound(String),

    /// A fragment to splice did not occur exactly once in its part
    #[error("Cannot splice <{fragment}> into {part}: expected exactly one occurrence, found {found}")]
    ReassemblyMismatch {
        part: String,
        fragment: String,
        found: usize,
    },

    /// Two rows would end up with the same number
    #[error("Row {0} already exists")]
    RowCollision(u32),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] payroll_sheets_core::Error),
}
