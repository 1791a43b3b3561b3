//! Error types for payroll-sheets-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in payroll-sheets-core
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Cell address does not match `[A-Z]+[0-9]+`
    #[error("Malformed cell address: {0}")]
    MalformedAddress(String),

    /// Formula or range reference that cannot be parsed
    #[error("Malformed reference: {0}")]
    MalformedReference(String),

    /// Company label or key that does not name a known company
    #[error("Unknown company: {0}")]
    UnknownCompany(String),
}

impl Error {
    /// Create a malformed-address error for the given text
    pub fn malformed_address<S: Into<String>>(text: S) -> Self {
        Error::MalformedAddress(text.into())
    }
}
