//! Cell address type and column-letter conversions

use crate::error::{Error, Result};
use crate::MAX_COLUMN;
use std::fmt;
use std::str::FromStr;

/// A plain worksheet cell address (e.g. "B12")
///
/// Unlike a [`FormulaReference`](crate::FormulaReference), a cell address never
/// carries `$` markers: it is the `r` attribute of a `<c>` element. Both the
/// column index and the row number are 1-based, matching the text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    /// Row number (1-based)
    pub row: u32,
    /// Column index (1-based, A=1, Z=26, AA=27)
    pub col: u32,
}

impl CellAddress {
    /// Create a new address from a 1-based column index and row number
    pub fn new(col: u32, row: u32) -> Self {
        Self { row, col }
    }

    /// Parse an address of the exact form `[A-Z]+[0-9]+`
    ///
    /// Lowercase letters, `$` markers, whitespace, a zero row and leading
    /// zeros in the row are all rejected.
    ///
    /// # Examples
    /// ```
    /// use payroll_sheets_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("AA10").unwrap();
    /// assert_eq!(addr.col, 27);
    /// assert_eq!(addr.row, 10);
    /// assert!(CellAddress::parse("$A$1").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        let letters_end = bytes
            .iter()
            .position(|b| !b.is_ascii_uppercase())
            .unwrap_or(bytes.len());

        if letters_end == 0 || letters_end == bytes.len() {
            return Err(Error::malformed_address(s));
        }

        let digits = &s[letters_end..];
        if !digits.bytes().all(|b| b.is_ascii_digit()) || digits.starts_with('0') {
            return Err(Error::malformed_address(s));
        }

        let row: u32 = digits.parse().map_err(|_| Error::malformed_address(s))?;
        let col = column_index(&s[..letters_end]).map_err(|_| Error::malformed_address(s))?;

        Ok(Self { row, col })
    }

    /// Column letters of this address
    pub fn column_letters(&self) -> String {
        column_letters(self.col)
    }

    /// Same column, different row
    pub fn with_row(&self, row: u32) -> Self {
        Self { row, col: self.col }
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        format_address(&self.column_letters(), self.row)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column_letters(), self.row)
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Parse `[A-Z]+[0-9]+` into a [`CellAddress`]
pub fn parse_address(text: &str) -> Result<CellAddress> {
    CellAddress::parse(text)
}

/// Convert column letters to a 1-based index (A = 1, Z = 26, AA = 27)
///
/// Bijective base 26: there is no zero digit.
pub fn column_index(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(Error::malformed_address(letters));
    }

    let mut col: u32 = 0;
    for b in letters.bytes() {
        if !b.is_ascii_uppercase() {
            return Err(Error::malformed_address(letters));
        }
        col = col * 26 + u32::from(b - b'A' + 1);
        if col > MAX_COLUMN {
            return Err(Error::malformed_address(letters));
        }
    }

    Ok(col)
}

/// Convert a 1-based column index to letters (1 = A, 26 = Z, 27 = AA)
pub fn column_letters(col: u32) -> String {
    let mut result = Vec::new();
    let mut n = col;

    while n > 0 {
        n -= 1;
        result.push((n % 26) as u8 + b'A');
        n /= 26;
    }

    result.reverse();
    String::from_utf8(result).unwrap_or_default()
}

/// Format column letters and a row number as an address
pub fn format_address(column: &str, row: u32) -> String {
    format!("{column}{row}")
}
