//! A1-style references inside formulas and range attributes
//!
//! Two row rewrites exist and must not be confused:
//!
//! - [`shift_formula_for_insert`] moves *existing* formulas that point at or
//!   below an insertion point, because the rows they point to moved.
//! - [`translate_formula_for_copy`] re-targets a *copied* formula to the row
//!   it was copied to, the way a spreadsheet does on copy/paste.
//!
//! In both cases a `$`-pinned row component is left alone. Range attributes
//! ([`shift_range_rows`]) are structural rather than formulas, so every row in
//! them moves when it sits at or below the insertion point.

use std::fmt;
use std::str::FromStr;

use crate::cell::column_index;
use crate::error::{Error, Result};

/// A single `$?COL$?ROW` token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormulaReference {
    /// Column is pinned with `$`
    pub col_absolute: bool,
    /// Column letters (uppercase)
    pub column: String,
    /// Row is pinned with `$`
    pub row_absolute: bool,
    /// Row number (1-based)
    pub row: u32,
}

impl FormulaReference {
    /// Parse a reference that must span the whole input
    ///
    /// ```
    /// use payroll_sheets_core::FormulaReference;
    ///
    /// let r = FormulaReference::parse("$C10").unwrap();
    /// assert!(r.col_absolute);
    /// assert!(!r.row_absolute);
    /// assert_eq!(r.row, 10);
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        match scan_reference(text.as_bytes(), 0) {
            Some((reference, end)) if end == text.len() => Ok(reference),
            _ => Err(Error::MalformedReference(text.to_string())),
        }
    }

    /// Move the row by `delta`, saturating at row 1
    fn offset_row(&mut self, delta: i64) {
        let row = (i64::from(self.row) + delta).max(1);
        self.row = u32::try_from(row).unwrap_or(u32::MAX);
    }
}

impl fmt::Display for FormulaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.col_absolute {
            f.write_str("$")?;
        }
        f.write_str(&self.column)?;
        if self.row_absolute {
            f.write_str("$")?;
        }
        write!(f, "{}", self.row)
    }
}

impl FromStr for FormulaReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Try to read a reference token starting at `start`
///
/// Returns the reference and the byte offset just past it.
fn scan_reference(bytes: &[u8], start: usize) -> Option<(FormulaReference, usize)> {
    let mut pos = start;

    let col_absolute = bytes.get(pos) == Some(&b'$');
    if col_absolute {
        pos += 1;
    }

    let col_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_uppercase() && pos - col_start < 3 {
        pos += 1;
    }
    if pos == col_start {
        return None;
    }
    let column = std::str::from_utf8(&bytes[col_start..pos]).ok()?;
    column_index(column).ok()?;
    let column = column.to_string();

    let row_absolute = bytes.get(pos) == Some(&b'$');
    if row_absolute {
        pos += 1;
    }

    let row_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos == row_start {
        return None;
    }
    let row: u32 = std::str::from_utf8(&bytes[row_start..pos]).ok()?.parse().ok()?;
    if row == 0 {
        return None;
    }

    Some((
        FormulaReference {
            col_absolute,
            column,
            row_absolute,
            row,
        },
        pos,
    ))
}

fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// Rewrite every cell reference in a formula through `rewrite`
///
/// String literals and quoted sheet names are copied untouched, as are
/// identifiers that merely look like references (`LOG10(`, `Q1!`).
pub fn rewrite_references<F>(formula: &str, mut rewrite: F) -> String
where
    F: FnMut(&mut FormulaReference),
{
    let bytes = formula.as_bytes();
    let mut out = String::with_capacity(formula.len() + 8);
    let mut copied = 0;
    let mut pos = 0;
    let mut in_string = false;
    let mut in_sheet_name = false;

    while pos < bytes.len() {
        let b = bytes[pos];

        if in_string {
            in_string = b != b'"';
            pos += 1;
            continue;
        }
        if in_sheet_name {
            in_sheet_name = b != b'\'';
            pos += 1;
            continue;
        }
        match b {
            b'"' => {
                in_string = true;
                pos += 1;
                continue;
            }
            b'\'' => {
                in_sheet_name = true;
                pos += 1;
                continue;
            }
            _ => {}
        }

        let at_boundary = pos == 0 || {
            let prev = bytes[pos - 1];
            !is_identifier_byte(prev) && prev != b'$'
        };

        if at_boundary && (b == b'$' || b.is_ascii_uppercase()) {
            if let Some((mut reference, end)) = scan_reference(bytes, pos) {
                let followed_by_identifier = bytes
                    .get(end)
                    .is_some_and(|&next| is_identifier_byte(next) || next == b'(' || next == b'!');
                if !followed_by_identifier {
                    rewrite(&mut reference);
                    out.push_str(&formula[copied..pos]);
                    out.push_str(&reference.to_string());
                    copied = end;
                    pos = end;
                    continue;
                }
            }
        }

        pos += 1;
    }

    out.push_str(&formula[copied..]);
    out
}

/// Shift relative row references at or below `start_row` by `delta`
///
/// Used for formulas that already exist when rows are inserted (`delta > 0`)
/// or removed (`delta < 0`). Pinned (`$`) rows are left unchanged.
pub fn shift_formula_for_insert(formula: &str, start_row: u32, delta: i64) -> String {
    if formula.is_empty() || delta == 0 {
        return formula.to_string();
    }
    rewrite_references(formula, |reference| {
        if !reference.row_absolute && reference.row >= start_row {
            reference.offset_row(delta);
        }
    })
}

/// Re-target a copied formula by moving every relative row by `delta`
pub fn translate_formula_for_copy(formula: &str, delta: i64) -> String {
    if formula.is_empty() || delta == 0 {
        return formula.to_string();
    }
    rewrite_references(formula, |reference| {
        if !reference.row_absolute {
            reference.offset_row(delta);
        }
    })
}

/// Shift a range attribute (`A1:Q101`, `B20:B30`, `C5`) for a row insertion
///
/// Each endpoint at or below `start_row` moves by `delta`; parts that are
/// not plain references are kept verbatim.
pub fn shift_range_rows(range: &str, start_row: u32, delta: i64) -> String {
    if range.is_empty() || delta == 0 {
        return range.to_string();
    }

    range
        .split(' ')
        .map(|area| {
            area.split(':')
                .map(|part| match FormulaReference::parse(part) {
                    Ok(mut reference) => {
                        if reference.row >= start_row {
                            reference.offset_row(delta);
                        }
                        reference.to_string()
                    }
                    Err(_) => part.to_string(),
                })
                .collect::<Vec<_>>()
                .join(":")
        })
        .collect::<Vec<_>>()
        .join(" ")
}
