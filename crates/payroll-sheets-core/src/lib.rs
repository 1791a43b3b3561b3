//! # payroll-sheets-core
//!
//! Core types for the payroll-sheets workbook patch engine.
//!
//! This crate provides the fundamental types used throughout payroll-sheets:
//! - [`CellAddress`] - `[A-Z]+[0-9]+` cell addresses and column-letter math
//! - [`FormulaReference`] - `$`-aware references and the two row-rewrite laws
//! - [`BilledCompany`], [`HomeCompany`] - the companies hours and people belong to
//!
//! ## Example
//!
//! ```rust
//! use payroll_sheets_core::{parse_address, translate_formula_for_copy};
//!
//! let addr = parse_address("K26").unwrap();
//! assert_eq!(addr.col, 11);
//!
//! assert_eq!(translate_formula_for_copy("SUM(K25:O25)*$C$2", 2), "SUM(K27:O27)*$C$2");
//! ```

pub mod cell;
pub mod company;
pub mod error;
pub mod reference;

// Re-exports for convenience
pub use cell::{column_index, column_letters, format_address, parse_address, CellAddress};
pub use company::{BilledCompany, CompanyAmounts, HomeCompany};
pub use error::{Error, Result};
pub use reference::{
    rewrite_references, shift_formula_for_insert, shift_range_rows, translate_formula_for_copy,
    FormulaReference,
};

/// Maximum column index in a worksheet (XFD)
pub const MAX_COLUMN: u32 = 16_384;

/// Format a number the way the workbook parts store it
///
/// Ten decimal places with trailing zeros and a trailing point removed; any
/// value within 1e-12 of zero renders as `"0"`.
///
/// ```
/// use payroll_sheets_core::format_decimal;
///
/// assert_eq!(format_decimal(12.5), "12.5");
/// assert_eq!(format_decimal(40.0), "40");
/// assert_eq!(format_decimal(-0.0), "0");
/// ```
pub fn format_decimal(value: f64) -> String {
    if value.abs() < 1e-12 {
        return "0".to_string();
    }
    let text = format!("{value:.10}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() || text == "-" || text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(0.0), "0");
        assert_eq!(format_decimal(1e-13), "0");
        assert_eq!(format_decimal(1.18), "1.18");
        assert_eq!(format_decimal(22.0), "22");
        assert_eq!(format_decimal(7.25), "7.25");
        assert_eq!(format_decimal(-3.5), "-3.5");
        assert_eq!(format_decimal(1.0 / 3.0), "0.3333333333");
        assert_eq!(format_decimal(0.00000000001), "0");
        assert_eq!(format_decimal(-0.00000000001), "0");
    }
}
