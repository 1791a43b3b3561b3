//! # payroll-sheets-xlsx
//!
//! In-place XLSX patching for payroll-sheets.
//!
//! A [`Document`] keeps the original archive and parses only what a fill
//! rewrites: the worksheet's `sheetData`, `dimension` and `mergeCells`, and
//! the workbook's `calcPr`. On write those fragments are spliced back into
//! the original part text and every other part is copied unchanged.
//!
//! ```no_run
//! use payroll_sheets_xlsx::{Document, FormulaResult};
//!
//! let mut doc = Document::open_file("template.xlsx", None)?;
//! doc.shift_rows_from(26, 2)?;
//! doc.clone_template_row(25, 26)?;
//! doc.clone_template_row(25, 27)?;
//! doc.set_inline_text(26, "B", "Maria Lopez")?;
//! doc.set_formula(26, "D", "SUM(K26:O26)", FormulaResult::Number)?;
//! doc.mark_full_recalculation();
//! std::fs::write("filled.xlsx", doc.to_bytes()?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod document;
pub mod error;
pub mod fragment;
mod insert;
pub mod reader;
pub mod shared_strings;
pub mod sheet;
pub mod worksheet;
pub mod writer;
pub mod xml;

pub use document::Document;
pub use error::{XlsxError, XlsxResult};
pub use shared_strings::SharedStrings;
pub use sheet::{Cell, CellKind, FormulaResult, Row, SheetData};
pub use worksheet::Worksheet;
pub use xml::{XmlElement, XmlNode};
