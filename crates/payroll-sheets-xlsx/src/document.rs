//! An opened workbook with one worksheet loaded for patching

use crate::error::XlsxResult;
use crate::sheet::{FormulaResult, Row};
use crate::shared_strings::SharedStrings;
use crate::worksheet::Worksheet;
use crate::xml::XmlElement;

/// Formula-dependency cache part and where it is referenced
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CalcChain {
    /// Part name (`xl/calcChain.xml`)
    pub(crate) path: String,
}

/// A workbook archive with its target worksheet parsed
///
/// Only the worksheet fragments and the workbook calculation properties are
/// held as trees. Every other part is written back exactly as it was read.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) archive: Vec<u8>,
    pub(crate) sheet_name: String,
    pub(crate) worksheet: Worksheet,
    pub(crate) shared_strings: SharedStrings,
    pub(crate) workbook_xml: String,
    pub(crate) workbook_rels: Option<String>,
    pub(crate) content_types: String,
    pub(crate) calc_pr: Option<XmlElement>,
    pub(crate) calc_chain: Option<CalcChain>,
    pub(crate) full_recalculation: bool,
}

impl Document {
    /// Name of the loaded worksheet
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// The loaded worksheet
    pub fn worksheet(&self) -> &Worksheet {
        &self.worksheet
    }

    /// The loaded worksheet, mutably
    pub fn worksheet_mut(&mut self) -> &mut Worksheet {
        &mut self.worksheet
    }

    /// Shared string table
    pub fn shared_strings(&self) -> &SharedStrings {
        &self.shared_strings
    }

    /// Whether the archive carries a calculation chain (dropped on write)
    pub fn has_calc_chain(&self) -> bool {
        self.calc_chain.is_some()
    }

    /// Row `number`, created in sorted position when absent
    pub fn get_row(&mut self, number: u32) -> &mut Row {
        self.worksheet.data.get_row(number)
    }

    /// Text of a shared or inline string cell
    pub fn cell_text(&self, row: u32, column: &str) -> Option<String> {
        self.worksheet
            .data
            .cell(row, column)
            .and_then(|cell| cell.text(&self.shared_strings))
    }

    /// Value of a plain numeric cell
    pub fn cell_number(&self, row: u32, column: &str) -> Option<f64> {
        self.worksheet.data.cell(row, column).and_then(|cell| cell.number())
    }

    /// Formula text of a cell
    pub fn formula(&self, row: u32, column: &str) -> Option<String> {
        self.worksheet.data.cell(row, column).and_then(|cell| cell.formula())
    }

    /// See [`SheetData::set_numeric_cell`](crate::SheetData::set_numeric_cell)
    pub fn set_numeric_cell(&mut self, row: u32, column: &str, value: f64) -> XlsxResult<()> {
        self.worksheet.data.set_numeric_cell(row, column, value)
    }

    /// See [`SheetData::set_numeric_cell_preserving_formula`](crate::SheetData::set_numeric_cell_preserving_formula)
    pub fn set_numeric_cell_preserving_formula(
        &mut self,
        row: u32,
        column: &str,
        value: f64,
    ) -> XlsxResult<()> {
        self.worksheet
            .data
            .set_numeric_cell_preserving_formula(row, column, value)
    }

    /// See [`SheetData::set_inline_text`](crate::SheetData::set_inline_text)
    pub fn set_inline_text(&mut self, row: u32, column: &str, text: &str) -> XlsxResult<()> {
        self.worksheet.data.set_inline_text(row, column, text)
    }

    /// See [`SheetData::set_formula`](crate::SheetData::set_formula)
    pub fn set_formula(
        &mut self,
        row: u32,
        column: &str,
        expression: &str,
        result: FormulaResult,
    ) -> XlsxResult<()> {
        self.worksheet.data.set_formula(row, column, expression, result)
    }

    /// See [`Worksheet::shift_rows_from`]
    pub fn shift_rows_from(&mut self, start_row: u32, delta: i64) -> XlsxResult<()> {
        self.worksheet.shift_rows_from(start_row, delta)
    }

    /// See [`Worksheet::clone_template_row`]
    pub fn clone_template_row(&mut self, source_row: u32, target_row: u32) -> XlsxResult<()> {
        self.worksheet.clone_template_row(source_row, target_row)
    }

    /// Remove the `hidden` flag from every row
    pub fn reveal_hidden_rows(&mut self) -> usize {
        self.worksheet.data.reveal_hidden_rows()
    }

    /// Ask readers to recalculate every formula when the workbook is opened
    pub fn mark_full_recalculation(&mut self) {
        self.full_recalculation = true;
    }
}
