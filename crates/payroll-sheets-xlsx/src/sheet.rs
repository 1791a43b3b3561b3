//! Worksheet rows and cells
//!
//! [`SheetData`] owns the parsed `<sheetData>` element as an ordered list of
//! [`Row`]s, each owning its [`Cell`]s ordered by column. Rows and cells are
//! created on demand at their sorted position so the serialized part stays
//! in ascending order.

use payroll_sheets_core::{column_index, format_decimal, CellAddress};

use crate::error::{XlsxError, XlsxResult};
use crate::shared_strings::SharedStrings;
use crate::xml::{name_prefix, XmlElement, XmlNode};

/// Children that hold a cell's content
const CONTENT_CHILDREN: [&str; 3] = ["f", "v", "is"];

/// Value type produced by a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaResult {
    /// Numeric result (no type marker)
    Number,
    /// Text result (`t="str"`), so readers show text before recalculation
    Text,
}

/// What a cell currently holds
#[derive(Debug, Clone, PartialEq)]
pub enum CellKind {
    /// No content
    Empty,
    /// Number, as stored
    Numeric(String),
    /// Index into the shared string table
    SharedString(usize),
    /// Literal text stored in the cell
    InlineString(String),
    /// Formula with its cached value, if any
    Formula {
        expression: String,
        cached: Option<String>,
        result: FormulaResult,
    },
    /// Boolean, error or other typed value
    Other {
        cell_type: String,
        value: Option<String>,
    },
}

/// A `<c>` element
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    address: CellAddress,
    element: XmlElement,
}

impl Cell {
    pub(crate) fn new(prefix: &str, address: CellAddress) -> Self {
        let mut element = XmlElement::new(format!("{prefix}c"));
        element.set_attr("r", address.to_a1_string());
        Self { address, element }
    }

    pub(crate) fn from_element(mut element: XmlElement) -> XlsxResult<Self> {
        let reference = element
            .attr("r")
            .ok_or_else(|| XlsxError::CorruptArchive("cell without an r attribute".into()))?;
        let address = CellAddress::parse(reference)?;
        element.strip_whitespace();
        Ok(Self { address, element })
    }

    /// Address of this cell
    pub fn address(&self) -> CellAddress {
        self.address
    }

    /// Column letters
    pub fn column(&self) -> String {
        self.address.column_letters()
    }

    /// Underlying element
    pub fn element(&self) -> &XmlElement {
        &self.element
    }

    /// Cell type marker (`t` attribute)
    pub fn cell_type(&self) -> Option<&str> {
        self.element.attr("t")
    }

    /// Whether the cell has a `<f>` child
    pub fn has_formula(&self) -> bool {
        self.element.child("f").is_some()
    }

    /// Formula text, if the cell holds a formula with text
    pub fn formula(&self) -> Option<String> {
        self.element
            .child("f")
            .map(|f| f.text())
            .filter(|text| !text.is_empty())
    }

    /// Classify the cell's content
    pub fn kind(&self) -> CellKind {
        let value = self.element.child("v").map(|v| v.text());

        if let Some(f) = self.element.child("f") {
            return CellKind::Formula {
                expression: f.text(),
                cached: value,
                result: match self.cell_type() {
                    Some("str") => FormulaResult::Text,
                    _ => FormulaResult::Number,
                },
            };
        }

        match self.cell_type() {
            Some("s") => match value.as_deref().and_then(|v| v.trim().parse().ok()) {
                Some(index) => CellKind::SharedString(index),
                None => CellKind::Empty,
            },
            Some("inlineStr") => match self.element.child("is") {
                Some(is) => CellKind::InlineString(is.descendant_text("t")),
                None => CellKind::Empty,
            },
            None | Some("n") => match value {
                Some(v) => CellKind::Numeric(v),
                None => CellKind::Empty,
            },
            Some(other) => CellKind::Other {
                cell_type: other.to_string(),
                value,
            },
        }
    }

    /// Text content (shared or inline string)
    pub fn text(&self, shared: &SharedStrings) -> Option<String> {
        match self.kind() {
            CellKind::SharedString(index) => shared.get(index).map(str::to_string),
            CellKind::InlineString(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric content (plain numbers only)
    pub fn number(&self) -> Option<f64> {
        match self.kind() {
            CellKind::Numeric(v) => v.trim().parse().ok(),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self) -> &mut XmlElement {
        &mut self.element
    }

    pub(crate) fn set_row(&mut self, row: u32) {
        self.address = self.address.with_row(row);
        self.element.set_attr("r", self.address.to_a1_string());
    }

    fn prefix(&self) -> &str {
        name_prefix(&self.element.name)
    }

    fn clear_content(&mut self) {
        self.element.remove_children(&CONTENT_CHILDREN);
    }

    /// Content children go first; anything else (extLst) follows them
    fn insert_content(&mut self, content: XmlElement) {
        self.element.children.insert(0, XmlNode::Element(content));
    }

    pub(crate) fn set_number(&mut self, value: f64) {
        let mut v = XmlElement::new(format!("{}v", self.prefix()));
        v.set_text(format_decimal(value));
        self.element.remove_attr("t");
        self.clear_content();
        self.insert_content(v);
    }

    pub(crate) fn set_inline_text(&mut self, text: &str) {
        let prefix = self.prefix().to_string();
        let mut t = XmlElement::new(format!("{prefix}t"));
        if text.trim() != text {
            t.set_attr("xml:space", "preserve");
        }
        if !text.is_empty() {
            t.set_text(text);
        }
        let mut is = XmlElement::new(format!("{prefix}is"));
        is.push(t);

        self.element.set_attr("t", "inlineStr");
        self.clear_content();
        self.insert_content(is);
    }

    pub(crate) fn set_formula(&mut self, expression: &str, result: FormulaResult) {
        let mut f = XmlElement::new(format!("{}f", self.prefix()));
        f.set_text(expression);
        match result {
            FormulaResult::Text => self.element.set_attr("t", "str"),
            FormulaResult::Number => {
                self.element.remove_attr("t");
            }
        }
        self.clear_content();
        self.insert_content(f);
    }
}

/// A `<row>` element and its cells
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    number: u32,
    /// Attributes and non-cell children
    element: XmlElement,
    cells: Vec<Cell>,
}

impl Row {
    pub(crate) fn new(prefix: &str, number: u32) -> Self {
        let mut element = XmlElement::new(format!("{prefix}row"));
        element.set_attr("r", number.to_string());
        Self {
            number,
            element,
            cells: Vec::new(),
        }
    }

    pub(crate) fn from_element(mut element: XmlElement) -> XlsxResult<Self> {
        let number = element
            .attr("r")
            .and_then(|r| r.trim().parse::<u32>().ok())
            .filter(|n| *n > 0)
            .ok_or_else(|| XlsxError::CorruptArchive("row without a valid r attribute".into()))?;

        let mut cells = Vec::new();
        let mut rest = Vec::new();
        for node in std::mem::take(&mut element.children) {
            match node {
                XmlNode::Element(e) if e.local_name() == "c" => cells.push(Cell::from_element(e)?),
                XmlNode::Text(t) if t.trim().is_empty() => {}
                other => rest.push(other),
            }
        }
        element.children = rest;
        cells.sort_by_key(|c| c.address.col);

        Ok(Self {
            number,
            element,
            cells,
        })
    }

    pub(crate) fn to_element(&self) -> XmlElement {
        let mut element = self.element.clone();
        let mut children: Vec<XmlNode> = self
            .cells
            .iter()
            .map(|c| XmlNode::Element(c.element.clone()))
            .collect();
        children.append(&mut element.children);
        element.children = children;
        element
    }

    /// Row number (1-based)
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Cells in column order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Row attribute (`ht`, `hidden`, `s`, ...)
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.element.attr(key)
    }

    /// Cell in the given column
    pub fn cell(&self, col: u32) -> Option<&Cell> {
        self.cells
            .binary_search_by_key(&col, |c| c.address.col)
            .ok()
            .map(|i| &self.cells[i])
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub(crate) fn remove_attr(&mut self, key: &str) -> Option<String> {
        self.element.remove_attr(key)
    }

    pub(crate) fn set_number(&mut self, number: u32) {
        self.number = number;
        self.element.set_attr("r", number.to_string());
        for cell in &mut self.cells {
            cell.set_row(number);
        }
    }

    /// Cell in `col`, created at its sorted position when absent
    pub(crate) fn cell_mut_or_insert(&mut self, col: u32) -> &mut Cell {
        let index = match self.cells.binary_search_by_key(&col, |c| c.address.col) {
            Ok(i) => i,
            Err(i) => {
                let prefix = name_prefix(&self.element.name).to_string();
                let cell = Cell::new(&prefix, CellAddress::new(col, self.number));
                self.cells.insert(i, cell);
                i
            }
        };
        &mut self.cells[index]
    }
}

/// The parsed `<sheetData>` element
#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    /// Element name and attributes
    element: XmlElement,
    rows: Vec<Row>,
}

impl SheetData {
    /// Build from a parsed `<sheetData>` element
    pub fn from_element(mut element: XmlElement) -> XlsxResult<Self> {
        let mut rows = Vec::new();
        for node in std::mem::take(&mut element.children) {
            if let XmlNode::Element(e) = node {
                if e.local_name() == "row" {
                    rows.push(Row::from_element(e)?);
                } else {
                    log::debug!("ignoring <{}> inside sheetData", e.name);
                }
            }
        }
        rows.sort_by_key(|r| r.number);
        Ok(Self { element, rows })
    }

    /// Rebuild the `<sheetData>` element
    pub fn to_element(&self) -> XmlElement {
        let mut element = self.element.clone();
        element.children = self
            .rows
            .iter()
            .map(|r| XmlNode::Element(r.to_element()))
            .collect();
        element
    }

    /// Serialized `<sheetData>` fragment
    pub fn to_xml(&self) -> String {
        self.to_element().to_xml()
    }

    /// Namespace prefix used by the source part (`""` or `"x:"`)
    pub fn prefix(&self) -> &str {
        name_prefix(&self.element.name)
    }

    /// Rows in ascending order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    /// Existing row
    pub fn row(&self, number: u32) -> Option<&Row> {
        self.rows
            .binary_search_by_key(&number, |r| r.number)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Row with the given number, created at its sorted position when absent
    pub fn get_row(&mut self, number: u32) -> &mut Row {
        let index = match self.rows.binary_search_by_key(&number, |r| r.number) {
            Ok(i) => i,
            Err(i) => {
                let row = Row::new(self.prefix(), number);
                self.rows.insert(i, row);
                i
            }
        };
        &mut self.rows[index]
    }

    /// Existing cell
    pub fn cell(&self, row: u32, column: &str) -> Option<&Cell> {
        let col = column_index(column).ok()?;
        self.row(row)?.cell(col)
    }

    fn cell_mut(&mut self, row: u32, column: &str) -> XlsxResult<&mut Cell> {
        let col = column_index(column)?;
        if row == 0 {
            return Err(payroll_sheets_core::Error::malformed_address(format!("{column}{row}")).into());
        }
        Ok(self.get_row(row).cell_mut_or_insert(col))
    }

    /// Write a number, replacing any formula or text
    pub fn set_numeric_cell(&mut self, row: u32, column: &str, value: f64) -> XlsxResult<()> {
        self.cell_mut(row, column)?.set_number(value);
        Ok(())
    }

    /// Write a number unless the cell already holds a formula
    pub fn set_numeric_cell_preserving_formula(
        &mut self,
        row: u32,
        column: &str,
        value: f64,
    ) -> XlsxResult<()> {
        if self.cell(row, column).is_some_and(Cell::has_formula) {
            return Ok(());
        }
        self.set_numeric_cell(row, column, value)
    }

    /// Write literal text (`t="inlineStr"`)
    pub fn set_inline_text(&mut self, row: u32, column: &str, text: &str) -> XlsxResult<()> {
        self.cell_mut(row, column)?.set_inline_text(text);
        Ok(())
    }

    /// Write a formula without a cached value
    pub fn set_formula(
        &mut self,
        row: u32,
        column: &str,
        expression: &str,
        result: FormulaResult,
    ) -> XlsxResult<()> {
        self.cell_mut(row, column)?.set_formula(expression, result);
        Ok(())
    }

    /// Remove the `hidden` flag from every row
    pub fn reveal_hidden_rows(&mut self) -> usize {
        self.rows
            .iter_mut()
            .map(|row| row.remove_attr("hidden").is_some())
            .filter(|&removed| removed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheet(xml: &str) -> SheetData {
        SheetData::from_element(XmlElement::parse(xml).unwrap()).unwrap()
    }

    #[test]
    fn test_rows_created_in_order() {
        let mut data = sheet(r#"<sheetData><row r="2"/><row r="9"/></sheetData>"#);
        data.get_row(5);
        data.get_row(1);
        data.get_row(12);
        let numbers: Vec<u32> = data.rows().iter().map(Row::number).collect();
        assert_eq!(numbers, vec![1, 2, 5, 9, 12]);
        assert_eq!(
            data.to_xml(),
            r#"<sheetData><row r="1"/><row r="2"/><row r="5"/><row r="9"/><row r="12"/></sheetData>"#
        );
    }

    #[test]
    fn test_cells_created_in_column_order() {
        let mut data = sheet(r#"<sheetData><row r="3"><c r="B3"/><c r="AA3"/></row></sheetData>"#);
        data.set_numeric_cell(3, "C", 1.0).unwrap();
        data.set_numeric_cell(3, "A", 2.0).unwrap();
        data.set_numeric_cell(3, "AB", 3.0).unwrap();
        let columns: Vec<String> = data.row(3).unwrap().cells().iter().map(Cell::column).collect();
        assert_eq!(columns, vec!["A", "B", "C", "AA", "AB"]);
    }

    #[test]
    fn test_numeric_replaces_formula_and_text() {
        let mut data = sheet(
            r#"<sheetData><row r="4"><c r="G4" s="7" t="str"><f>SUM(H4:J4)</f><v>x</v></c></row></sheetData>"#,
        );
        data.set_numeric_cell(4, "G", 12.50).unwrap();
        assert_eq!(
            data.to_xml(),
            r#"<sheetData><row r="4"><c r="G4" s="7"><v>12.5</v></c></row></sheetData>"#
        );
    }

    #[test]
    fn test_preserving_formula() {
        let mut data = sheet(r#"<sheetData><row r="4"><c r="G4"><f>SUM(H4:J4)</f></c></row></sheetData>"#);
        data.set_numeric_cell_preserving_formula(4, "G", 0.0).unwrap();
        assert_eq!(
            data.cell(4, "G").unwrap().formula().as_deref(),
            Some("SUM(H4:J4)")
        );

        data.set_numeric_cell_preserving_formula(4, "H", 0.0).unwrap();
        assert_eq!(data.cell(4, "H").unwrap().number(), Some(0.0));
    }

    #[test]
    fn test_inline_text_and_formula_kinds() {
        let mut data = sheet("<sheetData/>");
        data.set_inline_text(5, "B", "Maria Lopez").unwrap();
        data.set_formula(5, "D", "SUM(K5:O5)", FormulaResult::Number).unwrap();
        data.set_formula(6, "B", r#"IF(C1=0,"a","b")"#, FormulaResult::Text).unwrap();

        assert_eq!(
            data.cell(5, "B").unwrap().kind(),
            CellKind::InlineString("Maria Lopez".into())
        );
        assert_eq!(
            data.cell(6, "B").unwrap().kind(),
            CellKind::Formula {
                expression: r#"IF(C1=0,"a","b")"#.into(),
                cached: None,
                result: FormulaResult::Text,
            }
        );
        assert_eq!(
            data.to_xml(),
            concat!(
                r#"<sheetData><row r="5"><c r="B5" t="inlineStr"><is><t>Maria Lopez</t></is></c>"#,
                r#"<c r="D5"><f>SUM(K5:O5)</f></c></row>"#,
                r#"<row r="6"><c r="B6" t="str"><f>IF(C1=0,"a","b")</f></c></row></sheetData>"#
            )
        );
    }

    #[test]
    fn test_setters_are_idempotent() {
        let mut data = sheet(r#"<sheetData><row r="1"><c r="A1"><v>1</v><extLst/></c></row></sheetData>"#);
        data.set_inline_text(1, "A", " padded ").unwrap();
        let once = data.to_xml();
        data.set_inline_text(1, "A", " padded ").unwrap();
        assert_eq!(data.to_xml(), once);
        assert_eq!(
            once,
            r#"<sheetData><row r="1"><c r="A1" t="inlineStr"><is><t xml:space="preserve"> padded </t></is><extLst/></c></row></sheetData>"#
        );

        data.set_numeric_cell(1, "C", 3.0).unwrap();
        let once = data.to_xml();
        data.set_numeric_cell(1, "C", 3.0).unwrap();
        assert_eq!(data.to_xml(), once);
    }

    #[test]
    fn test_prefixed_elements() {
        let mut data = sheet(r#"<x:sheetData><x:row r="2"><x:c r="A2"/></x:row></x:sheetData>"#);
        data.set_numeric_cell(3, "B", 4.0).unwrap();
        assert_eq!(
            data.to_xml(),
            r#"<x:sheetData><x:row r="2"><x:c r="A2"/></x:row><x:row r="3"><x:c r="B3"><x:v>4</x:v></x:c></x:row></x:sheetData>"#
        );
    }

    #[test]
    fn test_malformed_cell_reference() {
        let element = XmlElement::parse(r#"<sheetData><row r="1"><c r="a1"/></row></sheetData>"#).unwrap();
        assert!(matches!(
            SheetData::from_element(element),
            Err(XlsxError::Core(payroll_sheets_core::Error::MalformedAddress(_)))
        ));
    }

    #[test]
    fn test_reveal_hidden_rows() {
        let mut data = sheet(r#"<sheetData><row r="1" hidden="1" ht="3"/><row r="2"/></sheetData>"#);
        assert_eq!(data.reveal_hidden_rows(), 1);
        assert_eq!(data.to_xml(), r#"<sheetData><row r="1" ht="3"/><row r="2"/></sheetData>"#);
    }
}
