//! Row insertion and template-row cloning

use payroll_sheets_core::{shift_formula_for_insert, shift_range_rows, translate_formula_for_copy};

use crate::error::{XlsxError, XlsxResult};
use crate::sheet::Row;
use crate::worksheet::Worksheet;
use crate::xml::XmlElement;

impl Worksheet {
    /// Move every row at or below `start_row` by `delta`
    ///
    /// Cell references inside the moved rows follow their row. Every formula
    /// in the sheet has its relative rows at or below `start_row` shifted
    /// (pinned rows stay), and so do shared/array formula ranges, merged
    /// ranges and the sheet dimension. A `delta` of zero changes nothing.
    pub fn shift_rows_from(&mut self, start_row: u32, delta: i64) -> XlsxResult<()> {
        if delta == 0 {
            return Ok(());
        }

        let target = |n: u32| -> XlsxResult<u32> {
            u32::try_from(i64::from(n) + delta)
                .ok()
                .filter(|row| *row >= 1)
                .ok_or(XlsxError::RowCollision(n))
        };

        let rows = self.data.rows_mut();
        if delta < 0 {
            // rows that would be landed on must not exist
            let lowest = i64::from(start_row) + delta;
            if let Some(blocking) = rows
                .iter()
                .map(Row::number)
                .find(|&n| i64::from(n) >= lowest && n < start_row)
            {
                return Err(XlsxError::RowCollision(blocking));
            }
        }

        // descending for insertion, ascending for removal
        let order: Vec<usize> = if delta > 0 {
            (0..rows.len()).rev().collect()
        } else {
            (0..rows.len()).collect()
        };

        for index in order {
            let row = &mut rows[index];
            let number = row.number();
            if number >= start_row {
                row.set_number(target(number)?);
            }
            for cell in row.cells_mut() {
                if let Some(f) = cell.element_mut().child_mut("f") {
                    shift_formula_element(f, start_row, delta);
                }
            }
        }

        if let Some(merge_cells) = &mut self.merge_cells {
            for merge in merge_cells.elements_mut() {
                shift_ref_attr(merge, start_row, delta);
            }
        }
        if let Some(dimension) = &mut self.dimension {
            shift_ref_attr(dimension, start_row, delta);
        }

        log::debug!("shifted rows from {} by {}", start_row, delta);
        Ok(())
    }

    /// Copy row `source_row` to the empty row `target_row`
    ///
    /// A source row absent from `sheetData` is created empty first. The copy keeps row and cell attributes (styles, heights). Formulas are
    /// re-targeted to the new row, with pinned rows left as they are, and
    /// lose their cached values. A shared-formula master becomes a plain
    /// formula; a shared-formula dependent loses its formula.
    pub fn clone_template_row(&mut self, source_row: u32, target_row: u32) -> XlsxResult<()> {
        if self.data.row(target_row).is_some() {
            return Err(XlsxError::RowCollision(target_row));
        }
        let mut row = self.data.get_row(source_row).clone();

        let delta = i64::from(target_row) - i64::from(source_row);
        row.set_number(target_row);
        for cell in row.cells_mut() {
            let element = cell.element_mut();
            let Some(f) = element.child_mut("f") else {
                continue;
            };

            let text = f.text();
            if text.is_empty() {
                element.remove_children(&["f", "v"]);
            } else {
                f.set_text(translate_formula_for_copy(&text, delta));
                f.remove_attr("ref");
                if matches!(f.attr("t"), Some("shared") | Some("array")) {
                    f.remove_attr("t");
                    f.remove_attr("si");
                }
                element.remove_children(&["v"]);
            }
        }

        let rows = self.data.rows_mut();
        let index = rows.partition_point(|r| r.number() < target_row);
        rows.insert(index, row);

        log::debug!("cloned row {} to row {}", source_row, target_row);
        Ok(())
    }
}

fn shift_formula_element(f: &mut XmlElement, start_row: u32, delta: i64) {
    let text = f.text();
    if !text.is_empty() {
        f.set_text(shift_formula_for_insert(&text, start_row, delta));
    }
    shift_ref_attr(f, start_row, delta);
}

fn shift_ref_attr(element: &mut XmlElement, start_row: u32, delta: i64) {
    if let Some(range) = element.attr("ref") {
        let shifted = shift_range_rows(range, start_row, delta);
        element.set_attr("ref", shifted);
    }
}
