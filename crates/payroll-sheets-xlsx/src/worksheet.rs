//! The worksheet fragments a fill rewrites
//!
//! A [`Worksheet`] holds the parsed `sheetData`, plus `dimension` and
//! `mergeCells` when the part has them, next to the part's original text.

use crate::error::{XlsxError, XlsxResult};
use crate::fragment::Fragment;
use crate::sheet::SheetData;
use crate::xml::XmlElement;

/// Parsed worksheet fragments and the part text they came from
#[derive(Debug, Clone)]
pub struct Worksheet {
    pub(crate) path: String,
    pub(crate) source: String,
    pub(crate) data: SheetData,
    pub(crate) dimension: Option<XmlElement>,
    pub(crate) merge_cells: Option<XmlElement>,
}

impl Worksheet {
    /// Parse the fragments of a worksheet part
    pub fn parse(path: &str, source: String) -> XlsxResult<Self> {
        let data = Fragment::SheetData
            .parse(path, &source)?
            .ok_or_else(|| XlsxError::CorruptArchive(format!("{path} has no sheetData")))?;
        let data = SheetData::from_element(data)?;
        let dimension = Fragment::Dimension.parse(path, &source)?;
        let merge_cells = Fragment::MergeCells.parse(path, &source)?;

        log::debug!(
            "parsed {}: {} rows, dimension {:?}, {} merged ranges",
            path,
            data.rows().len(),
            dimension.as_ref().and_then(|d| d.attr("ref")),
            merge_cells.as_ref().map_or(0, |m| m.elements().count())
        );

        Ok(Self {
            path: path.to_string(),
            source,
            data,
            dimension,
            merge_cells,
        })
    }

    /// Part name inside the archive
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Row and cell data
    pub fn data(&self) -> &SheetData {
        &self.data
    }

    /// Mutable row and cell data
    pub fn data_mut(&mut self) -> &mut SheetData {
        &mut self.data
    }

    /// The sheet's dimension reference (`A1:Q101`)
    pub fn dimension(&self) -> Option<&str> {
        self.dimension.as_ref().and_then(|d| d.attr("ref"))
    }

    /// Merged ranges in document order
    pub fn merged_ranges(&self) -> Vec<&str> {
        self.merge_cells
            .iter()
            .flat_map(|m| m.elements())
            .filter(|e| e.local_name() == "mergeCell")
            .filter_map(|e| e.attr("ref"))
            .collect()
    }

    /// Serialize the part with every rewritten fragment spliced in
    pub fn to_xml(&self) -> XlsxResult<String> {
        let mut text = Fragment::SheetData.splice(&self.path, &self.source, &self.data.to_xml())?;
        if let Some(dimension) = &self.dimension {
            text = Fragment::Dimension.splice(&self.path, &text, &dimension.to_xml())?;
        }
        if let Some(merge_cells) = &self.merge_cells {
            text = Fragment::MergeCells.splice(&self.path, &text, &merge_cells.to_xml())?;
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PART: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\n",
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:mc="urn:mc">"#,
        r#"<dimension ref="A1:Q40"/><sheetViews><sheetView workbookViewId="0"/></sheetViews>"#,
        r#"<sheetData><row r="1"><c r="B1" t="s"><v>0</v></c></row></sheetData>"#,
        r#"<mergeCells count="1"><mergeCell ref="B20:B30"/></mergeCells>"#,
        r#"<pageMargins left="0.7"/></worksheet>"#
    );

    #[test]
    fn test_parse_fragments() {
        let sheet = Worksheet::parse("xl/worksheets/sheet1.xml", PART.to_string()).unwrap();
        assert_eq!(sheet.dimension(), Some("A1:Q40"));
        assert_eq!(sheet.merged_ranges(), vec!["B20:B30"]);
        assert_eq!(sheet.data().rows().len(), 1);
    }

    #[test]
    fn test_unchanged_round_trip() {
        let sheet = Worksheet::parse("xl/worksheets/sheet1.xml", PART.to_string()).unwrap();
        assert_eq!(sheet.to_xml().unwrap(), PART);
    }

    #[test]
    fn test_missing_sheet_data() {
        let err = Worksheet::parse("sheet", "<worksheet/>".to_string()).unwrap_err();
        assert!(matches!(err, XlsxError::CorruptArchive(_)));
    }
}
