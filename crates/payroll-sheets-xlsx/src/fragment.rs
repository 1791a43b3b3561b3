//! Locating and splicing single elements inside original part text
//!
//! Only the elements we rewrite are parsed; everything else in a part is
//! carried over as the original text, namespace declarations included.

use std::ops::Range;

use lazy_regex::regex;
use regex::Regex;

use crate::error::{XlsxError, XlsxResult};
use crate::xml::XmlElement;

/// An element we splice by exact single-occurrence match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    SheetData,
    Dimension,
    MergeCells,
    CalcPr,
}

impl Fragment {
    /// Local element name
    pub fn local_name(self) -> &'static str {
        match self {
            Fragment::SheetData => "sheetData",
            Fragment::Dimension => "dimension",
            Fragment::MergeCells => "mergeCells",
            Fragment::CalcPr => "calcPr",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Fragment::SheetData => regex!(
                r"(?s)<(?:\w+:)?sheetData\b[^>]*?(?:/>|>.*?</(?:\w+:)?sheetData>)"
            ),
            Fragment::Dimension => regex!(
                r"(?s)<(?:\w+:)?dimension\b[^>]*?(?:/>|>.*?</(?:\w+:)?dimension>)"
            ),
            Fragment::MergeCells => regex!(
                r"(?s)<(?:\w+:)?mergeCells\b[^>]*?(?:/>|>.*?</(?:\w+:)?mergeCells>)"
            ),
            Fragment::CalcPr => {
                regex!(r"(?s)<(?:\w+:)?calcPr\b[^>]*?(?:/>|>.*?</(?:\w+:)?calcPr>)")
            }
        }
    }

    /// Byte range of the fragment, if it occurs exactly once
    ///
    /// Returns `None` when absent and `ReassemblyMismatch` when repeated.
    pub fn locate(self, part: &str, text: &str) -> XlsxResult<Option<Range<usize>>> {
        let mut matches = self.pattern().find_iter(text);
        let first = matches.next();
        let extra = matches.count();
        match first {
            None => Ok(None),
            Some(m) if extra == 0 => Ok(Some(m.range())),
            Some(_) => Err(self.mismatch(part, extra + 1)),
        }
    }

    /// Parse the fragment, if present
    pub fn parse(self, part: &str, text: &str) -> XlsxResult<Option<XmlElement>> {
        match self.locate(part, text)? {
            Some(range) => Ok(Some(XmlElement::parse(&text[range])?)),
            None => Ok(None),
        }
    }

    /// Replace the single occurrence of the fragment with `replacement`
    pub fn splice(self, part: &str, text: &str, replacement: &str) -> XlsxResult<String> {
        let range = self
            .locate(part, text)?
            .ok_or_else(|| self.mismatch(part, 0))?;
        log::debug!(
            "splicing <{}> into {} ({} -> {} bytes)",
            self.local_name(),
            part,
            range.len(),
            replacement.len()
        );
        Ok(splice_range(text, range, replacement))
    }

    fn mismatch(self, part: &str, found: usize) -> XlsxError {
        XlsxError::ReassemblyMismatch {
            part: part.to_string(),
            fragment: self.local_name().to_string(),
            found,
        }
    }
}

/// Insert `insertion` right after the single closing tag `</{local}>`
pub fn insert_after_closing(
    part: &str,
    text: &str,
    local: &str,
    insertion: &str,
) -> XlsxResult<Option<String>> {
    let closing = closing_tags(text, local);
    match closing.as_slice() {
        [] => Ok(None),
        [end] => Ok(Some(splice_range(text, *end..*end, insertion))),
        many => Err(XlsxError::ReassemblyMismatch {
            part: part.to_string(),
            fragment: format!("/{local}"),
            found: many.len(),
        }),
    }
}

/// End offsets of every `</local>` or `</prefix:local>` tag
fn closing_tags(text: &str, local: &str) -> Vec<usize> {
    regex!(r"</(?:\w+:)?(\w+)\s*>")
        .captures_iter(text)
        .filter(|caps| caps.get(1).is_some_and(|name| name.as_str() == local))
        .filter_map(|caps| caps.get(0).map(|m| m.end()))
        .collect()
}

/// Remove every empty element named `local` for which `keep` returns false
pub fn remove_empty_elements<F>(text: &str, local: &str, mut keep: F) -> XlsxResult<(String, usize)>
where
    F: FnMut(&XmlElement) -> bool,
{
    let mut out = String::with_capacity(text.len());
    let mut removed = 0;
    let mut copied = 0;

    for m in regex!(r"<(?:\w+:)?(\w+)\b[^>]*/>").find_iter(text) {
        let element = XmlElement::parse(m.as_str())?;
        if element.local_name() != local || keep(&element) {
            continue;
        }
        out.push_str(&text[copied..m.start()]);
        copied = m.end();
        removed += 1;
    }
    out.push_str(&text[copied..]);
    Ok((out, removed))
}

fn splice_range(text: &str, range: Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..range.start]);
    out.push_str(replacement);
    out.push_str(&text[range.end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SHEET: &str = concat!(
        r#"<worksheet xmlns="urn:main" xmlns:r="urn:rel"><dimension ref="A1:Q40"/>"#,
        r#"<sheetData><row r="1"/></sheetData>"#,
        r#"<mergeCells count="1"><mergeCell ref="B20:B30"/></mergeCells></worksheet>"#
    );

    #[test]
    fn test_locate_fragments() {
        let data = Fragment::SheetData.parse("sheet", SHEET).unwrap().unwrap();
        assert_eq!(data.elements().count(), 1);

        let merges = Fragment::MergeCells.parse("sheet", SHEET).unwrap().unwrap();
        assert_eq!(merges.child("mergeCell").unwrap().attr("ref"), Some("B20:B30"));

        assert!(Fragment::CalcPr.parse("sheet", SHEET).unwrap().is_none());
    }

    #[test]
    fn test_empty_sheet_data() {
        let text = r#"<x:worksheet xmlns:x="urn:main"><x:sheetData/></x:worksheet>"#;
        let range = Fragment::SheetData.locate("sheet", text).unwrap().unwrap();
        assert_eq!(&text[range], "<x:sheetData/>");
    }

    #[test]
    fn test_splice_preserves_surroundings() {
        let out = Fragment::SheetData
            .splice("sheet", SHEET, r#"<sheetData><row r="2"/></sheetData>"#)
            .unwrap();
        assert_eq!(out, SHEET.replace(r#"<row r="1"/>"#, r#"<row r="2"/>"#));
    }

    #[test]
    fn test_splice_requires_single_occurrence() {
        let twice = format!("{SHEET}{SHEET}");
        assert!(matches!(
            Fragment::SheetData.splice("sheet", &twice, "<sheetData/>"),
            Err(XlsxError::ReassemblyMismatch { found: 2, .. })
        ));
        assert!(matches!(
            Fragment::CalcPr.splice("wb", SHEET, "<calcPr/>"),
            Err(XlsxError::ReassemblyMismatch { found: 0, .. })
        ));
    }

    #[test]
    fn test_insert_after_closing() {
        let text = "<workbook><sheets><sheet/></sheets></workbook>";
        let out = insert_after_closing("wb", text, "sheets", "<calcPr/>").unwrap();
        assert_eq!(
            out.as_deref(),
            Some("<workbook><sheets><sheet/></sheets><calcPr/></workbook>")
        );
        assert_eq!(insert_after_closing("wb", text, "definedNames", "x").unwrap(), None);
    }

    #[test]
    fn test_remove_empty_elements() {
        let rels = concat!(
            r#"<Relationships><Relationship Id="rId1" Type="a/worksheet" Target="worksheets/sheet1.xml"/>"#,
            r#"<Relationship Id="rId9" Type="a/calcChain" Target="calcChain.xml"/></Relationships>"#
        );
        let (out, removed) = remove_empty_elements(rels, "Relationship", |e| {
            !e.attr("Type").is_some_and(|t| t.ends_with("/calcChain"))
        })
        .unwrap();
        assert_eq!(removed, 1);
        assert!(!out.contains("calcChain"));
        assert!(out.contains("rId1"));
    }
}
