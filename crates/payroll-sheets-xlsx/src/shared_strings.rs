//! Shared string table (`xl/sharedStrings.xml`)

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::XlsxResult;

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// - `_x000d_` = CR
/// - `_x000a_` = LF
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// Read-only string table referenced by `t="s"` cells
///
/// Writes never add to it; new text always goes inline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedStrings {
    strings: Vec<String>,
}

impl SharedStrings {
    /// Empty table (workbook without a shared string part)
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the shared string part
    ///
    /// Rich-text runs are concatenated; phonetic runs (`rPh`) are skipped.
    pub fn parse(xml: &str) -> XlsxResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut strings = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut phonetic_depth = 0usize;

        loop {
            match reader.read_event()? {
                Event::Start(e) => match e.name().local_name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" => phonetic_depth += 1,
                    b"t" if in_si && phonetic_depth == 0 => in_t = true,
                    _ => {}
                },
                Event::Empty(e) => {
                    // <si/> is an empty string but still takes an index
                    if e.name().local_name().as_ref() == b"si" {
                        strings.push(String::new());
                    }
                }
                Event::End(e) => match e.name().local_name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current));
                        current.clear();
                        in_si = false;
                    }
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    b"t" => in_t = false,
                    _ => {}
                },
                Event::Text(t) if in_t => current.push_str(&t.unescape()?),
                Event::CData(c) if in_t => current.push_str(&String::from_utf8_lossy(&c)),
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self { strings })
    }

    /// String at `index`
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_excel_escapes() {
        assert_eq!(decode_excel_escapes("Line1_x000d_Line2"), "Line1\rLine2");
        assert_eq!(decode_excel_escapes("A_x0009_B_x000a_C"), "A\tB\nC");
        assert_eq!(decode_excel_escapes("_x005f_x0041_"), "_x0041_");
        assert_eq!(decode_excel_escapes("Hello World"), "Hello World");
        assert_eq!(decode_excel_escapes("_x00_"), "_x00_");
        assert_eq!(decode_excel_escapes("tail_x"), "tail_x");
    }

    #[test]
    fn test_parse_table() {
        let xml = concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4">"#,
            r#"<si><t>SCANIO MOVING</t></si>"#,
            r#"<si><r><t>Maria </t></r><r><t>Lopez</t></r></si>"#,
            r#"<si/>"#,
            r#"<si><t>Ana &amp; Co</t><rPh sb="0" eb="1"><t>ana</t></rPh></si>"#,
            r#"</sst>"#
        );
        let table = SharedStrings::parse(xml).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(0), Some("SCANIO MOVING"));
        assert_eq!(table.get(1), Some("Maria Lopez"));
        assert_eq!(table.get(2), Some(""));
        assert_eq!(table.get(3), Some("Ana & Co"));
        assert_eq!(table.get(4), None);
    }

    #[test]
    fn test_prefixed_table() {
        let xml = r#"<x:sst xmlns:x="urn:x"><x:si><x:t>Total</x:t></x:si></x:sst>"#;
        let table = SharedStrings::parse(xml).unwrap();
        assert_eq!(table.get(0), Some("Total"));
    }
}
