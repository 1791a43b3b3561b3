//! Opening a workbook archive

use std::fs;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::document::{CalcChain, Document};
use crate::error::{XlsxError, XlsxResult};
use crate::fragment::Fragment;
use crate::shared_strings::SharedStrings;
use crate::worksheet::Worksheet;

pub(crate) const CONTENT_TYPES: &str = "[Content_Types].xml";
pub(crate) const WORKBOOK: &str = "xl/workbook.xml";
pub(crate) const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const DEFAULT_WORKSHEET: &str = "xl/worksheets/sheet1.xml";
const DEFAULT_SHARED_STRINGS: &str = "xl/sharedStrings.xml";
const DEFAULT_CALC_CHAIN: &str = "xl/calcChain.xml";

/// `<sheet>` entry of the workbook part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub relationship_id: String,
}

/// `<Relationship>` entry of a relationship part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Part name resolved against `xl/`
    pub target: String,
}

impl Relationship {
    fn is(&self, kind: &str) -> bool {
        self.rel_type
            .rsplit_once('/')
            .is_some_and(|(_, suffix)| suffix == kind)
    }
}

impl Document {
    /// Open an archive, loading its first worksheet
    pub fn open(archive: Vec<u8>) -> XlsxResult<Self> {
        Self::open_with_sheet(archive, None)
    }

    /// Open an archive file, loading the named (or first) worksheet
    pub fn open_file<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> XlsxResult<Self> {
        let bytes = fs::read(path)?;
        Self::open_with_sheet(bytes, sheet)
    }

    /// Open an archive, loading the named worksheet or the first one
    pub fn open_with_sheet(archive: Vec<u8>, sheet: Option<&str>) -> XlsxResult<Self> {
        let mut zip = zip::ZipArchive::new(Cursor::new(archive.as_slice()))?;

        let content_types = read_part(&mut zip, CONTENT_TYPES)?
            .ok_or_else(|| XlsxError::CorruptArchive(format!("missing {CONTENT_TYPES}")))?;
        let workbook_xml = read_part(&mut zip, WORKBOOK)?
            .ok_or_else(|| XlsxError::CorruptArchive(format!("missing {WORKBOOK}")))?;
        let workbook_rels = read_part(&mut zip, WORKBOOK_RELS)?;

        let sheets = read_workbook_sheets(&workbook_xml)?;
        let relationships = match &workbook_rels {
            Some(xml) => read_relationships(xml)?,
            None => Vec::new(),
        };

        let entry = match sheet {
            Some(name) => Some(
                sheets
                    .iter()
                    .find(|s| s.name == name)
                    .ok_or_else(|| XlsxError::SheetNotFound(name.to_string()))?,
            ),
            None => sheets.first(),
        };
        let sheet_name = entry.map_or_else(|| "Sheet1".to_string(), |e| e.name.clone());
        let worksheet_path = entry
            .and_then(|e| relationships.iter().find(|r| r.id == e.relationship_id))
            .map_or_else(|| DEFAULT_WORKSHEET.to_string(), |r| r.target.clone());

        let worksheet_xml = read_part(&mut zip, &worksheet_path)?
            .ok_or_else(|| XlsxError::CorruptArchive(format!("missing {worksheet_path}")))?;
        let worksheet = Worksheet::parse(&worksheet_path, worksheet_xml)?;

        let shared_strings_path = relationships
            .iter()
            .find(|r| r.is("sharedStrings"))
            .map_or(DEFAULT_SHARED_STRINGS, |r| r.target.as_str());
        let shared_strings = match read_part(&mut zip, shared_strings_path)? {
            Some(xml) => SharedStrings::parse(&xml)?,
            None => SharedStrings::new(),
        };

        let calc_chain_path = relationships
            .iter()
            .find(|r| r.is("calcChain"))
            .map_or(DEFAULT_CALC_CHAIN, |r| r.target.as_str());
        let calc_chain = zip
            .index_for_name(calc_chain_path)
            .map(|_| CalcChain {
                path: calc_chain_path.to_string(),
            });

        let calc_pr = Fragment::CalcPr.parse(WORKBOOK, &workbook_xml)?;

        log::debug!(
            "opened worksheet {:?} at {} ({} shared strings, calc chain: {})",
            sheet_name,
            worksheet_path,
            shared_strings.len(),
            calc_chain.is_some()
        );

        drop(zip);
        Ok(Self {
            archive,
            sheet_name,
            worksheet,
            shared_strings,
            workbook_xml,
            workbook_rels,
            content_types,
            calc_pr,
            calc_chain,
            full_recalculation: false,
        })
    }

    /// Names of every worksheet in the workbook
    pub fn sheet_names(&self) -> XlsxResult<Vec<String>> {
        Ok(read_workbook_sheets(&self.workbook_xml)?
            .into_iter()
            .map(|s| s.name)
            .collect())
    }
}

/// Read a part as UTF-8 text, `None` when the archive does not have it
fn read_part<R: Read + Seek>(
    zip: &mut zip::ZipArchive<R>,
    name: &str,
) -> XlsxResult<Option<String>> {
    let mut file = match zip.by_name(name) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|_| XlsxError::CorruptArchive(format!("{name} is not UTF-8")))
}

/// Read `<sheet name r:id>` entries from the workbook part
pub fn read_workbook_sheets(xml: &str) -> XlsxResult<Vec<SheetEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut sheets = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Empty(e) | Event::Start(e) if e.name().local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut relationship_id = None;

                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"name" {
                        name = attr.unescape_value().ok().map(|s| s.to_string());
                    } else if attr.key.local_name().as_ref() == b"id" && attr.key.prefix().is_some()
                    {
                        relationship_id = attr.unescape_value().ok().map(|s| s.to_string());
                    }
                }

                if let (Some(name), Some(relationship_id)) = (name, relationship_id) {
                    sheets.push(SheetEntry {
                        name,
                        relationship_id,
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheets)
}

/// Read the workbook relationship part
pub fn read_relationships(xml: &str) -> XlsxResult<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut rels = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Empty(e) | Event::Start(e)
                if e.name().local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                let mut rel_type = None;

                for attr in e.attributes().flatten() {
                    let value = attr.unescape_value().ok().map(|s| s.to_string());
                    match attr.key.as_ref() {
                        b"Id" => id = value,
                        b"Target" => target = value,
                        b"Type" => rel_type = value,
                        _ => {}
                    }
                }

                if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                    rels.push(Relationship {
                        id,
                        rel_type,
                        target: resolve_target(&target),
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rels)
}

/// Resolve a relationship target against the `xl/` folder
fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = vec!["xl"];
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_workbook_sheets() {
        let xml = concat!(
            r#"<workbook xmlns="urn:main" xmlns:r="urn:rel"><sheets>"#,
            r#"<sheet name="Payroll" sheetId="1" r:id="rId1"/>"#,
            r#"<sheet name="Notes" sheetId="2" r:id="rId2"/>"#,
            r#"</sheets></workbook>"#
        );
        let sheets = read_workbook_sheets(xml).unwrap();
        assert_eq!(
            sheets,
            vec![
                SheetEntry {
                    name: "Payroll".into(),
                    relationship_id: "rId1".into()
                },
                SheetEntry {
                    name: "Notes".into(),
                    relationship_id: "rId2".into()
                },
            ]
        );
    }

    #[test]
    fn test_read_relationships() {
        let xml = concat!(
            r#"<Relationships xmlns="urn:pkg">"#,
            r#"<Relationship Id="rId1" Type="http://x/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
            r#"<Relationship Id="rId2" Type="http://x/relationships/calcChain" Target="/xl/calcChain.xml"/>"#,
            r#"</Relationships>"#
        );
        let rels = read_relationships(xml).unwrap();
        assert_eq!(rels[0].target, "xl/worksheets/sheet1.xml");
        assert_eq!(rels[1].target, "xl/calcChain.xml");
        assert!(rels[1].is("calcChain"));
        assert!(!rels[0].is("calcChain"));
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
        assert_eq!(resolve_target("./sharedStrings.xml"), "xl/sharedStrings.xml");
        assert_eq!(resolve_target("../customXml/item1.xml"), "customXml/item1.xml");
    }
}
