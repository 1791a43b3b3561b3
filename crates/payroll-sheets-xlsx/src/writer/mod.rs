//! Reassembling the archive

use std::io::{Cursor, Seek, Write};

use crate::document::Document;
use crate::error::{XlsxError, XlsxResult};
use crate::fragment::{insert_after_closing, remove_empty_elements, Fragment};
use crate::reader::{CONTENT_TYPES, WORKBOOK, WORKBOOK_RELS};
use crate::xml::{name_prefix, XmlElement};

/// Workbook children that precede `calcPr`, last one first
const CALC_PR_PREDECESSORS: [&str; 4] = ["definedNames", "externalReferences", "functionGroups", "sheets"];

/// Parts rewritten on save, keyed by part name
struct Rewrites {
    parts: Vec<(String, String)>,
    dropped: Option<String>,
}

impl Rewrites {
    fn get(&self, name: &str) -> Option<&str> {
        self.parts
            .iter()
            .find(|(part, _)| part == name)
            .map(|(_, text)| text.as_str())
    }
}

impl Document {
    /// Serialize the patched archive
    pub fn to_bytes(&self) -> XlsxResult<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.write(&mut buffer)?;
        Ok(buffer.into_inner())
    }

    /// Write the patched archive
    ///
    /// The worksheet and workbook parts get their rewritten fragments
    /// spliced in; the calculation chain is dropped together with its
    /// relationship and content-type entries; every other part is copied
    /// without recompression.
    pub fn write<W: Write + Seek>(&self, writer: W) -> XlsxResult<()> {
        let rewrites = self.rewrites()?;

        let mut source = zip::ZipArchive::new(Cursor::new(self.archive.as_slice()))?;
        let mut zip = zip::ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for index in 0..source.len() {
            let file = source.by_index_raw(index)?;
            let name = file.name().to_string();

            if rewrites.dropped.as_deref() == Some(name.as_str()) {
                log::debug!("dropping {}", name);
                continue;
            }

            match rewrites.get(&name) {
                Some(text) => {
                    drop(file);
                    zip.start_file(name.as_str(), options)?;
                    zip.write_all(text.as_bytes())?;
                }
                None => zip.raw_copy_file(file)?,
            }
        }

        zip.finish()?;
        Ok(())
    }

    fn rewrites(&self) -> XlsxResult<Rewrites> {
        let mut parts = vec![(self.worksheet.path.clone(), self.worksheet.to_xml()?)];

        if self.full_recalculation {
            parts.push((WORKBOOK.to_string(), self.workbook_with_full_recalculation()?));
        }

        let mut dropped = None;
        if let Some(chain) = &self.calc_chain {
            let part_name = format!("/{}", chain.path);
            let (content_types, removed) =
                remove_empty_elements(&self.content_types, "Override", |e| {
                    e.attr("PartName") != Some(part_name.as_str())
                })?;
            if removed > 0 {
                parts.push((CONTENT_TYPES.to_string(), content_types));
            }

            if let Some(rels) = &self.workbook_rels {
                let (rels, removed) = remove_empty_elements(rels, "Relationship", |e| {
                    !e.attr("Type").is_some_and(|t| t.ends_with("/calcChain"))
                })?;
                if removed > 0 {
                    parts.push((WORKBOOK_RELS.to_string(), rels));
                }
            }

            log::warn!("removing stale calculation chain {}", chain.path);
            dropped = Some(chain.path.clone());
        }

        Ok(Rewrites { parts, dropped })
    }

    /// The workbook part with `calcPr` set to recalculate everything on load
    fn workbook_with_full_recalculation(&self) -> XlsxResult<String> {
        let text = &self.workbook_xml;

        let mut calc_pr = match &self.calc_pr {
            Some(existing) => existing.clone(),
            None => XmlElement::new(format!("{}calcPr", workbook_prefix(text))),
        };
        calc_pr.set_attr("fullCalcOnLoad", "1");
        calc_pr.set_attr("forceFullCalc", "1");
        calc_pr.set_attr("calcMode", "auto");
        let fragment = calc_pr.to_xml();

        if self.calc_pr.is_some() {
            return Fragment::CalcPr.splice(WORKBOOK, text, &fragment);
        }

        for local in CALC_PR_PREDECESSORS {
            if let Some(out) = insert_after_closing(WORKBOOK, text, local, &fragment)? {
                return Ok(out);
            }
        }
        Err(XlsxError::ReassemblyMismatch {
            part: WORKBOOK.to_string(),
            fragment: "/sheets".to_string(),
            found: 0,
        })
    }
}

/// Prefix of the workbook's `sheets` element (`""` for the default namespace)
fn workbook_prefix(text: &str) -> &str {
    lazy_regex::regex!(r"<((?:\w+:)?)sheets\b")
        .captures(text)
        .and_then(|caps| caps.get(0))
        .map_or("", |m| name_prefix(&m.as_str()[1..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_workbook_prefix() {
        assert_eq!(workbook_prefix("<workbook><sheets>"), "");
        assert_eq!(workbook_prefix("<x:workbook><x:sheets>"), "x:");
    }
}
