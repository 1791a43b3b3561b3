//! End-to-end tests for in-place patching (open -> mutate -> write -> reopen)

use std::io::{Cursor, Read, Write};

use payroll_sheets_xlsx::{Document, FormulaResult, XlsxError};
use pretty_assertions::assert_eq;

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
    r#"<Override PartName="/xl/calcChain.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.calcChain+xml"/>"#,
    r#"</Types>"#
);

const WORKBOOK_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
    r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain" Target="calcChain.xml"/>"#,
    r#"</Relationships>"#
);

const SHARED_STRINGS: &str = concat!(
    r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<si><t>SCANIO MOVING</t></si><si><t>Maria Lopez</t></si>"#,
    r#"</sst>"#
);

const WORKSHEET: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:x14ac="http://schemas.microsoft.com/office/spreadsheetml/2009/9/ac">"#,
    r#"<dimension ref="A1:Q12"/>"#,
    r#"<sheetData>"#,
    r#"<row r="4"><c r="B4" t="s"><v>0</v></c></row>"#,
    r#"<row r="5" x14ac:dyDescent="0.25"><c r="B5" t="s"><v>1</v></c><c r="C5"><v>22</v></c>"#,
    r#"<c r="D5"><f>SUM(K5:O5)</f><v>0</v></c></row>"#,
    r#"<row r="6" hidden="1"><c r="D6"><f>SUM(K6:O6)</f><v>0</v></c></row>"#,
    r#"<row r="7"><c r="D7"><f>SUM(D5:D6)*$C$1</f><v>0</v></c></row>"#,
    r#"</sheetData>"#,
    r#"<mergeCells count="1"><mergeCell ref="B7:C7"/></mergeCells>"#,
    r#"<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>"#,
    r#"</worksheet>"#
);

const STYLES: &str = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font/></fonts></styleSheet>"#;

fn workbook_xml(extra: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<sheets><sheet name="Payroll" sheetId="1" r:id="rId1"/></sheets>{}</workbook>"#
        ),
        extra
    )
}

fn build_archive(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    let mut zip = zip::ZipWriter::new(&mut buf);
    let options = zip::write::SimpleFileOptions::default();
    for (name, text) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(text.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    buf.into_inner()
}

fn template(workbook_extra: &str) -> Vec<u8> {
    let workbook = workbook_xml(workbook_extra);
    build_archive(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("xl/workbook.xml", &workbook),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/worksheets/sheet1.xml", WORKSHEET),
        ("xl/sharedStrings.xml", SHARED_STRINGS),
        ("xl/styles.xml", STYLES),
        ("xl/calcChain.xml", r#"<calcChain><c r="D5" i="1"/></calcChain>"#),
    ])
}

fn read_part(archive: &[u8], name: &str) -> Option<String> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    let mut file = zip.by_name(name).ok()?;
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    Some(text)
}

fn part_names(archive: &[u8]) -> Vec<String> {
    let zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    zip.file_names().map(str::to_string).collect()
}

/// Reading cells through the shared string table
#[test]
fn test_open_reads_cells() {
    let doc = Document::open(template("")).unwrap();
    assert_eq!(doc.sheet_name(), "Payroll");
    assert_eq!(doc.sheet_names().unwrap(), vec!["Payroll".to_string()]);
    assert_eq!(doc.cell_text(4, "B").as_deref(), Some("SCANIO MOVING"));
    assert_eq!(doc.cell_text(5, "B").as_deref(), Some("Maria Lopez"));
    assert_eq!(doc.cell_number(5, "C"), Some(22.0));
    assert_eq!(doc.formula(5, "D").as_deref(), Some("SUM(K5:O5)"));
    assert_eq!(doc.cell_number(5, "D"), None);
    assert!(doc.has_calc_chain());
}

/// An untouched document keeps its worksheet text and unrelated parts
#[test]
fn test_unchanged_write_preserves_parts() {
    let mut doc = Document::open(template("")).unwrap();
    doc.shift_rows_from(6, 0).unwrap();
    let out = doc.to_bytes().unwrap();

    assert_eq!(read_part(&out, "xl/worksheets/sheet1.xml").unwrap(), WORKSHEET);
    assert_eq!(read_part(&out, "xl/styles.xml").unwrap(), STYLES);
    assert_eq!(read_part(&out, "xl/sharedStrings.xml").unwrap(), SHARED_STRINGS);
    assert_eq!(read_part(&out, "xl/workbook.xml").unwrap(), workbook_xml(""));
}

/// The calculation chain goes away together with its references
#[test]
fn test_calc_chain_removed() {
    let doc = Document::open(template("")).unwrap();
    let out = doc.to_bytes().unwrap();

    let names = part_names(&out);
    assert!(!names.iter().any(|n| n == "xl/calcChain.xml"));
    assert_eq!(names.len(), 6);

    let rels = read_part(&out, "xl/_rels/workbook.xml.rels").unwrap();
    assert!(!rels.contains("calcChain"));
    assert!(rels.contains("rId2"));

    let content_types = read_part(&out, "[Content_Types].xml").unwrap();
    assert!(!content_types.contains("calcChain"));
    assert!(content_types.contains("/xl/worksheets/sheet1.xml"));
}

/// calcPr is inserted after the sheets list when missing
#[test]
fn test_full_recalculation_inserts_calc_pr() {
    let mut doc = Document::open(template("")).unwrap();
    doc.mark_full_recalculation();
    let out = doc.to_bytes().unwrap();
    assert_eq!(
        read_part(&out, "xl/workbook.xml").unwrap(),
        workbook_xml(r#"<calcPr fullCalcOnLoad="1" forceFullCalc="1" calcMode="auto"/>"#)
    );
}

/// calcPr goes after definedNames when present
#[test]
fn test_full_recalculation_after_defined_names() {
    let names = r#"<definedNames><definedName name="_xlnm.Print_Area" localSheetId="0">Payroll!$A$1:$Q$12</definedName></definedNames>"#;
    let mut doc = Document::open(template(names)).unwrap();
    doc.mark_full_recalculation();
    let out = doc.to_bytes().unwrap();
    assert_eq!(
        read_part(&out, "xl/workbook.xml").unwrap(),
        workbook_xml(&format!(
            r#"{names}<calcPr fullCalcOnLoad="1" forceFullCalc="1" calcMode="auto"/>"#
        ))
    );
}

/// Without definedNames, calcPr still follows externalReferences
#[test]
fn test_full_recalculation_after_external_references() {
    let extra = r#"<functionGroups builtInGroupCount="16"/><externalReferences><externalReference r:id="rId9"/></externalReferences><oleSize ref="A1:B2"/>"#;
    let mut doc = Document::open(template(extra)).unwrap();
    doc.mark_full_recalculation();
    let out = doc.to_bytes().unwrap();
    assert_eq!(
        read_part(&out, "xl/workbook.xml").unwrap(),
        workbook_xml(concat!(
            r#"<functionGroups builtInGroupCount="16"/><externalReferences><externalReference r:id="rId9"/></externalReferences>"#,
            r#"<calcPr fullCalcOnLoad="1" forceFullCalc="1" calcMode="auto"/><oleSize ref="A1:B2"/>"#
        ))
    );
}

/// An existing calcPr keeps its attributes and gains the recalculation flags
#[test]
fn test_full_recalculation_updates_calc_pr() {
    let mut doc = Document::open(template(r#"<calcPr calcId="191029" calcMode="manual"/>"#)).unwrap();
    doc.mark_full_recalculation();
    let out = doc.to_bytes().unwrap();
    assert_eq!(
        read_part(&out, "xl/workbook.xml").unwrap(),
        workbook_xml(
            r#"<calcPr calcId="191029" calcMode="auto" fullCalcOnLoad="1" forceFullCalc="1"/>"#
        )
    );
}

/// Inserting and cloning rows, then writing values, survives a reopen
#[test]
fn test_insert_clone_and_reopen() {
    let mut doc = Document::open(template("")).unwrap();
    doc.shift_rows_from(6, 2).unwrap();
    doc.clone_template_row(5, 6).unwrap();
    doc.clone_template_row(5, 7).unwrap();
    doc.set_inline_text(6, "B", "Jon Smith").unwrap();
    doc.set_numeric_cell(6, "C", 19.5).unwrap();
    doc.set_inline_text(7, "B", "Ana & Co").unwrap();
    doc.set_formula(9, "D", "SUM(D5:D8)*$C$1", FormulaResult::Number).unwrap();
    assert_eq!(doc.reveal_hidden_rows(), 1);

    let out = doc.to_bytes().unwrap();
    let sheet = read_part(&out, "xl/worksheets/sheet1.xml").unwrap();
    assert!(sheet.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#));
    assert!(sheet.contains(r#"<dimension ref="A1:Q14"/>"#));
    assert!(sheet.contains(r#"<mergeCell ref="B9:C9"/>"#));
    assert!(sheet.contains(r#"<row r="6" x14ac:dyDescent="0.25">"#));
    assert!(!sheet.contains("hidden"));

    let reopened = Document::open(out).unwrap();
    assert_eq!(reopened.cell_text(6, "B").as_deref(), Some("Jon Smith"));
    assert_eq!(reopened.cell_text(7, "B").as_deref(), Some("Ana & Co"));
    assert_eq!(reopened.cell_number(6, "C"), Some(19.5));
    assert_eq!(reopened.formula(6, "D").as_deref(), Some("SUM(K6:O6)"));
    assert_eq!(reopened.formula(7, "D").as_deref(), Some("SUM(K7:O7)"));
    assert_eq!(reopened.formula(8, "D").as_deref(), Some("SUM(K8:O8)"));
    assert_eq!(reopened.formula(9, "D").as_deref(), Some("SUM(D5:D8)*$C$1"));
    assert!(!reopened.has_calc_chain());
}

/// Required parts and named sheets
#[test]
fn test_open_errors() {
    let missing_workbook = build_archive(&[("[Content_Types].xml", CONTENT_TYPES)]);
    assert!(matches!(
        Document::open(missing_workbook),
        Err(XlsxError::CorruptArchive(_))
    ));

    assert!(matches!(
        Document::open_with_sheet(template(""), Some("Summary")),
        Err(XlsxError::SheetNotFound(_))
    ));

    assert!(matches!(
        Document::open(b"not a zip".to_vec()),
        Err(XlsxError::Zip(_))
    ));
}

/// Without relationships the first worksheet part is used and shared strings are optional
#[test]
fn test_fallback_worksheet_path() {
    let workbook = workbook_xml("");
    let archive = build_archive(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("xl/workbook.xml", &workbook),
        ("xl/worksheets/sheet1.xml", WORKSHEET),
    ]);
    let doc = Document::open(archive).unwrap();
    assert_eq!(doc.cell_text(4, "B"), None);
    assert_eq!(doc.cell_number(5, "C"), Some(22.0));
    assert!(doc.shared_strings().is_empty());
}
