//! Tip / commission report CSV
//!
//! Two layouts are accepted, selected by a header row that may appear
//! anywhere in the file:
//!
//! - simple: `NAME,COMMISSION`
//! - raw: `EMP L NAME,EMP F NAME,...` with the note in column 4, cash tips in
//!   column 6 and card tips in column 8
//!
//! Raw rows carry a free-text note naming the company the tip came from.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use payroll_sheets_core::{BilledCompany, CompanyAmounts};

use crate::error::CsvResult;
use crate::options::CsvReadOptions;
use crate::text::{collapse_spaces, parse_money};
use crate::totals::NamedTotals;

const NOTE_COLUMN: usize = 3;
const CASH_COLUMN: usize = 5;
const CARD_COLUMN: usize = 7;

/// Note keywords that mark an amount written into the note itself
const AMOUNT_NOTE_KEYWORDS: [&str; 5] = ["insu", "ins", "mat", "mats", "@"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Simple,
    Raw,
}

/// Tips per source name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TipReport {
    /// Total tips per source name
    pub totals: NamedTotals<f64>,
    /// Tips whose source company was identified, per source name
    pub by_source: NamedTotals<CompanyAmounts>,
    /// `"name | NOTE: text"` for every note naming no company, first-seen order
    pub ambiguous_notes: Vec<String>,
}

/// Reader for tip report CSV files
pub struct TipReader;

impl TipReader {
    /// Read a tip report file
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<TipReport> {
        let file = File::open(path)?;
        Self::read(file, options)
    }

    /// Read tip report data
    ///
    /// Rows before the first recognized header are ignored. A raw row whose
    /// note names no company still counts toward the person's total.
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<TipReport> {
        let mut csv_reader = options.reader(reader, false);
        let mut report = TipReport::default();
        let mut dialect = None;

        for result in csv_reader.records() {
            let record = result?;
            let field = |col: usize| record.get(col).unwrap_or("");

            let first = collapse_spaces(field(0).trim_start_matches('\u{feff}'));
            let second = collapse_spaces(field(1));

            match (first.to_uppercase().as_str(), second.to_uppercase().as_str()) {
                ("NAME", "COMMISSION") => {
                    dialect = Some(Dialect::Simple);
                    continue;
                }
                ("EMP L NAME", "EMP F NAME") => {
                    dialect = Some(Dialect::Raw);
                    continue;
                }
                _ => {}
            }

            match dialect {
                Some(Dialect::Simple) => {
                    if first.is_empty() {
                        continue;
                    }
                    let Some(amount) = parse_money(&second) else {
                        continue;
                    };
                    *report.totals.entry(&first) += amount;
                }
                Some(Dialect::Raw) => {
                    if first.is_empty() || second.is_empty() {
                        continue;
                    }
                    let name = collapse_spaces(&format!("{second} {first}"));
                    let note = collapse_spaces(field(NOTE_COLUMN));

                    let mut amount = parse_money(field(CASH_COLUMN)).unwrap_or(0.0)
                        + parse_money(field(CARD_COLUMN)).unwrap_or(0.0);
                    if amount.abs() < 1e-9 {
                        if let Some(inferred) = amount_from_note(&note) {
                            amount = inferred;
                        }
                    }
                    *report.totals.entry(&name) += amount;

                    match classify_tip_source(&note) {
                        Some(company) => report.by_source.entry(&name)[company] += amount,
                        None => {
                            let shown = if note.is_empty() { "<blank>" } else { note.as_str() };
                            let marker = format!("{name} | NOTE: {shown}");
                            if !report.ambiguous_notes.contains(&marker) {
                                log::warn!("tip note names no company: {}", marker);
                                report.ambiguous_notes.push(marker);
                            }
                        }
                    }
                }
                None => {}
            }
        }

        log::debug!(
            "read tips for {} names ({} ambiguous notes)",
            report.totals.len(),
            report.ambiguous_notes.len()
        );
        Ok(report)
    }
}

/// Company a tip note refers to
///
/// ```
/// use payroll_sheets_core::BilledCompany;
/// use payroll_sheets_csv::classify_tip_source;
///
/// assert_eq!(classify_tip_source("SC insu 15 mats"), Some(BilledCompany::Scanio));
/// assert_eq!(classify_tip_source("Long Island job"), Some(BilledCompany::FlatPrice));
/// assert_eq!(classify_tip_source("cash"), None);
/// ```
pub fn classify_tip_source(note: &str) -> Option<BilledCompany> {
    let text = collapse_spaces(note).to_lowercase();
    if text.is_empty() {
        return None;
    }

    if text.contains("long island") || text.contains("montia") {
        return Some(BilledCompany::FlatPrice);
    }

    for token in text.split(|c: char| !c.is_ascii_lowercase()) {
        match token {
            "sc" | "scanio" => return Some(BilledCompany::Scanio),
            "sa" => return Some(BilledCompany::SeaAndAir),
            "fp" => return Some(BilledCompany::FlatPrice),
            _ => {}
        }
    }

    if text.contains("sea") && text.contains("air") {
        Some(BilledCompany::SeaAndAir)
    } else if text.contains("flat") {
        Some(BilledCompany::FlatPrice)
    } else if text.contains("scanio") {
        Some(BilledCompany::Scanio)
    } else {
        None
    }
}

/// Sum of the amounts written into a note such as `"sc insu 15 mats @ 48.26"`
///
/// Only notes mentioning insurance, mats or `@` carry amounts. Numbers glued
/// to a preceding letter or digit are not amounts.
pub fn amount_from_note(note: &str) -> Option<f64> {
    let text = collapse_spaces(note).to_lowercase();
    if text.is_empty() || !AMOUNT_NOTE_KEYWORDS.iter().any(|k| text.contains(k)) {
        return None;
    }

    let values = note_amounts(&text);
    if values.is_empty() {
        return None;
    }
    let total: f64 = values.iter().sum();
    (total > 0.0).then_some(total)
}

/// Every `$?digits(.digits)?` run not preceded by an ASCII letter or digit
fn note_amounts(text: &str) -> Vec<f64> {
    let bytes = text.as_bytes();
    let mut values = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let free = i == 0 || !bytes[i - 1].is_ascii_alphanumeric();
        let start = if bytes[i] == b'$' { i + 1 } else { i };
        if !free || !bytes.get(start).is_some_and(u8::is_ascii_digit) {
            i += 1;
            continue;
        }

        let mut end = start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
            end += 1;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }

        if let Ok(value) = text[start..end].parse() {
            values.push(value);
        }
        i = end;
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read(text: &str) -> TipReport {
        TipReader::read(text.as_bytes(), &CsvReadOptions::default()).unwrap()
    }

    #[test]
    fn test_simple_dialect() {
        let report = read(concat!(
            "Tip Summary,,\n",
            "NAME,COMMISSION\n",
            "Maria Lopez,$45.50\n",
            "Jon Smith,12\n",
            "Maria Lopez,4.50\n",
            "Bad Row,n/a\n",
            ",10\n",
        ));
        assert_eq!(report.totals.get("Maria Lopez"), Some(&50.0));
        assert_eq!(report.totals.get("Jon Smith"), Some(&12.0));
        assert_eq!(report.totals.get("Bad Row"), None);
        assert!(report.by_source.is_empty());
    }

    #[test]
    fn test_raw_dialect() {
        let report = read(concat!(
            "EMP L NAME,EMP F NAME,DATE,NOTE,X,CASH,Y,CARD\n",
            "Lopez,Maria,1/2,SC move,,20.00,,5.00\n",
            "Lopez,Maria,1/3,sa storage,,,,10\n",
            "Smith,Jon,1/3,sc insu 15 mats @ 48.26,,0,,0\n",
            "Smith,Jon,1/4,cash job,,7,,\n",
            "Smith,Jon,1/5,cash job,,3,,\n",
            "Doe,,1/5,sc,,3,,\n",
        ));

        assert_eq!(report.totals.names().collect::<Vec<_>>(), vec!["Maria Lopez", "Jon Smith"]);
        assert_eq!(report.totals.get("Maria Lopez"), Some(&35.0));

        let maria = report.by_source.get("Maria Lopez").unwrap();
        assert_eq!(maria[BilledCompany::Scanio], 25.0);
        assert_eq!(maria[BilledCompany::SeaAndAir], 10.0);

        let jon_total = *report.totals.get("Jon Smith").unwrap();
        assert!((jon_total - (63.26 + 10.0)).abs() < 1e-9);
        let jon = report.by_source.get("Jon Smith").unwrap();
        assert!((jon[BilledCompany::Scanio] - 63.26).abs() < 1e-9);

        assert_eq!(report.ambiguous_notes, vec!["Jon Smith | NOTE: cash job"]);
    }

    #[test]
    fn test_classify_tip_source() {
        assert_eq!(classify_tip_source("Montia Residence"), Some(BilledCompany::FlatPrice));
        assert_eq!(classify_tip_source("FP-12"), Some(BilledCompany::FlatPrice));
        assert_eq!(classify_tip_source("sea & air pickup"), Some(BilledCompany::SeaAndAir));
        assert_eq!(classify_tip_source("scanio2"), Some(BilledCompany::Scanio));
        assert_eq!(classify_tip_source("flatbed"), Some(BilledCompany::FlatPrice));
        assert_eq!(classify_tip_source("safe"), None);
        assert_eq!(classify_tip_source(""), None);
    }

    #[test]
    fn test_amount_from_note() {
        assert_eq!(amount_from_note("insu $25"), Some(25.0));
        assert_eq!(amount_from_note("mats 2 @ 10.5"), Some(12.5));
        assert_eq!(amount_from_note("a15 mats"), None);
        assert_eq!(amount_from_note("tip 20"), None);
        assert_eq!(amount_from_note("insu 0"), None);
    }
}
