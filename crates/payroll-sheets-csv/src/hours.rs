//! Simplified hours CSV (`Name,Company,Hours at Company`)

use std::fs::File;
use std::io::Read;
use std::path::Path;

use payroll_sheets_core::{BilledCompany, CompanyAmounts};

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;
use crate::text::{collapse_spaces, parse_hours};
use crate::totals::NamedTotals;

/// Required header names
pub const HOURS_COLUMNS: [&str; 3] = ["Name", "Company", "Hours at Company"];

/// Hours per source name and billed company
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoursReport {
    /// Hours keyed by source name
    pub totals: NamedTotals<CompanyAmounts>,
    /// Company labels that matched no billed company, first-seen order
    pub unknown_companies: Vec<String>,
}

/// Reader for the simplified hours CSV
pub struct HoursReader;

impl HoursReader {
    /// Read an hours CSV file
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<HoursReport> {
        let file = File::open(path)?;
        Self::read(file, options)
    }

    /// Read hours CSV data
    ///
    /// Rows with a blank name are skipped. Rows whose company cannot be
    /// classified contribute no hours; their label is reported once.
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<HoursReport> {
        let mut csv_reader = options.reader(reader, true);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let position = |name: &str| headers.iter().position(|h| h == name);

        let mut missing: Vec<String> = HOURS_COLUMNS
            .iter()
            .filter(|name| position(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(CsvError::MissingColumns(missing));
        }
        let [name_col, company_col, hours_col] = HOURS_COLUMNS.map(|name| position(name).unwrap_or(0));

        let mut report = HoursReport::default();

        for (index, result) in csv_reader.records().enumerate() {
            let record = result?;
            let field = |col: usize| record.get(col).unwrap_or("");

            let name = collapse_spaces(field(name_col));
            if name.is_empty() {
                continue;
            }

            let Some(company) = BilledCompany::classify(field(company_col)) else {
                let label = collapse_spaces(field(company_col));
                if !label.is_empty() && !report.unknown_companies.contains(&label) {
                    log::warn!("unknown company {:?} for {}", label, name);
                    report.unknown_companies.push(label);
                }
                continue;
            };

            let hours = parse_hours(field(hours_col)).ok_or_else(|| CsvError::Parse {
                row: index + 2,
                column: hours_col + 1,
                message: format!("invalid hours {:?}", field(hours_col)),
            })?;

            report.totals.entry(&name)[company] += hours;
        }

        log::debug!(
            "read hours for {} names ({} unknown companies)",
            report.totals.len(),
            report.unknown_companies.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read(text: &str) -> CsvResult<HoursReport> {
        HoursReader::read(text.as_bytes(), &CsvReadOptions::default())
    }

    #[test]
    fn test_read_hours() {
        let report = read(concat!(
            "\u{feff}Name,Company,Hours at Company\n",
            "Maria Lopez,SCANIO,10:00\n",
            "Maria  Lopez,Sea and Air,2:30\n",
            "Jon Smith,Flat Price Movers,7.5\n",
            "Jon Smith,Office,3:00\n",
            "Jon Smith,office,1:00\n",
            ",SCANIO,4:00\n",
            "Maria Lopez,Scanio Storage,-0:30\n",
        ))
        .unwrap();

        assert_eq!(report.totals.names().collect::<Vec<_>>(), vec!["Maria Lopez", "Jon Smith"]);
        let maria = report.totals.get("Maria Lopez").unwrap();
        assert_eq!(maria[BilledCompany::Scanio], 9.5);
        assert_eq!(maria[BilledCompany::SeaAndAir], 2.5);
        let jon = report.totals.get("Jon Smith").unwrap();
        assert_eq!(jon[BilledCompany::FlatPrice], 7.5);
        assert_eq!(jon.total(), 7.5);
        assert_eq!(report.unknown_companies, vec!["Office", "office"]);
    }

    #[test]
    fn test_missing_columns() {
        let err = read("Name,Hours\nA,1\n").unwrap_err();
        match err {
            CsvError::MissingColumns(columns) => {
                assert_eq!(columns, vec!["Company", "Hours at Company"])
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_invalid_hours() {
        let err = read("Name,Company,Hours at Company\nA,SCANIO,x\n").unwrap_err();
        assert!(matches!(err, CsvError::Parse { row: 2, column: 3, .. }));
    }
}
