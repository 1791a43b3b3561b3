//! CSV writers for flattened hours and tip summaries

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::CsvResult;
use crate::hours::HOURS_COLUMNS;
use crate::options::{CsvWriteOptions, LineTerminator};
use crate::text::format_minutes;
use crate::timecard::TimecardTotals;

/// Header of the tip summary
pub const TIP_SUMMARY_COLUMNS: [&str; 2] = ["Name", "Commission"];

/// CSV file writer
pub struct CsvWriter;

impl CsvWriter {
    fn builder<W: Write>(writer: W, options: &CsvWriteOptions) -> csv::Writer<W> {
        let terminator = match options.line_terminator {
            LineTerminator::LF => csv::Terminator::Any(b'\n'),
            LineTerminator::CRLF => csv::Terminator::CRLF,
        };

        csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .terminator(terminator)
            .flexible(true)
            .from_writer(writer)
    }

    /// Write a header and rows of text fields to a file
    pub fn write_records_file<P: AsRef<Path>>(
        header: &[&str],
        rows: &[Vec<String>],
        path: P,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let file = File::create(path)?;
        Self::write_records(header, rows, file, options)
    }

    /// Write a header and rows of text fields
    ///
    /// Rows may differ in length from the header and from each other.
    pub fn write_records<W: Write>(
        header: &[&str],
        rows: &[Vec<String>],
        writer: W,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let mut csv_writer = Self::builder(writer, options);
        csv_writer.write_record(header)?;
        for row in rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write a flattened timecard as `Name,Company,Hours at Company`
    pub fn write_hours_file<P: AsRef<Path>>(
        totals: &TimecardTotals,
        path: P,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let file = File::create(path)?;
        Self::write_hours(totals, file, options)
    }

    /// Write a flattened timecard to a writer, hours as `h:mm`
    pub fn write_hours<W: Write>(
        totals: &TimecardTotals,
        writer: W,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let mut csv_writer = Self::builder(writer, options);
        csv_writer.write_record(HOURS_COLUMNS)?;

        for line in totals.lines() {
            csv_writer.write_record([
                line.name.as_str(),
                line.department.as_str(),
                format_minutes(line.minutes).as_str(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Write a tip summary file
    pub fn write_tip_summary_file<P: AsRef<Path>>(
        entries: &[(String, f64)],
        path: P,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let file = File::create(path)?;
        Self::write_tip_summary(entries, file, options)
    }

    /// Write `Name,Commission` rows in the given order, amounts to the cent
    pub fn write_tip_summary<W: Write>(
        entries: &[(String, f64)],
        writer: W,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let mut csv_writer = Self::builder(writer, options);
        csv_writer.write_record(TIP_SUMMARY_COLUMNS)?;

        for (name, amount) in entries {
            csv_writer.write_record([name.as_str(), format!("{amount:.2}").as_str()])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_hours() {
        let mut totals = TimecardTotals::default();
        totals.add("Maria Lopez", "SCANIO", 485);
        totals.add("Lopez, Maria", "SEA AND AIR", -30);

        let mut out = Vec::new();
        let options = CsvWriteOptions {
            line_terminator: LineTerminator::LF,
            ..Default::default()
        };
        CsvWriter::write_hours(&totals, &mut out, &options).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Name,Company,Hours at Company\nMaria Lopez,SCANIO,8:05\n\"Lopez, Maria\",SEA AND AIR,-0:30\n"
        );
    }

    #[test]
    fn test_write_tip_summary_crlf() {
        let entries = vec![("Jon Smith".to_string(), 12.0), ("Maria Lopez".to_string(), 45.555)];
        let mut out = Vec::new();
        CsvWriter::write_tip_summary(&entries, &mut out, &CsvWriteOptions::default()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Name,Commission\r\nJon Smith,12.00\r\n"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_write_records_of_mixed_width() {
        let rows = vec![
            vec!["Flat Price".to_string(), "2".to_string(), "12.5".to_string()],
            vec!["Reimbursement Balances".to_string(), "Amount".to_string()],
        ];
        let mut out = Vec::new();
        let options = CsvWriteOptions {
            line_terminator: LineTerminator::LF,
            ..Default::default()
        };
        CsvWriter::write_records(&["Home Company", "Employee Count", "Total Hours"], &rows, &mut out, &options)
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Home Company,Employee Count,Total Hours\nFlat Price,2,12.5\nReimbursement Balances,Amount\n"
        );
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tips.csv");
        CsvWriter::write_tip_summary_file(&[], &path, &CsvWriteOptions::default()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Name,Commission\r\n");
    }
}
