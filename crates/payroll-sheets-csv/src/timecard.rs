//! Batch timecard report flattening
//!
//! The report lists each employee as a header row (name in the first
//! column) followed by punch rows carrying a department, clock-in and
//! clock-out times and a regular-hours column. Flattening sums minutes per
//! (employee, department).

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveTime, Timelike};

use crate::error::CsvResult;
use crate::options::{CsvReadOptions, TimecardOptions};
use crate::text::{collapse_spaces, parse_minutes};

const DEPARTMENT_COLUMN: usize = 3;
const IN_COLUMN: usize = 5;
const MARKER_COLUMN: usize = 6;
const OUT_COLUMN: usize = 7;
const REG_COLUMN: usize = 10;

const WEEKLY_OVERTIME: &str = "WEEKLY OVERTIME";
const MINUTES_PER_DAY: i64 = 24 * 60;

/// Minutes worked by one employee in one department
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimecardLine {
    pub name: String,
    pub department: String,
    pub minutes: i64,
}

/// Flattened timecard, in first-seen (employee, department) order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimecardTotals {
    lines: Vec<TimecardLine>,
    index: HashMap<(String, String), usize>,
}

impl TimecardTotals {
    /// Add minutes for an employee and department
    pub fn add(&mut self, name: &str, department: &str, minutes: i64) {
        let key = (name.to_string(), department.to_string());
        match self.index.get(&key) {
            Some(&i) => self.lines[i].minutes += minutes,
            None => {
                self.index.insert(key, self.lines.len());
                self.lines.push(TimecardLine {
                    name: name.to_string(),
                    department: department.to_string(),
                    minutes,
                });
            }
        }
    }

    /// Lines in first-seen order
    pub fn lines(&self) -> &[TimecardLine] {
        &self.lines
    }

    /// Distinct employee names, first-seen order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for line in &self.lines {
            if !names.contains(&line.name.as_str()) {
                names.push(&line.name);
            }
        }
        names
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing was flattened
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Reader for batch timecard reports
pub struct TimecardReader;

impl TimecardReader {
    /// Flatten a batch report file
    pub fn read_file<P: AsRef<Path>>(
        path: P,
        options: &CsvReadOptions,
        timecard: &TimecardOptions,
    ) -> CsvResult<TimecardTotals> {
        let file = File::open(path)?;
        Self::read(file, options, timecard)
    }

    /// Flatten batch report data
    ///
    /// Punch rows use the in/out duration, wrapping past midnight, and fall
    /// back to the regular-hours column when the times are missing.
    /// `WEEKLY OVERTIME` rows use the regular-hours column and are skipped
    /// when `include_weekly_overtime` is off.
    pub fn read<R: Read>(
        reader: R,
        options: &CsvReadOptions,
        timecard: &TimecardOptions,
    ) -> CsvResult<TimecardTotals> {
        let mut csv_reader = options.reader(reader, false);
        let mut totals = TimecardTotals::default();
        let mut employee: Option<String> = None;

        for result in csv_reader.records() {
            let record = result?;
            let field = |col: usize| record.get(col).unwrap_or("").trim();

            let first = collapse_spaces(field(0).trim_start_matches('\u{feff}'));
            if is_employee_header(&first) {
                employee = Some(first);
                continue;
            }
            let Some(name) = employee.as_deref() else {
                continue;
            };

            let department = collapse_spaces(field(DEPARTMENT_COLUMN));
            if department.is_empty() {
                continue;
            }

            let marker = collapse_spaces(field(MARKER_COLUMN)).to_uppercase();
            let minutes = if marker == WEEKLY_OVERTIME {
                if !timecard.include_weekly_overtime {
                    continue;
                }
                parse_minutes(field(REG_COLUMN))
            } else {
                duration(field(IN_COLUMN), field(OUT_COLUMN))
                    .or_else(|| parse_minutes(field(REG_COLUMN)))
            };

            match minutes {
                Some(minutes) => totals.add(name, &department, minutes),
                None => log::debug!("no hours on {} row for {}", department, name),
            }
        }

        log::debug!("flattened timecard into {} lines", totals.len());
        Ok(totals)
    }
}

/// Whether a first-column value starts a new employee block
fn is_employee_header(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    let lowered = value.to_lowercase();
    !(lowered.starts_with("timecard report")
        || lowered.starts_with("pay period:")
        || lowered == "sea and air")
}

/// Minutes since midnight for `h:mm AM` / `h:mm PM`
fn clock_minutes(value: &str) -> Option<i64> {
    let text = value.trim().to_uppercase();
    let (clock, meridiem) = text.split_at(text.find(['A', 'P'])?);
    let clock = clock.trim();
    if meridiem != "AM" && meridiem != "PM" {
        return None;
    }
    let (hours, minutes) = clock.split_once(':')?;
    if !(1..=2).contains(&hours.len()) || minutes.len() != 2 {
        return None;
    }
    let time = NaiveTime::parse_from_str(&format!("{clock} {meridiem}"), "%I:%M %p").ok()?;
    Some(i64::from(time.hour()) * 60 + i64::from(time.minute()))
}

/// Minutes between clock-in and clock-out, wrapping past midnight
fn duration(clock_in: &str, clock_out: &str) -> Option<i64> {
    let start = clock_minutes(clock_in)?;
    let end = clock_minutes(clock_out)?;
    Some((end - start).rem_euclid(MINUTES_PER_DAY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REPORT: &str = concat!(
        "Timecard Report,,,,,,,,,,\n",
        "Pay Period: 01/01 - 01/07,,,,,,,,,,\n",
        "Maria Lopez,,,,,,,,,,\n",
        ",Mon,,SCANIO,,8:00 AM,,4:30 PM,,,8:30\n",
        ",Tue,,SEA AND AIR,,10:00 PM,,2:00 AM,,,\n",
        ",Wed,,SCANIO,,,,,,,1:15\n",
        ",,,SCANIO,,,WEEKLY OVERTIME,,,,-0:45\n",
        ",,,,,,,,,,40:00\n",
        "Jon Smith,,,,,,,,,,\n",
        ",Mon,,FLAT PRICE,,9:00 am,,9:05 AM,,,\n",
    );

    fn flatten(include_weekly_overtime: bool) -> TimecardTotals {
        TimecardReader::read(
            REPORT.as_bytes(),
            &CsvReadOptions::default(),
            &TimecardOptions {
                include_weekly_overtime,
            },
        )
        .unwrap()
    }

    fn line(name: &str, department: &str, minutes: i64) -> TimecardLine {
        TimecardLine {
            name: name.into(),
            department: department.into(),
            minutes,
        }
    }

    #[test]
    fn test_flatten_with_weekly_overtime() {
        let totals = flatten(true);
        assert_eq!(
            totals.lines(),
            &[
                line("Maria Lopez", "SCANIO", 510 + 75 - 45),
                line("Maria Lopez", "SEA AND AIR", 240),
                line("Jon Smith", "FLAT PRICE", 5),
            ]
        );
        assert_eq!(totals.names(), vec!["Maria Lopez", "Jon Smith"]);
    }

    #[test]
    fn test_flatten_without_weekly_overtime() {
        let totals = flatten(false);
        assert_eq!(totals.lines()[0], line("Maria Lopez", "SCANIO", 510 + 75));
    }

    #[test]
    fn test_clock_minutes() {
        assert_eq!(clock_minutes("12:00 AM"), Some(0));
        assert_eq!(clock_minutes("12:30 PM"), Some(750));
        assert_eq!(clock_minutes("9:05pm"), Some(21 * 60 + 5));
        assert_eq!(clock_minutes("13:00 PM"), None);
        assert_eq!(clock_minutes("8:00"), None);
        assert_eq!(clock_minutes("8:0 AM"), None);
    }

    #[test]
    fn test_duration_wraps_midnight() {
        assert_eq!(duration("11:00 PM", "1:30 AM"), Some(150));
        assert_eq!(duration("8:00 AM", "8:00 AM"), Some(0));
        assert_eq!(duration("", "8:00 AM"), None);
    }
}
