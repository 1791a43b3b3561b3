//! # payroll-sheets-csv
//!
//! Readers for the payroll input reports (batch timecards, simplified hours
//! and tip reports) and writers for the flattened outputs.

mod error;
mod hours;
mod options;
mod text;
mod timecard;
mod tips;
mod totals;
mod writer;

pub use error::{CsvError, CsvResult};
pub use hours::{HoursReader, HoursReport, HOURS_COLUMNS};
pub use options::{CsvReadOptions, CsvWriteOptions, LineTerminator, TimecardOptions};
pub use text::{collapse_spaces, format_minutes, parse_hours, parse_minutes, parse_money};
pub use timecard::{TimecardLine, TimecardReader, TimecardTotals};
pub use tips::{amount_from_note, classify_tip_source, TipReader, TipReport};
pub use totals::NamedTotals;
pub use writer::{CsvWriter, TIP_SUMMARY_COLUMNS};
