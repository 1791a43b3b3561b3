//! # payroll-sheets
//!
//! Fill a weekly payroll workbook template from timecard hours and tip
//! reports.
//!
//! The workbook is patched in place rather than regenerated: only the
//! worksheet rows, merged ranges, dimension and workbook calculation
//! settings are rewritten, and every other part of the archive is copied
//! as it was.
//!
//! ## Features
//!
//! - Identity resolution between free-text source names and the roster
//! - Company sections that grow by row insertion when the roster outgrows them
//! - Per-employee, per-section and cross-company formulas rebuilt against
//!   the final rows
//! - Roster files and roster extraction from a filled workbook
//! - A standalone pay calculation with details and company summary CSVs
//!
//! ## Example
//!
//! ```rust,no_run
//! use payroll_sheets::prelude::*;
//!
//! let hours = HoursReader::read_file("hours.csv", &CsvReadOptions::default()).unwrap();
//! let roster = load_roster("roster.json", &BurdenTable::default()).unwrap();
//!
//! let input = FillInput {
//!     hours: &hours,
//!     tips: None,
//!     roster: Some(&roster),
//! };
//! let report = fill_workbook(
//!     "template.xlsx".as_ref(),
//!     "filled.xlsx".as_ref(),
//!     &input,
//!     &FillOptions::default(),
//! )
//! .unwrap();
//! for name in &report.unmatched_hour_names {
//!     println!("no roster entry for {name}");
//! }
//! ```

pub mod calculator;
pub mod config;
pub mod error;
pub mod fill;
pub mod formulas;
pub mod identity;
pub mod layout;
pub mod prelude;
pub mod roster;

pub use calculator::{
    calculate_payroll, summarize, write_details, write_summary, EmployeePay, HomeTotals, PayrollCalculation,
    PayrollSummary, Reimbursements,
};
pub use config::{BurdenTable, FillOptions, SectionLayout, SummaryLayout, TemplateLayout};
pub use error::{Diagnostic, FillError, FillResult, NameSource};
pub use fill::{allocate_commission, fill_document, fill_workbook, FillInput, FillReport, PlacedEmployee};
pub use identity::{match_names, normalize_name, similarity, MatchMethod, NameMatch, NameMatches};
pub use layout::{plan_layout, Insertion, LayoutPlan, SectionPlan, SummaryRows};
pub use roster::{
    extract_roster, load_roster, parse_roster, roster_to_json, scan_employee_rows, write_roster,
    EmployeeRow, RosterEntry,
};

// Re-export the collaborator crates
pub use payroll_sheets_core::{BilledCompany, CompanyAmounts, HomeCompany};
pub use payroll_sheets_csv::{
    CsvError, CsvReadOptions, CsvWriteOptions, CsvWriter, HoursReader, HoursReport, TimecardOptions,
    TimecardReader, TimecardTotals, TipReader, TipReport,
};
pub use payroll_sheets_xlsx::{Document, XlsxError};

use std::path::Path;

/// Extension trait for [`Document`] to read a roster back out of a workbook
pub trait DocumentRosterExt {
    /// Roster read from the worksheet
    fn roster(&self, burden: &BurdenTable) -> Vec<RosterEntry>;
}

impl DocumentRosterExt for Document {
    fn roster(&self, burden: &BurdenTable) -> Vec<RosterEntry> {
        extract_roster(self, burden)
    }
}

/// Extract the roster from a workbook file
pub fn roster_from_workbook<P: AsRef<Path>>(
    path: P,
    sheet: Option<&str>,
    burden: &BurdenTable,
) -> FillResult<Vec<RosterEntry>> {
    let document = Document::open_file(path, sheet)?;
    Ok(document.roster(burden))
}
