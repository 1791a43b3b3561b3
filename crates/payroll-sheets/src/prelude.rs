//! Prelude module - common imports for payroll-sheets users
//!
//! ```rust
//! use payroll_sheets::prelude::*;
//! ```

pub use crate::{
    // Companies
    BilledCompany,
    // Configuration
    BurdenTable,
    CompanyAmounts,
    CsvReadOptions,
    CsvWriteOptions,
    CsvWriter,
    Diagnostic,
    Document,
    DocumentRosterExt,
    FillError,
    // Fill
    FillInput,
    FillOptions,
    FillReport,
    FillResult,
    HomeCompany,
    // Inputs
    HoursReader,
    HoursReport,
    RosterEntry,
    TemplateLayout,
    TimecardOptions,
    TimecardReader,
    TipReader,
    TipReport,
    // Calculation
    PayrollCalculation,
    PayrollSummary,
};

pub use crate::{
    calculate_payroll, extract_roster, fill_document, fill_workbook, load_roster, match_names, normalize_name,
    write_roster,
};
