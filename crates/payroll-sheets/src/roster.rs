//! Roster model, roster files and roster extraction from a worksheet

use std::fs;
use std::path::Path;

use payroll_sheets_core::HomeCompany;
use payroll_sheets_csv::collapse_spaces;
use payroll_sheets_xlsx::{Cell, CellKind, Document, FormulaResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::BurdenTable;
use crate::error::FillResult;
use crate::identity::normalize_name;

/// Name column index (B)
const NAME_COL: u32 = 2;
/// Rate column index (C)
const RATE_COL: u32 = 3;

/// One employee on the roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub home_company: HomeCompany,
    pub rate: f64,
    pub burden_multiplier: f64,
}

impl RosterEntry {
    /// Entry with the burden multiplier taken from `burden`
    pub fn new(name: &str, home_company: HomeCompany, rate: f64, burden: &BurdenTable) -> Self {
        Self {
            name: collapse_spaces(name),
            home_company,
            rate,
            burden_multiplier: burden.get(home_company),
        }
    }
}

#[derive(Serialize)]
struct RosterFile<'a> {
    employees: Vec<&'a RosterEntry>,
}

/// Parse roster JSON (`{"employees": [...]}`)
///
/// Entries without a name, with an unknown `home_company` or with a
/// non-numeric `rate` are skipped. A missing `burden_multiplier` comes
/// from `burden`.
pub fn parse_roster(json: &str, burden: &BurdenTable) -> FillResult<Vec<RosterEntry>> {
    let payload: Value = serde_json::from_str(json)?;
    let employees = match payload.get("employees").and_then(Value::as_array) {
        Some(employees) => employees.as_slice(),
        None => &[],
    };

    let mut roster = Vec::with_capacity(employees.len());
    for employee in employees {
        let name = collapse_spaces(employee.get("name").and_then(Value::as_str).unwrap_or(""));
        let company = employee
            .get("home_company")
            .and_then(Value::as_str)
            .and_then(|key| key.parse::<HomeCompany>().ok());
        let rate = employee.get("rate").and_then(Value::as_f64);

        let (Some(home_company), Some(rate)) = (company, rate) else {
            log::warn!("skipping roster entry {}", employee);
            continue;
        };
        if name.is_empty() {
            log::warn!("skipping roster entry without a name: {}", employee);
            continue;
        }

        let burden_multiplier = employee
            .get("burden_multiplier")
            .and_then(Value::as_f64)
            .unwrap_or_else(|| burden.get(home_company));
        roster.push(RosterEntry {
            name,
            home_company,
            rate,
            burden_multiplier,
        });
    }

    log::debug!("loaded {} roster entries", roster.len());
    Ok(roster)
}

/// Load a roster file
pub fn load_roster<P: AsRef<Path>>(path: P, burden: &BurdenTable) -> FillResult<Vec<RosterEntry>> {
    let text = fs::read_to_string(path)?;
    parse_roster(&text, burden)
}

/// Roster JSON, entries sorted by normalized name, pretty-printed
pub fn roster_to_json(roster: &[RosterEntry]) -> FillResult<String> {
    let mut employees: Vec<&RosterEntry> = roster.iter().collect();
    employees.sort_by_cached_key(|entry| normalize_name(&entry.name));
    Ok(serde_json::to_string_pretty(&RosterFile { employees })?)
}

/// Write a roster file
pub fn write_roster<P: AsRef<Path>>(path: P, roster: &[RosterEntry]) -> FillResult<()> {
    let mut json = roster_to_json(roster)?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}

/// An employee row found in a worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeRow {
    pub row: u32,
    pub name: String,
    pub home_company: HomeCompany,
    pub rate: f64,
}

/// Numeric value of a plain number or a numeric formula's cached result
fn numeric_value(cell: &Cell) -> Option<f64> {
    match cell.kind() {
        CellKind::Numeric(value)
        | CellKind::Formula {
            cached: Some(value),
            result: FormulaResult::Number,
            ..
        } => value.trim().parse().ok(),
        _ => None,
    }
}

/// Scan a worksheet for employee rows
///
/// A column-B label naming a home company opens that company's section and
/// a `Total` label closes it. Inside a section, any other row with text in B
/// and a number in C is an employee.
pub fn scan_employee_rows(document: &Document) -> Vec<EmployeeRow> {
    let shared = document.shared_strings();
    let mut section: Option<HomeCompany> = None;
    let mut employees = Vec::new();

    for row in document.worksheet().data().rows() {
        let label = row
            .cell(NAME_COL)
            .and_then(|cell| cell.text(shared))
            .unwrap_or_default();
        if label.trim().is_empty() {
            continue;
        }

        if let Some(company) = HomeCompany::classify_label(&label) {
            section = Some(company);
            continue;
        }
        if normalize_name(&label) == "total" {
            section = None;
            continue;
        }

        let Some(home_company) = section else {
            continue;
        };
        if let Some(rate) = row.cell(RATE_COL).and_then(numeric_value) {
            employees.push(EmployeeRow {
                row: row.number(),
                name: label,
                home_company,
                rate,
            });
        }
    }

    employees
}

/// Roster read back from a worksheet
///
/// Names are de-duplicated by normalized form; a later row replaces an
/// earlier one in place.
pub fn extract_roster(document: &Document, burden: &BurdenTable) -> Vec<RosterEntry> {
    let mut roster: Vec<RosterEntry> = Vec::new();
    for employee in scan_employee_rows(document) {
        let entry = RosterEntry::new(&employee.name, employee.home_company, employee.rate, burden);
        let key = normalize_name(&entry.name);
        match roster.iter_mut().find(|e| normalize_name(&e.name) == key) {
            Some(existing) => *existing = entry,
            None => roster.push(entry),
        }
    }
    roster
}
