//! Payroll calculation without a workbook
//!
//! Works from the hours report and the roster alone: 40-hour regular and
//! overtime pay per employee, pay split across billed companies by hour
//! share, the split cost loaded with the employee's own burden multiplier,
//! and per-home-company totals with the reimbursement balances between
//! companies.

use std::path::Path;

use payroll_sheets_core::{format_decimal, BilledCompany, CompanyAmounts, HomeCompany};
use payroll_sheets_csv::{CsvWriteOptions, CsvWriter, HoursReport};

use crate::error::{Diagnostic, FillResult, NameSource};
use crate::identity::{match_names, normalize_name};
use crate::roster::RosterEntry;

/// Weekly hours paid at the regular rate
pub const REGULAR_HOURS: f64 = 40.0;

/// Overtime premium on top of the regular rate
const OVERTIME_PREMIUM_RATE: f64 = 0.5;

/// Decimal places kept in CSV output
const OUTPUT_DECIMALS: i32 = 4;

/// One employee's pay for the week
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeePay {
    /// Roster name
    pub name: String,
    /// Name as it appeared in the hours report
    pub source_name: String,
    pub home_company: HomeCompany,
    pub rate: f64,
    pub hours: CompanyAmounts,
    pub total_hours: f64,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub base_pay: f64,
    pub overtime_premium: f64,
    pub total_pay: f64,
    /// Fraction of hours per billed company (zero without hours)
    pub shares: CompanyAmounts,
    pub allocated_pay: CompanyAmounts,
    pub burden_multiplier: f64,
    /// Allocated pay times the burden multiplier
    pub allocated_cost: CompanyAmounts,
}

impl EmployeePay {
    /// Pay for `hours` at the roster entry's rate and burden
    pub fn new(entry: &RosterEntry, source_name: &str, hours: CompanyAmounts) -> Self {
        let rate = entry.rate;
        let total_hours = hours.total();
        let regular_hours = total_hours.min(REGULAR_HOURS);
        let overtime_hours = (total_hours - REGULAR_HOURS).max(0.0);

        let base_pay = regular_hours * rate;
        let overtime_premium = overtime_hours * rate * OVERTIME_PREMIUM_RATE;
        let total_pay = base_pay + overtime_hours * rate + overtime_premium;

        let mut shares = CompanyAmounts::new();
        let mut allocated_pay = CompanyAmounts::new();
        let mut allocated_cost = CompanyAmounts::new();
        if total_hours > 0.0 {
            for company in BilledCompany::ALL {
                shares[company] = hours[company] / total_hours;
                allocated_pay[company] = total_pay * shares[company];
                allocated_cost[company] = allocated_pay[company] * entry.burden_multiplier;
            }
        }

        Self {
            name: entry.name.clone(),
            source_name: source_name.to_string(),
            home_company: entry.home_company,
            rate,
            hours,
            total_hours,
            regular_hours,
            overtime_hours,
            base_pay,
            overtime_premium,
            total_pay,
            shares,
            allocated_pay,
            burden_multiplier: entry.burden_multiplier,
            allocated_cost,
        }
    }
}

/// Totals for one home company
#[derive(Debug, Clone, PartialEq)]
pub struct HomeTotals {
    pub home_company: HomeCompany,
    pub employees: usize,
    pub total_hours: f64,
    pub total_pay: f64,
    /// Burdened cost attributed to each billed company
    pub cost: CompanyAmounts,
}

/// Net amounts owed between billed companies
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reimbursements {
    pub scanio_to_sea_and_air: f64,
    pub scanio_to_flat_price: f64,
    pub sea_and_air_to_flat_price: f64,
}

impl Reimbursements {
    /// `(payer, payee, amount)` rows in report order
    pub fn rows(&self) -> [(BilledCompany, BilledCompany, f64); 3] {
        [
            (BilledCompany::Scanio, BilledCompany::SeaAndAir, self.scanio_to_sea_and_air),
            (BilledCompany::Scanio, BilledCompany::FlatPrice, self.scanio_to_flat_price),
            (BilledCompany::SeaAndAir, BilledCompany::FlatPrice, self.sea_and_air_to_flat_price),
        ]
    }
}

/// Company-level view of a calculation
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollSummary {
    /// One entry per home company, in section order
    pub homes: Vec<HomeTotals>,
    pub balances: Reimbursements,
}

impl PayrollSummary {
    /// Totals for `company`
    pub fn home(&self, company: HomeCompany) -> Option<&HomeTotals> {
        self.homes.iter().find(|h| h.home_company == company)
    }

    /// Cost `payee` bore for work billed to `payer`, summed over `payee`'s home companies
    fn covered(&self, payer: BilledCompany, payee: BilledCompany) -> f64 {
        self.homes
            .iter()
            .filter(|h| h.home_company.billed() == payee)
            .map(|h| h.cost[payer])
            .sum()
    }
}

/// Result of [`calculate_payroll`]
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollCalculation {
    /// Employees sorted by home company section, then normalized name
    pub employees: Vec<EmployeePay>,
    pub summary: PayrollSummary,
    pub unmatched_hour_names: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Calculate the week's payroll from hours and the roster
///
/// Hour names without a roster match are left out of the totals and
/// reported as [`Diagnostic::UnmatchedIdentity`].
pub fn calculate_payroll(hours: &HoursReport, roster: &[RosterEntry]) -> PayrollCalculation {
    let mut diagnostics: Vec<Diagnostic> = hours
        .unknown_companies
        .iter()
        .map(|label| Diagnostic::UnknownSourceCompany(label.clone()))
        .collect();

    let roster_names: Vec<&str> = roster.iter().map(|e| e.name.as_str()).collect();
    let hour_names: Vec<&str> = hours.totals.names().collect();
    let matches = match_names(&roster_names, &hour_names);

    let mut employees = Vec::with_capacity(matches.matches.len());
    for (query, (source_name, amounts)) in hours.totals.iter().enumerate() {
        if let Some(candidate) = matches.candidate_for(query) {
            employees.push(EmployeePay::new(&roster[candidate], source_name, *amounts));
        }
    }
    employees.sort_by_cached_key(|e| {
        let section = HomeCompany::ALL.iter().position(|&c| c == e.home_company);
        (section, normalize_name(&e.name))
    });

    let unmatched_hour_names: Vec<String> = matches
        .unmatched
        .iter()
        .map(|&q| hour_names[q].to_string())
        .collect();
    for name in &unmatched_hour_names {
        log::warn!("no roster match for {} name {:?}", NameSource::Hours, name);
        diagnostics.push(Diagnostic::UnmatchedIdentity {
            source: NameSource::Hours,
            name: name.clone(),
        });
    }

    let summary = summarize(&employees);
    log::info!(
        "calculated pay for {} employees ({} hour names unmatched)",
        employees.len(),
        unmatched_hour_names.len()
    );

    PayrollCalculation {
        employees,
        summary,
        unmatched_hour_names,
        diagnostics,
    }
}

/// Per-home-company totals and the reimbursement balances
pub fn summarize(employees: &[EmployeePay]) -> PayrollSummary {
    let mut homes: Vec<HomeTotals> = HomeCompany::ALL
        .into_iter()
        .map(|home_company| HomeTotals {
            home_company,
            employees: 0,
            total_hours: 0.0,
            total_pay: 0.0,
            cost: CompanyAmounts::new(),
        })
        .collect();

    for employee in employees {
        let Some(home) = homes.iter_mut().find(|h| h.home_company == employee.home_company) else {
            continue;
        };
        home.employees += 1;
        home.total_hours += employee.total_hours;
        home.total_pay += employee.total_pay;
        home.cost += employee.allocated_cost;
    }

    let mut summary = PayrollSummary {
        homes,
        balances: Reimbursements::default(),
    };
    let balance = |a: BilledCompany, b: BilledCompany| summary.covered(a, b) - summary.covered(b, a);
    let balances = Reimbursements {
        scanio_to_sea_and_air: balance(BilledCompany::Scanio, BilledCompany::SeaAndAir),
        scanio_to_flat_price: balance(BilledCompany::Scanio, BilledCompany::FlatPrice),
        sea_and_air_to_flat_price: balance(BilledCompany::SeaAndAir, BilledCompany::FlatPrice),
    };
    summary.balances = balances;
    summary
}

fn amount(value: f64) -> String {
    let scale = 10f64.powi(OUTPUT_DECIMALS);
    format_decimal((value * scale).round() / scale)
}

/// Header of the employee details CSV
pub fn details_header() -> Vec<String> {
    let mut header: Vec<String> = vec!["Name".into(), "Home Company".into(), "Rate".into()];
    header.extend(BilledCompany::ALL.map(|c| format!("{} Hours", c.column_label())));
    header.extend(
        ["Total Hours", "Regular Hours", "Overtime Hours", "Base Pay", "Overtime Premium", "Total Pay"]
            .map(String::from),
    );
    header.extend(BilledCompany::ALL.map(|c| format!("{} %", c.column_label())));
    header.extend(BilledCompany::ALL.map(|c| format!("Alloc Pay -> {}", c.column_label())));
    header.push("Burden Multiplier".into());
    header.extend(BilledCompany::ALL.map(|c| format!("Alloc Cost -> {}", c.column_label())));
    header
}

/// One details CSV row per employee
pub fn details_rows(employees: &[EmployeePay]) -> Vec<Vec<String>> {
    employees
        .iter()
        .map(|e| {
            let mut row = vec![e.name.clone(), e.home_company.label().to_string(), amount(e.rate)];
            row.extend(e.hours.iter().map(|(_, v)| amount(v)));
            row.extend(
                [
                    e.total_hours,
                    e.regular_hours,
                    e.overtime_hours,
                    e.base_pay,
                    e.overtime_premium,
                    e.total_pay,
                ]
                .map(amount),
            );
            row.extend(e.shares.iter().map(|(_, v)| amount(v)));
            row.extend(e.allocated_pay.iter().map(|(_, v)| amount(v)));
            row.push(amount(e.burden_multiplier));
            row.extend(e.allocated_cost.iter().map(|(_, v)| amount(v)));
            row
        })
        .collect()
}

/// Header of the company summary CSV
pub fn summary_header() -> Vec<String> {
    let mut header: Vec<String> = ["Home Company", "Employee Count", "Total Hours", "Total Pay"]
        .map(String::from)
        .to_vec();
    header.extend(BilledCompany::ALL.map(|c| format!("Cost Attributed to {}", c.column_label())));
    header
}

/// Company summary rows followed by the reimbursement balances
pub fn summary_rows(summary: &PayrollSummary) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = summary
        .homes
        .iter()
        .map(|h| {
            let mut row = vec![
                h.home_company.label().to_string(),
                h.employees.to_string(),
                amount(h.total_hours),
                amount(h.total_pay),
            ];
            row.extend(h.cost.iter().map(|(_, v)| amount(v)));
            row
        })
        .collect();

    rows.push(vec!["Reimbursement Balances".into(), "Amount".into()]);
    for (payer, payee, value) in summary.balances.rows() {
        rows.push(vec![
            format!("Due from {} to {}", payer.label(), payee.label()),
            amount(value),
        ]);
    }
    rows
}

/// Write the employee details CSV
pub fn write_details<P: AsRef<Path>>(
    path: P,
    employees: &[EmployeePay],
    options: &CsvWriteOptions,
) -> FillResult<()> {
    let header = details_header();
    let header: Vec<&str> = header.iter().map(String::as_str).collect();
    CsvWriter::write_records_file(&header, &details_rows(employees), path, options)?;
    Ok(())
}

/// Write the company summary CSV
pub fn write_summary<P: AsRef<Path>>(
    path: P,
    summary: &PayrollSummary,
    options: &CsvWriteOptions,
) -> FillResult<()> {
    let header = summary_header();
    let header: Vec<&str> = header.iter().map(String::as_str).collect();
    CsvWriter::write_records_file(&header, &summary_rows(summary), path, options)?;
    Ok(())
}
