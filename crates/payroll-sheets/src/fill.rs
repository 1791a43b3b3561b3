//! The fill operation
//!
//! Places roster entries into the template's company sections, writes each
//! employee's hours and commissions, refreshes the derived formulas and
//! writes the patched workbook.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use payroll_sheets_core::{BilledCompany, CompanyAmounts, HomeCompany};
use payroll_sheets_csv::{HoursReport, NamedTotals, TipReport};
use payroll_sheets_xlsx::Document;

use crate::config::FillOptions;
use crate::error::{Diagnostic, FillResult, NameSource};
use crate::formulas::{
    commission_column, employee_row_formulas, hours_column, section_formulas, status_cell,
    summary_formulas, write_formulas, COMMISSION_TOTAL_COLUMN, LEAD_COLUMN, NAME_COLUMN,
    RATE_COLUMN,
};
use crate::identity::{match_names, normalize_name, NameMatches};
use crate::layout::{apply_insertions, plan_layout, Insertion, LayoutPlan, SummaryRows};
use crate::roster::{scan_employee_rows, RosterEntry};

/// Inputs of a fill
#[derive(Debug, Clone, Copy)]
pub struct FillInput<'a> {
    pub hours: &'a HoursReport,
    pub tips: Option<&'a TipReport>,
    /// Roster to place; without one, employees are read from the template
    pub roster: Option<&'a [RosterEntry]>,
}

/// An employee row after placement
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedEmployee {
    pub row: u32,
    pub name: String,
    pub home_company: HomeCompany,
}

/// Outcome of a fill
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillReport {
    /// Written workbook, when the fill went to a file
    pub output_path: Option<PathBuf>,
    /// Patched worksheet
    pub sheet_name: String,
    /// Employee rows in worksheet order
    pub employees: Vec<PlacedEmployee>,
    /// `(source name, roster name)` for every matched hours name
    pub matched_hours: Vec<(String, String)>,
    /// `(source name, roster name)` for every matched tip name
    pub matched_tips: Vec<(String, String)>,
    pub unmatched_hour_names: Vec<String>,
    pub unmatched_tip_names: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    /// Overflow rows inserted
    pub insertions: Vec<Insertion>,
    /// Summary rows as written
    pub summary: Option<SummaryRows>,
    /// Tip totals by roster name (source name when unmatched), sorted by
    /// normalized name
    pub tip_summary: Vec<(String, f64)>,
}

impl FillReport {
    /// Tip notes that named no company
    pub fn unknown_notes(&self) -> Vec<&str> {
        self.diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::AmbiguousNote(note) => Some(note.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of rows inserted
    pub fn inserted_rows(&self) -> u32 {
        self.insertions.iter().map(|i| i.count).sum()
    }
}

/// Fill a template file and write the result to `output`
///
/// The workbook is written to a temporary file next to `output` and moved
/// into place only once complete, so a failed fill leaves nothing behind.
pub fn fill_workbook(
    template: &Path,
    output: &Path,
    input: &FillInput<'_>,
    options: &FillOptions,
) -> FillResult<FillReport> {
    let mut document = Document::open_file(template, options.sheet.as_deref())?;
    let mut report = fill_document(&mut document, input, options)?;

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    document.write(staged.as_file_mut())?;
    staged.persist(output)?;

    log::info!("wrote {}", output.display());
    report.output_path = Some(output.to_path_buf());
    Ok(report)
}

/// Fill an opened workbook in memory
pub fn fill_document(
    document: &mut Document,
    input: &FillInput<'_>,
    options: &FillOptions,
) -> FillResult<FillReport> {
    let mut report = FillReport {
        sheet_name: document.sheet_name().to_string(),
        ..Default::default()
    };

    let (employees, summary) = match input.roster {
        Some(roster) => {
            let plan = place_roster(document, roster, options)?;
            report.insertions = plan.insertions.clone();
            (placed_employees(&plan, roster), plan.summary)
        }
        None => {
            let employees: Vec<PlacedEmployee> = scan_employee_rows(document)
                .into_iter()
                .map(|e| PlacedEmployee {
                    row: e.row,
                    name: e.name,
                    home_company: e.home_company,
                })
                .collect();
            (employees, plan_layout(&options.layout, |_| 0, true)?.summary)
        }
    };
    report.summary = Some(summary);

    let roster_names: Vec<&str> = employees.iter().map(|e| e.name.as_str()).collect();

    for label in &input.hours.unknown_companies {
        report
            .diagnostics
            .push(Diagnostic::UnknownSourceCompany(label.clone()));
    }

    let hour_names: Vec<&str> = input.hours.totals.names().collect();
    let hour_matches = match_names(&roster_names, &hour_names);
    record_matches(
        &mut report,
        NameSource::Hours,
        &hour_matches,
        &hour_names,
        &roster_names,
    );

    let empty_tips = TipReport::default();
    let tips = input.tips.unwrap_or(&empty_tips);
    for note in &tips.ambiguous_notes {
        report.diagnostics.push(Diagnostic::AmbiguousNote(note.clone()));
    }
    let tip_names: Vec<&str> = tips.totals.names().collect();
    let tip_matches = match_names(&roster_names, &tip_names);
    record_matches(
        &mut report,
        NameSource::Tips,
        &tip_matches,
        &tip_names,
        &roster_names,
    );

    for (index, employee) in employees.iter().enumerate() {
        let hours = hour_matches
            .query_for(index)
            .and_then(|q| input.hours.totals.get(hour_names[q]))
            .copied()
            .unwrap_or_default();
        for company in BilledCompany::ALL {
            document.set_numeric_cell(employee.row, hours_column(company), hours[company])?;
        }

        if tips.totals.is_empty() {
            continue;
        }
        let tip_name = tip_matches.query_for(index).map(|q| tip_names[q]);
        let total = tip_name
            .and_then(|name| tips.totals.get(name))
            .copied()
            .unwrap_or(0.0);
        let by_source = tip_name
            .and_then(|name| tips.by_source.get(name))
            .copied()
            .unwrap_or_default();
        let commissions = allocate_commission(total, by_source, employee.home_company);

        for company in BilledCompany::ALL {
            document.set_numeric_cell(employee.row, commission_column(company), commissions[company])?;
        }
        document.set_numeric_cell_preserving_formula(employee.row, COMMISSION_TOTAL_COLUMN, total)?;
    }

    write_formulas(document, &[status_cell(summary.status_row, summary.due_row)])?;

    if options.reveal_hidden_rows {
        let revealed = document.reveal_hidden_rows();
        if revealed > 0 {
            log::debug!("revealed {} hidden rows", revealed);
        }
    }
    document.mark_full_recalculation();

    report.tip_summary = tip_summary(tips, &tip_matches, &roster_names);
    report.employees = employees;

    log::info!(
        "filled {} employees on {}: {} of {} hour names matched, {} of {} tip names matched, {} rows inserted",
        report.employees.len(),
        report.sheet_name,
        report.matched_hours.len(),
        hour_names.len(),
        report.matched_tips.len(),
        tip_names.len(),
        report.inserted_rows()
    );
    Ok(report)
}

/// Plan sections, insert overflow rows, then write every formula and the
/// roster values against the final rows
fn place_roster(
    document: &mut Document,
    roster: &[RosterEntry],
    options: &FillOptions,
) -> FillResult<LayoutPlan> {
    let grouped = group_roster(roster);
    let count = |company: HomeCompany| grouped.get(&company).map_or(0, Vec::len);

    let plan = plan_layout(&options.layout, count, options.allow_row_insertion)?;
    apply_insertions(document, &plan)?;

    for section in &plan.sections {
        write_formulas(
            document,
            &section_formulas(section, options.burden.get(section.company)),
        )?;
    }
    write_formulas(document, &summary_formulas(&plan))?;

    for section in &plan.sections {
        let entries = grouped.get(&section.company).map_or(&[][..], Vec::as_slice);
        for (slot, &row) in section.rows.iter().enumerate() {
            document.set_inline_text(row, LEAD_COLUMN, "")?;
            write_formulas(document, &employee_row_formulas(row))?;

            match entries.get(slot) {
                Some(&index) => {
                    let entry = &roster[index];
                    document.set_inline_text(row, NAME_COLUMN, &entry.name)?;
                    document.set_numeric_cell(row, RATE_COLUMN, entry.rate)?;
                }
                None => {
                    document.set_inline_text(row, NAME_COLUMN, "")?;
                    document.set_numeric_cell(row, RATE_COLUMN, 0.0)?;
                    for company in BilledCompany::ALL {
                        document.set_numeric_cell(row, commission_column(company), 0.0)?;
                        document.set_numeric_cell(row, hours_column(company), 0.0)?;
                    }
                    document.set_numeric_cell_preserving_formula(row, COMMISSION_TOTAL_COLUMN, 0.0)?;
                }
            }
        }
    }

    Ok(plan)
}

/// Roster indices per home company, each sorted by normalized name
fn group_roster(roster: &[RosterEntry]) -> HashMap<HomeCompany, Vec<usize>> {
    let mut grouped: HashMap<HomeCompany, Vec<usize>> = HashMap::new();
    for (index, entry) in roster.iter().enumerate() {
        grouped.entry(entry.home_company).or_default().push(index);
    }
    for indices in grouped.values_mut() {
        indices.sort_by_cached_key(|&i| normalize_name(&roster[i].name));
    }
    grouped
}

/// Employees in worksheet order after placement
fn placed_employees(plan: &LayoutPlan, roster: &[RosterEntry]) -> Vec<PlacedEmployee> {
    let grouped = group_roster(roster);
    let mut employees = Vec::new();
    for section in &plan.sections {
        let Some(entries) = grouped.get(&section.company) else {
            continue;
        };
        for (&row, &index) in section.rows.iter().zip(entries) {
            employees.push(PlacedEmployee {
                row,
                name: roster[index].name.clone(),
                home_company: section.company,
            });
        }
    }
    employees
}

fn record_matches(
    report: &mut FillReport,
    source: NameSource,
    matches: &NameMatches,
    names: &[&str],
    roster_names: &[&str],
) {
    let pairs: Vec<(String, String)> = matches
        .matches
        .iter()
        .map(|m| (names[m.query].to_string(), roster_names[m.candidate].to_string()))
        .collect();
    let unmatched: Vec<String> = matches
        .unmatched
        .iter()
        .map(|&q| names[q].to_string())
        .collect();

    for name in &unmatched {
        log::warn!("no roster match for {} name {:?}", source, name);
        report.diagnostics.push(Diagnostic::UnmatchedIdentity {
            source,
            name: name.clone(),
        });
    }

    match source {
        NameSource::Hours => {
            report.matched_hours = pairs;
            report.unmatched_hour_names = unmatched;
        }
        NameSource::Tips => {
            report.matched_tips = pairs;
            report.unmatched_tip_names = unmatched;
        }
    }
}

/// Split a person's tip total across the commission columns
///
/// Amounts with a known source stay with that company. Whatever the sources
/// do not account for goes to the largest non-zero source, or to the
/// company the home company bills as when there is none.
pub fn allocate_commission(
    total: f64,
    mut by_source: CompanyAmounts,
    home_company: HomeCompany,
) -> CompanyAmounts {
    let remainder = total - by_source.total();
    if remainder.abs() > 1e-9 {
        let fallback = by_source.dominant().unwrap_or_else(|| home_company.billed());
        by_source[fallback] += remainder;
    }
    by_source
}

/// Tip totals keyed by roster name, sorted by normalized name
fn tip_summary(tips: &TipReport, matches: &NameMatches, roster_names: &[&str]) -> Vec<(String, f64)> {
    let mut totals: NamedTotals<f64> = NamedTotals::new();
    for (query, (name, amount)) in tips.totals.iter().enumerate() {
        let canonical = matches
            .candidate_for(query)
            .map_or(name, |candidate| roster_names[candidate]);
        *totals.entry(canonical) += *amount;
    }

    let mut summary: Vec<(String, f64)> = totals
        .iter()
        .map(|(name, amount)| (name.to_string(), *amount))
        .collect();
    summary.sort_by_cached_key(|(name, _)| normalize_name(name));
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn amounts(scanio: f64, sea: f64, flat: f64) -> CompanyAmounts {
        let mut amounts = CompanyAmounts::new();
        amounts[BilledCompany::Scanio] = scanio;
        amounts[BilledCompany::SeaAndAir] = sea;
        amounts[BilledCompany::FlatPrice] = flat;
        amounts
    }

    #[test]
    fn test_remainder_goes_to_dominant_source() {
        let split = allocate_commission(100.0, amounts(10.0, 50.0, 0.0), HomeCompany::FlatPrice);
        assert_eq!(split, amounts(10.0, 90.0, 0.0));
    }

    #[test]
    fn test_remainder_goes_to_home_company() {
        let split = allocate_commission(25.0, CompanyAmounts::new(), HomeCompany::ScanioStorage);
        assert_eq!(split, amounts(25.0, 0.0, 0.0));

        let split = allocate_commission(25.0, CompanyAmounts::new(), HomeCompany::SeaAndAirIntl);
        assert_eq!(split, amounts(0.0, 25.0, 0.0));
    }

    #[test]
    fn test_no_remainder() {
        let split = allocate_commission(30.0, amounts(10.0, 0.0, 20.0), HomeCompany::ScanioMoving);
        assert_eq!(split, amounts(10.0, 0.0, 20.0));
    }

    #[test]
    fn test_group_roster_sorts_by_normalized_name() {
        let burden = crate::config::BurdenTable::default();
        let roster = vec![
            RosterEntry::new("zed", HomeCompany::FlatPrice, 1.0, &burden),
            RosterEntry::new("Émile", HomeCompany::FlatPrice, 1.0, &burden),
            RosterEntry::new("Bo", HomeCompany::ScanioMoving, 1.0, &burden),
        ];
        let grouped = group_roster(&roster);
        assert_eq!(grouped[&HomeCompany::FlatPrice], vec![1, 0]);
        assert_eq!(grouped[&HomeCompany::ScanioMoving], vec![2]);
    }
}
