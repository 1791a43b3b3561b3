//! Fill configuration
//!
//! [`TemplateLayout`] describes where the template keeps each company's rows
//! and summary cells; [`BurdenTable`] holds the per-company burden
//! multipliers. Both load from JSON so a reworked template needs no rebuild.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use payroll_sheets_core::HomeCompany;
use serde::{Deserialize, Serialize};

use crate::error::{FillError, FillResult};

/// Pre-allocated employee rows for one home company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLayout {
    pub company: HomeCompany,
    /// First employee row
    pub first_row: u32,
    /// Last employee row
    pub last_row: u32,
    /// Allocate the amount row's company costs from the total row's own
    /// hour fractions rather than a per-employee weighted sum
    #[serde(default)]
    pub direct_allocation: bool,
}

impl SectionLayout {
    /// Number of employee rows in the template
    pub fn capacity(&self) -> usize {
        (self.last_row + 1).saturating_sub(self.first_row) as usize
    }
}

/// Summary rows, as offsets below the last section's total row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLayout {
    /// Overtime premium grand total (column F)
    pub overtime_offset: u32,
    /// Hours grand total (column Q) and the first balance cell (column C)
    pub due_offset: u32,
    /// Reimbursement total (column F) and the status label (column B)
    pub status_offset: u32,
}

impl Default for SummaryLayout {
    fn default() -> Self {
        Self {
            overtime_offset: 5,
            due_offset: 7,
            status_offset: 15,
        }
    }
}

/// Row geometry of the payroll template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateLayout {
    /// Sections, top to bottom
    pub sections: Vec<SectionLayout>,
    /// Total row, relative to a section's last employee row
    pub total_offset: u32,
    /// Derived-amount row, relative to a section's last employee row
    pub amount_offset: u32,
    #[serde(default)]
    pub summary: SummaryLayout,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        let section = |company, first_row, last_row| SectionLayout {
            company,
            first_row,
            last_row,
            direct_allocation: company == HomeCompany::ScanioMoving,
        };
        Self {
            sections: vec![
                section(HomeCompany::ScanioMoving, 5, 25),
                section(HomeCompany::ScanioStorage, 33, 39),
                section(HomeCompany::SeaAndAirIntl, 47, 56),
                section(HomeCompany::FlatPrice, 64, 85),
            ],
            total_offset: 1,
            amount_offset: 3,
            summary: SummaryLayout::default(),
        }
    }
}

impl TemplateLayout {
    /// Load a layout from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> FillResult<Self> {
        let text = fs::read_to_string(path)?;
        let layout: Self = serde_json::from_str(&text)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Section for a company
    pub fn section(&self, company: HomeCompany) -> Option<&SectionLayout> {
        self.sections.iter().find(|s| s.company == company)
    }

    /// Check that every company has exactly one section, sections are in
    /// top-down order and none overlaps the next one's rows
    pub fn validate(&self) -> FillResult<()> {
        for company in HomeCompany::ALL {
            let count = self.sections.iter().filter(|s| s.company == company).count();
            if count != 1 {
                return Err(FillError::InvalidLayout(format!(
                    "{company} has {count} sections, expected 1"
                )));
            }
        }
        if self.amount_offset <= self.total_offset {
            return Err(FillError::InvalidLayout(
                "amount row must sit below the total row".into(),
            ));
        }

        for section in &self.sections {
            if section.first_row == 0 || section.last_row < section.first_row {
                return Err(FillError::InvalidLayout(format!(
                    "{} rows {}..={} are empty",
                    section.company, section.first_row, section.last_row
                )));
            }
        }
        for pair in self.sections.windows(2) {
            // the amount row and the formula row below it belong to the section
            let reserved_end = pair[0].last_row + self.amount_offset + 1;
            if pair[1].first_row <= reserved_end {
                return Err(FillError::InvalidLayout(format!(
                    "{} starts at row {} inside the rows reserved for {}",
                    pair[1].company, pair[1].first_row, pair[0].company
                )));
            }
        }
        Ok(())
    }
}

/// Burden multiplier per home company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BurdenTable(BTreeMap<HomeCompany, f64>);

impl Default for BurdenTable {
    fn default() -> Self {
        Self(BTreeMap::from([
            (HomeCompany::ScanioMoving, 1.18),
            (HomeCompany::ScanioStorage, 1.24),
            (HomeCompany::SeaAndAirIntl, 1.18),
            (HomeCompany::FlatPrice, 1.18),
        ]))
    }
}

impl BurdenTable {
    /// Multiplier for a company (1.0 when the table has none)
    pub fn get(&self, company: HomeCompany) -> f64 {
        self.0.get(&company).copied().unwrap_or(1.0)
    }

    /// Override one company's multiplier
    pub fn set(&mut self, company: HomeCompany, multiplier: f64) {
        self.0.insert(company, multiplier);
    }
}

/// Options for a fill operation
#[derive(Debug, Clone)]
pub struct FillOptions {
    /// Template row geometry
    pub layout: TemplateLayout,
    /// Burden multipliers applied in the derived-amount rows
    pub burden: BurdenTable,
    /// Insert rows when a section overflows (default: true)
    pub allow_row_insertion: bool,
    /// Clear the `hidden` flag on every row (default: true)
    pub reveal_hidden_rows: bool,
    /// Worksheet to patch (default: the first sheet)
    pub sheet: Option<String>,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            layout: TemplateLayout::default(),
            burden: BurdenTable::default(),
            allow_row_insertion: true,
            reveal_hidden_rows: true,
            sheet: None,
        }
    }
}
