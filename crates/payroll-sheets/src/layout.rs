//! Section row planning and overflow insertion
//!
//! Placement is staged: [`plan_layout`] computes every section's final rows
//! from the template layout and the roster sizes, [`apply_insertions`]
//! inserts the overflow rows, and only then are values and formulas written
//! against the planned row numbers.

use payroll_sheets_core::HomeCompany;
use payroll_sheets_xlsx::Document;

use crate::config::{SummaryLayout, TemplateLayout};
use crate::error::{FillError, FillResult};

/// Rows inserted after a section's last template row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    pub company: HomeCompany,
    /// First inserted row
    pub at: u32,
    /// Number of rows inserted
    pub count: u32,
    /// Row cloned into each inserted row
    pub template_row: u32,
}

/// Final rows of one section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPlan {
    pub company: HomeCompany,
    /// Employee rows, top to bottom
    pub rows: Vec<u32>,
    pub total_row: u32,
    pub amount_row: u32,
    pub direct_allocation: bool,
}

impl SectionPlan {
    /// First employee row
    pub fn first_row(&self) -> u32 {
        self.rows.first().copied().unwrap_or(self.total_row)
    }

    /// Last employee row
    pub fn last_row(&self) -> u32 {
        self.rows.last().copied().unwrap_or(self.total_row)
    }
}

/// Summary rows after insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryRows {
    pub overtime_row: u32,
    pub due_row: u32,
    pub status_row: u32,
}

impl SummaryRows {
    /// Summary rows below a last total row
    pub fn below(last_total_row: u32, summary: &SummaryLayout) -> Self {
        Self {
            overtime_row: last_total_row + summary.overtime_offset,
            due_row: last_total_row + summary.due_offset,
            status_row: last_total_row + summary.status_offset,
        }
    }
}

/// Row layout after overflow insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPlan {
    /// Sections, top to bottom
    pub sections: Vec<SectionPlan>,
    /// Insertions in the order they must be applied
    pub insertions: Vec<Insertion>,
    pub summary: SummaryRows,
}

impl LayoutPlan {
    /// Plan for a company
    pub fn section(&self, company: HomeCompany) -> Option<&SectionPlan> {
        self.sections.iter().find(|s| s.company == company)
    }

    /// Total rows inserted
    pub fn inserted_rows(&self) -> u32 {
        self.insertions.iter().map(|i| i.count).sum()
    }
}

/// Where a template row ends up after the given insertions
pub fn map_row(row: u32, insertions: &[Insertion]) -> u32 {
    insertions
        .iter()
        .fold(row, |row, ins| if row >= ins.at { row + ins.count } else { row })
}

/// Plan final section rows for the number of employees per company
///
/// A section holding more employees than its template rows grows by the
/// overflow, inserted right after its last row; every later row moves down.
/// With insertion disabled an overflow is [`FillError::RosterCapacityExceeded`].
pub fn plan_layout(
    layout: &TemplateLayout,
    employees: impl Fn(HomeCompany) -> usize,
    allow_row_insertion: bool,
) -> FillResult<LayoutPlan> {
    layout.validate()?;

    let mut insertions: Vec<Insertion> = Vec::new();
    let mut sections = Vec::with_capacity(layout.sections.len());

    for section in &layout.sections {
        let mut rows: Vec<u32> = (section.first_row..=section.last_row)
            .map(|row| map_row(row, &insertions))
            .collect();

        let requested = employees(section.company);
        let capacity = rows.len();
        if requested > capacity {
            if !allow_row_insertion {
                return Err(FillError::RosterCapacityExceeded {
                    company: section.company,
                    capacity,
                    requested,
                });
            }
            let template_row = rows[capacity - 1];
            let insertion = Insertion {
                company: section.company,
                at: template_row + 1,
                count: (requested - capacity) as u32,
                template_row,
            };
            rows.extend(insertion.at..insertion.at + insertion.count);
            insertions.push(insertion);
        }

        let last_row = rows[rows.len() - 1];
        sections.push(SectionPlan {
            company: section.company,
            total_row: last_row + layout.total_offset,
            amount_row: last_row + layout.amount_offset,
            rows,
            direct_allocation: section.direct_allocation,
        });
    }

    let last_total_row = sections
        .iter()
        .map(|s| s.total_row)
        .max()
        .ok_or_else(|| FillError::InvalidLayout("no sections".into()))?;

    Ok(LayoutPlan {
        summary: SummaryRows::below(last_total_row, &layout.summary),
        sections,
        insertions,
    })
}

/// Insert and clone the planned overflow rows
pub fn apply_insertions(document: &mut Document, plan: &LayoutPlan) -> FillResult<()> {
    for insertion in &plan.insertions {
        log::debug!(
            "inserting {} rows for {} at row {}",
            insertion.count,
            insertion.company,
            insertion.at
        );
        document.shift_rows_from(insertion.at, i64::from(insertion.count))?;
        for offset in 0..insertion.count {
            document.clone_template_row(insertion.template_row, insertion.at + offset)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn counts(scanio: usize, storage: usize) -> impl Fn(HomeCompany) -> usize {
        move |company| match company {
            HomeCompany::ScanioMoving => scanio,
            HomeCompany::ScanioStorage => storage,
            _ => 0,
        }
    }

    #[test]
    fn test_plan_without_overflow() {
        let plan = plan_layout(&TemplateLayout::default(), counts(3, 7), true).unwrap();
        assert!(plan.insertions.is_empty());

        let storage = plan.section(HomeCompany::ScanioStorage).unwrap();
        assert_eq!(storage.rows, (33..=39).collect::<Vec<_>>());
        assert_eq!((storage.total_row, storage.amount_row), (40, 42));
        assert_eq!(
            plan.summary,
            SummaryRows {
                overtime_row: 91,
                due_row: 93,
                status_row: 101
            }
        );
    }

    #[test]
    fn test_plan_with_overflow() {
        let plan = plan_layout(&TemplateLayout::default(), counts(22, 9), true).unwrap();
        assert_eq!(
            plan.insertions,
            vec![
                Insertion {
                    company: HomeCompany::ScanioMoving,
                    at: 26,
                    count: 1,
                    template_row: 25
                },
                Insertion {
                    company: HomeCompany::ScanioStorage,
                    at: 41,
                    count: 2,
                    template_row: 40
                },
            ]
        );
        assert_eq!(plan.inserted_rows(), 3);

        let moving = plan.section(HomeCompany::ScanioMoving).unwrap();
        assert_eq!((moving.first_row(), moving.last_row(), moving.total_row), (5, 26, 27));

        let storage = plan.section(HomeCompany::ScanioStorage).unwrap();
        assert_eq!(storage.rows, (34..=42).collect::<Vec<_>>());
        assert_eq!(storage.amount_row, 45);

        let flat = plan.section(HomeCompany::FlatPrice).unwrap();
        assert_eq!((flat.first_row(), flat.total_row), (67, 89));
        assert_eq!(plan.summary.status_row, 104);
    }

    #[test]
    fn test_overflow_without_insertion() {
        let err = plan_layout(&TemplateLayout::default(), counts(0, 8), false).unwrap_err();
        assert!(matches!(
            err,
            FillError::RosterCapacityExceeded {
                company: HomeCompany::ScanioStorage,
                capacity: 7,
                requested: 8
            }
        ));
    }

    #[test]
    fn test_map_row() {
        let insertions = [
            Insertion {
                company: HomeCompany::ScanioMoving,
                at: 26,
                count: 2,
                template_row: 25,
            },
            Insertion {
                company: HomeCompany::FlatPrice,
                at: 90,
                count: 1,
                template_row: 89,
            },
        ];
        assert_eq!(map_row(25, &insertions), 25);
        assert_eq!(map_row(26, &insertions), 28);
        assert_eq!(map_row(88, &insertions), 91);
        assert_eq!(map_row(1, &[]), 1);
    }
}
