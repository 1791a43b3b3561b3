//! Derived formulas
//!
//! Every formula here is built from planned row numbers, so it must be
//! written after overflow insertion.
//!
//! Employee row columns:
//!
//! | col | content |
//! |---|---|
//! | B | name |
//! | C | hourly rate |
//! | D | total hours |
//! | E | gross pay (1.5x past 40 hours) |
//! | F | overtime premium |
//! | G | total commission |
//! | H, I, J | commission for Scanio, Sea & Air, Flat Price |
//! | K, M, O | hours for Scanio, Sea & Air, Flat Price |
//! | L, N, P | share of hours per company |
//! | Q | company-attributed hours |

use payroll_sheets_core::{format_decimal, BilledCompany};
use payroll_sheets_xlsx::{Document, FormulaResult};

use crate::error::FillResult;
use crate::layout::{LayoutPlan, SectionPlan};

pub const LEAD_COLUMN: &str = "A";
pub const NAME_COLUMN: &str = "B";
pub const RATE_COLUMN: &str = "C";
pub const OVERTIME_COLUMN: &str = "F";
pub const COMMISSION_TOTAL_COLUMN: &str = "G";
pub const ATTRIBUTED_HOURS_COLUMN: &str = "Q";
pub const BALANCE_COLUMN: &str = "C";
pub const STATUS_COLUMN: &str = "B";

/// Hours column for a billed company
pub fn hours_column(company: BilledCompany) -> &'static str {
    match company {
        BilledCompany::Scanio => "K",
        BilledCompany::SeaAndAir => "M",
        BilledCompany::FlatPrice => "O",
    }
}

/// Commission column for a billed company
pub fn commission_column(company: BilledCompany) -> &'static str {
    match company {
        BilledCompany::Scanio => "H",
        BilledCompany::SeaAndAir => "I",
        BilledCompany::FlatPrice => "J",
    }
}

/// Hour share column for a billed company
pub fn share_column(company: BilledCompany) -> &'static str {
    match company {
        BilledCompany::Scanio => "L",
        BilledCompany::SeaAndAir => "N",
        BilledCompany::FlatPrice => "P",
    }
}

/// Company pairs with a net balance cell, in row order below the due row
pub const BALANCE_PAIRS: [(BilledCompany, BilledCompany); 3] = [
    (BilledCompany::Scanio, BilledCompany::SeaAndAir),
    (BilledCompany::Scanio, BilledCompany::FlatPrice),
    (BilledCompany::SeaAndAir, BilledCompany::FlatPrice),
];

/// A formula to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaCell {
    pub row: u32,
    pub column: &'static str,
    pub expression: String,
    pub result: FormulaResult,
}

impl FormulaCell {
    fn number(row: u32, column: &'static str, expression: String) -> Self {
        Self {
            row,
            column,
            expression,
            result: FormulaResult::Number,
        }
    }
}

/// Per-employee formulas for row `r`
pub fn employee_row_formulas(r: u32) -> Vec<FormulaCell> {
    vec![
        FormulaCell::number(r, "D", format!("SUM(K{r}:O{r})")),
        FormulaCell::number(
            r,
            "E",
            format!("IF(D{r}>40,(D{r}-40)*(C{r}*1.5)+(C{r}*40),D{r}*C{r})"),
        ),
        FormulaCell::number(r, "F", format!("IF(D{r}>40,(D{r}-40)*(C{r}*0.5),0)")),
        FormulaCell::number(r, "G", format!("SUM(H{r}:J{r})")),
        FormulaCell::number(r, "L", format!("IFERROR(K{r}/Q{r},0)")),
        FormulaCell::number(r, "N", format!("IFERROR(M{r}/Q{r},0)")),
        FormulaCell::number(r, "P", format!("IFERROR(O{r}/Q{r},0)")),
        FormulaCell::number(r, "Q", format!("K{r}+M{r}+O{r}")),
    ]
}

/// Total-row and derived-amount-row formulas for one section
pub fn section_formulas(section: &SectionPlan, burden: f64) -> Vec<FormulaCell> {
    let (s, e) = (section.first_row(), section.last_row());
    let t = section.total_row;
    let a = section.amount_row;
    let b = format_decimal(burden);

    let mut cells: Vec<FormulaCell> = ["D", "E", "F", "G", "H", "I", "J", "K", "M", "O", "Q"]
        .into_iter()
        .map(|col| FormulaCell::number(t, col, format!("SUM({col}{s}:{col}{e})")))
        .collect();

    for company in BilledCompany::ALL {
        let hours = hours_column(company);
        cells.push(FormulaCell::number(
            t,
            share_column(company),
            format!("IFERROR({hours}{t}/Q{t},0)"),
        ));
    }

    cells.push(FormulaCell::number(a, "E", format!("E{t}+G{t}")));
    cells.push(FormulaCell::number(a, "G", format!("SUM(H{a}:J{a})/{b}")));
    for company in BilledCompany::ALL {
        let col = commission_column(company);
        cells.push(FormulaCell::number(a, col, format!("{col}{t}*{b}")));
    }
    for company in BilledCompany::ALL {
        let share = share_column(company);
        let expression = if section.direct_allocation {
            format!("E{t}*{share}{t}*{b}")
        } else {
            format!("SUMPRODUCT(E{s}:E{e},{share}{s}:{share}{e})*{b}")
        };
        cells.push(FormulaCell::number(a, hours_column(company), expression));
    }
    cells.push(FormulaCell::number(a, "Q", format!("(K{a}+M{a}+O{a})/{b}")));
    cells.push(FormulaCell::number(a + 1, "E", format!("G{a}+Q{a}")));

    cells
}

/// What `payer` covered for `payee`: the payer's hour and commission costs
/// booked in every section homed at the payee
fn covered_terms(plan: &LayoutPlan, payer: BilledCompany, payee: BilledCompany) -> Vec<String> {
    plan.sections
        .iter()
        .filter(|section| section.company.billed() == payee)
        .flat_map(|section| {
            let a = section.amount_row;
            [
                format!("{}{a}", hours_column(payer)),
                format!("{}{a}", commission_column(payer)),
            ]
        })
        .collect()
}

/// Net amount `a` owes `b`
fn balance_expression(plan: &LayoutPlan, a: BilledCompany, b: BilledCompany) -> String {
    let mut expression = covered_terms(plan, a, b).join("+");
    for term in covered_terms(plan, b, a) {
        expression.push('-');
        expression.push_str(&term);
    }
    if expression.is_empty() {
        expression.push('0');
    }
    expression
}

/// Three-way label for the Scanio / Sea & Air balance in `C{due_row}`
pub fn status_formula(due_row: u32) -> String {
    format!(
        "IF({BALANCE_COLUMN}{due_row}=0,\"No Scanio/SeaAir Reimbursement\",\
         IF({BALANCE_COLUMN}{due_row}>0,\"Scanio Owes Sea & Air\",\"Sea & Air Owes Scanio\"))"
    )
}

/// `col` at one row of every section, added up
fn sum_across(plan: &LayoutPlan, col: &str, row: impl Fn(&SectionPlan) -> u32) -> String {
    plan.sections
        .iter()
        .map(|section| format!("{col}{}", row(section)))
        .collect::<Vec<_>>()
        .join("+")
}

/// Grand totals, the cross-company balances and the status label
pub fn summary_formulas(plan: &LayoutPlan) -> Vec<FormulaCell> {
    let rows = plan.summary;

    let mut cells = vec![
        FormulaCell::number(
            rows.overtime_row,
            OVERTIME_COLUMN,
            sum_across(plan, OVERTIME_COLUMN, |s| s.total_row),
        ),
        FormulaCell::number(
            rows.due_row,
            ATTRIBUTED_HOURS_COLUMN,
            sum_across(plan, ATTRIBUTED_HOURS_COLUMN, |s| s.total_row),
        ),
        FormulaCell::number(
            rows.status_row,
            OVERTIME_COLUMN,
            sum_across(plan, COMMISSION_TOTAL_COLUMN, |s| s.amount_row),
        ),
    ];

    for (offset, (a, b)) in (0u32..).zip(BALANCE_PAIRS) {
        cells.push(FormulaCell::number(
            rows.due_row + offset,
            BALANCE_COLUMN,
            balance_expression(plan, a, b),
        ));
    }

    cells.push(status_cell(rows.status_row, rows.due_row));
    cells
}

/// The status label formula
pub fn status_cell(status_row: u32, due_row: u32) -> FormulaCell {
    FormulaCell {
        row: status_row,
        column: STATUS_COLUMN,
        expression: status_formula(due_row),
        result: FormulaResult::Text,
    }
}

/// Write formula cells into the document
pub fn write_formulas(document: &mut Document, cells: &[FormulaCell]) -> FillResult<()> {
    for cell in cells {
        document.set_formula(cell.row, cell.column, &cell.expression, cell.result)?;
    }
    Ok(())
}
