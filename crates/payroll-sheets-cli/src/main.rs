//! payfill - fill weekly payroll workbooks from timecard and tip reports

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use payroll_sheets::prelude::*;
use payroll_sheets::{roster_from_workbook, roster_to_json, write_details, write_summary, TimecardTotals};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "payfill")]
#[command(author, version, about = "Payroll workbook filling tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a template workbook from a simplified hours CSV
    Fill {
        /// Template workbook (xlsx)
        template: PathBuf,

        /// Hours CSV (`Name,Company,Hours at Company`)
        hours: PathBuf,

        #[command(flatten)]
        fill: FillArgs,
    },

    /// Flatten a batch timecard report into a simplified hours CSV
    Simplify {
        /// Batch timecard report CSV
        batch: PathBuf,

        /// Output CSV (default: <batch>_simple_reg.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Leave out WEEKLY OVERTIME adjustment rows
        #[arg(long)]
        exclude_weekly_overtime: bool,
    },

    /// Simplify a batch timecard report, then fill the template with it
    Pipeline {
        /// Template workbook (xlsx)
        template: PathBuf,

        /// Batch timecard report CSV
        batch: PathBuf,

        /// Tip report CSV
        tips: PathBuf,

        /// Simplified hours CSV (default: <batch>_simple_reg.csv)
        #[arg(long)]
        hours_output: Option<PathBuf>,

        /// Leave out WEEKLY OVERTIME adjustment rows
        #[arg(long)]
        exclude_weekly_overtime: bool,

        #[command(flatten)]
        fill: FillArgs,
    },

    /// Calculate pay and company cost allocation without a workbook
    Calc {
        /// Hours CSV (`Name,Company,Hours at Company`)
        hours: PathBuf,

        /// Roster JSON, created from --seed-workbook when missing
        #[arg(long, default_value = "payroll_roster.json")]
        roster: PathBuf,

        /// Workbook to read the roster from when the roster file is missing
        #[arg(long)]
        seed_workbook: Option<PathBuf>,

        /// Employee details CSV (default: <hours>_payroll_details.csv)
        #[arg(long)]
        details_output: Option<PathBuf>,

        /// Company summary CSV (default: <hours>_payroll_summary.csv)
        #[arg(long)]
        summary_output: Option<PathBuf>,
    },

    /// List worksheet names
    Sheets {
        /// Workbook (xlsx)
        workbook: PathBuf,
    },

    /// Print or save the roster found in a filled workbook
    Roster {
        /// Workbook (xlsx)
        template: PathBuf,

        /// Output roster JSON (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worksheet name (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,
    },
}

#[derive(Args)]
struct FillArgs {
    /// Tip report CSV
    #[arg(long)]
    tips: Option<PathBuf>,

    /// Roster JSON; without it, employees are read from the template
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Template layout JSON (default: the standard payroll template)
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Output workbook (default: <template>_filled.xlsx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Tip summary CSV (default: <tips>_simple.csv)
    #[arg(long)]
    tip_summary: Option<PathBuf>,

    /// Worksheet name (default: first sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// Fail instead of inserting rows when a section is full
    #[arg(long)]
    no_insert: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fill {
            template,
            hours,
            fill: args,
        } => fill(&template, &hours, &args),
        Commands::Simplify {
            batch,
            output,
            exclude_weekly_overtime,
        } => {
            let output = output.unwrap_or_else(|| simple_hours_path(&batch, exclude_weekly_overtime));
            simplify(&batch, &output, exclude_weekly_overtime).map(|_| ())
        }
        Commands::Pipeline {
            template,
            batch,
            tips,
            hours_output,
            exclude_weekly_overtime,
            fill: mut args,
        } => {
            let hours = hours_output.unwrap_or_else(|| simple_hours_path(&batch, exclude_weekly_overtime));
            simplify(&batch, &hours, exclude_weekly_overtime)?;
            args.tips = Some(tips);
            fill(&template, &hours, &args)
        }
        Commands::Calc {
            hours,
            roster,
            seed_workbook,
            details_output,
            summary_output,
        } => {
            let details = details_output.unwrap_or_else(|| sibling(&hours, "_payroll_details.csv"));
            let summary = summary_output.unwrap_or_else(|| sibling(&hours, "_payroll_summary.csv"));
            calc(&hours, &roster, seed_workbook.as_deref(), &details, &summary)
        }
        Commands::Sheets { workbook } => list_sheets(&workbook),
        Commands::Roster {
            template,
            output,
            sheet,
        } => roster(&template, output.as_deref(), sheet.as_deref()),
    }
}

/// `dir/stem<suffix>` next to `path`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}{suffix}"))
}

fn simple_hours_path(batch: &Path, exclude_weekly_overtime: bool) -> PathBuf {
    if exclude_weekly_overtime {
        sibling(batch, "_simple.csv")
    } else {
        sibling(batch, "_simple_reg.csv")
    }
}

fn simplify(batch: &Path, output: &Path, exclude_weekly_overtime: bool) -> Result<TimecardTotals> {
    let timecard = TimecardOptions {
        include_weekly_overtime: !exclude_weekly_overtime,
    };
    let totals = TimecardReader::read_file(batch, &CsvReadOptions::default(), &timecard)
        .with_context(|| format!("Failed to read '{}'", batch.display()))?;

    CsvWriter::write_hours_file(&totals, output, &CsvWriteOptions::default())
        .with_context(|| format!("Failed to write '{}'", output.display()))?;

    eprintln!(
        "Wrote {} lines for {} employees to '{}'",
        totals.len(),
        totals.names().len(),
        output.display()
    );
    Ok(totals)
}

fn fill(template: &Path, hours_path: &Path, args: &FillArgs) -> Result<()> {
    let mut options = FillOptions {
        sheet: args.sheet.clone(),
        allow_row_insertion: !args.no_insert,
        ..Default::default()
    };
    if let Some(path) = &args.layout {
        options.layout = TemplateLayout::from_json_file(path)
            .with_context(|| format!("Failed to load layout '{}'", path.display()))?;
    }

    let read_options = CsvReadOptions::default();
    let hours = HoursReader::read_file(hours_path, &read_options)
        .with_context(|| format!("Failed to read '{}'", hours_path.display()))?;
    let tips = match &args.tips {
        Some(path) => Some(
            TipReader::read_file(path, &read_options)
                .with_context(|| format!("Failed to read '{}'", path.display()))?,
        ),
        None => None,
    };
    let roster = match &args.roster {
        Some(path) => Some(
            load_roster(path, &options.burden)
                .with_context(|| format!("Failed to load roster '{}'", path.display()))?,
        ),
        None => None,
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| sibling(template, "_filled.xlsx"));
    let input = FillInput {
        hours: &hours,
        tips: tips.as_ref(),
        roster: roster.as_deref(),
    };
    let report = fill_workbook(template, &output, &input, &options)
        .with_context(|| format!("Failed to fill '{}'", template.display()))?;

    println!("Wrote '{}' ({})", output.display(), report.sheet_name);
    println!("  Employees: {}", report.employees.len());
    println!(
        "  Hours matched: {} of {}",
        report.matched_hours.len(),
        report.matched_hours.len() + report.unmatched_hour_names.len()
    );
    if tips.is_some() {
        println!(
            "  Tips matched: {} of {}",
            report.matched_tips.len(),
            report.matched_tips.len() + report.unmatched_tip_names.len()
        );
    }
    if report.inserted_rows() > 0 {
        println!("  Rows inserted: {}", report.inserted_rows());
    }
    for diagnostic in &report.diagnostics {
        eprintln!("Warning: {}", diagnostic);
    }

    if let Some(tips_path) = &args.tips {
        let summary_path = args
            .tip_summary
            .clone()
            .unwrap_or_else(|| sibling(tips_path, "_simple.csv"));
        CsvWriter::write_tip_summary_file(&report.tip_summary, &summary_path, &CsvWriteOptions::default())
            .with_context(|| format!("Failed to write '{}'", summary_path.display()))?;
        println!("Wrote tip summary '{}'", summary_path.display());
    }

    Ok(())
}

fn calc(
    hours_path: &Path,
    roster_path: &Path,
    seed_workbook: Option<&Path>,
    details: &Path,
    summary: &Path,
) -> Result<()> {
    let burden = BurdenTable::default();
    let roster = if roster_path.exists() {
        load_roster(roster_path, &burden)
            .with_context(|| format!("Failed to load roster '{}'", roster_path.display()))?
    } else {
        let workbook = seed_workbook.with_context(|| {
            format!(
                "Roster '{}' not found; pass --seed-workbook to create it",
                roster_path.display()
            )
        })?;
        let roster = roster_from_workbook(workbook, None, &burden)
            .with_context(|| format!("Failed to read roster from '{}'", workbook.display()))?;
        write_roster(roster_path, &roster)
            .with_context(|| format!("Failed to write '{}'", roster_path.display()))?;
        eprintln!("Seeded {} roster entries into '{}'", roster.len(), roster_path.display());
        roster
    };

    let hours = HoursReader::read_file(hours_path, &CsvReadOptions::default())
        .with_context(|| format!("Failed to read '{}'", hours_path.display()))?;
    let calculation = calculate_payroll(&hours, &roster);

    let options = CsvWriteOptions::default();
    write_details(details, &calculation.employees, &options)
        .with_context(|| format!("Failed to write '{}'", details.display()))?;
    write_summary(summary, &calculation.summary, &options)
        .with_context(|| format!("Failed to write '{}'", summary.display()))?;

    println!("Wrote '{}' ({} employees)", details.display(), calculation.employees.len());
    println!("Wrote '{}'", summary.display());
    for diagnostic in &calculation.diagnostics {
        eprintln!("Warning: {}", diagnostic);
    }

    Ok(())
}

fn list_sheets(workbook: &Path) -> Result<()> {
    let document = Document::open_file(workbook, None)
        .with_context(|| format!("Failed to open '{}'", workbook.display()))?;
    let names = document
        .sheet_names()
        .with_context(|| format!("Failed to read sheets of '{}'", workbook.display()))?;

    for (i, name) in names.iter().enumerate() {
        println!("{}\t{}", i, name);
    }

    Ok(())
}

fn roster(workbook: &Path, output: Option<&Path>, sheet: Option<&str>) -> Result<()> {
    let burden = BurdenTable::default();
    let roster = roster_from_workbook(workbook, sheet, &burden)
        .with_context(|| format!("Failed to read roster from '{}'", workbook.display()))?;

    match output {
        Some(path) => {
            write_roster(path, &roster)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            eprintln!("Wrote {} roster entries to '{}'", roster.len(), path.display());
        }
        None => {
            let mut json = roster_to_json(&roster)?;
            json.push('\n');
            io::stdout()
                .write_all(json.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }

    Ok(())
}
