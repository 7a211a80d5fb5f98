//! # finmerge-cli
//!
//! Command-line interface for merging statement datasets into a template.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use finmerge_core::{
    Dataset, Datasets, LibreOfficeRecalculator, MergeOrchestrator, MergeReport, SheetDisplay,
    SheetRole, Template, TemplateLayout,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// finmerge - fill a financial statement template from CSV datasets
#[derive(Parser)]
#[command(name = "finmerge")]
#[command(author, version, about = "Financial statement template merge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Append datasets, rewrite lookup ranges, recalculate and print the result
    Merge {
        /// Template workbook (.xlsx)
        #[arg(short, long, value_name = "FILE")]
        template: PathBuf,

        /// Income statement CSV
        #[arg(long, value_name = "FILE")]
        income: Option<PathBuf>,

        /// Balance sheet CSV
        #[arg(long, value_name = "FILE")]
        balance: Option<PathBuf>,

        /// Cash flow statement CSV
        #[arg(long, value_name = "FILE")]
        cashflow: Option<PathBuf>,

        /// Layout file (.yaml, .yml or .json); defaults to the built-in layout
        #[arg(short, long, value_name = "FILE")]
        layout: Option<PathBuf>,

        /// LibreOffice executable used for recalculation
        #[arg(long, value_name = "PATH", default_value = "soffice")]
        soffice: PathBuf,

        /// Write the recalculated workbook here
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: ReportFormat,
    },

    /// Validate a template and layout without merging
    Check {
        /// Template workbook (.xlsx)
        #[arg(short, long, value_name = "FILE")]
        template: PathBuf,

        /// Layout file (.yaml, .yml or .json)
        #[arg(short, long, value_name = "FILE")]
        layout: Option<PathBuf>,
    },

    /// Print the built-in layout
    Layout {
        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: LayoutFormat,
    },
}

/// Output format for merge reports.
#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum ReportFormat {
    /// JSON output
    Json,
    /// Pretty table output (default)
    #[default]
    Table,
}

/// Output format for layouts.
#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum LayoutFormat {
    #[default]
    Yaml,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Command::Merge {
            template,
            income,
            balance,
            cashflow,
            layout,
            soffice,
            output,
            format,
        } => {
            let inputs = [
                (SheetRole::Income, income),
                (SheetRole::Balance, balance),
                (SheetRole::Cashflow, cashflow),
            ];
            let datasets = load_datasets(&inputs)?;
            let layout = load_layout(layout.as_deref())?;
            let template = load_template(&template)?;

            let orchestrator =
                MergeOrchestrator::new(template, &layout, LibreOfficeRecalculator::new(soffice))
                    .context("Invalid layout")?;
            let outcome = orchestrator.merge(&datasets).context("Merge failed")?;

            if let Some(path) = output {
                outcome
                    .workbook
                    .save_as_xlsx(&path)
                    .with_context(|| format!("Failed to write workbook: {}", path.display()))?;
                info!(path = %path.display(), "saved merged workbook");
            }

            print_report(&outcome.report, format)
        }
        Command::Check { template, layout } => {
            let layout = load_layout(layout.as_deref())?;
            let plan = layout.validate().context("Invalid layout")?;
            let template = load_template(&template)?;

            println!("{} {}", "Template OK:".green().bold(), template_label(&template));
            for sheet in &plan.sheets {
                println!(
                    "  {} append from row {}, formulas in {}, display {}",
                    sheet.name.cyan(),
                    sheet.append_start,
                    sheet.formula_region,
                    sheet.display.window
                );
            }
            Ok(())
        }
        Command::Layout { format } => {
            let layout = TemplateLayout::default();
            let text = match format {
                LayoutFormat::Yaml => layout.to_yaml_string()?,
                LayoutFormat::Json => layout.to_json_string()?,
            };
            println!("{}", text.trim_end());
            Ok(())
        }
    }
}

/// Read and clean every dataset that was given; missing roles stay empty.
fn load_datasets(inputs: &[(SheetRole, Option<PathBuf>)]) -> Result<Datasets> {
    let mut datasets = Datasets::new();
    for (role, path) in inputs {
        let Some(path) = path else { continue };
        let dataset = Dataset::from_csv_path(path)
            .with_context(|| format!("Failed to read {role} dataset: {}", path.display()))?
            .clean();
        datasets.insert(*role, dataset);
    }
    Ok(datasets)
}

fn load_layout(path: Option<&Path>) -> Result<TemplateLayout> {
    match path {
        Some(path) => TemplateLayout::from_path(path)
            .with_context(|| format!("Failed to load layout: {}", path.display())),
        None => Ok(TemplateLayout::default()),
    }
}

fn load_template(path: &Path) -> Result<Template> {
    Template::from_path(path)
        .with_context(|| format!("Failed to load template: {}", path.display()))
}

fn template_label(template: &Template) -> String {
    let names = template.book().sheet_names().join(", ");
    match template.source() {
        Some(path) => format!("{} [{names}]", path.display()),
        None => format!("[{names}]"),
    }
}

/// Print a merge report in the specified format.
fn print_report(report: &MergeReport, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        ReportFormat::Table => {
            for (name, display) in &report.sheets {
                let extent = report
                    .extents
                    .get(name)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                println!("{} ({})", name.cyan().bold(), extent.dimmed());
                print_table(display);
                println!();
            }
            if !report.formulas_updated.is_empty() {
                println!("{}", "Formulas updated:".yellow().bold());
                for update in &report.formulas_updated {
                    println!(
                        "  {}!{}: {} -> {}",
                        update.sheet, update.cell, update.before, update.after
                    );
                }
            }
        }
    }
    Ok(())
}

fn print_table(display: &SheetDisplay) {
    if display.headers.is_empty() && display.rows.is_empty() {
        println!("(empty)");
        return;
    }

    let columns = display
        .rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(display.headers.len()))
        .max()
        .unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in std::iter::once(&display.headers).chain(&display.rows) {
        for (idx, text) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(text.chars().count());
        }
    }

    println!("{}", format_row(&display.headers, &widths).bold());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    println!("{}", rule.join("-+-"));
    for row in &display.rows {
        println!("{}", format_row(row, &widths));
    }
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    widths
        .iter()
        .enumerate()
        .map(|(idx, width)| {
            let text = cells.get(idx).map_or("", String::as_str);
            format!("{text:<width$}")
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_row_pads_missing_cells() {
        let row = vec!["Revenue".to_string(), "1,000.00".to_string()];
        assert_eq!(format_row(&row, &[8, 8, 4]), "Revenue  | 1,000.00 |     ");
    }

    #[test]
    fn test_cli_parses_merge() {
        let cli = Cli::try_parse_from([
            "finmerge",
            "merge",
            "--template",
            "template.xlsx",
            "--income",
            "income.csv",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Command::Merge {
                template,
                income,
                balance,
                soffice,
                ..
            } => {
                assert_eq!(template, PathBuf::from("template.xlsx"));
                assert_eq!(income, Some(PathBuf::from("income.csv")));
                assert!(balance.is_none());
                assert_eq!(soffice, PathBuf::from("soffice"));
            }
            _ => panic!("expected merge"),
        }
    }

    #[test]
    fn test_missing_dataset_file_is_reported() {
        let inputs = [(SheetRole::Income, Some(PathBuf::from("/nonexistent/income.csv")))];
        let err = load_datasets(&inputs).unwrap_err();
        assert!(err.to_string().contains("income dataset"));
    }
}
