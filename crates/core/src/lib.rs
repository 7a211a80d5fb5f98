//! # finmerge-core
//!
//! Merges income statement, balance sheet and cash-flow datasets into a
//! fixed-layout financial statement template.
//!
//! This crate provides:
//! - Dataset ingestion and per-cell value coercion
//! - Insertion point detection inside partially filled sheets
//! - Data extent resolution and lookup-formula range rewriting
//! - External recalculation and display window extraction
//! - The [`MergeOrchestrator`] sequencing all of the above
//!
//! ```no_run
//! use finmerge_core::{
//!     Dataset, Datasets, LibreOfficeRecalculator, MergeOrchestrator, SheetRole, Template,
//!     TemplateLayout,
//! };
//!
//! # fn main() -> finmerge_core::MergeResult<()> {
//! let template = Template::from_path("template.xlsx")?;
//! let orchestrator = MergeOrchestrator::new(
//!     template,
//!     &TemplateLayout::default(),
//!     LibreOfficeRecalculator::default(),
//! )?;
//!
//! let datasets = Datasets::new()
//!     .with(SheetRole::Income, Dataset::from_csv_path("income.csv")?.clean())
//!     .with(SheetRole::Balance, Dataset::from_csv_path("balance.csv")?.clean())
//!     .with(SheetRole::Cashflow, Dataset::from_csv_path("cashflow.csv")?.clean());
//!
//! let outcome = orchestrator.merge(&datasets)?;
//! for (sheet, display) in &outcome.report.sheets {
//!     println!("{sheet}: {} rows", display.rows.len());
//! }
//! # Ok(())
//! # }
//! ```

/// Raw value to cell value conversion.
pub mod coerce;
/// Template layout configuration.
pub mod config;
/// Tabular input datasets.
pub mod dataset;
/// Display window extraction.
pub mod display;
/// Error types and result aliases.
pub mod error;
/// Data extent resolution.
pub mod extent;
/// Insertion point heuristics.
pub mod locate;
/// Merge sequencing.
pub mod orchestrator;
/// External recalculation.
pub mod recalc;
/// Lookup formula range rewriting.
pub mod rewrite;
/// Immutable template handle.
pub mod template;

mod append;

pub use append::{RowAppender, RowSpan, WRITE_ERROR_SENTINEL};
pub use coerce::{coerce, Coerced};
pub use config::{
    FormatOverridePlan, LayoutPlan, NumberFormatOverride, SheetLayout, SheetPlan, SheetRole,
    TemplateLayout, REQUIRED_SHEETS,
};
pub use dataset::{Dataset, RawValue};
pub use display::{extract, format_cell, format_number, DisplaySpec, SheetDisplay};
pub use error::{MergeError, MergeResult};
pub use extent::{DataExtent, ExtentMap, ExtentResolver};
pub use locate::{GapScanLocator, InsertionStrategy};
pub use orchestrator::{Datasets, MergeOrchestrator, MergeOutcome, MergeReport, PreparedMerge};
pub use recalc::{LibreOfficeRecalculator, Recalculator};
pub use rewrite::{FormulaRangeRewriter, FormulaUpdate, RangeReference, RewriteSummary, SheetQualifier};
pub use template::{require_sheets, Template};
