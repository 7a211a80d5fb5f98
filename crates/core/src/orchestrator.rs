//! End-to-end merge: append, resolve, rewrite, recalculate, extract.

use finmerge_sheet::{to_a1_notation, Book, CellValue};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::append::{RowAppender, RowSpan};
use crate::config::{FormatOverridePlan, LayoutPlan, SheetRole, TemplateLayout};
use crate::dataset::Dataset;
use crate::display::{extract, SheetDisplay};
use crate::error::MergeResult;
use crate::extent::{ExtentMap, ExtentResolver};
use crate::locate::{GapScanLocator, InsertionStrategy};
use crate::recalc::Recalculator;
use crate::rewrite::{FormulaRangeRewriter, FormulaUpdate, RewriteSummary};
use crate::template::{require_sheets, Template};

/// Input datasets keyed by role. A role without a dataset is merged as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datasets(IndexMap<SheetRole, Dataset>);

impl Datasets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, role: SheetRole, dataset: Dataset) -> Option<Dataset> {
        self.0.insert(role, dataset)
    }

    #[must_use]
    pub fn with(mut self, role: SheetRole, dataset: Dataset) -> Self {
        self.0.insert(role, dataset);
        self
    }

    pub fn get(&self, role: SheetRole) -> Option<&Dataset> {
        self.0.get(&role)
    }
}

impl FromIterator<(SheetRole, Dataset)> for Datasets {
    fn from_iter<I: IntoIterator<Item = (SheetRole, Dataset)>>(iter: I) -> Self {
        Datasets(iter.into_iter().collect())
    }
}

/// A working copy after the write path, before recalculation.
#[derive(Debug, Clone)]
pub struct PreparedMerge {
    pub workbook: Book,
    /// Rows written per sheet, `None` for an empty dataset.
    pub appended: IndexMap<String, Option<RowSpan>>,
    pub extents: ExtentMap,
    pub rewrites: RewriteSummary,
}

/// Serializable result of a merge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeReport {
    pub sheets: IndexMap<String, SheetDisplay>,
    pub extents: ExtentMap,
    pub formulas_updated: Vec<FormulaUpdate>,
}

/// Report plus the recalculated workbook.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub report: MergeReport,
    pub workbook: Book,
}

/// Runs merges against one template and layout.
///
/// Holds no per-merge state: every call to [`MergeOrchestrator::merge`]
/// works on a fresh copy of the template.
pub struct MergeOrchestrator {
    template: Template,
    plan: LayoutPlan,
    locator: Box<dyn InsertionStrategy>,
    appender: RowAppender,
    resolver: ExtentResolver,
    rewriter: FormulaRangeRewriter,
    recalculator: Box<dyn Recalculator>,
}

impl MergeOrchestrator {
    /// Validate `layout` and build an orchestrator. Fails before any merge
    /// when the layout is malformed.
    pub fn new<R>(template: Template, layout: &TemplateLayout, recalculator: R) -> MergeResult<Self>
    where
        R: Recalculator + 'static,
    {
        let plan = layout.validate()?;
        let rewriter = FormulaRangeRewriter::new(&plan.lookup_functions)?;
        Ok(MergeOrchestrator {
            template,
            appender: RowAppender::new(plan.max_columns),
            plan,
            locator: Box::new(GapScanLocator::default()),
            resolver: ExtentResolver::default(),
            rewriter,
            recalculator: Box::new(recalculator),
        })
    }

    /// Replace the insertion-point heuristic.
    #[must_use]
    pub fn with_locator<L>(mut self, locator: L) -> Self
    where
        L: InsertionStrategy + 'static,
    {
        self.locator = Box::new(locator);
        self
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn plan(&self) -> &LayoutPlan {
        &self.plan
    }

    /// Write path only: append every dataset, resolve extents, rewrite
    /// lookup formulas and apply number-format overrides.
    pub fn prepare(&self, datasets: &Datasets) -> MergeResult<PreparedMerge> {
        let mut workbook = self.template.working_copy();
        require_sheets(&workbook)?;

        let empty = Dataset::default();
        let mut appended = IndexMap::new();
        for sheet_plan in &self.plan.sheets {
            let _span = info_span!("append", sheet = sheet_plan.name).entered();
            let dataset = datasets.get(sheet_plan.role).unwrap_or(&empty);
            let sheet = workbook.get_sheet_mut(sheet_plan.name)?;

            let written = if dataset.is_empty() {
                self.appender.append(sheet, dataset, sheet_plan.append_start)
            } else {
                let insert_row = self.locator.insertion_row(sheet, sheet_plan.append_start);
                info!(row = insert_row, "determined append start row");
                self.appender.append(sheet, dataset, insert_row)
            };
            appended.insert(sheet_plan.name.to_string(), written);
        }

        let mut extents = ExtentMap::new();
        for sheet_plan in &self.plan.sheets {
            let sheet = workbook.get_sheet(sheet_plan.name)?;
            let written = appended.get(sheet_plan.name).copied().flatten();
            let extent = self.resolver.resolve(sheet, sheet_plan.append_start, written);
            extents.insert(sheet_plan.name.to_string(), extent);
        }

        let mut rewrites = RewriteSummary::default();
        for sheet_plan in &self.plan.sheets {
            let sheet = workbook.get_sheet_mut(sheet_plan.name)?;
            rewrites.merge(
                self.rewriter
                    .rewrite_region(sheet, sheet_plan.formula_region, &extents),
            );
        }
        info!(
            updated = rewrites.updates.len(),
            skipped = rewrites.skipped,
            "formula update finished"
        );

        for format_override in &self.plan.format_overrides {
            apply_format_override(&mut workbook, format_override);
        }

        Ok(PreparedMerge {
            workbook,
            appended,
            extents,
            rewrites,
        })
    }

    /// Full merge. Either every step succeeds or a single error is returned;
    /// a failed recalculation is never retried.
    pub fn merge(&self, datasets: &Datasets) -> MergeResult<MergeOutcome> {
        let prepared = self.prepare(datasets)?;
        let workbook = self.recalculator.recalculate(prepared.workbook)?;

        let sheets = self
            .plan
            .sheets
            .iter()
            .map(|sheet_plan| {
                (
                    sheet_plan.name.to_string(),
                    extract(&workbook, sheet_plan.name, &sheet_plan.display),
                )
            })
            .collect();

        Ok(MergeOutcome {
            report: MergeReport {
                sheets,
                extents: prepared.extents,
                formulas_updated: prepared.rewrites.updates,
            },
            workbook,
        })
    }
}

/// Set the override's number format on literal numbers in its region.
/// Formula cells keep their format whatever their cached result.
fn apply_format_override(workbook: &mut Book, format_override: &FormatOverridePlan) {
    let Ok(sheet) = workbook.get_sheet_mut(&format_override.sheet) else {
        warn!(
            sheet = %format_override.sheet,
            "sheet not found for number format override"
        );
        return;
    };

    let cells = sheet.clip(&format_override.cells);
    if cells.is_empty() {
        return;
    }
    let mut formatted = 0;
    for row in cells.first_row..=cells.last_row {
        for col in cells.first_col..=cells.last_col {
            if !matches!(sheet.value(row, col), CellValue::Int(_) | CellValue::Float(_)) {
                continue;
            }
            match sheet.cell_mut(row, col) {
                Ok(cell) => {
                    cell.style.number_format = format_override.format.clone();
                    formatted += 1;
                }
                Err(err) => warn!(
                    sheet = %format_override.sheet,
                    cell = %to_a1_notation(row, col),
                    %err,
                    "could not apply number format"
                ),
            }
        }
    }
    info!(
        sheet = %format_override.sheet,
        range = %format_override.cells,
        format = format_override.format.code(),
        cells = formatted,
        "applied number format override"
    );
}
