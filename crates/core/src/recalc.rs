//! External formula recalculation.
//!
//! The engine never evaluates formulas itself. After rewriting, the working
//! copy goes through a [`Recalculator`], which must either return the book
//! with fresh formula results or fail the whole merge.

use std::path::{Path, PathBuf};
use std::process::Command;

use finmerge_sheet::{Book, CellValue};
use tracing::{debug, error, info};

use crate::error::{MergeError, MergeResult};

/// Recalculates every formula of a book.
pub trait Recalculator: Send + Sync {
    fn recalculate(&self, book: Book) -> MergeResult<Book>;
}

impl<F> Recalculator for F
where
    F: Fn(Book) -> MergeResult<Book> + Send + Sync,
{
    fn recalculate(&self, book: Book) -> MergeResult<Book> {
        self(book)
    }
}

/// Recalculates through a headless LibreOffice conversion.
///
/// The book is saved to a scratch directory without formula results,
/// converted with `soffice --convert-to xlsx`, and the calculated values of
/// the converted file are copied back onto the original cells, so styles and
/// defined names of the working copy survive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibreOfficeRecalculator {
    program: PathBuf,
}

impl Default for LibreOfficeRecalculator {
    fn default() -> Self {
        LibreOfficeRecalculator {
            program: PathBuf::from("soffice"),
        }
    }
}

impl LibreOfficeRecalculator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        LibreOfficeRecalculator {
            program: program.into(),
        }
    }

    fn convert(&self, input: &Path, output_dir: &Path, profile_dir: &Path) -> MergeResult<()> {
        let mut command = Command::new(&self.program);
        command
            .arg("--headless")
            .arg("--norestore")
            .arg(format!(
                "-env:UserInstallation=file://{}",
                profile_dir.display()
            ))
            .args(["--convert-to", "xlsx", "--outdir"])
            .arg(output_dir)
            .arg(input);
        debug!(?command, "running recalculation");

        let output = command.output().map_err(|e| {
            MergeError::recalculation(format!(
                "failed to run {}: {e}",
                self.program.display()
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MergeError::recalculation(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    /// Round-trip a scratch copy of `book` through LibreOffice and load the
    /// calculated result.
    fn calculate(&self, book: &Book) -> MergeResult<Book> {
        let workdir = tempfile::tempdir()?;
        let input_dir = workdir.path().join("in");
        let output_dir = workdir.path().join("out");
        let profile_dir = workdir.path().join("profile");
        std::fs::create_dir_all(&input_dir)?;
        std::fs::create_dir_all(&output_dir)?;

        let input = input_dir.join("workbook.xlsx");
        let mut scratch = book.clone();
        clear_formula_results(&mut scratch);
        scratch
            .save_as_xlsx(&input)
            .map_err(|e| MergeError::recalculation(format!("cannot save working copy: {e}")))?;

        self.convert(&input, &output_dir, &profile_dir)?;

        let converted = output_dir.join("workbook.xlsx");
        if !converted.exists() {
            return Err(MergeError::recalculation(format!(
                "no converted workbook at {}",
                converted.display()
            )));
        }
        Book::from_xlsx(&converted).map_err(|e| {
            MergeError::recalculation(format!("cannot load recalculated workbook: {e}"))
        })
    }
}

impl Recalculator for LibreOfficeRecalculator {
    fn recalculate(&self, mut book: Book) -> MergeResult<Book> {
        match self.calculate(&book) {
            Ok(calculated) => {
                let updated = apply_results(&mut book, &calculated);
                info!(formulas = updated, "recalculation finished");
                Ok(book)
            }
            Err(err) => {
                error!(%err, "recalculation failed");
                if matches!(err, MergeError::Recalculation(_)) {
                    Err(err)
                } else {
                    Err(MergeError::recalculation(err.to_string()))
                }
            }
        }
    }
}

/// Drop every cached formula result so nothing stale reaches the engine.
pub fn clear_formula_results(book: &mut Book) {
    for (_, sheet) in book.sheets_mut() {
        for (_, _, cell) in sheet.cells_mut() {
            if let CellValue::Formula(formula) = &mut cell.value {
                formula.cached = None;
            }
        }
    }
}

/// Copy calculated values from `calculated` onto the formula cells of `book`.
/// Returns how many formula cells received a result.
pub fn apply_results(book: &mut Book, calculated: &Book) -> usize {
    let mut updated = 0;
    for (name, sheet) in book.sheets_mut() {
        let Ok(source) = calculated.get_sheet(name) else {
            continue;
        };
        for (row, col, cell) in sheet.cells_mut() {
            if !matches!(cell.value, CellValue::Formula(_)) {
                continue;
            }
            let result = source.value(row, col).cached_or_self();
            if matches!(result, CellValue::Formula(_)) {
                continue;
            }
            cell.value.set_cached(result.clone());
            updated += 1;
        }
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use finmerge_sheet::Sheet;

    fn book() -> Book {
        let mut sheet = Sheet::with_name("Data");
        sheet.set_a1("A1", 2).unwrap();
        sheet.set_formula("B1", "=A1*2").unwrap();
        let mut book = Book::new();
        book.add_sheet("Data", sheet).unwrap();
        book
    }

    #[test]
    fn test_closure_recalculator() {
        let recalc = |mut book: Book| -> MergeResult<Book> {
            let sheet = book.get_sheet_mut("Data")?;
            sheet.cell_mut(1, 2)?.value.set_cached(CellValue::Float(4.0));
            Ok(book)
        };
        let result = recalc.recalculate(book()).unwrap();
        let value = result.get_sheet("Data").unwrap().value(1, 2);
        assert_eq!(value.as_float(), Some(4.0));
    }

    #[test]
    fn test_apply_results_keeps_formula_and_style() {
        let mut target = book();
        target
            .get_sheet_mut("Data")
            .unwrap()
            .cell_mut(1, 2)
            .unwrap()
            .style
            .wrap_text = true;

        let mut calculated = book();
        calculated
            .get_sheet_mut("Data")
            .unwrap()
            .cell_mut(1, 2)
            .unwrap()
            .value
            .set_cached(CellValue::Float(4.0));

        assert_eq!(apply_results(&mut target, &calculated), 1);
        let cell = target.get_sheet("Data").unwrap().cell(1, 2).unwrap();
        assert_eq!(cell.value.formula_source(), Some("=A1*2"));
        assert_eq!(cell.value.as_float(), Some(4.0));
        assert!(cell.style.wrap_text);
    }

    #[test]
    fn test_clear_formula_results() {
        let mut target = book();
        target
            .get_sheet_mut("Data")
            .unwrap()
            .cell_mut(1, 2)
            .unwrap()
            .value
            .set_cached(CellValue::Float(9.0));
        clear_formula_results(&mut target);
        assert!(!target.get_sheet("Data").unwrap().value(1, 2).is_numeric());
    }

    #[test]
    fn test_missing_program_is_recalculation_error() {
        let recalc = LibreOfficeRecalculator::new("/nonexistent/finmerge-soffice");
        let err = recalc.recalculate(book()).unwrap_err();
        assert!(matches!(err, MergeError::Recalculation(_)));
        assert!(!err.is_configuration());
    }
}
