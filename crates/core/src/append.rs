//! Writing dataset rows into a template sheet.

use finmerge_sheet::{to_a1_notation, Sheet, MAX_COLS, MAX_ROWS};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::coerce::coerce;
use crate::dataset::{Dataset, RawValue};

/// Written when neither the coerced value nor its text form could be stored.
pub const WRITE_ERROR_SENTINEL: &str = "WRITE_ERROR";

/// Inclusive range of rows an append actually wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowSpan {
    pub start_row: u32,
    pub end_row: u32,
}

impl RowSpan {
    pub fn len(&self) -> u32 {
        self.end_row + 1 - self.start_row
    }

    pub fn is_empty(&self) -> bool {
        self.end_row < self.start_row
    }
}

/// Writes datasets into sheets, one coerced cell at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowAppender {
    max_columns: u32,
}

impl Default for RowAppender {
    fn default() -> Self {
        RowAppender { max_columns: 50 }
    }
}

impl RowAppender {
    /// Appender that writes at most `max_columns` fields per row.
    /// Fields past the limit are dropped.
    pub fn new(max_columns: u32) -> Self {
        RowAppender { max_columns }
    }

    /// Write `dataset` starting at `insert_row`, then align the written rows.
    ///
    /// Returns `None` for an empty dataset, which leaves the sheet untouched.
    /// Per-cell failures are logged and never abort the append.
    pub fn append(&self, sheet: &mut Sheet, dataset: &Dataset, insert_row: u32) -> Option<RowSpan> {
        if dataset.is_empty() {
            warn!(sheet = sheet.name(), "dataset is empty, skipping append");
            return None;
        }

        info!(
            sheet = sheet.name(),
            rows = dataset.len(),
            start_row = insert_row,
            "appending rows"
        );

        let limit = self.max_columns as usize;
        for (offset, fields) in dataset.rows.iter().enumerate() {
            let row = insert_row + offset as u32;
            if fields.len() > limit {
                debug!(
                    sheet = sheet.name(),
                    row,
                    dropped = fields.len() - limit,
                    "row wider than column limit, truncating"
                );
            }
            for (idx, raw) in fields.iter().take(limit).enumerate() {
                write_cell(sheet, row, idx as u32 + 1, raw);
            }
        }

        let span = RowSpan {
            start_row: insert_row,
            end_row: insert_row + dataset.len() as u32 - 1,
        };
        self.align(sheet, span);
        Some(span)
    }

    /// Left/top alignment with wrapping for every cell of the span, up to the
    /// column limit. Number formats are left as written.
    fn align(&self, sheet: &mut Sheet, span: RowSpan) {
        let last_col = sheet.max_column().min(self.max_columns);
        for row in span.start_row..=span.end_row.min(MAX_ROWS) {
            for col in 1..=last_col {
                match sheet.cell_mut(row, col) {
                    Ok(cell) => cell.style.align_top_left_wrapped(),
                    Err(err) => warn!(
                        sheet = sheet.name(),
                        cell = %to_a1_notation(row, col),
                        %err,
                        "could not format cell"
                    ),
                }
            }
        }
    }
}

/// Store one field, falling back to its text form and then to a sentinel.
fn write_cell(sheet: &mut Sheet, row: u32, col: u32, raw: &RawValue) {
    if row > MAX_ROWS || col > MAX_COLS {
        warn!(
            sheet = sheet.name(),
            row,
            col,
            "skipping write beyond worksheet limits"
        );
        return;
    }

    let coerced = coerce(raw);
    match sheet.cell_mut(row, col) {
        Ok(cell) => {
            cell.value = coerced.value;
            if let Some(format) = coerced.number_format {
                cell.style.number_format = format;
            }
        }
        Err(err) => {
            error!(
                sheet = sheet.name(),
                cell = %to_a1_notation(row, col),
                value = ?raw,
                %err,
                "error writing cell, falling back to text"
            );
            if sheet.set_value(row, col, raw.to_string()).is_err() {
                if let Err(err) = sheet.set_value(row, col, WRITE_ERROR_SENTINEL) {
                    error!(
                        sheet = sheet.name(),
                        cell = %to_a1_notation(row, col),
                        %err,
                        "cell left unwritten"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finmerge_sheet::{CellValue, HorizontalAlign, NumberFormat, VerticalAlign};

    #[test]
    fn test_append_rows() {
        let mut sheet = Sheet::with_name("Income Statement");
        sheet.set_a1("A9", "Line Item").unwrap();
        let dataset = Dataset::from_rows(vec![
            vec!["Revenue", "1,000", "(250.5)"],
            vec!["Costs", "", "N/A"],
        ]);

        let span = RowAppender::default().append(&mut sheet, &dataset, 10).unwrap();
        assert_eq!(span, RowSpan { start_row: 10, end_row: 11 });
        assert_eq!(span.len(), 2);

        assert_eq!(sheet.get_a1("A10").unwrap(), &CellValue::from("Revenue"));
        assert_eq!(sheet.get_a1("B10").unwrap(), &CellValue::Int(1000));
        assert_eq!(sheet.get_a1("C10").unwrap(), &CellValue::Float(-250.5));
        assert_eq!(sheet.get_a1("B11").unwrap(), &CellValue::Null);
        assert_eq!(sheet.get_a1("C11").unwrap(), &CellValue::from("N/A"));

        let cell = sheet.cell(10, 2).unwrap();
        assert_eq!(cell.style.number_format, NumberFormat::Fixed2);
        assert_eq!(cell.style.horizontal, HorizontalAlign::Left);
        assert_eq!(cell.style.vertical, VerticalAlign::Top);
        assert!(cell.style.wrap_text);

        let text_cell = sheet.cell(11, 3).unwrap();
        assert_eq!(text_cell.style.number_format, NumberFormat::General);
        assert!(text_cell.style.wrap_text);

        // Header row above the append area is not reformatted.
        assert!(sheet.cell(9, 1).unwrap().style.is_default());
    }

    #[test]
    fn test_empty_dataset_is_noop() {
        let mut sheet = Sheet::with_name("Balance Sheet");
        sheet.set_a1("A6", "Header").unwrap();
        let before = sheet.clone();

        assert_eq!(RowAppender::default().append(&mut sheet, &Dataset::default(), 7), None);
        assert_eq!(sheet, before);
    }

    #[test]
    fn test_column_limit() {
        let mut sheet = Sheet::with_name("Cash Flow Statement");
        let row: Vec<String> = (1..=60).map(|i| i.to_string()).collect();
        let dataset = Dataset::from_rows(vec![row]);

        RowAppender::new(50).append(&mut sheet, &dataset, 9).unwrap();
        assert_eq!(sheet.max_column(), 50);
        assert_eq!(sheet.value(9, 50), &CellValue::Int(50));
        assert_eq!(sheet.value(9, 51), &CellValue::Null);
    }

    #[test]
    fn test_rows_past_sheet_limit_are_skipped() {
        let mut sheet = Sheet::with_name("Income Statement");
        let dataset = Dataset::from_rows(vec![vec!["a"], vec!["b"]]);

        let span = RowAppender::default()
            .append(&mut sheet, &dataset, MAX_ROWS)
            .unwrap();
        assert_eq!(span.start_row, MAX_ROWS);
        assert_eq!(sheet.value(MAX_ROWS, 1), &CellValue::from("a"));
        assert_eq!(sheet.max_row(), MAX_ROWS);
    }
}
