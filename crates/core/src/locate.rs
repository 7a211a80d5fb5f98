//! Finding where appended rows go in a partially pre-filled sheet.

use finmerge_sheet::Sheet;
use tracing::{debug, info};

/// Chooses the first row to write a dataset to.
///
/// Implementations must return a row `>= start_row`.
pub trait InsertionStrategy: Send + Sync {
    fn insertion_row(&self, sheet: &Sheet, start_row: u32) -> u32;
}

/// Scans forward from the configured start for a confirmed block of blank
/// rows, telling a single blank separator inside the data apart from the end
/// of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapScanLocator {
    /// How far past the last stored row the scan continues.
    pub scan_slack: u32,
    /// Blank rows that must follow a blank row for it to count as a gap.
    pub confirm_rows: u32,
}

impl Default for GapScanLocator {
    fn default() -> Self {
        GapScanLocator {
            scan_slack: 5,
            confirm_rows: 3,
        }
    }
}

impl GapScanLocator {
    /// True when `row` is blank and so are the following `confirm_rows`
    /// rows that lie inside the stored area.
    fn is_confirmed_gap(&self, sheet: &Sheet, row: u32) -> bool {
        let max_row = sheet.max_row();
        sheet.is_row_blank(row)
            && (1..=self.confirm_rows)
                .map(|offset| row + offset)
                .take_while(|&next| next <= max_row)
                .all(|next| sheet.is_row_blank(next))
    }
}

impl InsertionStrategy for GapScanLocator {
    fn insertion_row(&self, sheet: &Sheet, start_row: u32) -> u32 {
        let scan_end = sheet.max_row() + self.scan_slack;

        if let Some(row) = (start_row..=scan_end).find(|&row| self.is_confirmed_gap(sheet, row)) {
            debug!(sheet = sheet.name(), row, "found blank block");
            return row;
        }

        // Start row lies past the scan window: append after the last
        // non-blank row of the whole sheet, never above the start row.
        let last = sheet.last_non_blank_row().unwrap_or(1);
        let row = (last + 1).max(start_row);
        info!(
            sheet = sheet.name(),
            last_data_row = last,
            row,
            "no blank block found, appending after last data row"
        );
        row
    }
}
