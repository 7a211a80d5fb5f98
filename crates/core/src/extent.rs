//! Resolving the rows appended data actually occupies.

use std::fmt;

use finmerge_sheet::Sheet;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::append::RowSpan;

/// Inclusive first/last data row of a sheet after appending.
///
/// An empty extent has `last_row == first_row - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataExtent {
    pub first_row: u32,
    pub last_row: u32,
}

impl DataExtent {
    /// The "no rows present" marker for data expected at `start_row`.
    pub fn empty(start_row: u32) -> Self {
        DataExtent {
            first_row: start_row,
            last_row: start_row.saturating_sub(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last_row < self.first_row
    }
}

impl fmt::Display for DataExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "empty (before row {})", self.first_row)
        } else {
            write!(f, "rows {}-{}", self.first_row, self.last_row)
        }
    }
}

/// Extents keyed by sheet name.
pub type ExtentMap = IndexMap<String, DataExtent>;

/// Re-scans a sheet after appending to find where its data really ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtentResolver {
    /// Rows scanned past the expected end of the data.
    pub scan_slack: u32,
}

impl Default for ExtentResolver {
    fn default() -> Self {
        ExtentResolver { scan_slack: 5 }
    }
}

impl ExtentResolver {
    pub fn resolve(&self, sheet: &Sheet, configured_start: u32, written: Option<RowSpan>) -> DataExtent {
        let Some(span) = written else {
            let extent = DataExtent::empty(configured_start);
            info!(sheet = sheet.name(), %extent, "no data appended");
            return extent;
        };

        // Rows above the written span are template content, not data.
        let scan_start = span.start_row.max(configured_start);
        let len = span.len();
        let scan_end = (scan_start + len + self.scan_slack).min(sheet.max_row() + self.scan_slack);

        let mut first_row = None;
        for row in scan_start..=scan_end {
            let blank = sheet.is_row_blank(row);
            match first_row {
                None if !blank => first_row = Some(row),
                Some(first) if blank => {
                    let extent = DataExtent {
                        first_row: first,
                        last_row: row - 1,
                    };
                    info!(sheet = sheet.name(), %extent, "resolved data extent");
                    return extent;
                }
                _ => {}
            }
        }

        let extent = match first_row {
            Some(first) => DataExtent {
                first_row: first,
                last_row: (first + len - 1).min(sheet.max_row()),
            },
            None => {
                warn!(
                    sheet = sheet.name(),
                    start_row = scan_start,
                    "no data found where rows were written, using written length"
                );
                DataExtent {
                    first_row: scan_start,
                    last_row: scan_start + len - 1,
                }
            }
        };
        info!(sheet = sheet.name(), %extent, "resolved data extent");
        extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(rows: impl IntoIterator<Item = u32>) -> Sheet {
        let mut sheet = Sheet::with_name("Data");
        for row in rows {
            sheet.set_value(row, 1, i64::from(row)).unwrap();
        }
        sheet
    }

    #[test]
    fn test_contiguous_rows() {
        let mut sheet = filled(1..=4);
        for row in 10..=19 {
            sheet.set_value(row, 2, "x").unwrap();
        }
        let span = RowSpan { start_row: 10, end_row: 19 };
        let extent = ExtentResolver::default().resolve(&sheet, 10, Some(span));
        assert_eq!(extent, DataExtent { first_row: 10, last_row: 19 });
    }

    #[test]
    fn test_blank_row_inside_data_ends_extent() {
        let sheet = filled([10, 11, 13, 14]);
        let span = RowSpan { start_row: 10, end_row: 14 };
        let extent = ExtentResolver::default().resolve(&sheet, 10, Some(span));
        assert_eq!(extent, DataExtent { first_row: 10, last_row: 11 });
    }

    #[test]
    fn test_abutting_template_content_is_not_data() {
        // Static rows 7-8 sit right above data written at row 9.
        let sheet = filled(7..=12);
        let span = RowSpan { start_row: 9, end_row: 12 };
        let extent = ExtentResolver::default().resolve(&sheet, 7, Some(span));
        assert_eq!(extent, DataExtent { first_row: 9, last_row: 12 });
    }

    #[test]
    fn test_leading_blank_written_row() {
        let sheet = filled([11, 12]);
        let span = RowSpan { start_row: 10, end_row: 12 };
        let extent = ExtentResolver::default().resolve(&sheet, 10, Some(span));
        assert_eq!(extent, DataExtent { first_row: 11, last_row: 12 });
    }

    #[test]
    fn test_nothing_found_uses_written_length() {
        let sheet = Sheet::with_name("Data");
        let span = RowSpan { start_row: 10, end_row: 12 };
        let extent = ExtentResolver::default().resolve(&sheet, 10, Some(span));
        assert_eq!(extent, DataExtent { first_row: 10, last_row: 12 });
    }

    #[test]
    fn test_scan_window_capped_by_length() {
        // Data runs past start + len + slack: fall back to the written length.
        let sheet = filled(10..=40);
        let span = RowSpan { start_row: 10, end_row: 12 };
        let extent = ExtentResolver::default().resolve(&sheet, 10, Some(span));
        assert_eq!(extent, DataExtent { first_row: 10, last_row: 12 });
    }

    #[test]
    fn test_no_rows_written() {
        let sheet = filled(1..=20);
        let extent = ExtentResolver::default().resolve(&sheet, 9, None);
        assert_eq!(extent, DataExtent::empty(9));
        assert_eq!(extent.last_row, 8);
        assert!(extent.is_empty());
        assert_eq!(extent.to_string(), "empty (before row 9)");
    }
}
