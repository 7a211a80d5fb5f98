//! Reading calculated results back out of a fixed display window.

use finmerge_sheet::{Book, CellRect, CellValue};
use serde::Serialize;
use tracing::{info, warn};

/// Window and header row to present for one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplaySpec {
    pub window: CellRect,
    pub header_row: u32,
}

/// Headers and formatted rows of one sheet's display window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SheetDisplay {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Extract the display window of `sheet_name`.
///
/// The window is clipped to the sheet's stored area and no cell outside it is
/// read. A header row inside the window supplies the headers and data starts
/// below it; a header row outside the window yields blank placeholder headers.
/// A missing sheet yields an empty display.
pub fn extract(book: &Book, sheet_name: &str, spec: &DisplaySpec) -> SheetDisplay {
    let Ok(sheet) = book.get_sheet(sheet_name) else {
        warn!(sheet = sheet_name, "sheet not found for display");
        return SheetDisplay::default();
    };

    let window = sheet.clip(&spec.window);
    if window.is_empty() {
        info!(sheet = sheet_name, window = %spec.window, "display window is empty");
        return SheetDisplay::default();
    }

    let header_in_window = (window.first_row..=window.last_row).contains(&spec.header_row);
    let (headers, data_start) = if header_in_window {
        let headers = sheet
            .row_values(spec.header_row, window.first_col, window.last_col)
            .into_iter()
            .map(|value| match value.cached_or_self() {
                CellValue::Formula(_) => String::new(),
                other => other.to_string(),
            })
            .collect();
        (headers, spec.header_row + 1)
    } else {
        warn!(
            sheet = sheet_name,
            header_row = spec.header_row,
            window = %spec.window,
            "header row outside display window, using blank headers"
        );
        (vec![String::new(); window.width() as usize], window.first_row)
    };

    let rows: Vec<Vec<String>> = (data_start..=window.last_row)
        .map(|row| {
            sheet
                .row_values(row, window.first_col, window.last_col)
                .into_iter()
                .map(format_cell)
                .collect()
        })
        .collect();

    info!(
        sheet = sheet_name,
        rows = rows.len(),
        headers = headers.len(),
        "extracted display data"
    );
    SheetDisplay { headers, rows }
}

/// Presentation text of a cell: numbers as `1,234.50`, dates as
/// `2024-01-31`, formulas by their calculated value (empty when never
/// calculated).
pub fn format_cell(value: &CellValue) -> String {
    match value.cached_or_self() {
        CellValue::Int(i) => format_number(*i as f64),
        CellValue::Float(f) => format_number(*f),
        CellValue::Formula(_) => String::new(),
        other => other.to_string(),
    }
}

/// Two decimals with comma thousands separators.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let fixed = format!("{:.2}", n.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // -0.001 rounds to 0.00 and prints unsigned.
    let sign = if n < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}
