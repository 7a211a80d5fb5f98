use crate::a1_notation::{parse_a1, CellRect};
use crate::cell::{Cell, CellValue};
use crate::error::{Result, SheetError};
use serde::{Deserialize, Serialize};

/// Largest row number a worksheet can address.
pub const MAX_ROWS: u32 = 1_048_576;
/// Largest column number a worksheet can address.
pub const MAX_COLS: u32 = 16_384;

static NULL: CellValue = CellValue::Null;

/// A named worksheet grid.
///
/// Rows and columns are 1-based. Reads outside the populated area return
/// [`CellValue::Null`]; writes grow the grid as needed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Create a new empty sheet
    #[must_use]
    pub fn new() -> Self {
        Self::with_name("Sheet1")
    }

    /// Create a new empty sheet with a name
    #[must_use]
    pub fn with_name(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            rows: Vec::new(),
        }
    }

    /// Get the sheet name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Highest row that holds a stored cell (0 for an empty sheet).
    #[must_use]
    pub fn max_row(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Highest column that holds a stored cell in any row.
    #[must_use]
    pub fn max_column(&self) -> u32 {
        self.rows.iter().map(Vec::len).max().unwrap_or(0) as u32
    }

    /// Check if the sheet holds no cells at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    /// Get the stored cell at (row, col), if any
    #[must_use]
    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        if row == 0 || col == 0 {
            return None;
        }
        self.rows
            .get(row as usize - 1)
            .and_then(|r| r.get(col as usize - 1))
    }

    /// Get the value at (row, col); null outside the populated area
    #[must_use]
    pub fn value(&self, row: u32, col: u32) -> &CellValue {
        self.cell(row, col).map_or(&NULL, |c| &c.value)
    }

    /// Get a mutable cell, growing the grid to reach it
    pub fn cell_mut(&mut self, row: u32, col: u32) -> Result<&mut Cell> {
        if row == 0 || col == 0 || row > MAX_ROWS || col > MAX_COLS {
            return Err(SheetError::IndexOutOfBounds {
                row,
                col,
                max_rows: MAX_ROWS,
                max_cols: MAX_COLS,
            });
        }

        let (r, c) = (row as usize - 1, col as usize - 1);
        if self.rows.len() <= r {
            self.rows.resize_with(r + 1, Vec::new);
        }
        let cells = &mut self.rows[r];
        if cells.len() <= c {
            cells.resize_with(c + 1, Cell::default);
        }
        Ok(&mut cells[c])
    }

    /// Set a cell value, keeping the cell's style
    pub fn set_value<T: Into<CellValue>>(&mut self, row: u32, col: u32, value: T) -> Result<()> {
        self.cell_mut(row, col)?.value = value.into();
        Ok(())
    }

    /// Get a value using A1 notation (e.g., "B3")
    pub fn get_a1(&self, notation: &str) -> Result<&CellValue> {
        let (row, col) = parse_a1(notation)?;
        Ok(self.value(row, col))
    }

    /// Set a value using A1 notation
    pub fn set_a1<T: Into<CellValue>>(&mut self, notation: &str, value: T) -> Result<()> {
        let (row, col) = parse_a1(notation)?;
        self.set_value(row, col, value)
    }

    /// Store a formula using A1 notation (leading `=` optional)
    pub fn set_formula(&mut self, notation: &str, formula: &str) -> Result<()> {
        self.set_a1(notation, CellValue::formula(formula))
    }

    /// True if every cell in the row is blank (null, or whitespace-only text).
    /// Rows past [`Sheet::max_row`] are blank.
    #[must_use]
    pub fn is_row_blank(&self, row: u32) -> bool {
        if row == 0 {
            return true;
        }
        self.rows
            .get(row as usize - 1)
            .map_or(true, |cells| cells.iter().all(Cell::is_blank))
    }

    /// Last row holding any non-blank cell, scanning the whole sheet.
    #[must_use]
    pub fn last_non_blank_row(&self) -> Option<u32> {
        self.rows
            .iter()
            .rposition(|cells| !cells.iter().all(Cell::is_blank))
            .map(|idx| idx as u32 + 1)
    }

    /// Values of one row restricted to the inclusive column span
    #[must_use]
    pub fn row_values(&self, row: u32, first_col: u32, last_col: u32) -> Vec<&CellValue> {
        (first_col..=last_col).map(|col| self.value(row, col)).collect()
    }

    /// Clip a rectangle to the populated area of this sheet
    #[must_use]
    pub fn clip(&self, rect: &CellRect) -> CellRect {
        rect.clip(self.max_row(), self.max_column())
    }

    /// Iterate over stored cells as (row, col, cell), 1-based
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &Cell)> {
        self.rows.iter().enumerate().flat_map(|(r, cells)| {
            cells
                .iter()
                .enumerate()
                .map(move |(c, cell)| (r as u32 + 1, c as u32 + 1, cell))
        })
    }

    /// Mutable variant of [`Sheet::cells`]
    pub fn cells_mut(&mut self) -> impl Iterator<Item = (u32, u32, &mut Cell)> {
        self.rows.iter_mut().enumerate().flat_map(|(r, cells)| {
            cells
                .iter_mut()
                .enumerate()
                .map(move |(c, cell)| (r as u32 + 1, c as u32 + 1, cell))
        })
    }
}
