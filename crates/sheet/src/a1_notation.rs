use crate::error::{Result, SheetError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parse A1-style cell notation (e.g., "A1", "$Z$99", "AA1")
/// Returns (row, column) as 1-based indices; `$` markers are ignored.
pub fn parse_a1(notation: &str) -> Result<(u32, u32)> {
    let cleaned: String = notation
        .trim()
        .chars()
        .filter(|c| *c != '$')
        .collect::<String>()
        .to_uppercase();

    let split_pos = cleaned
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| SheetError::InvalidCellNotation(notation.to_string()))?;

    let col_part = &cleaned[..split_pos];
    let row_part = &cleaned[split_pos..];

    if col_part.is_empty() || row_part.is_empty() {
        return Err(SheetError::InvalidCellNotation(notation.to_string()));
    }

    let col = column_letters_to_index(col_part)
        .ok_or_else(|| SheetError::InvalidCellNotation(notation.to_string()))?;
    let row = row_part
        .parse::<u32>()
        .map_err(|_| SheetError::InvalidCellNotation(notation.to_string()))?;

    if row == 0 {
        return Err(SheetError::InvalidCellNotation(notation.to_string()));
    }

    Ok((row, col))
}

/// Convert column letters to a 1-based column index
/// A=1, B=2, ... Z=26, AA=27, ...
pub fn column_letters_to_index(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }

    let mut col: u32 = 0;
    for b in letters.bytes() {
        let b = b.to_ascii_uppercase();
        if !b.is_ascii_uppercase() {
            return None;
        }
        col = col * 26 + u32::from(b - b'A') + 1;
    }
    Some(col)
}

/// Convert a 1-based column index to column letters
/// 1=A, 2=B, ... 26=Z, 27=AA, ...
pub fn column_index_to_letters(col: u32) -> String {
    let mut result = String::new();
    let mut col = col;

    while col > 0 {
        col -= 1;
        result.insert(0, char::from((col % 26) as u8 + b'A'));
        col /= 26;
    }

    result
}

/// Convert 1-based (row, col) to A1 notation
pub fn to_a1_notation(row: u32, col: u32) -> String {
    format!("{}{}", column_index_to_letters(col), row)
}

/// An inclusive rectangle of cells, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRect {
    pub first_row: u32,
    pub first_col: u32,
    pub last_row: u32,
    pub last_col: u32,
}

impl CellRect {
    /// Parse range notation such as `C2:L8` or `$A$1:$K$50`.
    ///
    /// Reversed corners are normalized; a single cell yields a 1x1 rectangle.
    pub fn parse(notation: &str) -> Result<Self> {
        let invalid = || SheetError::InvalidRangeNotation(notation.to_string());
        let mut parts = notation.split(':');
        let start = parts.next().ok_or_else(invalid)?;
        let end = parts.next().unwrap_or(start);
        if parts.next().is_some() {
            return Err(invalid());
        }

        let (r1, c1) = parse_a1(start).map_err(|_| invalid())?;
        let (r2, c2) = parse_a1(end).map_err(|_| invalid())?;

        Ok(CellRect {
            first_row: r1.min(r2),
            first_col: c1.min(c2),
            last_row: r1.max(r2),
            last_col: c1.max(c2),
        })
    }

    /// Shrink the rectangle so it does not extend past `max_row` x `max_col`.
    ///
    /// The result may be empty (see [`CellRect::is_empty`]).
    #[must_use]
    pub fn clip(&self, max_row: u32, max_col: u32) -> CellRect {
        CellRect {
            last_row: self.last_row.min(max_row),
            last_col: self.last_col.min(max_col),
            ..*self
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_row < self.first_row || self.last_col < self.first_col
    }

    #[must_use]
    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    /// Number of columns, zero when the rectangle is empty.
    #[must_use]
    pub fn width(&self) -> u32 {
        (self.last_col + 1).saturating_sub(self.first_col)
    }
}

impl fmt::Display for CellRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            to_a1_notation(self.first_row, self.first_col),
            to_a1_notation(self.last_row, self.last_col)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_a1() {
        assert_eq!(parse_a1("A1").unwrap(), (1, 1));
        assert_eq!(parse_a1("B1").unwrap(), (1, 2));
        assert_eq!(parse_a1("A2").unwrap(), (2, 1));
        assert_eq!(parse_a1("Z1").unwrap(), (1, 26));
        assert_eq!(parse_a1("AA1").unwrap(), (1, 27));
        assert_eq!(parse_a1("$C$10").unwrap(), (10, 3));
        assert_eq!(parse_a1("xfd5").unwrap(), (5, 16384));
    }

    #[test]
    fn test_parse_a1_errors() {
        assert!(parse_a1("").is_err());
        assert!(parse_a1("A").is_err());
        assert!(parse_a1("1").is_err());
        assert!(parse_a1("A0").is_err());
        assert!(parse_a1("ABCD1").is_err());
    }

    #[test]
    fn test_cell_rect() {
        let rect = CellRect::parse("C2:L8").unwrap();
        assert_eq!(
            rect,
            CellRect {
                first_row: 2,
                first_col: 3,
                last_row: 8,
                last_col: 12
            }
        );
        assert_eq!(rect.to_string(), "C2:L8");
        assert_eq!(rect.width(), 10);

        let reversed = CellRect::parse("L8:C2").unwrap();
        assert_eq!(reversed, rect);

        assert!(CellRect::parse("C2:").is_err());
        assert!(CellRect::parse("C2:D4:E5").is_err());
        assert!(CellRect::parse("not a range").is_err());
    }

    #[test]
    fn test_clip() {
        let rect = CellRect::parse("A1:L40").unwrap().clip(12, 5);
        assert_eq!(rect.to_string(), "A1:E12");
        assert!(CellRect::parse("F1:G2").unwrap().clip(10, 3).is_empty());
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_index_to_letters(1), "A");
        assert_eq!(column_index_to_letters(26), "Z");
        assert_eq!(column_index_to_letters(27), "AA");
        assert_eq!(column_index_to_letters(702), "ZZ");
        assert_eq!(column_index_to_letters(703), "AAA");
        for col in 1..800 {
            assert_eq!(column_letters_to_index(&column_index_to_letters(col)), Some(col));
        }
    }
}
