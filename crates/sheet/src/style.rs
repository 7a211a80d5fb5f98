//! Per-cell presentation: number format, alignment and wrapping.

use serde::{Deserialize, Serialize};

/// Number format code attached to a cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberFormat {
    #[default]
    General,
    /// Two fixed decimals (`0.00`).
    Fixed2,
    /// Unambiguous calendar date (`yyyy-mm-dd`).
    IsoDate,
    Custom(String),
}

impl NumberFormat {
    /// The Excel format code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::Fixed2 => "0.00",
            NumberFormat::IsoDate => "yyyy-mm-dd",
            NumberFormat::Custom(code) => code,
        }
    }

    /// Map a format code back to a known variant.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "" | "General" => NumberFormat::General,
            "0.00" => NumberFormat::Fixed2,
            "yyyy-mm-dd" => NumberFormat::IsoDate,
            other => NumberFormat::Custom(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorizontalAlign {
    #[default]
    General,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalAlign {
    #[default]
    Bottom,
    Center,
    Top,
}

/// Cell presentation, independent of the value stored in the cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellStyle {
    pub number_format: NumberFormat,
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
    pub wrap_text: bool,
}

impl CellStyle {
    /// True when nothing differs from the default style.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == CellStyle::default()
    }

    /// Left/top aligned, wrapped text. Number format is left untouched.
    pub fn align_top_left_wrapped(&mut self) {
        self.horizontal = HorizontalAlign::Left;
        self.vertical = VerticalAlign::Top;
        self.wrap_text = true;
    }
}
