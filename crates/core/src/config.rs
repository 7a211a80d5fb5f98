//! Static per-template layout: where data is appended, where formulas are
//! rewritten and what is shown afterwards.
//!
//! The defaults describe the shipped financial-statement template. A layout
//! can also be loaded from YAML or JSON; every field is optional and falls
//! back to the default.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use finmerge_sheet::{CellRect, NumberFormat, MAX_COLS};
use serde::{Deserialize, Serialize};

use crate::display::DisplaySpec;
use crate::error::{MergeError, MergeResult};

/// Logical role of a dataset / template sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetRole {
    Income,
    Balance,
    Cashflow,
}

impl SheetRole {
    pub const ALL: [SheetRole; 3] = [SheetRole::Income, SheetRole::Balance, SheetRole::Cashflow];

    /// Exact (case-sensitive) template sheet name for this role.
    pub const fn sheet_name(self) -> &'static str {
        match self {
            SheetRole::Income => "Income Statement",
            SheetRole::Balance => "Balance Sheet",
            SheetRole::Cashflow => "Cash Flow Statement",
        }
    }
}

impl fmt::Display for SheetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SheetRole::Income => "income",
            SheetRole::Balance => "balance",
            SheetRole::Cashflow => "cashflow",
        };
        f.write_str(name)
    }
}

impl FromStr for SheetRole {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(SheetRole::Income),
            "balance" => Ok(SheetRole::Balance),
            "cashflow" | "cash-flow" => Ok(SheetRole::Cashflow),
            other => Err(MergeError::Configuration(format!(
                "unknown sheet role '{other}' (expected income, balance or cashflow)"
            ))),
        }
    }
}

/// Sheets every template must contain.
pub const REQUIRED_SHEETS: [&str; 3] = [
    SheetRole::Income.sheet_name(),
    SheetRole::Balance.sheet_name(),
    SheetRole::Cashflow.sheet_name(),
];

/// Layout constants for one sheet, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetLayout {
    /// Row at which appended data is expected to begin.
    pub append_start: u32,
    /// Region scanned for lookup formulas, e.g. `C2:L8`.
    pub formula_region: String,
    /// Region read back for presentation, e.g. `A1:L40`.
    pub display_window: String,
    /// Row holding the column headers shown with the display window.
    pub header_row: u32,
}

impl SheetLayout {
    fn new(append_start: u32, formula_region: &str, display_window: &str, header_row: u32) -> Self {
        SheetLayout {
            append_start,
            formula_region: formula_region.to_string(),
            display_window: display_window.to_string(),
            header_row,
        }
    }
}

/// Number format forced onto the numeric cells of a fixed region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormatOverride {
    pub sheet: String,
    pub range: String,
    pub format: String,
}

/// Complete template layout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateLayout {
    pub income: SheetLayout,
    pub balance: SheetLayout,
    pub cashflow: SheetLayout,
    /// Widest row written by the appender; extra dataset columns are dropped.
    pub max_columns: u32,
    /// Function names whose second argument is a range to grow.
    pub lookup_functions: Vec<String>,
    pub number_format_overrides: Vec<NumberFormatOverride>,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        TemplateLayout {
            income: SheetLayout::new(10, "C2:L8", "A1:L40", 9),
            balance: SheetLayout::new(7, "B2:K5", "A1:K50", 6),
            cashflow: SheetLayout::new(9, "C2:L5", "A1:L50", 8),
            max_columns: 50,
            lookup_functions: vec![
                "VLOOKUP".to_string(),
                "HLOOKUP".to_string(),
                "LOOKUP".to_string(),
            ],
            number_format_overrides: vec![NumberFormatOverride {
                sheet: SheetRole::Cashflow.sheet_name().to_string(),
                range: "C2:Z3".to_string(),
                format: "0.000".to_string(),
            }],
        }
    }
}

/// One sheet's layout after validation, with parsed ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetPlan {
    pub role: SheetRole,
    pub name: &'static str,
    pub append_start: u32,
    pub formula_region: CellRect,
    pub display: DisplaySpec,
}

/// A validated number-format override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOverridePlan {
    pub sheet: String,
    pub cells: CellRect,
    pub format: NumberFormat,
}

/// A validated [`TemplateLayout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPlan {
    pub sheets: Vec<SheetPlan>,
    pub max_columns: u32,
    pub lookup_functions: Vec<String>,
    pub format_overrides: Vec<FormatOverridePlan>,
}

impl LayoutPlan {
    /// Plan for a role. Every role is always present.
    pub fn sheet(&self, role: SheetRole) -> &SheetPlan {
        self.sheets
            .iter()
            .find(|plan| plan.role == role)
            .unwrap_or(&self.sheets[0])
    }
}

impl TemplateLayout {
    /// Layout for one role.
    pub fn sheet(&self, role: SheetRole) -> &SheetLayout {
        match role {
            SheetRole::Income => &self.income,
            SheetRole::Balance => &self.balance,
            SheetRole::Cashflow => &self.cashflow,
        }
    }

    pub fn from_yaml_str(content: &str) -> MergeResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| MergeError::Configuration(format!("invalid YAML layout: {e}")))
    }

    pub fn from_json_str(content: &str) -> MergeResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| MergeError::Configuration(format!("invalid JSON layout: {e}")))
    }

    /// Load a layout file; `.json` files are read as JSON, anything else as YAML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> MergeResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn to_yaml_string(&self) -> MergeResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| MergeError::Configuration(format!("cannot serialize layout: {e}")))
    }

    pub fn to_json_string(&self) -> MergeResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MergeError::Configuration(format!("cannot serialize layout: {e}")))
    }

    /// Parse and check every range and constant.
    pub fn validate(&self) -> MergeResult<LayoutPlan> {
        if self.max_columns == 0 || self.max_columns > MAX_COLS {
            return Err(MergeError::Configuration(format!(
                "max_columns must be between 1 and {MAX_COLS}, got {}",
                self.max_columns
            )));
        }

        if self.lookup_functions.is_empty() {
            return Err(MergeError::Configuration(
                "lookup_functions must name at least one function".to_string(),
            ));
        }
        for name in &self.lookup_functions {
            let valid = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
            if !valid {
                return Err(MergeError::Configuration(format!(
                    "invalid lookup function name '{name}'"
                )));
            }
        }

        let mut sheets = Vec::with_capacity(SheetRole::ALL.len());
        for role in SheetRole::ALL {
            let layout = self.sheet(role);
            let name = role.sheet_name();

            if layout.append_start == 0 || layout.header_row == 0 {
                return Err(MergeError::Configuration(format!(
                    "append_start and header_row for '{name}' must be at least 1"
                )));
            }

            let formula_region = parse_region(name, &layout.formula_region)?;
            if formula_region.last_row >= layout.append_start {
                return Err(MergeError::invalid_region(
                    name,
                    &layout.formula_region,
                    format!(
                        "formula region overlaps the data-append area starting at row {}",
                        layout.append_start
                    ),
                ));
            }

            let window = parse_region(name, &layout.display_window)?;

            sheets.push(SheetPlan {
                role,
                name,
                append_start: layout.append_start,
                formula_region,
                display: DisplaySpec {
                    window,
                    header_row: layout.header_row,
                },
            });
        }

        let format_overrides = self
            .number_format_overrides
            .iter()
            .map(|o| {
                Ok(FormatOverridePlan {
                    sheet: o.sheet.clone(),
                    cells: parse_region(&o.sheet, &o.range)?,
                    format: NumberFormat::from_code(&o.format),
                })
            })
            .collect::<MergeResult<Vec<_>>>()?;

        Ok(LayoutPlan {
            sheets,
            max_columns: self.max_columns,
            lookup_functions: self.lookup_functions.clone(),
            format_overrides,
        })
    }
}

fn parse_region(sheet: &str, range: &str) -> MergeResult<CellRect> {
    CellRect::parse(range).map_err(|e| MergeError::invalid_region(sheet, range, e.to_string()))
}
