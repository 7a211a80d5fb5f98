use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::style::CellStyle;

/// Represents a formula stored in a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaCell {
    /// Formula text including the leading `=`.
    pub source: String,
    /// Last calculated result, if a recalculation has run.
    pub cached: Option<Box<CellValue>>,
}

/// Represents a cell value in a sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    Formula(FormulaCell),
}

impl CellValue {
    /// Create a formula cell value. A missing leading `=` is added.
    #[must_use]
    pub fn formula<S: Into<String>>(source: S) -> Self {
        let source = source.into();
        let source = if source.starts_with('=') {
            source
        } else {
            format!("={source}")
        };
        CellValue::Formula(FormulaCell {
            source,
            cached: None,
        })
    }

    /// Return the cached value for formulas, or self for non-formulas.
    #[must_use]
    pub fn cached_or_self(&self) -> &CellValue {
        match self {
            CellValue::Formula(formula) => formula.cached.as_deref().unwrap_or(self),
            _ => self,
        }
    }

    /// Set the cached value for a formula.
    pub fn set_cached(&mut self, value: CellValue) {
        if let CellValue::Formula(formula) = self {
            formula.cached = Some(Box::new(value));
        }
    }

    /// Formula text when this is a formula cell.
    #[must_use]
    pub fn formula_source(&self) -> Option<&str> {
        match self {
            CellValue::Formula(formula) => Some(&formula.source),
            _ => None,
        }
    }

    /// Check if the value is null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// True for null cells and for text that is empty after trimming.
    ///
    /// Formula cells are never blank, whatever their cached result.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// True when the (cached) value is an integer or a float.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.cached_or_self(),
            CellValue::Int(_) | CellValue::Float(_)
        )
    }

    /// Try to get the value as a float
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self.cached_or_self() {
            CellValue::Float(f) => Some(*f),
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Null
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cached_or_self() {
            CellValue::Null => write!(f, ""),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(fl) => write!(f, "{fl}"),
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Formula(formula) => write!(f, "{}", formula.source),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(i64::from(i))
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}

/// A stored cell: its value plus presentation style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

impl Cell {
    #[must_use]
    pub fn new<T: Into<CellValue>>(value: T) -> Self {
        Cell {
            value: value.into(),
            style: CellStyle::default(),
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.value.is_blank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_prefix() {
        let value = CellValue::formula("SUM(A1:B1)");
        assert_eq!(value.formula_source(), Some("=SUM(A1:B1)"));

        let value = CellValue::formula("=VLOOKUP(A2,B5:C10,2)");
        assert_eq!(value.formula_source(), Some("=VLOOKUP(A2,B5:C10,2)"));
    }

    #[test]
    fn test_blank() {
        assert!(CellValue::Null.is_blank());
        assert!(CellValue::String(" \t".to_string()).is_blank());
        assert!(!CellValue::Int(0).is_blank());
        assert!(!CellValue::formula("=A1").is_blank());
    }

    #[test]
    fn test_cached_value() {
        let mut value = CellValue::formula("=A1*2");
        assert!(!value.is_numeric());
        value.set_cached(CellValue::Float(4.0));
        assert!(value.is_numeric());
        assert_eq!(value.as_float(), Some(4.0));
        assert_eq!(value.to_string(), "4");
    }
}
