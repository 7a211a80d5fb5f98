//! Tabular input datasets, one per statement.

use std::fmt;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::MergeResult;

/// A raw field value as delivered by ingestion, before coercion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    #[default]
    Empty,
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl RawValue {
    /// True for `Empty`, NaN and text that is empty after trimming.
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Number(n) => n.is_nan(),
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::Date(_) => false,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Empty => Ok(()),
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            RawValue::Empty
        } else {
            RawValue::Text(s.to_string())
        }
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            RawValue::Empty
        } else {
            RawValue::Text(s)
        }
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(d: NaiveDate) -> Self {
        RawValue::Date(d)
    }
}

/// An ordered set of rows destined for one template sheet.
///
/// The header row is kept for reference only; the appender writes `rows`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<RawValue>>) -> Self {
        Dataset { headers, rows }
    }

    /// Build a dataset without headers from anything convertible to raw values.
    pub fn from_rows<R, T>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = T>,
        T: Into<RawValue>,
    {
        Dataset {
            headers: Vec::new(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Read a CSV file. The first record is the header row.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> MergeResult<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let dataset = Self::from_csv_reader(file)?;
        info!(
            path = %path.as_ref().display(),
            rows = dataset.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Read CSV from any reader. Empty input gives an empty dataset.
    pub fn from_csv_reader<R: Read>(reader: R) -> MergeResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()?
            .iter()
            .map(ToString::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(RawValue::from).collect());
        }

        Ok(Dataset { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Normalize a freshly loaded dataset: trim header names, strip
    /// surrounding whitespace and any tab from the first column, and drop
    /// rows whose fields are all empty.
    #[must_use]
    pub fn clean(mut self) -> Self {
        if self.headers.is_empty() && self.rows.is_empty() {
            warn!("skipping clean of empty dataset");
            return self;
        }

        for header in &mut self.headers {
            *header = header.trim().to_string();
        }

        for row in &mut self.rows {
            if let Some(RawValue::Text(first)) = row.first_mut() {
                *first = first.trim().replace('\t', "");
            }
        }

        let before = self.rows.len();
        self.rows.retain(|row| !row.iter().all(RawValue::is_empty));
        if self.rows.len() != before {
            info!(dropped = before - self.rows.len(), "dropped empty rows");
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_reader() {
        let csv = "Line Item,2023,2022\nRevenue,\"1,200\",(300)\nCOGS,,50\n";
        let dataset = Dataset::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.headers, vec!["Line Item", "2023", "2022"]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows[0][1], RawValue::Text("1,200".to_string()));
        assert_eq!(dataset.rows[1][1], RawValue::Empty);
    }

    #[test]
    fn test_empty_csv() {
        let dataset = Dataset::from_csv_reader("".as_bytes()).unwrap();
        assert!(dataset.is_empty());
        assert!(dataset.headers.is_empty());
    }

    #[test]
    fn test_clean() {
        let csv = " Item ,2023\n\t Revenue \t,10\n,\n  ,   \nCash,5\n";
        let dataset = Dataset::from_csv_reader(csv.as_bytes()).unwrap().clean();
        assert_eq!(dataset.headers, vec!["Item", "2023"]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows[0][0], RawValue::Text("Revenue".to_string()));
        assert_eq!(dataset.rows[1][0], RawValue::Text("Cash".to_string()));
    }

    #[test]
    fn test_from_rows() {
        let dataset = Dataset::from_rows(vec![vec!["a", ""], vec!["b", "2"]]);
        assert_eq!(dataset.rows[0][1], RawValue::Empty);
        assert!(RawValue::Number(f64::NAN).is_empty());
        assert!(!RawValue::from(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()).is_empty());
    }
}
