use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A book containing multiple sheets (preserves insertion order)
/// and workbook-level defined names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    name: String,
    sheets: IndexMap<String, Sheet>,
    defined_names: IndexMap<String, String>,
}

impl Book {
    /// Create a new empty book
    #[must_use]
    pub fn new() -> Self {
        Self::with_name("Book1")
    }

    /// Create a new empty book with a name
    #[must_use]
    pub fn with_name(name: &str) -> Self {
        Book {
            name: name.to_string(),
            sheets: IndexMap::new(),
            defined_names: IndexMap::new(),
        }
    }

    /// Get the book name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of sheets
    #[must_use]
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Get all sheet names in order
    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.keys().map(String::as_str).collect()
    }

    /// Check if a sheet exists (exact, case-sensitive match)
    #[must_use]
    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    /// Get a sheet by name
    pub fn get_sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets
            .get(name)
            .ok_or_else(|| SheetError::SheetNotFound {
                name: name.to_string(),
            })
    }

    /// Get a mutable sheet by name
    pub fn get_sheet_mut(&mut self, name: &str) -> Result<&mut Sheet> {
        self.sheets
            .get_mut(name)
            .ok_or_else(|| SheetError::SheetNotFound {
                name: name.to_string(),
            })
    }

    /// Add a sheet to the book
    pub fn add_sheet(&mut self, name: &str, sheet: Sheet) -> Result<()> {
        if self.sheets.contains_key(name) {
            return Err(SheetError::SheetAlreadyExists {
                name: name.to_string(),
            });
        }

        let mut sheet = sheet;
        sheet.set_name(name);
        self.sheets.insert(name.to_string(), sheet);
        Ok(())
    }

    /// Iterate over sheets in order
    pub fn sheets(&self) -> impl Iterator<Item = (&str, &Sheet)> {
        self.sheets.iter().map(|(name, sheet)| (name.as_str(), sheet))
    }

    /// Iterate mutably over sheets in order
    pub fn sheets_mut(&mut self) -> impl Iterator<Item = (&str, &mut Sheet)> {
        self.sheets
            .iter_mut()
            .map(|(name, sheet)| (name.as_str(), sheet))
    }

    /// Register a workbook-level name (e.g. `Revenue` -> `'Income Statement'!$B$10:$B$40`)
    pub fn define_name(&mut self, name: &str, refers_to: &str) {
        self.defined_names
            .insert(name.to_string(), refers_to.to_string());
    }

    /// Defined names in insertion order
    #[must_use]
    pub fn defined_names(&self) -> &IndexMap<String, String> {
        &self.defined_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let mut book = Book::new();
        book.add_sheet("Income Statement", Sheet::new()).unwrap();
        book.add_sheet("Balance Sheet", Sheet::new()).unwrap();

        assert_eq!(book.sheet_count(), 2);
        assert_eq!(book.sheet_names(), vec!["Income Statement", "Balance Sheet"]);
        assert_eq!(book.get_sheet("Balance Sheet").unwrap().name(), "Balance Sheet");
        assert!(!book.has_sheet("balance sheet"));
    }

    #[test]
    fn test_duplicate_sheet() {
        let mut book = Book::new();
        book.add_sheet("Data", Sheet::new()).unwrap();
        assert!(matches!(
            book.add_sheet("Data", Sheet::new()),
            Err(SheetError::SheetAlreadyExists { .. })
        ));
    }

    #[test]
    fn test_missing_sheet() {
        let book = Book::new();
        assert!(matches!(
            book.get_sheet("Nope"),
            Err(SheetError::SheetNotFound { name }) if name == "Nope"
        ));
    }

    #[test]
    fn test_defined_names() {
        let mut book = Book::new();
        book.define_name("Revenue", "='Income Statement'!$B$10:$B$40");
        assert_eq!(
            book.defined_names().get("Revenue").map(String::as_str),
            Some("='Income Statement'!$B$10:$B$40")
        );
    }
}
