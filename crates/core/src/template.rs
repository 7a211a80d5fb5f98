//! Immutable template handle shared by every merge.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use finmerge_sheet::Book;
use tracing::info;

use crate::config::REQUIRED_SHEETS;
use crate::error::{MergeError, MergeResult};

/// A validated template workbook.
///
/// Cloning is cheap and the workbook is never mutated; each merge works on
/// its own [`Template::working_copy`].
#[derive(Debug, Clone)]
pub struct Template {
    book: Arc<Book>,
    source: Option<PathBuf>,
}

impl Template {
    /// Load and validate a template from an `.xlsx` file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> MergeResult<Self> {
        let path = path.as_ref();
        let book = Book::from_xlsx(path)?;
        require_sheets(&book)?;
        info!(path = %path.display(), sheets = book.sheet_count(), "loaded template");
        Ok(Template {
            book: Arc::new(book),
            source: Some(path.to_path_buf()),
        })
    }

    /// Wrap an in-memory workbook.
    pub fn from_book(book: Book) -> MergeResult<Self> {
        require_sheets(&book)?;
        Ok(Template {
            book: Arc::new(book),
            source: None,
        })
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    /// File the template was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// An independent, mutable copy for one merge.
    pub fn working_copy(&self) -> Book {
        Book::clone(&self.book)
    }
}

/// Fail unless all three statement sheets are present (exact names).
pub fn require_sheets(book: &Book) -> MergeResult<()> {
    match REQUIRED_SHEETS.iter().find(|name| !book.has_sheet(name)) {
        Some(missing) => Err(MergeError::missing_sheet(*missing, book.sheet_names())),
        None => Ok(()),
    }
}
