//! Error types for finmerge.
//!
//! Only structural problems (missing sheets, malformed layout) and a failed
//! recalculation surface as errors. Per-cell coercion problems and
//! unresolvable formula ranges are logged and recovered where they occur.

use finmerge_sheet::SheetError;
use thiserror::Error;

/// Result type for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;

/// Errors that can abort a merge.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A required sheet is absent from the template or working copy.
    #[error("Required sheet '{name}' missing in template. Available: {available:?}")]
    MissingSheet {
        name: String,
        available: Vec<String>,
    },

    /// A formula region or display window could not be parsed.
    #[error("Invalid range '{range}' configured for sheet '{sheet}': {reason}")]
    InvalidRegion {
        sheet: String,
        range: String,
        reason: String,
    },

    /// Any other layout configuration problem.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The external recalculation step failed.
    #[error("Recalculation failed: {0}")]
    Recalculation(String),

    /// A dataset could not be read.
    #[error("Dataset error: {0}")]
    Dataset(#[from] csv::Error),

    /// Sheet model error.
    #[error(transparent)]
    Sheet(#[from] SheetError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MergeError {
    /// Create a missing-sheet error listing what the workbook does contain.
    pub fn missing_sheet<I, S>(name: impl Into<String>, available: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingSheet {
            name: name.into(),
            available: available.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an invalid-region error.
    pub fn invalid_region(
        sheet: impl Into<String>,
        range: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidRegion {
            sheet: sheet.into(),
            range: range.into(),
            reason: reason.into(),
        }
    }

    /// Create a recalculation error.
    pub fn recalculation(message: impl Into<String>) -> Self {
        Self::Recalculation(message.into())
    }

    /// True for errors raised by configuration checks, before any mutation.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingSheet { .. } | Self::InvalidRegion { .. } | Self::Configuration(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sheet_lists_available() {
        let err = MergeError::missing_sheet("Balance Sheet", ["Income Statement", "Notes"]);
        assert_eq!(
            err.to_string(),
            "Required sheet 'Balance Sheet' missing in template. Available: [\"Income Statement\", \"Notes\"]"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_recalculation_is_not_configuration() {
        assert!(!MergeError::recalculation("soffice exited with 1").is_configuration());
    }
}
