//! # Export Error Types
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Export Failure Kinds                              │
//! │                                                                         │
//! │  ┌─────────────────────┐  ┌──────────────────────┐  ┌───────────────┐  │
//! │  │  CaptureFailure     │  │ PageExtractionDegraded│  │ WriteFailure  │  │
//! │  │  (terminal)         │  │ (NOT an error)        │  │ (terminal)    │  │
//! │  │                     │  │                       │  │               │  │
//! │  │  empty / zero-area  │  │  one page clamped or  │  │  save failed  │  │
//! │  │  bitmap, no file    │  │  skipped, logged,     │  │  surfaced to  │  │
//! │  │  is produced        │  │  export continues     │  │  the caller   │  │
//! │  └─────────────────────┘  └──────────────────────┘  └───────────────┘  │
//! │                                                                         │
//! │  No automatic retries. A failed export is re-triggered by the caller.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::ops::Range;

use quote_core::ValidationError;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors that abort an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The surface could not be captured or produced a zero-area bitmap.
    #[error("Capture failed: {0}")]
    CaptureFailure(String),

    /// The page document could not be assembled or saved.
    #[error("Write failed: {0}")]
    WriteFailure(String),

    /// Another export on the same pipeline has not finished yet.
    #[error("An export is already in progress")]
    ExportInProgress,

    /// Page size and margins leave no usable content area.
    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),

    /// The requested filename was rejected.
    #[error("Invalid filename: {0}")]
    InvalidFilename(#[from] ValidationError),

    /// A blocking stage was cancelled because the runtime is shutting down.
    #[error("Export interrupted: {0}")]
    Interrupted(String),
}

/// Failure to copy one page's rows out of the source bitmap.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SliceError {
    /// The requested rows reach past the source bitmap.
    #[error("rows {start}..{end} exceed source height {height}")]
    OutOfBounds { start: u32, end: u32, height: u32 },

    /// Drawing the slice failed downstream.
    #[error("drawing failed: {0}")]
    Draw(String),
}

/// Record of a page whose slice could not be extracted as planned.
///
/// This is not an error: the page was either clamped to the rows that could
/// be extracted or skipped, and the export went on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageExtractionDegraded {
    /// Zero-based page index in the plan.
    pub page: usize,
    /// Source rows the plan asked for.
    pub requested: Range<u32>,
    /// Rows actually placed on the page; `None` if the page was skipped.
    pub recovered: Option<Range<u32>>,
    /// Why the planned extraction failed.
    pub reason: String,
}

impl PageExtractionDegraded {
    /// True if the page was dropped from the output.
    pub fn is_skipped(&self) -> bool {
        self.recovered.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ExportError::CaptureFailure("surface has zero height".to_string());
        assert_eq!(err.to_string(), "Capture failed: surface has zero height");

        let err = SliceError::OutOfBounds {
            start: 10,
            end: 20,
            height: 15,
        };
        assert_eq!(err.to_string(), "rows 10..20 exceed source height 15");
    }

    #[test]
    fn test_degradation_skip_flag() {
        let skipped = PageExtractionDegraded {
            page: 2,
            requested: 100..200,
            recovered: None,
            reason: "drawing failed".into(),
        };
        assert!(skipped.is_skipped());

        let clamped = PageExtractionDegraded {
            recovered: Some(100..150),
            ..skipped
        };
        assert!(!clamped.is_skipped());
    }
}
