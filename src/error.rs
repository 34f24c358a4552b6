//! Structured error kinds shared by every audit operation.

use std::path::PathBuf;
use thiserror::Error;

/// Operation-level failures.
///
/// Per-item problems (an unreadable file, a cell beyond the sheet
/// extent, an OCR miss) are never surfaced through this type; they are
/// accumulated into diagnostics on the result and summarized by the
/// emitter. Only errors that abort a whole operation appear here.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Scan target is missing or not a directory. Fatal to the scan.
    #[error("scan root is missing or not a directory: {}", .0.display())]
    InvalidRoot(PathBuf),

    /// Membership workbook has zero data rows after cleaning.
    #[error("membership workbook has no data rows after cleaning: {}", .0.display())]
    EmptyMembership(PathBuf),

    /// An expected worksheet is absent. Fatal for the membership sheet;
    /// the cell extractor downgrades this to null fields instead.
    #[error("worksheet '{sheet}' not found in {}", path.display())]
    SheetMissing { path: PathBuf, sheet: String },

    /// The OCR engine or PDF rasterizer could not be located.
    #[error("{tool} is not installed or cannot be located")]
    OcrUnavailable { tool: &'static str },

    /// Size threshold for the large-file scan must be strictly positive.
    #[error("size threshold must be strictly positive, got {0} MB")]
    InvalidThreshold(f64),

    #[error("failed reading workbook {}: {source}", path.display())]
    WorkbookRead {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("failed writing workbook {}: {source}", path.display())]
    WorkbookWrite {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AuditError>;
