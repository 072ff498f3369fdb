//! Error types for the edgequake-pdfrank library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PdfRankError`]: **Fatal** for one collection. The report cannot be
//!   produced at all (missing PDFs, malformed input record, unwritable
//!   output). Returned as `Err(PdfRankError)` from the `analyze*` functions.
//!
//! * [`DocumentError`]: **Non-fatal**. A single document failed (corrupt
//!   PDF, panicked worker) but the other documents of the collection are
//!   fine. The document is dropped from the ranking pool and reported through
//!   [`crate::output::AnalysisStats`] and the progress callback.
//!
//! Translation failures never show up here: the normalizer falls back to
//! the original text and the pipeline carries on.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdfrank library.
#[derive(Debug, Error)]
pub enum PdfRankError {
    // ── Collection errors ─────────────────────────────────────────────────
    /// One or more documents listed in the input record are absent.
    #[error("Missing PDFs in '{collection}': {missing:?}")]
    MissingInputs {
        collection: String,
        missing: Vec<String>,
    },

    /// The collection input record does not exist.
    #[error("Input record not found: '{path}'")]
    InputNotFound { path: PathBuf },

    /// The input record exists but could not be parsed.
    #[error("Invalid input record '{path}': {detail}")]
    InvalidInput { path: PathBuf, detail: String },

    /// Every document of the collection failed; there is nothing to rank.
    #[error("All {total} documents failed.\nFirst error: {first_error}")]
    AllDocumentsFailed { total: usize, first_error: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF file was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render returned an error while reading a page's text.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library in the working\n\
directory, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output report file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not list the batch base directory.
    #[error("Failed to read directory '{path}': {source}")]
    DirectoryReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The block source could not read the document.
    #[error("{document}: extraction failed: {detail}")]
    ExtractionFailed { document: String, detail: String },

    /// The worker running the document pipeline panicked or was cancelled.
    #[error("{document}: worker task failed: {detail}")]
    TaskFailed { document: String, detail: String },
}

impl DocumentError {
    /// File name of the document the error belongs to.
    pub fn document(&self) -> &str {
        match self {
            DocumentError::ExtractionFailed { document, .. }
            | DocumentError::TaskFailed { document, .. } => document,
        }
    }
}
