//! Progress-callback trait for per-document analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::RankingConfigBuilder::progress_callback`] to receive
//! events as the worker pool finishes each document. Callers can forward
//! them to a terminal progress bar, a channel or a log without the library
//! knowing how the host application reports progress.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdfrank::{AnalysisProgressCallback, RankingConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl AnalysisProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, document: &str, total: usize, kept_blocks: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}/{total} {document}: {kept_blocks} blocks");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//! let config = RankingConfig::builder()
//!     .progress_callback(counter as Arc<dyn AnalysisProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the analysis pipeline as it processes each document.
///
/// Documents run concurrently on the blocking pool, so `on_document_*`
/// methods may be called from different threads at the same time. All
/// methods default to no-ops.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called once before any document is dispatched.
    fn on_analysis_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called when a worker picks up a document.
    fn on_document_start(&self, document: &str, total_documents: usize) {
        let _ = (document, total_documents);
    }

    /// Called when a document's pipeline completes.
    ///
    /// `kept_blocks` is the number of blocks the document contributes to the
    /// ranking pool.
    fn on_document_complete(&self, document: &str, total_documents: usize, kept_blocks: usize) {
        let _ = (document, total_documents, kept_blocks);
    }

    /// Called when a document is excluded after a failure.
    fn on_document_error(&self, document: &str, total_documents: usize, error: &str) {
        let _ = (document, total_documents, error);
    }

    /// Called once after every document has been attempted.
    fn on_analysis_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RankingConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
