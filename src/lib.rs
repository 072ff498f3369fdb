//! # edgequake-pdfrank
//!
//! Pull the most relevant sections out of a batch of PDFs for a given
//! persona and task.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF (one task per document, run in parallel)
//!  │
//!  ├─ 1. Extract    page-tagged text blocks, > 100 chars
//!  ├─ 2. Normalize  translate foreign-script blocks (best effort)
//!  ├─ 3. Dedup      greedy TF-IDF near-duplicate suppression (cos > 0.8)
//!  └─ 4. Rank       top-2 blocks by cosine similarity to the query
//!
//! Collection
//!  ├─ 5. Merge      pool every document's top-2
//!  ├─ 6. Order      descending block length, keep 10
//!  └─ 7. Report     titles, dense ranks, JSON written next to the input
//! ```
//!
//! The query is `"<persona role> needs to <task>"`. Each deduplication and
//! ranking call fits its own TF-IDF space over exactly the texts it
//! compares; nothing is shared between calls or documents.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfrank::{analyze_collection, RankingConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RankingConfig::default();
//!     let outcome = analyze_collection("Collection 1", &config).await?;
//!     eprintln!("{} → {}", outcome.name, outcome.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfrank` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod batch;
pub mod collection;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{
    analyze_collection, analyze_collection_output, analyze_document, analyze_documents,
    analyze_sync, write_report, DocumentAnalysis,
};
pub use batch::run_all_collections;
pub use collection::{CollectionInput, CollectionPaths, DocumentRef, JobToBeDone, Persona};
pub use config::{CollectionLayout, RankingConfig, RankingConfigBuilder, TranslationConfig};
pub use error::{DocumentError, PdfRankError};
pub use output::{
    AnalysisOutput, AnalysisStats, BatchReport, CollectionOutcome, ExtractedSection, RankedResult,
    ReportMetadata, SubsectionAnalysis, TextBlock,
};
pub use pipeline::extract::{BlockBounds, BlockSource, PdfiumBlockSource, RawBlock, TextSegment};
pub use pipeline::normalize::{IdentityNormalizer, ScriptNormalizer, TextNormalizer};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
