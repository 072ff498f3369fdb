//! Data records flowing through and out of the ranking pipeline.
//!
//! [`TextBlock`] is the atomic unit every stage consumes. [`RankedResult`]
//! is the serialised report; its field order is the on-disk key order.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A contiguous span of extracted text from one page of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Stripped (and possibly translated) block text.
    pub text: String,
    /// 1-indexed page number.
    pub page_number: usize,
    /// Base file name of the source document.
    pub document: String,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, page_number: usize, document: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page_number,
            document: document.into(),
        }
    }

    /// Length in characters, the key of the final cross-document ordering.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// The final report for one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub metadata: ReportMetadata,
    pub extracted_sections: Vec<ExtractedSection>,
    pub subsection_analysis: Vec<SubsectionAnalysis>,
}

/// Run metadata echoed into the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub persona: String,
    pub job_to_be_done: String,
    pub input_documents: Vec<String>,
    pub timestamp: String,
}

/// One ranked section heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub document: String,
    pub page_number: usize,
    pub section_title: String,
    /// Dense 1-based rank over the final list.
    pub importance_rank: usize,
}

/// Full text of one ranked section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsectionAnalysis {
    pub document: String,
    pub page_number: usize,
    pub refined_text: String,
}

/// Counters gathered while analysing one collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Documents listed in the input record.
    pub total_documents: usize,
    /// Documents whose pipeline completed.
    pub processed_documents: usize,
    /// Documents excluded from the pool after a failure.
    pub failed_documents: usize,
    /// Blocks that survived the length filter, summed over documents.
    pub extracted_blocks: usize,
    /// Blocks left after near-duplicate suppression, summed over documents.
    pub unique_blocks: usize,
    /// Size of the merged per-document top-K pool.
    pub pooled_blocks: usize,
    /// Wall-clock time for the whole collection.
    pub total_duration_ms: u64,
    /// Per-document failures, in document order.
    pub errors: Vec<DocumentError>,
}

/// A report together with the stats of the run that produced it.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub result: RankedResult,
    pub stats: AnalysisStats,
}

/// Outcome of [`crate::analyze::analyze_collection`].
#[derive(Debug, Clone)]
pub struct CollectionOutcome {
    /// Collection directory name.
    pub name: String,
    /// Where the report was written.
    pub output_path: PathBuf,
    pub stats: AnalysisStats,
}

/// Summary of [`crate::batch::run_all_collections`].
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Collections that produced a report.
    pub processed: Vec<CollectionOutcome>,
    /// Collections that failed, with the error that stopped them.
    pub failed: Vec<(String, crate::error::PdfRankError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
