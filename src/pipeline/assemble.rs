//! Final cross-document ordering and report assembly.
//!
//! The merged pool of per-document winners is ordered by descending block
//! length, not by query relevance. Relevance only decides which blocks make
//! it into the pool; length decides their final rank. Ties keep pool order.

use crate::output::{ExtractedSection, RankedResult, ReportMetadata, SubsectionAnalysis, TextBlock};

/// Default number of sections in the final report.
pub const DEFAULT_TOP_N: usize = 10;

/// Default title width before truncation.
pub const DEFAULT_TITLE_CHARS: usize = 80;

const ELLIPSIS: &str = "...";

/// Order the pool by descending character length and keep the first `top_n`.
pub fn select_sections(mut pool: Vec<TextBlock>, top_n: usize) -> Vec<TextBlock> {
    pool.sort_by(|a, b| b.char_len().cmp(&a.char_len()));
    pool.truncate(top_n);
    pool
}

/// First line of the block, truncated to `max_chars` plus `...` when longer.
pub fn derive_title(text: &str, max_chars: usize) -> String {
    let first_line = text.trim().split('\n').next().unwrap_or("");
    if first_line.chars().count() > max_chars {
        let mut title: String = first_line.chars().take(max_chars).collect();
        title.push_str(ELLIPSIS);
        title
    } else {
        first_line.to_string()
    }
}

/// Build the report from already-selected blocks, ranked 1..N in order.
pub fn build_result(
    metadata: ReportMetadata,
    selected: &[TextBlock],
    title_max_chars: usize,
) -> RankedResult {
    let extracted_sections = selected
        .iter()
        .enumerate()
        .map(|(i, block)| ExtractedSection {
            document: block.document.clone(),
            page_number: block.page_number,
            section_title: derive_title(&block.text, title_max_chars),
            importance_rank: i + 1,
        })
        .collect();

    let subsection_analysis = selected
        .iter()
        .map(|block| SubsectionAnalysis {
            document: block.document.clone(),
            page_number: block.page_number,
            refined_text: block.text.clone(),
        })
        .collect();

    RankedResult {
        metadata,
        extracted_sections,
        subsection_analysis,
    }
}
