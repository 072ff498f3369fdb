//! Query-relevance ranking of one document's blocks.

use crate::output::TextBlock;
use crate::pipeline::similarity::VectorSpace;

/// Default number of blocks kept per document.
pub const DEFAULT_TOP_K: usize = 2;

/// Score every block against `query` within one fresh vector space.
///
/// The space is fitted over the block texts followed by the query, so the
/// query is the last row.
pub fn score_blocks(blocks: &[TextBlock], query: &str) -> Vec<f64> {
    if blocks.is_empty() {
        return Vec::new();
    }
    let mut texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
    texts.push(query);
    let space = VectorSpace::fit(&texts);
    let query_row = space.len() - 1;
    (0..blocks.len())
        .map(|i| space.cosine(i, query_row))
        .collect()
}

/// The `top_k` blocks by descending similarity to `query`.
///
/// Ties keep their original relative order. Blocks sharing no term with the
/// query score zero and are never returned.
pub fn rank(blocks: Vec<TextBlock>, query: &str, top_k: usize) -> Vec<TextBlock> {
    let scores = score_blocks(&blocks, query);
    let mut scored: Vec<(TextBlock, f64)> = blocks
        .into_iter()
        .zip(scores)
        .filter(|(_, score)| *score > 0.0)
        .collect();
    // `sort_by` is stable.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.into_iter().take(top_k).map(|(b, _)| b).collect()
}
