//! Greedy near-duplicate suppression.
//!
//! One forward pass over the blocks: each block not yet suppressed is kept
//! and suppresses every later block whose cosine similarity with it exceeds
//! the threshold. Suppression only flows from a *kept* block forward, so this
//! is not a transitive closure. Two blocks that are each similar to a
//! suppressed third block are compared to each other directly and may both
//! survive.
//!
//! Within the space fitted over the input, the kept blocks are pairwise at
//! or below the threshold. Re-running on the output refits the space over
//! fewer texts, which raises the weight of terms the survivors share, so a
//! pair just below the threshold in the first fit can cross it in the second
//! and a rerun may remove more. A rerun removes nothing when every kept pair
//! stays at or below the threshold after refitting.

use crate::output::TextBlock;
use crate::pipeline::similarity::VectorSpace;
use tracing::debug;

/// Default exclusive similarity bound above which a block is a duplicate.
pub const DEFAULT_DEDUP_THRESHOLD: f64 = 0.8;

/// Indices of the blocks kept by greedy suppression over `space`.
pub fn retained_indices(space: &VectorSpace, threshold: f64) -> Vec<usize> {
    let n = space.len();
    let mut suppressed = vec![false; n];
    let mut kept = Vec::new();

    for i in 0..n {
        if suppressed[i] {
            continue;
        }
        kept.push(i);
        for j in (i + 1)..n {
            if !suppressed[j] && space.cosine(i, j) > threshold {
                suppressed[j] = true;
            }
        }
    }
    kept
}

/// Drop near-duplicates, preserving the relative order of kept blocks.
pub fn dedup(blocks: Vec<TextBlock>, threshold: f64) -> Vec<TextBlock> {
    if blocks.len() < 2 {
        return blocks;
    }
    let texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
    let space = VectorSpace::fit(&texts);
    let kept = retained_indices(&space, threshold);

    debug!(
        "Dedup kept {}/{} blocks (threshold {})",
        kept.len(),
        blocks.len(),
        threshold
    );

    let mut keep = vec![false; blocks.len()];
    for i in kept {
        keep[i] = true;
    }
    blocks
        .into_iter()
        .zip(keep)
        .filter_map(|(block, k)| k.then_some(block))
        .collect()
}
