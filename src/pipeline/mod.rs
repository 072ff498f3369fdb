//! Pipeline stages for section extraction and ranking.
//!
//! Each submodule implements one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! path ──▶ extract ──▶ dedup ──▶ rank ──┐   (per document, in parallel)
//!          (+normalize)                 │
//!                                       ▼
//!                             assemble (merge, order by length, top-N)
//! ```
//!
//! 1. [`normalize`]  : best-effort translation of foreign-script blocks
//! 2. [`extract`]    : page-tagged blocks longer than the noise threshold
//! 3. [`similarity`] : per-call TF-IDF space and cosine similarity
//! 4. [`dedup`]      : greedy forward near-duplicate suppression
//! 5. [`rank`]       : top-K blocks per document by query similarity
//! 6. [`assemble`]   : cross-document ordering, titles and the final report

pub mod assemble;
pub mod dedup;
pub mod extract;
pub mod normalize;
pub mod rank;
pub mod similarity;
