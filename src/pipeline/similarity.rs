//! TF-IDF vector space and cosine similarity.
//!
//! A [`VectorSpace`] is fitted over exactly the texts handed to
//! [`VectorSpace::fit`]: vocabulary and IDF weights come from that set and
//! nothing else. Scores from two different fits are not comparable, so every
//! deduplication or ranking call builds its own space and drops it when done.
//!
//! Weighting follows the common smoothed TF-IDF scheme:
//!
//! ```text
//! tf(t, d)  = raw count of t in d
//! idf(t)    = ln((1 + n) / (1 + df(t))) + 1
//! w(t, d)   = tf · idf, rows L2-normalised
//! ```
//!
//! Tokens are lower-cased runs of two or more word characters.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static RE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// Split `text` into lower-cased terms.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    RE_TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// A sparse row: `(term index, weight)` pairs sorted by term index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (ti, wi) = self.entries[i];
            let (tj, wj) = other.entries[j];
            match ti.cmp(&tj) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += wi * wj;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// True when the vector has no non-zero weight.
    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|(_, w)| *w == 0.0)
    }

    /// Cosine similarity in `[0, 1]`; zero when either vector is all-zero.
    pub fn cosine(&self, other: &SparseVector) -> f64 {
        let denom = self.norm() * other.norm();
        if denom == 0.0 {
            return 0.0;
        }
        (self.dot(other) / denom).clamp(0.0, 1.0)
    }
}

/// Term-weighted matrix fitted over one set of texts.
#[derive(Debug, Clone, Default)]
pub struct VectorSpace {
    vocabulary: HashMap<String, usize>,
    rows: Vec<SparseVector>,
}

impl VectorSpace {
    /// Fit vocabulary and IDF weights over `texts`, one row per text.
    pub fn fit<S: AsRef<str>>(texts: &[S]) -> Self {
        let tokenized: Vec<Vec<String>> = texts.iter().map(|t| tokenize(t.as_ref())).collect();

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: Vec<usize> = Vec::new();
        let mut counts: Vec<HashMap<usize, usize>> = Vec::with_capacity(tokenized.len());

        for tokens in &tokenized {
            let mut tf: HashMap<usize, usize> = HashMap::new();
            for token in tokens {
                let next = vocabulary.len();
                let idx = *vocabulary.entry(token.clone()).or_insert(next);
                if idx == doc_freq.len() {
                    doc_freq.push(0);
                }
                *tf.entry(idx).or_insert(0) += 1;
            }
            for &idx in tf.keys() {
                doc_freq[idx] += 1;
            }
            counts.push(tf);
        }

        let n = texts.len() as f64;
        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .into_iter()
            .map(|tf| {
                let mut entries: Vec<(usize, f64)> = tf
                    .into_iter()
                    .map(|(idx, count)| (idx, count as f64 * idf[idx]))
                    .collect();
                entries.sort_unstable_by_key(|(idx, _)| *idx);
                let mut row = SparseVector { entries };
                let norm = row.norm();
                if norm > 0.0 {
                    for (_, w) in &mut row.entries {
                        *w /= norm;
                    }
                }
                row
            })
            .collect();

        Self { vocabulary, rows }
    }

    /// Number of fitted rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of distinct terms seen during fitting.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// The weighted vector of row `i`.
    ///
    /// # Panics
    /// If `i >= self.len()`.
    pub fn row(&self, i: usize) -> &SparseVector {
        &self.rows[i]
    }

    /// Cosine similarity between rows `i` and `j`.
    pub fn cosine(&self, i: usize, j: usize) -> f64 {
        self.rows[i].cosine(&self.rows[j])
    }

    /// Similarity of every row against `query`, in row order.
    pub fn similarities_to(&self, query: &SparseVector) -> Vec<f64> {
        self.rows.iter().map(|row| row.cosine(query)).collect()
    }
}
