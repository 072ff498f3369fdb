//! Configuration types for section extraction and ranking.
//!
//! All pipeline behaviour is controlled through [`RankingConfig`], built via
//! its [`RankingConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config across worker threads and to log exactly which
//! thresholds produced a given report.

use crate::error::PdfRankError;
use crate::pipeline::extract::BlockSource;
use crate::pipeline::normalize::TextNormalizer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

/// Configuration for analysing a collection of PDFs.
///
/// # Example
/// ```rust
/// use edgequake_pdfrank::RankingConfig;
///
/// let config = RankingConfig::builder()
///     .concurrency(4)
///     .final_top_n(5)
///     .build()
///     .unwrap();
/// assert_eq!(config.per_document_top_k, 2);
/// ```
#[derive(Clone)]
pub struct RankingConfig {
    /// Blocks whose stripped length is at most this many characters are
    /// dropped as headers, footers and noise. Default: 100.
    pub min_block_chars: usize,

    /// Cosine similarity above which a later block is suppressed as a
    /// near-duplicate of an earlier kept one. Exclusive. Default: 0.8.
    pub dedup_threshold: f64,

    /// Blocks kept per document after ranking against the query. Default: 2.
    pub per_document_top_k: usize,

    /// Sections kept in the final report. Default: 10.
    pub final_top_n: usize,

    /// Maximum title width before an ellipsis is appended. Default: 80.
    pub title_max_chars: usize,

    /// Number of documents processed in parallel. Default: available cores.
    pub concurrency: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// External translator settings used when no `normalizer` is supplied.
    pub translation: TranslationConfig,

    /// File names expected inside each collection directory.
    pub layout: CollectionLayout,

    /// Pre-constructed normalizer. Takes precedence over `translation`.
    pub normalizer: Option<Arc<dyn TextNormalizer>>,

    /// Pre-constructed block source. Defaults to the pdfium reader.
    pub block_source: Option<Arc<dyn BlockSource>>,

    /// Receives per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            min_block_chars: 100,
            dedup_threshold: 0.8,
            per_document_top_k: 2,
            final_top_n: 10,
            title_max_chars: 80,
            concurrency: default_concurrency(),
            password: None,
            translation: TranslationConfig::default(),
            layout: CollectionLayout::default(),
            normalizer: None,
            block_source: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RankingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RankingConfig")
            .field("min_block_chars", &self.min_block_chars)
            .field("dedup_threshold", &self.dedup_threshold)
            .field("per_document_top_k", &self.per_document_top_k)
            .field("final_top_n", &self.final_top_n)
            .field("title_max_chars", &self.title_max_chars)
            .field("concurrency", &self.concurrency)
            .field("translation", &self.translation)
            .field("layout", &self.layout)
            .field("normalizer", &self.normalizer.as_ref().map(|_| "<dyn TextNormalizer>"))
            .field("block_source", &self.block_source.as_ref().map(|_| "<dyn BlockSource>"))
            .finish()
    }
}

impl RankingConfig {
    /// Create a new builder for `RankingConfig`.
    pub fn builder() -> RankingConfigBuilder {
        RankingConfigBuilder {
            config: Self::default(),
        }
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Builder for [`RankingConfig`].
#[derive(Debug)]
pub struct RankingConfigBuilder {
    config: RankingConfig,
}

impl RankingConfigBuilder {
    pub fn min_block_chars(mut self, n: usize) -> Self {
        self.config.min_block_chars = n;
        self
    }

    pub fn dedup_threshold(mut self, t: f64) -> Self {
        self.config.dedup_threshold = t;
        self
    }

    pub fn per_document_top_k(mut self, k: usize) -> Self {
        self.config.per_document_top_k = k.max(1);
        self
    }

    pub fn final_top_n(mut self, n: usize) -> Self {
        self.config.final_top_n = n.max(1);
        self
    }

    pub fn title_max_chars(mut self, n: usize) -> Self {
        self.config.title_max_chars = n.max(1);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn translation(mut self, translation: TranslationConfig) -> Self {
        self.config.translation = translation;
        self
    }

    pub fn layout(mut self, layout: CollectionLayout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn normalizer(mut self, normalizer: Arc<dyn TextNormalizer>) -> Self {
        self.config.normalizer = Some(normalizer);
        self
    }

    pub fn block_source(mut self, source: Arc<dyn BlockSource>) -> Self {
        self.config.block_source = Some(source);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RankingConfig, PdfRankError> {
        let c = &self.config;
        if !(0.0..=1.0).contains(&c.dedup_threshold) {
            return Err(PdfRankError::InvalidConfig(format!(
                "Dedup threshold must be 0.0–1.0, got {}",
                c.dedup_threshold
            )));
        }
        if c.translation.enabled && c.translation.command.trim().is_empty() {
            return Err(PdfRankError::InvalidConfig(
                "Translation command must not be empty".into(),
            ));
        }
        if c.translation.script_start > c.translation.script_end {
            return Err(PdfRankError::InvalidConfig(format!(
                "Script range start U+{:04X} is after end U+{:04X}",
                c.translation.script_start as u32, c.translation.script_end as u32
            )));
        }
        Ok(self.config)
    }
}

/// External translator invocation settings.
///
/// The default targets apertium's Japanese→English pair and only fires on
/// text containing Hiragana or Katakana (U+3040–U+30FF).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// When false, text is never translated.
    pub enabled: bool,
    /// Translator executable, looked up on `PATH`.
    pub command: String,
    pub source_lang: String,
    pub target_lang: String,
    /// First code point of the script that triggers translation.
    pub script_start: char,
    /// Last code point (inclusive) of the triggering script.
    pub script_end: char,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "apertium".to_string(),
            source_lang: "ja".to_string(),
            target_lang: "en".to_string(),
            script_start: '\u{3040}',
            script_end: '\u{30FF}',
        }
    }
}

impl TranslationConfig {
    /// The `source-target` argument passed to the translator.
    pub fn language_pair(&self) -> String {
        format!("{}-{}", self.source_lang, self.target_lang)
    }

    pub fn script_range(&self) -> RangeInclusive<char> {
        self.script_start..=self.script_end
    }
}

/// Names of the files a collection directory is expected to contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionLayout {
    /// Input record file name. Default: `challenge1b_input.json`.
    pub input_file: String,
    /// Sub-directory holding the PDFs. Default: `PDFs`.
    pub pdf_dir: String,
    /// Report file name written next to the input. Default: `challenge1b_output.json`.
    pub output_file: String,
}

impl Default for CollectionLayout {
    fn default() -> Self {
        Self {
            input_file: "challenge1b_input.json".to_string(),
            pdf_dir: "PDFs".to_string(),
            output_file: "challenge1b_output.json".to_string(),
        }
    }
}
