//! Collection analysis entry points.
//!
//! Each document runs the full per-document pipeline
//! (`extract → dedup → rank`) as an independent task on tokio's blocking
//! pool, at most `config.concurrency` at a time. Tasks share nothing but
//! read-only inputs; every vector space is owned by the task that fitted it.
//! Once all tasks have joined, the winners are merged, ordered and truncated
//! sequentially.

use crate::collection::{load_input, CollectionInput, CollectionPaths};
use crate::config::RankingConfig;
use crate::error::{DocumentError, PdfRankError};
use crate::output::{AnalysisOutput, AnalysisStats, CollectionOutcome, RankedResult, ReportMetadata, TextBlock};
use crate::pipeline::extract::{document_name, extract_blocks, BlockSource, PdfiumBlockSource};
use crate::pipeline::normalize::{resolve_normalizer, TextNormalizer};
use crate::pipeline::{assemble, dedup, rank};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of the per-document pipeline.
#[derive(Debug, Clone)]
pub struct DocumentAnalysis {
    pub document: String,
    /// Blocks that passed the length filter.
    pub extracted_blocks: usize,
    /// Blocks left after near-duplicate suppression.
    pub unique_blocks: usize,
    /// Top-K blocks by query similarity.
    pub top_blocks: Vec<TextBlock>,
}

/// Run `extract → dedup → rank` for one document.
///
/// Blocking: call from a thread that may block (see [`analyze_documents`]).
pub fn analyze_document(
    path: &Path,
    query: &str,
    config: &RankingConfig,
    source: &dyn BlockSource,
    normalizer: &dyn TextNormalizer,
) -> Result<DocumentAnalysis, PdfRankError> {
    let blocks = extract_blocks(
        source,
        normalizer,
        path,
        config.password.as_deref(),
        config.min_block_chars,
    )?;
    let extracted_blocks = blocks.len();
    let unique = dedup::dedup(blocks, config.dedup_threshold);
    let unique_blocks = unique.len();
    let top_blocks = rank::rank(unique, query, config.per_document_top_k);

    Ok(DocumentAnalysis {
        document: document_name(path),
        extracted_blocks,
        unique_blocks,
        top_blocks,
    })
}

/// Analyse every document of `input` found under `pdf_dir`.
///
/// # Errors
/// Returns `Err(PdfRankError::AllDocumentsFailed)` when documents were
/// listed but none could be processed. Individual failures are logged,
/// counted in the stats and excluded from the ranking pool.
pub async fn analyze_documents(
    input: &CollectionInput,
    pdf_dir: &Path,
    config: &RankingConfig,
) -> Result<AnalysisOutput, PdfRankError> {
    let start = Instant::now();
    let query = input.query();
    let filenames = input.filenames();
    let total = filenames.len();
    info!("Analysing {} documents for query: {}", total, query);

    let source: Arc<dyn BlockSource> = match config.block_source {
        Some(ref s) => Arc::clone(s),
        None => Arc::new(PdfiumBlockSource),
    };
    let normalizer = resolve_normalizer(config.normalizer.as_ref(), &config.translation);

    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_start(total);
    }

    let outcomes = process_concurrent(
        filenames.iter().map(|f| pdf_dir.join(f)).collect(),
        &query,
        config,
        source,
        normalizer,
    )
    .await;

    // ── Merge in document order ──────────────────────────────────────────
    let mut stats = AnalysisStats {
        total_documents: total,
        ..AnalysisStats::default()
    };
    let mut pool: Vec<TextBlock> = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(doc) => {
                stats.processed_documents += 1;
                stats.extracted_blocks += doc.extracted_blocks;
                stats.unique_blocks += doc.unique_blocks;
                pool.extend(doc.top_blocks);
            }
            Err(e) => {
                stats.failed_documents += 1;
                stats.errors.push(e);
            }
        }
    }
    stats.pooled_blocks = pool.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_complete(total, stats.processed_documents);
    }

    if total > 0 && stats.processed_documents == 0 {
        let first_error = stats
            .errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(PdfRankError::AllDocumentsFailed { total, first_error });
    }

    let selected = assemble::select_sections(pool, config.final_top_n);
    let metadata = ReportMetadata {
        persona: input.persona.role.clone(),
        job_to_be_done: input.job_to_be_done.task.clone(),
        input_documents: filenames,
        timestamp: timestamp_now(),
    };
    let result = assemble::build_result(metadata, &selected, config.title_max_chars);
    stats.total_duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "Analysis complete: {}/{} documents, {} pooled blocks, {} sections, {}ms",
        stats.processed_documents,
        total,
        stats.pooled_blocks,
        result.extracted_sections.len(),
        stats.total_duration_ms
    );

    Ok(AnalysisOutput { result, stats })
}

/// Validate, analyse and write the report of one collection directory.
///
/// Nothing is written when a listed PDF is missing.
pub async fn analyze_collection(
    root: impl AsRef<Path>,
    config: &RankingConfig,
) -> Result<CollectionOutcome, PdfRankError> {
    let paths = CollectionPaths::new(root.as_ref(), &config.layout);
    let output = analyze_collection_output(&paths, config).await?;
    write_report(&paths.output_file, &output.result)?;
    info!("Wrote {}", paths.output_file.display());

    Ok(CollectionOutcome {
        name: paths.name(),
        output_path: paths.output_file,
        stats: output.stats,
    })
}

/// Like [`analyze_collection`] but returns the report instead of writing it.
pub async fn analyze_collection_output(
    paths: &CollectionPaths,
    config: &RankingConfig,
) -> Result<AnalysisOutput, PdfRankError> {
    let input = load_input(&paths.input_file)?;

    let missing = input.missing_documents(&paths.pdf_dir);
    if !missing.is_empty() {
        return Err(PdfRankError::MissingInputs {
            collection: paths.name(),
            missing,
        });
    }

    analyze_documents(&input, &paths.pdf_dir, config).await
}

/// Synchronous wrapper around [`analyze_collection`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    root: impl AsRef<Path>,
    config: &RankingConfig,
) -> Result<CollectionOutcome, PdfRankError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PdfRankError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze_collection(root, config))
}

/// Serialise `result` as pretty JSON and write it atomically.
///
/// The report is written to a temp file in the target directory, then
/// renamed over `path`, so readers never observe a partial file.
pub fn write_report(path: &Path, result: &RankedResult) -> Result<(), PdfRankError> {
    let write_err = |source: std::io::Error| PdfRankError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_string_pretty(result)
        .map_err(|e| PdfRankError::Internal(format!("Failed to serialise report: {}", e)))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(json.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Local time, e.g. `2025-07-10 15:31:22.632389`.
fn timestamp_now() -> String {
    chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

/// Fan documents out over the blocking pool, results in document order.
async fn process_concurrent(
    paths: Vec<PathBuf>,
    query: &str,
    config: &RankingConfig,
    source: Arc<dyn BlockSource>,
    normalizer: Arc<dyn TextNormalizer>,
) -> Vec<Result<DocumentAnalysis, DocumentError>> {
    let total = paths.len();
    stream::iter(paths.into_iter().map(|path| {
        let source = Arc::clone(&source);
        let normalizer = Arc::clone(&normalizer);
        let query = query.to_string();
        let config_clone = config.clone();
        async move {
            let document = document_name(&path);
            if let Some(ref cb) = config_clone.progress_callback {
                cb.on_document_start(&document, total);
            }

            let doc_start = Instant::now();
            let cfg = config_clone.clone();
            let joined = tokio::task::spawn_blocking(move || {
                analyze_document(&path, &query, &cfg, source.as_ref(), normalizer.as_ref())
            })
            .await;

            let result = match joined {
                Ok(Ok(analysis)) => Ok(analysis),
                Ok(Err(e)) => Err(DocumentError::ExtractionFailed {
                    document: document.clone(),
                    detail: e.to_string(),
                }),
                Err(e) => Err(DocumentError::TaskFailed {
                    document: document.clone(),
                    detail: e.to_string(),
                }),
            };

            match &result {
                Ok(analysis) => {
                    debug!(
                        "{}: {} blocks → {} unique → {} ranked in {}ms",
                        document,
                        analysis.extracted_blocks,
                        analysis.unique_blocks,
                        analysis.top_blocks.len(),
                        doc_start.elapsed().as_millis()
                    );
                    if let Some(ref cb) = config_clone.progress_callback {
                        cb.on_document_complete(&document, total, analysis.top_blocks.len());
                    }
                }
                Err(e) => {
                    warn!("Excluding document: {}", e);
                    if let Some(ref cb) = config_clone.progress_callback {
                        cb.on_document_error(&document, total, &e.to_string());
                    }
                }
            }
            result
        }
    }))
    .buffered(config.concurrency.max(1))
    .collect()
    .await
}
