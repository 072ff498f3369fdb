//! Batch processing: every collection under a base directory.
//!
//! Collections are processed one after another. A failing collection is
//! logged with its name and recorded in the [`BatchReport`]; it never stops
//! the batch.

use crate::analyze::analyze_collection;
use crate::collection::discover_collections;
use crate::config::RankingConfig;
use crate::error::PdfRankError;
use crate::output::BatchReport;
use std::path::Path;
use tracing::{error, info, warn};

/// Process every collection directory directly under `base`.
///
/// # Errors
/// Only when `base` itself cannot be listed. Per-collection failures are
/// reported in [`BatchReport::failed`].
pub async fn run_all_collections(
    base: impl AsRef<Path>,
    config: &RankingConfig,
) -> Result<BatchReport, PdfRankError> {
    let base = base.as_ref();
    let collections = discover_collections(base, &config.layout)?;
    info!(
        "Found {} collections under {}",
        collections.len(),
        base.display()
    );

    let mut report = BatchReport::default();
    for paths in collections {
        let name = paths.name();
        match analyze_collection(&paths.root, config).await {
            Ok(outcome) => {
                info!(
                    "Processed: {} ({}/{} documents)",
                    name, outcome.stats.processed_documents, outcome.stats.total_documents
                );
                report.processed.push(outcome);
            }
            Err(e @ PdfRankError::MissingInputs { .. }) => {
                warn!("Skipping {}: {}", name, e);
                report.failed.push((name, e));
            }
            Err(e) => {
                error!("Error processing {}: {}", name, e);
                report.failed.push((name, e));
            }
        }
    }

    Ok(report)
}
