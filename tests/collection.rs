//! Integration tests for collection analysis.
//!
//! PDFs are replaced by an in-memory [`BlockSource`] keyed by file name and
//! translation by the identity normalizer, so these tests need neither a
//! pdfium library nor a translator binary. The listed PDF files still exist
//! on disk (as empty placeholders) because missing-input validation looks at
//! the file system.

use edgequake_pdfrank::{
    analyze_collection, analyze_documents, analyze_sync, run_all_collections,
    AnalysisProgressCallback, BlockSource, CollectionInput, IdentityNormalizer, PdfRankError,
    RankedResult, RankingConfig, RawBlock,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

const PERSONA: &str = "Travel Planner";
const TASK: &str = "plan nightlife for friends";

#[derive(Default)]
struct MapSource {
    docs: HashMap<String, Vec<RawBlock>>,
}

impl MapSource {
    fn with(mut self, name: &str, blocks: Vec<RawBlock>) -> Self {
        self.docs.insert(name.to_string(), blocks);
        self
    }
}

impl BlockSource for MapSource {
    fn read_blocks(
        &self,
        path: &Path,
        _password: Option<&str>,
    ) -> Result<Vec<RawBlock>, PdfRankError> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.docs
            .get(&name)
            .cloned()
            .ok_or_else(|| PdfRankError::CorruptPdf {
                path: path.to_path_buf(),
                detail: "unreadable test document".into(),
            })
    }
}

#[derive(Default)]
struct Tracker {
    started: AtomicUsize,
    completed: AtomicUsize,
    errors: AtomicUsize,
}

impl AnalysisProgressCallback for Tracker {
    fn on_document_start(&self, _document: &str, _total: usize) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_document_complete(&self, _document: &str, _total: usize, _kept: usize) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_document_error(&self, _document: &str, _total: usize, _error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

/// ASCII text of exactly `len` characters with no surrounding whitespace.
fn sized(seed: &str, len: usize) -> String {
    let mut s = seed.repeat(len / seed.len() + 1);
    s.truncate(len);
    if s.ends_with(' ') {
        s.pop();
        s.push('x');
    }
    s
}

fn config_with(source: MapSource) -> RankingConfig {
    RankingConfig::builder()
        .block_source(Arc::new(source))
        .normalizer(Arc::new(IdentityNormalizer))
        .concurrency(2)
        .build()
        .unwrap()
}

fn record(documents: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "challenge_info": {"challenge_id": "round_1b_002"},
        "documents": documents
            .iter()
            .map(|d| serde_json::json!({"filename": d, "title": d.trim_end_matches(".pdf")}))
            .collect::<Vec<_>>(),
        "persona": {"role": PERSONA},
        "job_to_be_done": {"task": TASK}
    })
}

/// Create `<base>/<name>/` with an input record and placeholder PDFs.
fn make_collection(base: &Path, name: &str, listed: &[&str], present: &[&str]) -> PathBuf {
    let root = base.join(name);
    std::fs::create_dir_all(root.join("PDFs")).unwrap();
    std::fs::write(
        root.join("challenge1b_input.json"),
        serde_json::to_string_pretty(&record(listed)).unwrap(),
    )
    .unwrap();
    for doc in present {
        std::fs::write(root.join("PDFs").join(doc), b"%PDF-1.4\n").unwrap();
    }
    root
}

fn read_report(root: &Path) -> RankedResult {
    let raw = std::fs::read_to_string(root.join("challenge1b_output.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn input_for(documents: &[&str]) -> CollectionInput {
    serde_json::from_value(record(documents)).unwrap()
}

// ── Per-document pipeline ────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_paragraph_is_suppressed_end_to_end() {
    let duplicate = sized("museum gallery painting sculpture ", 150);
    let unrelated = sized("nightlife friends cocktails dancing ", 150);
    let source = MapSource::default().with(
        "guide.pdf",
        vec![
            RawBlock::new(duplicate.clone(), 1),
            RawBlock::new(duplicate.clone(), 1),
            RawBlock::new(unrelated.clone(), 2),
        ],
    );
    let config = config_with(source);
    let out = analyze_documents(&input_for(&["guide.pdf"]), Path::new("/unused"), &config)
        .await
        .unwrap();

    assert_eq!(out.stats.extracted_blocks, 3);
    assert_eq!(out.stats.unique_blocks, 2);
    assert_eq!(out.result.subsection_analysis.len(), 1);
    assert_eq!(out.result.subsection_analysis[0].refined_text, unrelated);
    assert_eq!(out.result.subsection_analysis[0].page_number, 2);
}

#[tokio::test]
async fn extraction_threshold_boundary() {
    let source = MapSource::default().with(
        "edge.pdf",
        vec![
            RawBlock::new(sized("nightlife plan ", 100), 1),
            RawBlock::new(format!("  {}  ", sized("friends nightlife ", 100)), 1),
            RawBlock::new(sized("nightlife friends ", 101), 2),
        ],
    );
    let out = analyze_documents(&input_for(&["edge.pdf"]), Path::new("/unused"), &config_with(source))
        .await
        .unwrap();
    assert_eq!(out.stats.extracted_blocks, 1);
    assert_eq!(out.result.extracted_sections[0].page_number, 2);
}

// ── Cross-document ordering ──────────────────────────────────────────────────

#[tokio::test]
async fn final_order_is_by_length_not_relevance() {
    // Doc A's blocks are the most relevant but the shortest.
    let a1 = sized("nightlife friends plan ", 130);
    let a2 = sized("nightlife clubs ", 120);
    let b1 = sized("planner museums history ", 400);
    let b2 = sized("travel beaches sunshine ", 300);
    let source = MapSource::default()
        .with("a.pdf", vec![RawBlock::new(a1, 1), RawBlock::new(a2, 2)])
        .with("b.pdf", vec![RawBlock::new(b1, 3), RawBlock::new(b2, 4)]);

    let out = analyze_documents(&input_for(&["a.pdf", "b.pdf"]), Path::new("/unused"), &config_with(source))
        .await
        .unwrap();

    let lengths: Vec<usize> = out
        .result
        .subsection_analysis
        .iter()
        .map(|s| s.refined_text.chars().count())
        .collect();
    assert_eq!(lengths, vec![400, 300, 130, 120]);

    let sections = &out.result.extracted_sections;
    let docs: Vec<&str> = sections.iter().map(|s| s.document.as_str()).collect();
    assert_eq!(docs, vec!["b.pdf", "b.pdf", "a.pdf", "a.pdf"]);
    let ranks: Vec<usize> = sections.iter().map(|s| s.importance_rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
    for s in sections {
        assert_eq!(s.section_title.chars().count(), 83);
    }
}

#[tokio::test]
async fn report_is_truncated_to_top_ten() {
    let seeds = [
        "nightlife ", "friends ", "planner ", "travel ", "nightlife plan ", "friends plan ",
    ];
    let mut source = MapSource::default();
    let mut names = Vec::new();
    for (i, seed) in seeds.iter().enumerate() {
        let name = format!("doc{i}.pdf");
        source = source.with(
            &name,
            vec![
                RawBlock::new(sized(&format!("{seed}alpha{i} "), 200 + i * 10), 1),
                RawBlock::new(sized(&format!("{seed}omega{i} zulu "), 150 + i * 10), 2),
            ],
        );
        names.push(name);
    }
    let listed: Vec<&str> = names.iter().map(String::as_str).collect();
    let out = analyze_documents(&input_for(&listed), Path::new("/unused"), &config_with(source))
        .await
        .unwrap();

    assert_eq!(out.stats.pooled_blocks, 12);
    assert_eq!(out.result.extracted_sections.len(), 10);
    let lengths: Vec<usize> = out
        .result
        .subsection_analysis
        .iter()
        .map(|s| s.refined_text.len())
        .collect();
    assert!(lengths.windows(2).all(|w| w[0] >= w[1]), "{lengths:?}");
    assert_eq!(lengths[0], 250);
}

// ── Failure isolation ────────────────────────────────────────────────────────

#[tokio::test]
async fn failing_document_is_excluded() {
    let source = MapSource::default().with(
        "good.pdf",
        vec![RawBlock::new(sized("nightlife friends ", 180), 1)],
    );
    let tracker = Arc::new(Tracker::default());
    let config = RankingConfig::builder()
        .block_source(Arc::new(source))
        .normalizer(Arc::new(IdentityNormalizer))
        .progress_callback(tracker.clone())
        .build()
        .unwrap();

    let out = analyze_documents(&input_for(&["good.pdf", "broken.pdf"]), Path::new("/unused"), &config)
        .await
        .unwrap();

    assert_eq!(out.stats.processed_documents, 1);
    assert_eq!(out.stats.failed_documents, 1);
    assert_eq!(out.stats.errors[0].document(), "broken.pdf");
    assert_eq!(out.result.extracted_sections.len(), 1);
    assert_eq!(
        out.result.metadata.input_documents,
        vec!["good.pdf", "broken.pdf"]
    );
    assert_eq!(tracker.started.load(Ordering::SeqCst), 2);
    assert_eq!(tracker.completed.load(Ordering::SeqCst), 1);
    assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn all_documents_failing_is_fatal() {
    let config = config_with(MapSource::default());
    let err = analyze_documents(&input_for(&["x.pdf", "y.pdf"]), Path::new("/unused"), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, PdfRankError::AllDocumentsFailed { total: 2, .. }));
}

#[tokio::test]
async fn empty_document_list_yields_empty_report() {
    let out = analyze_documents(&input_for(&[]), Path::new("/unused"), &config_with(MapSource::default()))
        .await
        .unwrap();
    assert!(out.result.extracted_sections.is_empty());
    assert!(out.result.subsection_analysis.is_empty());
}

// ── Collections on disk ──────────────────────────────────────────────────────

#[tokio::test]
async fn collection_report_is_written_next_to_input() {
    let base = tempfile::tempdir().unwrap();
    let root = make_collection(base.path(), "Collection 1", &["Nice – guide.pdf"], &["Nice – guide.pdf"]);
    let text = format!("Soirée à Nice\n{}", sized("nightlife friends bars ", 160));
    let source = MapSource::default().with("Nice – guide.pdf", vec![RawBlock::new(text.clone(), 7)]);

    let outcome = analyze_collection(&root, &config_with(source)).await.unwrap();
    assert_eq!(outcome.name, "Collection 1");
    assert_eq!(outcome.output_path, root.join("challenge1b_output.json"));

    let raw = std::fs::read_to_string(&outcome.output_path).unwrap();
    assert!(raw.contains("Soirée à Nice"), "non-ASCII must be written literally");

    let report = read_report(&root);
    assert_eq!(report.metadata.persona, PERSONA);
    assert_eq!(report.metadata.job_to_be_done, TASK);
    assert_eq!(report.extracted_sections[0].section_title, "Soirée à Nice");
    assert_eq!(report.extracted_sections[0].page_number, 7);
    assert_eq!(report.subsection_analysis[0].refined_text, text);
}

#[tokio::test]
async fn missing_pdf_skips_collection_without_output() {
    let base = tempfile::tempdir().unwrap();
    let root = make_collection(base.path(), "Collection 2", &["a.pdf", "b.pdf"], &["a.pdf"]);
    let err = analyze_collection(&root, &config_with(MapSource::default()))
        .await
        .unwrap_err();

    match err {
        PdfRankError::MissingInputs { collection, missing } => {
            assert_eq!(collection, "Collection 2");
            assert_eq!(missing, vec!["b.pdf"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!root.join("challenge1b_output.json").exists());
}

#[tokio::test]
async fn batch_continues_past_bad_collections() {
    let base = tempfile::tempdir().unwrap();
    let good = make_collection(base.path(), "A good", &["ok.pdf"], &["ok.pdf"]);
    make_collection(base.path(), "B missing", &["gone.pdf"], &[]);
    let malformed = make_collection(base.path(), "C malformed", &[], &[]);
    std::fs::write(malformed.join("challenge1b_input.json"), "{ not json").unwrap();
    std::fs::create_dir_all(base.path().join("D not a collection")).unwrap();

    let source = MapSource::default().with(
        "ok.pdf",
        vec![RawBlock::new(sized("nightlife friends ", 140), 1)],
    );
    let report = run_all_collections(base.path(), &config_with(source))
        .await
        .unwrap();

    assert_eq!(report.processed.len(), 1);
    assert_eq!(report.processed[0].name, "A good");
    assert!(good.join("challenge1b_output.json").exists());

    let failed: Vec<&str> = report.failed.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(failed, vec!["B missing", "C malformed"]);
    assert!(matches!(report.failed[0].1, PdfRankError::MissingInputs { .. }));
    assert!(matches!(report.failed[1].1, PdfRankError::InvalidInput { .. }));
    assert!(!report.is_success());
}

#[test]
fn sync_wrapper_runs_collection() {
    let base = tempfile::tempdir().unwrap();
    let root = make_collection(base.path(), "Sync", &["s.pdf"], &["s.pdf"]);
    let source = MapSource::default().with(
        "s.pdf",
        vec![RawBlock::new(sized("friends plan nightlife ", 110), 1)],
    );
    let outcome = analyze_sync(&root, &config_with(source)).unwrap();
    assert_eq!(outcome.stats.processed_documents, 1);
    assert_eq!(read_report(&root).extracted_sections.len(), 1);
}
