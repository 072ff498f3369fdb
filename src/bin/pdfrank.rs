//! CLI binary for edgequake-pdfrank.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RankingConfig` and prints per-collection status.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdfrank::collection::CollectionPaths;
use edgequake_pdfrank::{
    analyze_collection, analyze_collection_output, run_all_collections, AnalysisProgressCallback,
    CollectionLayout, ProgressCallback, RankingConfig, TranslationConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar per collection, one log line per
/// document. Documents may finish out of order.
struct CliProgressCallback {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(ref bar) = *guard {
                f(bar);
            }
        }
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_analysis_start(&self, total_documents: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(total_documents as u64);
        bar.set_style(style);
        bar.set_prefix("Ranking");
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn on_document_start(&self, document: &str, _total: usize) {
        self.with_bar(|bar| bar.set_message(document.to_string()));
    }

    fn on_document_complete(&self, document: &str, _total: usize, kept_blocks: usize) {
        self.with_bar(|bar| {
            bar.println(format!(
                "  {} {}  {}",
                green("✓"),
                document,
                dim(&format!("{kept_blocks} blocks")),
            ));
            bar.inc(1);
        });
    }

    fn on_document_error(&self, document: &str, _total: usize, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.with_bar(|bar| {
            bar.println(format!("  {} {}  {}", red("✗"), document, red(&msg)));
            bar.inc(1);
        });
    }

    fn on_analysis_complete(&self, _total: usize, _success: usize) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process every collection under the current directory
  pdfrank

  # Process every collection under a base directory
  pdfrank ./challenge

  # Process one collection and print the report instead of writing it
  pdfrank --collection "./challenge/Collection 1" --stdout

  # Disable translation of Japanese blocks
  pdfrank --no-translate ./challenge

COLLECTION LAYOUT:
  <collection>/
    challenge1b_input.json    persona, job_to_be_done, documents[]
    PDFs/<filename>.pdf       every listed document
    challenge1b_output.json   written by pdfrank

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to libpdfium (file or directory)
  RUST_LOG          Override the log filter (e.g. edgequake_pdfrank=debug)
"#;

/// Rank the most relevant PDF sections for a persona and task.
#[derive(Parser, Debug)]
#[command(
    name = "pdfrank",
    version,
    about = "Rank the most relevant PDF sections for a persona and task",
    long_about = "Extract text blocks from every PDF of a collection, drop near-duplicates, \
rank the rest against \"<persona> needs to <task>\" with TF-IDF cosine similarity, and write \
a ranked JSON report next to the collection's input record.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory whose sub-directories are collections.
    #[arg(default_value = ".", env = "PDFRANK_BASE_DIR")]
    base_dir: PathBuf,

    /// Process a single collection directory instead of scanning BASE_DIR.
    #[arg(long, env = "PDFRANK_COLLECTION")]
    collection: Option<PathBuf>,

    /// Print the report to stdout instead of writing it (with --collection).
    #[arg(long, requires = "collection")]
    stdout: bool,

    /// Number of documents processed in parallel.
    #[arg(short, long, env = "PDFRANK_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Blocks this many characters or shorter are discarded.
    #[arg(long, env = "PDFRANK_MIN_BLOCK_CHARS", default_value_t = 100)]
    min_block_chars: usize,

    /// Cosine similarity above which a block is a near-duplicate.
    #[arg(long, env = "PDFRANK_DEDUP_THRESHOLD", default_value_t = 0.8)]
    dedup_threshold: f64,

    /// Blocks kept per document after ranking.
    #[arg(long, env = "PDFRANK_TOP_K", default_value_t = 2)]
    top_k: usize,

    /// Sections kept in the final report.
    #[arg(long, env = "PDFRANK_TOP_N", default_value_t = 10)]
    top_n: usize,

    /// Section title width before truncation.
    #[arg(long, env = "PDFRANK_TITLE_CHARS", default_value_t = 80)]
    title_chars: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFRANK_PASSWORD")]
    password: Option<String>,

    /// Never translate blocks.
    #[arg(long, env = "PDFRANK_NO_TRANSLATE")]
    no_translate: bool,

    /// Translator executable.
    #[arg(long, env = "PDFRANK_TRANSLATE_CMD", default_value = "apertium")]
    translate_cmd: String,

    /// Translator source language.
    #[arg(long, env = "PDFRANK_SOURCE_LANG", default_value = "ja")]
    source_lang: String,

    /// Translator target language.
    #[arg(long, env = "PDFRANK_TARGET_LANG", default_value = "en")]
    target_lang: String,

    /// Input record file name inside each collection.
    #[arg(long, env = "PDFRANK_INPUT_FILE", default_value = "challenge1b_input.json")]
    input_file: String,

    /// PDF sub-directory name inside each collection.
    #[arg(long, env = "PDFRANK_PDF_DIR", default_value = "PDFs")]
    pdf_dir: String,

    /// Report file name written into each collection.
    #[arg(long, env = "PDFRANK_OUTPUT_FILE", default_value = "challenge1b_output.json")]
    output_file: String,

    /// Disable progress bar.
    #[arg(long, env = "PDFRANK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFRANK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFRANK_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar already reports per-document status, so INFO logs
    // are hidden while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.stdout;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Single collection ────────────────────────────────────────────────
    if let Some(ref dir) = cli.collection {
        if cli.stdout {
            let paths = CollectionPaths::new(dir.clone(), &config.layout);
            let output = analyze_collection_output(&paths, &config)
                .await
                .with_context(|| format!("Failed to process {}", dir.display()))?;
            let json = serde_json::to_string_pretty(&output.result)
                .context("Failed to serialise report")?;
            println!("{json}");
            return Ok(());
        }

        let outcome = analyze_collection(dir, &config)
            .await
            .with_context(|| format!("Failed to process {}", dir.display()))?;
        if !cli.quiet {
            eprintln!(
                "{} Processed: {}  {}/{} documents  {}ms  →  {}",
                green("✔"),
                bold(&outcome.name),
                outcome.stats.processed_documents,
                outcome.stats.total_documents,
                outcome.stats.total_duration_ms,
                dim(&outcome.output_path.display().to_string()),
            );
        }
        return Ok(());
    }

    // ── Batch ────────────────────────────────────────────────────────────
    let report = run_all_collections(&cli.base_dir, &config)
        .await
        .with_context(|| format!("Failed to scan {}", cli.base_dir.display()))?;

    if !cli.quiet {
        for outcome in &report.processed {
            let mark = if outcome.stats.failed_documents == 0 {
                green("✔")
            } else {
                cyan("⚠")
            };
            eprintln!(
                "{} Processed: {}  {}/{} documents  {}ms",
                mark,
                bold(&outcome.name),
                outcome.stats.processed_documents,
                outcome.stats.total_documents,
                outcome.stats.total_duration_ms,
            );
        }
        for (name, err) in &report.failed {
            eprintln!("{} Error processing {}: {}", red("✘"), bold(name), err);
        }
        if report.processed.is_empty() && report.failed.is_empty() {
            eprintln!(
                "{} No collections found under {}",
                cyan("⚠"),
                cli.base_dir.display()
            );
        }
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `RankingConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RankingConfig> {
    let translation = TranslationConfig {
        enabled: !cli.no_translate,
        command: cli.translate_cmd.clone(),
        source_lang: cli.source_lang.clone(),
        target_lang: cli.target_lang.clone(),
        ..TranslationConfig::default()
    };
    let layout = CollectionLayout {
        input_file: cli.input_file.clone(),
        pdf_dir: cli.pdf_dir.clone(),
        output_file: cli.output_file.clone(),
    };

    let mut builder = RankingConfig::builder()
        .min_block_chars(cli.min_block_chars)
        .dedup_threshold(cli.dedup_threshold)
        .per_document_top_k(cli.top_k)
        .final_top_n(cli.top_n)
        .title_max_chars(cli.title_chars)
        .translation(translation)
        .layout(layout);

    if let Some(n) = cli.concurrency {
        builder = builder.concurrency(n);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
