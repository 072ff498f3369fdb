//! Block extraction: turn a PDF into page-tagged text blocks.
//!
//! The PDF reader sits behind [`BlockSource`] so the rest of the pipeline
//! only ever sees `(text, page_number)` pairs. The default
//! [`PdfiumBlockSource`] reads each page's positioned text segments with
//! pdfium and regroups them into layout blocks (see [`layout_blocks`]), in
//! the page's native text order.
//!
//! ## Why spawn_blocking upstream?
//!
//! pdfium wraps a C++ library that is not async-safe. Extraction is a plain
//! blocking function here; [`crate::analyze`] moves each document onto the
//! blocking thread pool.

use crate::error::PdfRankError;
use crate::output::TextBlock;
use crate::pipeline::normalize::TextNormalizer;
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Axis-aligned box in PDF user space (points, origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockBounds {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl BlockBounds {
    pub fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    pub fn height(&self) -> f32 {
        (self.top - self.bottom).max(0.0)
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BlockBounds) -> BlockBounds {
        BlockBounds {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }

    /// True when the vertical extents overlap by more than half of the
    /// shorter box, i.e. both sit on the same text line.
    fn shares_line(&self, other: &BlockBounds) -> bool {
        let overlap = self.top.min(other.top) - self.bottom.max(other.bottom);
        overlap > 0.5 * self.height().min(other.height())
    }

    fn overlaps_horizontally(&self, other: &BlockBounds) -> bool {
        self.left <= other.right && other.left <= self.right
    }
}

/// A raw block as delivered by the PDF text source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlock {
    pub text: String,
    /// 1-indexed page number.
    pub page_number: usize,
    /// Block geometry, when the source knows it.
    pub bounds: Option<BlockBounds>,
}

impl RawBlock {
    pub fn new(text: impl Into<String>, page_number: usize) -> Self {
        Self {
            text: text.into(),
            page_number,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, bounds: BlockBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// A positioned run of text on a page, in content order.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment {
    pub text: String,
    pub bounds: BlockBounds,
}

impl TextSegment {
    pub fn new(text: impl Into<String>, bounds: BlockBounds) -> Self {
        Self {
            text: text.into(),
            bounds,
        }
    }
}

/// Yields the raw text blocks of a document, pages in order starting at 1.
pub trait BlockSource: Send + Sync {
    fn read_blocks(&self, path: &Path, password: Option<&str>)
        -> Result<Vec<RawBlock>, PdfRankError>;
}

/// Extract, filter and normalise the blocks of one document.
///
/// Blocks whose stripped length is `min_chars` characters or fewer are
/// discarded before normalisation.
pub fn extract_blocks(
    source: &dyn BlockSource,
    normalizer: &dyn TextNormalizer,
    path: &Path,
    password: Option<&str>,
    min_chars: usize,
) -> Result<Vec<TextBlock>, PdfRankError> {
    let document = document_name(path);
    let raw = source.read_blocks(path, password)?;
    let total = raw.len();

    let blocks: Vec<TextBlock> = raw
        .into_iter()
        .filter_map(|block| {
            let text = block.text.trim();
            if text.chars().count() <= min_chars {
                return None;
            }
            Some(TextBlock::new(
                normalizer.normalize(text),
                block.page_number,
                document.clone(),
            ))
        })
        .collect();

    debug!(
        "{}: kept {}/{} blocks longer than {} chars",
        document,
        blocks.len(),
        total,
        min_chars
    );
    Ok(blocks)
}

/// The base file name used to tag blocks.
pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Vertical gap between two lines, relative to line height, above which
/// they belong to different blocks.
pub const PARAGRAPH_GAP_RATIO: f32 = 0.75;

/// Horizontal gap, relative to line height, that implies a word break
/// between two segments on the same line.
const WORD_GAP_RATIO: f32 = 0.1;

struct Line {
    text: String,
    bounds: BlockBounds,
}

impl Line {
    fn push(&mut self, text: &str, bounds: BlockBounds) {
        let gap = bounds.left - self.bounds.right;
        let needs_space = gap > WORD_GAP_RATIO * self.bounds.height()
            && !self.text.ends_with(char::is_whitespace)
            && !text.starts_with(char::is_whitespace);
        if needs_space {
            self.text.push(' ');
        }
        self.text.push_str(text);
        self.bounds = self.bounds.union(&bounds);
    }
}

/// Whether `next` starts a new block after line `prev`.
fn starts_new_block(prev: &BlockBounds, next: &BlockBounds) -> bool {
    let line_height = prev.height().max(next.height());
    let gap = prev.bottom - next.top;
    next.top > prev.top
        || !prev.overlaps_horizontally(next)
        || gap > PARAGRAPH_GAP_RATIO * line_height
}

/// Group a page's positioned segments into layout blocks.
///
/// Segments sharing a line are joined (with a space where they are visibly
/// apart), lines are joined with `\n`. A new block starts when the next line
/// is separated by a paragraph-sized gap, jumps back up the page, or does
/// not overlap the previous line horizontally (a column change). Line break
/// characters inside segments are ignored; whitespace-only segments are
/// skipped.
pub fn layout_blocks(segments: &[TextSegment], page_number: usize) -> Vec<RawBlock> {
    let mut lines: Vec<Line> = Vec::new();
    for segment in segments {
        let text = segment.text.trim_matches(|c: char| c == '\r' || c == '\n');
        if text.trim().is_empty() {
            continue;
        }
        match lines.last_mut() {
            Some(line) if line.bounds.shares_line(&segment.bounds) => {
                line.push(text, segment.bounds)
            }
            _ => lines.push(Line {
                text: text.to_string(),
                bounds: segment.bounds,
            }),
        }
    }

    let mut blocks: Vec<RawBlock> = Vec::new();
    let mut prev: Option<BlockBounds> = None;
    for line in lines {
        let continues = prev.is_some_and(|p| !starts_new_block(&p, &line.bounds));
        match blocks.last_mut() {
            Some(block) if continues => {
                block.text.push('\n');
                block.text.push_str(&line.text);
                block.bounds = block.bounds.map(|b| b.union(&line.bounds));
            }
            _ => blocks.push(RawBlock::new(line.text, page_number).with_bounds(line.bounds)),
        }
        prev = Some(line.bounds);
    }
    blocks
}

// ── pdfium source ────────────────────────────────────────────────────────

/// Reads text blocks with pdfium-render.
///
/// The library is located once per process: `PDFIUM_LIB_PATH` first, then
/// the working directory, then the system search path.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumBlockSource;

static LIBRARY_PATH: OnceLock<Option<PathBuf>> = OnceLock::new();

fn local_library_path() -> Option<&'static PathBuf> {
    LIBRARY_PATH
        .get_or_init(|| {
            if let Ok(p) = std::env::var("PDFIUM_LIB_PATH") {
                let path = PathBuf::from(p);
                let path = if path.is_dir() {
                    Pdfium::pdfium_platform_library_name_at_path(&path)
                } else {
                    path
                };
                return Some(path);
            }
            let local = Pdfium::pdfium_platform_library_name_at_path("./");
            local.exists().then_some(local)
        })
        .as_ref()
}

fn bind_pdfium() -> Result<Pdfium, PdfRankError> {
    let bindings = match local_library_path() {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| PdfRankError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

impl BlockSource for PdfiumBlockSource {
    fn read_blocks(
        &self,
        path: &Path,
        password: Option<&str>,
    ) -> Result<Vec<RawBlock>, PdfRankError> {
        validate_pdf(path)?;
        let pdfium = bind_pdfium()?;

        let document = pdfium.load_pdf_from_file(path, password).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    PdfRankError::WrongPassword {
                        path: path.to_path_buf(),
                    }
                } else {
                    PdfRankError::PasswordRequired {
                        path: path.to_path_buf(),
                    }
                }
            } else {
                PdfRankError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: err_str,
                }
            }
        })?;

        let mut blocks = Vec::new();
        for (idx, page) in document.pages().iter().enumerate() {
            let page_number = idx + 1;
            let text = page
                .text()
                .map_err(|e| PdfRankError::TextExtractionFailed {
                    page: page_number,
                    detail: format!("{:?}", e),
                })?;
            let segments: Vec<TextSegment> = text
                .segments()
                .iter()
                .map(|segment| {
                    let rect = segment.bounds();
                    TextSegment::new(
                        segment.text(),
                        BlockBounds::new(
                            rect.left().value,
                            rect.bottom().value,
                            rect.right().value,
                            rect.top().value,
                        ),
                    )
                })
                .collect();
            blocks.extend(layout_blocks(&segments, page_number));
        }

        info!("{}: {} raw blocks", path.display(), blocks.len());
        Ok(blocks)
    }
}

/// Validate existence, readability and PDF magic bytes before handing the
/// file to pdfium, so callers get a meaningful error rather than a crash.
pub fn validate_pdf(path: &Path) -> Result<(), PdfRankError> {
    if !path.exists() {
        return Err(PdfRankError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(PdfRankError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(PdfRankError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(PdfRankError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}
