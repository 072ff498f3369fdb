//! Collection input records, query construction and discovery.
//!
//! A collection is a directory holding an input record and a sub-directory
//! of PDFs:
//!
//! ```text
//! Collection 1/
//! ├── challenge1b_input.json
//! ├── challenge1b_output.json   (written)
//! └── PDFs/
//!     ├── guide.pdf
//!     └── …
//! ```

use crate::config::CollectionLayout;
use crate::error::PdfRankError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The per-collection input record. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInput {
    pub persona: Persona,
    pub job_to_be_done: JobToBeDone,
    pub documents: Vec<DocumentRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobToBeDone {
    pub task: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl CollectionInput {
    /// `"<persona role> needs to <task>"`.
    pub fn query(&self) -> String {
        format!("{} needs to {}", self.persona.role, self.job_to_be_done.task)
    }

    /// Document file names in record order.
    pub fn filenames(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.filename.clone()).collect()
    }

    /// Listed documents that do not exist under `pdf_dir`.
    pub fn missing_documents(&self, pdf_dir: &Path) -> Vec<String> {
        self.documents
            .iter()
            .filter(|d| !pdf_dir.join(&d.filename).exists())
            .map(|d| d.filename.clone())
            .collect()
    }
}

/// Read and parse an input record.
pub fn load_input(path: &Path) -> Result<CollectionInput, PdfRankError> {
    let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PdfRankError::InputNotFound {
            path: path.to_path_buf(),
        },
        _ => PdfRankError::InvalidInput {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    })?;
    serde_json::from_str(&raw).map_err(|e| PdfRankError::InvalidInput {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Resolved paths of one collection directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPaths {
    pub root: PathBuf,
    pub input_file: PathBuf,
    pub pdf_dir: PathBuf,
    pub output_file: PathBuf,
}

impl CollectionPaths {
    pub fn new(root: impl Into<PathBuf>, layout: &CollectionLayout) -> Self {
        let root = root.into();
        Self {
            input_file: root.join(&layout.input_file),
            pdf_dir: root.join(&layout.pdf_dir),
            output_file: root.join(&layout.output_file),
            root,
        }
    }

    /// Directory name used in logs and reports.
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    /// True when both the input record and the PDF directory exist.
    pub fn is_complete(&self) -> bool {
        self.input_file.is_file() && self.pdf_dir.is_dir()
    }
}

/// Immediate sub-directories of `base` that look like collections, sorted
/// by name. Directories missing the input record or PDF folder are skipped.
pub fn discover_collections(
    base: &Path,
    layout: &CollectionLayout,
) -> Result<Vec<CollectionPaths>, PdfRankError> {
    let entries = std::fs::read_dir(base).map_err(|source| PdfRankError::DirectoryReadFailed {
        path: base.to_path_buf(),
        source,
    })?;

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    Ok(dirs
        .into_iter()
        .map(|dir| CollectionPaths::new(dir, layout))
        .filter(|paths| {
            let complete = paths.is_complete();
            if !complete {
                debug!("Skipping {}: not a collection", paths.root.display());
            }
            complete
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"{
        "challenge_info": {"challenge_id": "round_1b_002", "test_case_name": "travel_planner"},
        "documents": [
            {"filename": "South of France - Cities.pdf", "title": "South of France - Cities"},
            {"filename": "South of France - Cuisine.pdf"}
        ],
        "persona": {"role": "Travel Planner"},
        "job_to_be_done": {"task": "Plan a trip of 4 days for a group of 10 college friends."}
    }"#;

    #[test]
    fn parses_record_ignoring_extra_fields() {
        let input: CollectionInput = serde_json::from_str(RECORD).unwrap();
        assert_eq!(input.documents.len(), 2);
        assert_eq!(input.documents[1].title, None);
        assert_eq!(
            input.filenames(),
            vec!["South of France - Cities.pdf", "South of France - Cuisine.pdf"]
        );
    }

    #[test]
    fn query_joins_role_and_task() {
        let input: CollectionInput = serde_json::from_str(RECORD).unwrap();
        assert_eq!(
            input.query(),
            "Travel Planner needs to Plan a trip of 4 days for a group of 10 college friends."
        );
    }

    #[test]
    fn reports_missing_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("South of France - Cities.pdf"), b"%PDF").unwrap();
        let input: CollectionInput = serde_json::from_str(RECORD).unwrap();
        assert_eq!(
            input.missing_documents(dir.path()),
            vec!["South of France - Cuisine.pdf"]
        );
    }

    #[test]
    fn load_input_distinguishes_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            load_input(&missing),
            Err(PdfRankError::InputNotFound { .. })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{\"persona\": 3}").unwrap();
        assert!(matches!(
            load_input(&bad),
            Err(PdfRankError::InvalidInput { .. })
        ));
    }

    #[test]
    fn discovers_only_complete_collections_in_name_order() {
        let base = tempfile::tempdir().unwrap();
        let layout = CollectionLayout::default();
        for name in ["Collection 2", "Collection 1"] {
            let root = base.path().join(name);
            std::fs::create_dir_all(root.join("PDFs")).unwrap();
            std::fs::write(root.join("challenge1b_input.json"), RECORD).unwrap();
        }
        std::fs::create_dir_all(base.path().join("scratch")).unwrap();
        std::fs::write(base.path().join("README.md"), "notes").unwrap();

        let found = discover_collections(base.path(), &layout).unwrap();
        let names: Vec<String> = found.iter().map(CollectionPaths::name).collect();
        assert_eq!(names, vec!["Collection 1", "Collection 2"]);
        assert_eq!(
            found[0].output_file,
            base.path().join("Collection 1").join("challenge1b_output.json")
        );
    }
}
