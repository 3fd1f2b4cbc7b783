//! Input discovery: list the documents of a batch and prepare the output directory.
//!
//! Only the top level of the input directory is scanned. Matching is on the
//! file extension (`pdf`, any case); whether the file really is a PDF is left
//! to the engine, which reports a per-document failure if it is not.

use crate::error::BulkOcrError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension (compared case-insensitively) of the documents picked up.
pub const DOCUMENT_EXTENSION: &str = "pdf";

/// List the documents in `input_dir`, sorted by file name.
pub async fn discover_documents(input_dir: &Path) -> Result<Vec<PathBuf>, BulkOcrError> {
    let meta = match tokio::fs::metadata(input_dir).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BulkOcrError::InputDirNotFound {
                path: input_dir.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(BulkOcrError::InputDirUnreadable {
                path: input_dir.to_path_buf(),
                source: e,
            })
        }
    };
    if !meta.is_dir() {
        return Err(BulkOcrError::InputNotADirectory {
            path: input_dir.to_path_buf(),
        });
    }

    let unreadable = |e: std::io::Error| BulkOcrError::InputDirUnreadable {
        path: input_dir.to_path_buf(),
        source: e,
    };

    let mut entries = tokio::fs::read_dir(input_dir).await.map_err(unreadable)?;
    let mut documents = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        let path = entry.path();
        if !has_document_extension(&path) {
            continue;
        }
        // Follows symlinks, so a link to a PDF counts.
        match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => documents.push(path),
            _ => debug!("Skipping non-file entry {}", path.display()),
        }
    }

    documents.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(
        "Found {} documents in {}",
        documents.len(),
        input_dir.display()
    );
    Ok(documents)
}

/// Create `output_dir` (and parents) if it does not exist yet.
pub async fn ensure_output_dir(output_dir: &Path) -> Result<(), BulkOcrError> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| BulkOcrError::OutputDirCreateFailed {
            path: output_dir.to_path_buf(),
            source: e,
        })
}

/// Whether `path` ends in `.pdf` (any case).
pub fn has_document_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_has_document_extension() {
        assert!(has_document_extension(Path::new("scan.pdf")));
        assert!(has_document_extension(Path::new("SCAN.PDF")));
        assert!(!has_document_extension(Path::new("scan.pdf.txt")));
        assert!(!has_document_extension(Path::new("pdf")));
        assert!(!has_document_extension(Path::new("notes.txt")));
    }

    #[tokio::test]
    async fn discovers_only_top_level_pdfs_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"%PDF").unwrap();
        std::fs::write(dir.path().join("a.PDF"), b"%PDF").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"hi").unwrap();
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/c.pdf"), b"%PDF").unwrap();

        let docs = discover_documents(dir.path()).await.unwrap();
        let names: Vec<_> = docs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[tokio::test]
    async fn missing_input_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = discover_documents(&dir.path().join("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, BulkOcrError::InputDirNotFound { .. }));
    }

    #[tokio::test]
    async fn file_as_input_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.pdf");
        std::fs::write(&file, b"%PDF").unwrap();
        let err = discover_documents(&file).await.unwrap_err();
        assert!(matches!(err, BulkOcrError::InputNotADirectory { .. }));
    }

    #[tokio::test]
    async fn ensure_output_dir_creates_parents() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("x/y/z");
        ensure_output_dir(&out).await.unwrap();
        assert!(out.is_dir());
        // Idempotent.
        ensure_output_dir(&out).await.unwrap();
    }
}
