//! Document inspection and the single- vs multi-job decision.
//!
//! ## Why spawn_blocking?
//!
//! Page counting goes through pdfium, a C++ library with thread-local state
//! that must not run on a Tokio worker. `tokio::task::spawn_blocking` moves
//! the call onto the blocking pool.
//!
//! Inspection is advisory: any failure (corrupt file, pdfium missing, panic
//! inside the binding) resolves to single-threaded OCR and is never
//! propagated to the batch.

use crate::config::ParallelThresholds;
use crate::error::DocumentError;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable pointing at a directory containing libpdfium.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Page count and size of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub byte_size: u64,
}

/// Reads page count and byte size from a document.
#[async_trait]
pub trait DocumentReader: Send + Sync {
    async fn inspect(&self, path: &Path) -> Result<DocumentInfo, DocumentError>;
}

/// [`DocumentReader`] backed by pdfium-render.
#[derive(Debug, Clone, Default)]
pub struct PdfiumReader {
    /// Directory holding libpdfium. `None` binds to the system library.
    pub library_dir: Option<PathBuf>,
}

impl PdfiumReader {
    /// Honour `PDFIUM_LIB_PATH` when set, otherwise use the system library.
    pub fn from_env() -> Self {
        let library_dir = std::env::var_os(PDFIUM_LIB_PATH_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self { library_dir }
    }

    fn bind(&self) -> Result<Pdfium, PdfiumError> {
        let bindings = match self.library_dir {
            Some(ref dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))?
            }
            None => Pdfium::bind_to_system_library()?,
        };
        Ok(Pdfium::new(bindings))
    }
}

#[async_trait]
impl DocumentReader for PdfiumReader {
    async fn inspect(&self, path: &Path) -> Result<DocumentInfo, DocumentError> {
        let failed = |detail: String| DocumentError::InspectFailed {
            path: path.to_path_buf(),
            detail,
        };

        let byte_size = tokio::fs::metadata(path)
            .await
            .map_err(|e| failed(e.to_string()))?
            .len();

        let reader = self.clone();
        let owned = path.to_path_buf();
        let page_count = tokio::task::spawn_blocking(move || reader.count_pages_blocking(&owned))
            .await
            .map_err(|e| failed(format!("inspection task panicked: {e}")))?
            .map_err(failed)?;

        Ok(DocumentInfo {
            page_count,
            byte_size,
        })
    }
}

impl PdfiumReader {
    fn count_pages_blocking(&self, path: &Path) -> Result<usize, String> {
        let pdfium = self.bind().map_err(|e| format!("{:?}", e))?;
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| format!("{:?}", e))?;
        Ok(document.pages().len() as usize)
    }
}

/// Whether `info` is large enough to warrant multi-job OCR.
pub fn recommends_parallel(info: &DocumentInfo, thresholds: &ParallelThresholds) -> bool {
    info.page_count >= thresholds.min_pages || info.byte_size >= thresholds.min_bytes
}

/// Inspect `path` and apply the heuristic; `false` when inspection fails.
pub async fn should_use_parallel(
    reader: &dyn DocumentReader,
    path: &Path,
    thresholds: &ParallelThresholds,
) -> bool {
    match reader.inspect(path).await {
        Ok(info) => {
            let parallel = recommends_parallel(&info, thresholds);
            debug!(
                "{}: {} pages, {} bytes → parallel={}",
                path.display(),
                info.page_count,
                info.byte_size,
                parallel
            );
            parallel
        }
        Err(e) => {
            warn!("{e}; falling back to single-threaded OCR");
            false
        }
    }
}

/// Job count handed to the engine.
pub fn resolve_jobs(max_jobs: Option<usize>, parallel: bool) -> usize {
    match max_jobs {
        Some(n) if parallel && n > 1 => n,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedReader(Result<DocumentInfo, DocumentError>);

    #[async_trait]
    impl DocumentReader for FixedReader {
        async fn inspect(&self, _path: &Path) -> Result<DocumentInfo, DocumentError> {
            self.0.clone()
        }
    }

    const MIB: u64 = 1024 * 1024;

    fn info(page_count: usize, byte_size: u64) -> DocumentInfo {
        DocumentInfo {
            page_count,
            byte_size,
        }
    }

    #[test]
    fn heuristic_thresholds_are_inclusive() {
        let t = ParallelThresholds::default();
        assert!(!recommends_parallel(&info(9, 5 * MIB - 1), &t));
        assert!(recommends_parallel(&info(10, 0), &t));
        assert!(recommends_parallel(&info(1, 5 * MIB), &t));
        assert!(recommends_parallel(&info(20, 10 * MIB), &t));
    }

    #[test]
    fn resolve_jobs_table() {
        assert_eq!(resolve_jobs(Some(4), true), 4);
        assert_eq!(resolve_jobs(Some(4), false), 1);
        assert_eq!(resolve_jobs(Some(1), true), 1);
        assert_eq!(resolve_jobs(Some(0), true), 1);
        assert_eq!(resolve_jobs(None, true), 1);
        assert_eq!(resolve_jobs(None, false), 1);
    }

    #[tokio::test]
    async fn inspection_failure_means_single_thread() {
        let reader = FixedReader(Err(DocumentError::InspectFailed {
            path: PathBuf::from("broken.pdf"),
            detail: "xref table corrupt".into(),
        }));
        let parallel =
            should_use_parallel(&reader, Path::new("broken.pdf"), &ParallelThresholds::default())
                .await;
        assert!(!parallel);
    }

    #[tokio::test]
    async fn large_document_recommends_parallel() {
        let reader = FixedReader(Ok(info(20, 10 * MIB)));
        assert!(
            should_use_parallel(&reader, Path::new("b.pdf"), &ParallelThresholds::default()).await
        );
    }

    #[tokio::test]
    async fn pdfium_reader_reports_missing_file() {
        let reader = PdfiumReader::default();
        let err = reader
            .inspect(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::InspectFailed { .. }));
    }

    #[test]
    fn from_env_ignores_empty_value() {
        // Only asserts the non-panicking path; the variable may or may not be set.
        let reader = PdfiumReader::from_env();
        if let Some(dir) = reader.library_dir {
            assert!(!dir.as_os_str().is_empty());
        }
    }
}
