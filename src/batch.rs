//! Batch orchestration: run every document of a directory through the pipeline.
//!
//! Documents are processed strictly one after another. The only parallelism
//! is the job count handed to the engine for a single large document.
//!
//! Per-document failures never escape [`process_document`]; they become a
//! [`DocumentOutcome`] with `error` set, and the loop moves on. Only setup
//! problems (missing input directory, output directory not creatable) make
//! [`run_batch`] return `Err`.

use crate::config::{BatchConfig, OcrMode, OutputType};
use crate::error::{BulkOcrError, DocumentError};
use crate::output::{BatchReport, DocumentOutcome};
use crate::pipeline::input;
use crate::pipeline::inspect::{resolve_jobs, should_use_parallel, DocumentReader, PdfiumReader};
use crate::pipeline::ocr::{OcrEngine, OcrMyPdf, OcrRequest};
use crate::pipeline::preprocess::{CleanedArtifact, ImagePreprocessor, MagickPreprocessor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The external tools a batch talks to.
///
/// [`Collaborators::default`] wires pdfium, `ocrmypdf` and ImageMagick;
/// tests and embedders can swap any of them.
#[derive(Clone)]
pub struct Collaborators {
    pub reader: Arc<dyn DocumentReader>,
    pub engine: Arc<dyn OcrEngine>,
    pub preprocessor: Arc<dyn ImagePreprocessor>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            reader: Arc::new(PdfiumReader::from_env()),
            engine: Arc::new(OcrMyPdf::default()),
            preprocessor: Arc::new(MagickPreprocessor::default()),
        }
    }
}

/// Resolved parameters for one document. Built once, then only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentJob {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub language: String,
    pub jobs: usize,
    pub mode: OcrMode,
    pub remove_background: bool,
    pub output_type: OutputType,
}

impl DocumentJob {
    /// Engine request reading from `input` (the source, or its cleaned copy).
    pub fn ocr_request(&self, input: &Path) -> OcrRequest {
        OcrRequest {
            source: input.to_path_buf(),
            destination: self.destination.clone(),
            language: self.language.clone(),
            output_type: self.output_type,
            jobs: self.jobs,
            mode: self.mode,
        }
    }
}

/// OCR every `*.pdf` in `input_dir` into `output_dir`.
///
/// # Returns
/// `Ok(BatchReport)` with one entry per input document, in file-name order,
/// even if some (or all) documents failed.
///
/// # Errors
/// Only for setup failures, before any document is touched:
/// - input directory missing, not a directory, or unreadable
/// - output directory cannot be created
pub async fn run_batch(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &BatchConfig,
    tools: &Collaborators,
) -> Result<BatchReport, BulkOcrError> {
    let batch_start = Instant::now();
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref();

    let documents = prepare(input_dir, output_dir, config).await?;
    let total = documents.len();
    let mode = announce_mode(config);

    let mut outcomes = Vec::with_capacity(total);
    for (i, source) in documents.iter().enumerate() {
        let outcome =
            process_document(i + 1, total, source, output_dir, mode, config, tools).await;
        outcomes.push(outcome);
    }

    let report = BatchReport::from_outcomes(outcomes, batch_start.elapsed().as_millis() as u64);
    info!(
        "Batch complete: {}/{} documents succeeded in {}ms",
        report.stats.succeeded, report.stats.total, report.stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(report.stats.total, report.stats.succeeded);
    }
    Ok(report)
}

/// Synchronous wrapper around [`run_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_batch_sync(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &BatchConfig,
    tools: &Collaborators,
) -> Result<BatchReport, BulkOcrError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BulkOcrError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run_batch(input_dir, output_dir, config, tools))
}

/// Setup shared by the eager and streaming entry points.
pub(crate) async fn prepare(
    input_dir: &Path,
    output_dir: &Path,
    config: &BatchConfig,
) -> Result<Vec<PathBuf>, BulkOcrError> {
    info!(
        "Starting batch: {} → {}",
        input_dir.display(),
        output_dir.display()
    );
    let documents = input::discover_documents(input_dir).await?;
    input::ensure_output_dir(output_dir).await?;
    info!("Found {} documents", documents.len());

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(documents.len());
    }
    Ok(documents)
}

/// Resolve the batch's OCR mode, surfacing a skip/force conflict once.
pub(crate) fn announce_mode(config: &BatchConfig) -> OcrMode {
    let (mode, conflict) = config.ocr_mode();
    if let Some(conflict) = conflict {
        let message = conflict.to_string();
        warn!("{message}");
        if let Some(ref cb) = config.progress_callback {
            cb.on_mode_conflict(&message);
        }
    }
    debug!("OCR mode: {mode}");
    mode
}

/// Run one document through inspect → preprocess → OCR → cleanup.
///
/// Always returns an outcome; errors are recorded, never propagated.
pub async fn process_document(
    index: usize,
    total: usize,
    source: &Path,
    output_dir: &Path,
    mode: OcrMode,
    config: &BatchConfig,
    tools: &Collaborators,
) -> DocumentOutcome {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(index, total, &file_name);
    }

    // ── Step 1: Resolve job parameters ───────────────────────────────────
    // The heuristic always looks at the original, even when a cleaned copy
    // is what the engine ends up reading.
    let parallel = match config.max_jobs {
        Some(n) if n > 1 => {
            should_use_parallel(tools.reader.as_ref(), source, &config.thresholds).await
        }
        _ => false,
    };
    let job = DocumentJob {
        source: source.to_path_buf(),
        destination: output_dir.join(&file_name),
        language: config.language.clone(),
        jobs: resolve_jobs(config.max_jobs, parallel),
        mode,
        remove_background: config.remove_background,
        output_type: config.output_type,
    };
    debug!("[{index}/{total}] {job:?}");

    let start = Instant::now();

    // ── Step 2: Optional background removal ──────────────────────────────
    let mut preprocess_fallback = false;
    let artifact = if job.remove_background {
        match clean_copy(&job, config, tools).await {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                preprocess_fallback = true;
                warn!("[{index}/{total}] {file_name}: {e}; using original document");
                if let Some(ref cb) = config.progress_callback {
                    cb.on_preprocess_fallback(index, total, &file_name, &e.to_string());
                }
                None
            }
        }
    } else {
        None
    };

    // ── Step 3: OCR ──────────────────────────────────────────────────────
    let ocr_input = artifact
        .as_ref()
        .map(|a| a.path())
        .unwrap_or(job.source.as_path());
    let result = tools.engine.ocr(&job.ocr_request(ocr_input)).await;

    // ── Step 4: Timing ───────────────────────────────────────────────────
    let duration_ms = start.elapsed().as_millis() as u64;

    // ── Step 5: Cleanup ──────────────────────────────────────────────────
    if let Some(artifact) = artifact {
        artifact.remove();
    }

    // ── Step 6: Report ───────────────────────────────────────────────────
    match &result {
        Ok(()) => {
            info!(
                "[{index}/{total}] {file_name} ({} jobs) in {duration_ms}ms",
                job.jobs
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_complete(index, total, &file_name, job.jobs, duration_ms);
            }
        }
        Err(e) => {
            warn!("[{index}/{total}] {file_name} failed: {e}");
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_error(index, total, &file_name, &e.to_string());
            }
        }
    }

    DocumentOutcome {
        index,
        file_name,
        source: job.source,
        destination: job.destination,
        jobs: job.jobs,
        mode: job.mode,
        preprocess_fallback,
        duration_ms,
        error: result.err(),
    }
}

/// Produce the cleaned copy of `job.source`. The artifact is dropped (and
/// deleted) if the preprocessor fails.
async fn clean_copy(
    job: &DocumentJob,
    config: &BatchConfig,
    tools: &Collaborators,
) -> Result<CleanedArtifact, DocumentError> {
    let artifact = CleanedArtifact::create_in(&config.temp_dir(), &job.source)?;
    tools
        .preprocessor
        .remove_background(&job.source, artifact.path(), &config.preprocess)
        .await?;
    Ok(artifact)
}
