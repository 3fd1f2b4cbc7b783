//! # bulk-ocr
//!
//! Batch-convert scanned PDFs into searchable PDFs.
//!
//! Recognition itself is delegated to [ocrmypdf](https://ocrmypdf.readthedocs.io)
//! (Tesseract underneath). This crate decides *how* each document is handed to
//! it: how many jobs, which text-layer mode, whether to clean the page images
//! first, and it keeps one bad file from taking down the rest of the batch.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input dir
//!  │
//!  ├─ 1. Discover  *.pdf files, sorted (setup errors are fatal)
//!  └─ for each document, sequentially:
//!      ├─ 2. Inspect     page count + size → 1 job or --jobs N
//!      ├─ 3. Preprocess  optional background removal (ImageMagick)
//!      ├─ 4. OCR         ocrmypdf --skip-text | --force-ocr | --redo-ocr
//!      ├─ 5. Cleanup     temp artifact removed, whatever happened
//!      └─ 6. Report      one DocumentOutcome per input
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bulk_ocr::{run_batch, BatchConfig, Collaborators};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig::builder().max_jobs(4).build()?;
//!     let report = run_batch("scans", "searchable", &config, &Collaborators::default()).await?;
//!     eprintln!("{}/{} succeeded", report.stats.succeeded, report.stats.total);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `bulkocr` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Runtime requirements
//!
//! `ocrmypdf` on `PATH` (or `--ocrmypdf`), ImageMagick for
//! `--remove-background`, and libpdfium for page counting. Without libpdfium
//! every document is simply OCR'd single-threaded.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{process_document, run_batch, run_batch_sync, Collaborators, DocumentJob};
pub use config::{
    default_jobs, BatchConfig, BatchConfigBuilder, ModeConflict, OcrMode, OutputType,
    ParallelThresholds, PreprocessParams,
};
pub use error::{BulkOcrError, DocumentError};
pub use output::{BatchReport, BatchStats, DocumentOutcome};
pub use pipeline::inspect::{DocumentInfo, DocumentReader, PdfiumReader};
pub use pipeline::ocr::{OcrEngine, OcrMyPdf, OcrRequest};
pub use pipeline::preprocess::{ImagePreprocessor, MagickPreprocessor};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{run_batch_stream, OutcomeStream};
