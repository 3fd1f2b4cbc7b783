//! Error types for the bulk-ocr library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`BulkOcrError`] — **Fatal**: the batch cannot start at all (missing
//!   input directory, output directory cannot be created, bad config).
//!   Returned as `Err(BulkOcrError)` from the top-level `run_batch*`
//!   functions before any document is touched.
//!
//! * [`DocumentError`] — **Non-fatal**: a single document failed (engine
//!   exited non-zero, tool missing, preprocessing glitch) but the rest of the
//!   batch is fine. Stored inside [`crate::output::DocumentOutcome`] so the
//!   batch loop keeps going and callers get a full post-run report.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the bulk-ocr library.
///
/// Document-level failures use [`DocumentError`] and are stored in
/// [`crate::output::DocumentOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum BulkOcrError {
    // ── Setup errors ──────────────────────────────────────────────────────
    /// Input directory does not exist.
    #[error("Input directory not found: '{path}'\nCheck the path exists and is readable.")]
    InputDirNotFound { path: PathBuf },

    /// Input path exists but is a file, not a directory.
    #[error("Input path is not a directory: '{path}'")]
    InputNotADirectory { path: PathBuf },

    /// Input directory could not be listed.
    #[error("Cannot read input directory '{path}': {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output directory could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document.
///
/// Stored in [`crate::output::DocumentOutcome`] when a document fails.
/// The batch always continues with the next document.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentError {
    /// Page count or byte size could not be determined.
    #[error("cannot inspect '{path}': {detail}")]
    InspectFailed { path: PathBuf, detail: String },

    /// Background removal failed; the original document is used instead.
    #[error("background removal failed: {detail}")]
    PreprocessFailed { detail: String },

    /// The OCR engine ran but exited unsuccessfully.
    #[error("{}", ocr_failed_message(*exit_code, detail))]
    OcrFailed {
        exit_code: Option<i32>,
        detail: String,
    },

    /// An external tool could not be started at all.
    #[error("failed to launch '{tool}': {detail}")]
    ToolLaunchFailed { tool: String, detail: String },

    /// Language code rejected before reaching the engine command line.
    #[error("invalid OCR language code '{code}'")]
    InvalidLanguage { code: String },
}

fn ocr_failed_message(exit_code: Option<i32>, detail: &str) -> String {
    match exit_code {
        Some(code) => format!("OCR failed (exit {code}): {detail}"),
        None => format!("OCR failed: {detail}"),
    }
}
