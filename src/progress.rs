//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to receive
//! events as the orchestrator walks the input directory.
//!
//! # Example
//!
//! ```rust
//! use bulk_ocr::{BatchProgressCallback, BatchConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, index: usize, total: usize, name: &str, _jobs: usize, _elapsed_ms: u64) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("[{index}/{total}] {name}");
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { done: AtomicUsize::new(0) });
//!
//! let config = BatchConfig::builder()
//!     .progress_callback(cb as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it processes each document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `index` is 1-based.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the input directory has been listed.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called once, before the first OCR invocation, when both skip and
    /// force were requested.
    fn on_mode_conflict(&self, message: &str) {
        let _ = message;
    }

    /// Called before a document's pipeline starts.
    fn on_document_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when background removal failed and the original is used.
    fn on_preprocess_fallback(&self, index: usize, total: usize, name: &str, error: &str) {
        let _ = (index, total, name, error);
    }

    /// Called when a document was OCR'd successfully.
    fn on_document_complete(
        &self,
        index: usize,
        total: usize,
        name: &str,
        jobs: usize,
        elapsed_ms: u64,
    ) {
        let _ = (index, total, name, jobs, elapsed_ms);
    }

    /// Called when a document failed.
    fn on_document_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let _ = (index, total, name, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        let _ = (total, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
