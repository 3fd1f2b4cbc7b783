//! Streaming batch API: yield each document's outcome as soon as it is done.
//!
//! Unlike [`crate::batch::run_batch`], which returns only after the whole
//! directory has been processed, [`run_batch_stream`] hands back a `Stream`
//! and processes a document each time the caller polls for the next item.
//! Order and sequencing are the same: one document at a time, in file-name
//! order. Dropping the stream stops the batch after the current document.

use crate::batch::{announce_mode, prepare, process_document, Collaborators};
use crate::config::BatchConfig;
use crate::error::BulkOcrError;
use crate::output::DocumentOutcome;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio_stream::Stream;

/// A boxed stream of per-document outcomes.
pub type OutcomeStream = Pin<Box<dyn Stream<Item = DocumentOutcome> + Send>>;

/// OCR `input_dir` into `output_dir`, streaming outcomes.
///
/// # Returns
/// - `Ok(OutcomeStream)` — one item per input document
/// - `Err(BulkOcrError)` — setup failure (nothing was processed)
///
/// # Example
/// ```rust,no_run
/// use bulk_ocr::{run_batch_stream, BatchConfig, Collaborators};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = BatchConfig::default();
/// let mut outcomes = run_batch_stream("scans", "searchable", &config, &Collaborators::default()).await?;
/// while let Some(doc) = outcomes.next().await {
///     println!("{} ok={}", doc.file_name, doc.is_success());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn run_batch_stream(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &BatchConfig,
    tools: &Collaborators,
) -> Result<OutcomeStream, BulkOcrError> {
    let output_dir: PathBuf = output_dir.as_ref().to_path_buf();
    let documents = prepare(input_dir.as_ref(), &output_dir, config).await?;
    let total = documents.len();
    let mode = announce_mode(config);

    let config = config.clone();
    let tools = tools.clone();

    let s = stream::iter(documents.into_iter().enumerate()).then(move |(i, source)| {
        let config = config.clone();
        let tools = tools.clone();
        let output_dir = output_dir.clone();
        async move {
            process_document(i + 1, total, &source, &output_dir, mode, &config, &tools).await
        }
    });

    Ok(Box::pin(s))
}
