//! Result types returned by a batch run.

use crate::config::OcrMode;
use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one document's pipeline. Exactly one per input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    /// 1-based position in the batch.
    pub index: usize,
    /// File name, e.g. `scan-042.pdf`.
    pub file_name: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Job count handed to the engine.
    pub jobs: usize,
    pub mode: OcrMode,
    /// True when background removal was requested but fell back to the original.
    pub preprocess_fallback: bool,
    pub duration_ms: u64,
    /// `None` on success.
    pub error: Option<DocumentError>,
}

impl DocumentOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// `4 jobs` or `single-thread`.
    pub fn jobs_label(&self) -> String {
        if self.jobs > 1 {
            format!("{} jobs", self.jobs)
        } else {
            "single-thread".to_string()
        }
    }
}

/// Aggregate figures for a whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub preprocess_fallbacks: usize,
    pub total_duration_ms: u64,
}

/// Everything a batch run produced, in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub documents: Vec<DocumentOutcome>,
    pub stats: BatchStats,
}

impl BatchReport {
    pub(crate) fn from_outcomes(documents: Vec<DocumentOutcome>, total_duration_ms: u64) -> Self {
        let succeeded = documents.iter().filter(|d| d.is_success()).count();
        let stats = BatchStats {
            total: documents.len(),
            succeeded,
            failed: documents.len() - succeeded,
            preprocess_fallbacks: documents.iter().filter(|d| d.preprocess_fallback).count(),
            total_duration_ms,
        };
        Self { documents, stats }
    }

    /// Iterate over the failed documents only.
    pub fn failures(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.documents.iter().filter(|d| !d.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(index: usize, jobs: usize, error: Option<DocumentError>) -> DocumentOutcome {
        DocumentOutcome {
            index,
            file_name: format!("{index}.pdf"),
            source: PathBuf::from(format!("in/{index}.pdf")),
            destination: PathBuf::from(format!("out/{index}.pdf")),
            jobs,
            mode: OcrMode::RedoOcr,
            preprocess_fallback: false,
            duration_ms: 10,
            error,
        }
    }

    #[test]
    fn jobs_label() {
        assert_eq!(outcome(1, 1, None).jobs_label(), "single-thread");
        assert_eq!(outcome(1, 4, None).jobs_label(), "4 jobs");
    }

    #[test]
    fn stats_count_failures() {
        let failed = DocumentError::OcrFailed {
            exit_code: Some(2),
            detail: "bad input".into(),
        };
        let report = BatchReport::from_outcomes(
            vec![outcome(1, 1, None), outcome(2, 4, Some(failed)), outcome(3, 1, None)],
            30,
        );
        assert_eq!(report.stats.total, 3);
        assert_eq!(report.stats.succeeded, 2);
        assert_eq!(report.stats.failed, 1);
        assert_eq!(report.failures().map(|d| d.index).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn report_serialises_to_json() {
        let report = BatchReport::from_outcomes(vec![outcome(1, 1, None)], 5);
        let json = serde_json::to_string(&report).expect("serialise");
        assert!(json.contains("\"file_name\":\"1.pdf\""));
        assert!(json.contains("RedoOcr"));
    }
}
