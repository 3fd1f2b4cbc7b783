//! Configuration types for batch OCR runs.
//!
//! All batch behaviour is controlled through [`BatchConfig`], built via its
//! [`BatchConfigBuilder`]. The config is passed explicitly into
//! [`crate::batch::run_batch`]; nothing is read from process-wide state
//! once the batch has started.

use crate::error::BulkOcrError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Page count at or above which a document is OCR'd with multiple jobs.
pub const DEFAULT_PAGE_THRESHOLD: usize = 10;

/// File size (bytes) at or above which a document is OCR'd with multiple jobs.
pub const DEFAULT_SIZE_THRESHOLD: u64 = 5 * 1024 * 1024;

/// Upper bound for the CPU-derived default job count.
pub const MAX_DEFAULT_JOBS: usize = 8;

/// Configuration for a batch OCR run.
///
/// # Example
/// ```rust
/// use bulk_ocr::BatchConfig;
///
/// let config = BatchConfig::builder()
///     .language("deu+eng")
///     .max_jobs(4)
///     .force(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Recognition language passed straight to the engine (`eng`, `deu+eng`, …). Default: `eng`.
    pub language: String,

    /// Maximum OCR jobs per document when the parallelism heuristic fires.
    ///
    /// `None` means every document is processed single-threaded.
    pub max_jobs: Option<usize>,

    /// Skip pages that already carry a text layer.
    pub skip_text: bool,

    /// Re-recognise every page, replacing any existing text layer.
    ///
    /// Wins over `skip_text` when both are set.
    pub force_ocr: bool,

    /// Clean page images (grayscale, blur, threshold) before OCR. Default: false.
    pub remove_background: bool,

    /// Output flavour requested from the engine. Default: [`OutputType::Pdf`].
    pub output_type: OutputType,

    /// Thresholds for the single- vs multi-job decision.
    pub thresholds: ParallelThresholds,

    /// Parameters for the background-removal pass.
    pub preprocess: PreprocessParams,

    /// Directory for temporary cleaned documents. `None` uses the OS temp dir.
    pub temp_dir: Option<PathBuf>,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            max_jobs: None,
            skip_text: false,
            force_ocr: false,
            remove_background: false,
            output_type: OutputType::default(),
            thresholds: ParallelThresholds::default(),
            preprocess: PreprocessParams::default(),
            temp_dir: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("language", &self.language)
            .field("max_jobs", &self.max_jobs)
            .field("skip_text", &self.skip_text)
            .field("force_ocr", &self.force_ocr)
            .field("remove_background", &self.remove_background)
            .field("output_type", &self.output_type)
            .field("thresholds", &self.thresholds)
            .field("preprocess", &self.preprocess)
            .field("temp_dir", &self.temp_dir)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }

    /// The OCR mode every document in this batch will use.
    pub fn ocr_mode(&self) -> (OcrMode, Option<ModeConflict>) {
        OcrMode::resolve(self.skip_text, self.force_ocr)
    }

    /// Directory that receives temporary cleaned documents.
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    pub fn max_jobs(mut self, n: usize) -> Self {
        self.config.max_jobs = Some(n.max(1));
        self
    }

    pub fn skip_text(mut self, v: bool) -> Self {
        self.config.skip_text = v;
        self
    }

    pub fn force(mut self, v: bool) -> Self {
        self.config.force_ocr = v;
        self
    }

    pub fn remove_background(mut self, v: bool) -> Self {
        self.config.remove_background = v;
        self
    }

    pub fn output_type(mut self, t: OutputType) -> Self {
        self.config.output_type = t;
        self
    }

    pub fn thresholds(mut self, t: ParallelThresholds) -> Self {
        self.config.thresholds = t;
        self
    }

    pub fn preprocess(mut self, p: PreprocessParams) -> Self {
        self.config.preprocess = p;
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, BulkOcrError> {
        let c = &self.config;
        if c.language.trim().is_empty() {
            return Err(BulkOcrError::InvalidConfig(
                "Language must not be empty".into(),
            ));
        }
        if c.max_jobs == Some(0) {
            return Err(BulkOcrError::InvalidConfig("Jobs must be ≥ 1".into()));
        }
        if !(1..=100).contains(&c.preprocess.threshold_percent) {
            return Err(BulkOcrError::InvalidConfig(format!(
                "Threshold must be 1–100%, got {}",
                c.preprocess.threshold_percent
            )));
        }
        if c.preprocess.density == 0 {
            return Err(BulkOcrError::InvalidConfig(
                "Rasterisation density must be > 0".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Default `--jobs` value for a machine with `cpu_count` logical CPUs:
/// half the cores, at least 1, at most [`MAX_DEFAULT_JOBS`].
pub fn default_jobs(cpu_count: usize) -> usize {
    (cpu_count / 2).clamp(1, MAX_DEFAULT_JOBS)
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the engine treats pages that already have a text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrMode {
    /// Leave pages with existing text untouched.
    SkipText,
    /// Rasterise and re-recognise every page, discarding existing text.
    ForceOcr,
    /// Strip any previous OCR layer and recognise again. (default)
    #[default]
    RedoOcr,
}

/// Emitted when both skip and force were requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeConflict;

impl fmt::Display for ModeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("--skip and --force are mutually exclusive. Using --force instead.")
    }
}

impl OcrMode {
    /// Map the (skip, force) flags to a mode. Force wins a conflict.
    pub fn resolve(skip_text: bool, force_ocr: bool) -> (OcrMode, Option<ModeConflict>) {
        match (skip_text, force_ocr) {
            (true, true) => (OcrMode::ForceOcr, Some(ModeConflict)),
            (true, false) => (OcrMode::SkipText, None),
            (false, true) => (OcrMode::ForceOcr, None),
            (false, false) => (OcrMode::RedoOcr, None),
        }
    }

    /// The ocrmypdf flag selecting this mode.
    pub fn as_flag(self) -> &'static str {
        match self {
            OcrMode::SkipText => "--skip-text",
            OcrMode::ForceOcr => "--force-ocr",
            OcrMode::RedoOcr => "--redo-ocr",
        }
    }
}

impl fmt::Display for OcrMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OcrMode::SkipText => "skip-text",
            OcrMode::ForceOcr => "force-ocr",
            OcrMode::RedoOcr => "redo-ocr",
        })
    }
}

/// Output flavour requested from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputType {
    /// Plain PDF. (default)
    #[default]
    Pdf,
    /// Archival PDF/A.
    PdfA,
}

impl OutputType {
    pub fn as_arg(self) -> &'static str {
        match self {
            OutputType::Pdf => "pdf",
            OutputType::PdfA => "pdfa",
        }
    }
}

/// Page-count and byte-size thresholds for multi-job OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelThresholds {
    pub min_pages: usize,
    pub min_bytes: u64,
}

impl Default for ParallelThresholds {
    fn default() -> Self {
        Self {
            min_pages: DEFAULT_PAGE_THRESHOLD,
            min_bytes: DEFAULT_SIZE_THRESHOLD,
        }
    }
}

/// Parameters for the background-removal pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessParams {
    /// Rasterisation density in DPI. Default: 300.
    pub density: u32,
    /// Blur geometry (`radius x sigma`). Default: `0x1`.
    pub blur: String,
    /// Pixels brighter than this percentage become white. Default: 80.
    pub threshold_percent: u8,
}

impl Default for PreprocessParams {
    fn default() -> Self {
        Self {
            density: 300,
            blur: "0x1".to_string(),
            threshold_percent: 80,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_mode_all_combinations() {
        assert_eq!(
            OcrMode::resolve(true, true),
            (OcrMode::ForceOcr, Some(ModeConflict))
        );
        assert_eq!(OcrMode::resolve(true, false), (OcrMode::SkipText, None));
        assert_eq!(OcrMode::resolve(false, true), (OcrMode::ForceOcr, None));
        assert_eq!(OcrMode::resolve(false, false), (OcrMode::RedoOcr, None));
    }

    #[test]
    fn mode_flags() {
        assert_eq!(OcrMode::SkipText.as_flag(), "--skip-text");
        assert_eq!(OcrMode::ForceOcr.as_flag(), "--force-ocr");
        assert_eq!(OcrMode::RedoOcr.as_flag(), "--redo-ocr");
    }

    #[test]
    fn default_jobs_is_half_cores_clamped() {
        assert_eq!(default_jobs(0), 1);
        assert_eq!(default_jobs(1), 1);
        assert_eq!(default_jobs(2), 1);
        assert_eq!(default_jobs(6), 3);
        assert_eq!(default_jobs(16), 8);
        assert_eq!(default_jobs(64), 8);
    }

    #[test]
    fn builder_defaults() {
        let c = BatchConfig::builder().build().unwrap();
        assert_eq!(c.language, "eng");
        assert_eq!(c.max_jobs, None);
        assert_eq!(c.ocr_mode().0, OcrMode::RedoOcr);
        assert_eq!(c.output_type, OutputType::Pdf);
        assert_eq!(c.thresholds.min_pages, 10);
        assert_eq!(c.thresholds.min_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn builder_clamps_jobs_to_one() {
        let c = BatchConfig::builder().max_jobs(0).build().unwrap();
        assert_eq!(c.max_jobs, Some(1));
    }

    #[test]
    fn builder_rejects_empty_language() {
        let err = BatchConfig::builder().language("  ").build().unwrap_err();
        assert!(matches!(err, BulkOcrError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_bad_threshold() {
        let err = BatchConfig::builder()
            .preprocess(PreprocessParams {
                threshold_percent: 0,
                ..PreprocessParams::default()
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Threshold"));
    }

    #[test]
    fn conflict_message_names_both_flags() {
        let msg = ModeConflict.to_string();
        assert!(msg.contains("--skip") && msg.contains("--force"));
    }

    #[test]
    fn temp_dir_defaults_to_os_temp() {
        let c = BatchConfig::default();
        assert_eq!(c.temp_dir(), std::env::temp_dir());
    }
}
