//! OCR engine invocation.
//!
//! The engine is a black box behind [`OcrEngine`]. The default
//! implementation, [`OcrMyPdf`], shells out to `ocrmypdf`, which rasterises
//! pages, runs Tesseract and writes a PDF with an invisible text layer.
//! Parallelism inside one document is entirely the engine's business; we
//! only tell it how many jobs it may use.

use crate::config::{OcrMode, OutputType};
use crate::error::DocumentError;
use crate::pipeline::command::{run_tool, stderr_summary};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Everything the engine needs to process one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub language: String,
    pub output_type: OutputType,
    pub jobs: usize,
    pub mode: OcrMode,
}

/// Produces a searchable document at `request.destination`.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn ocr(&self, request: &OcrRequest) -> Result<(), DocumentError>;
}

/// `ocrmypdf` command-line engine.
#[derive(Debug, Clone)]
pub struct OcrMyPdf {
    /// Executable name or path. Default: `ocrmypdf` (resolved via `PATH`).
    pub program: String,
}

impl Default for OcrMyPdf {
    fn default() -> Self {
        Self {
            program: "ocrmypdf".to_string(),
        }
    }
}

impl OcrMyPdf {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `ocrmypdf --version`, trimmed. Errors if the program cannot run.
    pub async fn version(&self) -> Result<String, DocumentError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--version");
        let output = run_tool(cmd, &self.program).await?;
        if !output.status.success() {
            return Err(DocumentError::ToolLaunchFailed {
                tool: self.program.clone(),
                detail: stderr_summary(&output),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Arguments for one run, in order.
    pub fn args(request: &OcrRequest) -> Vec<std::ffi::OsString> {
        vec![
            "-l".into(),
            request.language.clone().into(),
            "--output-type".into(),
            request.output_type.as_arg().into(),
            "--jobs".into(),
            request.jobs.to_string().into(),
            request.mode.as_flag().into(),
            request.source.clone().into(),
            request.destination.clone().into(),
        ]
    }
}

#[async_trait]
impl OcrEngine for OcrMyPdf {
    async fn ocr(&self, request: &OcrRequest) -> Result<(), DocumentError> {
        validate_language(&request.language)?;

        let mut cmd = Command::new(&self.program);
        cmd.args(Self::args(request));

        let output = run_tool(cmd, &self.program).await?;
        if output.status.success() {
            debug!("ocrmypdf wrote {}", request.destination.display());
            return Ok(());
        }

        let exit_code = output.status.code();
        let summary = stderr_summary(&output);
        let detail = match exit_code.and_then(describe_exit_code) {
            Some(meaning) => format!("{meaning}: {summary}"),
            None => summary,
        };
        Err(DocumentError::OcrFailed { exit_code, detail })
    }
}

/// Human-readable meaning of ocrmypdf's documented exit codes.
pub fn describe_exit_code(code: i32) -> Option<&'static str> {
    Some(match code {
        1 => "bad arguments",
        2 => "input file is not a valid PDF",
        3 => "missing dependency",
        4 => "output file is invalid",
        5 => "file access error",
        6 => "page already has text",
        7 => "child process error",
        8 => "input file is encrypted",
        9 => "invalid configuration",
        10 => "PDF/A conversion failed",
        15 => "other error",
        130 => "interrupted",
        _ => return None,
    })
}

static LANGUAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_]+(/[A-Za-z_]+)?(\+[A-Za-z_]+(/[A-Za-z_]+)?)*$").expect("valid regex")
});

/// Tesseract language codes: `eng`, `chi_sim`, `deu+eng`, `script/Latin`.
///
/// Rejecting anything else keeps option-looking values (`--foo`) off the
/// engine's command line.
pub fn validate_language(code: &str) -> Result<(), DocumentError> {
    if LANGUAGE_RE.is_match(code) {
        Ok(())
    } else {
        Err(DocumentError::InvalidLanguage {
            code: code.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mode: OcrMode, jobs: usize) -> OcrRequest {
        OcrRequest {
            source: PathBuf::from("/in/a.pdf"),
            destination: PathBuf::from("/out/a.pdf"),
            language: "eng".into(),
            output_type: OutputType::Pdf,
            jobs,
            mode,
        }
    }

    #[test]
    fn args_carry_mode_jobs_and_paths() {
        let args: Vec<String> = OcrMyPdf::args(&request(OcrMode::SkipText, 4))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-l",
                "eng",
                "--output-type",
                "pdf",
                "--jobs",
                "4",
                "--skip-text",
                "/in/a.pdf",
                "/out/a.pdf"
            ]
        );
    }

    #[test]
    fn pdfa_output_type_arg() {
        let mut r = request(OcrMode::RedoOcr, 1);
        r.output_type = OutputType::PdfA;
        let args = OcrMyPdf::args(&r);
        assert!(args.iter().any(|a| a == "pdfa"));
        assert!(args.iter().any(|a| a == "--redo-ocr"));
    }

    #[test]
    fn language_validation() {
        assert!(validate_language("eng").is_ok());
        assert!(validate_language("deu+eng").is_ok());
        assert!(validate_language("chi_sim").is_ok());
        assert!(validate_language("script/Latin").is_ok());
        assert!(validate_language("eng+script/Devanagari").is_ok());
        assert!(validate_language("script/").is_err());
        assert!(validate_language("/etc/passwd").is_err());
        assert!(validate_language("").is_err());
        assert!(validate_language("--tesseract-config").is_err());
        assert!(validate_language("eng;rm").is_err());
        assert!(validate_language("eng+").is_err());
    }

    #[test]
    fn exit_code_descriptions() {
        assert_eq!(describe_exit_code(6), Some("page already has text"));
        assert_eq!(describe_exit_code(8), Some("input file is encrypted"));
        assert_eq!(describe_exit_code(0), None);
        assert_eq!(describe_exit_code(42), None);
    }

    #[test]
    fn invalid_language_never_spawns() {
        let engine = OcrMyPdf::new("bulkocr-no-such-tool-xyz");
        let mut r = request(OcrMode::RedoOcr, 1);
        r.language = "-x".into();
        let err = tokio_test::block_on(engine.ocr(&r)).unwrap_err();
        assert!(matches!(err, DocumentError::InvalidLanguage { .. }));
    }

    #[tokio::test]
    async fn missing_engine_is_launch_failure() {
        let engine = OcrMyPdf::new("bulkocr-no-such-tool-xyz");
        let err = engine.ocr(&request(OcrMode::RedoOcr, 1)).await.unwrap_err();
        assert!(matches!(err, DocumentError::ToolLaunchFailed { .. }));
    }
}
