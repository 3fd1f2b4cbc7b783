//! Optional background removal before OCR.
//!
//! Faint paper texture, coffee stains and bleed-through confuse Tesseract.
//! When enabled, each page is rasterised at a high density, converted to
//! grayscale, blurred slightly and thresholded, so only dark ink survives.
//! The pass is delegated to ImageMagick through [`ImagePreprocessor`].
//!
//! The cleaned copy lives in a [`CleanedArtifact`], which deletes the file
//! when dropped. The orchestrator keeps it alive until the document's OCR
//! call returns, so cleanup happens on every exit path.

use crate::config::PreprocessParams;
use crate::error::DocumentError;
use crate::pipeline::command::{run_tool, stderr_summary};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::process::Command;
use tracing::debug;

/// Prefix of every temporary cleaned document.
pub const ARTIFACT_PREFIX: &str = "bulkocr-";

/// Suffix of every temporary cleaned document.
pub const ARTIFACT_SUFFIX: &str = ".clean.pdf";

/// Writes a background-free copy of `source` to `destination`.
#[async_trait]
pub trait ImagePreprocessor: Send + Sync {
    async fn remove_background(
        &self,
        source: &Path,
        destination: &Path,
        params: &PreprocessParams,
    ) -> Result<(), DocumentError>;
}

/// ImageMagick-backed preprocessor.
#[derive(Debug, Clone)]
pub struct MagickPreprocessor {
    /// Executable name or path. Default: `magick` (ImageMagick 7).
    /// Use `convert` for ImageMagick 6.
    pub program: String,
}

impl Default for MagickPreprocessor {
    fn default() -> Self {
        Self {
            program: "magick".to_string(),
        }
    }
}

impl MagickPreprocessor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for one run, in order.
    pub fn args(
        source: &Path,
        destination: &Path,
        params: &PreprocessParams,
    ) -> Vec<std::ffi::OsString> {
        vec![
            "-density".into(),
            params.density.to_string().into(),
            source.into(),
            "-colorspace".into(),
            "Gray".into(),
            "-blur".into(),
            params.blur.clone().into(),
            "-threshold".into(),
            format!("{}%", params.threshold_percent).into(),
            destination.into(),
        ]
    }
}

#[async_trait]
impl ImagePreprocessor for MagickPreprocessor {
    async fn remove_background(
        &self,
        source: &Path,
        destination: &Path,
        params: &PreprocessParams,
    ) -> Result<(), DocumentError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(Self::args(source, destination, params));

        let output = run_tool(cmd, &self.program).await?;
        if !output.status.success() {
            return Err(DocumentError::PreprocessFailed {
                detail: stderr_summary(&output),
            });
        }
        debug!(
            "Cleaned {} → {}",
            source.display(),
            destination.display()
        );
        Ok(())
    }
}

/// A temporary cleaned document, removed on drop.
#[derive(Debug)]
pub struct CleanedArtifact {
    path: TempPath,
}

impl CleanedArtifact {
    /// Reserve `<dir>/bulkocr-<stem>-XXXXXX.clean.pdf`.
    pub fn create_in(dir: &Path, source: &Path) -> Result<Self, DocumentError> {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let file = tempfile::Builder::new()
            .prefix(&format!("{ARTIFACT_PREFIX}{stem}-"))
            .suffix(ARTIFACT_SUFFIX)
            .tempfile_in(dir)
            .map_err(|e| DocumentError::PreprocessFailed {
                detail: format!("cannot create temp file in {}: {e}", dir.display()),
            })?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete now. Failures are logged at debug level and otherwise ignored.
    pub fn remove(self) {
        let shown: PathBuf = self.path.to_path_buf();
        if let Err(e) = self.path.close() {
            debug!("Could not remove {}: {e}", shown.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn magick_args_follow_operator_order() {
        let args: Vec<String> = MagickPreprocessor::args(
            Path::new("/in/c.pdf"),
            Path::new("/tmp/c.clean.pdf"),
            &PreprocessParams::default(),
        )
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
        assert_eq!(
            args,
            vec![
                "-density",
                "300",
                "/in/c.pdf",
                "-colorspace",
                "Gray",
                "-blur",
                "0x1",
                "-threshold",
                "80%",
                "/tmp/c.clean.pdf"
            ]
        );
    }

    #[test]
    fn artifact_name_references_source_and_is_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let artifact = CleanedArtifact::create_in(dir.path(), Path::new("/in/c.pdf")).unwrap();
        let path = artifact.path().to_path_buf();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("bulkocr-c-"), "got {name}");
        assert!(name.ends_with(".clean.pdf"), "got {name}");
        assert!(path.exists());

        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn remove_tolerates_already_deleted_file() {
        let dir = TempDir::new().unwrap();
        let artifact = CleanedArtifact::create_in(dir.path(), Path::new("x.pdf")).unwrap();
        std::fs::remove_file(artifact.path()).unwrap();
        artifact.remove();
    }

    #[test]
    fn artifact_in_missing_dir_is_preprocess_failure() {
        let dir = TempDir::new().unwrap();
        let err = CleanedArtifact::create_in(&dir.path().join("gone"), Path::new("x.pdf"))
            .unwrap_err();
        assert!(matches!(err, DocumentError::PreprocessFailed { .. }));
    }

    #[tokio::test]
    async fn missing_magick_is_launch_failure() {
        let dir = TempDir::new().unwrap();
        let pre = MagickPreprocessor::new("bulkocr-no-such-tool-xyz");
        let err = pre
            .remove_background(
                Path::new("in.pdf"),
                &dir.path().join("out.pdf"),
                &PreprocessParams::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::ToolLaunchFailed { .. }));
    }
}
