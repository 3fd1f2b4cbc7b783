//! CLI binary for bulk-ocr.
//!
//! A thin shim over the library crate that maps CLI flags to `BatchConfig`
//! and prints one line per document.

use anyhow::{Context, Result};
use bulk_ocr::{
    default_jobs, run_batch, BatchConfig, BatchProgressCallback, Collaborators,
    MagickPreprocessor, OcrMyPdf, OutputType, PdfiumReader, ProgressCallback,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Prints one line per document and, when enabled, keeps a progress bar
/// anchored below the log lines. All lines go to stderr; stdout is reserved
/// for `--json`.
struct CliProgressCallback {
    /// `None` when the bar is disabled; lines then go straight to stderr.
    bar: Option<ProgressBar>,
    /// Only warnings and failures are printed.
    quiet: bool,
    /// Destination for lines when there is no bar.
    echo: Box<dyn Fn(&str) + Send + Sync>,
}

impl CliProgressCallback {
    fn new(show_bar: bool, quiet: bool) -> Arc<Self> {
        let show_bar = show_bar && !quiet;
        let bar = show_bar.then(|| {
            let style = ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} documents  \
                 ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

            let bar = ProgressBar::new(0);
            bar.set_style(style);
            bar.set_prefix("OCR");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        Arc::new(Self {
            bar,
            quiet,
            echo: Box::new(|text| eprintln!("{text}")),
        })
    }

    fn line(&self, text: String) {
        match self.bar {
            Some(ref bar) => bar.println(text),
            None => (self.echo)(text.as_str()),
        }
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        if let Some(ref bar) = self.bar {
            bar.set_length(total as u64);
        }
        if total == 0 && !self.quiet {
            self.line(dim("No PDF files found."));
        }
    }

    fn on_mode_conflict(&self, message: &str) {
        self.line(yellow(&format!("Warning: {message}")));
    }

    fn on_document_start(&self, _index: usize, _total: usize, name: &str) {
        if let Some(ref bar) = self.bar {
            bar.set_message(name.to_string());
        }
    }

    fn on_preprocess_fallback(&self, index: usize, total: usize, name: &str, error: &str) {
        self.line(format!(
            "[{index}/{total}] {} {name}: {} {}",
            yellow("⚠"),
            error,
            dim("(using original)")
        ));
    }

    fn on_document_complete(
        &self,
        index: usize,
        total: usize,
        name: &str,
        jobs: usize,
        elapsed_ms: u64,
    ) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
        if self.quiet {
            return;
        }
        let mode = if jobs > 1 {
            format!("{jobs} jobs")
        } else {
            "single-thread".to_string()
        };
        self.line(format!(
            "[{index}/{total}] {} {name} ({mode}) in {}",
            green("✓"),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_document_error(&self, index: usize, total: usize, name: &str, error: &str) {
        self.line(format!("[{index}/{total}] {} {name}: {}", red("✗"), red(error)));
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
        if self.quiet {
            return;
        }
        let failed = total.saturating_sub(succeeded);
        if failed == 0 {
            eprintln!(
                "{} {} documents converted",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents converted  ({} failed)",
                if succeeded == 0 { red("✘") } else { yellow("⚠") },
                bold(&succeeded.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # OCR every PDF in ./scans into ./searchable
  bulkocr scans searchable

  # German + English, keep pages that already have text
  bulkocr -l deu+eng --skip scans searchable

  # Replace existing text layers, up to 6 jobs for large files
  bulkocr --force -j 6 scans searchable

  # Clean faint backgrounds first (needs ImageMagick)
  bulkocr --remove-background scans searchable

  # Machine-readable report
  bulkocr --json scans searchable > report.json

PARALLELISM:
  A document gets --jobs workers when it has at least 10 pages or is at
  least 5 MiB; otherwise it is processed single-threaded. Documents are
  always processed one at a time.

ENVIRONMENT VARIABLES:
  BULKOCR_LANGUAGE     Default for --language
  BULKOCR_JOBS         Default for --jobs
  BULKOCR_OCRMYPDF     Path to the ocrmypdf executable
  BULKOCR_MAGICK       Path to the ImageMagick executable
  PDFIUM_LIB_PATH      Directory containing libpdfium (page counting)
  RUST_LOG             Log filter, e.g. bulk_ocr=debug

OUTPUT STREAMS:
  Per-document lines, warnings and logs go to stderr. stdout carries only
  the --json report, so `bulkocr --json in out | jq` stays parseable.
"#;

/// Bulk OCR scanned PDFs into searchable PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "bulkocr",
    version,
    about = "Bulk OCR PDFs into searchable PDFs, preserving drawings and images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Folder containing input .pdf files.
    input_dir: PathBuf,

    /// Folder for OCR'd output PDFs (created if missing).
    output_dir: PathBuf,

    /// Tesseract language code, e.g. eng, deu+eng.
    #[arg(short, long, env = "BULKOCR_LANGUAGE", default_value = "eng")]
    language: String,

    /// Skip OCR on pages that already have text.
    #[arg(short, long)]
    skip: bool,

    /// Force OCR on all pages, replacing existing text.
    #[arg(short, long)]
    force: bool,

    /// Remove faint backgrounds (grayscale, blur, threshold) before OCR.
    #[arg(long, env = "BULKOCR_REMOVE_BACKGROUND")]
    remove_background: bool,

    /// Max parallel OCR jobs per large document [default: half the CPUs, max 8].
    #[arg(short, long, env = "BULKOCR_JOBS",
          value_parser = clap::value_parser!(u32).range(1..))]
    jobs: Option<u32>,

    /// Output format requested from ocrmypdf.
    #[arg(long, env = "BULKOCR_OUTPUT_TYPE", value_enum, default_value = "pdf")]
    output_type: OutputTypeArg,

    /// ocrmypdf executable.
    #[arg(long, env = "BULKOCR_OCRMYPDF", default_value = "ocrmypdf")]
    ocrmypdf: String,

    /// ImageMagick executable (`convert` for ImageMagick 6).
    #[arg(long, env = "BULKOCR_MAGICK", default_value = "magick")]
    magick: String,

    /// Directory for temporary cleaned documents [default: OS temp dir].
    #[arg(long, env = "BULKOCR_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Print the batch report as JSON on stdout (progress lines stay on stderr).
    #[arg(long, env = "BULKOCR_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "BULKOCR_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BULKOCR_VERBOSE")]
    verbose: bool,

    /// Print only warnings and failed documents.
    #[arg(short, long, env = "BULKOCR_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OutputTypeArg {
    Pdf,
    Pdfa,
}

impl From<OutputTypeArg> for OutputType {
    fn from(v: OutputTypeArg) -> Self {
        match v {
            OutputTypeArg::Pdf => OutputType::Pdf,
            OutputTypeArg::Pdfa => OutputType::PdfA,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The per-document lines carry everything a user needs; library logs
    // stay at ERROR unless the bar is off or --verbose is given.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let engine = OcrMyPdf::new(&cli.ocrmypdf);
    match engine.version().await {
        Ok(v) => tracing::debug!("ocrmypdf {v}"),
        Err(e) => warn!("{e}; every document will fail until ocrmypdf is installed"),
    }

    let progress: ProgressCallback = CliProgressCallback::new(show_progress, cli.quiet);

    let config = build_config(&cli, progress)?;
    let tools = Collaborators {
        reader: Arc::new(PdfiumReader::from_env()),
        engine: Arc::new(engine),
        preprocessor: Arc::new(MagickPreprocessor::new(&cli.magick)),
    };

    let report = run_batch(&cli.input_dir, &cli.output_dir, &config, &tools)
        .await
        .context("Batch failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    }

    Ok(())
}

/// Map CLI args to `BatchConfig`.
fn build_config(cli: &Cli, progress: ProgressCallback) -> Result<BatchConfig> {
    let jobs = cli
        .jobs
        .map(|j| j as usize)
        .unwrap_or_else(|| default_jobs(num_cpus::get()));

    let mut builder = BatchConfig::builder()
        .language(cli.language.trim())
        .max_jobs(jobs)
        .skip_text(cli.skip)
        .force(cli.force)
        .remove_background(cli.remove_background)
        .output_type(cli.output_type.clone().into())
        .progress_callback(progress);

    if let Some(ref dir) = cli.temp_dir {
        builder = builder.temp_dir(dir);
    }

    builder.build().context("Invalid configuration")
}
