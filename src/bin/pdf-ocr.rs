//! CLI binary for pdf-ocr.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `OcrConfig`, writes the JSON artifact and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_ocr::config::{DEFAULT_BASE_URL, DEFAULT_MODEL, MAX_DPI};
use pdf_ocr::{
    default_output_path, inspect, ocr_pdf_to_file, OcrConfig, OcrProgressCallback,
    ProgressCallback, RasterFormat,
};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-page wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_run_start` tells us the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Rendering");
        bar.set_message("Rasterising PDF pages…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("OCR");
        self.bar.reset_eta();
    }

    /// Remove the bar from the terminal when the run stops early.
    fn clear(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }

    fn elapsed_secs(&self, page: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl OcrProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Running OCR on {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page, Instant::now());
        }
        self.bar.set_message(format!("page {page}"));
    }

    fn on_page_complete(&self, page: usize, total: usize, text: &str) {
        let secs = self.elapsed_secs(page);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page,
            total,
            dim(&format!("{:>5} chars", text.chars().count())),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(page);

        // Keep one line per page.
        let msg: String = if error.chars().count() > 80 {
            let mut s: String = error.chars().take(79).collect();
            s.push('\u{2026}');
            s
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages transcribed",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages transcribed  ({} failed, marked in the output)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Transcribe a scan (writes scan_ocr.json next to it)
  pdf-ocr scan.pdf --api-key sk-or-...

  # Higher resolution, custom output path
  pdf-ocr --dpi 600 scan.pdf -o out/scan.json

  # Print every page's text once the run finishes
  pdf-ocr --print-text scan.pdf

  # Four pages in flight at once (output order is unchanged)
  pdf-ocr --concurrency 4 book.pdf

  # Use an edgequake-llm provider instead of OpenRouter
  pdf-ocr --provider openai --model gpt-4.1-mini scan.pdf

  # Page count and PDF version only (no API key needed)
  pdf-ocr --inspect-only scan.pdf

OUTPUT:
  {"pages": [{"index": 1, "text": "...", "raw_response": "..."}, ...]}
  Failed pages keep their slot: text starts with "[OCR ERROR]" and an
  "error" object names the cause.

ENVIRONMENT VARIABLES:
  OPENROUTER_API_KEY   OpenRouter API key (also read from ./.env)
  PDF_OCR_*            Fallback for each flag, e.g. PDF_OCR_DPI=600
  PDFIUM_LIB_PATH      Path to libpdfium (file or directory)
  RUST_LOG             Override log filter (e.g. pdf_ocr=debug)
"#;

/// Transcribe PDF pages verbatim with a vision model.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-ocr",
    version,
    about = "OCR a PDF page by page with a vision model and save the text as JSON",
    long_about = "Rasterise every page of a PDF, send each page image to a vision-capable LLM \
(Gemini 2.0 Flash on OpenRouter by default) with a verbatim-transcription instruction, and write \
one JSON entry per page. A page whose OCR call fails is recorded as failed; the run carries on.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the input PDF.
    input: PathBuf,

    /// OpenRouter API key.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Rendering DPI.
    #[arg(long, env = "PDF_OCR_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(1..=MAX_DPI as i64))]
    dpi: u32,

    /// Image format pages are rasterised to.
    #[arg(long, env = "PDF_OCR_FORMAT", value_enum, default_value = "png")]
    format: FormatArg,

    /// Vision model ID.
    #[arg(long, env = "PDF_OCR_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// OpenAI-compatible API base URL.
    #[arg(long, env = "PDF_OCR_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Use an edgequake-llm provider (openai, anthropic, gemini, ollama …)
    /// instead of OpenRouter. The provider reads its own API key variable.
    #[arg(long, env = "PDF_OCR_PROVIDER")]
    provider: Option<String>,

    /// Pages sent to the model at once. Output order is unaffected.
    #[arg(short, long, env = "PDF_OCR_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Per-page OCR call timeout in seconds.
    #[arg(long, env = "PDF_OCR_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Max output tokens per page.
    #[arg(long, env = "PDF_OCR_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "PDF_OCR_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF_OCR_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Write JSON here instead of <input stem>_ocr.json.
    #[arg(short, long, env = "PDF_OCR_OUTPUT")]
    output: Option<PathBuf>,

    /// Store an empty raw_response for every page.
    #[arg(long, env = "PDF_OCR_OMIT_RAW_RESPONSE")]
    omit_raw_response: bool,

    /// Print each page's text to stdout after the run.
    #[arg(long, env = "PDF_OCR_PRINT_TEXT")]
    print_text: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF_OCR_NO_PROGRESS")]
    no_progress: bool,

    /// Print page count and PDF version only, no OCR.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_OCR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_OCR_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Jpeg,
    Tiff,
}

impl From<FormatArg> for RasterFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Png => RasterFormat::Png,
            FormatArg::Jpeg => RasterFormat::Jpeg,
            FormatArg::Tiff => RasterFormat::Tiff,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so `.env` values feed the `env = ...` fallbacks.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter(&cli))),
        )
        .with_writer(io::stderr)
        .init();

    let cli_progress = show_progress(&cli).then(CliProgressCallback::new_dynamic);
    let outcome = run(&cli, cli_progress.clone()).await;
    if outcome.is_err() {
        if let Some(cb) = &cli_progress {
            cb.clear();
        }
    }
    outcome
}

/// The live bar is shown unless output is quiet, disabled or not an OCR run.
fn show_progress(cli: &Cli) -> bool {
    !cli.quiet && !cli.no_progress && !cli.inspect_only
}

/// The progress bar replaces INFO logs; -v always wins. Without the bar,
/// failed pages are reported by the library's `warn!` lines.
fn log_filter(cli: &Cli) -> &'static str {
    if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress(cli) {
        "error"
    } else {
        "info"
    }
}

async fn run(cli: &Cli, cli_progress: Option<Arc<CliProgressCallback>>) -> Result<()> {
    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = inspect(&cli.input, cli.password.as_deref())
            .await
            .context("Failed to inspect PDF")?;
        println!("File:         {}", cli.input.display());
        println!("Pages:        {}", info.page_count);
        println!("PDF Version:  {}", info.pdf_version);
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb = cli_progress.map(|cb| cb as ProgressCallback);
    let config = build_config(cli, progress_cb)?;
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    // ── Run ──────────────────────────────────────────────────────────────
    let started = Instant::now();
    let document = ocr_pdf_to_file(&cli.input, &output_path, cli.api_key.as_deref(), &config)
        .await
        .context("OCR run failed")?;

    if cli.print_text {
        for page in &document.pages {
            println!("\n===== Page {} =====", page.index);
            println!("{}", page.text);
            println!("====================");
        }
    }

    if !cli.quiet {
        let failed = document.failed_pages();
        eprintln!(
            "{}  {}/{} pages  {}ms  →  {}",
            if failed.is_empty() {
                green("✔")
            } else {
                cyan("⚠")
            },
            document.success_count(),
            document.len(),
            started.elapsed().as_millis(),
            bold(&output_path.display().to_string()),
        );
        if !failed.is_empty() {
            eprintln!("   {} {:?}", red("failed pages:"), failed);
        }
        eprintln!("{}", dim("If the text is not what you expected, try:"));
        eprintln!("{}", dim("  1. a higher resolution, e.g. --dpi 600"));
        eprintln!("{}", dim("  2. another image format, e.g. --format jpeg"));
        eprintln!(
            "{}",
            dim("  3. checking the model's limits and supported languages")
        );
    }

    Ok(())
}

/// Map CLI args to `OcrConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<OcrConfig> {
    let mut builder = OcrConfig::builder()
        .dpi(cli.dpi)
        .format(cli.format.into())
        .model(cli.model.clone())
        .base_url(cli.base_url.clone())
        .concurrency(cli.concurrency)
        .api_timeout_secs(cli.api_timeout)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .include_raw_response(!cli.omit_raw_response);

    if let Some(ref name) = cli.provider {
        builder = builder.provider_name(name.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
