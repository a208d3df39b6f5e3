//! CLI binary for suscheck.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `CheckerConfig` and prints the report.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use suscheck::render::render_report;
use suscheck::{
    check, inspect, CheckProgressCallback, CheckerConfig, Content, ImageSummary, Inspection,
    ProgressCallback, ScanVisibility,
};
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that narrates each pipeline step.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl CheckProgressCallback for CliProgressCallback {
    fn on_image_normalized(&self, summary: &ImageSummary) {
        self.bar.println(format!(
            "  {} Image {}x{} → {}x{}{}",
            green("✓"),
            summary.width,
            summary.height,
            summary.encoded_width,
            summary.encoded_height,
            if summary.passthrough {
                dim("  (unchanged)")
            } else {
                String::new()
            },
        ));
    }

    fn on_assessment_start(&self) {
        self.bar.set_prefix("Assessing");
        self.bar.set_message("waiting for the model…");
    }

    fn on_assessment_complete(&self, reply_len: usize) {
        self.bar.println(format!(
            "  {} Assessment received  {}",
            green("✓"),
            dim(&format!("{reply_len} chars"))
        ));
    }

    fn on_scan_start(&self, url: &str, index: usize, total: usize) {
        self.bar.set_prefix("Scanning");
        self.bar.set_message(format!("{index}/{total} {url}"));
    }

    fn on_scan_complete(&self, url: &str, index: usize, total: usize, ok: bool) {
        let mark = if ok { green("✓") } else { red("✗") };
        self.bar
            .println(format!("  {mark} Link {index:>2}/{total:<2}  {}", dim(url)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Check a message
  suscheck "Congratulations! You won an iPhone, claim at https://win.example/claim"

  # Read the message from stdin
  pbpaste | suscheck -

  # Check a screenshot
  suscheck --image screenshot.png

  # See what would be sent, without calling any API
  suscheck --inspect-only --image screenshot.jpg

  # Machine-readable report
  suscheck --json --text-file email.txt > report.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (completion API)
  URLSCAN_API_KEY         urlscan.io API key (link scanning)
  SUSCHECK_PROVIDER       Override provider (openai, anthropic, gemini, ...)
  SUSCHECK_MODEL          Override model ID

Links are listed but not scanned when no urlscan API key is available.
"#;

/// Check text and screenshots for scam and phishing signs.
#[derive(Parser, Debug)]
#[command(
    name = "suscheck",
    version,
    about = "Check text and screenshots for scam and phishing signs",
    long_about = "Ask a language model whether a message or screenshot looks like a scam, \
phishing attempt or ponzi scheme, then submit every link in the message to urlscan.io.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Text to check. Use "-" to read it from stdin.
    #[arg(conflicts_with_all = ["text_file", "image"])]
    text: Option<String>,

    /// Read the text to check from this file.
    #[arg(long, conflicts_with = "image")]
    text_file: Option<PathBuf>,

    /// Image to check (PNG or JPEG).
    #[arg(long)]
    image: Option<PathBuf>,

    /// LLM model ID.
    #[arg(long, env = "SUSCHECK_MODEL", default_value = "gpt-4o")]
    model: String,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "SUSCHECK_PROVIDER")]
    provider: Option<String>,

    /// Max tokens for the model reply.
    #[arg(long, env = "SUSCHECK_MAX_TOKENS", default_value_t = 300)]
    max_tokens: usize,

    /// Longest side of the image sent to the model, in pixels.
    #[arg(long, env = "SUSCHECK_MAX_IMAGE_SIZE", default_value_t = 1024,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_image_size: u32,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "SUSCHECK_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// urlscan.io API key.
    #[arg(long, env = "URLSCAN_API_KEY", hide_env_values = true)]
    urlscan_key: Option<String>,

    /// urlscan submission endpoint.
    #[arg(long, env = "SUSCHECK_URLSCAN_ENDPOINT",
          default_value = suscheck::config::DEFAULT_URLSCAN_ENDPOINT)]
    urlscan_endpoint: String,

    /// Visibility of submitted scans.
    #[arg(long, value_enum, default_value = "public")]
    visibility: VisibilityArg,

    /// List extracted links without scanning them.
    #[arg(long)]
    no_scan: bool,

    /// Output the structured report as JSON instead of Markdown.
    #[arg(long)]
    json: bool,

    /// Run the local steps only (normalise image / extract links).
    #[arg(long)]
    inspect_only: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "SUSCHECK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except the report and errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum VisibilityArg {
    Public,
    Unlisted,
    Private,
}

impl From<VisibilityArg> for ScanVisibility {
    fn from(v: VisibilityArg) -> Self {
        match v {
            VisibilityArg::Public => ScanVisibility::Public,
            VisibilityArg::Unlisted => ScanVisibility::Unlisted,
            VisibilityArg::Private => ScanVisibility::Private,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
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

    let content = read_content(&cli).await?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = CheckerConfig::builder()
            .max_image_size(cli.max_image_size)
            .build()
            .context("Invalid configuration")?;
        let inspection = inspect(&content, &config).context("Failed to inspect content")?;
        print_inspection(&inspection, cli.json)?;
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress.clone().map(|cb| cb as ProgressCallback),
    )
    .await?;

    // ── Run check ────────────────────────────────────────────────────────
    let result = check(content, &config).await;
    if let Some(ref cb) = progress {
        cb.finish();
    }
    let report = result.context("Check failed")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    } else {
        handle
            .write_all(render_report(&report).as_bytes())
            .context("Failed to write to stdout")?;
    }

    if !cli.quiet && !cli.json {
        eprintln!("{}", dim(&format!("checked in {}ms", report.duration_ms)));
    }

    Ok(())
}

/// Load the submission from the positional text, stdin, a text file or an image.
async fn read_content(cli: &Cli) -> Result<Content> {
    if let Some(ref path) = cli.image {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image {:?}", path))?;
        return Ok(Content::Image(bytes));
    }

    if let Some(ref path) = cli.text_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read text from {:?}", path))?;
        return Ok(Content::Text(text));
    }

    match cli.text.as_deref() {
        Some("-") => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read text from stdin")?;
            Ok(Content::Text(text))
        }
        Some(text) => Ok(Content::Text(text.to_string())),
        None => anyhow::bail!("Nothing to check: pass TEXT, --text-file or --image"),
    }
}

/// Map CLI args to `CheckerConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<CheckerConfig> {
    let mut builder = CheckerConfig::builder()
        .model(cli.model.clone())
        .max_tokens(cli.max_tokens)
        .max_image_size(cli.max_image_size)
        .urlscan_endpoint(cli.urlscan_endpoint.clone())
        .scan_visibility(cli.visibility.clone().into())
        .scan_links(!cli.no_scan);

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref key) = cli.urlscan_key {
        builder = builder.urlscan_api_key(key.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_inspection(inspection: &Inspection, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(inspection).context("Failed to serialise inspection")?
        );
        return Ok(());
    }

    match inspection {
        Inspection::Text { links } if links.is_empty() => println!("No links found."),
        Inspection::Text { links } => {
            for link in links {
                println!("{link}");
            }
        }
        Inspection::Image(summary) => {
            println!("Format:       {}", summary.source_format);
            println!("Size:         {}x{}", summary.width, summary.height);
            println!("Longest side: {}px", summary.max_dimension);
            println!(
                "Sent as:      {}x{} PNG ({} bytes base64)",
                summary.encoded_width, summary.encoded_height, summary.encoded_len
            );
            println!("Unchanged:    {}", summary.passthrough);
        }
    }
    Ok(())
}
