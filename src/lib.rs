//! # suscheck
//!
//! Check a message or a screenshot for signs of scams, phishing and "too
//! good to be true" offers using a language model, then submit every link
//! in the message to urlscan.io.
//!
//! The judgement itself is delegated to the model. This crate prepares the
//! input (bounded PNG for images), asks one fixed question, reads the reply
//! defensively, and derives its own suspicion percentage from the number of
//! points the model lists.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text / image
//!  │
//!  ├─ 1. Image    decode → colour fix-up → shrink to 1024px → base64 PNG
//!  ├─ 2. Assess   one chat completion (system + example + user turn)
//!  ├─ 3. Verdict  JSON (or JSON5) reply → points → min(points × 20, 100)%
//!  ├─ 4. Links    `https?://\S+` over submitted text
//!  └─ 5. Scan     one urlscan.io submission per link, in order
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use suscheck::{check, CheckerConfig, Content};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // OPENAI_API_KEY is read when the provider is resolved.
//!     let config = CheckerConfig::builder()
//!         .urlscan_api_key(std::env::var("URLSCAN_API_KEY")?)
//!         .build()?;
//!     let report = check(Content::Text("You won! Claim at https://x.io".into()), &config).await?;
//!     println!("{}", suscheck::render::render_report(&report));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `suscheck` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod check;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod render;
pub mod verdict;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use check::{check, check_sync, check_with, inspect, CheckReport, Content, ContentKind, Inspection, LinkScan};
pub use config::{CheckerConfig, CheckerConfigBuilder, ScanVisibility};
pub use error::{ScanError, SusCheckError};
pub use pipeline::assess::{ContentAssessor, LlmAssessor};
pub use pipeline::image::{process_image, EncodedImage, ImageSummary, RawImage};
pub use pipeline::links::extract_links;
pub use pipeline::scan::{ScanOutcome, ScanSubmission, UrlScanner, UrlscanClient};
pub use progress::{CheckProgressCallback, NoopProgressCallback, ProgressCallback};
pub use verdict::{suspicion_percentage, Verdict};
