//! Check entry points: run the whole pipeline for one submission.
//!
//! Steps run strictly in sequence, each at most once per call:
//!
//! ```text
//! content ──▶ normalise image? ──▶ assess (1 call) ──▶ verdict
//!                                      │
//!                     text only ──▶ extract links ──▶ scan each (1 call per link)
//! ```
//!
//! Link scanning does not depend on the verdict: every link in submitted text
//! is scanned even when the model found nothing suspicious.

use crate::config::CheckerConfig;
use crate::error::SusCheckError;
use crate::pipeline::assess::{AssessmentInput, ContentAssessor, LlmAssessor};
use crate::pipeline::image::{process_image, ImageSummary};
use crate::pipeline::links::extract_links;
use crate::pipeline::scan::{ScanOutcome, UrlScanner, UrlscanClient};
use crate::verdict::Verdict;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// What the user submitted.
#[derive(Debug, Clone)]
pub enum Content {
    Text(String),
    /// Raw bytes of an uploaded image (PNG or JPEG).
    Image(Vec<u8>),
}

impl Content {
    pub fn kind(&self) -> ContentKind {
        match self {
            Content::Text(_) => ContentKind::Text,
            Content::Image(_) => ContentKind::Image,
        }
    }

    fn ensure_not_empty(&self) -> Result<(), SusCheckError> {
        let empty = match self {
            Content::Text(text) => text.trim().is_empty(),
            Content::Image(bytes) => bytes.is_empty(),
        };
        if empty {
            Err(SusCheckError::EmptyContent)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
}

/// One extracted link and what scanning it produced.
#[derive(Debug, Clone, Serialize)]
pub struct LinkScan {
    pub url: String,
    pub outcome: ScanOutcome,
}

/// Everything one check produced.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub kind: ContentKind,
    pub verdict: Verdict,
    /// The model reply exactly as received.
    pub raw_reply: String,
    /// Present for image content.
    pub image: Option<ImageSummary>,
    /// Present for text content (possibly empty).
    pub links: Option<Vec<LinkScan>>,
    pub duration_ms: u64,
}

/// Result of the local steps only (see [`inspect`]).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Inspection {
    Text { links: Vec<String> },
    Image(ImageSummary),
}

/// Check a submission using the provider and scanner described by `config`.
///
/// # Errors
/// Returns `Err(SusCheckError)` for fatal errors only:
/// - empty content
/// - undecodable image
/// - provider not configured / completion API failure
///
/// Scan failures never fail the check; they are reported per link.
pub async fn check(content: Content, config: &CheckerConfig) -> Result<CheckReport, SusCheckError> {
    content.ensure_not_empty()?;
    let assessor = LlmAssessor::from_config(config)?;
    let scanner = UrlscanClient::from_config(config)?;
    check_with(
        &assessor,
        scanner.as_ref().map(|s| s as &dyn UrlScanner),
        content,
        config,
    )
    .await
}

/// Check a submission with explicit collaborators.
///
/// `scanner = None` lists extracted links without scanning them.
pub async fn check_with(
    assessor: &dyn ContentAssessor,
    scanner: Option<&dyn UrlScanner>,
    content: Content,
    config: &CheckerConfig,
) -> Result<CheckReport, SusCheckError> {
    let start = Instant::now();
    content.ensure_not_empty()?;
    let kind = content.kind();
    info!("Starting {:?} check", kind);

    // ── Step 1: Normalise image / assess ─────────────────────────────────
    let (raw_reply, image, text) = match content {
        Content::Image(bytes) => {
            let encoded = process_image(&bytes, config.max_image_size)?;
            let summary = encoded.summary();
            if let Some(ref cb) = config.progress_callback {
                cb.on_image_normalized(&summary);
            }
            let reply = assess(assessor, AssessmentInput::Image(&encoded), config).await?;
            (reply, Some(summary), None)
        }
        Content::Text(text) => {
            let reply = assess(assessor, AssessmentInput::Text(&text), config).await?;
            (reply, None, Some(text))
        }
    };

    // ── Step 2: Read the reply ───────────────────────────────────────────
    let verdict = Verdict::from_reply(&raw_reply);
    debug!("Verdict: {:?}", verdict.percentage());

    // ── Step 3: Extract and scan links (text only) ───────────────────────
    let links = match text {
        Some(ref text) => Some(scan_links(scanner, &extract_links(text), config).await),
        None => None,
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    info!("Check complete in {}ms", duration_ms);

    Ok(CheckReport {
        kind,
        verdict,
        raw_reply,
        image,
        links,
        duration_ms,
    })
}

/// Synchronous wrapper around [`check`].
///
/// Creates a temporary tokio runtime internally.
pub fn check_sync(content: Content, config: &CheckerConfig) -> Result<CheckReport, SusCheckError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SusCheckError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(check(content, config))
}

/// Run the local steps only: normalise an image or list the links in text.
///
/// Does not require an LLM provider or any API key.
pub fn inspect(content: &Content, config: &CheckerConfig) -> Result<Inspection, SusCheckError> {
    content.ensure_not_empty()?;
    match content {
        Content::Text(text) => Ok(Inspection::Text {
            links: extract_links(text),
        }),
        Content::Image(bytes) => {
            Ok(Inspection::Image(process_image(bytes, config.max_image_size)?.summary()))
        }
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn assess(
    assessor: &dyn ContentAssessor,
    input: AssessmentInput<'_>,
    config: &CheckerConfig,
) -> Result<String, SusCheckError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_assessment_start();
    }
    let reply = assessor.assess(input).await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_assessment_complete(reply.len());
    }
    Ok(reply)
}

/// Scan links one at a time, in order.
async fn scan_links(
    scanner: Option<&dyn UrlScanner>,
    links: &[String],
    config: &CheckerConfig,
) -> Vec<LinkScan> {
    let total = links.len();
    let mut results = Vec::with_capacity(total);

    for (i, url) in links.iter().enumerate() {
        let index = i + 1;
        let outcome = match scanner {
            Some(scanner) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_scan_start(url, index, total);
                }
                let outcome = scanner.scan(url).await;
                if let Some(ref cb) = config.progress_callback {
                    cb.on_scan_complete(url, index, total, outcome.is_submitted());
                }
                outcome
            }
            None => ScanOutcome::NotScanned {
                reason: not_scanned_reason(config).to_string(),
            },
        };
        results.push(LinkScan {
            url: url.clone(),
            outcome,
        });
    }

    results
}

fn not_scanned_reason(config: &CheckerConfig) -> &'static str {
    if !config.scan_links {
        "URL scanning is disabled"
    } else {
        "No urlscan API key configured"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_rejected() {
        let err = Content::Text("  \n\t".into()).ensure_not_empty().unwrap_err();
        assert!(matches!(err, SusCheckError::EmptyContent));
        assert!(Content::Image(Vec::new()).ensure_not_empty().is_err());
        assert!(Content::Text("hi".into()).ensure_not_empty().is_ok());
    }

    #[test]
    fn inspect_text_lists_links() {
        let content = Content::Text("claim at https://x.io/win now".into());
        match inspect(&content, &CheckerConfig::default()).unwrap() {
            Inspection::Text { links } => assert_eq!(links, vec!["https://x.io/win"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn inspect_rejects_garbage_image() {
        let err = inspect(&Content::Image(vec![1, 2, 3]), &CheckerConfig::default()).unwrap_err();
        assert!(matches!(err, SusCheckError::ImageDecode { .. }));
    }

    #[test]
    fn reason_follows_config() {
        let off = CheckerConfig::builder().scan_links(false).build().unwrap();
        assert_eq!(not_scanned_reason(&off), "URL scanning is disabled");
        assert_eq!(
            not_scanned_reason(&CheckerConfig::default()),
            "No urlscan API key configured"
        );
    }
}
