//! URL scanning: submit one link to urlscan.io and keep whatever comes back.
//!
//! This is the only step that recovers from its own failures. A network or
//! HTTP error becomes [`ScanOutcome::Failed`] with a readable message, so one
//! bad link never costs the user the rest of the report. A successful body
//! is kept as raw JSON; [`ScanSubmission::result`] is the one typed accessor
//! the report relies on.

use crate::config::{CheckerConfig, ScanVisibility};
use crate::error::{ScanError, SusCheckError};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// The outcome of scanning a single link.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// The service accepted the submission.
    Submitted(ScanSubmission),
    /// The request failed; the error displays as `Error scanning URL: ...`.
    Failed(ScanError),
    /// Scanning was disabled or no API key was configured.
    NotScanned { reason: String },
}

impl ScanOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, ScanOutcome::Submitted(_))
    }
}

/// Parsed JSON body of an accepted submission. No schema is enforced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScanSubmission {
    pub body: Value,
}

impl ScanSubmission {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// The `result` field (the page where the scan report will appear).
    pub fn result(&self) -> Result<&Value, SusCheckError> {
        self.body
            .get("result")
            .ok_or(SusCheckError::MissingScanField { field: "result" })
    }

    pub fn uuid(&self) -> Option<&str> {
        self.body.get("uuid").and_then(Value::as_str)
    }

    /// URL of the machine-readable result, once the scan finishes.
    pub fn api(&self) -> Option<&str> {
        self.body.get("api").and_then(Value::as_str)
    }
}

/// Capability: "scan this URL".
#[async_trait]
pub trait UrlScanner: Send + Sync {
    async fn scan(&self, url: &str) -> ScanOutcome;
}

#[derive(Serialize)]
struct ScanRequest<'a> {
    url: &'a str,
    visibility: ScanVisibility,
}

/// [`UrlScanner`] for the urlscan.io submission API.
pub struct UrlscanClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    visibility: ScanVisibility,
}

impl UrlscanClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, SusCheckError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| SusCheckError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: crate::config::DEFAULT_URLSCAN_ENDPOINT.to_string(),
            api_key: api_key.into(),
            visibility: ScanVisibility::default(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_visibility(mut self, visibility: ScanVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Build a client from `config`, or `None` when scanning is off or no
    /// API key is configured.
    pub fn from_config(config: &CheckerConfig) -> Result<Option<Self>, SusCheckError> {
        if !config.scan_links {
            return Ok(None);
        }
        let Some(ref key) = config.urlscan_api_key else {
            return Ok(None);
        };
        Ok(Some(
            Self::new(key.clone())?
                .with_endpoint(config.urlscan_endpoint.clone())
                .with_visibility(config.scan_visibility),
        ))
    }

    async fn submit(&self, url: &str) -> Result<Value, ScanError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("API-Key", &self.api_key)
            .json(&ScanRequest {
                url,
                visibility: self.visibility,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScanError::Status {
                status: status.as_u16(),
                detail: describe_failure(status, &body),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl UrlScanner for UrlscanClient {
    async fn scan(&self, url: &str) -> ScanOutcome {
        info!("Submitting {} for {} scanning", url, self.visibility);
        match self.submit(url).await {
            Ok(body) => {
                debug!("Scan accepted for {}", url);
                ScanOutcome::Submitted(ScanSubmission::new(body))
            }
            Err(e) => {
                warn!("Scan of {} failed: {}", url, e);
                ScanOutcome::Failed(e)
            }
        }
    }
}

/// Human-readable reason for a rejected submission.
///
/// urlscan.io explains rejections in a JSON `description` or `message`
/// field; fall back to the status reason phrase.
fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("Unknown status");
    let explained = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        ["description", "message"]
            .iter()
            .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
    });
    match explained {
        Some(text) => format!("{reason}: {text}"),
        None => reason.to_string(),
    }
}
