//! Configuration types for a content check.
//!
//! All behaviour is controlled through [`CheckerConfig`], built once at
//! startup via its [`CheckerConfigBuilder`] and passed by reference to every
//! step that needs it. Nothing reads ambient secret state after that point.

use crate::error::SusCheckError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default scan endpoint.
pub const DEFAULT_URLSCAN_ENDPOINT: &str = "https://urlscan.io/api/v1/scan/";

/// Configuration for a content check.
///
/// Built via [`CheckerConfig::builder()`] or using
/// [`CheckerConfig::default()`].
///
/// # Example
/// ```rust
/// use suscheck::CheckerConfig;
///
/// let config = CheckerConfig::builder()
///     .model("gpt-4o")
///     .max_image_size(1024)
///     .urlscan_api_key("my-key")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct CheckerConfig {
    /// Bound on the longer side of a transmitted image, in pixels. Default: 1024.
    pub max_image_size: u32,

    /// LLM model identifier. Default: "gpt-4o".
    pub model: String,

    /// LLM provider name (e.g. "openai", "anthropic").
    /// If None, "openai" is used.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Maximum tokens the model may generate for its reply. Default: 300.
    pub max_tokens: usize,

    /// Custom system instruction. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// API key sent in the `API-Key` header of scan requests.
    /// If None, extracted links are listed but not scanned.
    pub urlscan_api_key: Option<String>,

    /// Scan submission endpoint. Default: [`DEFAULT_URLSCAN_ENDPOINT`].
    pub urlscan_endpoint: String,

    /// Visibility requested for submitted scans. Default: public.
    pub scan_visibility: ScanVisibility,

    /// Submit extracted links to the scan service. Default: true.
    pub scan_links: bool,

    /// Step events for progress display.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            max_image_size: 1024,
            model: "gpt-4o".to_string(),
            provider_name: None,
            provider: None,
            max_tokens: 300,
            system_prompt: None,
            urlscan_api_key: None,
            urlscan_endpoint: DEFAULT_URLSCAN_ENDPOINT.to_string(),
            scan_visibility: ScanVisibility::default(),
            scan_links: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for CheckerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckerConfig")
            .field("max_image_size", &self.max_image_size)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("urlscan_api_key", &self.urlscan_api_key.as_ref().map(|_| "<redacted>"))
            .field("urlscan_endpoint", &self.urlscan_endpoint)
            .field("scan_visibility", &self.scan_visibility)
            .field("scan_links", &self.scan_links)
            .finish()
    }
}

impl CheckerConfig {
    /// Create a new builder for `CheckerConfig`.
    pub fn builder() -> CheckerConfigBuilder {
        CheckerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Provider name used when no pre-built provider is set.
    pub fn provider_name_or_default(&self) -> &str {
        self.provider_name.as_deref().unwrap_or("openai")
    }
}

/// Builder for [`CheckerConfig`].
pub struct CheckerConfigBuilder {
    config: CheckerConfig,
}

impl fmt::Debug for CheckerConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckerConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl CheckerConfigBuilder {
    pub fn max_image_size(mut self, px: u32) -> Self {
        self.config.max_image_size = px;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn urlscan_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.urlscan_api_key = Some(key.into());
        self
    }

    pub fn urlscan_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.urlscan_endpoint = endpoint.into();
        self
    }

    pub fn scan_visibility(mut self, visibility: ScanVisibility) -> Self {
        self.config.scan_visibility = visibility;
        self
    }

    pub fn scan_links(mut self, v: bool) -> Self {
        self.config.scan_links = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CheckerConfig, SusCheckError> {
        let c = &self.config;
        if c.max_image_size == 0 {
            return Err(SusCheckError::InvalidConfig(
                "max_image_size must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(SusCheckError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if !(c.urlscan_endpoint.starts_with("http://") || c.urlscan_endpoint.starts_with("https://"))
        {
            return Err(SusCheckError::InvalidConfig(format!(
                "urlscan endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.urlscan_endpoint
            )));
        }
        if c.urlscan_api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err(SusCheckError::InvalidConfig(
                "urlscan API key is set but empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Visibility of a submitted scan on the scan service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanVisibility {
    /// Listed on the public feed (default).
    #[default]
    Public,
    /// Shared with vetted researchers only.
    Unlisted,
    /// Visible to the submitting account only.
    Private,
}

impl ScanVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanVisibility::Public => "public",
            ScanVisibility::Unlisted => "unlisted",
            ScanVisibility::Private => "private",
        }
    }
}

impl fmt::Display for ScanVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
