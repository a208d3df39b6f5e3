//! Error types for the suscheck library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SusCheckError`] (**fatal**): the check cannot produce a verdict at all
//!   (undecodable image, provider not configured, completion API failure).
//!   Returned as `Err(SusCheckError)` from the top-level `check*` functions.
//!
//! * [`ScanError`] (**non-fatal**): scanning one extracted link failed but the
//!   verdict and every other link are fine. Stored inside
//!   [`crate::pipeline::scan::ScanOutcome::Failed`] and shown inline.

use thiserror::Error;

/// All fatal errors returned by the suscheck library.
///
/// Per-link scan failures use [`ScanError`] and are stored in the report
/// rather than propagated here.
#[derive(Debug, Error)]
pub enum SusCheckError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Text was empty (or whitespace only), or the image had no bytes.
    #[error("Nothing to check: the submitted content is empty")]
    EmptyContent,

    /// The uploaded bytes are not an image this build can decode.
    #[error("Could not decode image: {detail}\nSupported formats: PNG, JPEG.")]
    ImageDecode { detail: String },

    /// Re-encoding the normalised image as PNG failed.
    #[error("Could not encode image as PNG: {detail}")]
    ImageEncode { detail: String },

    // ── Completion API errors ─────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The completion API call failed (network, auth, rate limit, ...).
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    // ── Scan API errors ───────────────────────────────────────────────────
    /// The scan service answered, but without a field the report needs.
    #[error("Scan response has no '{field}' field")]
    MissingScanField { field: &'static str },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SusCheckError {
    pub(crate) fn decode(err: impl std::fmt::Display) -> Self {
        Self::ImageDecode {
            detail: err.to_string(),
        }
    }

    pub(crate) fn encode(err: impl std::fmt::Display) -> Self {
        Self::ImageEncode {
            detail: err.to_string(),
        }
    }
}

/// A non-fatal error for a single URL scan.
///
/// The rendered message always starts with `Error scanning URL:` so it can be
/// printed in place of the scan result.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ScanError {
    /// The request never produced a response (DNS, TLS, connection reset).
    #[error("Error scanning URL: {detail}")]
    Request { detail: String },

    /// The service replied with a non-success status.
    #[error("Error scanning URL: HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ScanError::Status {
                status: status.as_u16(),
                detail: err.to_string(),
            },
            None => ScanError::Request {
                detail: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_error_display_has_prefix() {
        let e = ScanError::Status {
            status: 500,
            detail: "Internal Server Error".into(),
        };
        let msg = e.to_string();
        assert!(msg.starts_with("Error scanning URL"), "got: {msg}");
        assert!(msg.contains("500"));

        let e = ScanError::Request {
            detail: "connection refused".into(),
        };
        assert!(e.to_string().starts_with("Error scanning URL"));
    }

    #[test]
    fn provider_not_configured_display() {
        let e = SusCheckError::ProviderNotConfigured {
            provider: "openai".into(),
            hint: "Set OPENAI_API_KEY".into(),
        };
        assert!(e.to_string().contains("openai"));
        assert!(e.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn missing_field_display() {
        let e = SusCheckError::MissingScanField { field: "result" };
        assert!(e.to_string().contains("'result'"));
    }

    #[test]
    fn decode_helper_keeps_detail() {
        let e = SusCheckError::decode("bad magic");
        assert!(matches!(e, SusCheckError::ImageDecode { ref detail } if detail == "bad magic"));
    }
}
