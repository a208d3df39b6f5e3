//! Fixed prompt text for the suspicion assessment.
//!
//! Every piece of the conversation that is not user content lives here so a
//! prompt change touches exactly one file, and tests can inspect the text
//! without a provider.
//!
//! Callers can override the system instruction via
//! [`crate::config::CheckerConfig::system_prompt`]; the worked example is
//! always sent.

/// Phrase the model is told to answer with when nothing looks suspicious.
pub const NOT_SUSPICIOUS_PHRASE: &str = "This doesnt seems suspicious";

/// Default system instruction for the assessment.
///
/// Used when `CheckerConfig::system_prompt` is `None`.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a very strict assistant. You help the user decide \
whether the content or image they are showing is malicious, phishing, a scam, a ponzi scheme or \
anything similar. Most of the time it is too good to be true; if it seems even a little bit too \
good to be true, give out points. Reply in JSON format with the points that make it suspicious \
and a rating of suspicion from 0 to 100, for example {\"points\": [\"...\"], \"rating\": 70}. \
Never, never reply in markdown format. If the content is not suspicious, reply with: \
This doesnt seems suspicious";

/// Worked assistant turn showing the expected reply shape.
pub const EXAMPLE_REPLY: &str = r#"{"points": ["point1", "point2", "point3"], "rating": 70}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_reply_is_strict_json() {
        let v: serde_json::Value = serde_json::from_str(EXAMPLE_REPLY).expect("valid JSON");
        assert_eq!(v["points"].as_array().map(|a| a.len()), Some(3));
        assert_eq!(v["rating"], 70);
    }

    #[test]
    fn system_prompt_names_the_fallback_phrase() {
        assert!(DEFAULT_SYSTEM_PROMPT.ends_with(NOT_SUSPICIOUS_PHRASE));
        assert!(DEFAULT_SYSTEM_PROMPT.contains("JSON"));
        assert!(DEFAULT_SYSTEM_PROMPT.contains("markdown"));
    }
}
