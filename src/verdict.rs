//! Turning the model's free-form reply into a verdict.
//!
//! The reply is untrusted text. The model is asked for a bare JSON object
//! `{"points": [...], "rating": N}` but nothing enforces it, so parsing is a
//! sequence of attempts that each may fail quietly:
//!
//! 1. Strip one outer Markdown code fence (models add them despite the prompt)
//! 2. Strict JSON
//! 3. JSON5, which also accepts single-quoted keys and strings
//! 4. The fixed "not suspicious" phrase anywhere in the text
//!
//! If none succeeds the verdict is [`Verdict::Unparsed`].
//!
//! The displayed percentage is always derived locally from the number of
//! points. The model's own `rating` is kept as [`Verdict`] data but plays no
//! part in it.

use crate::prompts::NOT_SUSPICIOUS_PHRASE;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Outcome of reading one assessment reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// The reply listed at least one point of suspicion.
    Suspicious {
        points: Vec<String>,
        /// `min(points × 20, 100)`.
        percentage: u8,
        /// The `rating` the model proposed, if any. Not displayed.
        model_rating: Option<u8>,
    },
    /// Parsed, but with no points (or the fixed not-suspicious phrase).
    NotSuspicious { model_rating: Option<u8> },
    /// Not parseable as a reply object at all.
    Unparsed,
}

impl Verdict {
    /// Read a raw reply. Never fails.
    pub fn from_reply(reply: &str) -> Self {
        match parse_reply(reply) {
            Some(value) => interpret(&value),
            None if mentions_not_suspicious(reply) => {
                debug!("Reply is the not-suspicious phrase");
                Verdict::NotSuspicious { model_rating: None }
            }
            None => {
                warn!("Assessment reply is not JSON ({} chars)", reply.len());
                Verdict::Unparsed
            }
        }
    }

    /// Percentage to display; `None` when the reply could not be read.
    pub fn percentage(&self) -> Option<u8> {
        match self {
            Verdict::Suspicious { percentage, .. } => Some(*percentage),
            Verdict::NotSuspicious { .. } => Some(0),
            Verdict::Unparsed => None,
        }
    }

    pub fn points(&self) -> &[String] {
        match self {
            Verdict::Suspicious { points, .. } => points,
            _ => &[],
        }
    }

    pub fn is_suspicious(&self) -> bool {
        matches!(self, Verdict::Suspicious { .. })
    }
}

/// `min(count × 20, 100)`.
pub fn suspicion_percentage(count: usize) -> u8 {
    count.saturating_mul(20).min(100) as u8
}

static RE_OUTER_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9]*[ \t]*\n(.*?)\n?```$").expect("valid fence regex")
});

fn strip_code_fence(reply: &str) -> &str {
    match RE_OUTER_FENCE.captures(reply) {
        Some(caps) => caps.get(1).map_or(reply, |m| m.as_str()),
        None => reply,
    }
}

fn parse_reply(reply: &str) -> Option<Value> {
    let body = strip_code_fence(reply.trim()).trim();
    if body.is_empty() {
        return None;
    }
    serde_json::from_str::<Value>(body)
        .ok()
        .or_else(|| json5::from_str::<Value>(body).ok())
}

fn mentions_not_suspicious(reply: &str) -> bool {
    reply
        .to_lowercase()
        .contains(&NOT_SUSPICIOUS_PHRASE.to_lowercase())
}

fn interpret(value: &Value) -> Verdict {
    let model_rating = value.get("rating").and_then(rating_of);
    let points = value.get("points").map(points_of).unwrap_or_default();
    if points.is_empty() {
        Verdict::NotSuspicious { model_rating }
    } else {
        Verdict::Suspicious {
            percentage: suspicion_percentage(points.len()),
            points,
            model_rating,
        }
    }
}

/// Points as display strings, one per array item so the percentage follows
/// the item count. Strings are kept verbatim and other values are shown as
/// their JSON text. A lone non-empty string counts as one point.
fn points_of(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn rating_of(value: &Value) -> Option<u8> {
    let n = value
        .as_u64()
        .map(|n| n as f64)
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0))?;
    (0.0..=100.0).contains(&n).then_some(n as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_points_is_sixty_percent() {
        let v = Verdict::from_reply(r#"{"points": ["p1","p2","p3"], "rating": 70}"#);
        assert_eq!(v.percentage(), Some(60));
        assert_eq!(v.points(), ["p1", "p2", "p3"]);
        assert!(matches!(v, Verdict::Suspicious { model_rating: Some(70), .. }));
    }

    #[test]
    fn percentage_caps_at_hundred() {
        assert_eq!(suspicion_percentage(0), 0);
        assert_eq!(suspicion_percentage(5), 100);
        assert_eq!(suspicion_percentage(9), 100);
        assert_eq!(suspicion_percentage(usize::MAX), 100);
    }

    #[test]
    fn rating_does_not_drive_percentage() {
        let v = Verdict::from_reply(r#"{"points": ["only one"], "rating": 99}"#);
        assert_eq!(v.percentage(), Some(20));
    }

    #[test]
    fn empty_points_is_not_suspicious() {
        let v = Verdict::from_reply(r#"{"points": [], "rating": 0}"#);
        assert_eq!(v, Verdict::NotSuspicious { model_rating: Some(0) });
        assert_eq!(v.percentage(), Some(0));
    }

    #[test]
    fn fixed_phrase_is_not_suspicious() {
        let v = Verdict::from_reply("This doesnt seems suspicious");
        assert_eq!(v, Verdict::NotSuspicious { model_rating: None });
        assert_eq!(v.percentage(), Some(0));

        let v = Verdict::from_reply("Well... this doesnt seems suspicious.");
        assert_eq!(v.percentage(), Some(0));
    }

    #[test]
    fn prose_is_unparsed() {
        let v = Verdict::from_reply("I think this message is probably fine, but be careful.");
        assert_eq!(v, Verdict::Unparsed);
        assert_eq!(v.percentage(), None);
        assert!(v.points().is_empty());
    }

    #[test]
    fn empty_reply_is_unparsed() {
        assert_eq!(Verdict::from_reply("   "), Verdict::Unparsed);
    }

    #[test]
    fn single_quoted_reply_is_accepted() {
        let v = Verdict::from_reply("{'points': ['urgent tone', 'unknown sender'], 'rating': 40}");
        assert_eq!(v.percentage(), Some(40));
        assert_eq!(v.points(), ["urgent tone", "unknown sender"]);
    }

    #[test]
    fn fenced_reply_is_accepted() {
        let reply = "```json\n{\"points\": [\"a\", \"b\"], \"rating\": 50}\n```";
        assert_eq!(Verdict::from_reply(reply).percentage(), Some(40));

        let reply = "```\n{\"points\": [\"a\"]}\n```";
        assert_eq!(Verdict::from_reply(reply).percentage(), Some(20));
    }

    #[test]
    fn non_object_json_is_not_suspicious() {
        assert_eq!(
            Verdict::from_reply("[1, 2, 3]"),
            Verdict::NotSuspicious { model_rating: None }
        );
        assert_eq!(
            Verdict::from_reply("\"just a string\""),
            Verdict::NotSuspicious { model_rating: None }
        );
    }

    #[test]
    fn missing_points_is_not_suspicious() {
        let v = Verdict::from_reply(r#"{"rating": 80}"#);
        assert_eq!(v, Verdict::NotSuspicious { model_rating: Some(80) });
    }

    #[test]
    fn lone_string_point_counts_once() {
        let v = Verdict::from_reply(r#"{"points": "asks for a gift card", "rating": 30}"#);
        assert_eq!(v.points(), ["asks for a gift card"]);
        assert_eq!(v.percentage(), Some(20));
    }

    #[test]
    fn every_array_item_counts() {
        let v = Verdict::from_reply(r#"{"points": [null, "a", "b"]}"#);
        assert_eq!(v.points(), ["null", "a", "b"]);
        assert_eq!(v.percentage(), Some(60));

        let v = Verdict::from_reply(r#"{"points": ["", "a"]}"#);
        assert_eq!(v.points(), ["", "a"]);
        assert_eq!(v.percentage(), Some(40));
    }

    #[test]
    fn non_string_points_use_json_text() {
        let v = Verdict::from_reply(r#"{"points": [42, {"why": "odd"}, " padded "]}"#);
        assert_eq!(v.points(), ["42", r#"{"why":"odd"}"#, " padded "]);
        assert_eq!(v.percentage(), Some(60));
    }

    #[test]
    fn out_of_range_rating_is_dropped() {
        let v = Verdict::from_reply(r#"{"points": ["x"], "rating": 250}"#);
        assert!(matches!(v, Verdict::Suspicious { model_rating: None, .. }));
        let v = Verdict::from_reply(r#"{"points": ["x"], "rating": 12.5}"#);
        assert!(matches!(v, Verdict::Suspicious { model_rating: None, .. }));
        let v = Verdict::from_reply(r#"{"points": ["x"], "rating": 85.0}"#);
        assert!(matches!(v, Verdict::Suspicious { model_rating: Some(85), .. }));
    }

    #[test]
    fn serialises_with_kind_tag() {
        let v = serde_json::to_value(Verdict::from_reply(r#"{"points": ["a"]}"#)).unwrap();
        assert_eq!(v["kind"], "suspicious");
        assert_eq!(v["percentage"], 20);
    }
}
