//! Link extraction: find every `http://` / `https://` run in free text.
//!
//! No URL validation happens here. A link is the scheme plus everything up
//! to the next whitespace, so trailing punctuation stays attached. Order is
//! order of appearance and duplicates are kept; the scan step submits
//! whatever this returns.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("valid link regex"));

/// Return every URL-like substring of `text`, in order of appearance.
pub fn extract_links(text: &str) -> Vec<String> {
    RE_LINK
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
