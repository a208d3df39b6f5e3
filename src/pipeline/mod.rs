//! Pipeline stages for a content check.
//!
//! Each submodule implements exactly one step and can be tested on its own.
//! The two network-facing steps sit behind narrow traits
//! ([`assess::ContentAssessor`], [`scan::UrlScanner`]) so callers and tests
//! can swap in their own implementations.
//!
//! ## Data Flow
//!
//! ```text
//! image ──▶ assess ──▶ (verdict)
//! links ──▶ scan
//! ```
//!
//! 1. [`image`]: decode, fix colour mode, bound the size, base64 PNG
//! 2. [`assess`]: three-turn conversation to a chat completion provider
//! 3. [`links`]: regex scan for `http(s)://` runs in submitted text
//! 4. [`scan`]: submit each link to urlscan.io; failures become messages

pub mod assess;
pub mod image;
pub mod links;
pub mod scan;
