//! Report rendering: a [`CheckReport`] as Markdown for the terminal.
//!
//! The layout follows the original checker screen section by section:
//! suspicion points and percentage first, then, for text submissions, every
//! extracted link followed by its scan result.

use crate::check::{CheckReport, LinkScan};
use crate::pipeline::scan::ScanOutcome;
use crate::verdict::Verdict;
use serde_json::Value;

pub const NOT_SUSPICIOUS_MESSAGE: &str = "**Our assistant didn't detect it as suspicious**";
pub const UNPARSED_MESSAGE: &str = "Uh.. nothing I guess?";
pub const NO_LINKS_MESSAGE: &str = "No links found.";
pub const SCANNED_HEADING: &str = "## We scanned the links for you with urlscan <3";
pub const MANUAL_CHECK_HINT: &str = "For further analysis, you can manually check the links on \
[VirusTotal](https://www.virustotal.com/) or [URLScan](https://urlscan.io/).";

/// Render the full report.
pub fn render_report(report: &CheckReport) -> String {
    let mut out = String::new();

    if let Some(ref image) = report.image {
        out.push_str(&format!(
            "Uploaded Image: {}x{} {} (longest side {}px)\n\n",
            image.width, image.height, image.source_format, image.max_dimension
        ));
    }

    out.push_str(&render_verdict(&report.verdict));

    if let Some(ref links) = report.links {
        out.push('\n');
        out.push_str(&render_links(links));
    }

    out
}

/// Points and percentage, or the fallback message.
pub fn render_verdict(verdict: &Verdict) -> String {
    match verdict {
        Verdict::Suspicious {
            points, percentage, ..
        } => {
            let mut out = String::from("## Detected Points of Suspicion:\n");
            for point in points {
                out.push_str(&format!("- {point}\n"));
            }
            out.push_str(&render_percentage(*percentage));
            out
        }
        Verdict::NotSuspicious { .. } => {
            format!("{NOT_SUSPICIOUS_MESSAGE}\n{}", render_percentage(0))
        }
        Verdict::Unparsed => format!("{UNPARSED_MESSAGE}\n"),
    }
}

fn render_percentage(percentage: u8) -> String {
    format!("## Sus percentage:\nSuspicion Level: {percentage}%\n")
}

/// The "Extracted Links" section.
pub fn render_links(links: &[LinkScan]) -> String {
    let mut out = String::from("## Extracted Links:\n");
    if links.is_empty() {
        out.push_str(&format!("{NO_LINKS_MESSAGE}\n"));
        return out;
    }
    for link in links {
        out.push_str(&format!(
            "{}\n{SCANNED_HEADING}\n{}\n",
            link.url,
            render_outcome(&link.outcome)
        ));
    }
    out.push_str(&format!("\n{MANUAL_CHECK_HINT}\n"));
    out
}

/// One scan result line. A submission without a `result` field shows the
/// typed error instead of failing the whole report.
pub fn render_outcome(outcome: &ScanOutcome) -> String {
    match outcome {
        ScanOutcome::Submitted(submission) => match submission.result() {
            Ok(Value::String(url)) => url.clone(),
            Ok(other) => other.to_string(),
            Err(e) => e.to_string(),
        },
        ScanOutcome::Failed(e) => e.to_string(),
        ScanOutcome::NotScanned { reason } => format!("Not scanned: {reason}"),
    }
}
