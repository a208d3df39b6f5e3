//! Progress-callback trait for per-step check events.
//!
//! Inject an [`Arc<dyn CheckProgressCallback>`] via
//! [`crate::config::CheckerConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves from image normalisation to the model call
//! and then through each link scan.
//!
//! # Example
//!
//! ```rust
//! use suscheck::{CheckProgressCallback, CheckerConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     scanned: AtomicUsize,
//! }
//!
//! impl CheckProgressCallback for CountingCallback {
//!     fn on_scan_complete(&self, url: &str, _index: usize, total: usize, ok: bool) {
//!         let done = self.scanned.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}/{total} {url} ok={ok}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { scanned: AtomicUsize::new(0) });
//!
//! let config = CheckerConfig::builder()
//!     .progress_callback(counter as Arc<dyn CheckProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::image::ImageSummary;
use std::sync::Arc;

/// Called by the check pipeline as it runs each step.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Steps run strictly one after another.
pub trait CheckProgressCallback: Send + Sync {
    /// Called once an uploaded image has been normalised.
    fn on_image_normalized(&self, summary: &ImageSummary) {
        let _ = summary;
    }

    /// Called just before the completion request is sent.
    fn on_assessment_start(&self) {}

    /// Called when the model reply arrives.
    ///
    /// # Arguments
    /// * `reply_len` — byte length of the raw reply text
    fn on_assessment_complete(&self, reply_len: usize) {
        let _ = reply_len;
    }

    /// Called before a link is submitted for scanning.
    ///
    /// # Arguments
    /// * `url`   — the extracted link
    /// * `index` — 1-indexed position among the extracted links
    /// * `total` — number of extracted links
    fn on_scan_start(&self, url: &str, index: usize, total: usize) {
        let _ = (url, index, total);
    }

    /// Called after a link scan finished, whether or not it succeeded.
    fn on_scan_complete(&self, url: &str, index: usize, total: usize, ok: bool) {
        let _ = (url, index, total, ok);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl CheckProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::CheckerConfig`].
pub type ProgressCallback = Arc<dyn CheckProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        assessments: AtomicUsize,
        scans_ok: AtomicUsize,
        scans_failed: AtomicUsize,
    }

    impl CheckProgressCallback for TrackingCallback {
        fn on_assessment_complete(&self, _reply_len: usize) {
            self.assessments.fetch_add(1, Ordering::SeqCst);
        }

        fn on_scan_complete(&self, _url: &str, _index: usize, _total: usize, ok: bool) {
            if ok {
                self.scans_ok.fetch_add(1, Ordering::SeqCst);
            } else {
                self.scans_failed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_assessment_start();
        cb.on_assessment_complete(42);
        cb.on_scan_start("https://a.co", 1, 1);
        cb.on_scan_complete("https://a.co", 1, 1, false);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_assessment_start();
        tracker.on_assessment_complete(10);
        tracker.on_scan_complete("http://a.co", 1, 2, true);
        tracker.on_scan_complete("http://b.co", 2, 2, false);

        assert_eq!(tracker.assessments.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.scans_ok.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.scans_failed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn CheckProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_assessment_start();
        cb.on_scan_start("https://b.org/x?y=1", 1, 3);
    }
}
