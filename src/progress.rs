//! Progress reporting and cancellation for the document tools.
//!
//! Inject an [`Arc<dyn ToolProgressCallback>`] via
//! [`crate::config::ToolsConfigBuilder::progress_callback`] to receive events
//! while a tool walks its files and pages.
//!
//! # Why callbacks instead of channels?
//!
//! A callback is the least-invasive integration point: callers can forward
//! events to a channel, a terminal progress bar or a UI without the library
//! knowing how the host communicates. Percentages are pushed through
//! [`ProgressTracker`], which guarantees they never move backwards.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doctools::{ToolProgressCallback, ToolsConfig};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct LastPercent(AtomicU32);
//!
//! impl ToolProgressCallback for LastPercent {
//!     fn on_progress(&self, percent: f32) {
//!         self.0.store(percent as u32, Ordering::SeqCst);
//!     }
//! }
//!
//! let cb = Arc::new(LastPercent(AtomicU32::new(0)));
//! let config = ToolsConfig::builder()
//!     .progress_callback(cb as Arc<dyn ToolProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::DocToolsError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Receives tool progress events.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ToolProgressCallback: Send + Sync {
    /// Called once before the first file is touched.
    ///
    /// # Arguments
    /// * `tool`        — short tool name (`"compress"`, `"merge"`, …)
    /// * `total_files` — number of files in the batch
    fn on_operation_start(&self, tool: &str, total_files: usize) {
        let _ = (tool, total_files);
    }

    /// Called before a file is loaded.
    ///
    /// # Arguments
    /// * `index` — 1-indexed file position within the batch
    /// * `name`  — the file's display name
    fn on_file_start(&self, index: usize, name: &str) {
        let _ = (index, name);
    }

    /// Overall completion in percent, `0.0..=100.0`, never decreasing.
    fn on_progress(&self, percent: f32) {
        let _ = percent;
    }

    /// Called after a file's work has finished.
    fn on_file_complete(&self, index: usize, name: &str) {
        let _ = (index, name);
    }

    /// Called once when the operation ends, successfully or not.
    ///
    /// # Arguments
    /// * `outputs` — number of output files produced (0 on failure)
    fn on_operation_complete(&self, outputs: usize) {
        let _ = outputs;
    }
}

/// A no-op implementation, used when no callback is configured.
pub struct NoopProgressCallback;

impl ToolProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ToolsConfig`].
pub type ProgressCallback = Arc<dyn ToolProgressCallback>;

// ── Cancellation ─────────────────────────────────────────────────────────

/// Cooperative cancellation flag shared between a caller and a running tool.
///
/// Tools poll it before each file and each page; work already in flight is
/// allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once [`CancelToken::cancel`] has been called.
    pub fn check(&self) -> Result<(), DocToolsError> {
        if self.is_cancelled() {
            Err(DocToolsError::Cancelled)
        } else {
            Ok(())
        }
    }
}

// ── Tracker ──────────────────────────────────────────────────────────────

/// Share of a per-file slice spent before the first page.
const FILE_HEAD: f32 = 0.10;
/// Share of a per-file slice spent on pages.
const FILE_PAGES: f32 = 0.80;

/// Turns file/page positions into monotonic percentages for a callback.
///
/// Cloneable so a copy can move into a `spawn_blocking` closure; clones
/// share the same high-water mark.
#[derive(Clone)]
pub struct ProgressTracker {
    callback: ProgressCallback,
    cancel: CancelToken,
    last: Arc<Mutex<f32>>,
}

impl ProgressTracker {
    pub fn new(callback: Option<ProgressCallback>, cancel: CancelToken) -> Self {
        Self {
            callback: callback.unwrap_or_else(|| Arc::new(NoopProgressCallback)),
            cancel,
            last: Arc::new(Mutex::new(0.0)),
        }
    }

    /// A tracker that reports nowhere and never cancels.
    pub fn silent() -> Self {
        Self::new(None, CancelToken::new())
    }

    pub fn callback(&self) -> &dyn ToolProgressCallback {
        self.callback.as_ref()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Fail with `Cancelled` if the token has fired.
    pub fn checkpoint(&self) -> Result<(), DocToolsError> {
        self.cancel.check()
    }

    /// Report `percent`, clamped to `0..=100` and to the previous high-water
    /// mark. Nothing is reported after cancellation.
    pub fn report(&self, percent: f32) {
        if self.cancel.is_cancelled() {
            return;
        }
        let p = percent.clamp(0.0, 100.0);
        let value = match self.last.lock() {
            Ok(mut last) => {
                if p < *last {
                    return;
                }
                *last = p;
                p
            }
            Err(_) => return,
        };
        self.callback.on_progress(value);
    }

    /// Highest percentage reported so far.
    pub fn current(&self) -> f32 {
        self.last.lock().map(|l| *l).unwrap_or(0.0)
    }

    /// Per-file progress plan for file `index` (0-based) of `total_files`.
    pub fn file(&self, index: usize, total_files: usize) -> FileProgress {
        let share = 100.0 / total_files.max(1) as f32;
        FileProgress {
            tracker: self.clone(),
            base: share * index as f32,
            share,
        }
    }
}

/// Progress within one file's share of the batch: 10 % head, 80 % pages,
/// 10 % tail.
#[derive(Clone)]
pub struct FileProgress {
    tracker: ProgressTracker,
    base: f32,
    share: f32,
}

impl FileProgress {
    /// Setup finished (document loaded).
    pub fn loaded(&self) {
        self.tracker.report(self.base + self.share * FILE_HEAD);
    }

    /// `done` of `total` pages finished.
    pub fn page(&self, done: usize, total: usize) {
        let frac = if total == 0 {
            1.0
        } else {
            done as f32 / total as f32
        };
        self.tracker
            .report(self.base + self.share * (FILE_HEAD + FILE_PAGES * frac));
    }

    /// Output saved; the file's share is complete.
    pub fn finished(&self) {
        self.tracker.report(self.base + self.share);
    }

    pub fn checkpoint(&self) -> Result<(), DocToolsError> {
        self.tracker.checkpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<f32>>,
    }

    impl ToolProgressCallback for Recorder {
        fn on_progress(&self, percent: f32) {
            self.seen.lock().unwrap().push(percent);
        }
    }

    fn tracker() -> (ProgressTracker, Arc<Recorder>, CancelToken) {
        let rec = Arc::new(Recorder::default());
        let cancel = CancelToken::new();
        let t = ProgressTracker::new(Some(rec.clone() as ProgressCallback), cancel.clone());
        (t, rec, cancel)
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_operation_start("compress", 2);
        cb.on_file_start(1, "a.pdf");
        cb.on_progress(50.0);
        cb.on_file_complete(1, "a.pdf");
        cb.on_operation_complete(1);
    }

    #[test]
    fn reports_are_monotonic_and_clamped() {
        let (t, rec, _) = tracker();
        t.report(20.0);
        t.report(10.0);
        t.report(150.0);
        assert_eq!(*rec.seen.lock().unwrap(), vec![20.0, 100.0]);
        assert_eq!(t.current(), 100.0);
    }

    #[test]
    fn cancelled_tracker_stops_reporting() {
        let (t, rec, cancel) = tracker();
        t.report(5.0);
        cancel.cancel();
        t.report(50.0);
        assert_eq!(*rec.seen.lock().unwrap(), vec![5.0]);
        assert!(matches!(t.checkpoint(), Err(DocToolsError::Cancelled)));
    }

    #[test]
    fn file_shares_split_head_pages_tail() {
        let (t, rec, _) = tracker();
        let second = t.file(1, 2);
        second.loaded();
        second.page(1, 2);
        second.page(2, 2);
        second.finished();
        assert_eq!(*rec.seen.lock().unwrap(), vec![55.0, 75.0, 95.0, 100.0]);
    }

    #[test]
    fn clones_share_the_high_water_mark() {
        let (t, rec, _) = tracker();
        let other = t.clone();
        t.report(40.0);
        other.report(30.0);
        assert_eq!(rec.seen.lock().unwrap().len(), 1);
    }
}
