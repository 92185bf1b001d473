//! Per-search state shared with progress reporting and cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

use crate::els::CompletionReason;

/// Snapshot reported at chunk boundaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProgress {
    /// 0.0 to 100.0.
    pub progress_percent: f64,
    pub positions_scanned: u64,
    pub total_positions: u64,
    pub elapsed_ms: u64,
    pub search_term: String,
    pub is_cancelled: bool,
}

/// State of one in-flight search.
#[derive(Debug)]
pub(crate) struct SearchContext {
    term: String,
    started: Instant,
    timeout: Duration,
    cancelled: AtomicBool,
    scanned: AtomicU64,
    total: u64,
}

impl SearchContext {
    pub(crate) fn new(term: &str, total: u64, timeout_ms: u64) -> Self {
        Self {
            term: term.to_string(),
            started: Instant::now(),
            timeout: Duration::from_millis(timeout_ms),
            cancelled: AtomicBool::new(false),
            scanned: AtomicU64::new(0),
            total,
        }
    }

    pub(crate) fn term(&self) -> &str {
        &self.term
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Checked before every chunk.
    pub(crate) fn stop_reason(&self) -> Option<CompletionReason> {
        if self.is_cancelled() {
            Some(CompletionReason::Cancelled)
        } else if self.elapsed() > self.timeout {
            Some(CompletionReason::TimedOut)
        } else {
            None
        }
    }

    pub(crate) fn advance(&self, probes: u64) {
        self.scanned.fetch_add(probes, Ordering::Relaxed);
    }

    pub(crate) fn progress(&self) -> SearchProgress {
        let scanned = self.scanned.load(Ordering::Relaxed).min(self.total);
        let percent = if self.total == 0 {
            100.0
        } else {
            scanned as f64 / self.total as f64 * 100.0
        };

        SearchProgress {
            progress_percent: percent,
            positions_scanned: scanned,
            total_positions: self.total,
            elapsed_ms: u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX),
            search_term: self.term.clone(),
            is_cancelled: self.is_cancelled(),
        }
    }
}

/// Whether a search is running and, if so, how far it has got.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStatus {
    pub is_searching: bool,
    pub search_term: Option<String>,
    pub progress: Option<SearchProgress>,
    pub elapsed_ms: u64,
}

impl SearchStatus {
    fn idle() -> Self {
        Self {
            is_searching: false,
            search_term: None,
            progress: None,
            elapsed_ms: 0,
        }
    }
}

pub(crate) type ActiveSlot = Arc<Mutex<Option<Arc<SearchContext>>>>;

/// Publishes a context as the engine's active search until dropped.
pub(crate) struct ActiveGuard {
    slot: ActiveSlot,
}

impl ActiveGuard {
    pub(crate) fn install(slot: &ActiveSlot, context: Arc<SearchContext>) -> Self {
        *slot.lock() = Some(context);
        Self {
            slot: Arc::clone(slot),
        }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        *self.slot.lock() = None;
    }
}

/// Observes or cancels whatever search the originating engine is running.
///
/// A search borrows the engine mutably, so this handle is how a progress
/// callback or another thread reads its status. Cancellation is observed at
/// the next chunk boundary; the search call still returns normally with the
/// results found so far.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    slot: ActiveSlot,
}

impl CancelHandle {
    pub(crate) fn new(slot: &ActiveSlot) -> Self {
        Self {
            slot: Arc::clone(slot),
        }
    }

    /// Returns true if a search was running.
    pub fn cancel(&self) -> bool {
        match self.slot.lock().as_ref() {
            Some(context) => {
                context.cancel();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.slot.lock().is_some()
    }

    #[must_use]
    pub fn status(&self) -> SearchStatus {
        match self.slot.lock().as_ref() {
            Some(context) => {
                let progress = context.progress();
                SearchStatus {
                    is_searching: true,
                    search_term: Some(context.term().to_string()),
                    elapsed_ms: progress.elapsed_ms,
                    progress: Some(progress),
                }
            }
            None => SearchStatus::idle(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percent_tracks_probes() {
        let context = SearchContext::new("בר", 200, 1000);
        context.advance(50);
        let progress = context.progress();
        assert_eq!(progress.positions_scanned, 50);
        assert!((progress.progress_percent - 25.0).abs() < f64::EPSILON);
        assert_eq!(progress.search_term, "בר");
    }

    #[test]
    fn empty_scan_is_complete() {
        let context = SearchContext::new("בר", 0, 1000);
        assert!((context.progress().progress_percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cancellation_wins_over_timeout() {
        let context = SearchContext::new("בר", 10, 0);
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(context.stop_reason(), Some(CompletionReason::TimedOut));
        context.cancel();
        assert_eq!(context.stop_reason(), Some(CompletionReason::Cancelled));
    }

    #[test]
    fn guard_clears_slot() {
        let slot: ActiveSlot = Arc::default();
        let handle = CancelHandle::new(&slot);
        assert!(!handle.cancel());

        let context = Arc::new(SearchContext::new("בר", 10, 1000));
        {
            let _guard = ActiveGuard::install(&slot, Arc::clone(&context));
            assert!(handle.cancel());
            assert!(context.is_cancelled());
        }
        assert!(slot.lock().is_none());
    }

    #[test]
    fn handle_reports_status_while_installed() {
        let slot: ActiveSlot = Arc::default();
        let handle = CancelHandle::new(&slot);
        assert_eq!(handle.status(), SearchStatus::idle());

        let context = Arc::new(SearchContext::new("שלום", 40, 1000));
        context.advance(10);
        {
            let _guard = ActiveGuard::install(&slot, context);
            let status = handle.status();
            assert!(handle.is_searching());
            assert!(status.is_searching);
            assert_eq!(status.search_term.as_deref(), Some("שלום"));
            let progress = status.progress.unwrap();
            assert_eq!(progress.positions_scanned, 10);
            assert!((progress.progress_percent - 25.0).abs() < f64::EPSILON);
        }
        assert!(!handle.is_searching());
        assert!(handle.status().progress.is_none());
    }
}
