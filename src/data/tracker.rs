//! Request generations and once-only warnings.
//!
//! Toggling an option while a fetch is in flight starts a new fetch. The
//! slower, older response must not overwrite the newer one, so every fetch is
//! tagged with a [`RequestToken`] and only the most recent token is accepted.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Shared generation counter. Clones observe the same counter.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    generation: Arc<AtomicU64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request; any earlier token becomes stale.
    pub fn begin(&self) -> RequestToken {
        RequestToken(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.generation.load(Ordering::SeqCst) == token.0
    }
}

/// Latest accepted response for one tracker.
#[derive(Debug)]
pub struct Latest<T> {
    tracker: RequestTracker,
    value: Option<T>,
    accepted: Option<RequestToken>,
}

impl<T> Latest<T> {
    pub fn new(tracker: RequestTracker) -> Self {
        Self {
            tracker,
            value: None,
            accepted: None,
        }
    }

    /// Store `value` if `token` is still the most recent request.
    ///
    /// Stale responses are dropped and `false` is returned.
    pub fn accept(&mut self, token: RequestToken, value: T) -> bool {
        if !self.tracker.is_current(token) {
            tracing::debug!(generation = token.generation(), "dropping stale response");
            return false;
        }
        self.value = Some(value);
        self.accepted = Some(token);
        true
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }

    pub fn accepted(&self) -> Option<RequestToken> {
        self.accepted
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }
}

/// Emits each warning key once per instance.
///
/// Owned by whoever runs the pipeline (one per CLI run or TUI session) and
/// passed down by reference.
#[derive(Debug, Default)]
pub struct DedupLog {
    seen: HashSet<String>,
}

impl DedupLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `message` at warn level unless `key` was already reported.
    ///
    /// Returns `true` when the message was emitted.
    pub fn warn(&mut self, key: &str, message: &str) -> bool {
        if !self.seen.insert(key.to_string()) {
            return false;
        }
        tracing::warn!(key, "{message}");
        true
    }

    pub fn seen(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_request_wins_regardless_of_arrival_order() {
        let tracker = RequestTracker::new();
        let mut latest = Latest::new(tracker.clone());

        let first = tracker.begin();
        let second = tracker.begin();

        // Second response arrives first, then the stale one.
        assert!(latest.accept(second, "without tor"));
        assert!(!latest.accept(first, "with tor"));
        assert_eq!(latest.get(), Some(&"without tor"));
        assert_eq!(latest.accepted(), Some(second));
    }

    #[test]
    fn tokens_go_stale_once_a_new_request_begins() {
        let tracker = RequestTracker::new();
        let token = tracker.begin();
        assert!(tracker.is_current(token));

        let shared = tracker.clone();
        let newer = shared.begin();
        assert!(!tracker.is_current(token));
        assert!(tracker.is_current(newer));
        assert!(newer > token);
    }

    #[test]
    fn tracker_is_usable_across_threads() {
        let tracker = RequestTracker::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let t = tracker.clone();
                std::thread::spawn(move || t.begin())
            })
            .collect();
        let tokens: HashSet<RequestToken> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens.iter().filter(|t| tracker.is_current(**t)).count(), 1);
    }

    #[test]
    fn dedup_log_reports_each_key_once() {
        let mut log = DedupLog::new();
        assert!(log.warn("network:missing-hhi", "hhi missing"));
        assert!(!log.warn("network:missing-hhi", "hhi missing"));
        assert!(log.warn("network:missing-gini", "gini missing"));
        assert!(log.seen("network:missing-hhi"));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn separate_logs_do_not_share_state() {
        let mut a = DedupLog::new();
        let mut b = DedupLog::new();
        assert!(a.warn("k", "m"));
        assert!(b.warn("k", "m"));
    }
}
