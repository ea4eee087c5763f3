//! Change coalescing for the live preview.
//!
//! Trailing-edge debounce: every buffer change re-arms a single deadline,
//! and only the last change within a quiet window triggers a render. There
//! is no timer thread - the shell's event loop polls on its ticks, so the
//! whole scheduler is cooperative and single-threaded.

use std::time::Duration;
use web_time::Instant;

/// Quiet period at normal edit cadence.
pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(150);

/// Coalesces rapid change notifications into one render trigger.
#[derive(Debug, Clone)]
pub struct DebounceScheduler {
    quiet: Duration,
    /// Latest revision seen and the deadline at which it fires.
    pending: Option<(u64, Instant)>,
}

impl Default for DebounceScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_INTERVAL)
    }
}

impl DebounceScheduler {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Record a buffer change at `now`.
    ///
    /// Supersedes any outstanding deadline; the discarded one simply never
    /// fires.
    pub fn note_change(&mut self, revision: u64, now: Instant) {
        self.pending = Some((revision, now + self.quiet));
    }

    /// Fire if the quiet period has elapsed.
    ///
    /// Returns the latest revision recorded, at most once per armed window.
    pub fn poll(&mut self, now: Instant) -> Option<u64> {
        let (revision, deadline) = self.pending?;
        if now >= deadline {
            self.pending = None;
            tracing::trace!(target: "inkdown::debounce", revision, "quiet period elapsed");
            Some(revision)
        } else {
            None
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any armed deadline without firing.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
