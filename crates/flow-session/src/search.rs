//! Debounced, idle-time search scheduling.
//!
//! A keyword change arms a delayed task; another change before it fires
//! replaces it. Once the quiet period has passed, the task becomes
//! runnable but only executes when the host reports an idle loop (see
//! [`Reader::run_idle`](crate::Reader::run_idle)). Each scheduled task gets a
//! generation number, so results from a superseded task are recognizable and
//! discarded.

use std::time::{Duration, Instant};

/// A search that is due to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub keyword: String,
    pub generation: u64,
}

#[derive(Debug, Clone)]
struct PendingSearch {
    keyword: String,
    generation: u64,
    due: Instant,
}

/// Cancellable delayed search task.
#[derive(Debug, Clone)]
pub struct SearchScheduler {
    debounce: Duration,
    generation: u64,
    pending: Option<PendingSearch>,
}

impl SearchScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            generation: 0,
            pending: None,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Arm (or re-arm) the task for `keyword`. Returns its generation.
    pub fn schedule(&mut self, keyword: impl Into<String>, now: Instant) -> u64 {
        self.generation += 1;
        self.pending = Some(PendingSearch {
            keyword: keyword.into(),
            generation: self.generation,
            due: now + self.debounce,
        });
        tracing::trace!(generation = self.generation, "search scheduled");
        self.generation
    }

    /// Drop the pending task and invalidate any ticket already handed out.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending task becomes runnable.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    /// Hand out the pending task if its quiet period has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<SearchTicket> {
        if self.pending.as_ref().is_some_and(|p| now >= p.due) {
            self.pending.take().map(|p| SearchTicket {
                keyword: p.keyword,
                generation: p.generation,
            })
        } else {
            None
        }
    }

    /// Whether `ticket` is still the latest scheduled search.
    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        ticket.generation == self.generation
    }
}

impl Default for SearchScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}
