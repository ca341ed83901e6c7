//! Controller-owned timer queue.
//!
//! There is no background thread. The host calls
//! [`DecisionController::tick`](crate::DecisionController::tick) and every timer
//! whose due instant has passed fires, earliest first. Owners keep the
//! [`TimerId`] they were handed in an `Option` and null it when they stop; a
//! firing whose id the owner no longer holds is ignored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// What a timer is for. Dispatch happens on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Enables the "Continue Anyway" control.
    PromptCooldown,
    /// One-shot at the exact grant expiry.
    MonitorDeadline,
    /// Recurring grant re-read.
    MonitorPoll,
    /// Coalesced DOM-mutation navigation check.
    MutationThrottle,
    /// Deferred check after a history state change.
    HistoryCheck,
}

#[derive(Debug, Clone)]
struct Entry {
    id: TimerId,
    kind: TimerKind,
    due_ms: u64,
    period_ms: Option<u64>,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    entries: Vec<Entry>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire once, `delay_ms` after `now_ms`.
    pub fn schedule(&mut self, kind: TimerKind, now_ms: u64, delay_ms: u64) -> TimerId {
        self.push(kind, now_ms.saturating_add(delay_ms), None)
    }

    /// Fire every `period_ms`, first at `now_ms + period_ms`.
    pub fn schedule_repeating(&mut self, kind: TimerKind, now_ms: u64, period_ms: u64) -> TimerId {
        let period = period_ms.max(1);
        self.push(kind, now_ms.saturating_add(period), Some(period))
    }

    fn push(&mut self, kind: TimerKind, due_ms: u64, period_ms: Option<u64>) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.entries.push(Entry {
            id,
            kind,
            due_ms,
            period_ms,
        });
        id
    }

    /// Returns whether the timer was still scheduled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn due_at(&self, id: TimerId) -> Option<u64> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.due_ms)
    }

    /// Earliest pending due instant.
    pub fn next_due(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.due_ms).min()
    }

    /// Pop the earliest timer due at or before `now_ms`.
    ///
    /// Repeating timers are re-armed one period after `now_ms` rather than
    /// after their missed due instant, so a long sleep yields one firing, not
    /// a burst.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerId, TimerKind)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= now_ms)
            .min_by_key(|(_, e)| (e.due_ms, e.id))
            .map(|(i, _)| i)?;

        let Entry {
            id, kind, period_ms, ..
        } = self.entries[idx];
        match period_ms {
            Some(period) => self.entries[idx].due_ms = now_ms.saturating_add(period),
            None => {
                self.entries.swap_remove(idx);
            }
        }
        Some((id, kind))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
