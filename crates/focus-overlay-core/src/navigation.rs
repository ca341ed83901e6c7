//! Client-side navigation detection.
//!
//! Route changes in single-page apps do not reload the document. Three signals
//! feed a URL comparison against the last seen URL:
//!
//! - DOM mutations, coalesced so at most one check runs per throttle window;
//! - `pushState`/`replaceState`, checked after a short delay so the URL has
//!   settled;
//! - `popstate`, checked immediately.

use crate::timers::{TimerId, TimerKind, TimerQueue};

#[derive(Debug)]
pub struct NavigationWatcher {
    last_url: String,
    throttle_ms: u64,
    history_delay_ms: u64,
    throttle: Option<TimerId>,
    history_check: Option<TimerId>,
}

impl NavigationWatcher {
    pub fn new(throttle_ms: u64, history_delay_ms: u64) -> Self {
        Self {
            last_url: String::new(),
            throttle_ms,
            history_delay_ms,
            throttle: None,
            history_check: None,
        }
    }

    /// Forget pending checks and start comparing against `url`.
    pub fn reset(&mut self, timers: &mut TimerQueue, url: &str) {
        self.stop(timers);
        self.last_url = url.to_string();
    }

    pub fn last_url(&self) -> &str {
        &self.last_url
    }

    /// A mutation batch arrived. Schedules a check unless one is pending.
    pub fn on_mutation(&mut self, timers: &mut TimerQueue, now_ms: u64) {
        if self.throttle.is_none() {
            self.throttle =
                Some(timers.schedule(TimerKind::MutationThrottle, now_ms, self.throttle_ms));
        }
    }

    /// A history entry was pushed or replaced.
    pub fn on_history_change(&mut self, timers: &mut TimerQueue, now_ms: u64) {
        if self.history_check.is_none() {
            self.history_check =
                Some(timers.schedule(TimerKind::HistoryCheck, now_ms, self.history_delay_ms));
        }
    }

    /// Returns whether `id` was one of our pending checks; if so it is consumed
    /// and the caller should run [`check`](Self::check).
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        if self.throttle == Some(id) {
            self.throttle = None;
            true
        } else if self.history_check == Some(id) {
            self.history_check = None;
            true
        } else {
            false
        }
    }

    /// Compare `current` with the last seen URL. On change, record it and
    /// return the previous one.
    pub fn check(&mut self, current: &str) -> Option<String> {
        if current == self.last_url {
            return None;
        }
        Some(std::mem::replace(&mut self.last_url, current.to_string()))
    }

    pub fn stop(&mut self, timers: &mut TimerQueue) {
        if let Some(id) = self.throttle.take() {
            timers.cancel(id);
        }
        if let Some(id) = self.history_check.take() {
            timers.cancel(id);
        }
    }

    pub fn has_pending_check(&self) -> bool {
        self.throttle.is_some() || self.history_check.is_some()
    }
}
