//! Unlock monitor.
//!
//! Two triggers watch one expiry: a one-shot at the exact instant and a
//! recurring poll. Both only ever cause a store re-read; the verdict comes
//! from what the store says, so a grant extended or revoked elsewhere is
//! honoured. Whichever read first observes expiry disarms both.

use serde_json::Value;

use crate::error::StoreError;
use crate::grant::{active_grant, unlock_key};
use crate::store::Ticket;
use crate::timers::{TimerId, TimerKind, TimerQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorTrigger {
    Deadline,
    Poll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// Completion for a read the monitor no longer waits on.
    Stale,
    /// Grant still valid, possibly with a new expiry.
    StillActive { unlock_until_ms: u64 },
    /// Grant lapsed or vanished. The monitor has disarmed itself.
    Expired { hostname: String },
    /// Store unreadable. The monitor has disarmed itself.
    ReadFailed,
}

#[derive(Debug)]
pub struct UnlockMonitor {
    poll_interval_ms: u64,
    hostname: Option<String>,
    unlock_until_ms: u64,
    deadline: Option<TimerId>,
    poll: Option<TimerId>,
    pending_read: Option<Ticket>,
}

impl UnlockMonitor {
    pub fn new(poll_interval_ms: u64) -> Self {
        Self {
            poll_interval_ms,
            hostname: None,
            unlock_until_ms: 0,
            deadline: None,
            poll: None,
            pending_read: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.hostname.is_some()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    pub fn unlock_until_ms(&self) -> Option<u64> {
        self.hostname.as_ref().map(|_| self.unlock_until_ms)
    }

    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.unlock_until_ms()
            .map(|until| until.saturating_sub(now_ms))
    }

    pub fn deadline_timer(&self) -> Option<TimerId> {
        self.deadline
    }

    pub fn poll_timer(&self) -> Option<TimerId> {
        self.poll
    }

    /// Start watching `hostname` until `unlock_until_ms`. Re-arming replaces
    /// any previous watch.
    pub fn arm(
        &mut self,
        timers: &mut TimerQueue,
        hostname: &str,
        unlock_until_ms: u64,
        now_ms: u64,
    ) {
        self.disarm(timers);
        let remaining = unlock_until_ms.saturating_sub(now_ms);
        self.hostname = Some(hostname.to_string());
        self.unlock_until_ms = unlock_until_ms;
        self.deadline = Some(timers.schedule(TimerKind::MonitorDeadline, now_ms, remaining));
        self.poll = Some(timers.schedule_repeating(
            TimerKind::MonitorPoll,
            now_ms,
            self.poll_interval_ms,
        ));
    }

    /// Cancel both triggers and forget the watch. Returns whether it was armed.
    pub fn disarm(&mut self, timers: &mut TimerQueue) -> bool {
        if let Some(id) = self.deadline.take() {
            timers.cancel(id);
        }
        if let Some(id) = self.poll.take() {
            timers.cancel(id);
        }
        self.pending_read = None;
        self.hostname.take().is_some()
    }

    /// A timer fired. Returns the store key to re-read, or `None` when the
    /// timer is not (or no longer) ours.
    pub fn on_timer(&mut self, id: TimerId) -> Option<(MonitorTrigger, String)> {
        let trigger = if self.deadline == Some(id) {
            self.deadline = None;
            MonitorTrigger::Deadline
        } else if self.poll == Some(id) {
            MonitorTrigger::Poll
        } else {
            return None;
        };
        let hostname = self.hostname.as_deref()?;
        Some((trigger, unlock_key(hostname)))
    }

    /// Remember the read issued for the last trigger. Older reads become stale.
    pub fn await_read(&mut self, ticket: Ticket) {
        self.pending_read = Some(ticket);
    }

    pub fn is_waiting_on(&self, ticket: Ticket) -> bool {
        self.pending_read == Some(ticket)
    }

    pub fn complete_read(
        &mut self,
        timers: &mut TimerQueue,
        ticket: Ticket,
        result: Result<Option<Value>, StoreError>,
        now_ms: u64,
    ) -> MonitorOutcome {
        if self.pending_read != Some(ticket) {
            return MonitorOutcome::Stale;
        }
        self.pending_read = None;
        let Some(hostname) = self.hostname.clone() else {
            return MonitorOutcome::Stale;
        };

        let value = match result {
            Ok(value) => value,
            Err(_) => {
                self.disarm(timers);
                return MonitorOutcome::ReadFailed;
            }
        };

        match active_grant(value.as_ref(), now_ms) {
            Some(grant) => {
                if grant.unlock_until_ms != self.unlock_until_ms || self.deadline.is_none() {
                    // Moved elsewhere; chase the new expiry.
                    if let Some(id) = self.deadline.take() {
                        timers.cancel(id);
                    }
                    self.unlock_until_ms = grant.unlock_until_ms;
                    self.deadline = Some(timers.schedule(
                        TimerKind::MonitorDeadline,
                        now_ms,
                        grant.remaining_ms(now_ms),
                    ));
                }
                MonitorOutcome::StillActive {
                    unlock_until_ms: grant.unlock_until_ms,
                }
            }
            None => {
                self.disarm(timers);
                MonitorOutcome::Expired { hostname }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn armed(now: u64, until: u64) -> (UnlockMonitor, TimerQueue) {
        let mut timers = TimerQueue::new();
        let mut monitor = UnlockMonitor::new(5_000);
        monitor.arm(&mut timers, "x.com", until, now);
        (monitor, timers)
    }

    #[test]
    fn arm_schedules_deadline_and_poll() {
        let (monitor, timers) = armed(1_000, 601_000);
        assert_eq!(monitor.remaining_ms(1_000), Some(600_000));
        assert_eq!(timers.due_at(monitor.deadline_timer().unwrap()), Some(601_000));
        assert_eq!(timers.due_at(monitor.poll_timer().unwrap()), Some(6_000));
        assert_eq!(timers.len(), 2);
    }

    #[test]
    fn disarm_cancels_both_triggers() {
        let (mut monitor, mut timers) = armed(0, 60_000);
        assert!(monitor.disarm(&mut timers));
        assert!(timers.is_empty());
        assert!(!monitor.is_armed());
        assert!(!monitor.disarm(&mut timers));
    }

    #[test]
    fn stale_timer_is_ignored() {
        let (mut monitor, mut timers) = armed(0, 60_000);
        let old_poll = monitor.poll_timer().unwrap();
        monitor.arm(&mut timers, "x.com", 90_000, 0);
        assert_eq!(monitor.on_timer(old_poll), None);
    }

    #[test]
    fn expired_read_disarms() {
        let (mut monitor, mut timers) = armed(0, 60_000);
        let id = monitor.deadline_timer().unwrap();
        let (trigger, key) = monitor.on_timer(id).unwrap();
        assert_eq!(trigger, MonitorTrigger::Deadline);
        assert_eq!(key, "unlock_until_x.com");
        monitor.await_read(Ticket(7));
        let outcome = monitor.complete_read(&mut timers, Ticket(7), Ok(Some(json!(60_000))), 60_000);
        assert_eq!(
            outcome,
            MonitorOutcome::Expired {
                hostname: "x.com".into()
            }
        );
        assert!(timers.is_empty());
    }

    #[test]
    fn missing_grant_counts_as_expired() {
        let (mut monitor, mut timers) = armed(0, 60_000);
        monitor.await_read(Ticket(1));
        let outcome = monitor.complete_read(&mut timers, Ticket(1), Ok(None), 10_000);
        assert!(matches!(outcome, MonitorOutcome::Expired { .. }));
    }

    #[test]
    fn extended_grant_moves_deadline() {
        let (mut monitor, mut timers) = armed(0, 60_000);
        monitor.await_read(Ticket(1));
        let outcome =
            monitor.complete_read(&mut timers, Ticket(1), Ok(Some(json!(120_000))), 5_000);
        assert_eq!(
            outcome,
            MonitorOutcome::StillActive {
                unlock_until_ms: 120_000
            }
        );
        assert_eq!(timers.due_at(monitor.deadline_timer().unwrap()), Some(120_000));
    }

    #[test]
    fn read_failure_stops_monitor() {
        let (mut monitor, mut timers) = armed(0, 60_000);
        monitor.await_read(Ticket(1));
        let outcome = monitor.complete_read(
            &mut timers,
            Ticket(1),
            Err(StoreError::ContextInvalidated),
            5_000,
        );
        assert_eq!(outcome, MonitorOutcome::ReadFailed);
        assert!(!monitor.is_armed());
    }

    #[test]
    fn superseded_read_is_stale() {
        let (mut monitor, mut timers) = armed(0, 60_000);
        monitor.await_read(Ticket(1));
        monitor.await_read(Ticket(2));
        assert_eq!(
            monitor.complete_read(&mut timers, Ticket(1), Ok(None), 70_000),
            MonitorOutcome::Stale
        );
        assert!(monitor.is_armed());
    }
}
