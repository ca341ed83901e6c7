//! Decision controller: the lock/unlock state machine.
//!
//! The controller is sans-io. The host feeds it page events, timer ticks and
//! store completions, and drains the store requests and [`Event`]s it
//! produces. Nothing here blocks or spawns.
//!
//! ```text
//!  page load / navigation
//!          |
//!     classify host ──not listed──> Unblocked (no DOM, no store)
//!          |
//!     read grant (Checking)
//!          |──error──────────────┐
//!          |──none / expired─────┴─> Blocked ── pick duration ──> Unlocked
//!          |                                                        |
//!          └──active──────────────────────────────> Unlocked ── expiry ──> SessionEnded
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::blocklist::{hostname_of, Blocklist};
use crate::clock::to_datetime;
use crate::dom::{Document, ReadyState};
use crate::error::StoreError;
use crate::events::Event;
use crate::grant::{active_grant, unlock_key, Grant};
use crate::monitor::{MonitorOutcome, UnlockMonitor};
use crate::navigation::NavigationWatcher;
use crate::overlay::input::{action_for, intercept};
use crate::overlay::{Disposition, InputEvent, OverlayAction, OverlayRenderer, OverlayView};
use crate::store::{StoreRequest, Ticket};
use crate::timers::{TimerId, TimerKind, TimerQueue};

/// Tunables, normally built from [`Config`](crate::Config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerSettings {
    /// How long "Continue Anyway" stays disabled.
    pub cooldown_ms: u64,
    /// Offered unlock durations, in display order.
    pub durations_min: Vec<u64>,
    pub poll_interval_ms: u64,
    pub mutation_throttle_ms: u64,
    pub history_check_delay_ms: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            cooldown_ms: 10_000,
            durations_min: vec![1, 10, 20],
            poll_interval_ms: 5_000,
            mutation_throttle_ms: 300,
            history_check_delay_ms: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Phase {
    /// Not started.
    Idle,
    /// Host not on the blocklist. Nothing is tracked.
    Unblocked { hostname: String },
    /// Waiting for the grant read.
    Checking { hostname: String },
    Blocked { hostname: String },
    Unlocked {
        hostname: String,
        unlock_until_ms: u64,
    },
    /// A grant lapsed while the page stayed open.
    SessionEnded { hostname: String },
}

impl Phase {
    pub fn hostname(&self) -> Option<&str> {
        match self {
            Phase::Idle => None,
            Phase::Unblocked { hostname }
            | Phase::Checking { hostname }
            | Phase::Blocked { hostname }
            | Phase::Unlocked { hostname, .. }
            | Phase::SessionEnded { hostname } => Some(hostname),
        }
    }
}

pub struct DecisionController<D: Document> {
    doc: D,
    blocklist: Blocklist,
    settings: ControllerSettings,
    timers: TimerQueue,
    overlay: OverlayRenderer,
    monitor: UnlockMonitor,
    navigation: NavigationWatcher,
    phase: Phase,
    cooldown: Option<TimerId>,
    /// Outstanding entry-procedure read and the host it was issued for.
    entry_read: Option<(Ticket, String)>,
    /// View waiting for the document to finish loading.
    deferred: Option<OverlayView>,
    next_ticket: u64,
    requests: VecDeque<StoreRequest>,
    events: Vec<Event>,
}

impl<D: Document> DecisionController<D> {
    pub fn new(doc: D, blocklist: Blocklist, settings: ControllerSettings) -> Self {
        let overlay = OverlayRenderer::new(settings.durations_min.clone());
        let monitor = UnlockMonitor::new(settings.poll_interval_ms);
        let navigation =
            NavigationWatcher::new(settings.mutation_throttle_ms, settings.history_check_delay_ms);
        Self {
            doc,
            blocklist,
            settings,
            timers: TimerQueue::new(),
            overlay,
            monitor,
            navigation,
            phase: Phase::Idle,
            cooldown: None,
            entry_read: None,
            deferred: None,
            next_ticket: 0,
            requests: VecDeque::new(),
            events: Vec::new(),
        }
    }

    // ── accessors ───────────────────────────────────────────────────────

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// What the overlay shows, `None` when no overlay is mounted.
    pub fn overlay_view(&self) -> Option<OverlayView> {
        self.overlay.view()
    }

    /// View queued for document ready, if any.
    pub fn deferred_view(&self) -> Option<OverlayView> {
        self.deferred
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_armed()
    }

    pub fn monitor_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.monitor.remaining_ms(now_ms)
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn blocklist(&self) -> &Blocklist {
        &self.blocklist
    }

    /// Earliest instant at which [`tick`](Self::tick) has work.
    pub fn next_timer_due(&self) -> Option<u64> {
        self.timers.next_due()
    }

    pub fn has_pending_requests(&self) -> bool {
        !self.requests.is_empty()
    }

    /// Drain queued store work, oldest first.
    pub fn take_requests(&mut self) -> Vec<StoreRequest> {
        self.requests.drain(..).collect()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── host inputs ─────────────────────────────────────────────────────

    /// Page load: remember the URL for navigation checks and run the entry
    /// procedure.
    pub fn start(&mut self, now_ms: u64) {
        let url = self.doc.current_url();
        self.navigation.reset(&mut self.timers, &url);
        self.evaluate(now_ms);
    }

    /// The entry procedure. Classifies the current host and, for listed hosts,
    /// issues the grant read whose completion decides the state.
    ///
    /// A mounted overlay stays up while the read is outstanding and is only
    /// replaced or removed once the outcome is known.
    pub fn evaluate(&mut self, now_ms: u64) {
        self.stop_monitor(now_ms);
        self.cancel_cooldown();
        self.deferred = None;
        self.entry_read = None;

        let location = self.doc.location_href();
        let hostname = hostname_of(location.as_deref(), &self.doc.document_url());
        let blocked = self.blocklist.is_blocked(&hostname);
        debug!(%hostname, blocked, "classified host");
        self.emit(Event::HostClassified {
            hostname: hostname.clone(),
            blocked,
            at: to_datetime(now_ms),
        });

        if !blocked {
            self.remove_overlay(now_ms);
            self.phase = Phase::Unblocked { hostname };
            return;
        }

        let ticket = self.issue_read(unlock_key(&hostname));
        self.entry_read = Some((ticket, hostname.clone()));
        self.phase = Phase::Checking { hostname };
    }

    /// A store read issued earlier has resolved.
    pub fn on_store_read(
        &mut self,
        ticket: Ticket,
        result: Result<Option<Value>, StoreError>,
        now_ms: u64,
    ) {
        let is_entry = matches!(&self.entry_read, Some((pending, _)) if *pending == ticket);
        if is_entry {
            if let Some((_, hostname)) = self.entry_read.take() {
                self.resolve_entry(hostname, result, now_ms);
            }
            return;
        }

        if self.monitor.is_waiting_on(ticket) {
            let outcome = self
                .monitor
                .complete_read(&mut self.timers, ticket, result, now_ms);
            self.apply_monitor_outcome(outcome, now_ms);
            return;
        }

        debug!(?ticket, "ignoring store read for a superseded cycle");
    }

    /// Fire every timer due at or before `now_ms`.
    pub fn tick(&mut self, now_ms: u64) {
        while let Some((id, kind)) = self.timers.pop_due(now_ms) {
            match kind {
                TimerKind::PromptCooldown => {
                    if self.cooldown == Some(id) {
                        self.cooldown = None;
                        self.enable_continue(now_ms);
                    }
                }
                TimerKind::MonitorDeadline | TimerKind::MonitorPoll => {
                    if let Some((trigger, key)) = self.monitor.on_timer(id) {
                        debug!(?trigger, %key, "re-reading grant");
                        let ticket = self.issue_read(key);
                        self.monitor.await_read(ticket);
                    }
                }
                TimerKind::MutationThrottle | TimerKind::HistoryCheck => {
                    if self.navigation.on_timer(id) {
                        self.check_navigation(now_ms);
                    }
                }
            }
        }
    }

    /// A batch of DOM mutations was observed.
    pub fn on_dom_mutation(&mut self, now_ms: u64) {
        self.overlay.on_structure_changed(&mut self.doc);
        self.navigation.on_mutation(&mut self.timers, now_ms);
    }

    /// `history.pushState` or `history.replaceState` was called.
    pub fn on_history_state_changed(&mut self, now_ms: u64) {
        self.navigation.on_history_change(&mut self.timers, now_ms);
    }

    /// Back/forward navigation.
    pub fn on_popstate(&mut self, now_ms: u64) {
        self.check_navigation(now_ms);
    }

    /// The document finished parsing.
    pub fn on_document_ready(&mut self, now_ms: u64) {
        self.overlay.on_structure_changed(&mut self.doc);
        if let Some(view) = self.deferred.take() {
            debug!(mode = ?view.mode(), "mounting deferred overlay");
            self.mount(view, now_ms);
        }
    }

    /// Route a user input event through the overlay.
    pub fn dispatch_input(&mut self, event: &InputEvent, now_ms: u64) -> Disposition {
        let Some(view) = self.overlay.view() else {
            return Disposition::PassThrough;
        };
        let disposition = intercept(view, event);
        match action_for(view, event) {
            Some(OverlayAction::ShowDurationPicker) => {
                self.overlay
                    .rerender(&mut self.doc, OverlayView::DurationPicker);
                self.emit(Event::OverlayUpdated {
                    mode: OverlayView::DurationPicker.mode(),
                    at: to_datetime(now_ms),
                });
            }
            Some(OverlayAction::SelectDuration(minutes)) => self.grant_unlock(minutes, now_ms),
            None => {}
        }
        disposition
    }

    /// Page is going away. Cancel everything and remove the overlay.
    pub fn shutdown(&mut self, now_ms: u64) {
        self.teardown(now_ms);
        self.navigation.stop(&mut self.timers);
        self.timers.clear();
        self.phase = Phase::Idle;
    }

    // ── transitions ─────────────────────────────────────────────────────

    fn resolve_entry(
        &mut self,
        hostname: String,
        result: Result<Option<Value>, StoreError>,
        now_ms: u64,
    ) {
        let value = match result {
            Ok(value) => value,
            Err(error) => {
                warn!(%hostname, %error, "grant read failed; blocking");
                self.emit(Event::GrantReadFailed {
                    hostname: hostname.clone(),
                    error: error.to_string(),
                    at: to_datetime(now_ms),
                });
                self.block(hostname, now_ms);
                return;
            }
        };

        match active_grant(value.as_ref(), now_ms) {
            Some(grant) => {
                debug!(%hostname, unlock_until_ms = grant.unlock_until_ms, "grant active");
                self.remove_overlay(now_ms);
                self.phase = Phase::Unlocked {
                    hostname: hostname.clone(),
                    unlock_until_ms: grant.unlock_until_ms,
                };
                self.emit(Event::Unlocked {
                    hostname: hostname.clone(),
                    unlock_until_ms: grant.unlock_until_ms,
                    at: to_datetime(now_ms),
                });
                self.arm_monitor(&hostname, grant.unlock_until_ms, now_ms);
            }
            None => self.block(hostname, now_ms),
        }
    }

    fn block(&mut self, hostname: String, now_ms: u64) {
        self.stop_monitor(now_ms);
        debug!(%hostname, "blocking");
        self.phase = Phase::Blocked {
            hostname: hostname.clone(),
        };
        self.emit(Event::Blocked {
            hostname,
            at: to_datetime(now_ms),
        });
        self.show(
            OverlayView::Prompt {
                continue_enabled: false,
            },
            now_ms,
        );
    }

    fn grant_unlock(&mut self, minutes: u64, now_ms: u64) {
        let hostname = match &self.phase {
            Phase::Blocked { hostname } => hostname.clone(),
            other => {
                debug!(phase = ?other, "duration picked outside the blocked state");
                return;
            }
        };
        if !self.settings.durations_min.contains(&minutes) {
            warn!(minutes, "rejecting unlock duration that is not offered");
            return;
        }

        let grant = Grant::for_minutes(now_ms, minutes);
        self.requests.push_back(StoreRequest::Set {
            key: unlock_key(&hostname),
            value: grant.to_value(),
        });
        self.cancel_cooldown();
        self.remove_overlay(now_ms);
        self.phase = Phase::Unlocked {
            hostname: hostname.clone(),
            unlock_until_ms: grant.unlock_until_ms,
        };
        self.emit(Event::UnlockGranted {
            hostname: hostname.clone(),
            minutes,
            unlock_until_ms: grant.unlock_until_ms,
            at: to_datetime(now_ms),
        });
        self.arm_monitor(&hostname, grant.unlock_until_ms, now_ms);
    }

    fn apply_monitor_outcome(&mut self, outcome: MonitorOutcome, now_ms: u64) {
        match outcome {
            MonitorOutcome::Stale => {}
            MonitorOutcome::StillActive { unlock_until_ms } => {
                if let Phase::Unlocked {
                    unlock_until_ms: until,
                    ..
                } = &mut self.phase
                {
                    *until = unlock_until_ms;
                }
            }
            MonitorOutcome::Expired { hostname } => {
                debug!(%hostname, "unlock expired");
                self.requests.push_back(StoreRequest::Remove {
                    key: unlock_key(&hostname),
                });
                self.emit(Event::MonitorStopped { at: to_datetime(now_ms) });
                self.emit(Event::SessionExpired {
                    hostname: hostname.clone(),
                    at: to_datetime(now_ms),
                });
                self.phase = Phase::SessionEnded { hostname };
                self.show(OverlayView::SessionEnded, now_ms);
            }
            MonitorOutcome::ReadFailed => {
                warn!("grant re-read failed; unlock monitor stopped");
                self.emit(Event::MonitorStopped { at: to_datetime(now_ms) });
            }
        }
    }

    fn check_navigation(&mut self, now_ms: u64) {
        let current = self.doc.current_url();
        let Some(previous) = self.navigation.check(&current) else {
            return;
        };
        debug!(from = %previous, to = %current, "navigation detected");
        self.emit(Event::NavigationDetected {
            from: previous,
            to: current,
            at: to_datetime(now_ms),
        });
        self.teardown(now_ms);
        self.evaluate(now_ms);
    }

    fn teardown(&mut self, now_ms: u64) {
        self.cancel_cooldown();
        self.deferred = None;
        self.entry_read = None;
        self.remove_overlay(now_ms);
        self.stop_monitor(now_ms);
    }

    // ── helpers ─────────────────────────────────────────────────────────

    /// Mount `view` now, or once the document is ready if it is still loading.
    fn show(&mut self, view: OverlayView, now_ms: u64) {
        if self.doc.ready_state() == ReadyState::Loading {
            debug!(mode = ?view.mode(), "document loading; overlay deferred");
            self.deferred = Some(view);
            return;
        }
        self.mount(view, now_ms);
    }

    fn mount(&mut self, view: OverlayView, now_ms: u64) {
        self.cancel_cooldown();
        self.overlay.mount(&mut self.doc, view);
        self.emit(Event::OverlayShown {
            mode: view.mode(),
            at: to_datetime(now_ms),
        });
        if view == (OverlayView::Prompt { continue_enabled: false }) {
            self.cooldown = Some(self.timers.schedule(
                TimerKind::PromptCooldown,
                now_ms,
                self.settings.cooldown_ms,
            ));
        }
    }

    fn enable_continue(&mut self, now_ms: u64) {
        if self.overlay.view() != Some(OverlayView::Prompt { continue_enabled: false }) {
            return;
        }
        let view = OverlayView::Prompt {
            continue_enabled: true,
        };
        self.overlay.rerender(&mut self.doc, view);
        self.emit(Event::OverlayUpdated {
            mode: view.mode(),
            at: to_datetime(now_ms),
        });
    }

    fn remove_overlay(&mut self, now_ms: u64) {
        if self.overlay.unmount(&mut self.doc) {
            self.emit(Event::OverlayRemoved { at: to_datetime(now_ms) });
        }
    }

    fn arm_monitor(&mut self, hostname: &str, unlock_until_ms: u64, now_ms: u64) {
        self.monitor
            .arm(&mut self.timers, hostname, unlock_until_ms, now_ms);
        self.emit(Event::MonitorArmed {
            hostname: hostname.to_string(),
            remaining_ms: unlock_until_ms.saturating_sub(now_ms),
            at: to_datetime(now_ms),
        });
    }

    fn stop_monitor(&mut self, now_ms: u64) {
        if self.monitor.disarm(&mut self.timers) {
            self.emit(Event::MonitorStopped { at: to_datetime(now_ms) });
        }
    }

    fn cancel_cooldown(&mut self) {
        if let Some(id) = self.cooldown.take() {
            self.timers.cancel(id);
        }
    }

    fn issue_read(&mut self, key: String) -> Ticket {
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        self.requests.push_back(StoreRequest::Get { ticket, key });
        ticket
    }

    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{HeadlessDocument, ScrollHost};
    use crate::overlay::{Control, InputTarget};
    use crate::store::{KeyValueStore, MemoryStore};
    use serde_json::json;

    fn controller(url: &str) -> DecisionController<HeadlessDocument> {
        DecisionController::new(
            HeadlessDocument::loaded(url),
            Blocklist::new(["x.com"]),
            ControllerSettings::default(),
        )
    }

    /// Service queued store work against `store`.
    fn serve(
        ctrl: &mut DecisionController<HeadlessDocument>,
        store: &mut MemoryStore,
        now: u64,
    ) {
        while ctrl.has_pending_requests() {
            for request in ctrl.take_requests() {
                match request {
                    StoreRequest::Get { ticket, key } => {
                        let result = store.get(&key);
                        ctrl.on_store_read(ticket, result, now);
                    }
                    StoreRequest::Set { key, value } => {
                        let _ = store.set(&key, value);
                    }
                    StoreRequest::Remove { key } => {
                        let _ = store.remove(&key);
                    }
                }
            }
        }
    }

    fn click(control: Control) -> InputEvent {
        InputEvent::click(InputTarget::Control(control))
    }

    #[test]
    fn unblocked_host_issues_no_work() {
        let mut ctrl = controller("https://y.com/");
        ctrl.start(0);
        assert_eq!(
            ctrl.phase(),
            &Phase::Unblocked {
                hostname: "y.com".into()
            }
        );
        assert!(ctrl.take_requests().is_empty());
        assert_eq!(ctrl.document().mutation_count(), 0);
    }

    #[test]
    fn overlay_only_after_read_resolves() {
        let mut ctrl = controller("https://x.com/");
        ctrl.start(0);
        assert!(matches!(ctrl.phase(), Phase::Checking { .. }));
        assert_eq!(ctrl.document().overlay_count(), 0);

        let mut store = MemoryStore::new();
        serve(&mut ctrl, &mut store, 0);
        assert_eq!(
            ctrl.overlay_view(),
            Some(OverlayView::Prompt {
                continue_enabled: false
            })
        );
        assert_eq!(ctrl.document().overlay_count(), 1);
    }

    #[test]
    fn cooldown_enables_continue() {
        let mut ctrl = controller("https://x.com/");
        let mut store = MemoryStore::new();
        ctrl.start(0);
        serve(&mut ctrl, &mut store, 0);

        ctrl.tick(9_999);
        assert_eq!(
            ctrl.dispatch_input(&click(Control::Continue), 9_999),
            Disposition::Blocked
        );
        assert!(ctrl.overlay_view() != Some(OverlayView::DurationPicker));

        ctrl.tick(10_000);
        assert_eq!(
            ctrl.overlay_view(),
            Some(OverlayView::Prompt {
                continue_enabled: true
            })
        );
        assert_eq!(
            ctrl.dispatch_input(&click(Control::Continue), 10_000),
            Disposition::PassThrough
        );
        assert_eq!(ctrl.overlay_view(), Some(OverlayView::DurationPicker));
        assert_eq!(ctrl.document().overlay_count(), 1);
    }

    #[test]
    fn picking_duration_unlocks_synchronously() {
        let mut ctrl = controller("https://x.com/");
        let mut store = MemoryStore::new();
        ctrl.start(0);
        serve(&mut ctrl, &mut store, 0);
        ctrl.tick(10_000);
        ctrl.dispatch_input(&click(Control::Continue), 10_000);
        ctrl.dispatch_input(&click(Control::Duration(10)), 12_000);

        assert_eq!(ctrl.document().overlay_count(), 0);
        assert_eq!(ctrl.document().overflow(ScrollHost::Root), None);
        assert_eq!(ctrl.monitor_remaining_ms(12_000), Some(600_000));
        assert_eq!(
            ctrl.phase(),
            &Phase::Unlocked {
                hostname: "x.com".into(),
                unlock_until_ms: 612_000
            }
        );
        assert_eq!(
            ctrl.take_requests(),
            vec![StoreRequest::Set {
                key: "unlock_until_x.com".into(),
                value: json!(612_000)
            }]
        );
    }

    #[test]
    fn unoffered_duration_is_ignored() {
        let mut ctrl = controller("https://x.com/");
        let mut store = MemoryStore::new();
        ctrl.start(0);
        serve(&mut ctrl, &mut store, 0);
        ctrl.tick(10_000);
        ctrl.dispatch_input(&click(Control::Continue), 10_000);
        ctrl.dispatch_input(&click(Control::Duration(7)), 10_000);
        assert_eq!(ctrl.overlay_view(), Some(OverlayView::DurationPicker));
        assert!(ctrl.take_requests().is_empty());
    }

    #[test]
    fn active_grant_leaves_dom_untouched() {
        let mut ctrl = controller("https://x.com/");
        let mut store = MemoryStore::new();
        store.set("unlock_until_x.com", json!(60_000)).unwrap();
        ctrl.start(1_000);
        serve(&mut ctrl, &mut store, 1_000);
        assert_eq!(ctrl.document().mutation_count(), 0);
        assert_eq!(ctrl.monitor_remaining_ms(1_000), Some(59_000));
    }

    #[test]
    fn read_failure_blocks_even_with_grant() {
        let mut ctrl = controller("https://x.com/");
        let mut store = MemoryStore::new();
        store.set("unlock_until_x.com", json!(u64::MAX)).unwrap();
        store.set_fail_reads(true);
        ctrl.start(0);
        serve(&mut ctrl, &mut store, 0);
        assert!(matches!(ctrl.phase(), Phase::Blocked { .. }));
        assert_eq!(ctrl.document().overlay_count(), 1);
        assert!(ctrl
            .take_events()
            .iter()
            .any(|e| matches!(e, Event::GrantReadFailed { .. })));
    }

    #[test]
    fn expiry_shows_session_ended_and_removes_grant() {
        let mut ctrl = controller("https://x.com/");
        let mut store = MemoryStore::new();
        store.set("unlock_until_x.com", json!(60_000)).unwrap();
        ctrl.start(0);
        serve(&mut ctrl, &mut store, 0);

        ctrl.tick(60_000);
        serve(&mut ctrl, &mut store, 60_000);
        assert_eq!(ctrl.overlay_view(), Some(OverlayView::SessionEnded));
        assert!(!store.contains_key("unlock_until_x.com"));
        assert!(!ctrl.is_monitoring());
        assert_eq!(
            ctrl.dispatch_input(&click(Control::Continue), 60_001),
            Disposition::Blocked
        );
    }

    #[test]
    fn poll_honours_revoked_grant() {
        let mut ctrl = controller("https://x.com/");
        let mut store = MemoryStore::new();
        store.set("unlock_until_x.com", json!(600_000)).unwrap();
        ctrl.start(0);
        serve(&mut ctrl, &mut store, 0);

        store.remove("unlock_until_x.com").unwrap();
        ctrl.tick(5_000);
        serve(&mut ctrl, &mut store, 5_000);
        assert!(matches!(ctrl.phase(), Phase::SessionEnded { .. }));
    }

    #[test]
    fn poll_read_failure_stops_monitor_without_overlay() {
        let mut ctrl = controller("https://x.com/");
        let mut store = MemoryStore::new();
        store.set("unlock_until_x.com", json!(600_000)).unwrap();
        ctrl.start(0);
        serve(&mut ctrl, &mut store, 0);

        store.set_fail_reads(true);
        ctrl.tick(5_000);
        serve(&mut ctrl, &mut store, 5_000);
        assert!(!ctrl.is_monitoring());
        assert_eq!(ctrl.document().overlay_count(), 0);
    }

    #[test]
    fn loading_document_defers_overlay() {
        let mut ctrl = DecisionController::new(
            HeadlessDocument::loading("https://x.com/"),
            Blocklist::new(["x.com"]),
            ControllerSettings::default(),
        );
        let mut store = MemoryStore::new();
        ctrl.start(0);
        serve(&mut ctrl, &mut store, 0);
        assert_eq!(ctrl.document().overlay_count(), 0);
        assert!(ctrl.deferred_view().is_some());

        ctrl.document_mut().finish_parsing();
        ctrl.on_document_ready(50);
        assert_eq!(ctrl.document().overlay_count(), 1);
        // Cooldown counts from the mount.
        assert_eq!(ctrl.next_timer_due(), Some(10_050));
    }

    #[test]
    fn stale_entry_read_is_ignored() {
        let mut ctrl = controller("https://x.com/");
        ctrl.start(0);
        let first = ctrl.take_requests();
        ctrl.evaluate(10);
        let second = ctrl.take_requests();

        let StoreRequest::Get { ticket: old, .. } = first[0].clone() else {
            panic!("expected a read");
        };
        let StoreRequest::Get { ticket: new, .. } = second[0].clone() else {
            panic!("expected a read");
        };
        ctrl.on_store_read(old, Ok(None), 20);
        assert_eq!(ctrl.document().overlay_count(), 0);
        ctrl.on_store_read(new, Ok(Some(json!(100_000))), 20);
        assert!(matches!(ctrl.phase(), Phase::Unlocked { .. }));
        assert_eq!(ctrl.document().overlay_count(), 0);
    }

    #[test]
    fn reevaluate_with_new_grant_removes_prompt() {
        let mut ctrl = controller("https://x.com/");
        let mut store = MemoryStore::new();
        ctrl.start(0);
        serve(&mut ctrl, &mut store, 0);
        assert_eq!(ctrl.document().overlay_count(), 1);

        store.set("unlock_until_x.com", json!(600_000)).unwrap();
        ctrl.evaluate(1_000);
        // Still covered while the read is outstanding.
        assert_eq!(ctrl.document().overlay_count(), 1);
        serve(&mut ctrl, &mut store, 1_000);

        assert!(matches!(ctrl.phase(), Phase::Unlocked { .. }));
        assert_eq!(ctrl.overlay_view(), None);
        assert_eq!(ctrl.document().overlay_count(), 0);
        assert_eq!(ctrl.document().overflow(ScrollHost::Root), None);
        // The old prompt cooldown no longer fires.
        assert_eq!(ctrl.next_timer_due(), Some(6_000));
    }

    #[test]
    fn shutdown_clears_everything() {
        let mut ctrl = controller("https://x.com/");
        let mut store = MemoryStore::new();
        ctrl.start(0);
        serve(&mut ctrl, &mut store, 0);
        ctrl.shutdown(1);
        assert_eq!(ctrl.phase(), &Phase::Idle);
        assert_eq!(ctrl.document().overlay_count(), 0);
        assert_eq!(ctrl.next_timer_due(), None);
    }
}
