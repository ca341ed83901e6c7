//! Single-threaded host loop.
//!
//! [`PageRuntime`] plays the part of the page: it owns a controller, a store
//! and a clock, services store requests in order and forwards page events.
//! The CLI drives one per `visit`; the integration tests drive one with a
//! [`ManualClock`] to step through timers deterministically.

use std::collections::VecDeque;

use tracing::warn;

use crate::clock::{Clock, ManualClock};
use crate::controller::DecisionController;
use crate::dom::Document;
use crate::events::Event;
use crate::overlay::{Disposition, InputEvent};
use crate::store::{KeyValueStore, StoreRequest, Ticket};

pub struct PageRuntime<D: Document, S: KeyValueStore, C: Clock> {
    controller: DecisionController<D>,
    store: S,
    clock: C,
    hold_reads: bool,
    held: VecDeque<(Ticket, String)>,
    events: Vec<Event>,
}

impl<D: Document, S: KeyValueStore, C: Clock> PageRuntime<D, S, C> {
    pub fn new(controller: DecisionController<D>, store: S, clock: C) -> Self {
        Self {
            controller,
            store,
            clock,
            hold_reads: false,
            held: VecDeque::new(),
            events: Vec::new(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn controller(&self) -> &DecisionController<D> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut DecisionController<D> {
        &mut self.controller
    }

    pub fn document(&self) -> &D {
        self.controller.document()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Page load.
    pub fn load(&mut self) {
        let now = self.now_ms();
        self.controller.start(now);
        self.pump();
    }

    /// Fire due timers.
    pub fn tick(&mut self) {
        let now = self.now_ms();
        self.controller.tick(now);
        self.pump();
    }

    /// Change the page, then report the mutation batch.
    pub fn mutate_dom(&mut self, change: impl FnOnce(&mut D)) {
        change(self.controller.document_mut());
        let now = self.now_ms();
        self.controller.on_dom_mutation(now);
        self.pump();
    }

    /// Change the page via `pushState`/`replaceState`.
    pub fn history_change(&mut self, change: impl FnOnce(&mut D)) {
        change(self.controller.document_mut());
        let now = self.now_ms();
        self.controller.on_history_state_changed(now);
        self.pump();
    }

    /// Back/forward to whatever `change` leaves the page at.
    pub fn popstate(&mut self, change: impl FnOnce(&mut D)) {
        change(self.controller.document_mut());
        let now = self.now_ms();
        self.controller.on_popstate(now);
        self.pump();
    }

    pub fn document_ready(&mut self, change: impl FnOnce(&mut D)) {
        change(self.controller.document_mut());
        let now = self.now_ms();
        self.controller.on_document_ready(now);
        self.pump();
    }

    pub fn input(&mut self, event: &InputEvent) -> Disposition {
        let now = self.now_ms();
        let disposition = self.controller.dispatch_input(event, now);
        self.pump();
        disposition
    }

    /// Queue reads instead of answering them, to simulate store latency.
    pub fn hold_reads(&mut self) {
        self.hold_reads = true;
    }

    /// Answer every held read against the store as it is now.
    pub fn release_reads(&mut self) {
        self.hold_reads = false;
        while let Some((ticket, key)) = self.held.pop_front() {
            let now = self.now_ms();
            let result = self.store.get(&key);
            self.controller.on_store_read(ticket, result, now);
        }
        self.pump();
    }

    pub fn held_reads(&self) -> usize {
        self.held.len()
    }

    /// Everything the controller reported since the last call.
    pub fn take_events(&mut self) -> Vec<Event> {
        self.collect_events();
        std::mem::take(&mut self.events)
    }

    /// Service store requests until the controller stops producing them.
    pub fn pump(&mut self) {
        while self.controller.has_pending_requests() {
            for request in self.controller.take_requests() {
                self.serve(request);
            }
        }
        self.collect_events();
    }

    fn serve(&mut self, request: StoreRequest) {
        match request {
            StoreRequest::Get { ticket, key } => {
                if self.hold_reads {
                    self.held.push_back((ticket, key));
                    return;
                }
                let now = self.now_ms();
                let result = self.store.get(&key);
                self.controller.on_store_read(ticket, result, now);
            }
            StoreRequest::Set { key, value } => {
                if let Err(error) = self.store.set(&key, value) {
                    warn!(%key, %error, "grant write dropped");
                }
            }
            StoreRequest::Remove { key } => {
                if let Err(error) = self.store.remove(&key) {
                    warn!(%key, %error, "grant removal dropped");
                }
            }
        }
    }

    fn collect_events(&mut self) {
        self.events.extend(self.controller.take_events());
    }
}

impl<D: Document, S: KeyValueStore> PageRuntime<D, S, ManualClock> {
    /// Move the clock to `target_ms`, stopping at every timer due on the way.
    pub fn advance_to(&mut self, target_ms: u64) {
        while let Some(due) = self.controller.next_timer_due() {
            if due > target_ms {
                break;
            }
            let now = self.now_ms().max(due);
            self.clock.set(now);
            self.tick();
        }
        if target_ms > self.now_ms() {
            self.clock.set(target_ms);
        }
        self.tick();
    }

    pub fn advance(&mut self, ms: u64) {
        let target = self.now_ms().saturating_add(ms);
        self.advance_to(target);
    }
}
