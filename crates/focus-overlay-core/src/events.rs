use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::overlay::OverlayMode;

/// Every state change in the controller produces an Event.
/// Hosts drain them with [`DecisionController::take_events`](crate::DecisionController::take_events).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    HostClassified {
        hostname: String,
        blocked: bool,
        at: DateTime<Utc>,
    },
    /// Grant read failed; the page is blocked regardless.
    GrantReadFailed {
        hostname: String,
        error: String,
        at: DateTime<Utc>,
    },
    Blocked {
        hostname: String,
        at: DateTime<Utc>,
    },
    Unlocked {
        hostname: String,
        unlock_until_ms: u64,
        at: DateTime<Utc>,
    },
    OverlayShown {
        mode: OverlayMode,
        at: DateTime<Utc>,
    },
    /// Panel re-rendered in place.
    OverlayUpdated {
        mode: OverlayMode,
        at: DateTime<Utc>,
    },
    OverlayRemoved {
        at: DateTime<Utc>,
    },
    /// User picked a duration.
    UnlockGranted {
        hostname: String,
        minutes: u64,
        unlock_until_ms: u64,
        at: DateTime<Utc>,
    },
    MonitorArmed {
        hostname: String,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    MonitorStopped {
        at: DateTime<Utc>,
    },
    SessionExpired {
        hostname: String,
        at: DateTime<Utc>,
    },
    NavigationDetected {
        from: String,
        to: String,
        at: DateTime<Utc>,
    },
}
