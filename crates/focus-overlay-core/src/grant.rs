//! Unlock grants: the only state that outlives a page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix of every grant key in the store.
pub const UNLOCK_KEY_PREFIX: &str = "unlock_until_";

/// Store key holding the grant for `hostname`.
pub fn unlock_key(hostname: &str) -> String {
    format!("{UNLOCK_KEY_PREFIX}{hostname}")
}

/// Permission to bypass blocking until `unlock_until_ms` (epoch milliseconds).
///
/// A missing grant and an expired grant mean the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub unlock_until_ms: u64,
}

impl Grant {
    pub fn new(unlock_until_ms: u64) -> Self {
        Self { unlock_until_ms }
    }

    /// Grant lasting `minutes` from `now_ms`.
    pub fn for_minutes(now_ms: u64, minutes: u64) -> Self {
        Self::new(now_ms.saturating_add(minutes.saturating_mul(60_000)))
    }

    /// Decode a stored value. Anything but a non-negative integer counts as no grant.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_u64().map(Self::new)
    }

    pub fn to_value(self) -> Value {
        Value::from(self.unlock_until_ms)
    }

    pub fn is_active(&self, now_ms: u64) -> bool {
        self.unlock_until_ms > now_ms
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.unlock_until_ms.saturating_sub(now_ms)
    }
}

/// Decode an optional stored value into an active-or-not grant.
pub fn active_grant(value: Option<&Value>, now_ms: u64) -> Option<Grant> {
    value
        .and_then(Grant::from_value)
        .filter(|grant| grant.is_active(now_ms))
}
