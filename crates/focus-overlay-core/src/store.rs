//! Key/value store seam.
//!
//! The controller never calls a store directly. It queues [`StoreRequest`]s
//! that the host services whenever it likes, and reads come back through
//! [`DecisionController::on_store_read`](crate::DecisionController::on_store_read)
//! tagged with the [`Ticket`] they were issued under. Writes are best-effort:
//! nothing waits for them and nothing breaks if they never land.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::StoreError;

/// Persistent key/value storage that survives page reloads.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Fetch a string value, treating non-string values as absent.
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .get(key)?
            .and_then(|value| value.as_str().map(str::to_owned)))
    }
}

/// Identifies one outstanding read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub(crate) u64);

/// Work the controller asks the host to perform against the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreRequest {
    /// Read `key` and report back with `ticket`.
    Get { ticket: Ticket, key: String },
    /// Fire-and-forget write.
    Set { key: String, value: Value },
    /// Fire-and-forget delete.
    Remove { key: String },
}

impl StoreRequest {
    pub fn key(&self) -> &str {
        match self {
            StoreRequest::Get { key, .. }
            | StoreRequest::Set { key, .. }
            | StoreRequest::Remove { key } => key,
        }
    }
}

/// In-memory store with switchable failures, for tests and headless runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent read fail as if the hosting context vanished.
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Make every subsequent write or delete fail.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Direct read that bypasses failure injection.
    pub fn peek(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::ContextInvalidated);
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::ContextInvalidated);
        }
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::ContextInvalidated);
        }
        self.entries.remove(key);
        Ok(())
    }
}
