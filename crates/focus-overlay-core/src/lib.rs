//! # Focus Overlay Core Library
//!
//! Core logic for Focus Overlay: a focus-mode blocker that covers listed
//! sites with an input-blocking overlay and lets the user buy a short,
//! time-boxed unlock.
//!
//! ## Architecture
//!
//! - **Decision Controller**: a sans-io state machine. The host calls
//!   `start()`, `tick()` and the page-event hooks, services the store requests
//!   it queues and reads back [`Event`]s
//! - **Overlay**: view enum with one render function per mode, plus input
//!   interception
//! - **Unlock Monitor**: one-shot plus poll, both re-reading the grant
//! - **Navigation Watcher**: throttled mutation, history and popstate checks
//! - **Storage**: SQLite key/value store for grants and settings, TOML config
//! - **Integrations**: best-effort Notion task source
//!
//! ## Key Components
//!
//! - [`DecisionController`]: the lock/unlock state machine
//! - [`PageRuntime`]: single-threaded host loop over a document, store and clock
//! - [`Config`]: application configuration management
//! - [`KeyValueStore`]: grant store seam

pub mod blocklist;
pub mod clock;
pub mod controller;
pub mod dom;
pub mod error;
pub mod events;
pub mod grant;
pub mod integrations;
pub mod monitor;
pub mod navigation;
pub mod overlay;
pub mod runtime;
pub mod settings;
pub mod storage;
pub mod store;
pub mod timers;

pub use blocklist::{hostname_of, Blocklist, DEFAULT_BLOCKED_SITES};
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{ControllerSettings, DecisionController, Phase};
pub use dom::{Document, Element, HeadlessDocument, ReadyState, ScrollHost};
pub use error::{ConfigError, CoreError, DomError, StoreError, ValidationError};
pub use events::Event;
pub use grant::{unlock_key, Grant};
pub use integrations::{NotionTaskSource, TaskSource, TaskSummary};
pub use overlay::{Control, Disposition, InputEvent, InputKind, InputTarget, OverlayMode, OverlayView};
pub use runtime::PageRuntime;
pub use settings::Settings;
pub use storage::{Config, SqliteStore};
pub use store::{KeyValueStore, MemoryStore, StoreRequest, Ticket};
