//! Page document seam.
//!
//! The controller only ever touches the page through [`Document`]. A browser
//! binding implements it over the real DOM; [`HeadlessDocument`] implements it
//! in memory for the CLI and for tests.

mod element;
mod headless;

pub use element::Element;
pub use headless::{HeadlessDocument, MediaElement};

use serde::{Deserialize, Serialize};

use crate::error::DomError;

/// Marker id of the single overlay instance.
pub const OVERLAY_ID: &str = "focus-overlay-blocker";

/// Id of the centered content panel inside the overlay.
pub const PANEL_ID: &str = "focus-overlay-panel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

/// Elements whose `overflow` is locked while the overlay is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollHost {
    Root,
    Body,
}

pub trait Document {
    /// `window.location.href`, or `None` when the navigation API cannot be
    /// read yet.
    fn location_href(&self) -> Option<String>;

    /// Raw document URL string.
    fn document_url(&self) -> String;

    fn ready_state(&self) -> ReadyState;

    fn has_root(&self) -> bool;

    fn has_body(&self) -> bool;

    /// Attach a fully built subtree in one operation: under the document root
    /// if present, else under the body.
    fn attach(&mut self, element: Element) -> Result<(), DomError>;

    /// Remove every element carrying `id`. Returns whether anything was removed.
    fn remove_by_id(&mut self, id: &str) -> bool;

    /// Replace all children of the element carrying `id`.
    fn replace_children(&mut self, id: &str, children: Vec<Element>) -> Result<(), DomError>;

    /// Set (`Some`) or clear (`None`) inline `overflow`. Returns `false` if the
    /// host element does not exist.
    fn set_overflow(&mut self, host: ScrollHost, value: Option<&str>) -> bool;

    /// Number of embedded media elements in the page.
    fn media_count(&self) -> usize;

    /// Pause one embedded media element. Third-party frames may refuse.
    fn pause_media(&mut self, index: usize) -> Result<(), DomError>;

    /// Current URL as the navigation watcher compares it.
    fn current_url(&self) -> String {
        self.location_href().unwrap_or_else(|| self.document_url())
    }

    /// Whether an attachment point for the overlay exists.
    fn can_attach(&self) -> bool {
        self.has_root() || self.has_body()
    }
}
