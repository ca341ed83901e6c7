//! Overlay renderer.
//!
//! Builds the full-viewport blocking layer, attaches it in one operation,
//! locks page scrolling while it is up and pauses embedded media. The
//! [`DecisionController`](crate::DecisionController) decides when; this module
//! only knows how.

pub mod input;
pub mod view;

pub use input::{Control, Disposition, InputEvent, InputKind, InputTarget, OverlayAction};
pub use view::{OverlayMode, OverlayView};

use tracing::debug;

use crate::dom::{Document, ScrollHost, OVERLAY_ID, PANEL_ID};

/// Hosts whose overflow we have set to `hidden`.
#[derive(Debug, Default, Clone, Copy)]
struct ScrollLock {
    root: bool,
    body: bool,
}

#[derive(Debug)]
pub struct OverlayRenderer {
    durations_min: Vec<u64>,
    view: Option<OverlayView>,
    /// Built but no attachment point existed yet.
    awaiting_attachment: bool,
    scroll: ScrollLock,
}

impl OverlayRenderer {
    pub fn new(durations_min: Vec<u64>) -> Self {
        Self {
            durations_min,
            view: None,
            awaiting_attachment: false,
            scroll: ScrollLock::default(),
        }
    }

    /// Current view, whether attached or still waiting for an attachment point.
    pub fn view(&self) -> Option<OverlayView> {
        self.view
    }

    pub fn is_attached(&self) -> bool {
        self.view.is_some() && !self.awaiting_attachment
    }

    pub fn is_awaiting_attachment(&self) -> bool {
        self.view.is_some() && self.awaiting_attachment
    }

    pub fn durations(&self) -> &[u64] {
        &self.durations_min
    }

    /// Replace any existing overlay with a fresh one showing `view`.
    pub fn mount<D: Document + ?Sized>(&mut self, doc: &mut D, view: OverlayView) {
        doc.remove_by_id(OVERLAY_ID);
        self.view = Some(view);
        self.try_attach(doc);
        self.lock_scroll(doc);
        self.pause_media(doc);
    }

    /// Swap the panel content for `view` without recreating the overlay.
    pub fn rerender<D: Document + ?Sized>(&mut self, doc: &mut D, view: OverlayView) {
        if self.view.is_none() {
            return;
        }
        self.view = Some(view);
        if self.awaiting_attachment {
            // Attached later with whatever the view is by then.
            return;
        }
        let children = view::render_panel(view, &self.durations_min);
        if let Err(error) = doc.replace_children(PANEL_ID, children) {
            debug!(%error, "overlay panel missing; re-attaching");
            doc.remove_by_id(OVERLAY_ID);
            self.try_attach(doc);
        }
    }

    /// Remove the overlay and restore scrolling. Returns whether an overlay
    /// was mounted.
    pub fn unmount<D: Document + ?Sized>(&mut self, doc: &mut D) -> bool {
        if self.view.take().is_none() {
            return false;
        }
        self.awaiting_attachment = false;
        doc.remove_by_id(OVERLAY_ID);
        doc.set_overflow(ScrollHost::Root, None);
        doc.set_overflow(ScrollHost::Body, None);
        self.scroll = ScrollLock::default();
        true
    }

    /// The document gained nodes. Finish a deferred attach or scroll lock.
    pub fn on_structure_changed<D: Document + ?Sized>(&mut self, doc: &mut D) {
        if self.view.is_none() {
            return;
        }
        if self.awaiting_attachment && doc.can_attach() {
            self.try_attach(doc);
        }
        self.lock_scroll(doc);
    }

    fn try_attach<D: Document + ?Sized>(&mut self, doc: &mut D) {
        let Some(view) = self.view else {
            return;
        };
        let element = view::render_overlay(view, &self.durations_min);
        match doc.attach(element) {
            Ok(()) => self.awaiting_attachment = false,
            Err(error) => {
                debug!(%error, "overlay attach deferred until the document has a root");
                self.awaiting_attachment = true;
            }
        }
    }

    fn lock_scroll<D: Document + ?Sized>(&mut self, doc: &mut D) {
        if !self.scroll.root {
            self.scroll.root = doc.set_overflow(ScrollHost::Root, Some("hidden"));
        }
        if !self.scroll.body {
            self.scroll.body = doc.set_overflow(ScrollHost::Body, Some("hidden"));
        }
    }

    fn pause_media<D: Document + ?Sized>(&mut self, doc: &mut D) {
        for index in 0..doc.media_count() {
            if let Err(error) = doc.pause_media(index) {
                debug!(index, %error, "could not pause embedded media");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HeadlessDocument;

    const LOCKED: OverlayView = OverlayView::Prompt {
        continue_enabled: false,
    };

    fn renderer() -> OverlayRenderer {
        OverlayRenderer::new(vec![1, 10, 20])
    }

    #[test]
    fn mount_attaches_and_locks_scroll() {
        let mut doc = HeadlessDocument::loaded("https://x.com/");
        let mut overlay = renderer();
        overlay.mount(&mut doc, LOCKED);
        assert!(overlay.is_attached());
        assert_eq!(doc.overlay_count(), 1);
        assert_eq!(doc.overflow(ScrollHost::Root), Some("hidden"));
        assert_eq!(doc.overflow(ScrollHost::Body), Some("hidden"));
    }

    #[test]
    fn mount_twice_keeps_single_instance() {
        let mut doc = HeadlessDocument::loaded("https://x.com/");
        let mut overlay = renderer();
        overlay.mount(&mut doc, LOCKED);
        overlay.mount(&mut doc, LOCKED);
        assert_eq!(doc.overlay_count(), 1);
    }

    #[test]
    fn unmount_restores_scroll() {
        let mut doc = HeadlessDocument::loaded("https://x.com/");
        let mut overlay = renderer();
        overlay.mount(&mut doc, LOCKED);
        assert!(overlay.unmount(&mut doc));
        assert_eq!(doc.overlay_count(), 0);
        assert_eq!(doc.overflow(ScrollHost::Root), None);
        assert_eq!(doc.overflow(ScrollHost::Body), None);
        assert!(!overlay.unmount(&mut doc));
    }

    #[test]
    fn unmount_without_overlay_leaves_document_alone() {
        let mut doc = HeadlessDocument::loaded("https://y.com/");
        let mut overlay = renderer();
        assert!(!overlay.unmount(&mut doc));
        assert_eq!(doc.mutation_count(), 0);
    }

    #[test]
    fn attach_waits_for_attachment_point() {
        let mut doc = HeadlessDocument::document_start("https://x.com/");
        let mut overlay = renderer();
        overlay.mount(&mut doc, LOCKED);
        assert!(overlay.is_awaiting_attachment());
        assert_eq!(doc.overlay_count(), 0);

        overlay.rerender(&mut doc, OverlayView::DurationPicker);
        doc.create_root();
        overlay.on_structure_changed(&mut doc);
        assert!(overlay.is_attached());
        assert!(doc
            .overlay()
            .unwrap()
            .text_content()
            .contains(view::PICKER_TITLE));
        assert_eq!(doc.overflow(ScrollHost::Root), Some("hidden"));

        doc.create_body();
        overlay.on_structure_changed(&mut doc);
        assert_eq!(doc.overflow(ScrollHost::Body), Some("hidden"));
    }

    #[test]
    fn rerender_replaces_panel_in_place() {
        let mut doc = HeadlessDocument::loaded("https://x.com/");
        let mut overlay = renderer();
        overlay.mount(&mut doc, LOCKED);
        overlay.rerender(&mut doc, OverlayView::DurationPicker);
        assert_eq!(doc.overlay_count(), 1);
        let text = doc.overlay().unwrap().text_content();
        assert!(text.contains("10 min"));
        assert!(!text.contains(view::CONTINUE_LABEL));
    }

    #[test]
    fn media_pause_errors_are_ignored() {
        let mut doc = HeadlessDocument::loaded("https://x.com/")
            .with_media(true)
            .with_media(false);
        let mut overlay = renderer();
        overlay.mount(&mut doc, LOCKED);
        assert!(overlay.is_attached());
        assert!(!doc.media()[0].paused);
        assert!(doc.media()[1].paused);
    }
}
