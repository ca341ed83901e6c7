//! Overlay content per mode. Each mode renders its panel from scratch.

use serde::{Deserialize, Serialize};

use crate::dom::{Element, OVERLAY_ID, PANEL_ID};

pub const PROMPT_TITLE: &str = "Focus Mode Active";
pub const PROMPT_MESSAGE: &str = "This site is blocked to help you stay focused.";
pub const CONTINUE_LABEL: &str = "Continue Anyway";
pub const PICKER_TITLE: &str = "Choose Unlock Duration";
pub const PICKER_SUBTITLE: &str = "Select how long you want to unlock this site:";
pub const SESSION_ENDED_TITLE: &str = "Session Ended";
pub const SESSION_ENDED_MESSAGE: &str =
    "Your unlock period has expired. This site is now blocked again.";

/// `data-action` values on overlay controls.
pub const ACTION_CONTINUE: &str = "continue";
pub const ACTION_UNLOCK: &str = "unlock";

const CONTAINER_STYLE: &str = "position: fixed !important; inset: 0 !important; \
     width: 100vw !important; height: 100vh !important; \
     z-index: 2147483647 !important; display: flex !important; \
     align-items: center !important; justify-content: center !important; \
     pointer-events: auto !important; overflow: hidden !important;";

/// Which content the overlay shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OverlayView {
    /// Initial block. The control stays disabled until the cooldown elapses.
    Prompt { continue_enabled: bool },
    DurationPicker,
    /// Terminal notice after a grant lapsed on an open page.
    SessionEnded,
}

/// [`OverlayView`] without per-mode state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayMode {
    Prompt,
    DurationPicker,
    SessionEnded,
}

impl OverlayView {
    pub fn mode(&self) -> OverlayMode {
        match self {
            OverlayView::Prompt { .. } => OverlayMode::Prompt,
            OverlayView::DurationPicker => OverlayMode::DurationPicker,
            OverlayView::SessionEnded => OverlayMode::SessionEnded,
        }
    }

    pub fn is_interactive(&self) -> bool {
        !matches!(self, OverlayView::SessionEnded)
    }
}

/// The complete overlay subtree: full-viewport container plus panel.
pub fn render_overlay(view: OverlayView, durations_min: &[u64]) -> Element {
    let mut container = Element::new("div")
        .with_id(OVERLAY_ID)
        .with_attr("role", "dialog")
        .with_attr("aria-modal", "true")
        .with_attr("style", CONTAINER_STYLE);
    if view == OverlayView::SessionEnded {
        container = container.with_class("session-ended");
    }
    container.with_child(
        Element::new("div")
            .with_id(PANEL_ID)
            .with_class("overlay-content")
            .with_children(render_panel(view, durations_min)),
    )
}

/// Children of the panel for `view`.
pub fn render_panel(view: OverlayView, durations_min: &[u64]) -> Vec<Element> {
    match view {
        OverlayView::Prompt { continue_enabled } => {
            let mut button = Element::new("button")
                .with_class("overlay-button")
                .with_attr("data-action", ACTION_CONTINUE)
                .with_text(CONTINUE_LABEL);
            if !continue_enabled {
                button = button.with_attr("disabled", "");
            }
            vec![title(PROMPT_TITLE), message(PROMPT_MESSAGE, false), button]
        }
        OverlayView::DurationPicker => {
            let options = Element::new("div")
                .with_class("time-options")
                .with_children(durations_min.iter().map(|&minutes| {
                    Element::new("button")
                        .with_class("time-button")
                        .with_attr("data-action", ACTION_UNLOCK)
                        .with_attr("data-minutes", minutes.to_string())
                        .with_text(format!("{minutes} min"))
                }));
            vec![
                title(PICKER_TITLE),
                Element::new("p")
                    .with_class("time-subtitle")
                    .with_text(PICKER_SUBTITLE),
                options,
            ]
        }
        OverlayView::SessionEnded => vec![
            title(SESSION_ENDED_TITLE),
            message(SESSION_ENDED_MESSAGE, true),
        ],
    }
}

fn title(text: &str) -> Element {
    Element::new("h1").with_class("overlay-title").with_text(text)
}

fn message(text: &str, session_ended: bool) -> Element {
    let el = Element::new("p").with_class("overlay-message").with_text(text);
    if session_ended {
        el.with_class("session-ended")
    } else {
        el
    }
}
