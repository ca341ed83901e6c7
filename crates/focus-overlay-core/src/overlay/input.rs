//! Input interception.
//!
//! Everything outside the panel is swallowed. Inside the panel pointer, wheel
//! and touch input pass; keyboard input passes only for Enter and Space so a
//! focused control can still be activated. The session-ended notice swallows
//! everything.

use serde::{Deserialize, Serialize};

use super::view::{OverlayView, ACTION_CONTINUE, ACTION_UNLOCK};
use crate::dom::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Click,
    MouseDown,
    Wheel,
    TouchStart,
    TouchMove,
    KeyDown,
}

/// An overlay control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Continue,
    Duration(u64),
}

impl Control {
    /// Identify a rendered control by its `data-action` attribute.
    pub fn from_element(el: &Element) -> Option<Self> {
        match el.attr("data-action")? {
            ACTION_CONTINUE => Some(Control::Continue),
            ACTION_UNLOCK => el
                .attr("data-minutes")
                .and_then(|m| m.parse().ok())
                .map(Control::Duration),
            _ => None,
        }
    }
}

/// Where an input event landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputTarget {
    /// Page content, e.g. a focused element under the overlay.
    Page,
    /// The overlay outside the panel.
    Backdrop,
    /// Non-control content inside the panel.
    Panel,
    Control(Control),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    pub kind: InputKind,
    pub target: InputTarget,
    /// `KeyboardEvent.key` for key events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl InputEvent {
    pub fn new(kind: InputKind, target: InputTarget) -> Self {
        Self {
            kind,
            target,
            key: None,
        }
    }

    pub fn click(target: InputTarget) -> Self {
        Self::new(InputKind::Click, target)
    }

    pub fn key_down(target: InputTarget, key: &str) -> Self {
        Self {
            kind: InputKind::KeyDown,
            target,
            key: Some(key.to_string()),
        }
    }

    fn is_activation_key(&self) -> bool {
        self.kind == InputKind::KeyDown && matches!(self.key.as_deref(), Some("Enter") | Some(" "))
    }

    /// A click, or Enter/Space on a focused control.
    fn is_activation(&self) -> bool {
        self.kind == InputKind::Click || self.is_activation_key()
    }
}

/// What the page should do with an intercepted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Default behaviour proceeds.
    PassThrough,
    /// `stopPropagation` + `preventDefault`.
    Blocked,
}

/// Overlay-level effect of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    ShowDurationPicker,
    SelectDuration(u64),
}

pub fn intercept(view: OverlayView, event: &InputEvent) -> Disposition {
    if !view.is_interactive() {
        return Disposition::Blocked;
    }
    let in_panel = match event.target {
        InputTarget::Page | InputTarget::Backdrop => false,
        InputTarget::Panel | InputTarget::Control(_) => true,
    };
    if !in_panel {
        return Disposition::Blocked;
    }
    if event.kind == InputKind::KeyDown && !event.is_activation_key() {
        return Disposition::Blocked;
    }
    // A disabled control swallows its own activation.
    if event.target == InputTarget::Control(Control::Continue)
        && view == (OverlayView::Prompt { continue_enabled: false })
        && event.is_activation()
    {
        return Disposition::Blocked;
    }
    Disposition::PassThrough
}

pub fn action_for(view: OverlayView, event: &InputEvent) -> Option<OverlayAction> {
    if !event.is_activation() {
        return None;
    }
    match (view, event.target) {
        (OverlayView::Prompt { continue_enabled: true }, InputTarget::Control(Control::Continue)) => {
            Some(OverlayAction::ShowDurationPicker)
        }
        (OverlayView::DurationPicker, InputTarget::Control(Control::Duration(minutes))) => {
            Some(OverlayAction::SelectDuration(minutes))
        }
        _ => None,
    }
}
