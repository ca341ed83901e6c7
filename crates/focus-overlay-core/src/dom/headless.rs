use std::collections::HashMap;

use super::{Document, Element, ReadyState, ScrollHost, OVERLAY_ID};
use crate::error::DomError;

/// Embedded media (video, audio, iframe player) inside a headless page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaElement {
    /// Served from another origin; pausing it is refused.
    pub cross_origin: bool,
    pub paused: bool,
}

/// In-memory [`Document`].
///
/// Tracks only what the overlay cares about: attachment points, attached
/// subtrees, inline overflow and media. Every mutating call bumps
/// [`mutation_count`](Self::mutation_count).
#[derive(Debug, Clone)]
pub struct HeadlessDocument {
    location: Option<String>,
    url: String,
    ready: ReadyState,
    root: bool,
    body: bool,
    attached: Vec<(ScrollHost, Element)>,
    overflow: HashMap<ScrollHost, String>,
    media: Vec<MediaElement>,
    mutations: usize,
}

impl HeadlessDocument {
    /// A fully parsed page at `url`.
    pub fn loaded(url: &str) -> Self {
        Self {
            location: Some(url.to_string()),
            url: url.to_string(),
            ready: ReadyState::Complete,
            root: true,
            body: true,
            attached: Vec::new(),
            overflow: HashMap::new(),
            media: Vec::new(),
            mutations: 0,
        }
    }

    /// A page still being parsed: root present, body not yet.
    pub fn loading(url: &str) -> Self {
        Self {
            ready: ReadyState::Loading,
            body: false,
            ..Self::loaded(url)
        }
    }

    /// The earliest possible phase: no elements and no usable `location`.
    pub fn document_start(url: &str) -> Self {
        Self {
            location: None,
            ready: ReadyState::Loading,
            root: false,
            body: false,
            ..Self::loaded(url)
        }
    }

    pub fn with_media(mut self, cross_origin: bool) -> Self {
        self.media.push(MediaElement {
            cross_origin,
            paused: false,
        });
        self
    }

    /// Client-side route change: URL moves, document stays.
    pub fn navigate(&mut self, url: &str) {
        self.location = Some(url.to_string());
        self.url = url.to_string();
    }

    pub fn set_ready_state(&mut self, ready: ReadyState) {
        self.ready = ready;
    }

    pub fn create_root(&mut self) {
        self.root = true;
    }

    pub fn create_body(&mut self) {
        self.body = true;
    }

    /// Parsing finished: both attachment points exist and `location` works.
    pub fn finish_parsing(&mut self) {
        self.root = true;
        self.body = true;
        if self.location.is_none() {
            self.location = Some(self.url.clone());
        }
        self.ready = ReadyState::Interactive;
    }

    pub fn overlay(&self) -> Option<&Element> {
        self.attached
            .iter()
            .find_map(|(_, el)| el.find_by_id(OVERLAY_ID))
    }

    pub fn overlay_count(&self) -> usize {
        let mut found = Vec::new();
        for (_, el) in &self.attached {
            el.find_all(&|e| e.id.as_deref() == Some(OVERLAY_ID), &mut found);
        }
        found.len()
    }

    /// Where the overlay got attached, if it is attached.
    pub fn overlay_host(&self) -> Option<ScrollHost> {
        self.attached
            .iter()
            .find(|(_, el)| el.find_by_id(OVERLAY_ID).is_some())
            .map(|(host, _)| *host)
    }

    pub fn overflow(&self, host: ScrollHost) -> Option<&str> {
        self.overflow.get(&host).map(String::as_str)
    }

    pub fn media(&self) -> &[MediaElement] {
        &self.media
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations
    }

    fn host_exists(&self, host: ScrollHost) -> bool {
        match host {
            ScrollHost::Root => self.root,
            ScrollHost::Body => self.body,
        }
    }
}

impl Document for HeadlessDocument {
    fn location_href(&self) -> Option<String> {
        self.location.clone()
    }

    fn document_url(&self) -> String {
        self.url.clone()
    }

    fn ready_state(&self) -> ReadyState {
        self.ready
    }

    fn has_root(&self) -> bool {
        self.root
    }

    fn has_body(&self) -> bool {
        self.body
    }

    fn attach(&mut self, element: Element) -> Result<(), DomError> {
        let host = if self.root {
            ScrollHost::Root
        } else if self.body {
            ScrollHost::Body
        } else {
            return Err(DomError::NoAttachmentPoint);
        };
        self.attached.push((host, element));
        self.mutations += 1;
        Ok(())
    }

    fn remove_by_id(&mut self, id: &str) -> bool {
        let before = self.attached.len();
        self.attached.retain(|(_, el)| el.id.as_deref() != Some(id));
        let mut removed = before - self.attached.len();
        for (_, el) in &mut self.attached {
            removed += el.remove_descendants_by_id(id);
        }
        if removed > 0 {
            self.mutations += 1;
        }
        removed > 0
    }

    fn replace_children(&mut self, id: &str, children: Vec<Element>) -> Result<(), DomError> {
        let target = self
            .attached
            .iter_mut()
            .find_map(|(_, el)| el.find_mut(&|e| e.id.as_deref() == Some(id)))
            .ok_or_else(|| DomError::NotFound(id.to_string()))?;
        target.children = children;
        self.mutations += 1;
        Ok(())
    }

    fn set_overflow(&mut self, host: ScrollHost, value: Option<&str>) -> bool {
        if !self.host_exists(host) {
            return false;
        }
        match value {
            Some(v) => {
                self.overflow.insert(host, v.to_string());
            }
            None => {
                self.overflow.remove(&host);
            }
        }
        self.mutations += 1;
        true
    }

    fn media_count(&self) -> usize {
        self.media.len()
    }

    fn pause_media(&mut self, index: usize) -> Result<(), DomError> {
        let media = self
            .media
            .get_mut(index)
            .ok_or_else(|| DomError::NotFound(format!("media[{index}]")))?;
        if media.cross_origin {
            return Err(DomError::CrossOrigin { index });
        }
        media.paused = true;
        self.mutations += 1;
        Ok(())
    }
}
