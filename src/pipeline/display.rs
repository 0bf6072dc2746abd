// SPDX-License-Identifier: GPL-3.0-only

//! Presentation surface and keyboard handling
//!
//! The window belongs to the display sink: it appears when the graph starts
//! playing and goes away when the graph is set to Null. Key presses arrive as
//! upstream navigation events on the streaming thread. They are re-posted to
//! the bus so the controller handles them on the application thread, where
//! changing graph state is allowed.

use crate::constants::pipeline::KEY_MESSAGE;
use gstreamer::prelude::*;
use gstreamer_video::NavigationEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// What a key press asks the controller to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Stop,
    TogglePause,
}

/// Map a navigation key name to an action
pub fn action_for_key(key: &str) -> Option<UiAction> {
    match key {
        "Escape" | "q" | "Q" => Some(UiAction::Stop),
        "p" | "space" | " " => Some(UiAction::TogglePause),
        _ => None,
    }
}

/// The display sink and whether it shows a window
#[derive(Debug)]
pub struct DisplaySurface {
    sink: gstreamer::Element,
    windowed: bool,
    visible: AtomicBool,
}

impl DisplaySurface {
    pub(crate) fn new(sink: gstreamer::Element, windowed: bool) -> Self {
        Self {
            sink,
            windowed,
            visible: AtomicBool::new(false),
        }
    }

    pub fn is_windowed(&self) -> bool {
        self.windowed
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    pub(crate) fn show(&self) {
        if self.windowed && !self.visible.swap(true, Ordering::AcqRel) {
            info!(sink = %self.sink.name(), "Showing preview window");
        }
    }

    pub(crate) fn hide(&self) {
        if self.windowed && self.visible.swap(false, Ordering::AcqRel) {
            info!(sink = %self.sink.name(), "Hiding preview window");
        }
    }

    /// Whether a bus message came from the display sink or one of its children
    pub(crate) fn is_source_of(&self, message: &gstreamer::Message) -> bool {
        message
            .src()
            .map(|src| src == self.sink.upcast_ref::<gstreamer::Object>() || src.has_as_ancestor(&self.sink))
            .unwrap_or(false)
    }
}

/// Watch the display sink for key presses and forward them to `bus`
pub(crate) fn install_key_probe(
    sink: &gstreamer::Element,
    bus: gstreamer::Bus,
) -> Option<(gstreamer::Pad, gstreamer::PadProbeId)> {
    let pad = sink.static_pad("sink")?;
    let id = pad.add_probe(gstreamer::PadProbeType::EVENT_UPSTREAM, move |_, info| {
        if let Some(gstreamer::PadProbeData::Event(ref event)) = info.data {
            if let Ok(NavigationEvent::KeyPress { key, .. }) = NavigationEvent::parse(event) {
                debug!(key = %key, "Key pressed in preview window");
                let structure = gstreamer::Structure::builder(KEY_MESSAGE)
                    .field("key", key.as_str())
                    .build();
                if let Err(e) = bus.post(gstreamer::message::Application::new(structure)) {
                    warn!(error = %e, "Failed to forward key press");
                }
            }
        }
        gstreamer::PadProbeReturn::Ok
    })?;
    Some((pad, id))
}

/// Extract the key name from a forwarded key press message
pub(crate) fn key_from_message(message: &gstreamer::Message) -> Option<String> {
    let gstreamer::MessageView::Application(app) = message.view() else {
        return None;
    };
    let structure = app.structure()?;
    if structure.name() != KEY_MESSAGE {
        return None;
    }
    structure.get::<String>("key").ok()
}
