// SPDX-License-Identifier: GPL-3.0-only

//! Live video overlay pipeline
//!
//! [`Pipeline`] owns the capture graph and drives its state machine:
//!
//! ```text
//! Stopped --start--> Playing <--toggle_pause--> Paused
//!    ^                  |                          |
//!    +------stop--------+--------------------------+
//! any --graph error--> Errored (stop still cleans up, frame pulls fail)
//! ```
//!
//! Two locks guard the shared state. The graph lock serializes frame pulls
//! against state changes; the overlay lock (inside [`OverlayRegistry`])
//! serializes overlay mutation against the draw callback on the streaming
//! thread. No operation holds both.

pub mod builder;
pub mod display;
pub mod frame;
pub mod status;

pub use builder::{CaptureSource, PipelineOptions, build, build_with};
pub use display::{DisplaySurface, UiAction};
pub use frame::Frame;
pub use status::ErrorStatus;

use crate::constants::timing;
use crate::errors::{OverlayError, PipelineError, PipelineResult};
use crate::overlay::{Overlay, OverlayRegistry};
use crate::sync::{GraphGuard, GraphLock};
use builder::MediaGraph;
use gstreamer::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Stopped,
    Playing,
    Paused,
    /// Terminal; only cleanup is possible
    Errored,
}

impl PipelineState {
    fn to_u8(self) -> u8 {
        match self {
            PipelineState::Stopped => 0,
            PipelineState::Playing => 1,
            PipelineState::Paused => 2,
            PipelineState::Errored => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => PipelineState::Playing,
            2 => PipelineState::Paused,
            3 => PipelineState::Errored,
            _ => PipelineState::Stopped,
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Stopped => write!(f, "stopped"),
            PipelineState::Playing => write!(f, "playing"),
            PipelineState::Paused => write!(f, "paused"),
            PipelineState::Errored => write!(f, "errored"),
        }
    }
}

/// The capture/display graph plus its overlays.
///
/// All methods take `&self`; share it across threads with an `Arc` (for
/// example to call [`Pipeline::stop`] from a signal handler).
pub struct Pipeline {
    graph: GraphLock<MediaGraph>,
    display: DisplaySurface,
    bus: gstreamer::Bus,
    overlays: Arc<OverlayRegistry>,
    status: Arc<ErrorStatus>,
    state: AtomicU8,
    /// Raised by `stop` before it waits for the graph lock
    stop_requested: AtomicBool,
    frame_timeout: Duration,
    frames_pulled: AtomicU64,
}

impl Pipeline {
    pub(crate) fn from_parts(
        graph: MediaGraph,
        display: DisplaySurface,
        bus: gstreamer::Bus,
        overlays: Arc<OverlayRegistry>,
        status: Arc<ErrorStatus>,
        frame_timeout: Duration,
    ) -> Self {
        Self {
            graph: GraphLock::new(graph),
            display,
            bus,
            overlays,
            status,
            state: AtomicU8::new(PipelineState::Stopped.to_u8()),
            stop_requested: AtomicBool::new(false),
            frame_timeout,
            frames_pulled: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: PipelineState) {
        let previous = PipelineState::from_u8(self.state.swap(state.to_u8(), Ordering::AcqRel));
        if previous != state {
            debug!(from = %previous, to = %state, "Pipeline state changed");
        }
    }

    /// Playing or paused
    pub fn is_running(&self) -> bool {
        matches!(self.state(), PipelineState::Playing | PipelineState::Paused)
    }

    pub fn error_occurred(&self) -> bool {
        self.status.occurred()
    }

    pub fn last_error(&self) -> Option<String> {
        self.status.last()
    }

    pub fn display(&self) -> &DisplaySurface {
        &self.display
    }

    pub fn frame_timeout(&self) -> Duration {
        self.frame_timeout
    }

    fn fail(&self, error: PipelineError) -> PipelineError {
        self.status.record(error.to_string());
        error
    }

    fn errored(&self) -> PipelineError {
        PipelineError::Errored(
            self.status
                .last()
                .unwrap_or_else(|| "unknown error".to_string()),
        )
    }

    /// Stopped → Playing
    pub fn start(&self) -> PipelineResult<()> {
        let graph = self.graph.acquire();
        match self.state() {
            PipelineState::Playing | PipelineState::Paused => {
                debug!("Pipeline already running");
                return Ok(());
            }
            PipelineState::Errored => return Err(self.errored()),
            PipelineState::Stopped => {}
        }

        info!("Starting pipeline");
        self.stop_requested.store(false, Ordering::Release);
        self.display.show();

        let started = graph
            .pipeline
            .set_state(gstreamer::State::Playing)
            .map(|_| ())
            .map_err(|e| e.to_string())
            .and_then(|_| {
                let (result, state, pending) = graph.pipeline.state(
                    gstreamer::ClockTime::from_seconds(timing::START_TIMEOUT_SECS),
                );
                debug!(result = ?result, state = ?state, pending = ?pending, "Pipeline state after start");
                result.map(|_| ()).map_err(|e| e.to_string())
            });

        if let Err(reason) = started {
            // The bus usually carries the detailed reason (missing device etc.)
            let detail = self
                .bus
                .pop_filtered(&[gstreamer::MessageType::Error])
                .and_then(|message| match message.view() {
                    gstreamer::MessageView::Error(err) => Some(err.error().to_string()),
                    _ => None,
                })
                .unwrap_or(reason);
            let _ = graph.pipeline.set_state(gstreamer::State::Null);
            self.display.hide();
            self.set_state(PipelineState::Errored);
            return Err(self.fail(PipelineError::StartFailed(detail)));
        }

        self.set_state(PipelineState::Playing);
        info!("Pipeline playing");
        Ok(())
    }

    /// Any state → Stopped. Best effort and idempotent.
    ///
    /// A pending [`Pipeline::get_frame`] on another thread returns
    /// [`PipelineError::Interrupted`] within one poll interval.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        let graph = self.graph.acquire();
        self.stop_locked(&graph);
    }

    fn stop_locked(&self, graph: &GraphGuard<'_, MediaGraph>) {
        if let Err(e) = graph.pipeline.set_state(gstreamer::State::Null) {
            warn!(error = %e, "Failed to set pipeline to Null");
        }
        let (result, state, _) = graph
            .pipeline
            .state(gstreamer::ClockTime::from_seconds(timing::STOP_TIMEOUT_SECS));
        if result.is_err() {
            debug!(state = ?state, "Pipeline state change had issues during stop");
        }
        self.display.hide();

        if self.state() != PipelineState::Errored {
            if self.state() != PipelineState::Stopped {
                info!("Pipeline stopped");
            }
            self.set_state(PipelineState::Stopped);
        }
    }

    /// Playing ↔ Paused; ignored in any other state
    pub fn toggle_pause(&self) {
        let graph = self.graph.acquire();
        let tracked = self.state();
        if !matches!(tracked, PipelineState::Playing | PipelineState::Paused) {
            debug!(state = %tracked, "Ignoring pause toggle");
            return;
        }

        // Trust the graph when it has settled, the tracked state otherwise
        let (result, current, pending) = graph.pipeline.state(
            gstreamer::ClockTime::from_seconds(timing::STATE_QUERY_TIMEOUT_SECS),
        );
        let actual = match (result, current, pending) {
            (Ok(_), gstreamer::State::Playing, gstreamer::State::VoidPending) => {
                PipelineState::Playing
            }
            (Ok(_), gstreamer::State::Paused, gstreamer::State::VoidPending) => {
                PipelineState::Paused
            }
            _ => tracked,
        };

        let (target, next) = match actual {
            PipelineState::Playing => (gstreamer::State::Paused, PipelineState::Paused),
            _ => (gstreamer::State::Playing, PipelineState::Playing),
        };

        match graph.pipeline.set_state(target) {
            Ok(_) => {
                info!(state = %next, "Toggled pause");
                self.set_state(next);
            }
            Err(e) => {
                self.fail(PipelineError::InvalidState(format!(
                    "Failed to switch to {}: {}",
                    next, e
                )));
            }
        }
    }

    /// Pull the newest frame.
    ///
    /// Pending UI events are handled first. While playing this waits for the
    /// next sample; while paused it returns the last one shown.
    pub fn get_frame(&self) -> PipelineResult<Frame> {
        self.pump_events();

        let graph = self.graph.acquire();
        let result = match self.state() {
            PipelineState::Playing => self.pull_playing(&graph),
            PipelineState::Paused => self.pull_paused(&graph),
            PipelineState::Errored => Err(self.errored()),
            PipelineState::Stopped => Err(PipelineError::InvalidState(
                "cannot pull a frame while stopped".to_string(),
            )),
        };
        drop(graph);

        match result {
            Ok(frame) => {
                let count = self.frames_pulled.fetch_add(1, Ordering::Relaxed) + 1;
                if count % timing::FRAME_LOG_INTERVAL == 0 {
                    debug!(
                        frames = count,
                        width = frame.width,
                        height = frame.height,
                        format = %frame.format,
                        "Frame pulled"
                    );
                }
                Ok(frame)
            }
            Err(PipelineError::Interrupted) => {
                debug!("Frame pull interrupted by stop");
                Err(PipelineError::Interrupted)
            }
            Err(e @ PipelineError::Errored(_)) => Err(e),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn pull_playing(&self, graph: &MediaGraph) -> PipelineResult<Frame> {
        let deadline = Instant::now() + self.frame_timeout;
        let slice = gstreamer::ClockTime::from_mseconds(timing::POLL_INTERVAL.as_millis() as u64);
        loop {
            if self.stop_requested.load(Ordering::Acquire) {
                return Err(PipelineError::Interrupted);
            }
            if let Some(sample) = graph.appsink.try_pull_sample(slice) {
                return Frame::from_sample(&sample);
            }
            if graph.appsink.is_eos() {
                return Err(PipelineError::NoFrame("end of stream".to_string()));
            }
            if Instant::now() >= deadline {
                return Err(PipelineError::NoFrame(format!(
                    "no frame within {} ms",
                    self.frame_timeout.as_millis()
                )));
            }
        }
    }

    fn pull_paused(&self, graph: &MediaGraph) -> PipelineResult<Frame> {
        if self.stop_requested.load(Ordering::Acquire) {
            return Err(PipelineError::Interrupted);
        }
        let preroll = graph.appsink.try_pull_preroll(gstreamer::ClockTime::from_mseconds(
            timing::PREROLL_TIMEOUT.as_millis() as u64,
        ));
        // Live sources do not preroll; fall back to the last sample shown
        let sample = preroll.or_else(|| {
            graph
                .appsink
                .property::<Option<gstreamer::Sample>>("last-sample")
        });
        match sample {
            Some(sample) => Frame::from_sample(&sample),
            None => Err(PipelineError::NoFrame(
                "paused before any frame arrived".to_string(),
            )),
        }
    }

    /// Handle pending bus messages without blocking.
    ///
    /// Called by [`Pipeline::get_frame`]; callers that do not pull frames call
    /// it from their own loop.
    pub fn pump_events(&self) {
        while let Some(message) = self.bus.pop() {
            self.handle_message(&message);
        }
    }

    fn handle_message(&self, message: &gstreamer::Message) {
        use gstreamer::MessageView;

        match message.view() {
            MessageView::Eos(..) => {
                info!("End of stream");
                self.stop();
            }
            MessageView::Error(err) => {
                let source = message
                    .src()
                    .map(|s| s.path_string().to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                if self.display.is_windowed() && self.display.is_source_of(message) {
                    info!(error = %err.error(), "Preview window closed");
                    self.stop();
                    return;
                }
                let error = PipelineError::Graph {
                    source,
                    message: err.error().to_string(),
                };
                if let Some(debug_info) = err.debug() {
                    debug!(debug = %debug_info, "Graph error details");
                }
                self.fail(error);
                self.set_state(PipelineState::Errored);
                self.stop();
            }
            MessageView::Warning(w) => {
                warn!(warning = %w.error(), "Graph warning");
            }
            MessageView::Application(_) => {
                if let Some(key) = display::key_from_message(message) {
                    self.handle_key(&key);
                }
            }
            MessageView::StateChanged(_) => {}
            _ => {
                debug!(message_type = ?message.type_(), "Unhandled bus message");
            }
        }
    }

    fn handle_key(&self, key: &str) {
        match display::action_for_key(key) {
            Some(UiAction::Stop) => {
                info!(key, "Stop requested from preview window");
                self.stop();
            }
            Some(UiAction::TogglePause) => self.toggle_pause(),
            None => debug!(key, "Ignoring key"),
        }
    }

    /// The overlays drawn on every displayed frame
    pub fn overlays(&self) -> &OverlayRegistry {
        &self.overlays
    }

    pub fn add_overlay(&self, overlay: Overlay) -> Result<(), OverlayError> {
        self.overlays.add(overlay)
    }

    pub fn clear_overlays(&self) {
        self.overlays.clear();
    }

    /// Replace all overlays atomically with respect to the draw callback
    pub fn replace_overlays(&self, overlays: Vec<Overlay>) -> Vec<OverlayError> {
        self.overlays.replace(overlays)
    }

    /// Tear down the pipeline. Equivalent to dropping it.
    pub fn free(self) {}
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        info!("Releasing pipeline");
        let graph = self.graph.get_mut();
        // Callbacks go first so none fires against a half-released graph
        for (pad, id) in graph.probes.drain(..) {
            pad.remove_probe(id);
        }
        if let Err(e) = graph.pipeline.set_state(gstreamer::State::Null) {
            warn!(error = %e, "Failed to set pipeline to Null during teardown");
        }
        self.display.hide();
        self.bus.set_flushing(true);
        self.overlays.clear();
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("state", &self.state())
            .field("error", &self.status.last())
            .field("overlays", &self.overlays.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::pipeline::KEY_MESSAGE;

    /// A started test-pattern pipeline, or `None` when GStreamer is missing
    fn playing(want_gui: bool) -> Option<Pipeline> {
        if gstreamer::init().is_err() {
            return None;
        }
        let options = PipelineOptions {
            source: CaptureSource::TestPattern,
            want_gui,
            display_sink: Some("fakesink".to_string()),
            ..PipelineOptions::default()
        };
        let pipeline = build_with(&options).ok()?;
        pipeline.start().ok()?;
        Some(pipeline)
    }

    fn post_key(pipeline: &Pipeline, key: &str) {
        let structure = gstreamer::Structure::builder(KEY_MESSAGE)
            .field("key", key)
            .build();
        pipeline
            .bus
            .post(gstreamer::message::Application::new(structure))
            .unwrap();
    }

    fn post_error_from(pipeline: &Pipeline, element_name: &str) {
        let element = {
            let graph = pipeline.graph.acquire();
            graph.pipeline.by_name(element_name).unwrap()
        };
        let message = gstreamer::message::Error::builder(gstreamer::CoreError::Failed, "boom")
            .src(&element)
            .build();
        pipeline.bus.post(message).unwrap();
    }

    #[test]
    fn test_stop_keys() {
        for key in ["q", "Q", "Escape"] {
            let Some(pipeline) = playing(true) else {
                return;
            };
            post_key(&pipeline, key);
            pipeline.pump_events();
            assert_eq!(pipeline.state(), PipelineState::Stopped, "key {}", key);
            assert!(!pipeline.error_occurred());
        }
    }

    #[test]
    fn test_pause_keys_toggle() {
        let Some(pipeline) = playing(true) else {
            return;
        };
        post_key(&pipeline, "p");
        pipeline.pump_events();
        assert_eq!(pipeline.state(), PipelineState::Paused);

        post_key(&pipeline, "space");
        pipeline.pump_events();
        assert_eq!(pipeline.state(), PipelineState::Playing);
    }

    #[test]
    fn test_unmapped_key_ignored() {
        let Some(pipeline) = playing(true) else {
            return;
        };
        post_key(&pipeline, "x");
        pipeline.pump_events();
        assert_eq!(pipeline.state(), PipelineState::Playing);
    }

    #[test]
    fn test_end_of_stream_stops() {
        let Some(pipeline) = playing(false) else {
            return;
        };
        pipeline.bus.post(gstreamer::message::Eos::new()).unwrap();
        pipeline.pump_events();
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert!(!pipeline.error_occurred());
    }

    #[test]
    fn test_window_error_stops() {
        let Some(pipeline) = playing(true) else {
            return;
        };
        post_error_from(&pipeline, "display_sink");
        pipeline.pump_events();
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert!(!pipeline.error_occurred());

        // A closed window does not prevent a restart
        pipeline.start().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Playing);
    }

    #[test]
    fn test_graph_error_is_sticky() {
        let Some(pipeline) = playing(true) else {
            return;
        };
        post_error_from(&pipeline, "source");
        pipeline.pump_events();
        assert_eq!(pipeline.state(), PipelineState::Errored);
        assert!(pipeline.error_occurred());
        assert!(pipeline.last_error().unwrap().contains("boom"));

        assert!(matches!(pipeline.get_frame(), Err(PipelineError::Errored(_))));
        assert!(matches!(pipeline.start(), Err(PipelineError::Errored(_))));
        pipeline.stop();
        assert_eq!(pipeline.state(), PipelineState::Errored);
    }

    #[test]
    fn test_headless_sink_error_is_a_graph_error() {
        let Some(pipeline) = playing(false) else {
            return;
        };
        post_error_from(&pipeline, "display_sink");
        pipeline.pump_events();
        assert_eq!(pipeline.state(), PipelineState::Errored);
        assert!(pipeline.error_occurred());
    }

    #[test]
    fn test_state_encoding() {
        for state in [
            PipelineState::Stopped,
            PipelineState::Playing,
            PipelineState::Paused,
            PipelineState::Errored,
        ] {
            assert_eq!(PipelineState::from_u8(state.to_u8()), state);
        }
    }
}
