// SPDX-License-Identifier: GPL-3.0-only

//! Capture and display graph construction
//!
//! ```text
//! source → source_capsfilter → source_convert → source_flip → tee
//!   tee → appsink_queue → appsink_convert → appsink_capsfilter → appsink
//!   tee → overlay_queue → overlay_convert → overlay_capsfilter → overlay
//!       → display_queue → display_convert → display_sink
//! ```
//!
//! Every element creation, add and link is checked individually. The first
//! failure aborts construction and the partial graph is dropped.

use super::Pipeline;
use super::display::{DisplaySurface, install_key_probe};
use super::status::ErrorStatus;
use crate::constants::{capture, pipeline, timing};
use crate::errors::{BuildStage, PipelineError, PipelineResult};
use crate::overlay::{Canvas, OverlayRegistry};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::{VideoFrameExt, VideoFrameRef, VideoInfo};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSource {
    /// A V4L2 device node such as `/dev/video0`
    Device(String),
    /// GStreamer's live test pattern
    TestPattern,
}

impl CaptureSource {
    /// Interpret a device path; `test` selects the test pattern
    pub fn from_path(path: &str) -> Self {
        if path == capture::TEST_PATTERN_DEVICE {
            CaptureSource::TestPattern
        } else {
            CaptureSource::Device(path.to_string())
        }
    }
}

impl std::fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureSource::Device(path) => write!(f, "{}", path),
            CaptureSource::TestPattern => write!(f, "test pattern"),
        }
    }
}

/// Everything the builder needs to know
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub source: CaptureSource,
    /// Open a preview window
    pub want_gui: bool,
    pub width: u32,
    pub height: u32,
    /// Mirror the image horizontally
    pub mirror: bool,
    /// Upper bound on one `get_frame` call
    pub frame_timeout: Duration,
    /// Replace the display sink factory (defaults to `autovideosink` or `fakesink`)
    pub display_sink: Option<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            source: CaptureSource::Device(capture::DEFAULT_DEVICE.to_string()),
            want_gui: false,
            width: capture::DEFAULT_WIDTH,
            height: capture::DEFAULT_HEIGHT,
            mirror: true,
            frame_timeout: Duration::from_millis(timing::DEFAULT_FRAME_TIMEOUT_MS),
            display_sink: None,
        }
    }
}

impl PipelineOptions {
    pub fn new(device_path: &str, want_gui: bool) -> Self {
        Self {
            source: CaptureSource::from_path(device_path),
            want_gui,
            ..Default::default()
        }
    }

    fn display_factory(&self) -> &str {
        match (&self.display_sink, self.want_gui) {
            (Some(factory), _) => factory,
            (None, true) => "autovideosink",
            (None, false) => "fakesink",
        }
    }
}

/// The graph and the handles the controller needs, owned by the graph lock
#[derive(Debug)]
pub(crate) struct MediaGraph {
    pub(crate) pipeline: gstreamer::Pipeline,
    pub(crate) appsink: AppSink,
    /// Installed probes, removed before the graph is released
    pub(crate) probes: Vec<(gstreamer::Pad, gstreamer::PadProbeId)>,
}

/// Build a pipeline for `device_path` with default options
pub fn build(device_path: &str, want_gui: bool) -> PipelineResult<Pipeline> {
    build_with(&PipelineOptions::new(device_path, want_gui))
}

/// Build a pipeline from explicit options
pub fn build_with(options: &PipelineOptions) -> PipelineResult<Pipeline> {
    info!(
        source = %options.source,
        gui = options.want_gui,
        width = options.width,
        height = options.height,
        mirror = options.mirror,
        "Building overlay pipeline"
    );

    gstreamer::init()?;

    let overlays = Arc::new(OverlayRegistry::new());
    let status = Arc::new(ErrorStatus::new());

    let result = GraphBuilder::new().assemble(options, &overlays, &status);
    let (graph, display, bus) = match result {
        Ok(parts) => parts,
        Err(e) => {
            error!(error = %e, "Pipeline construction failed");
            return Err(e);
        }
    };

    info!("Overlay pipeline constructed");
    Ok(Pipeline::from_parts(
        graph,
        display,
        bus,
        overlays,
        status,
        options.frame_timeout,
    ))
}

struct GraphBuilder {
    pipeline: gstreamer::Pipeline,
}

impl GraphBuilder {
    fn new() -> Self {
        Self {
            pipeline: gstreamer::Pipeline::with_name(pipeline::GRAPH_NAME),
        }
    }

    /// Create an element and add it to the graph
    fn element(&self, factory: &str, name: &str) -> PipelineResult<gstreamer::Element> {
        let element = gstreamer::ElementFactory::make(factory)
            .name(name)
            .build()
            .map_err(|e| {
                PipelineError::construction(
                    BuildStage::Element,
                    format!("Failed to create {} ({}): {}", name, factory, e),
                )
            })?;
        self.pipeline.add(&element).map_err(|e| {
            PipelineError::construction(
                BuildStage::Add,
                format!("Failed to add {} to the graph: {}", name, e),
            )
        })?;
        debug!(name, factory, "Added element");
        Ok(element)
    }

    fn capsfilter(&self, name: &str, caps: gstreamer::Caps) -> PipelineResult<gstreamer::Element> {
        let filter = self.element("capsfilter", name)?;
        filter.set_property("caps", &caps);
        Ok(filter)
    }

    fn link_chain(chain: &[&gstreamer::Element]) -> PipelineResult<()> {
        for pair in chain.windows(2) {
            pair[0].link(pair[1]).map_err(|e| {
                PipelineError::construction(
                    BuildStage::Link,
                    format!("Failed to link {} -> {}: {}", pair[0].name(), pair[1].name(), e),
                )
            })?;
        }
        Ok(())
    }

    fn source(&self, source: &CaptureSource) -> PipelineResult<gstreamer::Element> {
        match source {
            CaptureSource::Device(path) => {
                let element = self.element("v4l2src", "source")?;
                element.set_property("device", path.as_str());
                Ok(element)
            }
            CaptureSource::TestPattern => {
                let element = self.element("videotestsrc", "source")?;
                element.set_property("is-live", true);
                Ok(element)
            }
        }
    }

    fn assemble(
        self,
        options: &PipelineOptions,
        overlays: &Arc<OverlayRegistry>,
        status: &Arc<ErrorStatus>,
    ) -> PipelineResult<(MediaGraph, DisplaySurface, gstreamer::Bus)> {
        // Capture
        let source = self.source(&options.source)?;
        let source_caps = self.capsfilter(
            "source_capsfilter",
            gstreamer::Caps::builder("video/x-raw")
                .field("width", options.width as i32)
                .field("height", options.height as i32)
                .build(),
        )?;
        let source_convert = self.element("videoconvert", "source_convert")?;
        let source_flip = self.element("videoflip", "source_flip")?;
        if options.mirror {
            source_flip.set_property_from_str("video-direction", pipeline::MIRROR_DIRECTION);
        }
        let tee = self.element("tee", "tee")?;

        // Poll-sink branch
        let appsink_queue = self.element("queue", "appsink_queue")?;
        let appsink_convert = self.element("videoconvert", "appsink_convert")?;
        let appsink_caps = self.capsfilter(
            "appsink_capsfilter",
            gstreamer::Caps::builder("video/x-raw")
                .field("format", pipeline::FRAME_FORMAT)
                .build(),
        )?;
        let appsink_element = self.element("appsink", "appsink")?;

        // Overlay and display branch
        let overlay_queue = self.element("queue", "overlay_queue")?;
        let overlay_convert = self.element("videoconvert", "overlay_convert")?;
        let overlay_caps = self.capsfilter(
            "overlay_capsfilter",
            gstreamer::Caps::builder("video/x-raw")
                .field("format", pipeline::OVERLAY_FORMAT)
                .build(),
        )?;
        let overlay = self.element("identity", "overlay")?;
        let display_queue = self.element("queue", "display_queue")?;
        let display_convert = self.element("videoconvert", "display_convert")?;
        let display_sink = self.element(options.display_factory(), "display_sink")?;
        if !options.want_gui && options.display_sink.is_none() {
            // Headless runs still render at the capture rate
            display_sink.set_property("sync", true);
        }

        Self::link_chain(&[&source, &source_caps, &source_convert, &source_flip, &tee])?;
        Self::link_chain(&[&tee, &appsink_queue, &appsink_convert, &appsink_caps, &appsink_element])?;
        Self::link_chain(&[
            &tee,
            &overlay_queue,
            &overlay_convert,
            &overlay_caps,
            &overlay,
            &display_queue,
            &display_convert,
            &display_sink,
        ])?;

        let appsink = appsink_element.dynamic_cast::<AppSink>().map_err(|_| {
            PipelineError::construction(BuildStage::Wiring, "appsink element is not an AppSink")
        })?;
        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::POLL_SINK_MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", true);

        let bus = self.pipeline.bus().ok_or_else(|| {
            PipelineError::construction(BuildStage::Wiring, "Graph has no bus")
        })?;

        // The draw callback must be in place before the graph can play
        let mut probes = vec![install_render_probe(&overlay, overlays, status)?];
        if options.want_gui {
            match install_key_probe(&display_sink, bus.clone()) {
                Some(probe) => probes.push(probe),
                None => {
                    return Err(PipelineError::construction(
                        BuildStage::Wiring,
                        "Failed to watch the display sink for key presses",
                    ));
                }
            }
        }

        let display = DisplaySurface::new(display_sink, options.want_gui);
        let graph = MediaGraph {
            pipeline: self.pipeline,
            appsink,
            probes,
        };
        Ok((graph, display, bus))
    }
}

/// Composite the registry onto every buffer leaving the overlay element
fn install_render_probe(
    overlay: &gstreamer::Element,
    overlays: &Arc<OverlayRegistry>,
    status: &Arc<ErrorStatus>,
) -> PipelineResult<(gstreamer::Pad, gstreamer::PadProbeId)> {
    let pad = overlay.static_pad("src").ok_or_else(|| {
        PipelineError::construction(BuildStage::Wiring, "overlay element has no src pad")
    })?;

    let overlays = Arc::clone(overlays);
    let status = Arc::clone(status);
    let id = pad
        .add_probe(gstreamer::PadProbeType::BUFFER, move |pad, info| {
            if let Some(gstreamer::PadProbeData::Buffer(ref mut buffer)) = info.data {
                render_buffer(pad, buffer, &overlays, &status);
            }
            gstreamer::PadProbeReturn::Ok
        })
        .ok_or_else(|| {
            PipelineError::construction(BuildStage::Wiring, "Failed to install the draw callback")
        })?;
    Ok((pad, id))
}

/// Runs on the streaming thread. Takes the overlay lock only.
fn render_buffer(
    pad: &gstreamer::Pad,
    buffer: &mut gstreamer::Buffer,
    overlays: &OverlayRegistry,
    status: &ErrorStatus,
) {
    if overlays.is_empty() {
        return;
    }
    let Some(caps) = pad.current_caps() else {
        return;
    };
    let info = match VideoInfo::from_caps(&caps) {
        Ok(info) => info,
        Err(e) => {
            status.record(format!("Unexpected caps on the overlay branch: {}", e));
            return;
        }
    };

    let buffer = buffer.make_mut();
    let mut frame = match VideoFrameRef::from_buffer_ref_writable(buffer, &info) {
        Ok(frame) => frame,
        Err(e) => {
            status.record(format!("Failed to map frame for drawing: {}", e));
            return;
        }
    };

    let (width, height, format) = (frame.width(), frame.height(), frame.format());
    let stride = frame.plane_stride()[0].max(0) as usize;
    let data = match frame.plane_data_mut(0) {
        Ok(data) => data,
        Err(e) => {
            status.record(format!("Failed to access frame pixels: {}", e));
            return;
        }
    };

    let mut canvas = Canvas::new(data, width, height, stride, format);
    let errors = overlays.render(&mut canvas);

    // Recorded after the overlay lock is released
    if let Some(first) = errors.first() {
        status.record(first.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_source_from_path() {
        assert_eq!(CaptureSource::from_path("test"), CaptureSource::TestPattern);
        assert_eq!(
            CaptureSource::from_path("/dev/video2"),
            CaptureSource::Device("/dev/video2".into())
        );
    }

    #[test]
    fn test_display_factory_selection() {
        let mut options = PipelineOptions::new("test", false);
        assert_eq!(options.display_factory(), "fakesink");
        options.want_gui = true;
        assert_eq!(options.display_factory(), "autovideosink");
        options.display_sink = Some("ximagesink".into());
        assert_eq!(options.display_factory(), "ximagesink");
    }

    #[test]
    fn test_defaults() {
        let options = PipelineOptions::default();
        assert_eq!(options.width, 320);
        assert_eq!(options.height, 240);
        assert!(options.mirror);
        assert_eq!(options.frame_timeout, Duration::from_secs(5));
    }
}
