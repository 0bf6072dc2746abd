// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Overlay drawing constants
pub mod overlay {
    /// Height of overlay text in pixels (one glyph cell including spacing)
    pub const TEXT_SIZE: u32 = 24;

    /// Stroke width of bounding boxes; also the inset reserved for borders
    pub const LINE_WIDTH: f64 = (TEXT_SIZE / 8) as f64;

    /// Space between a text chip's edge and its glyphs
    pub const TEXT_PADDING: f64 = LINE_WIDTH;

    /// Text is always drawn opaque black on top of its colored chip
    pub const TEXT_COLOR: crate::overlay::Color = crate::overlay::Color::rgba(0, 0, 0, 255);
}

/// Capture defaults
pub mod capture {
    /// Default capture device
    pub const DEFAULT_DEVICE: &str = "/dev/video0";

    /// Device path that selects the built-in live test pattern
    pub const TEST_PATTERN_DEVICE: &str = "test";

    /// Default capture width (low resolution keeps inference fast)
    pub const DEFAULT_WIDTH: u32 = 320;

    /// Default capture height
    pub const DEFAULT_HEIGHT: u32 = 240;
}

/// GStreamer graph constants
pub mod pipeline {
    /// Pixel format delivered to the application by the poll-sink
    pub const FRAME_FORMAT: &str = "RGB";

    /// Pixel format the overlay branch is converted to before drawing
    pub const OVERLAY_FORMAT: &str = "BGRx";

    /// Poll-sink keeps only the newest frame
    pub const POLL_SINK_MAX_BUFFERS: u32 = 1;

    /// Name of the graph itself
    pub const GRAPH_NAME: &str = "video-overlay-pipeline";

    /// `videoflip` direction for a horizontal mirror
    pub const MIRROR_DIRECTION: &str = "horiz";

    /// Structure name of re-posted key press messages
    pub const KEY_MESSAGE: &str = "live-overlay-key";
}

/// Timing constants
pub mod timing {
    use std::time::Duration;

    /// Slice length of a frame pull; stop requests are noticed between slices
    pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

    /// Default upper bound on a whole frame pull
    pub const DEFAULT_FRAME_TIMEOUT_MS: u64 = 5_000;

    /// How long a paused pipeline waits for a preroll sample
    pub const PREROLL_TIMEOUT: Duration = Duration::from_millis(200);

    /// Timeout for the graph to reach Playing after start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Timeout for querying the graph's current state
    pub const STATE_QUERY_TIMEOUT_SECS: u64 = 1;

    /// Timeout for the graph to settle after being set to Null
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Log frame statistics every N frames
    pub const FRAME_LOG_INTERVAL: u64 = 30;
}

/// Application info
pub mod app_info {
    /// Application version from git describe (set by build.rs)
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }

    /// Directory name under the user config dir
    pub const CONFIG_DIR_NAME: &str = "live-overlay";

    /// Config file name
    pub const CONFIG_FILE_NAME: &str = "config.json";
}
