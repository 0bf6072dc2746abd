// SPDX-License-Identifier: MPL-2.0

//! Live Overlay - live camera preview with inference overlays
//!
//! This library captures video, hands the newest frame to an inference
//! engine on request, and composites the engine's results (labels and
//! bounding boxes) onto every displayed frame in real time.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`pipeline`]: GStreamer graph construction and the controller state machine
//! - [`overlay`]: Overlays, the shared registry, the color palette and rendering
//! - [`inference`]: The engine trait, result types and a built-in QR detector
//! - [`demo`]: The pull/evaluate/redraw application loop
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```no_run
//! use live_overlay::inference::QrCodeDetector;
//! use live_overlay::demo::{DemoOptions, run_demo};
//!
//! let pipeline = live_overlay::pipeline::build("/dev/video0", true)?;
//! let mut engine = QrCodeDetector::new();
//! let stats = run_demo(&pipeline, &mut engine, &DemoOptions::default())?;
//! println!("{} frames", stats.frames);
//! # Ok::<(), live_overlay::errors::AppError>(())
//! ```

pub mod config;
pub mod constants;
pub mod demo;
pub mod errors;
pub mod inference;
pub mod overlay;
pub mod pipeline;
pub mod sync;

// Re-export commonly used types
pub use config::Config;
pub use errors::{AppError, AppResult, PipelineError};
pub use overlay::{Color, Overlay, OverlayRegistry, color_for};
pub use pipeline::{Frame, Pipeline, PipelineState};
