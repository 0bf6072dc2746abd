// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Running the live overlay demo
//! - Saving an annotated snapshot
//! - Printing the color palette

use live_overlay::Config;
use live_overlay::constants::app_info;
use live_overlay::demo::{DemoOptions, run_demo};
use live_overlay::inference::{InferenceEngine, QrCodeDetector, overlays_for_results};
use live_overlay::overlay::{Canvas, OverlayRegistry, PALETTE};
use live_overlay::pipeline::{Pipeline, build_with};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Stop the pipeline on Ctrl-C
fn install_interrupt_handler(pipeline: &Arc<Pipeline>) -> Result<(), ctrlc::Error> {
    let pipeline = Arc::downgrade(pipeline);
    ctrlc::set_handler(move || {
        if let Some(pipeline) = pipeline.upgrade() {
            info!("Interrupted, stopping pipeline");
            pipeline.stop();
        }
    })
}

/// Run the live demo until the window is closed, Ctrl-C, or the frame limit
pub fn run_live(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let options = config.to_options();
    println!("Live Overlay {}", app_info::version());
    println!("Source: {} ({}x{})", options.source, options.width, options.height);

    let pipeline = Arc::new(build_with(&options)?);
    install_interrupt_handler(&pipeline)?;

    let mut engine = QrCodeDetector::new();
    println!("Engine: {}", engine.name());
    if options.want_gui {
        println!("Press q or Escape in the preview window to quit, p or space to pause.");
    }

    let demo_options = DemoOptions {
        max_frames: config.max_frames,
    };
    let stats = run_demo(&pipeline, &mut engine, &demo_options)?;

    println!(
        "Processed {} frames, {} results, mean inference {:.1} ms",
        stats.frames,
        stats.results,
        stats.mean_inference().as_secs_f64() * 1000.0
    );
    Ok(())
}

/// Capture one frame, annotate it and save it as an image
pub fn snapshot(config: &Config, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = config.to_options();
    options.want_gui = false;

    let pipeline = build_with(&options)?;
    pipeline.start()?;
    println!("Capturing...");
    let frame = pipeline.get_frame();
    pipeline.stop();
    let frame = frame?;

    let rgb = frame
        .to_rgb_image()
        .ok_or_else(|| format!("Cannot convert {} frame to an image", frame.format))?;
    let mut image = image::DynamicImage::ImageRgb8(rgb).to_rgba8();

    let mut engine = QrCodeDetector::new();
    let results = engine.evaluate(&frame)?;
    let registry = OverlayRegistry::new();
    for overlay in overlays_for_results(&results, frame.height) {
        registry.add(overlay)?;
    }
    for error in registry.render(&mut Canvas::from_rgba_image(&mut image)) {
        warn!(error = %error, "Overlay not drawn");
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    image.save(output)?;

    println!(
        "Saved {}x{} snapshot with {} overlay(s) to {}",
        frame.width,
        frame.height,
        registry.len(),
        output.display()
    );
    Ok(())
}

/// Print every palette entry with its index
pub fn print_palette() -> Result<(), Box<dyn std::error::Error>> {
    for (index, color) in PALETTE.iter().enumerate() {
        println!("{:3}  {}  rgb({}, {}, {})", index, color, color.r, color.g, color.b);
    }
    Ok(())
}
