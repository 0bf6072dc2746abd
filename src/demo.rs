// SPDX-License-Identifier: GPL-3.0-only

//! The application loop: pull a frame, evaluate it, redraw the overlays

use crate::constants::timing;
use crate::errors::{AppResult, PipelineError};
use crate::inference::{InferenceEngine, overlays_for_results};
use crate::pipeline::{Pipeline, PipelineState};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Demo loop settings
#[derive(Debug, Clone, Default)]
pub struct DemoOptions {
    /// Stop after this many frames
    pub max_frames: Option<u64>,
}

/// What the loop did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemoStats {
    pub frames: u64,
    /// Results reported by the engine, summed over all frames
    pub results: u64,
    pub total_inference: Duration,
}

impl DemoStats {
    fn record(&mut self, results: usize, elapsed: Duration) {
        self.frames += 1;
        self.results += results as u64;
        self.total_inference += elapsed;
    }

    pub fn mean_inference(&self) -> Duration {
        if self.frames == 0 {
            return Duration::ZERO;
        }
        self.total_inference / self.frames as u32
    }
}

fn limit_reached(options: &DemoOptions, stats: &DemoStats) -> bool {
    options.max_frames.is_some_and(|max| stats.frames >= max)
}

/// Run until the user stops the pipeline or the frame limit is hit.
///
/// The pipeline is started here and always stopped on return.
pub fn run_demo(
    pipeline: &Pipeline,
    engine: &mut dyn InferenceEngine,
    options: &DemoOptions,
) -> AppResult<DemoStats> {
    info!(engine = engine.name(), max_frames = ?options.max_frames, "Starting demo loop");
    pipeline.start()?;

    let mut stats = DemoStats::default();
    let outcome = run_loop(pipeline, engine, options, &mut stats);
    pipeline.stop();
    outcome?;

    if pipeline.state() == PipelineState::Errored {
        let message = pipeline
            .last_error()
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(PipelineError::Errored(message).into());
    }

    info!(
        frames = stats.frames,
        results = stats.results,
        mean_inference_ms = stats.mean_inference().as_millis(),
        "Demo loop finished"
    );
    Ok(stats)
}

fn run_loop(
    pipeline: &Pipeline,
    engine: &mut dyn InferenceEngine,
    options: &DemoOptions,
    stats: &mut DemoStats,
) -> AppResult<()> {
    while pipeline.is_running() && !limit_reached(options, stats) {
        if pipeline.state() == PipelineState::Paused {
            // The shown frame does not change until playback resumes
            pipeline.pump_events();
            std::thread::sleep(timing::POLL_INTERVAL);
            continue;
        }

        let frame = match pipeline.get_frame() {
            Ok(frame) => frame,
            Err(PipelineError::Interrupted) => break,
            Err(e) if !pipeline.is_running() => {
                // Stopped from the window or another thread mid-pull
                debug!(error = %e, "Pipeline stopped during frame pull");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        let started = Instant::now();
        let results = engine.evaluate(&frame)?;
        stats.record(results.len(), started.elapsed());

        let overlays = overlays_for_results(&results, frame.height);
        for rejected in pipeline.replace_overlays(overlays) {
            warn!(error = %rejected, "Overlay not shown");
        }
    }
    Ok(())
}
