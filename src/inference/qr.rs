// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection engine
//!
//! Converts frames to grayscale and searches for QR codes with `rqrr`,
//! reporting each decoded code as a bounding box labelled with its content.

use super::{InferenceEngine, InferenceResult, Rect};
use crate::errors::InferenceError;
use crate::pipeline::Frame;
use std::time::Instant;
use tracing::{debug, trace};

/// Class id reported for every QR code
pub const QR_CLASS_ID: u32 = 0;

/// Longest label drawn for a code; longer content is truncated
const MAX_LABEL_CHARS: usize = 32;

/// QR code detector
#[derive(Debug, Default)]
pub struct QrCodeDetector {
    detections: u64,
}

impl QrCodeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total codes decoded so far
    pub fn detections(&self) -> u64 {
        self.detections
    }
}

fn label_for(content: &str) -> String {
    if content.chars().count() <= MAX_LABEL_CHARS {
        return content.to_string();
    }
    let mut label: String = content.chars().take(MAX_LABEL_CHARS - 3).collect();
    label.push_str("...");
    label
}

/// Detect QR codes in an 8-bit grayscale image
pub fn detect_in_luma(luma: &[u8], width: u32, height: u32) -> Vec<InferenceResult> {
    let start = Instant::now();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 || luma.len() < w * h {
        return Vec::new();
    }

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(w, h, |x, y| luma[y * w + x]);
    let grids = prepared.detect_grids();
    trace!(count = grids.len(), "QR grids found");

    let mut results = Vec::with_capacity(grids.len());
    for grid in grids {
        let content = match grid.decode() {
            Ok((_, content)) => content,
            Err(e) => {
                debug!(error = %e, "Failed to decode QR code");
                continue;
            }
        };

        let xs = grid.bounds.iter().map(|p| p.x.clamp(0, width as i32) as u32);
        let ys = grid.bounds.iter().map(|p| p.y.clamp(0, height as i32) as u32);
        let (min_x, max_x) = xs.fold((u32::MAX, 0), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let (min_y, max_y) = ys.fold((u32::MAX, 0), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let rect = Rect::from_pixels(
            min_x,
            min_y,
            max_x.saturating_sub(min_x),
            max_y.saturating_sub(min_y),
            width,
            height,
        );

        debug!(
            content = %content,
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            "Detected QR code"
        );
        results.push(InferenceResult::BoundingBox {
            class_id: QR_CLASS_ID,
            label: label_for(&content),
            rect,
        });
    }

    if !results.is_empty() {
        debug!(
            count = results.len(),
            total_ms = start.elapsed().as_millis(),
            "QR detection found codes"
        );
    }
    results
}

impl InferenceEngine for QrCodeDetector {
    fn name(&self) -> &str {
        "qr-code-detector"
    }

    fn evaluate(&mut self, frame: &Frame) -> Result<Vec<InferenceResult>, InferenceError> {
        let luma = frame.to_luma().ok_or_else(|| {
            InferenceError::UnsupportedFrame(format!(
                "{} {}x{} (stride {})",
                frame.format, frame.width, frame.height, frame.stride
            ))
        })?;
        let results = detect_in_luma(&luma, frame.width, frame.height);
        self.detections += results.len() as u64;
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_truncation() {
        assert_eq!(label_for("short"), "short");
        let long = "x".repeat(40);
        let label = label_for(&long);
        assert_eq!(label.chars().count(), MAX_LABEL_CHARS);
        assert!(label.ends_with("..."));
    }

    #[test]
    fn test_blank_image_has_no_codes() {
        let luma = vec![255u8; 64 * 64];
        assert!(detect_in_luma(&luma, 64, 64).is_empty());
    }

    #[test]
    fn test_short_buffer_is_ignored() {
        assert!(detect_in_luma(&[0u8; 10], 64, 64).is_empty());
    }
}
