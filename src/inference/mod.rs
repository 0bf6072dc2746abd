// SPDX-License-Identifier: GPL-3.0-only

//! Inference engine seam
//!
//! Engines take a [`Frame`] and return results in frame-relative
//! coordinates. [`overlays_for_results`] turns those results into overlays
//! ready for the registry.

pub mod qr;

pub use qr::QrCodeDetector;

use crate::constants::overlay::TEXT_SIZE;
use crate::errors::InferenceError;
use crate::overlay::{Overlay, color_for};
use crate::pipeline::Frame;

/// A rectangle in frame-relative coordinates (0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge as fraction of frame width
    pub x: f32,
    /// Top edge as fraction of frame height
    pub y: f32,
    /// Width as fraction of frame width
    pub width: f32,
    /// Height as fraction of frame height
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a region from pixel coordinates
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        Self {
            x: x as f32 / frame_width as f32,
            y: y as f32 / frame_height as f32,
            width: width as f32 / frame_width as f32,
            height: height as f32 / frame_height as f32,
        }
    }
}

/// A per-pixel class mask, row-major, nonzero means set
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Mask {
    /// Smallest rectangle around every set pixel, or `None` for an empty mask
    pub fn bounds(&self) -> Option<Rect> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
        let (mut max_x, mut max_y) = (0u32, 0u32);
        let mut any = false;

        for (row, line) in self
            .data
            .chunks(self.width as usize)
            .take(self.height as usize)
            .enumerate()
        {
            for (col, value) in line.iter().enumerate() {
                if *value == 0 {
                    continue;
                }
                any = true;
                min_x = min_x.min(col as u32);
                max_x = max_x.max(col as u32);
                min_y = min_y.min(row as u32);
                max_y = max_y.max(row as u32);
            }
        }

        any.then(|| {
            Rect::from_pixels(
                min_x,
                min_y,
                max_x - min_x + 1,
                max_y - min_y + 1,
                self.width,
                self.height,
            )
        })
    }
}

/// One engine output
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceResult {
    /// Whole-frame classification
    ClassLabel { class_id: u32, label: String },
    /// Detected object
    BoundingBox {
        class_id: u32,
        label: String,
        rect: Rect,
    },
    /// Segmented region
    SegmentationMask {
        class_id: u32,
        label: String,
        mask: Mask,
    },
}

impl InferenceResult {
    pub fn class_id(&self) -> u32 {
        match self {
            InferenceResult::ClassLabel { class_id, .. }
            | InferenceResult::BoundingBox { class_id, .. }
            | InferenceResult::SegmentationMask { class_id, .. } => *class_id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            InferenceResult::ClassLabel { label, .. }
            | InferenceResult::BoundingBox { label, .. }
            | InferenceResult::SegmentationMask { label, .. } => label,
        }
    }
}

/// Something that looks at frames
pub trait InferenceEngine {
    /// Human readable engine name
    fn name(&self) -> &str;

    /// Evaluate one frame
    fn evaluate(&mut self, frame: &Frame) -> Result<Vec<InferenceResult>, InferenceError>;
}

/// Build overlays for a set of results.
///
/// Class labels stack down the left edge, one text line each. Boxes and
/// masks become bounding boxes. Colors follow the class id.
pub fn overlays_for_results(results: &[InferenceResult], frame_height: u32) -> Vec<Overlay> {
    let line_height = TEXT_SIZE as f32 * 1.5 / frame_height.max(1) as f32;
    let mut line = 0;
    let mut overlays = Vec::with_capacity(results.len());

    for result in results {
        let color = color_for(result.class_id());
        match result {
            InferenceResult::ClassLabel { label, .. } => {
                overlays.push(Overlay::text(0.0, line as f32 * line_height, label, color));
                line += 1;
            }
            InferenceResult::BoundingBox { label, rect, .. } => {
                overlays.push(Overlay::bounding_box(
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    label,
                    color,
                ));
            }
            InferenceResult::SegmentationMask { label, mask, .. } => {
                if let Some(rect) = mask.bounds() {
                    overlays.push(Overlay::bounding_box(
                        rect.x,
                        rect.y,
                        rect.width,
                        rect.height,
                        label,
                        color,
                    ));
                }
            }
        }
    }
    overlays
}
