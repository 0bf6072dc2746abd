// SPDX-License-Identifier: GPL-3.0-only

//! Overlay rasterization
//!
//! Positions are fractions of the surface size. They are converted to pixels
//! per call, so the same overlay lands in the same place whatever resolution
//! the display surface has when the frame is drawn.

use super::canvas::{Canvas, ChannelOrder};
use super::font::TextMask;
use super::{Color, Overlay, OverlayKind};
use crate::constants::overlay::{LINE_WIDTH, TEXT_PADDING};
use crate::errors::RenderError;
use std::ops::Range;

/// Largest resolved coordinate, in pixels, that is still drawn
const MAX_COORDINATE: f64 = i32::MAX as f64;

/// Draw one overlay onto `canvas`.
///
/// The canvas is validated and the overlay geometry resolved before the first
/// pixel is written, so an error leaves the canvas untouched.
pub fn draw_overlay(
    overlay: &Overlay,
    canvas: &mut Canvas<'_>,
    surface_width: u32,
    surface_height: u32,
) -> Result<(), RenderError> {
    let order = canvas.channel_order()?;

    let (rel_x, rel_y) = overlay.position();
    let x = to_pixels(rel_x, surface_width, "x")?;
    let y = to_pixels(rel_y, surface_height, "y")?;

    // Half the line width inward so a border at 0.0 stays on screen
    let inset = LINE_WIDTH / 2.0;
    let (x, y) = (x + inset, y + inset);

    match overlay.kind() {
        OverlayKind::Text => {}
        OverlayKind::BoundingBox { width, height } => {
            let width = to_pixels(width, surface_width, "width")?;
            let height = to_pixels(height, surface_height, "height")?;
            stroke_rect(
                canvas,
                order,
                Rect::normalized(x, y, width, height),
                LINE_WIDTH,
                overlay.background(),
            );
        }
    }

    draw_text(
        canvas,
        order,
        x,
        y,
        overlay.label(),
        overlay.background(),
        overlay.text_color(),
    );
    Ok(())
}

fn to_pixels(fraction: f32, extent: u32, what: &str) -> Result<f64, RenderError> {
    if !fraction.is_finite() {
        return Err(RenderError::MalformedOverlay(format!(
            "{} is not a finite number ({})",
            what, fraction
        )));
    }
    let pixels = fraction as f64 * extent as f64;
    if pixels.abs() > MAX_COORDINATE {
        return Err(RenderError::MalformedOverlay(format!(
            "{} resolves outside the drawable range ({} px)",
            what, pixels
        )));
    }
    Ok(pixels)
}

/// Axis-aligned rectangle in pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl Rect {
    fn normalized(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            left: x.min(x + width),
            top: y.min(y + height),
            right: x.max(x + width),
            bottom: y.max(y + height),
        }
    }

    /// Distance from a point to the rectangle outline.
    ///
    /// Outside the rectangle this is the Euclidean distance, which rounds the
    /// stroked corners.
    fn outline_distance(&self, px: f64, py: f64) -> f64 {
        let dx = (self.left - px).max(px - self.right).max(0.0);
        let dy = (self.top - py).max(py - self.bottom).max(0.0);
        if dx > 0.0 || dy > 0.0 {
            return dx.hypot(dy);
        }
        (px - self.left)
            .min(self.right - px)
            .min(py - self.top)
            .min(self.bottom - py)
    }
}

/// Pixel indices whose centers fall in `[start, end)`, clipped to `0..limit`
fn pixel_span(start: f64, end: f64, limit: u32) -> Range<i64> {
    let first = (start - 0.5).ceil().max(0.0);
    let last = (end - 0.5).ceil().min(limit as f64);
    if last <= first {
        return 0..0;
    }
    first as i64..last as i64
}

fn fill_rect(
    canvas: &mut Canvas<'_>,
    order: ChannelOrder,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    color: Color,
) {
    let columns = pixel_span(x, x + width, canvas.width());
    for py in pixel_span(y, y + height, canvas.height()) {
        for px in columns.clone() {
            canvas.blend_pixel(order, px, py, color);
        }
    }
}

fn stroke_rect(
    canvas: &mut Canvas<'_>,
    order: ChannelOrder,
    rect: Rect,
    line_width: f64,
    color: Color,
) {
    let half = line_width / 2.0;
    let columns = pixel_span(rect.left - half, rect.right + half + 1.0, canvas.width());
    let rows = pixel_span(rect.top - half, rect.bottom + half + 1.0, canvas.height());

    for py in rows {
        let cy = py as f64 + 0.5;
        let on_edge_row = cy <= rect.top + half || cy >= rect.bottom - half;

        // Between the horizontal edges only the two vertical bands can be hit
        let bands = if on_edge_row {
            [columns.clone(), 0..0]
        } else {
            let left_band = columns.start..columns.end.min((rect.left + half).ceil() as i64 + 1);
            let right_band = columns.start.max((rect.right - half).floor() as i64 - 1)..columns.end;
            if left_band.end >= right_band.start {
                // Narrow box: each pixel is blended once
                [columns.clone(), 0..0]
            } else {
                [left_band, right_band]
            }
        };

        for band in bands {
            for px in band {
                let cx = px as f64 + 0.5;
                if rect.outline_distance(cx, cy) <= half {
                    canvas.blend_pixel(order, px, py, color);
                }
            }
        }
    }
}

fn draw_text(
    canvas: &mut Canvas<'_>,
    order: ChannelOrder,
    x: f64,
    y: f64,
    label: &str,
    background: Color,
    text_color: Color,
) {
    // The chip is sized from the whole label
    let (text_width, text_height) = TextMask::measure(label);
    fill_rect(
        canvas,
        order,
        x,
        y,
        text_width as f64 + 2.0 * TEXT_PADDING,
        text_height as f64 + 2.0 * TEXT_PADDING,
        background,
    );

    let origin_x = (x + TEXT_PADDING).floor() as i64;
    let origin_y = (y + TEXT_PADDING).floor() as i64;

    // Glyphs past the right edge are never rasterized
    let visible = (canvas.width() as i64 - origin_x).max(0) as usize;
    let mask = TextMask::render_clipped(label, visible);
    for (mx, my) in mask.inked() {
        canvas.blend_pixel(order, origin_x + mx as i64, origin_y + my as i64, text_color);
    }
}
