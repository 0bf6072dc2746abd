// SPDX-License-Identifier: GPL-3.0-only

//! Drawable annotations composited onto live video
//!
//! An [`Overlay`] is positioned in frame-relative coordinates (fractions of
//! the frame width and height), so it stays put when the display surface
//! changes size. Overlays are collected in an [`OverlayRegistry`] and drawn
//! by [`render::draw_overlay`] once per displayed frame.

pub mod canvas;
mod font;
pub mod palette;
pub mod registry;
pub mod render;

pub use canvas::Canvas;
pub use palette::{PALETTE, color_for};
pub use registry::OverlayRegistry;
pub use render::draw_overlay;

use crate::constants::overlay::TEXT_COLOR;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// An RGBA color with 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.a
        )
    }
}

/// What an overlay draws
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayKind {
    /// A label on a colored chip
    Text,
    /// A stroked rectangle with a label chip at its top-left corner
    BoundingBox {
        /// Width as fraction of frame width
        width: f32,
        /// Height as fraction of frame height
        height: f32,
    },
}

#[derive(Debug)]
struct OverlayInner {
    kind: OverlayKind,
    x: f32,
    y: f32,
    label: String,
    background: Color,
    text_color: Color,
    /// Set while a registry holds this overlay
    owned: AtomicBool,
}

/// A drawable annotation
///
/// Cloning an `Overlay` yields another handle to the same instance, not a
/// copy: both handles share identity and ownership state. An instance can be
/// held by at most one registry at a time.
#[derive(Debug, Clone)]
pub struct Overlay {
    inner: Arc<OverlayInner>,
}

impl Overlay {
    fn new(kind: OverlayKind, x: f32, y: f32, label: &str, color: Color) -> Self {
        Self {
            inner: Arc::new(OverlayInner {
                kind,
                x,
                y,
                label: label.to_string(),
                background: color,
                text_color: TEXT_COLOR,
                owned: AtomicBool::new(false),
            }),
        }
    }

    /// Create a text overlay with its top-left corner at `(x, y)`
    pub fn text(x: f32, y: f32, label: &str, color: Color) -> Self {
        Self::new(OverlayKind::Text, x, y, label, color)
    }

    /// Create a bounding box overlay
    ///
    /// `color` strokes the box and fills the label chip; the label itself is
    /// always drawn in opaque black.
    pub fn bounding_box(x: f32, y: f32, width: f32, height: f32, label: &str, color: Color) -> Self {
        Self::new(OverlayKind::BoundingBox { width, height }, x, y, label, color)
    }

    pub fn kind(&self) -> OverlayKind {
        self.inner.kind
    }

    /// Relative position of the top-left corner
    pub fn position(&self) -> (f32, f32) {
        (self.inner.x, self.inner.y)
    }

    /// Relative size (bounding boxes only)
    pub fn size(&self) -> Option<(f32, f32)> {
        match self.inner.kind {
            OverlayKind::BoundingBox { width, height } => Some((width, height)),
            OverlayKind::Text => None,
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn background(&self) -> Color {
        self.inner.background
    }

    pub fn text_color(&self) -> Color {
        self.inner.text_color
    }

    /// Whether a registry currently holds this overlay
    pub fn is_owned(&self) -> bool {
        self.inner.owned.load(Ordering::Acquire)
    }

    /// Whether both handles refer to the same instance
    pub fn same_instance(&self, other: &Overlay) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Mark as owned; false if another registry already owns it
    pub(crate) fn claim(&self) -> bool {
        !self.inner.owned.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn release(&self) {
        self.inner.owned.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_color_is_opaque_black() {
        let text = Overlay::text(0.0, 0.0, "cat", Color::rgb(200, 10, 10));
        let bbox = Overlay::bounding_box(0.1, 0.2, 0.3, 0.4, "dog", Color::rgb(1, 2, 3));
        assert_eq!(text.text_color(), Color::rgba(0, 0, 0, 255));
        assert_eq!(bbox.text_color(), Color::rgba(0, 0, 0, 255));
        assert_eq!(bbox.background(), Color::rgb(1, 2, 3));
        assert_eq!(bbox.size(), Some((0.3, 0.4)));
        assert_eq!(text.size(), None);
    }

    #[test]
    fn test_clone_shares_identity() {
        let a = Overlay::text(0.0, 0.0, "a", Color::rgb(0, 0, 0));
        let b = a.clone();
        let c = Overlay::text(0.0, 0.0, "a", Color::rgb(0, 0, 0));
        assert!(a.same_instance(&b));
        assert!(!a.same_instance(&c));

        assert!(a.claim());
        assert!(b.is_owned());
        assert!(!b.claim());
        b.release();
        assert!(!a.is_owned());
    }

    #[test]
    fn test_color_display() {
        assert_eq!(Color::rgba(255, 0, 16, 128).to_string(), "#ff001080");
    }
}
