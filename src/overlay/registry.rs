// SPDX-License-Identifier: GPL-3.0-only

//! Insertion-ordered overlay collection shared with the render thread

use super::{Canvas, Overlay, draw_overlay};
use crate::errors::{OverlayError, RenderError};
use crate::sync::OverlayLock;
use tracing::{debug, warn};

/// The overlays currently drawn on every displayed frame.
///
/// All access goes through the overlay lock. The render pass holds it for the
/// whole draw so it never sees a half-rebuilt sequence.
#[derive(Debug)]
pub struct OverlayRegistry {
    overlays: OverlayLock<Vec<Overlay>>,
}

impl Default for OverlayRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayRegistry {
    pub fn new() -> Self {
        Self {
            overlays: OverlayLock::new(Vec::new()),
        }
    }

    /// Append an overlay; it draws above everything added before it.
    ///
    /// Fails without touching the registry if the overlay is already held by
    /// this or any other registry.
    pub fn add(&self, overlay: Overlay) -> Result<(), OverlayError> {
        let mut overlays = self.overlays.acquire();
        if !overlay.claim() {
            warn!(label = overlay.label(), "Overlay already owned, not adding");
            return Err(OverlayError::AlreadyOwned);
        }
        overlays.push(overlay);
        Ok(())
    }

    /// Remove and release every overlay
    pub fn clear(&self) {
        let mut overlays = self.overlays.acquire();
        for overlay in overlays.drain(..) {
            overlay.release();
        }
    }

    /// Swap the whole set in one critical section.
    ///
    /// The render thread sees either the old set or the new one, never an
    /// empty frame in between. Overlays that are already owned are skipped
    /// and reported.
    pub fn replace(&self, new_overlays: Vec<Overlay>) -> Vec<OverlayError> {
        let mut rejected = Vec::new();
        let mut overlays = self.overlays.acquire();
        for overlay in overlays.drain(..) {
            overlay.release();
        }
        for overlay in new_overlays {
            if overlay.claim() {
                overlays.push(overlay);
            } else {
                rejected.push(OverlayError::AlreadyOwned);
            }
        }
        rejected
    }

    pub fn len(&self) -> usize {
        self.overlays.acquire().len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.acquire().is_empty()
    }

    /// Handles to the current overlays, in draw order
    pub fn snapshot(&self) -> Vec<Overlay> {
        self.overlays.acquire().clone()
    }

    /// Whether this exact instance is in the registry
    pub fn contains(&self, overlay: &Overlay) -> bool {
        self.overlays
            .acquire()
            .iter()
            .any(|held| held.same_instance(overlay))
    }

    /// Draw every overlay in insertion order.
    ///
    /// A failing overlay is skipped and the pass continues; the failures are
    /// returned so the caller can record them after the lock is released.
    pub fn render(&self, canvas: &mut Canvas<'_>) -> Vec<RenderError> {
        let (width, height) = (canvas.width(), canvas.height());
        let overlays = self.overlays.acquire();
        let mut errors = Vec::new();
        for overlay in overlays.iter() {
            if let Err(e) = draw_overlay(overlay, canvas, width, height) {
                debug!(label = overlay.label(), error = %e, "Skipping overlay");
                errors.push(e);
            }
        }
        errors
    }
}

impl Drop for OverlayRegistry {
    fn drop(&mut self) {
        for overlay in self.overlays.get_mut().drain(..) {
            overlay.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::Color;

    fn label(text: &str) -> Overlay {
        Overlay::text(0.0, 0.0, text, Color::rgb(10, 10, 10))
    }

    #[test]
    fn test_replace_swaps_contents() {
        let registry = OverlayRegistry::new();
        let old = label("old");
        registry.add(old.clone()).unwrap();

        let rejected = registry.replace(vec![label("a"), label("b")]);
        assert!(rejected.is_empty());
        assert_eq!(registry.len(), 2);
        assert!(!old.is_owned());
        assert!(!registry.contains(&old));
    }

    #[test]
    fn test_replace_skips_owned_overlays() {
        let first = OverlayRegistry::new();
        let second = OverlayRegistry::new();
        let shared = label("shared");
        first.add(shared.clone()).unwrap();

        let rejected = second.replace(vec![shared.clone(), label("fresh")]);
        assert_eq!(rejected, vec![OverlayError::AlreadyOwned]);
        assert_eq!(second.len(), 1);
        assert!(first.contains(&shared));
    }

    #[test]
    fn test_drop_releases_ownership() {
        let overlay = label("x");
        {
            let registry = OverlayRegistry::new();
            registry.add(overlay.clone()).unwrap();
            assert!(overlay.is_owned());
        }
        assert!(!overlay.is_owned());
    }

    #[test]
    fn test_render_continues_past_bad_overlay() {
        let registry = OverlayRegistry::new();
        registry
            .add(Overlay::text(f32::INFINITY, 0.0, "bad", Color::rgb(1, 1, 1)))
            .unwrap();
        registry
            .add(Overlay::text(0.0, 0.0, "", Color::rgb(200, 0, 0)))
            .unwrap();

        let mut image = image::RgbaImage::new(32, 32);
        let errors = registry.render(&mut Canvas::from_rgba_image(&mut image));
        assert_eq!(errors.len(), 1);
        assert_eq!(image.get_pixel(3, 3).0, [200, 0, 0, 255]);
    }
}
