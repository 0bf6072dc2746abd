// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for overlays, the registry and rendering

use image::{Rgba, RgbaImage};
use live_overlay::errors::OverlayError;
use live_overlay::overlay::{Canvas, Color, Overlay, OverlayRegistry, draw_overlay};

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn blank(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, BACKGROUND)
}

fn rgba(color: Color) -> [u8; 4] {
    [color.r, color.g, color.b, color.a]
}

#[test]
fn test_double_add_is_rejected() {
    let registry = OverlayRegistry::new();
    let overlay = Overlay::text(0.1, 0.1, "person", Color::rgb(10, 20, 30));

    registry.add(overlay.clone()).unwrap();
    assert_eq!(registry.add(overlay.clone()), Err(OverlayError::AlreadyOwned));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_overlay_owned_by_one_registry_only() {
    let first = OverlayRegistry::new();
    let second = OverlayRegistry::new();
    let overlay = Overlay::bounding_box(0.0, 0.0, 0.5, 0.5, "dog", Color::rgb(1, 2, 3));

    first.add(overlay.clone()).unwrap();
    assert_eq!(second.add(overlay.clone()), Err(OverlayError::AlreadyOwned));
    assert!(second.is_empty());

    // Once released it can move
    first.clear();
    assert!(!overlay.is_owned());
    second.add(overlay.clone()).unwrap();
    assert!(second.contains(&overlay));
}

#[test]
fn test_clear_on_empty_registry() {
    let registry = OverlayRegistry::new();
    registry.clear();
    registry.clear();
    assert!(registry.is_empty());
}

#[test]
fn test_clear_then_add() {
    let registry = OverlayRegistry::new();
    registry
        .add(Overlay::text(0.0, 0.0, "a", Color::rgb(1, 1, 1)))
        .unwrap();
    registry
        .add(Overlay::text(0.0, 0.1, "b", Color::rgb(2, 2, 2)))
        .unwrap();
    registry.clear();

    let fresh = Overlay::text(0.0, 0.2, "c", Color::rgb(3, 3, 3));
    registry.add(fresh.clone()).unwrap();

    let contents = registry.snapshot();
    assert_eq!(contents.len(), 1);
    assert!(contents[0].same_instance(&fresh));
}

#[test]
fn test_later_overlays_draw_on_top() {
    let a = Color::rgb(200, 0, 0);
    let b = Color::rgb(0, 200, 0);
    let c = Color::rgb(0, 0, 200);

    let registry = OverlayRegistry::new();
    for color in [a, b, c] {
        registry.add(Overlay::text(0.1, 0.1, "", color)).unwrap();
    }

    let mut image = blank(100, 100);
    let errors = registry.render(&mut Canvas::from_rgba_image(&mut image));
    assert!(errors.is_empty());
    assert_eq!(image.get_pixel(13, 20).0, rgba(c));
}

#[test]
fn test_draw_order_follows_insertion_not_position() {
    let under = Color::rgb(90, 90, 0);
    let over = Color::rgb(0, 90, 90);

    let registry = OverlayRegistry::new();
    registry
        .add(Overlay::bounding_box(0.0, 0.0, 0.9, 0.9, "", under))
        .unwrap();
    registry
        .add(Overlay::bounding_box(0.0, 0.0, 0.5, 0.5, "", over))
        .unwrap();

    let mut image = blank(100, 100);
    registry.render(&mut Canvas::from_rgba_image(&mut image));

    // Both chips sit at the same anchor; the later one wins
    assert_eq!(image.get_pixel(3, 20).0, rgba(over));
    // Only the first box reaches this far
    assert_eq!(image.get_pixel(91, 50).0, rgba(under));
}

#[test]
fn test_bounding_box_scenario() {
    let color = Color::rgb(255, 0, 0);
    let overlay = Overlay::bounding_box(0.1, 0.1, 0.2, 0.2, "", color);

    let mut image = blank(100, 100);
    draw_overlay(&overlay, &mut Canvas::from_rgba_image(&mut image), 100, 100).unwrap();

    // Right and bottom border
    assert_eq!(image.get_pixel(31, 20).0, rgba(color));
    assert_eq!(image.get_pixel(20, 31).0, rgba(color));
    // Left border outside the chip
    assert_eq!(image.get_pixel(10, 25).0, rgba(color));
    // Top border, right of the chip
    assert_eq!(image.get_pixel(25, 11).0, rgba(color));
    // Interior is not filled
    assert_eq!(image.get_pixel(20, 20).0, BACKGROUND.0);
    assert_eq!(image.get_pixel(25, 25).0, BACKGROUND.0);
    // Outside the box
    assert_eq!(image.get_pixel(35, 35).0, BACKGROUND.0);
    assert_eq!(image.get_pixel(7, 7).0, BACKGROUND.0);
    // Text chip at the box anchor
    assert_eq!(image.get_pixel(14, 38).0, rgba(color));
}

#[test]
fn test_label_glyphs_are_not_covered_by_chip() {
    let chip = Color::rgb(0, 0, 255);
    let overlay = Overlay::bounding_box(0.0, 0.0, 0.5, 0.5, "H", chip);

    let mut image = blank(100, 100);
    draw_overlay(&overlay, &mut Canvas::from_rgba_image(&mut image), 100, 100).unwrap();

    let black = [0, 0, 0, 255];
    let pixels: Vec<[u8; 4]> = image.pixels().map(|p| p.0).collect();
    assert!(pixels.contains(&black), "glyph pixels should be visible");
    // Left stem of the H
    assert_eq!(image.get_pixel(5, 10).0, black);
}

#[test]
fn test_rendering_tracks_surface_size() {
    let color = Color::rgb(0, 128, 0);
    let overlay = Overlay::bounding_box(0.5, 0.5, 0.25, 0.25, "", color);

    for size in [80u32, 160] {
        let mut image = blank(size, size);
        draw_overlay(&overlay, &mut Canvas::from_rgba_image(&mut image), size, size).unwrap();
        let right_edge = size / 2 + size / 4 + 1;
        assert_eq!(
            image.get_pixel(right_edge, size / 2 + size / 8 + 2).0,
            rgba(color),
            "right border at {}px",
            size
        );
    }
}
