// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the class color palette

use live_overlay::overlay::palette::PALETTE_LEN;
use live_overlay::overlay::{PALETTE, color_for};
use std::collections::HashSet;

#[test]
fn test_palette_entries_are_distinct() {
    let unique: HashSet<_> = PALETTE.iter().collect();
    assert_eq!(unique.len(), PALETTE_LEN);
}

#[test]
fn test_congruent_ids_share_a_color() {
    for id in 0..PALETTE_LEN as u32 {
        let color = color_for(id);
        assert_eq!(color, color_for(id + PALETTE_LEN as u32));
        assert_eq!(color, color_for(id + 7 * PALETTE_LEN as u32));
    }
}

#[test]
fn test_large_ids_stay_in_range() {
    assert_eq!(color_for(u32::MAX), PALETTE[u32::MAX as usize % PALETTE_LEN]);
}

#[test]
fn test_palette_is_opaque() {
    assert!(PALETTE.iter().all(|c| c.is_opaque()));
}
