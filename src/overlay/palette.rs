// SPDX-License-Identifier: GPL-3.0-only

//! Fixed color table for class ids
//!
//! 100 algorithmically mixed colors that stay distinguishable against each
//! other and against camera footage. The same class id always maps to the
//! same color; ids past the end of the table wrap around.

use super::Color;

/// Number of entries in [`PALETTE`]
pub const PALETTE_LEN: usize = 100;

/// Precomputed overlay colors
pub const PALETTE: [Color; PALETTE_LEN] = [
    Color::rgb(110, 227, 144), Color::rgb(226, 145, 112), Color::rgb(224, 147, 111), Color::rgb(128, 206, 160),
    Color::rgb(229, 110, 196), Color::rgb(218, 119, 194), Color::rgb(111, 193, 226), Color::rgb(214, 123, 196),
    Color::rgb(111, 194, 225), Color::rgb(216, 151, 118), Color::rgb(183, 159, 167), Color::rgb(117, 219, 150),
    Color::rgb(114, 198, 209), Color::rgb(215, 151, 118), Color::rgb(195, 145, 176), Color::rgb(111, 226, 144),
    Color::rgb(117, 190, 221), Color::rgb(214, 125, 190), Color::rgb(110, 226, 147), Color::rgb(115, 191, 224),
    Color::rgb(116, 190, 224), Color::rgb(118, 188, 225), Color::rgb(115, 222, 146), Color::rgb(137, 191, 178),
    Color::rgb(198, 164, 122), Color::rgb(145, 197, 148), Color::rgb(115, 223, 145), Color::rgb(227, 143, 114),
    Color::rgb(124, 214, 148), Color::rgb(231, 137, 123), Color::rgb(117, 221, 145), Color::rgb(223, 147, 112),
    Color::rgb(111, 193, 228), Color::rgb(121, 214, 154), Color::rgb(118, 189, 223), Color::rgb(224, 114, 197),
    Color::rgb(226, 115, 191), Color::rgb(216, 149, 122), Color::rgb(216, 152, 115), Color::rgb(118, 219, 149),
    Color::rgb(135, 182, 207), Color::rgb(119, 190, 219), Color::rgb(127, 211, 149), Color::rgb(113, 224, 148),
    Color::rgb(111, 193, 227), Color::rgb(185, 171, 132), Color::rgb(219, 120, 193), Color::rgb(224, 115, 194),
    Color::rgb(110, 227, 145), Color::rgb(222, 117, 194), Color::rgb(229, 111, 195), Color::rgb(205, 132, 192),
    Color::rgb(198, 157, 137), Color::rgb(221, 146, 118), Color::rgb(188, 158, 156), Color::rgb(118, 189, 222),
    Color::rgb(223, 115, 197), Color::rgb(115, 222, 147), Color::rgb(221, 146, 121), Color::rgb(112, 226, 143),
    Color::rgb(221, 116, 196), Color::rgb(109, 194, 227), Color::rgb(114, 192, 224), Color::rgb(227, 111, 199),
    Color::rgb(232, 108, 195), Color::rgb(128, 189, 204), Color::rgb(123, 193, 201), Color::rgb(123, 215, 146),
    Color::rgb(113, 193, 224), Color::rgb(115, 191, 223), Color::rgb(115, 224, 142), Color::rgb(142, 193, 162),
    Color::rgb(115, 193, 221), Color::rgb(112, 193, 224), Color::rgb(204, 135, 186), Color::rgb(115, 190, 226),
    Color::rgb(223, 116, 194), Color::rgb(220, 146, 120), Color::rgb(224, 145, 115), Color::rgb(114, 191, 226),
    Color::rgb(108, 195, 227), Color::rgb(117, 189, 226), Color::rgb(223, 116, 195), Color::rgb(114, 222, 148),
    Color::rgb(223, 115, 196), Color::rgb(109, 228, 145), Color::rgb(114, 192, 225), Color::rgb(117, 219, 149),
    Color::rgb(215, 123, 194), Color::rgb(222, 148, 113), Color::rgb(224, 143, 120), Color::rgb(228, 111, 195),
    Color::rgb(117, 222, 142), Color::rgb(131, 208, 150), Color::rgb(110, 194, 226), Color::rgb(117, 220, 148),
    Color::rgb(146, 187, 170), Color::rgb(219, 120, 191), Color::rgb(112, 224, 148), Color::rgb(144, 176, 202),
];

/// Color for a class id
pub fn color_for(id: u32) -> Color {
    PALETTE[id as usize % PALETTE_LEN]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_palette_entries_are_distinct() {
        let unique: HashSet<Color> = PALETTE.iter().copied().collect();
        assert_eq!(unique.len(), PALETTE_LEN);
    }

    #[test]
    fn test_palette_is_opaque() {
        assert!(PALETTE.iter().all(Color::is_opaque));
    }

    #[test]
    fn test_color_for_wraps() {
        assert_eq!(color_for(0), PALETTE[0]);
        assert_eq!(color_for(99), PALETTE[99]);
        assert_eq!(color_for(100), PALETTE[0]);
        assert_eq!(color_for(u32::MAX), PALETTE[u32::MAX as usize % PALETTE_LEN]);
    }
}
