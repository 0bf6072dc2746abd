// SPDX-License-Identifier: GPL-3.0-only

//! Frames handed to the application by the poll-sink

use crate::errors::{PipelineError, PipelineResult};
use gstreamer_video::VideoInfo;
use std::time::Instant;

/// One decoded video image owned by the caller.
///
/// The pixel buffer is copied out of the framework sample, so dropping the
/// frame never affects buffers the pipeline still uses.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Pixel format name as GStreamer spells it ("RGB", "BGRx", ...)
    pub format: String,
    pub width: u32,
    pub height: u32,
    /// Bytes per row, may include padding
    pub stride: usize,
    pub data: Vec<u8>,
    /// When the sample was pulled
    pub captured_at: Instant,
}

/// Byte offsets of red, green and blue inside one pixel
struct RgbLayout {
    bytes_per_pixel: usize,
    offsets: [usize; 3],
}

impl RgbLayout {
    fn for_format(format: &str) -> Option<Self> {
        let (bytes_per_pixel, offsets) = match format {
            "RGB" => (3, [0, 1, 2]),
            "BGR" => (3, [2, 1, 0]),
            "RGBA" | "RGBx" => (4, [0, 1, 2]),
            "BGRA" | "BGRx" => (4, [2, 1, 0]),
            "ARGB" | "xRGB" => (4, [1, 2, 3]),
            "ABGR" | "xBGR" => (4, [3, 2, 1]),
            "GRAY8" => (1, [0, 0, 0]),
            _ => return None,
        };
        Some(Self {
            bytes_per_pixel,
            offsets,
        })
    }
}

impl Frame {
    /// Copy a poll-sink sample into an owned frame
    pub fn from_sample(sample: &gstreamer::Sample) -> PipelineResult<Self> {
        let caps = sample
            .caps()
            .ok_or_else(|| PipelineError::MalformedSample("sample has no caps".into()))?;
        let info = VideoInfo::from_caps(caps)
            .map_err(|e| PipelineError::MalformedSample(format!("unreadable caps: {}", e)))?;
        let buffer = sample
            .buffer()
            .ok_or_else(|| PipelineError::MalformedSample("sample has no buffer".into()))?;
        let map = buffer
            .map_readable()
            .map_err(|e| PipelineError::MalformedSample(format!("cannot map buffer: {}", e)))?;

        let stride = info.stride()[0];
        if stride <= 0 {
            return Err(PipelineError::MalformedSample(format!(
                "invalid stride {}",
                stride
            )));
        }

        let frame = Self {
            format: info.format().to_str().to_string(),
            width: info.width(),
            height: info.height(),
            stride: stride as usize,
            data: map.as_slice().to_vec(),
            captured_at: Instant::now(),
        };

        if frame.data.len() < frame.expected_len() {
            return Err(PipelineError::MalformedSample(format!(
                "buffer holds {} bytes, {}x{} {} needs {}",
                frame.data.len(),
                frame.width,
                frame.height,
                frame.format,
                frame.expected_len()
            )));
        }
        Ok(frame)
    }

    /// Bytes per pixel for packed formats this crate understands
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        RgbLayout::for_format(&self.format).map(|layout| layout.bytes_per_pixel)
    }

    /// Minimum buffer size implied by the declared geometry
    pub fn expected_len(&self) -> usize {
        if self.height == 0 {
            return 0;
        }
        let row = self
            .bytes_per_pixel()
            .map(|bpp| bpp * self.width as usize)
            .unwrap_or(self.stride);
        self.stride * (self.height as usize - 1) + row
    }

    fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.data
            .chunks(self.stride.max(1))
            .take(self.height as usize)
    }

    /// Convert to a tightly packed RGB image
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        let layout = RgbLayout::for_format(&self.format)?;
        let mut packed = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for row in self.rows() {
            for px in row
                .chunks_exact(layout.bytes_per_pixel)
                .take(self.width as usize)
            {
                packed.extend(layout.offsets.iter().map(|&o| px[o]));
            }
        }
        image::RgbImage::from_raw(self.width, self.height, packed)
    }

    /// Convert to 8-bit luma, one byte per pixel, no padding
    pub fn to_luma(&self) -> Option<Vec<u8>> {
        let layout = RgbLayout::for_format(&self.format)?;
        let mut luma = Vec::with_capacity(self.width as usize * self.height as usize);
        for row in self.rows() {
            for px in row
                .chunks_exact(layout.bytes_per_pixel)
                .take(self.width as usize)
            {
                let [r, g, b] = layout.offsets.map(|o| px[o] as u32);
                // BT.601 weights
                luma.push(((r * 299 + g * 587 + b * 114) / 1000) as u8);
            }
        }
        (luma.len() == self.width as usize * self.height as usize).then_some(luma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(format: &str, width: u32, height: u32, stride: usize, data: Vec<u8>) -> Frame {
        Frame {
            format: format.to_string(),
            width,
            height,
            stride,
            data,
            captured_at: Instant::now(),
        }
    }

    #[test]
    fn test_expected_len_ignores_last_row_padding() {
        let f = frame("RGB", 3, 2, 12, vec![0; 21]);
        assert_eq!(f.bytes_per_pixel(), Some(3));
        assert_eq!(f.expected_len(), 21);
    }

    #[test]
    fn test_to_rgb_image_strips_padding() {
        // 1x2 BGRx with 8-byte stride
        let data = vec![3, 2, 1, 0, 9, 9, 9, 9, 30, 20, 10, 0];
        let f = frame("BGRx", 1, 2, 8, data);
        let image = f.to_rgb_image().unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3]);
        assert_eq!(image.get_pixel(0, 1).0, [10, 20, 30]);
    }

    #[test]
    fn test_to_luma() {
        let f = frame("RGB", 2, 1, 6, vec![255, 255, 255, 0, 0, 0]);
        assert_eq!(f.to_luma(), Some(vec![255, 0]));
    }

    #[test]
    fn test_unknown_format() {
        let f = frame("I420", 2, 2, 2, vec![0; 6]);
        assert_eq!(f.bytes_per_pixel(), None);
        assert!(f.to_rgb_image().is_none());
        assert!(f.to_luma().is_none());
    }
}
