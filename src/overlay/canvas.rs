// SPDX-License-Identifier: GPL-3.0-only

//! Drawing target for overlays
//!
//! A [`Canvas`] borrows one plane of packed 32-bit pixels, either a mapped
//! GStreamer video frame or an [`image::RgbaImage`]. Any other pixel layout
//! is rejected at draw time.

use super::Color;
use crate::errors::RenderError;
use gstreamer_video::VideoFormat;

/// Byte offsets of each channel inside a 4-byte pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChannelOrder {
    r: usize,
    g: usize,
    b: usize,
    /// None for padding bytes (the x in BGRx)
    a: Option<usize>,
}

impl ChannelOrder {
    fn for_format(format: VideoFormat) -> Option<Self> {
        let order = |r, g, b, a| Some(Self { r, g, b, a });
        match format {
            VideoFormat::Rgba => order(0, 1, 2, Some(3)),
            VideoFormat::Rgbx => order(0, 1, 2, None),
            VideoFormat::Bgra => order(2, 1, 0, Some(3)),
            VideoFormat::Bgrx => order(2, 1, 0, None),
            VideoFormat::Argb => order(1, 2, 3, Some(0)),
            VideoFormat::Xrgb => order(1, 2, 3, None),
            VideoFormat::Abgr => order(3, 2, 1, Some(0)),
            VideoFormat::Xbgr => order(3, 2, 1, None),
            _ => None,
        }
    }
}

const BYTES_PER_PIXEL: usize = 4;

/// A mutable view of a frame-sized pixel buffer
pub struct Canvas<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
    stride: usize,
    format: VideoFormat,
}

impl<'a> Canvas<'a> {
    /// Wrap a pixel buffer of `height` rows, each `stride` bytes apart
    pub fn new(
        data: &'a mut [u8],
        width: u32,
        height: u32,
        stride: usize,
        format: VideoFormat,
    ) -> Self {
        Self {
            data,
            width,
            height,
            stride,
            format,
        }
    }

    /// Draw directly into an RGBA image
    pub fn from_rgba_image(image: &'a mut image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(
            &mut **image,
            width,
            height,
            width as usize * BYTES_PER_PIXEL,
            VideoFormat::Rgba,
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> VideoFormat {
        self.format
    }

    /// Check that this canvas can be drawn on
    pub(crate) fn channel_order(&self) -> Result<ChannelOrder, RenderError> {
        let order = ChannelOrder::for_format(self.format)
            .ok_or_else(|| RenderError::UnsupportedCanvas(format!("{:?}", self.format)))?;

        let needed = if self.width == 0 || self.height == 0 {
            0
        } else {
            self.stride * (self.height as usize - 1) + self.width as usize * BYTES_PER_PIXEL
        };
        if self.data.len() < needed {
            return Err(RenderError::CanvasTooSmall {
                needed,
                actual: self.data.len(),
            });
        }
        Ok(order)
    }

    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.stride + x as usize * BYTES_PER_PIXEL)
    }

    /// Read one pixel; padding bytes read back as opaque
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let order = ChannelOrder::for_format(self.format)?;
        let offset = self.offset(x as i64, y as i64)?;
        let px = self.data.get(offset..offset + BYTES_PER_PIXEL)?;
        Some(Color::rgba(
            px[order.r],
            px[order.g],
            px[order.b],
            order.a.map(|a| px[a]).unwrap_or(255),
        ))
    }

    /// Composite `color` over one pixel; out-of-bounds writes are clipped
    pub(crate) fn blend_pixel(&mut self, order: ChannelOrder, x: i64, y: i64, color: Color) {
        let Some(offset) = self.offset(x, y) else {
            return;
        };
        let Some(px) = self.data.get_mut(offset..offset + BYTES_PER_PIXEL) else {
            return;
        };

        if color.a == 255 {
            px[order.r] = color.r;
            px[order.g] = color.g;
            px[order.b] = color.b;
            if let Some(a) = order.a {
                px[a] = 255;
            }
            return;
        }

        let alpha = color.a as u32;
        let inverse = 255 - alpha;
        let over = |src: u8, dst: u8| ((src as u32 * alpha + dst as u32 * inverse + 127) / 255) as u8;
        px[order.r] = over(color.r, px[order.r]);
        px[order.g] = over(color.g, px[order.g]);
        px[order.b] = over(color.b, px[order.b]);
        if let Some(a) = order.a {
            px[a] = (alpha + (px[a] as u32 * inverse + 127) / 255).min(255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgrx_channel_mapping() {
        let mut data = vec![0u8; 2 * 2 * 4];
        let mut canvas = Canvas::new(&mut data, 2, 2, 8, VideoFormat::Bgrx);
        let order = canvas.channel_order().unwrap();
        canvas.blend_pixel(order, 1, 0, Color::rgb(10, 20, 30));
        assert_eq!(canvas.pixel(1, 0), Some(Color::rgb(10, 20, 30)));
        drop(canvas);
        assert_eq!(&data[4..8], &[30, 20, 10, 0]);
    }

    #[test]
    fn test_rejects_planar_format() {
        let mut data = vec![0u8; 64];
        let canvas = Canvas::new(&mut data, 4, 4, 4, VideoFormat::I420);
        assert!(matches!(
            canvas.channel_order(),
            Err(RenderError::UnsupportedCanvas(_))
        ));
    }

    #[test]
    fn test_rejects_short_buffer() {
        let mut data = vec![0u8; 10];
        let canvas = Canvas::new(&mut data, 4, 4, 16, VideoFormat::Rgba);
        assert_eq!(
            canvas.channel_order(),
            Err(RenderError::CanvasTooSmall {
                needed: 64,
                actual: 10
            })
        );
    }

    #[test]
    fn test_blend_half_alpha() {
        let mut image = image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255]));
        let mut canvas = Canvas::from_rgba_image(&mut image);
        let order = canvas.channel_order().unwrap();
        canvas.blend_pixel(order, 0, 0, Color::rgba(255, 255, 255, 128));
        let px = canvas.pixel(0, 0).unwrap();
        assert_eq!(px.r, 128);
        assert_eq!(px.a, 255);
    }

    #[test]
    fn test_out_of_bounds_is_clipped() {
        let mut image = image::RgbaImage::new(2, 2);
        let mut canvas = Canvas::from_rgba_image(&mut image);
        let order = canvas.channel_order().unwrap();
        canvas.blend_pixel(order, -1, 0, Color::rgb(1, 1, 1));
        canvas.blend_pixel(order, 2, 1, Color::rgb(1, 1, 1));
        assert_eq!(canvas.pixel(2, 0), None);
        assert!(image.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }
}
