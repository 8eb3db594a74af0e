//! Pixel buffer types.
//!
//! A [`PixelBuffer`] is a width x height grid of 8-bit RGBA pixels with
//! premultiplied alpha. Every stage of the recolor pipeline consumes and
//! produces these buffers.

use image::{Rgba, RgbaImage};

use crate::error::RecolorError;

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels covered by this size.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// An RGBA image whose color channels are premultiplied by alpha.
///
/// The buffer always holds exactly `width * height` pixels. Operations that
/// combine two buffers require equal dimensions; see
/// [`PixelBuffer::ensure_same_size`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// The pixel data in row-major RGBA order.
    pub data: RgbaImage,
}

impl PixelBuffer {
    /// Wraps decoded image data.
    pub fn new(data: RgbaImage) -> Self {
        Self { data }
    }

    /// Creates a fully transparent buffer of the given size.
    pub fn transparent(size: SizePx) -> Self {
        Self::new(RgbaImage::new(size.width, size.height))
    }

    /// Builds a buffer from row-major pixels.
    ///
    /// Returns `None` if `pixels.len()` is not `width * height`.
    pub fn from_pixels(width: u32, height: u32, pixels: &[[u8; 4]]) -> Option<Self> {
        if pixels.len() != SizePx::new(width, height).area() {
            return None;
        }
        let raw = pixels.iter().flatten().copied().collect();
        RgbaImage::from_raw(width, height, raw).map(Self::new)
    }

    /// Converts decoded straight-alpha data into a premultiplied buffer.
    pub fn from_straight_alpha(mut data: RgbaImage) -> Self {
        for pixel in data.pixels_mut() {
            let alpha = pixel.0[3] as u32;
            for channel in &mut pixel.0[..3] {
                *channel = (*channel as u32 * alpha / 255) as u8;
            }
        }
        Self::new(data)
    }

    /// Returns the pixel dimensions of the buffer.
    pub fn dimensions(&self) -> SizePx {
        SizePx::new(self.data.width(), self.data.height())
    }

    pub fn width(&self) -> u32 {
        self.data.width()
    }

    pub fn height(&self) -> u32 {
        self.data.height()
    }

    /// Returns the pixels in row-major order.
    pub fn pixels(&self) -> impl ExactSizeIterator<Item = &Rgba<u8>> {
        self.data.pixels()
    }

    /// Copies the pixels out as plain channel arrays.
    pub fn to_pixels(&self) -> Vec<[u8; 4]> {
        self.data.pixels().map(|p| p.0).collect()
    }

    /// Fails with [`RecolorError::MaskSizeMismatch`] unless `mask` has the
    /// same dimensions as `self`.
    pub fn ensure_same_size(&self, mask: &PixelBuffer) -> Result<(), RecolorError> {
        if self.dimensions() != mask.dimensions() {
            return Err(RecolorError::MaskSizeMismatch {
                image: self.dimensions(),
                mask: mask.dimensions(),
            });
        }
        Ok(())
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(data: RgbaImage) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_px_area() {
        assert_eq!(SizePx::new(3, 4).area(), 12);
        assert_eq!(SizePx::new(0, 4).area(), 0);
    }

    #[test]
    fn from_pixels_checks_length() {
        assert!(PixelBuffer::from_pixels(2, 2, &[[0, 0, 0, 0]; 3]).is_none());

        let buf = PixelBuffer::from_pixels(2, 1, &[[1, 2, 3, 4], [5, 6, 7, 8]]).unwrap();
        assert_eq!(buf.dimensions(), SizePx::new(2, 1));
        assert_eq!(buf.data.get_pixel(1, 0).0, [5, 6, 7, 8]);
        assert_eq!(buf.to_pixels(), vec![[1, 2, 3, 4], [5, 6, 7, 8]]);
    }

    #[test]
    fn transparent_buffer_is_zeroed() {
        let buf = PixelBuffer::transparent(SizePx::new(4, 2));
        assert_eq!(buf.pixels().len(), 8);
        assert!(buf.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn straight_alpha_is_premultiplied() {
        let data = RgbaImage::from_raw(2, 1, vec![200, 100, 50, 128, 9, 9, 9, 255]).unwrap();
        let buf = PixelBuffer::from_straight_alpha(data);
        assert_eq!(buf.to_pixels(), vec![[100, 50, 25, 128], [9, 9, 9, 255]]);
    }

    #[test]
    fn ensure_same_size_reports_both_sizes() {
        let a = PixelBuffer::transparent(SizePx::new(4, 4));
        let b = PixelBuffer::transparent(SizePx::new(4, 2));

        assert!(a.ensure_same_size(&a.clone()).is_ok());
        match a.ensure_same_size(&b) {
            Err(RecolorError::MaskSizeMismatch { image, mask }) => {
                assert_eq!(image, SizePx::new(4, 4));
                assert_eq!(mask, SizePx::new(4, 2));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
