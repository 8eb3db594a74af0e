//! Tint blending by multiplication.

use image::Rgba;

use super::{RenderContext, StageEffect};
use crate::error::RecolorError;
use crate::pixel::PixelBuffer;

/// Configuration for the tint stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendConfig {
    /// Straight (non-premultiplied) RGBA tint.
    pub tint: Rgba<u8>,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            tint: Rgba([255, 255, 255, 255]),
        }
    }
}

impl BlendConfig {
    pub fn new(tint: Rgba<u8>) -> Self {
        Self { tint }
    }
}

impl StageEffect for BlendConfig {
    fn transform(&self, ctx: &mut RenderContext<'_>) -> Result<(), RecolorError> {
        ctx.image = color_blend(&ctx.image, self.tint);
        Ok(())
    }
}

/// Multiplies every pixel of `source` by `tint`.
///
/// The buffer is premultiplied, so the tint alpha scales the color channels
/// as well as coverage. Integer division truncates at each step:
/// `c * tint.c / 255 * tint.a / 255` for color, `a * tint.a / 255` for alpha.
pub fn color_blend(source: &PixelBuffer, tint: Rgba<u8>) -> PixelBuffer {
    let [tr, tg, tb, ta] = tint.0.map(u32::from);
    let mut data = source.data.clone();

    for pixel in data.pixels_mut() {
        let [r, g, b, a] = pixel.0.map(u32::from);
        pixel.0 = [
            (r * tr / 255 * ta / 255) as u8,
            (g * tg / 255 * ta / 255) as u8,
            (b * tb / 255 * ta / 255) as u8,
            (a * ta / 255) as u8,
        ];
    }

    PixelBuffer::new(data)
}
