//! Sub-image extraction: desaturate, mask and brighten.

use image::Rgba;

use super::desaturate::{DesaturationMode, desaturate};
use super::{RenderContext, StageEffect};
use crate::error::RecolorError;
use crate::pixel::PixelBuffer;

/// Configuration for the extraction stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractConfig {
    /// Reduction applied to each source pixel.
    pub desaturation: DesaturationMode,

    /// Multiplier applied after masking. Must not be negative.
    pub brightness: f32,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            desaturation: DesaturationMode::None,
            brightness: 1.0,
        }
    }
}

impl ExtractConfig {
    pub fn new(desaturation: DesaturationMode, brightness: f32) -> Self {
        Self {
            desaturation,
            brightness,
        }
    }
}

impl StageEffect for ExtractConfig {
    fn transform(&self, ctx: &mut RenderContext<'_>) -> Result<(), RecolorError> {
        ctx.image = extract(&ctx.image, ctx.mask, self)?;
        Ok(())
    }
}

/// Extracts the part of `source` selected by `mask`.
///
/// Each source pixel is desaturated, then scaled by the mask's luma
/// (`0..=255` mapped to `0.0..=1.0`) and finally by the brightness. Both
/// scalings apply to all four channels and truncate toward zero, so a black
/// mask pixel always yields transparent black. Without a mask the full
/// image is kept.
///
/// # Errors
///
/// - [`RecolorError::MaskSizeMismatch`] if the mask dimensions differ.
/// - [`RecolorError::NegativeBrightness`] if `config.brightness < 0`.
pub fn extract(
    source: &PixelBuffer,
    mask: Option<&PixelBuffer>,
    config: &ExtractConfig,
) -> Result<PixelBuffer, RecolorError> {
    if let Some(mask) = mask {
        source.ensure_same_size(mask)?;
    }
    if config.brightness < 0.0 {
        return Err(RecolorError::NegativeBrightness(config.brightness));
    }

    let mut data = source.data.clone();
    let mut mask_pixels = mask.map(|m| m.pixels());

    for pixel in data.pixels_mut() {
        let strength = match mask_pixels.as_mut().and_then(|it| it.next()) {
            Some(m) => desaturate(*m, DesaturationMode::Luma).0[0],
            None => u8::MAX,
        };
        let gray = desaturate(*pixel, config.desaturation);
        let masked = scale(gray, strength as f32 / 255.0);
        *pixel = scale(masked, config.brightness);
    }

    Ok(PixelBuffer::new(data))
}

/// Multiplies every channel by `factor`, truncating and clamping to `u8`.
fn scale(pixel: Rgba<u8>, factor: f32) -> Rgba<u8> {
    Rgba(pixel.0.map(|c| (c as f32 * factor).clamp(0.0, 255.0) as u8))
}
