//! Per-pixel desaturation.

use std::fmt;
use std::str::FromStr;

use image::Rgba;
use palette::{Hsl, IntoColor, Srgb};

use crate::error::UnknownMode;
use crate::pixel::PixelBuffer;

// ============================================================================
// DesaturationMode
// ============================================================================

/// How color channels are reduced to a single gray value.
///
/// Every mode except [`None`](Self::None) replaces R, G and B with the same
/// derived value. Alpha is never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DesaturationMode {
    /// Leave the pixel unchanged.
    #[default]
    None,
    /// Rec. 601 luma, `(299 R + 587 G + 114 B) / 1000`.
    Luma,
    /// Arithmetic mean of the three channels.
    Average,
    /// Largest channel (HSV value).
    MaxChannel,
    /// Smallest channel.
    MinChannel,
    /// HSL lightness, the midpoint of the largest and smallest channel.
    Lightness,
}

impl DesaturationMode {
    /// All modes, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::None,
        Self::Luma,
        Self::Average,
        Self::MaxChannel,
        Self::MinChannel,
        Self::Lightness,
    ];

    /// Canonical lowercase name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Luma => "luma",
            Self::Average => "average",
            Self::MaxChannel => "max",
            Self::MinChannel => "min",
            Self::Lightness => "lightness",
        }
    }
}

impl fmt::Display for DesaturationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DesaturationMode {
    type Err = UnknownMode;

    /// Parses a mode name case-insensitively.
    ///
    /// Accepts both the short names (`luma`) and the `Desaturate`-prefixed
    /// long names (`DesaturateLuma`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let name = lower.strip_prefix("desaturate").unwrap_or(&lower);
        match name {
            "none" => Ok(Self::None),
            "luma" => Ok(Self::Luma),
            "average" | "avg" => Ok(Self::Average),
            "max" | "maxchannel" => Ok(Self::MaxChannel),
            "min" | "minchannel" => Ok(Self::MinChannel),
            "lightness" => Ok(Self::Lightness),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

// ============================================================================
// Desaturation
// ============================================================================

/// Desaturates a single pixel.
pub fn desaturate(pixel: Rgba<u8>, mode: DesaturationMode) -> Rgba<u8> {
    let [r, g, b, a] = pixel.0;
    let gray = match mode {
        DesaturationMode::None => return pixel,
        DesaturationMode::Luma => luma(r, g, b),
        DesaturationMode::Average => ((r as u16 + g as u16 + b as u16) / 3) as u8,
        DesaturationMode::MaxChannel => r.max(g).max(b),
        DesaturationMode::MinChannel => r.min(g).min(b),
        DesaturationMode::Lightness => lightness(r, g, b),
    };
    Rgba([gray, gray, gray, a])
}

/// Returns a desaturated copy of `source`.
pub fn desaturate_buffer(source: &PixelBuffer, mode: DesaturationMode) -> PixelBuffer {
    let mut data = source.data.clone();
    if mode != DesaturationMode::None {
        for pixel in data.pixels_mut() {
            *pixel = desaturate(*pixel, mode);
        }
    }
    PixelBuffer::new(data)
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

fn lightness(r: u8, g: u8, b: u8) -> u8 {
    let rgb = Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let hsl: Hsl = rgb.into_color();
    (hsl.lightness * 255.0).round().clamp(0.0, 255.0) as u8
}
