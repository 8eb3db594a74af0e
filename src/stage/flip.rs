//! Buffer mirroring.

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;

use super::{RenderContext, StageEffect};
use crate::error::{RecolorError, UnknownMode};
use crate::pixel::PixelBuffer;

// ============================================================================
// FlipMode
// ============================================================================

/// Mirror axis applied as the last pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum FlipMode {
    /// No flip.
    #[default]
    None,
    /// Mirror columns (left <-> right).
    Horizontal,
    /// Mirror rows (top <-> bottom).
    Vertical,
    /// Horizontal followed by vertical.
    Both,
}

impl FlipMode {
    pub const ALL: [Self; 4] = [Self::None, Self::Horizontal, Self::Vertical, Self::Both];

    /// Canonical lowercase name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for FlipMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FlipMode {
    type Err = UnknownMode;

    /// Parses a flip name case-insensitively.
    ///
    /// Accepts `horizontal` as well as `FlipHorizontally` style names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let name = lower.strip_prefix("flip").unwrap_or(&lower);
        match name {
            "none" => Ok(Self::None),
            "horizontal" | "horizontally" | "h" => Ok(Self::Horizontal),
            "vertical" | "vertically" | "v" => Ok(Self::Vertical),
            "both" => Ok(Self::Both),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

impl StageEffect for FlipMode {
    fn transform(&self, ctx: &mut RenderContext<'_>) -> Result<(), RecolorError> {
        ctx.image = flip(&ctx.image, *self);
        Ok(())
    }
}

// ============================================================================
// Flipping
// ============================================================================

/// Returns a mirrored copy of `source`.
///
/// The result is always a new buffer, also for [`FlipMode::None`].
pub fn flip(source: &PixelBuffer, mode: FlipMode) -> PixelBuffer {
    match mode {
        FlipMode::None => source.clone(),
        FlipMode::Horizontal => flip_horizontal(source),
        FlipMode::Vertical => flip_vertical(source),
        FlipMode::Both => {
            let mirrored = flip_horizontal(source);
            flip_vertical(&mirrored)
        }
    }
}

fn flip_horizontal(source: &PixelBuffer) -> PixelBuffer {
    let (width, height) = (source.width(), source.height());
    let src = &source.data;
    PixelBuffer::new(RgbaImage::from_fn(width, height, |col, row| {
        *src.get_pixel(width - 1 - col, row)
    }))
}

fn flip_vertical(source: &PixelBuffer) -> PixelBuffer {
    let (width, height) = (source.width(), source.height());
    let mut dest = RgbaImage::new(width, height);
    let stride = width as usize * 4;
    if stride == 0 {
        return PixelBuffer::new(dest);
    }

    // Whole rows are copied as blocks.
    let src_rows = source.data.as_raw().chunks_exact(stride);
    let dest_rows = dest.chunks_exact_mut(stride).rev();
    for (dest_row, src_row) in dest_rows.zip(src_rows) {
        dest_row.copy_from_slice(src_row);
    }
    PixelBuffer::new(dest)
}
