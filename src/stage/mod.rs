//! The recolor pipeline and its stages.
//!
//! Each stage config implements [`StageEffect`], which transforms the image
//! held by a [`RenderContext`]. [`RecolorPipeline`] runs the stages in a
//! fixed order:
//!
//! ```text
//! Source (+ optional mask)
//!     │
//!     ▼
//! ┌─────────┐
//! │ Extract │ ◄── desaturate, mask, brightness
//! └────┬────┘
//!      ▼
//! ┌─────────┐
//! │  Blend  │ ◄── multiply by tint
//! └────┬────┘
//!      ▼
//! ┌─────────┐
//! │  Flip   │ ◄── geometric, always last
//! └─────────┘
//! ```
//!
//! All stages are pure: they read the current image and replace it with a
//! freshly allocated buffer.

pub mod blend;
pub mod desaturate;
pub mod extract;
pub mod flip;

pub use blend::{BlendConfig, color_blend};
pub use desaturate::{DesaturationMode, desaturate, desaturate_buffer};
pub use extract::{ExtractConfig, extract};
pub use flip::{FlipMode, flip};

use crate::error::RecolorError;
use crate::pixel::PixelBuffer;

// ============================================================================
// Render Context
// ============================================================================

/// State that flows through the pipeline.
pub struct RenderContext<'a> {
    /// The current image being processed.
    pub image: PixelBuffer,

    /// Optional mask selecting which part of the source is kept.
    pub mask: Option<&'a PixelBuffer>,
}

impl<'a> RenderContext<'a> {
    /// Creates a context holding a copy of `source`.
    pub fn new(source: &PixelBuffer, mask: Option<&'a PixelBuffer>) -> Self {
        Self {
            image: source.clone(),
            mask,
        }
    }
}

// ============================================================================
// Stage Trait
// ============================================================================

/// A single pipeline stage.
pub trait StageEffect {
    /// Replaces `ctx.image` with the transformed image.
    ///
    /// On error the context is left as it was.
    fn transform(&self, ctx: &mut RenderContext<'_>) -> Result<(), RecolorError>;
}

// ============================================================================
// Recolor Pipeline
// ============================================================================

/// Extract, blend and flip, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RecolorPipeline {
    pub extract: ExtractConfig,
    pub blend: BlendConfig,
    pub flip: FlipMode,
}

impl RecolorPipeline {
    pub fn new(extract: ExtractConfig, blend: BlendConfig, flip: FlipMode) -> Self {
        Self {
            extract,
            blend,
            flip,
        }
    }

    /// Runs the pipeline over `source`.
    ///
    /// Neither input is modified. Validation errors from the extract stage
    /// abort before any other work happens.
    pub fn render(
        &self,
        source: &PixelBuffer,
        mask: Option<&PixelBuffer>,
    ) -> Result<PixelBuffer, RecolorError> {
        let mut ctx = RenderContext::new(source, mask);
        self.extract.transform(&mut ctx)?;
        self.blend.transform(&mut ctx)?;
        self.flip.transform(&mut ctx)?;
        Ok(ctx.image)
    }
}
