//! Error types for recoloring.

use crate::pixel::SizePx;

/// Errors surfaced by the recolor pipeline and token.
///
/// Validation and configuration errors propagate to the caller. Asset
/// availability problems are reported separately through [`AssetError`]
/// because the token recovers from them.
#[derive(Debug, thiserror::Error)]
pub enum RecolorError {
    /// Mask dimensions differ from the source image.
    #[error("mask size {mask:?} does not match source size {image:?}")]
    MaskSizeMismatch { image: SizePx, mask: SizePx },

    /// Brightness factor below zero.
    #[error("brightness must not be negative (got {0})")]
    NegativeBrightness(f32),

    /// The token was resolved without any input.
    #[error("recolor input is empty")]
    EmptyInput,

    /// A structurally required argument is absent.
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    /// The host does not know the requested content pack.
    #[error("unknown content pack: {0}")]
    UnknownContentPack(String),

    /// Loading a source or mask failed in a way that will not recover.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Encoding the generated image failed.
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    /// Writing the generated image failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading a source or mask asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The asset cannot be loaded right now.
    #[error("asset unavailable: {asset}")]
    Unavailable { asset: String },

    /// The asset exists but could not be decoded.
    #[error("failed to decode asset: {0}")]
    Decode(#[from] image::ImageError),

    /// Any other I/O failure while reading the asset.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl AssetError {
    /// Returns true if resolution should fall back instead of failing.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Decode(_))
    }
}

/// A desaturation or flip mode name that matches no known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode name: {0:?}")]
pub struct UnknownMode(pub String);
