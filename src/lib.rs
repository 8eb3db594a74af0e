//! imaged-recolor: on-demand recoloring of game textures
//!
//! This crate generates recolored variants of source images from a small
//! set of parameters, caches them on disk, and reports the cache path to a
//! host patching system through a polled token.
//!
//! # Pipeline
//!
//! The pixel work is a pure function of the source, an optional mask and
//! the parameters:
//!
//! ```
//! use image::Rgba;
//! use imaged_recolor::{
//!     BlendConfig, DesaturationMode, ExtractConfig, FlipMode, PixelBuffer, RecolorPipeline,
//! };
//!
//! let source = PixelBuffer::from_pixels(2, 1, &[[255, 0, 0, 255], [0, 255, 0, 255]]).unwrap();
//! let pipeline = RecolorPipeline::new(
//!     ExtractConfig::new(DesaturationMode::None, 1.0),
//!     BlendConfig::new(Rgba([255, 255, 255, 255])),
//!     FlipMode::Horizontal,
//! );
//!
//! let output = pipeline.render(&source, None).unwrap();
//! assert_eq!(output.to_pixels(), vec![[0, 255, 0, 255], [255, 0, 0, 255]]);
//! ```
//!
//! # Token
//!
//! [`RecolorToken`] parses token input into a [`RecolorRequest`], derives
//! a deterministic cache path, and only runs the pipeline when that file
//! does not exist yet:
//!
//! ```
//! use imaged_recolor::{RecolorRequest, TokenSettings, path_for};
//!
//! let settings = TokenSettings::default();
//! let request = RecolorRequest::parse(
//!     Some("me.hats, Characters/Abigail, gamecontent, none, #ff8080, luma, 1.2, horizontal"),
//!     &settings,
//! )
//! .unwrap();
//!
//! let path = path_for(&request, &settings);
//! assert!(path.starts_with("generated/Characters/Abigail_recolored_"));
//! assert_eq!(path, path_for(&request.clone(), &settings));
//! ```

mod cache_key;
mod color;
mod error;
mod host;
mod pixel;
mod request;
mod settings;
mod stage;
mod token;

pub use cache_key::{CacheKey, path_for};
pub use color::{format_tint, parse_tint};
pub use error::{AssetError, RecolorError, UnknownMode};
pub use host::{
    ContentHost, DirectoryHost, ImageEncoder, PngFileEncoder, join_relative, write_image,
};
pub use pixel::{PixelBuffer, SizePx};
pub use request::{AssetSource, DEFAULT_BRIGHTNESS, DEFAULT_TINT, RecolorRequest};
pub use settings::TokenSettings;
pub use stage::{
    BlendConfig, DesaturationMode, ExtractConfig, FlipMode, RecolorPipeline, RenderContext,
    StageEffect, color_blend, desaturate, desaturate_buffer, extract, flip,
};
pub use token::{RecolorToken, TokenState, ValueProvider, Values};
