//! Token input parsing.
//!
//! Token input is a list of positional arguments:
//!
//! ```text
//! packId, assetName, sourcePath[, maskPath[, tint[, desaturation[, brightness[, flip]]]]]
//! ```
//!
//! The first three are required. Cosmetic arguments never fail to parse:
//! unknown mode names fall back to `None`, and a malformed tint or
//! brightness falls back to its default.

use std::fmt;

use image::Rgba;
use tracing::debug;

use crate::color::{format_tint, parse_tint};
use crate::error::RecolorError;
use crate::settings::TokenSettings;
use crate::stage::{BlendConfig, DesaturationMode, ExtractConfig, FlipMode, RecolorPipeline};

/// Brightness used when the argument is absent or unparsable.
pub const DEFAULT_BRIGHTNESS: f32 = 1.0;

/// Tint used when the argument is absent or unparsable (opaque white).
pub const DEFAULT_TINT: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Where the source image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetSource {
    /// The host's base game content, looked up by asset name.
    BaseContent,
    /// A file relative to the requesting content pack.
    Pack(String),
}

/// A parsed recolor request.
///
/// Two requests compare equal iff every field is equal; the token relies on
/// this to detect that nothing changed since the previous resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RecolorRequest {
    /// Unique id of the requesting content pack.
    pub content_pack: String,
    /// Asset that the generated image replaces.
    pub asset_name: String,
    pub source: AssetSource,
    /// Mask path relative to the content pack, if any.
    pub mask: Option<String>,
    pub desaturation: DesaturationMode,
    /// Straight RGBA tint.
    pub tint: Rgba<u8>,
    /// Brightness factor. May be negative here; the pipeline rejects it.
    pub brightness: f32,
    pub flip: FlipMode,
}

impl RecolorRequest {
    /// Creates a request with default cosmetic parameters.
    pub fn new(
        content_pack: impl Into<String>,
        asset_name: impl Into<String>,
        source: AssetSource,
    ) -> Self {
        Self {
            content_pack: content_pack.into(),
            asset_name: asset_name.into(),
            source,
            mask: None,
            desaturation: DesaturationMode::None,
            tint: DEFAULT_TINT,
            brightness: DEFAULT_BRIGHTNESS,
            flip: FlipMode::None,
        }
    }

    /// Parses raw token input.
    ///
    /// # Errors
    ///
    /// - [`RecolorError::EmptyInput`] if `raw` is `None` or blank.
    /// - [`RecolorError::MissingArgument`] if the pack id, asset name or
    ///   source path is missing or empty.
    pub fn parse(raw: Option<&str>, settings: &TokenSettings) -> Result<Self, RecolorError> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty());
        let Some(raw) = raw else {
            return Err(RecolorError::EmptyInput);
        };

        let mut args = raw.split(settings.separator).map(str::trim);
        let mut required = |name: &'static str| {
            args.next()
                .filter(|s| !s.is_empty())
                .ok_or(RecolorError::MissingArgument(name))
        };
        let content_pack = required("content pack")?;
        let asset_name = required("asset name")?;
        let source_path = required("source path")?;

        let source = if settings.is_base_content(source_path) {
            AssetSource::BaseContent
        } else {
            AssetSource::Pack(source_path.to_string())
        };
        let mut request = Self::new(content_pack, asset_name, source);

        if let Some(mask) = args.next().filter(|m| !settings.is_no_mask(m)) {
            request.mask = Some(mask.to_string());
        }
        if let Some(tint) = args.next().filter(|s| !s.is_empty()) {
            request.tint = parse_tint(tint).unwrap_or_else(|| {
                debug!(tint, "unparsable tint, using opaque white");
                DEFAULT_TINT
            });
        }
        if let Some(mode) = args.next().filter(|s| !s.is_empty()) {
            request.desaturation = mode.parse::<DesaturationMode>().unwrap_or_else(|err| {
                debug!(%err, "falling back to no desaturation");
                DesaturationMode::None
            });
        }
        if let Some(brightness) = args.next().filter(|s| !s.is_empty()) {
            request.brightness = parse_brightness(brightness);
        }
        if let Some(mode) = args.next().filter(|s| !s.is_empty()) {
            request.flip = mode.parse::<FlipMode>().unwrap_or_else(|err| {
                debug!(%err, "falling back to no flip");
                FlipMode::None
            });
        }

        Ok(request)
    }

    /// Builds the pipeline described by this request.
    pub fn pipeline(&self) -> RecolorPipeline {
        RecolorPipeline::new(
            ExtractConfig::new(self.desaturation, self.brightness),
            BlendConfig::new(self.tint),
            self.flip,
        )
    }

    /// Returns true if the source is loaded from the base content.
    pub fn uses_base_content(&self) -> bool {
        self.source == AssetSource::BaseContent
    }
}

impl fmt::Display for RecolorRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from {} (mask {}, tint {}, desaturation {}, brightness {}, flip {})",
            self.asset_name,
            match &self.source {
                AssetSource::BaseContent => "base content",
                AssetSource::Pack(path) => path.as_str(),
            },
            self.mask.as_deref().unwrap_or("none"),
            format_tint(self.tint),
            self.desaturation,
            self.brightness,
            self.flip,
        )
    }
}

fn parse_brightness(text: &str) -> f32 {
    match text.parse::<f32>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            debug!(brightness = text, "unparsable brightness, using default");
            DEFAULT_BRIGHTNESS
        }
    }
}
