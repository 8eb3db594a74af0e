//! The recolor token exposed to the host's patching system.
//!
//! The host polls tokens instead of being notified: it asks a token for its
//! values, and separately asks whether anything changed since the last
//! poll. [`RecolorToken`] answers both, generating images on demand and
//! keeping them in a file cache keyed by their parameters.

use std::fmt;
use std::path::Path;

use tracing::{info, warn};

use crate::cache_key::path_for;
use crate::color::format_tint;
use crate::error::{AssetError, RecolorError};
use crate::host::{ContentHost, ImageEncoder, PngFileEncoder, join_relative, write_image};
use crate::pixel::PixelBuffer;
use crate::request::{AssetSource, RecolorRequest};
use crate::settings::TokenSettings;

// ============================================================================
// ValueProvider Trait
// ============================================================================

/// Values yielded by a provider for one input.
pub type Values = std::option::IntoIter<String>;

/// The host's dynamic value provider contract.
pub trait ValueProvider {
    /// Whether values may change depending on context.
    fn is_mutable(&self) -> bool;

    /// Whether the provider accepts an input argument.
    fn allows_input(&self) -> bool;

    /// Whether the provider yields nothing without an input argument.
    fn requires_input(&self) -> bool;

    /// Whether one input may produce more than one value.
    fn can_have_multiple_values(&self, input: Option<&str>) -> bool;

    /// Returns whether the values for `input` come from a known set, and
    /// that set. Must not have side effects.
    fn has_bounded_values(
        &self,
        input: Option<&str>,
    ) -> Result<(bool, Vec<String>), RecolorError>;

    /// Returns true once after the provider's value changed.
    fn update_context(&mut self) -> bool;

    /// Whether the provider is available for use.
    fn is_ready(&self) -> bool;

    /// Resolves the values for `input`.
    fn values(&mut self, input: Option<&str>) -> Result<Values, RecolorError>;
}

// ============================================================================
// RecolorToken
// ============================================================================

/// Observable state of a [`RecolorToken`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No session is active; the token yields no values.
    Disabled,
    /// Enabled, and the host has seen the latest value.
    Idle,
    /// Enabled, and the value changed since the host last asked.
    PendingChange,
}

impl fmt::Display for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disabled => "disabled",
            Self::Idle => "idle",
            Self::PendingChange => "pending change",
        })
    }
}

/// Generates recolored images and reports their paths to the host.
///
/// A token is driven serially by the host and keeps a one-step memory of
/// the last request it resolved. Resolving a request that differs from the
/// previous one raises a one-shot change flag that the next
/// [`update_context`](ValueProvider::update_context) consumes.
///
/// # Example
///
/// ```no_run
/// use imaged_recolor::{DirectoryHost, RecolorToken, ValueProvider};
///
/// let host = DirectoryHost::new("Content").with_pack("me.hats", "Mods/Hats");
/// let mut token = RecolorToken::new(host);
///
/// token.enable();
/// let path = token
///     .values(Some("me.hats, Characters/Abigail, gamecontent, none, #ff8080"))
///     .unwrap()
///     .next();
/// assert!(token.update_context());
/// ```
pub struct RecolorToken<H: ContentHost, E: ImageEncoder = PngFileEncoder> {
    host: H,
    encoder: E,
    settings: TokenSettings,
    enabled: bool,
    last_request: Option<RecolorRequest>,
    /// Value reported for `last_request`, and whether it was a fallback.
    last_value: Option<(String, bool)>,
    pending_change: bool,
}

impl<H: ContentHost> RecolorToken<H> {
    /// Creates a disabled token writing PNG files with default settings.
    pub fn new(host: H) -> Self {
        Self::with_encoder(host, PngFileEncoder, TokenSettings::default())
    }
}

impl<H: ContentHost, E: ImageEncoder> RecolorToken<H, E> {
    /// Creates a disabled token.
    pub fn with_encoder(host: H, encoder: E, settings: TokenSettings) -> Self {
        Self {
            host,
            encoder,
            settings,
            enabled: false,
            last_request: None,
            last_value: None,
            pending_change: false,
        }
    }

    /// Enables the token when a session starts.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Disables the token when the session ends.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn state(&self) -> TokenState {
        match (self.enabled, self.pending_change) {
            (false, _) => TokenState::Disabled,
            (true, false) => TokenState::Idle,
            (true, true) => TokenState::PendingChange,
        }
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Returns the relative cache path for `input` without generating it.
    pub fn candidate_path(&self, input: Option<&str>) -> Result<String, RecolorError> {
        let request = RecolorRequest::parse(input, &self.settings)?;
        Ok(path_for(&request, &self.settings))
    }

    /// Resolves `input` to the generated path or the fallback asset name.
    ///
    /// The caller must check that the token is enabled.
    fn resolve(&mut self, input: Option<&str>) -> Result<String, RecolorError> {
        let request = RecolorRequest::parse(input, &self.settings)?;
        let pack_dir = self
            .host
            .pack_directory(&request.content_pack)
            .ok_or_else(|| RecolorError::UnknownContentPack(request.content_pack.clone()))?;
        let relative = path_for(&request, &self.settings);

        if self.last_request.as_ref() == Some(&request) {
            match &self.last_value {
                Some((value, false)) => return Ok(value.clone()),
                // Retry a previous fallback; flag a change only if it now succeeds.
                Some((value, true)) => {
                    let previous = value.clone();
                    let resolved = self.produce(&request, &pack_dir, &relative)?;
                    self.pending_change |= resolved.0 != previous;
                    let value = resolved.0.clone();
                    self.last_value = Some(resolved);
                    return Ok(value);
                }
                None => {}
            }
        }

        self.pending_change = true;
        self.last_request = Some(request.clone());
        self.last_value = None;

        info!(
            pack = %request.content_pack,
            asset = %request.asset_name,
            "content pack requests recoloring"
        );
        info!(
            mask = request.mask.as_deref().unwrap_or("none"),
            tint = %format_tint(request.tint),
            desaturation = %request.desaturation,
            brightness = request.brightness,
            flip = %request.flip,
            "recolor parameters"
        );

        let resolved = self.produce(&request, &pack_dir, &relative)?;
        let value = resolved.0.clone();
        self.last_value = Some(resolved);
        Ok(value)
    }

    /// Reuses or generates the file for `request`.
    ///
    /// Returns the reported value and whether it is the fallback asset name.
    fn produce(
        &mut self,
        request: &RecolorRequest,
        pack_dir: &Path,
        relative: &str,
    ) -> Result<(String, bool), RecolorError> {
        let absolute = join_relative(pack_dir, relative);

        if absolute.is_file() {
            info!(path = %absolute.display(), relative, "found existing file");
            self.host.invalidate(&request.asset_name);
            return Ok((relative.to_string(), false));
        }

        match self.generate(request, &absolute) {
            Ok(()) => {
                info!(path = %absolute.display(), relative, "generated file");
                self.host.invalidate(&request.asset_name);
                Ok((relative.to_string(), false))
            }
            Err(GenerateError::Asset(err)) if err.is_recoverable() => {
                info!(
                    asset = %request.asset_name,
                    %err,
                    "ignoring unavailable asset; a later reload will retry"
                );
                Ok((request.asset_name.clone(), true))
            }
            Err(GenerateError::Asset(err)) => {
                warn!(asset = %request.asset_name, %err, "loading asset failed");
                Err(err.into())
            }
            Err(GenerateError::Recolor(err)) => {
                warn!(asset = %request.asset_name, %err, "recoloring failed");
                Err(err)
            }
        }
    }

    fn generate(&self, request: &RecolorRequest, absolute: &Path) -> Result<(), GenerateError> {
        let source = self
            .host
            .load_image(&request.content_pack, &request.asset_name, &request.source)?;
        let mask = match &request.mask {
            Some(mask) => Some(self.load_mask(request, mask)?),
            None => None,
        };

        let output = request.pipeline().render(&source, mask.as_ref())?;
        write_image(&self.encoder, &output, absolute)?;
        Ok(())
    }

    fn load_mask(&self, request: &RecolorRequest, mask: &str) -> Result<PixelBuffer, AssetError> {
        self.host.load_image(
            &request.content_pack,
            &request.asset_name,
            &AssetSource::Pack(mask.to_string()),
        )
    }
}

/// Failure while generating a file, split by who recovers from it.
enum GenerateError {
    Asset(AssetError),
    Recolor(RecolorError),
}

impl From<AssetError> for GenerateError {
    fn from(err: AssetError) -> Self {
        Self::Asset(err)
    }
}

impl From<RecolorError> for GenerateError {
    fn from(err: RecolorError) -> Self {
        Self::Recolor(err)
    }
}

impl<H: ContentHost, E: ImageEncoder> ValueProvider for RecolorToken<H, E> {
    fn is_mutable(&self) -> bool {
        true
    }

    fn allows_input(&self) -> bool {
        true
    }

    fn requires_input(&self) -> bool {
        true
    }

    fn can_have_multiple_values(&self, _input: Option<&str>) -> bool {
        false
    }

    fn has_bounded_values(
        &self,
        input: Option<&str>,
    ) -> Result<(bool, Vec<String>), RecolorError> {
        Ok((true, vec![self.candidate_path(input)?]))
    }

    fn update_context(&mut self) -> bool {
        if self.enabled && self.pending_change {
            self.pending_change = false;
            return true;
        }
        false
    }

    fn is_ready(&self) -> bool {
        self.enabled
    }

    fn values(&mut self, input: Option<&str>) -> Result<Values, RecolorError> {
        if !self.enabled {
            return Ok(None.into_iter());
        }
        Ok(Some(self.resolve(input)?).into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DirectoryHost;
    use image::RgbaImage;
    use std::cell::Cell;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const PACK: &str = "me.hats";

    /// Encoder that counts writes before delegating to PNG. When `fail` is
    /// set it writes a truncated header and reports an error instead.
    #[derive(Default)]
    struct CountingEncoder {
        writes: Cell<usize>,
        fail: Cell<bool>,
    }

    impl ImageEncoder for CountingEncoder {
        fn encode(&self, image: &PixelBuffer, path: &Path) -> Result<(), RecolorError> {
            self.writes.set(self.writes.get() + 1);
            if self.fail.get() {
                fs::write(path, b"\x89PNG")?;
                return Err(io::Error::other("disk full").into());
            }
            PngFileEncoder.encode(image, path)
        }
    }

    struct Fixture {
        dir: TempDir,
        token: RecolorToken<DirectoryHost, CountingEncoder>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let base = dir.path().join("Content");
            let pack = dir.path().join("pack");
            let cow = [255, 0, 0, 255, 0, 255, 0, 255];
            save(&base.join("Animals").join("Cow.png"), 2, 1, &cow);
            let hat = [200u8, 200, 200, 255].repeat(4);
            save(&pack.join("assets").join("hat.png"), 2, 2, &hat);
            save(&pack.join("assets").join("mask.png"), 2, 2, &[
                255, 255, 255, 255, 0, 0, 0, 255, //
                0, 0, 0, 255, 255, 255, 255, 255,
            ]);
            save(&pack.join("assets").join("small_mask.png"), 1, 1, &[255; 4]);

            let host = DirectoryHost::new(&base).with_pack(PACK, &pack);
            let encoder = CountingEncoder::default();
            let mut token = RecolorToken::with_encoder(host, encoder, TokenSettings::default());
            token.enable();
            Self { dir, token }
        }

        fn pack_dir(&self) -> PathBuf {
            self.dir.path().join("pack")
        }

        fn value(&mut self, input: &str) -> Result<Option<String>, RecolorError> {
            Ok(self.token.values(Some(input))?.next())
        }

        fn writes(&self) -> usize {
            self.token.encoder.writes.get()
        }
    }

    fn save(path: &Path, width: u32, height: u32, raw: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbaImage::from_raw(width, height, raw.to_vec()).unwrap().save(path).unwrap();
    }

    #[test]
    fn contract_flags() {
        let token = RecolorToken::new(DirectoryHost::default());
        assert!(token.is_mutable());
        assert!(token.allows_input());
        assert!(token.requires_input());
        assert!(!token.can_have_multiple_values(Some("p, a, s")));
        assert!(!token.is_ready());
        assert_eq!(token.state(), TokenState::Disabled);
    }

    #[test]
    fn generates_base_content_recolor() {
        let mut fx = Fixture::new();
        let input = format!("{PACK}, Animals/Cow, gamecontent, none, white, none, 1.0, horizontal");

        let value = fx.value(&input).unwrap().unwrap();
        assert!(value.starts_with("generated/Animals/Cow_recolored_"));
        assert!(value.ends_with(".png"));

        let written = image::open(join_relative(&fx.pack_dir(), &value)).unwrap().to_rgba8();
        assert_eq!(written.get_pixel(0, 0).0, [0, 255, 0, 255]);
        assert_eq!(written.get_pixel(1, 0).0, [255, 0, 0, 255]);

        assert_eq!(fx.token.host_mut().take_invalidated(), vec!["Animals/Cow"]);
        assert_eq!(fx.writes(), 1);
    }

    #[test]
    fn change_flag_is_edge_triggered() {
        let mut fx = Fixture::new();
        let input = format!("{PACK}, Hats, assets/hat.png, assets/mask.png, #ff0000");

        assert!(!fx.token.update_context());

        let first = fx.value(&input).unwrap();
        assert_eq!(fx.token.state(), TokenState::PendingChange);
        assert!(fx.token.update_context());
        assert!(!fx.token.update_context());

        let second = fx.value(&input).unwrap();
        assert_eq!(first, second);
        assert_eq!(fx.token.state(), TokenState::Idle);
        assert!(!fx.token.update_context());
        assert_eq!(fx.writes(), 1);

        let third = fx.value(&format!("{input}, none, 0.5")).unwrap();
        assert_ne!(first, third);
        assert!(fx.token.update_context());
        assert_eq!(fx.writes(), 2);
    }

    #[test]
    fn existing_file_skips_generation() {
        let mut fx = Fixture::new();
        let input = format!("{PACK}, Hats, assets/hat.png, none, #336699");
        let expected = fx.token.candidate_path(Some(&input)).unwrap();
        save(&join_relative(&fx.pack_dir(), &expected), 1, 1, &[1, 2, 3, 4]);

        let value = fx.value(&input).unwrap();
        assert_eq!(value.as_deref(), Some(expected.as_str()));
        assert_eq!(fx.writes(), 0);
        assert!(fx.token.update_context());
        assert_eq!(fx.token.host_mut().take_invalidated(), vec!["Hats"]);
    }

    #[test]
    fn mask_selects_pixels() {
        let mut fx = Fixture::new();
        let input = format!("{PACK}, Hats, assets/hat.png, assets/mask.png");

        let value = fx.value(&input).unwrap().unwrap();
        let written = image::open(join_relative(&fx.pack_dir(), &value)).unwrap().to_rgba8();
        assert_eq!(written.get_pixel(0, 0).0, [200, 200, 200, 255]);
        assert_eq!(written.get_pixel(1, 0).0, [0, 0, 0, 0]);
        assert_eq!(written.get_pixel(0, 1).0, [0, 0, 0, 0]);
        assert_eq!(written.get_pixel(1, 1).0, [200, 200, 200, 255]);
    }

    #[test]
    fn unavailable_source_falls_back_to_asset_name() {
        let mut fx = Fixture::new();
        let input = format!("{PACK}, Hats, assets/missing.png");

        assert_eq!(fx.value(&input).unwrap().as_deref(), Some("Hats"));
        assert!(fx.token.update_context());
        assert_eq!(fx.writes(), 0);
        assert!(fx.token.host_mut().take_invalidated().is_empty());

        // Still missing: same fallback, no new change.
        assert_eq!(fx.value(&input).unwrap().as_deref(), Some("Hats"));
        assert!(!fx.token.update_context());

        // The asset shows up; the retry succeeds and reports a change.
        save(&fx.pack_dir().join("assets").join("missing.png"), 1, 1, &[9, 9, 9, 255]);
        let value = fx.value(&input).unwrap().unwrap();
        assert!(value.starts_with("generated/assets/missing_recolored_"));
        assert!(fx.token.update_context());
    }

    #[test]
    fn failed_write_is_not_cached() {
        let mut fx = Fixture::new();
        let input = format!("{PACK}, Hats, assets/hat.png, none, #ff8000");
        let expected = fx.token.candidate_path(Some(&input)).unwrap();
        let on_disk = join_relative(&fx.pack_dir(), &expected);
        fx.token.encoder.fail.set(true);

        assert!(matches!(fx.value(&input), Err(RecolorError::Io(_))));
        assert!(!on_disk.exists());
        assert!(fx.token.host_mut().take_invalidated().is_empty());

        // The same request tries to write again rather than reporting the path.
        assert!(fx.value(&input).is_err());
        assert!(!on_disk.exists());
        assert_eq!(fx.writes(), 2);

        fx.token.encoder.fail.set(false);
        assert_eq!(fx.value(&input).unwrap(), Some(expected));
        assert!(image::open(&on_disk).is_ok());
        assert_eq!(fx.writes(), 3);
        assert_eq!(fx.token.host_mut().take_invalidated(), vec!["Hats"]);
    }

    #[test]
    fn unreadable_source_propagates() {
        let mut fx = Fixture::new();
        fs::create_dir_all(fx.pack_dir().join("assets").join("folder.png")).unwrap();

        let result = fx.value(&format!("{PACK}, Hats, assets/folder.png"));
        assert!(matches!(result, Err(RecolorError::Asset(AssetError::Io(_)))));
        assert_eq!(fx.writes(), 0);
    }

    #[test]
    fn unavailable_mask_falls_back() {
        let mut fx = Fixture::new();
        let input = format!("{PACK}, Hats, assets/hat.png, assets/nomask.png");
        assert_eq!(fx.value(&input).unwrap().as_deref(), Some("Hats"));
    }

    #[test]
    fn validation_errors_propagate() {
        let mut fx = Fixture::new();

        let mismatch = fx.value(&format!("{PACK}, Hats, assets/hat.png, assets/small_mask.png"));
        assert!(matches!(mismatch, Err(RecolorError::MaskSizeMismatch { .. })));

        let negative = fx.value(&format!("{PACK}, Hats, assets/hat.png, none, white, none, -1"));
        assert!(matches!(negative, Err(RecolorError::NegativeBrightness(_))));
        assert_eq!(fx.writes(), 0);
    }

    #[test]
    fn configuration_errors_propagate() {
        let mut fx = Fixture::new();
        assert!(matches!(fx.token.values(None), Err(RecolorError::EmptyInput)));
        assert!(matches!(fx.value(PACK), Err(RecolorError::MissingArgument(_))));
        assert!(matches!(
            fx.value("unknown.pack, Hats, assets/hat.png"),
            Err(RecolorError::UnknownContentPack(ref id)) if id == "unknown.pack"
        ));
    }

    #[test]
    fn disabled_token_yields_nothing() {
        let mut fx = Fixture::new();
        let input = format!("{PACK}, Hats, assets/hat.png");

        fx.token.disable();
        assert!(!fx.token.is_ready());
        assert_eq!(fx.value(&input).unwrap(), None);
        assert_eq!(fx.writes(), 0);

        fx.token.enable();
        assert!(fx.token.is_ready());
        assert!(fx.value(&input).unwrap().is_some());

        fx.token.disable();
        assert!(!fx.token.update_context());
        fx.token.enable();
        assert!(fx.token.update_context());
    }

    #[test]
    fn bounded_values_have_no_side_effects() {
        let mut fx = Fixture::new();
        let input = format!("{PACK}, Hats, assets/hat.png, none, red");

        let (bounded, candidates) = fx.token.has_bounded_values(Some(&input)).unwrap();
        assert!(bounded);
        assert_eq!(candidates.len(), 1);
        assert!(!join_relative(&fx.pack_dir(), &candidates[0]).exists());
        assert!(!fx.token.update_context());
        assert_eq!(fx.writes(), 0);

        assert_eq!(fx.value(&input).unwrap().as_ref(), Some(&candidates[0]));
    }
}
