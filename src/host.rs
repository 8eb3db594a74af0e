//! Collaborators provided by the embedding host.
//!
//! The token never touches content packs or the base game content
//! directly. It goes through [`ContentHost`] to locate packs, load images
//! and invalidate the host's asset cache, and through [`ImageEncoder`] to
//! persist generated images.
//!
//! [`DirectoryHost`] and [`PngFileEncoder`] are plain file-system
//! implementations, usable on their own or as a reference for host glue.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader};

use crate::error::{AssetError, RecolorError};
use crate::pixel::PixelBuffer;
use crate::request::AssetSource;

// ============================================================================
// Traits
// ============================================================================

/// Access to host-managed content.
pub trait ContentHost {
    /// Returns the root directory of a content pack, or `None` if the host
    /// does not know the pack.
    fn pack_directory(&self, pack_id: &str) -> Option<PathBuf>;

    /// Loads an image as a premultiplied buffer.
    ///
    /// For [`AssetSource::BaseContent`] the image is looked up by
    /// `asset_name`; for [`AssetSource::Pack`] by the pack-relative path.
    /// Images that cannot be loaded right now must be reported as
    /// [`AssetError::Unavailable`].
    fn load_image(
        &self,
        pack_id: &str,
        asset_name: &str,
        source: &AssetSource,
    ) -> Result<PixelBuffer, AssetError>;

    /// Tells the host to drop its cached copy of `asset_name`.
    fn invalidate(&mut self, asset_name: &str);
}

/// Serializes a buffer to an image file.
pub trait ImageEncoder {
    /// Writes `image` to `path`. Parent directories already exist.
    fn encode(&self, image: &PixelBuffer, path: &Path) -> Result<(), RecolorError>;
}

// ============================================================================
// PngFileEncoder
// ============================================================================

/// Writes buffers as PNG files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngFileEncoder;

impl ImageEncoder for PngFileEncoder {
    fn encode(&self, image: &PixelBuffer, path: &Path) -> Result<(), RecolorError> {
        let mut writer = BufWriter::new(File::create(path)?);
        image.data.write_to(&mut writer, ImageFormat::Png)?;
        writer.flush()?;
        Ok(())
    }
}

// ============================================================================
// DirectoryHost
// ============================================================================

/// A [`ContentHost`] backed by plain directories.
///
/// Base content assets resolve to `<base_content>/<asset_name>.png`; pack
/// assets resolve relative to the registered pack directory. Decoded PNGs
/// carry straight alpha and are premultiplied on load. Invalidation
/// requests are recorded for the embedding code to drain.
#[derive(Debug, Clone, Default)]
pub struct DirectoryHost {
    base_content: PathBuf,
    packs: HashMap<String, PathBuf>,
    invalidated: Vec<String>,
}

impl DirectoryHost {
    /// Creates a host reading base content from `base_content`.
    pub fn new(base_content: impl Into<PathBuf>) -> Self {
        Self {
            base_content: base_content.into(),
            ..Self::default()
        }
    }

    /// Registers a content pack directory.
    pub fn with_pack(mut self, pack_id: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.add_pack(pack_id, dir);
        self
    }

    /// Registers a content pack directory.
    pub fn add_pack(&mut self, pack_id: impl Into<String>, dir: impl Into<PathBuf>) {
        self.packs.insert(pack_id.into(), dir.into());
    }

    /// Returns and clears the asset names invalidated so far.
    pub fn take_invalidated(&mut self) -> Vec<String> {
        std::mem::take(&mut self.invalidated)
    }

    fn resolve(&self, pack_id: &str, asset_name: &str, source: &AssetSource) -> Option<PathBuf> {
        match source {
            AssetSource::BaseContent => Some(join_relative(
                &self.base_content,
                &format!("{asset_name}.png"),
            )),
            AssetSource::Pack(path) => {
                self.packs.get(pack_id).map(|dir| join_relative(dir, path))
            }
        }
    }
}

impl ContentHost for DirectoryHost {
    fn pack_directory(&self, pack_id: &str) -> Option<PathBuf> {
        self.packs.get(pack_id).cloned()
    }

    fn load_image(
        &self,
        pack_id: &str,
        asset_name: &str,
        source: &AssetSource,
    ) -> Result<PixelBuffer, AssetError> {
        let unavailable = || AssetError::Unavailable {
            asset: match source {
                AssetSource::BaseContent => asset_name.to_string(),
                AssetSource::Pack(path) => path.clone(),
            },
        };
        let path = self
            .resolve(pack_id, asset_name, source)
            .ok_or_else(unavailable)?;

        let reader = ImageReader::open(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => unavailable(),
            _ => AssetError::Io(err),
        })?;
        let decoded = reader.with_guessed_format()?.decode()?.to_rgba8();
        Ok(PixelBuffer::from_straight_alpha(decoded))
    }

    fn invalidate(&mut self, asset_name: &str) {
        self.invalidated.push(asset_name.to_string());
    }
}

/// Joins a `/`-separated relative path onto `root`.
pub fn join_relative(root: &Path, relative: &str) -> PathBuf {
    relative
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// Encodes `image` to `path`, creating parent directories first.
///
/// The image is encoded into a temporary file next to `path` and moved into
/// place only after the encoder succeeds, so `path` never holds a partial
/// image.
pub fn write_image<E: ImageEncoder>(
    encoder: &E,
    image: &PixelBuffer,
    path: &Path,
) -> Result<(), RecolorError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let staging = tempfile::Builder::new()
        .prefix(".recolor-")
        .suffix(".part")
        .tempfile_in(parent)?
        .into_temp_path();
    encoder.encode(image, &staging)?;
    staging.persist(path).map_err(|err| err.error)?;
    Ok(())
}
