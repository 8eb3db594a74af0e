//! Deterministic cache paths for generated images.
//!
//! A generated file is named after the image it was derived from plus a
//! suffix hashing every parameter that affects its pixels:
//!
//! ```text
//! generated/<dir>/<stem>_recolored_<hash>.<ext>
//! ```
//!
//! The file name is the whole cache key; no metadata is stored next to it.

use std::fmt;
use std::hash::Hasher;

use siphasher::sip128::{Hasher128, SipHasher13};

use crate::request::{AssetSource, RecolorRequest};
use crate::settings::TokenSettings;

/// Hash of the output-affecting fields of a [`RecolorRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    h1: u64,
    h2: u64,
}

impl CacheKey {
    /// Computes the key for a request.
    ///
    /// The hasher uses fixed keys, so the result is stable across runs and
    /// machines. Every field is length-prefixed before hashing.
    pub fn from_request(request: &RecolorRequest) -> Self {
        let mut hasher = SipHasher13::new();

        match &request.source {
            AssetSource::BaseContent => {
                write_field(&mut hasher, b'B', request.asset_name.as_bytes())
            }
            AssetSource::Pack(path) => write_field(&mut hasher, b'P', path.as_bytes()),
        }
        match &request.mask {
            Some(mask) => write_field(&mut hasher, b'M', mask.as_bytes()),
            None => write_field(&mut hasher, b'N', &[]),
        }
        write_field(&mut hasher, b'D', request.desaturation.name().as_bytes());
        write_field(&mut hasher, b'T', &request.tint.0);
        // +0.0 and -0.0 compare equal, so they must hash equal.
        let brightness = if request.brightness == 0.0 {
            0.0_f32
        } else {
            request.brightness
        };
        write_field(&mut hasher, b'L', &brightness.to_bits().to_le_bytes());
        write_field(&mut hasher, b'F', request.flip.name().as_bytes());

        let hash = hasher.finish128();
        Self {
            h1: hash.h1,
            h2: hash.h2,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.h1, self.h2)
    }
}

fn write_field(hasher: &mut SipHasher13, tag: u8, bytes: &[u8]) {
    hasher.write(&[tag]);
    hasher.write(&(bytes.len() as u64).to_le_bytes());
    hasher.write(bytes);
}

/// Returns the relative path of the image generated for `request`.
///
/// Paths always use `/` separators. Base content sources have no file of
/// their own, so the asset name with a `.png` extension stands in for it.
/// Empty, `.` and `..` segments of the source path are dropped, so the
/// result always stays below `settings.output_dir`.
pub fn path_for(request: &RecolorRequest, settings: &TokenSettings) -> String {
    let base = match &request.source {
        AssetSource::BaseContent => format!("{}.png", request.asset_name),
        AssetSource::Pack(path) => path.clone(),
    };
    let mut segments: Vec<&str> = base
        .split(['/', '\\'])
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .collect();
    let file = segments.pop().unwrap_or_default();

    let (stem, ext) = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, ext),
        _ => (file, "png"),
    };

    let key = CacheKey::from_request(request);
    let name = format!("{stem}_{}_{key}.{ext}", settings.suffix_tag);

    let mut path = settings.output_dir.trim_end_matches('/').to_string();
    for dir in segments {
        path.push('/');
        path.push_str(dir);
    }
    path.push('/');
    path.push_str(&name);
    path
}
