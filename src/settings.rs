//! Serializable token configuration.
//!
//! [`TokenSettings`] controls the keywords recognized in token input and
//! where generated files are placed. It round-trips through JSON so an
//! embedding host can keep it in its own config file.
//!
//! # Example
//!
//! ```
//! use imaged_recolor::TokenSettings;
//!
//! let settings = TokenSettings::from_json(r#"{ "outputDir": "cache" }"#).unwrap();
//! assert_eq!(settings.output_dir, "cache");
//! assert_eq!(settings.suffix_tag, "recolored");
//!
//! let json = settings.to_json().unwrap();
//! assert!(json.contains("\"baseContentKeyword\""));
//! ```

use serde::{Deserialize, Serialize};

/// Settings shared by the parser, the path generator and the token.
///
/// # JSON Format
///
/// ```json
/// {
///   "outputDir": "generated",
///   "suffixTag": "recolored",
///   "baseContentKeyword": "gamecontent",
///   "noMaskKeyword": "none",
///   "separator": ","
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct TokenSettings {
    /// Directory, relative to the content pack, holding generated files.
    pub output_dir: String,

    /// Fixed marker placed between the original file name and the hash.
    pub suffix_tag: String,

    /// Source path meaning "load the asset from the base game content".
    /// Compared case-insensitively.
    pub base_content_keyword: String,

    /// Mask path meaning "no mask". Compared case-insensitively.
    pub no_mask_keyword: String,

    /// Separator between positional token arguments.
    pub separator: char,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            output_dir: "generated".to_string(),
            suffix_tag: "recolored".to_string(),
            base_content_keyword: "gamecontent".to_string(),
            no_mask_keyword: "none".to_string(),
            separator: ',',
        }
    }
}

impl TokenSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `source` is the base content keyword.
    pub fn is_base_content(&self, source: &str) -> bool {
        source.trim().eq_ignore_ascii_case(&self.base_content_keyword)
    }

    /// Returns true if `mask` is empty or the no-mask keyword.
    pub fn is_no_mask(&self, mask: &str) -> bool {
        let mask = mask.trim();
        mask.is_empty() || mask.eq_ignore_ascii_case(&self.no_mask_keyword)
    }

    /// Serializes the settings to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the settings to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
