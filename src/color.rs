//! Textual tint colors.

use image::Rgba;
use palette::Srgb;

/// Parses a tint written as hex (`#RGB`, `#RRGGBB`, `#RRGGBBAA`, leading
/// `#` optional) or as a CSS color name (`"salmon"`).
///
/// Colors without an alpha component are opaque. Returns `None` for
/// anything else.
pub fn parse_tint(text: &str) -> Option<Rgba<u8>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(named) = palette::named::from_str(&text.to_ascii_lowercase()) {
        return Some(Rgba([named.red, named.green, named.blue, u8::MAX]));
    }

    let hex = text.strip_prefix('#').unwrap_or(text);
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let (rgb, alpha) = match hex.len() {
        3 | 6 => (hex, u8::MAX),
        8 => (&hex[..6], u8::from_str_radix(&hex[6..], 16).ok()?),
        _ => return None,
    };
    let color: Srgb<u8> = rgb.parse().ok()?;
    Some(Rgba([color.red, color.green, color.blue, alpha]))
}

/// Formats a tint as `#rrggbbaa`.
pub fn format_tint(tint: Rgba<u8>) -> String {
    let [r, g, b, a] = tint.0;
    format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
}
