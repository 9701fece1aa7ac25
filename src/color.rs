//! Color parsing for the two wire encodings used by content files
//!
//! Supports the following formats:
//! - Hex: `#RRGGBB`, `#RRGGBBAA`
//! - Decimal: `"r g b a"` with each component in 0-255

use image::Rgba;
use thiserror::Error;

/// Error type for color parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// Input string was empty
    #[error("empty color string")]
    Empty,
    /// Invalid length (must be 6 or 8 hex chars after #)
    #[error("invalid color length {0}, expected 6 or 8")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
    /// Decimal form had the wrong number of components
    #[error("expected 4 components 'r g b a', found {0}")]
    ComponentCount(usize),
    /// A decimal component was not in 0-255
    #[error("invalid color component '{0}'")]
    InvalidComponent(String),
}

/// Whether a color string uses the hex encoding.
///
/// Anything starting with `#` is treated as hex; everything else is
/// expected to be the decimal `"r g b a"` form.
pub fn is_hex(s: &str) -> bool {
    s.starts_with('#')
}

/// Parse a color string in either wire encoding into an RGBA color.
///
/// Hex colors without an alpha component default to opaque.
pub fn parse_color(s: &str) -> Result<Rgba<u8>, ColorError> {
    if s.is_empty() {
        return Err(ColorError::Empty);
    }
    if is_hex(s) {
        parse_hex_color(s)
    } else {
        parse_decimal_color(s)
    }
}

/// Format a color back to its wire form.
///
/// With `hex` set, emits `#RRGGBB` for opaque colors and `#RRGGBBAA`
/// otherwise. Without it, emits the decimal `"r g b a"` form.
pub fn format_color(color: Rgba<u8>, hex: bool) -> String {
    let Rgba([r, g, b, a]) = color;
    if hex {
        if a == 255 {
            format!("#{:02X}{:02X}{:02X}", r, g, b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", r, g, b, a)
        }
    } else {
        format!("{} {} {} {}", r, g, b, a)
    }
}

/// Parse a hex color string (#RRGGBB, #RRGGBBAA)
fn parse_hex_color(s: &str) -> Result<Rgba<u8>, ColorError> {
    let hex = &s[1..];
    let len = hex.len();

    for c in hex.chars() {
        if !c.is_ascii_hexdigit() {
            return Err(ColorError::InvalidHex(c));
        }
    }

    match len {
        6 => {
            let r = parse_hex_pair(&hex[0..2])?;
            let g = parse_hex_pair(&hex[2..4])?;
            let b = parse_hex_pair(&hex[4..6])?;
            Ok(Rgba([r, g, b, 255]))
        }
        8 => {
            let r = parse_hex_pair(&hex[0..2])?;
            let g = parse_hex_pair(&hex[2..4])?;
            let b = parse_hex_pair(&hex[4..6])?;
            let a = parse_hex_pair(&hex[6..8])?;
            Ok(Rgba([r, g, b, a]))
        }
        _ => Err(ColorError::InvalidLength(len)),
    }
}

/// Parse the decimal `"r g b a"` form
fn parse_decimal_color(s: &str) -> Result<Rgba<u8>, ColorError> {
    let fields: Vec<&str> = s.split_whitespace().collect();
    if fields.len() != 4 {
        return Err(ColorError::ComponentCount(fields.len()));
    }
    let mut components = [0u8; 4];
    for (i, field) in fields.iter().enumerate() {
        components[i] = field
            .parse::<u8>()
            .map_err(|_| ColorError::InvalidComponent(field.to_string()))?;
    }
    Ok(Rgba(components))
}

/// Parse a single hex digit (0-9, A-F, a-f) to u8 (0-15)
fn parse_hex_digit(c: char) -> Result<u8, ColorError> {
    match c {
        '0'..='9' => Ok(c as u8 - b'0'),
        'a'..='f' => Ok(c as u8 - b'a' + 10),
        'A'..='F' => Ok(c as u8 - b'A' + 10),
        _ => Err(ColorError::InvalidHex(c)),
    }
}

/// Parse a two-character hex string to u8 (0-255)
fn parse_hex_pair(s: &str) -> Result<u8, ColorError> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(high), Some(low)) => Ok(parse_hex_digit(high)? * 16 + parse_hex_digit(low)?),
        _ => Err(ColorError::InvalidLength(s.len())),
    }
}
