//! Premultiplied RGBA colors as used by shader uniforms.

use serde::{Deserialize, Serialize};

/// An RGBA color with premultiplied alpha, each channel in `[0, 1]`.
///
/// Serialized as a `#rrggbb` or `#rrggbbaa` hex string.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Errors from [`Color::from_hex`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ColorParseError {
    /// The string is not `#` followed by 6 or 8 hex digits.
    #[error("expected #rrggbb or #rrggbbaa, got '{0}'")]
    InvalidFormat(String),
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    /// Build from already-premultiplied channels.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from 8-bit channels. Such colors survive the hex
    /// serialization unchanged.
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    /// Build from straight (non-premultiplied) channels.
    pub fn from_rgba_unmultiplied(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::new(r * a, g * a, b * a, a)
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let invalid = || ColorParseError::InvalidFormat(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return Err(invalid());
        }

        let channel = |i: usize| -> Result<f32, ColorParseError> {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map(|v| f32::from(v) / 255.0)
                .map_err(|_| invalid())
        };
        let a = if digits.len() == 8 { channel(6)? } else { 1.0 };
        Ok(Self::from_rgba_unmultiplied(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Back to straight alpha.
    pub fn unpremultiplied(&self) -> [f32; 4] {
        if self.a == 0.0 {
            return [0.0; 4];
        }
        [self.r / self.a, self.g / self.a, self.b / self.a, self.a]
    }

    /// Hex string of the straight-alpha color. Alpha is omitted when opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.unpremultiplied().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }

    /// Channels as a `vec4` uniform.
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}
