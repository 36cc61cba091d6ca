//! # Color Types
//!
//! Output pixels use [`Rgb`] (the `smart-leds` 8-bit triple) so the same buffer
//! can be handed to a physical LED driver or drawn on a preview surface.
//!
//! Animation modes never produce [`Rgb`] directly. They work in [`Color`], an
//! unclamped floating-point triple on the 0–255 scale, and only the final
//! post-processing step converts to [`Rgb`] through [`Color::to_rgb`].

use serde::{Deserialize, Deserializer, Serializer};

/// Output pixel type shared by every sink.
pub type Rgb = smart_leds::RGB8;

/// Unclamped working color, channels nominally in `0.0..=255.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(255.0, 255.0, 255.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_rgb(rgb: Rgb) -> Self {
        Self::new(f32::from(rgb.r), f32::from(rgb.g), f32::from(rgb.b))
    }

    /// Multiply every channel by `factor`.
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    /// Linear blend, `t = 0` gives `self`, `t = 1` gives `other`.
    pub fn lerp(self, other: Color, t: f32) -> Self {
        Self::new(
            lerp(self.r, other.r, t),
            lerp(self.g, other.g, t),
            lerp(self.b, other.b, t),
        )
    }

    pub fn add(self, other: Color) -> Self {
        Self::new(self.r + other.r, self.g + other.g, self.b + other.b)
    }

    /// Clamp each channel into `0..=255` and round to the output pixel type.
    ///
    /// Non-finite channels collapse to zero.
    pub fn to_rgb(self) -> Rgb {
        Rgb::new(clamp_channel(self.r), clamp_channel(self.g), clamp_channel(self.b))
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Self::from_rgb(rgb)
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn clamp_channel(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

/// Blend two output pixels channel by channel.
pub fn lerp_rgb(a: Rgb, b: Rgb, t: f32) -> Rgb {
    Color::from_rgb(a).lerp(Color::from_rgb(b), t).to_rgb()
}

/// Convert a hue in degrees to a fully saturated color at `value` (0–1).
pub fn hue_to_color(hue_deg: f32, value: f32) -> Color {
    let h = hue_deg.rem_euclid(360.0) / 60.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    let (r, g, b) = match h as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    Color::new(r, g, b).scale(255.0 * value)
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn parse_hex(text: &str) -> Option<Rgb> {
    let hex = text.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: core::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

pub fn to_hex(rgb: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.r, rgb.g, rgb.b)
}

/// Serde adapter storing [`Rgb`] as a `#rrggbb` string.
pub mod hex {
    use super::*;

    pub fn serialize<S: Serializer>(rgb: &Rgb, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_hex(*rgb))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rgb, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_hex(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color `{text}`")))
    }
}
