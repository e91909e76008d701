//! Color values and RGB interpolation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Simple RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self { Self { r, g, b } }

    /// Parse `#rgb`, `#rrggbb` or `rgb(r,g,b)` (case-insensitive, spaces allowed).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            let digit = |i: usize| -> Option<u8> { u8::from_str_radix(hex.get(i..i + 1)?, 16).ok() };
            let pair = |i: usize| -> Option<u8> { u8::from_str_radix(hex.get(i..i + 2)?, 16).ok() };
            return match hex.len() {
                3 => Some(Self::new(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
                6 => Some(Self::new(pair(0)?, pair(2)?, pair(4)?)),
                _ => None,
            };
        }

        let lower = s.to_ascii_lowercase();
        let inner = lower.strip_prefix("rgb(")?.strip_suffix(')')?;
        let mut parts = inner.split(',').map(|p| p.trim().parse::<u8>().ok());
        let rgb = Self::new(parts.next()??, parts.next()??, parts.next()??);
        parts.next().is_none().then_some(rgb)
    }

    /// Linear interpolation in RGB space, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| -> u8 {
            (a as f64 + (b as f64 - a as f64) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Self::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    /// Format as lowercase CSS hex: #rrggbb
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A CSS color as given by the host.
///
/// Discrete and threshold scales pass colors through verbatim; only gradient
/// stops need to parse as [`Rgb`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(css: impl Into<String>) -> Self { Self(css.into()) }

    #[inline] pub fn as_str(&self) -> &str { &self.0 }

    /// Parsed RGB components, if the color is in a supported notation.
    #[inline] pub fn rgb(&self) -> Option<Rgb> { Rgb::parse(&self.0) }
}

impl From<&str> for Color {
    fn from(css: &str) -> Self { Self::new(css) }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self { Self(rgb.to_string()) }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Interpolate between two colors; falls back to a hard switch at the
/// midpoint when either side is not parseable.
pub fn interpolate(from: &Color, to: &Color, t: f64) -> Color {
    if from == to { return from.clone() }
    match (from.rgb(), to.rgb()) {
        (Some(a), Some(b)) => a.lerp(b, t).into(),
        _ => if t < 0.5 { from.clone() } else { to.clone() },
    }
}
