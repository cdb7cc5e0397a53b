//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! vocabulary shared by the [`operations`](super::operations) module (which
//! decides which calls to make) and the [`backend`](super::backend) (which
//! does the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 100). Clamped on construction.
//! - [`Position`]: Which edge of the padded axis the photo is pushed toward.
//! - [`Color`]: RGBA color parsed from hex or CSS names.
//! - [`Fill`]: What a letterbox resize paints into the unused canvas area.
//! - [`Window`]: Rectangle to extract, in canvas pixel coordinates.
//! - [`Rotation`]: Clockwise rotation by a multiple of 90°.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(100)
    }
}

/// Anchor of the photo along the padded axis.
///
/// Named for the landscape case: `right` pushes the photo to the far edge so
/// all padding sits at the start, `left` does the opposite.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Center,
    #[default]
    Right,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Position::Left => "left",
            Position::Center => "center",
            Position::Right => "right",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized color '{0}' (expected a CSS color name or #rgb/#rrggbb/#rrggbbaa)")]
pub struct ColorError(pub String);

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Same color with the alpha channel forced to opaque.
    pub fn opaque(self) -> Self {
        Self { a: 255, ..self }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = ColorError;

    /// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` (leading `#` optional)
    /// and CSS named colors, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        parse_hex(hex)
            .or_else(|| lookup_named(trimmed))
            .ok_or_else(|| ColorError(s.to_string()))
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|n| n << 4 | n);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Color {
            r: nibble(0)?,
            g: nibble(1)?,
            b: nibble(2)?,
            a: nibble(3)?,
        }),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: byte(6)?,
        }),
        _ => None,
    }
}

/// CSS named colors most likely to be used as a print border.
const NAMED_COLORS: &[(&str, Color)] = &[
    ("white", Color::rgb(255, 255, 255)),
    ("black", Color::rgb(0, 0, 0)),
    ("gray", Color::rgb(128, 128, 128)),
    ("grey", Color::rgb(128, 128, 128)),
    ("darkgray", Color::rgb(169, 169, 169)),
    ("darkgrey", Color::rgb(169, 169, 169)),
    ("lightgray", Color::rgb(211, 211, 211)),
    ("lightgrey", Color::rgb(211, 211, 211)),
    ("silver", Color::rgb(192, 192, 192)),
    ("whitesmoke", Color::rgb(245, 245, 245)),
    ("gainsboro", Color::rgb(220, 220, 220)),
    ("ivory", Color::rgb(255, 255, 240)),
    ("beige", Color::rgb(245, 245, 220)),
    ("linen", Color::rgb(250, 240, 230)),
    ("snow", Color::rgb(255, 250, 250)),
    ("red", Color::rgb(255, 0, 0)),
    ("maroon", Color::rgb(128, 0, 0)),
    ("orange", Color::rgb(255, 165, 0)),
    ("yellow", Color::rgb(255, 255, 0)),
    ("olive", Color::rgb(128, 128, 0)),
    ("lime", Color::rgb(0, 255, 0)),
    ("green", Color::rgb(0, 128, 0)),
    ("aqua", Color::rgb(0, 255, 255)),
    ("cyan", Color::rgb(0, 255, 255)),
    ("teal", Color::rgb(0, 128, 128)),
    ("blue", Color::rgb(0, 0, 255)),
    ("navy", Color::rgb(0, 0, 128)),
    ("fuchsia", Color::rgb(255, 0, 255)),
    ("magenta", Color::rgb(255, 0, 255)),
    ("purple", Color::rgb(128, 0, 128)),
    (
        "transparent",
        Color {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        },
    ),
];

fn lookup_named(name: &str) -> Option<Color> {
    NAMED_COLORS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, c)| *c)
}

/// What a letterbox resize paints outside the resized photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Color(Color),
    Transparent,
}

impl Fill {
    pub fn to_rgba(self) -> [u8; 4] {
        match self {
            Fill::Color(c) => c.to_rgba(),
            Fill::Transparent => [0, 0, 0, 0],
        }
    }
}

/// Rectangle to extract from a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

/// Clockwise rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Whether the rotation exchanges width and height.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}
