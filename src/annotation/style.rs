use std::{fmt, str::FromStr};

use anyhow::anyhow;
use serde::Deserialize;

/// An sRGB color written as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Color used for drawn shapes until the session picks another one.
    pub const DEFAULT_DRAW: Color = Color::new(0xFF, 0x00, 0x00);
}

impl Default for Color {
    fn default() -> Self {
        Color::DEFAULT_DRAW
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        let hex = value
            .strip_prefix('#')
            .ok_or_else(|| anyhow!("Color '{}' must start with '#'", value))?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow!("Color '{}' is not of the form #RRGGBB", value));
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16);
        Ok(Color::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Color {
    type Error = anyhow::Error;

    fn try_from(value: String) -> anyhow::Result<Self> {
        value.parse()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

/// Style applied to a shape when it is created. Each draw session owns one and passes it into
/// every shape creation call, so changing it never restyles existing shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawStyle {
    pub color: Color,
}

impl DrawStyle {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

/// Icon of a hand drawn marker: a filled circle in the draw color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerIcon {
    pub svg: String,
    /// Width and height in pixels.
    pub size: [u32; 2],
    /// Pixel of the icon placed on the marker position.
    pub anchor: [u32; 2],
}

impl MarkerIcon {
    pub fn for_color(color: Color) -> Self {
        Self {
            svg: format!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" fill="{}" viewBox="0 0 24 24"><circle cx="12" cy="12" r="10"/></svg>"#,
                color
            ),
            size: [24, 24],
            anchor: [12, 24],
        }
    }
}
