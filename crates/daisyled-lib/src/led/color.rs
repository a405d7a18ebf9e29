//! Color model, parsing/formatting, and the green/blue wire transform.
//!
//! Callers always see logical RGB. The only place that knows about swapped
//! units is [`Color::to_wire`] / [`Color::from_wire`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One of the three intensity channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl FromStr for Channel {
    type Err = crate::DaisyledError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "r" | "red" => Ok(Channel::Red),
            "g" | "green" => Ok(Channel::Green),
            "b" | "blue" => Ok(Channel::Blue),
            _ => Err(crate::DaisyledError::Color(format!(
                "Invalid channel: {s} (use r, g or b)"
            ))),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        };
        f.write_str(name)
    }
}

/// An RGB intensity triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    pub fn channel(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Red => self.r,
            Channel::Green => self.g,
            Channel::Blue => self.b,
        }
    }

    /// Copy of `self` with one channel replaced.
    pub fn with_channel(mut self, channel: Channel, value: u8) -> Self {
        match channel {
            Channel::Red => self.r = value,
            Channel::Green => self.g = value,
            Channel::Blue => self.b = value,
        }
        self
    }

    /// Register byte order for this color: `[R, G, B]`, or `[R, B, G]` on swapped units.
    pub fn to_wire(self, swapped: bool) -> [u8; 3] {
        if swapped {
            [self.r, self.b, self.g]
        } else {
            [self.r, self.g, self.b]
        }
    }

    /// Inverse of [`to_wire`](Self::to_wire).
    pub fn from_wire(bytes: [u8; 3], swapped: bool) -> Self {
        if swapped {
            Color::new(bytes[0], bytes[2], bytes[1])
        } else {
            Color::new(bytes[0], bytes[1], bytes[2])
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_color(*self))
    }
}

impl FromStr for Color {
    type Err = crate::DaisyledError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        parse_color(s)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_color(*self))
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_color(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a color string.
///
/// Accepts:
/// - Hex: `"#FF0000"`, `"FF0000"`, `"#ff0000"`
/// - Named: `"red"`, `"green"`, `"blue"`, `"white"`, `"orange"`, `"yellow"`, `"purple"`, `"cyan"`, `"off"`/`"black"`
pub fn parse_color(s: &str) -> crate::error::Result<Color> {
    let s = s.trim();

    match s.to_lowercase().as_str() {
        "red" => return Ok(Color::RED),
        "green" => return Ok(Color::GREEN),
        "blue" => return Ok(Color::BLUE),
        "white" => return Ok(Color::WHITE),
        "orange" => return Ok(Color::new(0xFF, 0x80, 0x00)),
        "yellow" => return Ok(Color::new(0xFF, 0xFF, 0x00)),
        "purple" => return Ok(Color::new(0x80, 0x00, 0xFF)),
        "cyan" => return Ok(Color::new(0x00, 0xFF, 0xFF)),
        "off" | "black" => return Ok(Color::BLACK),
        _ => {}
    }

    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return Err(crate::DaisyledError::Color(format!(
            "Invalid color: {s} (use #RRGGBB or a color name)"
        )));
    }
    let val = u32::from_str_radix(hex, 16)
        .map_err(|_| crate::DaisyledError::Color(format!("Invalid hex color: {s}")))?;
    let [_, r, g, b] = val.to_be_bytes();
    Ok(Color::new(r, g, b))
}

/// Format a color as `#RRGGBB`.
pub fn format_color(color: Color) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r, color.g, color.b)
}

/// Clamp any integer intensity into `0..=255`.
pub fn clamp_intensity(value: impl Into<i64>) -> u8 {
    value.into().clamp(0, 255) as u8
}
