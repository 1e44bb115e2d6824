//! RGBA colours as written in icon specs: `#rgb`, `#rrggbb`, `#rrggbbaa`,
//! `rgb(r, g, b)` and `rgba(r, g, b, a)` with `a` in `0..=1`.

use crate::error::DocToolsError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

static RGB_FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*([0-9]*\.?[0-9]+)\s*)?\)$")
        .expect("valid rgb() regex")
});

/// Straight (non-premultiplied) 8-bit RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// `#rrggbb`, or `#rrggbbaa` when not opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    /// Alpha as `0.0..=1.0`.
    pub fn opacity(self) -> f32 {
        f32::from(self.a) / 255.0
    }

    pub(crate) fn to_skia(self) -> resvg::tiny_skia::Color {
        resvg::tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = DocToolsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || DocToolsError::InvalidConfig(format!("invalid colour '{s}'"));

        if let Some(hex) = s.strip_prefix('#') {
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
            let short = |i: usize| {
                u8::from_str_radix(&hex[i..i + 1], 16)
                    .map(|v| v * 17)
                    .map_err(|_| invalid())
            };
            return match hex.len() {
                3 => Ok(Color::rgb(short(0)?, short(1)?, short(2)?)),
                6 => Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
                8 => Ok(Color::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
                _ => Err(invalid()),
            };
        }

        let caps = RGB_FN.captures(s).ok_or_else(invalid)?;
        let channel = |i: usize| caps[i].parse::<u8>().map_err(|_| invalid());
        let alpha = match caps.get(4) {
            Some(m) => {
                let a: f32 = m.as_str().parse().map_err(|_| invalid())?;
                if !(0.0..=1.0).contains(&a) {
                    return Err(invalid());
                }
                (a * 255.0).round() as u8
            }
            None => 255,
        };
        Ok(Color::rgba(channel(1)?, channel(2)?, channel(3)?, alpha))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!("#fff".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!("#4CAF50".parse::<Color>().unwrap(), Color::rgb(0x4C, 0xAF, 0x50));
        assert_eq!(
            "#11223380".parse::<Color>().unwrap(),
            Color::rgba(0x11, 0x22, 0x33, 0x80)
        );
    }

    #[test]
    fn parses_functional_forms() {
        assert_eq!(
            "rgb(1, 2, 3)".parse::<Color>().unwrap(),
            Color::rgb(1, 2, 3)
        );
        assert_eq!(
            "rgba(255,255,255,0.2)".parse::<Color>().unwrap(),
            Color::rgba(255, 255, 255, 51)
        );
        assert_eq!(
            "rgba(255,255,255,.05)".parse::<Color>().unwrap().a,
            13
        );
    }

    #[test]
    fn rejects_garbage() {
        for s in ["", "#12", "#ggg", "rgb(256,0,0)", "rgba(0,0,0,1.5)", "blue", "#ü12"] {
            assert!(s.parse::<Color>().is_err(), "{s}");
        }
    }

    #[test]
    fn hex_round_trip_through_serde() {
        let c = Color::rgba(1, 2, 3, 4);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"#01020304\"");
        assert_eq!(serde_json::from_str::<Color>(&json).unwrap(), c);
    }
}
