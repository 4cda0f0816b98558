//! RGBA color scalar with the hex attribute form
//!
//! Colors travel through XML attributes as `#RRGGBB` or `#RRGGBBAA`. The
//! shorter form implies full opacity. Blending implements simple alpha-over
//! compositing, which is what the table frame uses to combine the default
//! cell color with column, row, and per-cell overrides.

use crate::error::{Result, XmlIoError};
use serde::{Deserialize, Serialize};

/// An RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Color = Color::opaque(0xFF, 0xFF, 0xFF);
    pub const BLACK: Color = Color::opaque(0x00, 0x00, 0x00);
    /// Fully transparent; blending over it yields the other operand
    pub const TRANSPARENT: Color = Color::new(0x00, 0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    /// Hex attribute form: `#RRGGBB` when fully opaque, `#RRGGBBAA` otherwise
    pub fn to_hex(&self) -> String {
        if self.a == 0xFF {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    /// Parse the hex attribute form. Malformed syntax is an error.
    pub fn from_hex(text: &str) -> Result<Color> {
        let malformed = || XmlIoError::MalformedValue {
            attribute: "color".to_string(),
            value: text.to_string(),
        };
        let digits = text.strip_prefix('#').ok_or_else(malformed)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(malformed());
        }
        let byte = |i: usize| u8::from_str_radix(&digits[2 * i..2 * i + 2], 16);
        match digits.len() {
            6 => Ok(Color::opaque(
                byte(0).map_err(|_| malformed())?,
                byte(1).map_err(|_| malformed())?,
                byte(2).map_err(|_| malformed())?,
            )),
            8 => Ok(Color::new(
                byte(0).map_err(|_| malformed())?,
                byte(1).map_err(|_| malformed())?,
                byte(2).map_err(|_| malformed())?,
                byte(3).map_err(|_| malformed())?,
            )),
            _ => Err(malformed()),
        }
    }

    /// Composite `over` on top of `self` (alpha-over). A fully opaque
    /// `over` replaces `self`; a fully transparent one leaves it unchanged.
    pub fn blend(&self, over: Color) -> Color {
        if over.a == 0xFF {
            return over;
        }
        if over.a == 0 {
            return *self;
        }
        let oa = over.a as u32;
        let ba = self.a as u32;
        let out_a = oa + ba * (255 - oa) / 255;
        if out_a == 0 {
            return Color::TRANSPARENT;
        }
        let channel = |o: u8, b: u8| -> u8 {
            let o = o as u32;
            let b = b as u32;
            ((o * oa + b * ba * (255 - oa) / 255) / out_a) as u8
        };
        Color {
            r: channel(over.r, self.r),
            g: channel(over.g, self.g),
            b: channel(over.b, self.b),
            a: out_a as u8,
        }
    }

    /// CSS `rgba()`/hex rendering used by the formats' CSS forms
    pub fn to_css(&self) -> String {
        if self.a == 0xFF {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {:.3})",
                self.r,
                self.g,
                self.b,
                self.a as f32 / 255.0
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip_opaque() {
        let c = Color::opaque(0x12, 0xAB, 0xFF);
        assert_eq!(c.to_hex(), "#12ABFF");
        assert_eq!(Color::from_hex("#12ABFF").unwrap(), c);
    }

    #[test]
    fn test_hex_round_trip_with_alpha() {
        let c = Color::new(0x01, 0x02, 0x03, 0x80);
        assert_eq!(c.to_hex(), "#01020380");
        assert_eq!(Color::from_hex("#01020380").unwrap(), c);
    }

    #[test]
    fn test_malformed_hex_rejected() {
        assert!(Color::from_hex("12ABFF").is_err());
        assert!(Color::from_hex("#12AB").is_err());
        assert!(Color::from_hex("#GGGGGG").is_err());
        assert!(Color::from_hex("#12ABFF00FF").is_err());
        assert!(Color::from_hex("").is_err());
    }

    #[test]
    fn test_blend_opaque_wins() {
        let base = Color::opaque(10, 20, 30);
        let over = Color::opaque(200, 100, 50);
        assert_eq!(base.blend(over), over);
    }

    #[test]
    fn test_blend_transparent_keeps_base() {
        let base = Color::opaque(10, 20, 30);
        assert_eq!(base.blend(Color::TRANSPARENT), base);
    }

    #[test]
    fn test_blend_half_alpha_mixes() {
        let base = Color::opaque(0, 0, 0);
        let over = Color::new(255, 255, 255, 128);
        let mixed = base.blend(over);
        assert_eq!(mixed.a, 255);
        assert!(mixed.r > 100 && mixed.r < 160);
    }
}
