use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

/// A final, displayable color in RGB565 format.
///
/// ```text
/// Color     Values     Bits
/// -------------------------------
/// blue --> [0 - 31]    0-4
/// green -> [0 - 63]    5-10
/// red ---> [0 - 31]    11-15
/// ```
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Color(pub u16);

impl Color {
    pub const BLACK: Self = Self(0x0000);
    pub const WHITE: Self = Self(0xFFFF);

    /// Builds a color from already reduced channels (5, 6 and 5 bits wide).
    #[must_use]
    pub fn from_rgb565(red: u8, green: u8, blue: u8) -> Self {
        let mut value = 0_u16;
        value.set_bits(11..=15, red.into());
        value.set_bits(5..=10, green.into());
        value.set_bits(0..=4, blue.into());
        Self(value)
    }

    /// Reduces a `0x00RRGGBB` color by dropping the low bits of every channel.
    #[must_use]
    pub fn from_rgb888(rgb: u32) -> Self {
        Self::from_rgb565(
            rgb.get_bits(19..=23) as u8,
            rgb.get_bits(10..=15) as u8,
            rgb.get_bits(3..=7) as u8,
        )
    }

    #[must_use]
    pub fn red(&self) -> u8 {
        self.0.get_bits(11..=15) as u8
    }

    #[must_use]
    pub fn green(&self) -> u8 {
        self.0.get_bits(5..=10) as u8
    }

    #[must_use]
    pub fn blue(&self) -> u8 {
        self.0.get_bits(0..=4) as u8
    }

    /// Expands back to `0x00RRGGBB`, replicating the high bits into the low ones
    /// so that full intensity maps to `0xFF`.
    #[must_use]
    pub fn to_rgb888(&self) -> u32 {
        let red = u32::from(self.red());
        let green = u32::from(self.green());
        let blue = u32::from(self.blue());

        let red = (red << 3) | (red >> 2);
        let green = (green << 2) | (green >> 4);
        let blue = (blue << 3) | (blue >> 2);

        (red << 16) | (green << 8) | blue
    }

    /// Perceived brightness in `0..=255` (integer Rec. 601 weights).
    #[must_use]
    pub fn luma(&self) -> u8 {
        let rgb = self.to_rgb888();
        let red = rgb.get_bits(16..=23);
        let green = rgb.get_bits(8..=15);
        let blue = rgb.get_bits(0..=7);

        ((red * 299 + green * 587 + blue * 114) / 1000) as u8
    }
}

impl From<u16> for Color {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<Color> for u16 {
    fn from(color: Color) -> Self {
        color.0
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.red(), self.green(), self.blue())
    }
}
