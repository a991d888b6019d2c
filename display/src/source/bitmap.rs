//! In-memory packed raster.
//!
//! Values are packed into 32-bit words, most significant bits first:
//!
//! ```text
//! bits_per_value = 4, width = 10  ->  stride = 2 words per row
//!
//!  word 0: | p0 | p1 | p2 | p3 | p4 | p5 | p6 | p7 |
//!  word 1: | p8 | p9 | -- | -- | -- | -- | -- | -- |   (padding)
//!          31                                      0
//! ```
//!
//! Every row starts on a word boundary, so a row is `stride` words long.

use serde::{Deserialize, Serialize};

use super::BitmapError;
use crate::bitwise::Bits;

const WORD_BITS: u8 = 32;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bitmap {
    width: u16,
    height: u16,
    value_count: u32,
    bits_per_value: u8,
    stride: usize,
    data: Vec<u32>,
}

impl Bitmap {
    /// Creates a zero-filled bitmap able to hold `value_count` distinct values.
    ///
    /// # Errors
    ///
    /// Returns [`BitmapError::InvalidValueCount`] when `value_count` is 0.
    pub fn new(width: u16, height: u16, value_count: u32) -> Result<Self, BitmapError> {
        if value_count == 0 {
            return Err(BitmapError::InvalidValueCount(value_count));
        }

        let bits_per_value = [1_u8, 2, 4, 8, 16]
            .into_iter()
            .find(|bits| u64::from(value_count) <= 1_u64 << bits)
            .unwrap_or(WORD_BITS);

        let values_per_word = usize::from(WORD_BITS / bits_per_value);
        let stride = usize::from(width).div_ceil(values_per_word);

        Ok(Self {
            width,
            height,
            value_count,
            bits_per_value,
            stride,
            data: vec![0; stride * usize::from(height)],
        })
    }

    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[must_use]
    pub const fn bits_per_value(&self) -> u8 {
        self.bits_per_value
    }

    #[must_use]
    pub const fn value_count(&self) -> u32 {
        self.value_count
    }

    /// Reads the value at `(x, y)`. Coordinates outside the bitmap read as 0.
    #[must_use]
    pub fn get_pixel(&self, x: u16, y: u16) -> u32 {
        if x >= self.width || y >= self.height {
            return 0;
        }

        let (word_idx, bits) = self.locate(x, y);
        self.data[word_idx].get_bits(bits)
    }

    /// Writes `value` at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Fails when the coordinates are outside the bitmap or `value` is not
    /// smaller than the bitmap's value count.
    pub fn set_pixel(&mut self, x: u16, y: u16, value: u32) -> Result<(), BitmapError> {
        if x >= self.width || y >= self.height {
            return Err(BitmapError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        if value >= self.value_count {
            return Err(BitmapError::ValueTooLarge {
                value,
                value_count: self.value_count,
            });
        }

        let (word_idx, bits) = self.locate(x, y);
        self.data[word_idx].set_bits(bits, value);
        Ok(())
    }

    /// Sets every pixel to `value`.
    ///
    /// # Errors
    ///
    /// Fails when `value` is not smaller than the bitmap's value count.
    pub fn fill(&mut self, value: u32) -> Result<(), BitmapError> {
        if value >= self.value_count {
            return Err(BitmapError::ValueTooLarge {
                value,
                value_count: self.value_count,
            });
        }

        // Replicate the value in every slot of a word, padding slots included.
        let mut word = 0_u32;
        for slot in 0..WORD_BITS / self.bits_per_value {
            let low = WORD_BITS - self.bits_per_value * (slot + 1);
            word.set_bits(low..=low + self.bits_per_value - 1, value);
        }
        self.data.fill(word);
        Ok(())
    }

    /// Word index and bit range holding the value at `(x, y)`.
    fn locate(&self, x: u16, y: u16) -> (usize, std::ops::RangeInclusive<u8>) {
        let values_per_word = WORD_BITS / self.bits_per_value;
        let x = usize::from(x);
        let word_idx = usize::from(y) * self.stride + x / usize::from(values_per_word);

        // `x % values_per_word` is below 32, the cast cannot truncate.
        let slot = (x % usize::from(values_per_word)) as u8;
        let low = WORD_BITS - self.bits_per_value * (slot + 1);

        (word_idx, low..=low + self.bits_per_value - 1)
    }
}
