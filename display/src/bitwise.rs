use std::fmt::Debug;
use std::mem::size_of;
use std::ops::RangeInclusive;

/// Helper methods to read and write packed bit fields,
/// the index (`bit_idx`) is supposed to be from lsb to msb (right to left)
pub trait Bits
where
    Self: Copy + Sized + Into<u128> + TryFrom<u128>,
    <Self as TryFrom<u128>>::Error: Debug,
{
    fn get_bit(&self, bit_idx: u8) -> bool {
        debug_assert!(bit_idx < (size_of::<Self>() * 8) as u8);
        let bitwise: u128 = (*self).into();
        (bitwise & (0b1 << bit_idx)) != 0
    }

    fn get_bits(&self, bits_range: RangeInclusive<u8>) -> Self {
        let start = *bits_range.start();
        let mask = field_mask(&bits_range);
        let value: u128 = (*self).into();

        // The masked field always fits in `Self`, the range was checked against its width.
        <Self as TryFrom<u128>>::try_from((value & mask) >> start).unwrap()
    }

    /// Overwrites the bits in `bits_range` with the low bits of `value`.
    /// Bits of `value` that do not fit in the range are discarded.
    fn set_bits(&mut self, bits_range: RangeInclusive<u8>, value: Self) {
        let start = *bits_range.start();
        let mask = field_mask(&bits_range);
        let bitwise: u128 = (*self).into();
        let value: u128 = value.into();

        let result = (bitwise & !mask) | ((value << start) & mask);
        *self = <Self as TryFrom<u128>>::try_from(result).unwrap();
    }
}

/// Mask with ones over `bits_range`, e.g. `4..=7` gives `0b1111_0000`.
fn field_mask(bits_range: &RangeInclusive<u8>) -> u128 {
    let length = u32::from(*bits_range.end() - *bits_range.start()) + 1;
    ((1_u128 << length) - 1) << *bits_range.start()
}

impl Bits for u32 {}
impl Bits for u16 {}
impl Bits for u8 {}
