//! Core traits for radix keys.
//!
//! This module defines:
//! - [`Digit`]: The unit a radix pass buckets by (8-bit or 16-bit).
//! - [`RadixValue`]: Integer-like keys that can be split into digits, most or
//!   least significant first.

/// A radix digit returned by a key extractor.
///
/// The digit type fixes the number of buckets of every partitioning step:
/// `u8` digits produce 256 buckets, `u16` digits produce 65536.
///
/// # Examples
///
/// ```
/// use prsort::core::Digit;
///
/// assert_eq!(<u8 as Digit>::RADIX, 256);
/// assert_eq!(<u16 as Digit>::RADIX, 65536);
/// assert_eq!(0xABu8.index(), 0xAB);
/// ```
pub trait Digit: Copy + Send + Sync + 'static {
    /// Number of distinct digit values (buckets).
    const RADIX: usize;

    /// Width of the digit in bytes.
    const BYTES: usize;

    /// Returns the bucket index of this digit.
    fn index(self) -> usize;

    /// Builds a digit from the most significant bits of a left-aligned `u128`.
    fn from_left_aligned(bits: u128) -> Self;
}

impl Digit for u8 {
    const RADIX: usize = 256;
    const BYTES: usize = 1;

    #[inline(always)]
    fn index(self) -> usize {
        self as usize
    }

    #[inline(always)]
    fn from_left_aligned(bits: u128) -> Self {
        (bits >> 120) as u8
    }
}

impl Digit for u16 {
    const RADIX: usize = 65536;
    const BYTES: usize = 2;

    #[inline(always)]
    fn index(self) -> usize {
        self as usize
    }

    #[inline(always)]
    fn from_left_aligned(bits: u128) -> Self {
        (bits >> 112) as u16
    }
}

/// A fixed-width key with an order-preserving unsigned representation.
///
/// Implemented for all primitive integers. Signed integers flip their sign bit
/// so that negative values bucket before positive ones.
///
/// # Examples
///
/// ```
/// use prsort::core::RadixValue;
///
/// let v: u32 = 0x1234_5678;
/// assert_eq!(v.msd_digit::<u8>(0), 0x12);
/// assert_eq!(v.msd_digit::<u16>(1), 0x5678);
/// assert_eq!(v.lsd_byte(0), 0x78);
/// assert_eq!(<u32 as RadixValue>::msd_depth::<u8>(), 4);
///
/// // -1 sorts before 0
/// assert!((-1i16).msd_digit::<u8>(0) < 0i16.msd_digit::<u8>(0));
/// ```
pub trait RadixValue: Copy + Send + Sync + 'static {
    /// Width of the key in bytes.
    const BYTES: usize;

    /// Order-preserving unsigned representation, right-aligned.
    fn to_radix_bits(&self) -> u128;

    /// Returns the digit at `depth`, counted from the most significant end.
    ///
    /// Depths past the end of the key yield zero digits, so shorter keys
    /// behave as if padded with zeros.
    #[inline(always)]
    fn msd_digit<K: Digit>(&self, depth: usize) -> K {
        let width = Self::BYTES * 8;
        let consumed = depth * K::BYTES * 8;
        if consumed >= width {
            return K::from_left_aligned(0);
        }
        let aligned = self.to_radix_bits() << (128 - width);
        K::from_left_aligned(aligned << consumed)
    }

    /// Returns byte `pass` of the key, counted from the least significant end.
    #[inline(always)]
    fn lsd_byte(&self, pass: usize) -> u8 {
        (self.to_radix_bits() >> (pass * 8)) as u8
    }

    /// Number of `K` digits needed to cover the whole key.
    fn msd_depth<K: Digit>() -> usize {
        Self::BYTES.div_ceil(K::BYTES)
    }
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {$(
        impl RadixValue for $t {
            const BYTES: usize = std::mem::size_of::<$t>();

            #[inline(always)]
            fn to_radix_bits(&self) -> u128 {
                *self as u128
            }
        }
    )*};
}

macro_rules! impl_signed {
    ($($t:ty => $u:ty),*) => {$(
        impl RadixValue for $t {
            const BYTES: usize = std::mem::size_of::<$t>();

            #[inline(always)]
            fn to_radix_bits(&self) -> u128 {
                ((*self as $u) ^ (1 << (<$u>::BITS - 1))) as u128
            }
        }
    )*};
}

impl_unsigned!(u8, u16, u32, u64, u128, usize);
impl_signed!(i8 => u8, i16 => u16, i32 => u32, i64 => u64, i128 => u128, isize => usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msd_digits_cover_the_key() {
        let v: u64 = 0x0102_0304_0506_0708;
        let bytes: Vec<u8> = (0..8).map(|d| v.msd_digit::<u8>(d)).collect();
        assert_eq!(bytes, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(v.msd_digit::<u8>(8), 0);
        assert_eq!(v.msd_digit::<u16>(3), 0x0708);
    }

    #[test]
    fn test_narrow_key_with_wide_digit() {
        // a single byte left-aligned into a 16-bit digit
        let v: u8 = 0xAB;
        assert_eq!(v.msd_digit::<u16>(0), 0xAB00);
        assert_eq!(v.msd_digit::<u16>(1), 0);
        assert_eq!(<u8 as RadixValue>::msd_depth::<u16>(), 1);
    }

    #[test]
    fn test_signed_order() {
        let values = [i32::MIN, -5, -1, 0, 1, 7, i32::MAX];
        let bits: Vec<u128> = values.iter().map(RadixValue::to_radix_bits).collect();
        assert!(bits.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_lsd_bytes() {
        let v: u32 = 0xDEAD_BEEF;
        assert_eq!(v.lsd_byte(0), 0xEF);
        assert_eq!(v.lsd_byte(3), 0xDE);
        assert_eq!((-1i8).lsd_byte(0), 0x7F);
    }
}
