//! Oracle for the exact bit-length of the serialized form of a value
//!
//! This module contains the [`FixedBits`] and [`LengthAware`] traits, with
//! `FixedBits ⊨ LengthAware` by way of a blanket implementation.
//!
//! # `LengthAware`
//!
//! The principal trait defined in this module is [`LengthAware`], which
//! reports the number of bits [`Encode::write_to`](super::Encode::write_to)
//! would emit for a given value. Implementations are hand-written sums that
//! follow the same field order as `write_to`: every Simple, Const, Reserved,
//! Enum and Implicit field contributes its declared width, a Virtual field
//! contributes zero, an Optional field contributes only when present, and
//! Complex fields and arrays contribute the recursive length of their
//! contents.
//!
//! For every valid message `v`,
//!
//! ```ignore
//! v.length_in_bits() == 8 * v.serialize()?.len()
//! ```
//!
//! which can be cross-checked against the write path itself with
//! [`Encode::counted_bits`](super::Encode::counted_bits).
//!
//! # `FixedBits`
//!
//! Types whose every value has the same serialized width (headers, enums,
//! bit-packed option sets) implement [`FixedBits`] instead, and receive
//! `LengthAware` through the blanket implementation.

/// Trait for types whose serialized form always occupies the same number of bits
pub trait FixedBits {
    /// Serialized width in bits
    const BITS: usize;
}

/// Trait for types that can report the length of their serialized form
/// without serializing.
pub trait LengthAware {
    /// Exact number of bits in the serialized form of `self`
    fn length_in_bits(&self) -> usize;

    /// Number of bytes in the serialized form of `self`, counting a trailing
    /// partial byte as a whole one
    fn length_in_bytes(&self) -> usize {
        (self.length_in_bits() + 7) / 8
    }
}

impl<T: FixedBits> LengthAware for T {
    #[inline]
    fn length_in_bits(&self) -> usize {
        T::BITS
    }
}

impl FixedBits for bool {
    const BITS: usize = 1;
}

impl FixedBits for u8 {
    const BITS: usize = 8;
}

impl FixedBits for u16 {
    const BITS: usize = 16;
}

impl FixedBits for u32 {
    const BITS: usize = 32;
}

impl FixedBits for u64 {
    const BITS: usize = 64;
}

/// Sums the lengths of every element of a slice
pub fn sum_lengths<T: LengthAware>(items: &[T]) -> usize {
    items.iter().map(LengthAware::length_in_bits).sum()
}

/// Length contributed by an optional field
pub fn optional_length<T: LengthAware>(item: &Option<T>) -> usize {
    item.as_ref().map_or(0, LengthAware::length_in_bits)
}
