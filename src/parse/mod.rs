//! Custom parsing model with bit-level precision
//!
//! This module, along with its submodules, provides the fundamental
//! definitions related to the abstract task of processing raw sequences
//! of binary data into the leaf fields of an arbitrarily nested message.
//!
//! For type-aware parsing, in other words, parsing whole messages rather than
//! an unstructured sequence of primitives, see the
//! [`Decode`](crate::conv::Decode) trait, which is built almost entirely
//! around the definitions contained within this module.
//!
//! # Layout
//!
//! The top level of this module defines the [`Parser`] trait. The submodule
//! `error` defines the error hierarchy returned by every `Parser` method, and
//! `bitparser` provides [`BitParser`], the implementation over a borrowed
//! byte-slice used throughout the crate.

pub mod bitparser;
pub mod error;

pub use bitparser::BitParser;
pub use error::{ParseError, ParseResult, ParseResultExt};

/// Byte order of multi-byte integer fields
///
/// Only fields wider than one byte whose width is a whole number of bytes are
/// affected; bit-fields and single bytes are always read most-significant bit
/// first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    /// Converts between the wire order and the numeric value of a `width`-bit
    /// field. The conversion is its own inverse.
    #[inline]
    #[must_use]
    pub fn arrange(self, raw: u64, width: usize) -> u64 {
        match self {
            ByteOrder::LittleEndian if width > 8 && width <= 64 && width % 8 == 0 => {
                raw.swap_bytes() >> (64 - width)
            }
            _ => raw,
        }
    }
}

/// # Parser
///
/// This trait is an abstraction over a stateful read cursor whose unit of
/// consumption is a single bit rather than a byte. Multi-bit values are read
/// most-significant bit first, and may start and end anywhere within a byte.
///
/// ## Model
///
/// * The cursor is constructed over an immutable byte buffer, with
///   `pos() == 0` and `len_bits() == 8 * buffer.len()`.
/// * Every successful read of `n` bits advances `pos()` by exactly `n`; a
///   failed read leaves it unchanged.
/// * Unlike a strictly forward-only parser, the cursor may be moved back with
///   [`reset`](Parser::reset). This is what allows a field to be *peeked*:
///   read, then un-read, in order to decide which variant owns the bytes.
///
/// ## Contexts
///
/// Each message type and each complex field opens a named *context* before
/// its own fields are read, and closes it afterwards. Contexts must be closed
/// in LIFO order with the same name they were opened with; any other order is
/// reported as a [`ContextError`](crate::error::ContextError). Contexts never
/// restrict what may be read, they exist only for diagnostics.
pub trait Parser {
    /// Current position of the cursor, in bits from the start of the buffer
    fn pos(&self) -> usize;

    /// Total length of the buffer in bits
    fn len_bits(&self) -> usize;

    /// Moves the cursor to an absolute bit position.
    ///
    /// # Errors
    ///
    /// Fails with [`ParseError::ResetOutOfBounds`] if `pos > self.len_bits()`,
    /// in which case the cursor is not moved.
    fn reset(&mut self, pos: usize) -> ParseResult<()>;

    /// Consumes `width` bits and returns them right-aligned in a `u64`.
    ///
    /// `field` is the name of the field being read, used only for error
    /// reporting.
    ///
    /// # Errors
    ///
    /// * [`ParseError::InvalidWidth`] unless `1 <= width <= 64`
    /// * [`ParseError::Underrun`] if fewer than `width` bits remain
    fn read_bits(&mut self, field: &'static str, width: usize) -> ParseResult<u64>;

    /// Opens a named diagnostic context at the current position
    fn push_context(&mut self, name: &'static str) -> ParseResult<()>;

    /// Closes the innermost diagnostic context, which must be named `name`
    fn pop_context(&mut self, name: &'static str) -> ParseResult<()>;

    /// Number of diagnostic contexts currently open
    fn context_depth(&self) -> usize;

    /// Byte order applied by the multi-byte integer reads
    fn byte_order(&self) -> ByteOrder {
        ByteOrder::BigEndian
    }

    /// Number of bits that can still be read
    fn remaining_bits(&self) -> usize {
        self.len_bits() - self.pos()
    }

    /// Returns `true` if at least `bits` more bits can be read
    fn has_more(&self, bits: usize) -> bool {
        self.remaining_bits() >= bits
    }

    /// Consumes a single bit as a boolean
    #[inline]
    fn read_bit(&mut self, field: &'static str) -> ParseResult<bool> {
        Ok(self.read_bits(field, 1)? == 1)
    }

    #[inline]
    fn read_u8(&mut self, field: &'static str, width: usize) -> ParseResult<u8> {
        check_width(field, width, 8)?;
        Ok(self.read_bits(field, width)? as u8)
    }

    #[inline]
    fn read_u16(&mut self, field: &'static str, width: usize) -> ParseResult<u16> {
        check_width(field, width, 16)?;
        let raw = self.read_bits(field, width)?;
        Ok(self.byte_order().arrange(raw, width) as u16)
    }

    #[inline]
    fn read_u32(&mut self, field: &'static str, width: usize) -> ParseResult<u32> {
        check_width(field, width, 32)?;
        let raw = self.read_bits(field, width)?;
        Ok(self.byte_order().arrange(raw, width) as u32)
    }

    #[inline]
    fn read_u64(&mut self, field: &'static str, width: usize) -> ParseResult<u64> {
        let raw = self.read_bits(field, width)?;
        Ok(self.byte_order().arrange(raw, width))
    }

    /// Consumes a full byte
    #[inline]
    fn read_byte(&mut self, field: &'static str) -> ParseResult<u8> {
        self.read_u8(field, 8)
    }

    #[inline]
    fn read_i8(&mut self, field: &'static str, width: usize) -> ParseResult<i8> {
        check_width(field, width, 8)?;
        Ok(self.read_i64(field, width)? as i8)
    }

    #[inline]
    fn read_i16(&mut self, field: &'static str, width: usize) -> ParseResult<i16> {
        check_width(field, width, 16)?;
        Ok(self.read_i64(field, width)? as i16)
    }

    #[inline]
    fn read_i32(&mut self, field: &'static str, width: usize) -> ParseResult<i32> {
        check_width(field, width, 32)?;
        Ok(self.read_i64(field, width)? as i32)
    }

    /// Consumes `width` bits as a two's complement signed integer, sign-extending
    /// from the most significant bit read.
    fn read_i64(&mut self, field: &'static str, width: usize) -> ParseResult<i64> {
        let raw = self.read_bits(field, width)?;
        Ok(sign_extend(self.byte_order().arrange(raw, width), width))
    }

    /// Consumes `count` whole bytes.
    ///
    /// The cursor does not need to be byte-aligned; each byte is formed from
    /// the next eight bits.
    fn read_bytes(&mut self, field: &'static str, count: usize) -> ParseResult<Vec<u8>> {
        let requested = count * 8;
        if !self.has_more(requested) {
            return Err(ParseError::Underrun {
                field,
                requested,
                available: self.remaining_bits(),
            });
        }
        let mut ret = Vec::with_capacity(count);
        for _ in 0..count {
            ret.push(self.read_bits(field, 8)? as u8);
        }
        Ok(ret)
    }

    /// Consumes a UTF-8 string occupying exactly `bits` bits.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`read_bytes`](Parser::read_bytes), fails
    /// with [`ParseError::Validation`] if `bits` is not a multiple of 8, and
    /// with [`ParseError::Utf8`] if the bytes are not valid UTF-8.
    fn read_string(&mut self, field: &'static str, bits: usize) -> ParseResult<String> {
        if bits % 8 != 0 {
            return Err(ParseError::validation(format!(
                "string field '{field}' has width {bits}, which is not a whole number of bytes"
            )));
        }
        let bytes = self.read_bytes(field, bits / 8)?;
        String::from_utf8(bytes).map_err(|_| ParseError::Utf8 { field })
    }

    /// Reads `width` bits without consuming them
    fn peek_bits(&mut self, field: &'static str, width: usize) -> ParseResult<u64> {
        let start = self.pos();
        let value = self.read_bits(field, width)?;
        self.reset(start)?;
        Ok(value)
    }

    /// Reads the next byte without consuming it
    fn peek_byte(&mut self, field: &'static str) -> ParseResult<u8> {
        Ok(self.peek_bits(field, 8)? as u8)
    }
}

/// Rejects widths outside of `1..=max`
#[inline]
pub(crate) fn check_width(field: &'static str, width: usize, max: usize) -> ParseResult<()> {
    if width == 0 || width > max {
        Err(ParseError::InvalidWidth { field, width, max })
    } else {
        Ok(())
    }
}

/// Interprets the low `width` bits of `raw` as a two's complement integer
#[inline]
pub(crate) fn sign_extend(raw: u64, width: usize) -> i64 {
    if width >= 64 {
        raw as i64
    } else {
        let shift = 64 - width as u32;
        ((raw << shift) as i64) >> shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_extension() {
        assert_eq!(sign_extend(0b111, 3), -1);
        assert_eq!(sign_extend(0b011, 3), 3);
        assert_eq!(sign_extend(0b100, 3), -4);
        assert_eq!(sign_extend(0x80, 8), -128);
        assert_eq!(sign_extend(u64::MAX, 64), -1);
    }

    #[test]
    fn little_endian_arrangement() {
        assert_eq!(ByteOrder::LittleEndian.arrange(0x1234, 16), 0x3412);
        assert_eq!(ByteOrder::LittleEndian.arrange(0x12_3456, 24), 0x56_3412);
        assert_eq!(ByteOrder::LittleEndian.arrange(0xAB, 8), 0xAB);
        assert_eq!(ByteOrder::LittleEndian.arrange(0x1FF, 12), 0x1FF);
        assert_eq!(ByteOrder::BigEndian.arrange(0x1234, 16), 0x1234);
    }

    #[test]
    fn width_checks() {
        assert!(check_width("x", 8, 8).is_ok());
        assert_eq!(
            check_width("x", 0, 8),
            Err(ParseError::InvalidWidth {
                field: "x",
                width: 0,
                max: 8
            })
        );
        assert!(check_width("x", 9, 8).is_err());
    }
}
