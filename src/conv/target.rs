//! Bit-granular serialization targets
//!
//! This module defines [`Target`], the write-side dual of
//! [`Parser`](crate::parse::Parser), along with its two implementors:
//! [`BitWriter`], which accumulates the serialized bytes, and [`BitCounter`],
//! which only counts how many bits would have been written.

use std::fmt::Debug;

use super::error::{SerializeError, SerializeResult};
use crate::internal::ContextStack;
use crate::parse::ByteOrder;

/// Write cursor with bit-level precision
///
/// Values are appended most-significant bit first, starting wherever the
/// previous write left off, which need not be a byte boundary. Any trailing
/// partial byte is padded with zero bits when the buffer is finalized.
///
/// Implementors supply the four required methods; every typed `write_*`
/// method is defined in terms of [`write_bits`](Target::write_bits), so the
/// number of bits a message writes is the same on every `Target`.
pub trait Target {
    /// Number of bits written so far
    fn pos(&self) -> usize;

    /// Appends the low `width` bits of `value`.
    ///
    /// # Errors
    ///
    /// * [`SerializeError::InvalidWidth`] unless `1 <= width <= 64`
    /// * [`SerializeError::ValueTooWide`] if `value` has any bit set at or
    ///   above position `width`; nothing is written in that case
    fn write_bits(&mut self, field: &'static str, width: usize, value: u64) -> SerializeResult<()>;

    /// Opens a named diagnostic context at the current position
    fn push_context(&mut self, name: &'static str) -> SerializeResult<()>;

    /// Closes the innermost diagnostic context, which must be named `name`
    fn pop_context(&mut self, name: &'static str) -> SerializeResult<()>;

    /// Byte order applied by the multi-byte integer writes
    fn byte_order(&self) -> ByteOrder {
        ByteOrder::BigEndian
    }

    /// Hook invoked with the recomputed value of every virtual field as it is
    /// passed over during serialization.
    ///
    /// Virtual fields occupy no bits, so the default implementation only
    /// emits a trace event.
    fn virtual_field(&mut self, field: &'static str, value: &dyn Debug) -> SerializeResult<()> {
        tracing::trace!(field, value = ?value, bit = self.pos(), "virtual field");
        Ok(())
    }

    #[inline]
    fn write_bit(&mut self, field: &'static str, value: bool) -> SerializeResult<()> {
        self.write_bits(field, 1, u64::from(value))
    }

    #[inline]
    fn write_u8(&mut self, field: &'static str, width: usize, value: u8) -> SerializeResult<()> {
        check_width(field, width, 8)?;
        self.write_bits(field, width, u64::from(value))
    }

    #[inline]
    fn write_u16(&mut self, field: &'static str, width: usize, value: u16) -> SerializeResult<()> {
        check_width(field, width, 16)?;
        check_fits(field, width, u64::from(value))?;
        let raw = self.byte_order().arrange(u64::from(value), width);
        self.write_bits(field, width, raw)
    }

    #[inline]
    fn write_u32(&mut self, field: &'static str, width: usize, value: u32) -> SerializeResult<()> {
        check_width(field, width, 32)?;
        check_fits(field, width, u64::from(value))?;
        let raw = self.byte_order().arrange(u64::from(value), width);
        self.write_bits(field, width, raw)
    }

    #[inline]
    fn write_u64(&mut self, field: &'static str, width: usize, value: u64) -> SerializeResult<()> {
        check_fits(field, width, value)?;
        let raw = self.byte_order().arrange(value, width);
        self.write_bits(field, width, raw)
    }

    #[inline]
    fn write_byte(&mut self, field: &'static str, value: u8) -> SerializeResult<()> {
        self.write_bits(field, 8, u64::from(value))
    }

    #[inline]
    fn write_i8(&mut self, field: &'static str, width: usize, value: i8) -> SerializeResult<()> {
        check_width(field, width, 8)?;
        self.write_i64(field, width, i64::from(value))
    }

    #[inline]
    fn write_i16(&mut self, field: &'static str, width: usize, value: i16) -> SerializeResult<()> {
        check_width(field, width, 16)?;
        self.write_i64(field, width, i64::from(value))
    }

    #[inline]
    fn write_i32(&mut self, field: &'static str, width: usize, value: i32) -> SerializeResult<()> {
        check_width(field, width, 32)?;
        self.write_i64(field, width, i64::from(value))
    }

    /// Appends `value` as a `width`-bit two's complement integer
    fn write_i64(&mut self, field: &'static str, width: usize, value: i64) -> SerializeResult<()> {
        check_width(field, width, 64)?;
        if width < 64 {
            let min = -(1i64 << (width - 1));
            let max = (1i64 << (width - 1)) - 1;
            if value < min || value > max {
                return Err(SerializeError::ValueTooWide {
                    field,
                    width,
                    value: i128::from(value),
                });
            }
            let mask = (1u64 << width) - 1;
            let raw = self.byte_order().arrange((value as u64) & mask, width);
            self.write_bits(field, width, raw)
        } else {
            let raw = self.byte_order().arrange(value as u64, width);
            self.write_bits(field, width, raw)
        }
    }

    /// Appends each byte of `bytes` as eight bits
    fn write_bytes(&mut self, field: &'static str, bytes: &[u8]) -> SerializeResult<()> {
        for &b in bytes {
            self.write_bits(field, 8, u64::from(b))?;
        }
        Ok(())
    }

    /// Appends the UTF-8 bytes of `value`, which must occupy exactly `bits` bits
    fn write_string(&mut self, field: &'static str, bits: usize, value: &str) -> SerializeResult<()> {
        let actual = value.len() * 8;
        if actual != bits {
            return Err(SerializeError::LengthMismatch {
                field,
                expected: bits,
                actual,
            });
        }
        self.write_bytes(field, value.as_bytes())
    }
}

#[inline]
pub(crate) fn check_width(field: &'static str, width: usize, max: usize) -> SerializeResult<()> {
    if width == 0 || width > max {
        Err(SerializeError::InvalidWidth { field, width, max })
    } else {
        Ok(())
    }
}

/// Validates that `value` can be written as a `width`-bit unsigned field
#[inline]
pub(crate) fn check_fits(field: &'static str, width: usize, value: u64) -> SerializeResult<()> {
    check_width(field, width, 64)?;
    if width < 64 && value >> width != 0 {
        Err(SerializeError::ValueTooWide {
            field,
            width,
            value: i128::from(value),
        })
    } else {
        Ok(())
    }
}

/// `Target` that accumulates the serialized bits into a byte vector
#[derive(Clone, Debug, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    bits: usize,
    contexts: ContextStack,
    order: ByteOrder,
}

impl BitWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer whose buffer can hold `bytes` bytes without reallocating
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buf: Vec::with_capacity(bytes),
            ..Self::default()
        }
    }

    /// Creates a writer whose multi-byte integer writes use `order`
    #[must_use]
    pub fn with_byte_order(order: ByteOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    /// Bytes written so far, including any partially filled final byte
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer and returns its bytes, zero-padding the final byte.
    ///
    /// # Errors
    ///
    /// Fails if any context opened on this writer was left unclosed.
    pub fn finish(self) -> SerializeResult<Vec<u8>> {
        self.contexts.ensure_closed()?;
        Ok(self.buf)
    }
}

impl Target for BitWriter {
    #[inline]
    fn pos(&self) -> usize {
        self.bits
    }

    #[inline]
    fn byte_order(&self) -> ByteOrder {
        self.order
    }

    fn write_bits(&mut self, field: &'static str, width: usize, value: u64) -> SerializeResult<()> {
        check_fits(field, width, value)?;
        let mut left = width;
        while left > 0 {
            let bit_off = self.bits % 8;
            if bit_off == 0 {
                self.buf.push(0);
            }
            let take = (8 - bit_off).min(left);
            let chunk = ((value >> (left - take)) & ((1u64 << take) - 1)) as u8;
            let shift = 8 - bit_off - take;
            if let Some(last) = self.buf.last_mut() {
                *last |= chunk << shift;
            }
            self.bits += take;
            left -= take;
        }
        Ok(())
    }

    fn write_bytes(&mut self, field: &'static str, bytes: &[u8]) -> SerializeResult<()> {
        if self.bits % 8 == 0 {
            self.buf.extend_from_slice(bytes);
            self.bits += bytes.len() * 8;
            Ok(())
        } else {
            for &b in bytes {
                self.write_bits(field, 8, u64::from(b))?;
            }
            Ok(())
        }
    }

    fn push_context(&mut self, name: &'static str) -> SerializeResult<()> {
        self.contexts.push(name, self.bits);
        Ok(())
    }

    fn pop_context(&mut self, name: &'static str) -> SerializeResult<()> {
        self.contexts.pop(name, self.bits)?;
        Ok(())
    }
}

/// Zero-allocation `Target` that only counts the bits that would be written
///
/// Because it shares every default method with [`BitWriter`], the count it
/// reports is exactly the length of the serialized form.
#[derive(Clone, Debug, Default)]
pub struct BitCounter {
    bits: usize,
    contexts: ContextStack,
}

impl BitCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> SerializeResult<usize> {
        self.contexts.ensure_closed()?;
        Ok(self.bits)
    }
}

impl Target for BitCounter {
    #[inline]
    fn pos(&self) -> usize {
        self.bits
    }

    #[inline]
    fn write_bits(&mut self, field: &'static str, width: usize, value: u64) -> SerializeResult<()> {
        check_fits(field, width, value)?;
        self.bits += width;
        Ok(())
    }

    fn push_context(&mut self, name: &'static str) -> SerializeResult<()> {
        self.contexts.push(name, self.bits);
        Ok(())
    }

    fn pop_context(&mut self, name: &'static str) -> SerializeResult<()> {
        self.contexts.pop(name, self.bits)?;
        Ok(())
    }

    fn virtual_field(&mut self, _: &'static str, _: &dyn Debug) -> SerializeResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContextError;
    use crate::parse::{BitParser, Parser};

    #[test]
    fn packs_header_bits() {
        let mut w = BitWriter::new();
        w.write_bits("priority", 2, 0b01).unwrap();
        w.write_bit("dp", false).unwrap();
        w.write_bits("rc", 2, 0b01).unwrap();
        w.write_bits("type", 3, 0b011).unwrap();
        w.write_byte("next", 0xA4).unwrap();
        assert_eq!(w.pos(), 16);
        assert_eq!(w.finish().unwrap(), vec![0x4B, 0xA4]);
    }

    #[test]
    fn straddling_and_padding() {
        let mut w = BitWriter::new();
        w.write_bits("nibble", 4, 0xD).unwrap();
        w.write_u32("unaligned", 32, 0xEADB_EEF0).unwrap();
        w.write_bit("tail", true).unwrap();
        assert_eq!(w.pos(), 37);
        assert_eq!(w.finish().unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF, 0x08]);
    }

    #[test]
    fn little_endian_round_trip() {
        let mut w = BitWriter::with_byte_order(ByteOrder::LittleEndian);
        w.write_u16("lo", 16, 0x1234).unwrap();
        w.write_u32("mid", 32, 0x1234_5678).unwrap();
        w.write_i16("neg", 16, -2).unwrap();
        w.write_u8("flag", 8, 0x0A).unwrap();
        let bytes = w.finish().unwrap();
        assert_eq!(bytes, vec![0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xFE, 0xFF, 0x0A]);

        let mut p = BitParser::with_byte_order(&bytes, ByteOrder::LittleEndian);
        assert_eq!(p.read_u16("lo", 16), Ok(0x1234));
        assert_eq!(p.read_u32("mid", 32), Ok(0x1234_5678));
        assert_eq!(p.read_i16("neg", 16), Ok(-2));
        assert_eq!(p.read_byte("flag"), Ok(0x0A));

        let mut w = BitWriter::with_byte_order(ByteOrder::LittleEndian);
        assert!(w.write_u32("wide", 24, 0x0100_0000).is_err());
        assert_eq!(w.pos(), 0);
    }

    #[test]
    fn rejects_values_wider_than_field() {
        let mut w = BitWriter::new();
        assert_eq!(
            w.write_bits("rc", 2, 4),
            Err(SerializeError::ValueTooWide {
                field: "rc",
                width: 2,
                value: 4
            })
        );
        assert_eq!(w.pos(), 0);
        assert!(w.write_i8("delta", 4, -8).is_ok());
        assert!(w.write_i8("delta", 4, 8).is_err());
        assert!(w.write_u8("too_wide", 9, 0).is_err());
    }

    #[test]
    fn signed_values_are_masked() {
        let mut w = BitWriter::new();
        w.write_i8("a", 3, -1).unwrap();
        w.write_i8("b", 5, 7).unwrap();
        w.write_i16("c", 16, -2).unwrap();
        assert_eq!(w.finish().unwrap(), vec![0b1110_0111, 0xFF, 0xFE]);
    }

    #[test]
    fn string_length_must_match_layout() {
        let mut w = BitWriter::new();
        assert!(w.write_string("number", 32, "0412").is_ok());
        assert_eq!(
            w.write_string("number", 32, "041"),
            Err(SerializeError::LengthMismatch {
                field: "number",
                expected: 32,
                actual: 24
            })
        );
    }

    #[test]
    fn counter_agrees_with_writer() {
        fn emit<T: Target>(t: &mut T) -> SerializeResult<()> {
            t.push_context("msg")?;
            t.write_bits("a", 3, 5)?;
            t.virtual_field("isDirect", &true)?;
            t.write_bytes("b", &[1, 2, 3])?;
            t.write_i32("c", 17, -3)?;
            t.pop_context("msg")
        }
        let mut w = BitWriter::new();
        let mut c = BitCounter::new();
        emit(&mut w).unwrap();
        emit(&mut c).unwrap();
        assert_eq!(c.finish().unwrap(), w.pos());
    }

    #[test]
    fn unclosed_context_fails_finish() {
        let mut w = BitWriter::new();
        w.push_context("CBusCommand").unwrap();
        assert_eq!(
            w.finish(),
            Err(SerializeError::Context(ContextError::Unclosed {
                depth: 1,
                innermost: "CBusCommand"
            }))
        );
    }
}
