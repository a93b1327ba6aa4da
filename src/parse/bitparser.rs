//! Slice-backed implementation of [`Parser`]

use super::error::{ParseError, ParseResult};
use super::{check_width, ByteOrder, Parser};
use crate::internal::{BitIndex, ContextStack};

/// Bit-granular read cursor over a borrowed byte-slice
///
/// `BitParser` never copies its input; byte-array reads that start on a byte
/// boundary are served directly from the slice.
#[derive(Clone, Debug)]
pub struct BitParser<'a> {
    buf: &'a [u8],
    offset: BitIndex,
    contexts: ContextStack,
    order: ByteOrder,
}

impl<'a> BitParser<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_byte_order(buf, ByteOrder::BigEndian)
    }

    /// Creates a parser whose multi-byte integer reads use `order`
    #[must_use]
    pub fn with_byte_order(buf: &'a [u8], order: ByteOrder) -> Self {
        Self {
            buf,
            offset: BitIndex::new(),
            contexts: ContextStack::new(),
            order,
        }
    }

    /// The unconsumed portion of the buffer, starting from the byte the
    /// cursor currently points into
    #[must_use]
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.offset.to_usize() / 8..]
    }

    /// Consumes the parser, checking that every context was closed, and
    /// returns the number of bits that were left unread
    pub fn finish(self) -> ParseResult<usize> {
        self.contexts.ensure_closed()?;
        Ok(self.len_bits() - self.offset.to_usize())
    }
}

impl<'a> From<&'a [u8]> for BitParser<'a> {
    fn from(buf: &'a [u8]) -> Self {
        Self::new(buf)
    }
}

impl<'a> From<&'a Vec<u8>> for BitParser<'a> {
    fn from(buf: &'a Vec<u8>) -> Self {
        Self::new(buf.as_slice())
    }
}

impl Parser for BitParser<'_> {
    #[inline]
    fn pos(&self) -> usize {
        self.offset.to_usize()
    }

    #[inline]
    fn len_bits(&self) -> usize {
        self.buf.len() * 8
    }

    fn reset(&mut self, pos: usize) -> ParseResult<()> {
        let len = self.len_bits();
        if self.offset.set_checked(pos, len) {
            Ok(())
        } else {
            Err(ParseError::ResetOutOfBounds { requested: pos, len })
        }
    }

    fn read_bits(&mut self, field: &'static str, width: usize) -> ParseResult<u64> {
        check_width(field, width, 64)?;
        let (start, ok) = self.offset.increment_checked(width, self.len_bits());
        if !ok {
            return Err(ParseError::Underrun {
                field,
                requested: width,
                available: self.len_bits() - start,
            });
        }

        let mut acc: u64 = 0;
        let mut pos = start;
        let mut left = width;
        while left > 0 {
            let byte = self.buf[pos / 8];
            let bit_off = pos % 8;
            let take = (8 - bit_off).min(left);
            let shift = 8 - bit_off - take;
            let mask = ((1u16 << take) - 1) as u8;
            let chunk = (byte >> shift) & mask;
            acc = (acc << take) | u64::from(chunk);
            pos += take;
            left -= take;
        }
        Ok(acc)
    }

    fn read_bytes(&mut self, field: &'static str, count: usize) -> ParseResult<Vec<u8>> {
        if !self.offset.is_aligned() {
            let mut ret = Vec::with_capacity(count);
            if !self.has_more(count * 8) {
                return Err(ParseError::Underrun {
                    field,
                    requested: count * 8,
                    available: self.remaining_bits(),
                });
            }
            for _ in 0..count {
                ret.push(self.read_bits(field, 8)? as u8);
            }
            return Ok(ret);
        }
        let (start, ok) = self.offset.increment_checked(count * 8, self.len_bits());
        if !ok {
            return Err(ParseError::Underrun {
                field,
                requested: count * 8,
                available: self.len_bits() - start,
            });
        }
        let from = start / 8;
        Ok(self.buf[from..from + count].to_vec())
    }

    fn push_context(&mut self, name: &'static str) -> ParseResult<()> {
        self.contexts.push(name, self.offset.to_usize());
        Ok(())
    }

    fn pop_context(&mut self, name: &'static str) -> ParseResult<()> {
        self.contexts.pop(name, self.offset.to_usize())?;
        Ok(())
    }

    fn context_depth(&self) -> usize {
        self.contexts.depth()
    }

    #[inline]
    fn byte_order(&self) -> ByteOrder {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContextError;

    #[test]
    fn reads_across_byte_boundaries() {
        // 0b0100_1011 0b1100_0001
        let mut p = BitParser::new(&[0x4B, 0xC1]);
        assert_eq!(p.read_bits("priority", 2), Ok(0b01));
        assert_eq!(p.read_bit("dp"), Ok(false));
        assert_eq!(p.read_bits("rc", 2), Ok(0b01));
        assert_eq!(p.read_bits("type", 3), Ok(0b011));
        assert_eq!(p.pos(), 8);
        assert_eq!(p.read_bits("straddle", 4), Ok(0b1100));
        assert_eq!(p.read_u8("tail", 4), Ok(0b0001));
        assert!(!p.has_more(1));
    }

    #[test]
    fn wide_reads() {
        let bytes = [0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x23, 0x45, 0x67];
        let mut p = BitParser::new(&bytes);
        assert_eq!(p.read_u64("all", 64), Ok(0xDEAD_BEEF_0123_4567));

        let mut p = BitParser::new(&bytes);
        assert_eq!(p.read_bits("nibble", 4), Ok(0xD));
        assert_eq!(p.read_u32("unaligned", 32), Ok(0xEADB_EEF0));
    }

    #[test]
    fn little_endian_reads() {
        let bytes = [0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xFE, 0xFF, 0x0A];
        let mut p = BitParser::with_byte_order(&bytes, ByteOrder::LittleEndian);
        assert_eq!(p.byte_order(), ByteOrder::LittleEndian);
        assert_eq!(p.read_u16("lo", 16), Ok(0x1234));
        assert_eq!(p.read_u32("mid", 32), Ok(0x1234_5678));
        assert_eq!(p.read_i16("neg", 16), Ok(-2));
        assert_eq!(p.read_u8("nibble", 4), Ok(0x0));
        assert_eq!(p.read_u16("short", 4), Ok(0xA));
    }

    #[test]
    fn signed_reads() {
        let mut p = BitParser::new(&[0b1110_0111, 0xFF, 0xFE]);
        assert_eq!(p.read_i8("a", 3), Ok(-1));
        assert_eq!(p.read_i8("b", 5), Ok(7));
        assert_eq!(p.read_i16("c", 16), Ok(-2));
    }

    #[test]
    fn underrun_names_field_and_leaves_cursor() {
        let mut p = BitParser::new(&[0xFF]);
        assert_eq!(p.read_bits("head", 5), Ok(0x1F));
        assert_eq!(
            p.read_bits("kWhr", 32),
            Err(ParseError::Underrun {
                field: "kWhr",
                requested: 32,
                available: 3
            })
        );
        assert_eq!(p.pos(), 5);
        assert_eq!(
            p.read_bytes("data", 1),
            Err(ParseError::Underrun {
                field: "data",
                requested: 8,
                available: 3
            })
        );
    }

    #[test]
    fn unaligned_byte_array() {
        let mut p = BitParser::new(&[0x0A, 0xBC, 0xD0]);
        assert_eq!(p.read_bits("pad", 4), Ok(0));
        assert_eq!(p.read_bytes("data", 2), Ok(vec![0xAB, 0xCD]));
        assert_eq!(p.remaining_bits(), 4);
    }

    #[test]
    fn peek_and_reset() {
        let mut p = BitParser::new(&[0x31, 0x09, 0x00]);
        assert_eq!(p.peek_bits("bridgeAddressCountPlusOne", 16), Ok(0x3109));
        assert_eq!(p.pos(), 0);
        assert_eq!(p.read_byte("bridgeAddress"), Ok(0x31));
        assert_eq!(p.peek_byte("next"), Ok(0x09));
        assert!(p.reset(24).is_ok());
        assert_eq!(
            p.reset(25),
            Err(ParseError::ResetOutOfBounds {
                requested: 25,
                len: 24
            })
        );
        assert!(p.reset(0).is_ok());
        assert_eq!(p.rest(), &[0x31, 0x09, 0x00]);
    }

    #[test]
    fn strings_are_utf8_checked() {
        let mut p = BitParser::new(b"0412\xFF");
        assert_eq!(p.read_string("number", 32), Ok(String::from("0412")));
        assert_eq!(
            p.read_string("number", 8),
            Err(ParseError::Utf8 { field: "number" })
        );
        let mut p = BitParser::new(b"ab");
        assert!(matches!(
            p.read_string("odd", 12),
            Err(ParseError::Validation(_))
        ));
    }

    #[test]
    fn context_imbalance_is_an_error() {
        let mut p = BitParser::new(&[]);
        assert!(p.push_context("outer").is_ok());
        assert!(p.push_context("inner").is_ok());
        assert_eq!(
            p.pop_context("outer"),
            Err(ParseError::Context(ContextError::Mismatched {
                requested: "outer",
                open: "inner"
            }))
        );
        assert!(p.pop_context("inner").is_ok());
        assert!(p.clone().finish().is_err());
        assert!(p.pop_context("outer").is_ok());
        assert_eq!(p.finish(), Ok(0));
    }
}
