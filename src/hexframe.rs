//! ASCII-hex framing with an optional checksum and trailing tag
//!
//! Some serial PLC protocols do not put raw binary on the wire. Instead, each
//! byte of a message is sent as two upper-case ASCII hex digits, optionally
//! followed by a one-byte checksum (also hex-encoded) and then by a single
//! lower-case *tag* character in the range `'g'..='z'` that the peer uses to
//! correlate replies with requests.
//!
//! Since the tag is not a hex digit but is adjacent to the payload, the
//! reader scans for the end of the run of hex-or-tag characters, and if the
//! last character of the run falls in the tag range it is excluded from the
//! hex payload and the cursor is rewound by exactly one byte, leaving the tag
//! to be read by whatever comes next in the frame.
//!
//! The checksum is the two's complement of the 8-bit sum of the payload
//! bytes, so that the sum of payload and checksum is zero modulo 256. Whether
//! it is present is decided by the caller through [`HexFrameOptions`].

use std::ops::RangeInclusive;

use crate::conv::error::SerializeResult;
use crate::conv::target::Target;
use crate::error::{ChecksumError, HexConvError};
use crate::parse::error::{ParseError, ParseResult};
use crate::parse::Parser;

/// Characters that may follow a hex payload as a correlation tag
pub const TAG_RANGE: RangeInclusive<u8> = b'g'..=b'z';

/// Caller-supplied framing configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct HexFrameOptions {
    /// Whether the payload is followed by a checksum byte, which is then
    /// validated on read and computed on write
    pub checksum: bool,
}

impl HexFrameOptions {
    #[must_use]
    pub const fn with_checksum(checksum: bool) -> Self {
        Self { checksum }
    }
}

#[inline]
#[must_use]
pub const fn is_hex_digit(b: u8) -> bool {
    matches!(b, b'0'..=b'9' | b'A'..=b'F')
}

#[inline]
#[must_use]
pub fn is_tag(b: u8) -> bool {
    TAG_RANGE.contains(&b)
}

/// Two's complement of the 8-bit sum of `bytes`
#[must_use]
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_add(b))
        .wrapping_neg()
}

/// Checks `received` against the checksum of `payload`
pub fn verify_checksum(payload: &[u8], received: u8) -> Result<(), ChecksumError> {
    let computed = checksum(payload);
    if computed == received {
        Ok(())
    } else {
        Err(ChecksumError { computed, received })
    }
}

/// Formats a sequence of bytes into an undelimited upper-case hexadecimal `String`
#[must_use]
pub fn hex_of_bytes(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut hex = String::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        if write!(&mut hex, "{byte:02X}").is_err() {
            unreachable!("write to String should never fail");
        }
    }
    hex
}

/// Decodes a run of upper-case ASCII hex digits
///
/// # Errors
///
/// * [`HexConvError::OddParity`] if the run has odd length
/// * [`HexConvError::NonHex`] for the first character outside `[0-9A-F]`
pub fn bytes_of_hex(digits: &[u8]) -> Result<Vec<u8>, HexConvError> {
    if digits.len() % 2 != 0 {
        return Err(HexConvError::OddParity(digits.len()));
    }
    let nibble = |offset: usize| -> Result<u8, HexConvError> {
        let found = digits[offset];
        match found {
            b'0'..=b'9' => Ok(found - b'0'),
            b'A'..=b'F' => Ok(found - b'A' + 10),
            _ => Err(HexConvError::NonHex { offset, found }),
        }
    };
    let mut dst = Vec::with_capacity(digits.len() / 2);
    for ix in (0..digits.len()).step_by(2) {
        dst.push(nibble(ix)? << 4 | nibble(ix + 1)?);
    }
    Ok(dst)
}

/// Counts the bytes from the cursor onward that are hex digits or tag
/// characters, stopping at the first byte that is neither. The cursor is
/// left where it was.
pub fn find_hex_end<P: Parser>(p: &mut P) -> ParseResult<usize> {
    let start = p.pos();
    let mut count = 0;
    while p.has_more(8) {
        let b = p.read_byte("hex")?;
        if !(is_hex_digit(b) || is_tag(b)) {
            break;
        }
        count += 1;
    }
    p.reset(start)?;
    Ok(count)
}

/// Reads a hex-encoded payload as field `field`
///
/// If the scanned run ends in a tag character, the tag is left unconsumed.
/// With `options.checksum`, the final decoded byte is validated as the
/// checksum of the rest and stripped from the result.
///
/// # Errors
///
/// * [`ParseError::Hex`] if there is no payload or it is not valid hex
/// * [`ParseError::Checksum`] if the checksum does not match
pub fn read_hex_payload<P: Parser>(p: &mut P, field: &'static str, options: HexFrameOptions) -> ParseResult<Vec<u8>> {
    let len = find_hex_end(p)?;
    let mut digits = p.read_bytes(field, len)?;
    if let Some(&last) = digits.last() {
        if is_tag(last) {
            p.reset(p.pos() - 8)?;
            digits.pop();
            tracing::trace!(field, tag = %char::from(last), "excluding trailing tag from hex payload");
        }
    }
    if digits.is_empty() {
        return Err(HexConvError::Empty.into());
    }
    let mut bytes = bytes_of_hex(&digits)?;
    if options.checksum {
        let received = bytes.pop().ok_or(ParseError::Hex(HexConvError::Empty))?;
        verify_checksum(&bytes, received)?;
    }
    Ok(bytes)
}

/// Writes `payload` as upper-case hex digits, followed by its checksum when
/// `options.checksum` is set
pub fn write_hex_payload<T: Target>(
    buf: &mut T,
    field: &'static str,
    payload: &[u8],
    options: HexFrameOptions,
) -> SerializeResult<()> {
    buf.write_bytes(field, hex_of_bytes(payload).as_bytes())?;
    if options.checksum {
        buf.write_bytes(field, hex_of_bytes(&[checksum(payload)]).as_bytes())?;
    }
    Ok(())
}

/// Bit-length of a hex-encoded payload of `payload_len` bytes
#[must_use]
pub const fn hex_payload_bits(payload_len: usize, options: HexFrameOptions) -> usize {
    let bytes = if options.checksum {
        payload_len + 1
    } else {
        payload_len
    };
    bytes * 2 * 8
}
