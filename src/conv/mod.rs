//! Core of the binary-conversion API
//!
//! This module contains definitions for the high-level transcoding traits
//! [`Encode`] and [`Decode`], which are motivationally equivalent to the
//! `Serialize` and `Deserialize` traits defined in `serde`, along with
//! [`DecodeWith`], the variant of `Decode` for message types whose layout
//! depends on values decoded earlier by an enclosing message.
//!
//! The sub-module [`len`] defines [`LengthAware`], the oracle for the
//! serialized length of a value, and [`target`] defines [`Target`], the
//! write-side dual of [`Parser`], acting as the generic bound for
//! serialization in [`Encode::write_to`].

use crate::parse::{BitParser, ParseResult, Parser};

use self::target::{BitCounter, BitWriter, Target};

pub mod error;
pub mod len;
pub mod target;

pub use error::{SerializeError, SerializeResult, SerializeResultExt};
pub use len::{FixedBits, LengthAware};

/// Trait for message types that can be serialized into their wire form
///
/// Implementing [`Encode`] only requires [`write_to`](Encode::write_to),
/// which must write fields in exactly the order
/// [`Decode::parse`] reads them. The remaining methods are defined in terms
/// of it.
pub trait Encode {
    /// Appends the serialized bits of this value to a generic target.
    ///
    /// The natural definition of this method is structurally inductive on the
    /// fields of the type in question, with virtual fields reported to
    /// [`Target::virtual_field`] rather than written.
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()>;

    /// Creates a new buffer and fills it with the serialized bytes of this value.
    ///
    /// If the implementing type is also [`LengthAware`], prefer
    /// [`EncodeLength::to_bytes_full`], which allocates once.
    fn serialize(&self) -> SerializeResult<Vec<u8>> {
        let mut buf = BitWriter::new();
        self.write_to(&mut buf)?;
        buf.finish()
    }

    /// Number of bits [`write_to`](Encode::write_to) emits, measured by
    /// running it against a [`BitCounter`].
    fn counted_bits(&self) -> SerializeResult<usize> {
        let mut counter = BitCounter::new();
        self.write_to(&mut counter)?;
        counter.finish()
    }
}

/// Extension trait for `Encode` that makes use of serialization-length oracles
pub trait EncodeLength: Encode + LengthAware {
    /// Serializes `self` into a buffer pre-allocated to the exact length
    /// reported by [`LengthAware::length_in_bytes`].
    fn to_bytes_full(&self) -> SerializeResult<Vec<u8>> {
        let mut buf = BitWriter::with_capacity(self.length_in_bytes());
        self.write_to(&mut buf)?;
        buf.finish()
    }
}

impl<T: Encode + LengthAware + ?Sized> EncodeLength for T {}

/// Trait providing methods for deserializing binary data into values of a certain type
///
/// Implementations are defined by one required method, [`parse`](Decode::parse),
/// which consumes the contextually appropriate number of bits from a
/// [`Parser`] and either returns a valid value of the implementing type, or
/// an error if parsing failed or yielded a value determined to be invalid.
pub trait Decode: Sized {
    /// Attempt to consume and interpret a value of type `Self` from an existing
    /// `Parser` object.
    ///
    /// # Errors
    ///
    /// In most cases, the errors returned by this method will be propagated
    /// from calls made to [`Parser`] methods in the implementation logic,
    /// wrapped in breadcrumbs naming the fields they passed through.
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self>;

    /// Attempt to decode a value of the `Self` type from a byte buffer.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by [`parse`](Decode::parse). In
    /// addition, if the feature-flag `check_complete_parse` is enabled, the
    /// parse is required to consume every bit of the buffer, failing with
    /// [`ParseError::Leftover`](crate::parse::ParseError::Leftover)
    /// otherwise.
    fn try_decode<U: AsRef<[u8]>>(input: U) -> ParseResult<Self> {
        let mut p = BitParser::new(input.as_ref());
        let ret = Self::parse(&mut p)?;
        let _leftover = p.finish()?;
        #[cfg(feature = "check_complete_parse")]
        {
            if _leftover != 0 {
                return Err(crate::parse::ParseError::Leftover(_leftover));
            }
        }
        Ok(ret)
    }

    /// Decodes a value of type `Self` from a byte buffer.
    ///
    /// This is a convenience for fixtures and tests, where the input is known
    /// to be valid.
    ///
    /// # Panics
    ///
    /// This method will panic if the interior call to [`try_decode`](Decode::try_decode)
    /// returns an `Err(_)` value.
    fn decode<U: AsRef<[u8]>>(input: U) -> Self {
        Self::try_decode(input).unwrap_or_else(|err| {
            panic!(
                "<{} as Decode>::decode encountered error: {}",
                std::any::type_name::<Self>(),
                err
            )
        })
    }
}

/// Trait for message types whose layout is parameterized by values decoded
/// earlier in an enclosing message.
///
/// `Args` is usually a small `Copy` type: a discriminator enum, a byte count,
/// or a tuple of such values.
pub trait DecodeWith<Args>: Sized {
    fn parse_with<P: Parser>(p: &mut P, args: Args) -> ParseResult<Self>;

    /// As [`Decode::try_decode`], supplying `args` to the top-level parse
    fn try_decode_with<U: AsRef<[u8]>>(input: U, args: Args) -> ParseResult<Self> {
        let mut p = BitParser::new(input.as_ref());
        let ret = Self::parse_with(&mut p, args)?;
        let _leftover = p.finish()?;
        #[cfg(feature = "check_complete_parse")]
        {
            if _leftover != 0 {
                return Err(crate::parse::ParseError::Leftover(_leftover));
            }
        }
        Ok(ret)
    }
}

impl Encode for bool {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        buf.write_bit("bool", *self)
    }
}

impl Decode for bool {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        p.read_bit("bool")
    }
}

macro_rules! impl_full_width {
    ( $( $t:ty => $read:ident, $write:ident, $bits:expr );+ $(;)? ) => {
        $(
            impl Encode for $t {
                fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
                    buf.$write(stringify!($t), $bits, *self)
                }
            }

            impl Decode for $t {
                fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
                    p.$read(stringify!($t), $bits)
                }
            }
        )+
    };
}

impl_full_width! {
    u8 => read_u8, write_u8, 8;
    u16 => read_u16, write_u16, 16;
    u32 => read_u32, write_u32, 32;
    u64 => read_u64, write_u64, 64;
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pair {
        flag: bool,
        id: u16,
    }

    impl Encode for Pair {
        fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
            buf.write_bit("flag", self.flag)?;
            buf.write_u16("id", 15, self.id)
        }
    }

    impl Decode for Pair {
        fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
            Ok(Self {
                flag: p.read_bit("flag")?,
                id: p.read_u16("id", 15)?,
            })
        }
    }

    impl LengthAware for Pair {
        fn length_in_bits(&self) -> usize {
            16
        }
    }

    #[test]
    fn primitive_roundtrip() {
        assert_eq!(0xBEEFu16.serialize().unwrap(), vec![0xBE, 0xEF]);
        assert_eq!(u32::decode([0u8, 0, 1, 0]), 256);
        assert_eq!(0x42u8.counted_bits().unwrap(), 8);
    }

    #[test]
    fn composite_roundtrip() {
        let v = Pair { flag: true, id: 0x1234 };
        let bytes = v.to_bytes_full().unwrap();
        assert_eq!(bytes, vec![0x92, 0x34]);
        assert_eq!(Pair::decode(&bytes), v);
        assert_eq!(v.counted_bits().unwrap(), v.length_in_bits());
    }

    #[test]
    #[should_panic]
    fn decode_panics_on_underrun() {
        let _ = Pair::decode([0x92u8]);
    }

    #[cfg(not(feature = "check_complete_parse"))]
    #[test]
    fn leftover_is_tolerated_by_default() {
        assert_eq!(u8::try_decode([1u8, 2]), Ok(1));
    }

    #[cfg(feature = "check_complete_parse")]
    #[test]
    fn leftover_is_rejected() {
        assert_eq!(
            u8::try_decode([1u8, 2]),
            Err(crate::parse::ParseError::Leftover(8))
        );
    }
}
