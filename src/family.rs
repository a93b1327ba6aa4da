//! Discriminated dispatch over closed families of message variants
//!
//! A *family* is a message type with several variants that share a common
//! prefix of fields. Some of those shared fields (or values passed in from an
//! enclosing message) act as *discriminators*: once they are decoded, they
//! determine which variant owns the remaining bits.
//!
//! Parsing a family is therefore two-phase:
//!
//! 1. [`Family::parse_shared`] reads the shared prefix into a
//!    [`Family::Shared`] value.
//! 2. [`Family::parse_variant`] evaluates the discriminators, normally as a
//!    single `match` over them, takes the shared prefix **by value**, reads
//!    the variant's own fields and assembles the final enum value. A
//!    discriminator combination with no arm is reported through
//!    [`unmapped`]; there is never an implicit default variant.
//!
//! Serialization mirrors this with [`serialize_parent`]: the shared prefix is
//! written first, then a variant-supplied callback writes the rest, so the
//! field order of the two paths is the same by construction. Before anything
//! is written, [`Family::selects_variant`] must confirm that the stored
//! discriminators lead back to the variant being written.
//!
//! Both directions run inside a diagnostic context named after the family,
//! so errors from any depth carry the family name as a breadcrumb.

use std::fmt::{Display, Formatter};

use crate::conv::error::{SerializeError, SerializeResult};
use crate::conv::target::Target;
use crate::field::{read_in_context, write_in_context};
use crate::parse::error::{ParseError, ParseResult, UnmappedVariant};
use crate::parse::Parser;

/// A closed set of message variants sharing a common field prefix
///
/// Implementors are normally enums with one tuple variant per message
/// variant, each of which embeds its own copy of `Shared`.
pub trait Family: Sized {
    /// Name of the family, used as its diagnostic context
    const TYPE_NAME: &'static str;

    /// Values supplied by the enclosing message; `()` for top-level families
    type Args: Copy;

    /// The shared field prefix, including any discriminators
    type Shared: Clone;

    /// Reads the shared prefix
    fn parse_shared<P: Parser>(p: &mut P, args: Self::Args) -> ParseResult<Self::Shared>;

    /// Selects a variant from the discriminators and reads its own fields
    fn parse_variant<P: Parser>(p: &mut P, shared: Self::Shared, args: Self::Args) -> ParseResult<Self>;

    /// The shared prefix embedded in `self`
    fn shared(&self) -> &Self::Shared;

    /// Whether [`parse_variant`](Family::parse_variant) would pick the variant
    /// of `self` given the discriminators in `self.shared()`
    fn selects_variant(&self) -> bool;

    /// Writes the shared prefix
    fn write_shared<T: Target>(shared: &Self::Shared, buf: &mut T) -> SerializeResult<()>;

    /// Writes the fields that follow the shared prefix
    fn write_variant<T: Target>(&self, buf: &mut T) -> SerializeResult<()>;

    /// Bit-length of the shared prefix
    fn shared_bits(shared: &Self::Shared) -> usize;

    /// Bit-length of the fields that follow the shared prefix
    fn variant_bits(&self) -> usize;
}

/// Parses a complete family value: shared prefix, dispatch, then variant
pub fn parse_family<F: Family, P: Parser>(p: &mut P, args: F::Args) -> ParseResult<F> {
    read_in_context(p, F::TYPE_NAME, |p| {
        let shared = F::parse_shared(p, args)?;
        F::parse_variant(p, shared, args)
    })
}

/// Writes a complete family value
///
/// # Errors
///
/// Fails with [`SerializeError::Misclassified`] if the shared prefix of `msg`
/// would parse back as a different variant.
pub fn write_family<F: Family, T: Target>(msg: &F, buf: &mut T) -> SerializeResult<()> {
    serialize_parent(
        buf,
        F::TYPE_NAME,
        |buf| {
            if !msg.selects_variant() {
                return Err(SerializeError::Misclassified {
                    type_name: F::TYPE_NAME,
                });
            }
            F::write_shared(msg.shared(), buf)
        },
        |buf| msg.write_variant(buf),
    )
}

/// Total bit-length of a family value
pub fn family_bits<F: Family>(msg: &F) -> usize {
    F::shared_bits(msg.shared()) + msg.variant_bits()
}

/// Writes the shared fields of a message and then hands the target to the
/// variant's serializer
pub fn serialize_parent<T, S, C>(buf: &mut T, type_name: &'static str, write_shared: S, write_child: C) -> SerializeResult<()>
where
    T: Target,
    S: FnOnce(&mut T) -> SerializeResult<()>,
    C: FnOnce(&mut T) -> SerializeResult<()>,
{
    write_in_context(buf, type_name, |buf| {
        write_shared(buf)?;
        write_child(buf)
    })
}

/// Builds the error for a discriminator combination with no variant
///
/// Every discriminator is listed by name and value, in evaluation order.
pub fn unmapped(type_name: &'static str, discriminators: &[(&'static str, &dyn Display)]) -> ParseError {
    let err = UnmappedVariant {
        type_name,
        discriminators: discriminators
            .iter()
            .map(|(name, value)| (*name, value.to_string()))
            .collect(),
    };
    tracing::debug!(%err, "no variant for discriminators");
    ParseError::Unmapped(err)
}

/// Shorthand for [`unmapped`] that lists discriminators as `name => value`
///
/// ```ignore
/// Err(unmapped!(Self::TYPE_NAME; "commandType" => command_type, "argument" => Hex(argument.into())))
/// ```
#[macro_export]
macro_rules! unmapped {
    ( $type_name:expr; $( $name:literal => $value:expr ),+ $(,)? ) => {
        $crate::family::unmapped(
            $type_name,
            &[ $( ($name, &$value as &dyn ::std::fmt::Display) ),+ ],
        )
    };
}

/// Display wrapper that renders integer discriminators in hexadecimal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hex(pub u64);

impl Display for Hex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}
