//! Read and write helpers for each kind of field in a message layout
//!
//! Hand-written `Decode`/`Encode` implementations are sequences of calls to
//! the functions in this module, one per field, in wire order. The helpers
//! come in read/write pairs so that the two directions of a layout can be
//! checked against each other line by line.
//!
//! | kind      | read                      | write                  | bits             |
//! |-----------|---------------------------|------------------------|------------------|
//! | Simple    | `Parser::read_*`          | `Target::write_*`      | declared width   |
//! | Const     | [`read_const`]            | [`write_const`]        | declared width   |
//! | Reserved  | [`read_reserved`]         | [`write_reserved`]     | declared width   |
//! | Enum      | [`read_enum`]             | [`write_enum`]         | table width      |
//! | Virtual   | [`read_virtual`]          | [`write_virtual`]      | 0                |
//! | Implicit  | [`read_implicit`]         | [`write_implicit`]     | declared width   |
//! | Optional  | [`read_optional`]         | [`write_optional`]     | 0 when absent    |
//! | Complex   | [`read_complex`]          | [`write_complex`]      | recursive        |
//! | Array     | [`read_count_array`], [`read_length_array`] | [`write_array`] | sum of elements |
//! | Bytes     | `Parser::read_bytes`      | [`write_sized_bytes`]  | computed length  |
//!
//! A Const field is strict: any other value fails the parse. A Reserved
//! field is tolerant: a mismatch is logged at `WARN` and parsing continues,
//! and on write the literal is always emitted, never the observed value.

use std::fmt::Debug;

use crate::adt::WireEnum;
use crate::conv::error::{SerializeError, SerializeResult, SerializeResultExt};
use crate::conv::target::Target;
use crate::conv::{Decode, DecodeWith, Encode};
use crate::parse::error::{ParseError, ParseResult, ParseResultExt};
use crate::parse::Parser;

/// Reads a field that must hold exactly `expected`
///
/// # Errors
///
/// Fails with [`ParseError::ConstMismatch`] if the wire value differs.
pub fn read_const<P: Parser>(
    p: &mut P,
    field: &'static str,
    width: usize,
    expected: u64,
) -> ParseResult<u64> {
    let actual = p.read_bits(field, width)?;
    if actual != expected {
        return Err(ParseError::ConstMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(actual)
}

pub fn write_const<T: Target>(
    buf: &mut T,
    field: &'static str,
    width: usize,
    literal: u64,
) -> SerializeResult<()> {
    buf.write_bits(field, width, literal)
}

/// Reads a field that is expected to hold `expected`, tolerating anything else
///
/// Returns `Some(observed)` when the wire value differs from `expected`, and
/// `None` otherwise. The mismatch is also reported as a `WARN` event.
pub fn read_reserved<P: Parser>(
    p: &mut P,
    field: &'static str,
    width: usize,
    expected: u64,
) -> ParseResult<Option<u64>> {
    let observed = p.read_bits(field, width)?;
    if observed != expected {
        tracing::warn!(
            field,
            expected,
            observed,
            bit = p.pos() - width,
            "reserved field mismatch, continuing"
        );
        return Ok(Some(observed));
    }
    Ok(None)
}

pub fn write_reserved<T: Target>(
    buf: &mut T,
    field: &'static str,
    width: usize,
    literal: u64,
) -> SerializeResult<()> {
    buf.write_bits(field, width, literal)
}

/// Reads an enumerated field, mapping unknown raw values to `Unknown(raw)`
#[inline]
pub fn read_enum<P: Parser, E: WireEnum>(p: &mut P, field: &'static str) -> ParseResult<E> {
    E::read_from(p, field)
}

#[inline]
pub fn write_enum<T: Target, E: WireEnum>(
    buf: &mut T,
    field: &'static str,
    value: &E,
) -> SerializeResult<()> {
    value.write_as(buf, field)
}

/// Binds a virtual field: nothing is read, `value` is computed by the caller
/// from fields already decoded and handed back unchanged.
#[inline]
pub fn read_virtual<V: Debug>(field: &'static str, value: V) -> V {
    tracing::trace!(field, value = ?value, "virtual field");
    value
}

/// Reports the recomputed value of a virtual field to the target's trace hook
#[inline]
pub fn write_virtual<T: Target, V: Debug>(
    buf: &mut T,
    field: &'static str,
    value: &V,
) -> SerializeResult<()> {
    buf.virtual_field(field, value)
}

/// Reads a field whose value is derived from other fields on write, and is
/// therefore not stored in the message
#[inline]
pub fn read_implicit<P: Parser>(p: &mut P, field: &'static str, width: usize) -> ParseResult<u64> {
    let value = p.read_bits(field, width)?;
    tracing::trace!(field, value, "implicit field");
    Ok(value)
}

#[inline]
pub fn write_implicit<T: Target>(
    buf: &mut T,
    field: &'static str,
    width: usize,
    value: u64,
) -> SerializeResult<()> {
    buf.write_bits(field, width, value)
}

/// Reads a field that is only present when `present` holds
pub fn read_optional<P, V, F>(p: &mut P, field: &'static str, present: bool, read: F) -> ParseResult<Option<V>>
where
    P: Parser,
    F: FnOnce(&mut P) -> ParseResult<V>,
{
    if present {
        Ok(Some(read(p).within(field)?))
    } else {
        Ok(None)
    }
}

pub fn write_optional<T, V, F>(buf: &mut T, field: &'static str, value: &Option<V>, write: F) -> SerializeResult<()>
where
    T: Target,
    F: FnOnce(&mut T, &V) -> SerializeResult<()>,
{
    match value {
        Some(v) => write(buf, v).within(field),
        None => Ok(()),
    }
}

/// Runs `read` inside a diagnostic context named `name`, attaching `name`
/// as a breadcrumb to any error it returns
pub fn read_in_context<P, V, F>(p: &mut P, name: &'static str, read: F) -> ParseResult<V>
where
    P: Parser,
    F: FnOnce(&mut P) -> ParseResult<V>,
{
    p.push_context(name)?;
    let value = read(p).within(name)?;
    p.pop_context(name).within(name)?;
    Ok(value)
}

/// Runs `write` inside a diagnostic context named `name`
pub fn write_in_context<T, F>(buf: &mut T, name: &'static str, write: F) -> SerializeResult<()>
where
    T: Target,
    F: FnOnce(&mut T) -> SerializeResult<()>,
{
    buf.push_context(name)?;
    write(buf).within(name)?;
    buf.pop_context(name).within(name)
}

/// Reads a nested message as field `field`
#[inline]
pub fn read_complex<P: Parser, V: Decode>(p: &mut P, field: &'static str) -> ParseResult<V> {
    read_in_context(p, field, V::parse)
}

/// Reads a nested message whose layout depends on `args`
#[inline]
pub fn read_complex_with<P, A, V>(p: &mut P, field: &'static str, args: A) -> ParseResult<V>
where
    P: Parser,
    V: DecodeWith<A>,
{
    read_in_context(p, field, |p| V::parse_with(p, args))
}

#[inline]
pub fn write_complex<T: Target, V: Encode>(
    buf: &mut T,
    field: &'static str,
    value: &V,
) -> SerializeResult<()> {
    write_in_context(buf, field, |buf| value.write_to(buf))
}

/// Reads exactly `count` elements
pub fn read_count_array<P, V, F>(p: &mut P, field: &'static str, count: usize, mut read: F) -> ParseResult<Vec<V>>
where
    P: Parser,
    F: FnMut(&mut P) -> ParseResult<V>,
{
    read_in_context(p, field, |p| {
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(read(p)?);
        }
        Ok(items)
    })
}

/// Reads elements until exactly `bits` bits have been consumed
///
/// # Errors
///
/// Fails with [`ParseError::LengthOverrun`] if the last element read ends
/// beyond the declared length, and with [`ParseError::Validation`] if an
/// element consumes no bits before the declared length is reached.
pub fn read_length_array<P, V, F>(p: &mut P, field: &'static str, bits: usize, mut read: F) -> ParseResult<Vec<V>>
where
    P: Parser,
    F: FnMut(&mut P) -> ParseResult<V>,
{
    read_in_context(p, field, |p| {
        let start = p.pos();
        let mut items = Vec::new();
        while p.pos() - start < bits {
            let before = p.pos();
            items.push(read(p)?);
            if p.pos() == before {
                return Err(ParseError::validation(format!(
                    "element of '{field}' consumed no bits with {} of {bits} bits left",
                    bits - (before - start)
                )));
            }
        }
        let consumed = p.pos() - start;
        if consumed > bits {
            return Err(ParseError::LengthOverrun {
                field,
                declared: bits,
                excess: consumed - bits,
            });
        }
        Ok(items)
    })
}

pub fn write_array<T, V, F>(buf: &mut T, field: &'static str, items: &[V], mut write: F) -> SerializeResult<()>
where
    T: Target,
    F: FnMut(&mut T, &V) -> SerializeResult<()>,
{
    write_in_context(buf, field, |buf| {
        for item in items {
            write(buf, item)?;
        }
        Ok(())
    })
}

/// Writes a byte-array whose length is computed by the layout
///
/// # Errors
///
/// Fails with [`SerializeError::LengthMismatch`] if `bytes` does not hold
/// exactly `expected` bytes.
pub fn write_sized_bytes<T: Target>(
    buf: &mut T,
    field: &'static str,
    expected: usize,
    bytes: &[u8],
) -> SerializeResult<()> {
    if bytes.len() != expected {
        return Err(SerializeError::LengthMismatch {
            field,
            expected: expected * 8,
            actual: bytes.len() * 8,
        });
    }
    buf.write_bytes(field, bytes)
}

/// Fails with [`ParseError::Validation`] unless `condition` holds
#[inline]
pub fn validate(condition: bool, message: &str) -> ParseResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ParseError::validation(message))
    }
}

/// Fails with [`ParseError::Assertion`] unless `condition` holds
#[inline]
pub fn assert_that(condition: bool, message: &str) -> ParseResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ParseError::assertion(message))
    }
}
