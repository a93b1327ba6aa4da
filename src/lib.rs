//! Bit-level codec runtime and message model for industrial PLC protocols
//!
//! # Overview
//!
//! PLC protocols describe their messages as tightly bit-packed layouts: a
//! 3-bit addressing mode next to a 2-bit retransmission counter, a 10-bit
//! category split across a byte boundary, and closed families of message
//! variants selected by discriminator values decoded a few fields earlier.
//! Writing a parser and a serializer by hand for every such message is the
//! bulk of the work of supporting a protocol, and the part most likely to
//! drift out of sync between the two directions.
//!
//! `plcwire` factors that work into a small runtime on which each message
//! type is a thin, mechanical definition:
//!
//! * [`Parser`] and [`Target`] are MSB-first bit cursors over a byte buffer,
//!   with a stack of named diagnostic contexts. [`BitParser`] reads,
//!   [`BitWriter`] writes and [`BitCounter`] measures.
//! * The [`field`] module holds one read/write pair per field kind: simple,
//!   const (hard literal), reserved (soft literal), enum, virtual, implicit,
//!   optional, array and complex.
//! * [`wire_enum!`] generates closed value tables whose unknown values
//!   survive a decode/encode cycle unchanged.
//! * [`family`] implements discriminated dispatch: shared prefix, `match`
//!   over the discriminators, variant fields, and an
//!   [`UnmappedVariant`](parse::error::UnmappedVariant) error for anything
//!   else.
//! * [`Builder`]s construct messages with every missing mandatory field
//!   reported at once, narrow family builders to one variant, and seed new
//!   builders from existing messages.
//! * [`LengthAware`] reports the serialized size of a message without
//!   writing it.
//! * [`hexframe`] adapts binary messages to ASCII hex framing with an
//!   optional checksum.
//!
//! The [`protocols`] module defines message models for C-Bus and S7 on top
//! of this runtime.
//!
//! # Errors
//!
//! Decoding fails with a [`ParseError`] whose breadcrumbs name every message
//! and complex field the failure passed through, outermost first.
//! Encoding fails with a [`SerializeError`], and building with a
//! [`BuildError`] listing every problem found.
//!
//! # Features
//!
//! * `check_complete_parse`: top-level decodes fail if bits are left over.
//! * `serde_impls`: `serde` derives on message and option types.
//! * `smallvec_framestack`: context stacks are kept inline up to a small depth.

pub mod adt;
pub mod builder;
pub mod conv;
pub mod error;
pub mod family;
pub mod field;
pub mod hexframe;
mod internal;
pub mod parse;
pub mod prelude;
pub mod protocols;

pub use crate::builder::{BuildResult, Builder, ToBuilder};
pub use crate::conv::{
    len::{FixedBits, LengthAware},
    target::{BitCounter, BitWriter, Target},
    Decode, DecodeWith, Encode, EncodeLength, SerializeError, SerializeResult,
};
pub use crate::error::{BuildError, BuildProblem, MultiError};
pub use crate::family::Family;
pub use crate::parse::{BitParser, ByteOrder, ParseError, ParseResult, Parser};

pub use ::lazy_static::lazy_static;
