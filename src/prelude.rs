//! Imports needed by most modules that define message types
//!
//! ```
//! use plcwire::prelude::*;
//! ```

pub use crate::adt::WireEnum;
pub use crate::builder::{BuildResult, Builder, Checklist, Compose, Narrowed, ToBuilder};
pub use crate::conv::target::Target;
pub use crate::conv::{
    Decode, DecodeWith, Encode, EncodeLength, FixedBits, LengthAware, SerializeError, SerializeResult,
    SerializeResultExt,
};
pub use crate::family::{family_bits, parse_family, write_family, Family, Hex};
pub use crate::parse::{ParseError, ParseResult, ParseResultExt, Parser};
pub use crate::{message_builder, unmapped, wire_enum};
