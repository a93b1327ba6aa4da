//! Closed value tables for enumerated wire fields
//!
//! Enum fields in a message layout are backed by a fixed-width unsigned
//! integer whose every known value is listed in a table. Values outside the
//! table are not an error: they decode to a synthetic `Unknown(raw)` variant
//! that remembers the raw value, so that re-serializing the message
//! reproduces the original bits.
//!
//! The [`wire_enum!`](crate::wire_enum) macro generates such a type together
//! with its [`WireEnum`], [`Encode`](crate::Encode), [`Decode`](crate::Decode)
//! and [`FixedBits`](crate::FixedBits) implementations:
//!
//! ```
//! plcwire::wire_enum! {
//!     /// Routing mode of a request
//!     pub enum Mode: 3 {
//!         PointToPoint = 0x6,
//!         PointToMultiPoint = 0x5,
//!     }
//! }
//!
//! use plcwire::adt::WireEnum;
//! assert_eq!(Mode::from_raw(0x5), Mode::PointToMultiPoint);
//! assert_eq!(Mode::from_raw(0x7), Mode::Unknown(0x7));
//! assert_eq!(Mode::Unknown(0x7).raw(), 0x7);
//! assert_eq!(Mode::by_name("PointToPoint"), Some(Mode::PointToPoint));
//! ```

use std::fmt::Debug;

use crate::conv::error::SerializeResult;
use crate::conv::target::Target;
use crate::parse::{ParseResult, Parser};

/// Name reported by [`WireEnum::name`] for values outside the table
pub const UNKNOWN: &str = "UNKNOWN";

/// Common interface of every type generated by [`wire_enum!`](crate::wire_enum)
pub trait WireEnum: Copy + Debug + Eq + Send + Sync + 'static {
    /// Width of the backing integer, in bits
    const BITS: usize;

    /// Name of the enum, used as the default field name in diagnostics
    const TYPE_NAME: &'static str;

    /// Maps a raw wire value to its table entry, or to `Unknown(raw)`
    fn from_raw(raw: u64) -> Self;

    /// Raw wire value of `self`
    fn raw(&self) -> u64;

    /// Symbolic name of `self`, or [`UNKNOWN`]
    fn name(&self) -> &'static str;

    /// Every known value, in table order
    fn values() -> &'static [Self];

    /// Looks up a known value by its symbolic name
    fn by_name(name: &str) -> Option<Self>;

    fn is_known(&self) -> bool {
        self.name() != UNKNOWN
    }

    /// Reads the backing integer as field `field` and maps it through the table
    fn read_from<P: Parser>(p: &mut P, field: &'static str) -> ParseResult<Self> {
        let raw = p.read_bits(field, Self::BITS)?;
        let value = Self::from_raw(raw);
        if !value.is_known() {
            tracing::debug!(
                field,
                enum_type = Self::TYPE_NAME,
                raw,
                "no table entry for enum value"
            );
        }
        Ok(value)
    }

    /// Writes the raw value of `self` as field `field`
    fn write_as<T: Target>(&self, buf: &mut T, field: &'static str) -> SerializeResult<()> {
        buf.write_bits(field, Self::BITS, self.raw())
    }
}

/// Generates a closed enum backed by an unsigned integer of the given bit-width
///
/// Each listed variant maps to a literal; an extra `Unknown(u64)` variant is
/// appended for values outside the table. Raw values and names are unique
/// within a table.
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $bits:literal {
            $( $(#[$vmeta:meta])* $vname:ident = $vdisc:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde_impls", derive(::serde::Serialize, ::serde::Deserialize))]
        $vis enum $name {
            $( $(#[$vmeta])* $vname, )+
            /// Raw value with no entry in the table
            Unknown(u64),
        }

        impl $crate::adt::WireEnum for $name {
            const BITS: usize = $bits;
            const TYPE_NAME: &'static str = stringify!($name);

            fn from_raw(raw: u64) -> Self {
                match raw {
                    $( $vdisc => Self::$vname, )+
                    other => Self::Unknown(other),
                }
            }

            fn raw(&self) -> u64 {
                match self {
                    $( Self::$vname => $vdisc, )+
                    Self::Unknown(raw) => *raw,
                }
            }

            fn name(&self) -> &'static str {
                match self {
                    $( Self::$vname => stringify!($vname), )+
                    Self::Unknown(_) => $crate::adt::UNKNOWN,
                }
            }

            fn values() -> &'static [Self] {
                const VALUES: &[$name] = &[ $( $name::$vname ),+ ];
                VALUES
            }

            fn by_name(name: &str) -> Option<Self> {
                $crate::lazy_static! {
                    static ref BY_NAME: ::std::collections::HashMap<&'static str, $name> = {
                        let mut table = ::std::collections::HashMap::new();
                        $( table.insert(stringify!($vname), $name::$vname); )+
                        table
                    };
                }
                BY_NAME.get(name).copied()
            }
        }

        impl $crate::conv::len::FixedBits for $name {
            const BITS: usize = $bits;
        }

        impl $crate::conv::Encode for $name {
            fn write_to<T: $crate::conv::target::Target>(
                &self,
                buf: &mut T,
            ) -> $crate::conv::error::SerializeResult<()> {
                $crate::adt::WireEnum::write_as(self, buf, stringify!($name))
            }
        }

        impl $crate::conv::Decode for $name {
            fn parse<P: $crate::parse::Parser>(p: &mut P) -> $crate::parse::ParseResult<Self> {
                <$name as $crate::adt::WireEnum>::read_from(p, stringify!($name))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    Self::Unknown(raw) => write!(f, "{}({:#x})", $crate::adt::UNKNOWN, raw),
                    known => f.write_str($crate::adt::WireEnum::name(known)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Decode, Encode};

    crate::wire_enum! {
        /// Test table with a gap
        pub enum Severity: 3 {
            AllOk = 0x0,
            Ok = 0x1,
            MinorFailure = 0x2,
            ExtremeFailure = 0x4,
        }
    }

    #[test]
    fn table_lookups() {
        assert_eq!(Severity::from_raw(0x2), Severity::MinorFailure);
        assert_eq!(Severity::MinorFailure.raw(), 0x2);
        assert_eq!(Severity::Ok.name(), "Ok");
        assert_eq!(Severity::values().len(), 4);
        assert_eq!(Severity::by_name("ExtremeFailure"), Some(Severity::ExtremeFailure));
        assert_eq!(Severity::by_name("Unknown"), None);
        assert_eq!(Severity::BITS, 3);
    }

    #[test]
    fn unknown_values_round_trip() {
        let v = Severity::from_raw(0x3);
        assert_eq!(v, Severity::Unknown(0x3));
        assert!(!v.is_known());
        assert_eq!(v.to_string(), "UNKNOWN(0x3)");

        // 3 bits of 0b011 followed by padding
        let bytes = v.serialize().unwrap();
        assert_eq!(bytes, vec![0b0110_0000]);
        assert_eq!(Severity::decode(&bytes), Severity::Unknown(0x3));
    }

    #[test]
    fn unknown_value_too_wide_for_table() {
        assert!(Severity::Unknown(0x8).serialize().is_err());
    }

    #[test]
    fn lookup_tables_are_shared_across_threads() {
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| Severity::by_name("AllOk")))
                .collect();
            for h in handles {
                assert_eq!(h.join().ok().flatten(), Some(Severity::AllOk));
            }
        });
    }
}
