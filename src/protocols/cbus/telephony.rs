//! Telephony status and control payloads

use crate::conv::error::SerializeResult;
use crate::conv::target::Target;
use crate::conv::{Decode, Encode, LengthAware};
use crate::family::{family_bits, parse_family, write_family, Family, Hex};
use crate::field::{read_enum, read_reserved, read_virtual, validate, write_enum, write_reserved, write_virtual};
use crate::parse::{ParseResult, Parser};
use crate::unmapped;

use super::enums::{LineOffHookReason, TelephonyCommandTypeContainer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct TelephonyShared {
    pub command_type_container: TelephonyCommandTypeContainer,
    pub argument: u8,
}

impl TelephonyShared {
    /// Bit-length of the number string that completes the command
    fn number_bits(&self) -> usize {
        usize::from(self.command_type_container.num_bytes()).saturating_sub(2) * 8
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum TelephonyData {
    LineOnHook(TelephonyShared),
    LineOffHook {
        shared: TelephonyShared,
        reason: LineOffHookReason,
        number: String,
    },
    Ringing {
        shared: TelephonyShared,
        number: String,
    },
    RecallLastNumber {
        shared: TelephonyShared,
        recall_last_number_type: u8,
        number: String,
    },
}

impl TelephonyData {
    #[must_use]
    pub fn line_on_hook() -> Self {
        Self::LineOnHook(TelephonyShared {
            command_type_container: TelephonyCommandTypeContainer::LineOnHook,
            argument: 0x01,
        })
    }

    /// Off-hook event whose container is chosen to fit `number`
    #[must_use]
    pub fn line_off_hook(reason: LineOffHookReason, number: String) -> Option<Self> {
        Some(Self::LineOffHook {
            shared: Self::event(0x02, &number)?,
            reason,
            number,
        })
    }

    /// Ringing event whose container is chosen to fit `number`
    #[must_use]
    pub fn ringing(number: String) -> Option<Self> {
        Some(Self::Ringing {
            shared: Self::event(0x05, &number)?,
            number,
        })
    }

    fn event(argument: u8, number: &str) -> Option<TelephonyShared> {
        let num_bytes = u8::try_from(number.len() + 2).ok()?;
        Some(TelephonyShared {
            command_type_container: TelephonyCommandTypeContainer::event_of_len(num_bytes)?,
            argument,
        })
    }

    #[must_use]
    pub fn number(&self) -> Option<&str> {
        match self {
            Self::LineOnHook(_) => None,
            Self::LineOffHook { number, .. } | Self::Ringing { number, .. } | Self::RecallLastNumber { number, .. } => {
                Some(number)
            }
        }
    }
}

impl Family for TelephonyData {
    const TYPE_NAME: &'static str = "TelephonyData";
    type Args = ();
    type Shared = TelephonyShared;

    fn parse_shared<P: Parser>(p: &mut P, _: ()) -> ParseResult<TelephonyShared> {
        Ok(TelephonyShared {
            command_type_container: read_enum(p, "commandTypeContainer")?,
            argument: p.read_byte("argument")?,
        })
    }

    fn parse_variant<P: Parser>(p: &mut P, shared: TelephonyShared, _: ()) -> ParseResult<Self> {
        let num_bytes = shared.command_type_container.num_bytes();
        let number_bits = shared.number_bits();
        let known = num_bytes > 0;
        if known {
            match shared.argument {
                0x01 => validate(num_bytes == 1, "line on-hook event carries no payload")?,
                0x02 | 0x05 | 0x06 => validate(num_bytes >= 2, "telephony event too short for its argument")?,
                _ => {}
            }
        }
        Ok(match (known, shared.argument) {
            (true, 0x01) => Self::LineOnHook(shared),
            (true, 0x02) => Self::LineOffHook {
                shared,
                reason: read_enum(p, "reason")?,
                number: p.read_string("number", number_bits)?,
            },
            (true, 0x05) => {
                read_reserved(p, "reserved", 8, 0x01)?;
                Self::Ringing {
                    shared,
                    number: p.read_string("number", number_bits)?,
                }
            }
            (true, 0x06) => {
                let recall_last_number_type = p.read_byte("recallLastNumberType")?;
                read_virtual("isNumberOfLastOutgoingCall", recall_last_number_type == 0x01);
                read_virtual("isNumberOfLastIncomingCall", recall_last_number_type == 0x02);
                Self::RecallLastNumber {
                    shared,
                    recall_last_number_type,
                    number: p.read_string("number", number_bits)?,
                }
            }
            _ => {
                return Err(unmapped!(
                    Self::TYPE_NAME;
                    "commandTypeContainer" => shared.command_type_container,
                    "argument" => Hex(shared.argument.into()),
                ))
            }
        })
    }

    fn shared(&self) -> &TelephonyShared {
        match self {
            Self::LineOnHook(shared)
            | Self::LineOffHook { shared, .. }
            | Self::Ringing { shared, .. }
            | Self::RecallLastNumber { shared, .. } => shared,
        }
    }

    fn selects_variant(&self) -> bool {
        let shared = self.shared();
        let num_bytes = shared.command_type_container.num_bytes();
        match self {
            Self::LineOnHook(_) => num_bytes == 1 && shared.argument == 0x01,
            Self::LineOffHook { .. } => num_bytes >= 2 && shared.argument == 0x02,
            Self::Ringing { .. } => num_bytes >= 2 && shared.argument == 0x05,
            Self::RecallLastNumber { .. } => num_bytes >= 2 && shared.argument == 0x06,
        }
    }

    fn write_shared<T: Target>(shared: &TelephonyShared, buf: &mut T) -> SerializeResult<()> {
        write_enum(buf, "commandTypeContainer", &shared.command_type_container)?;
        buf.write_byte("argument", shared.argument)
    }

    fn write_variant<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        match self {
            Self::LineOnHook(_) => Ok(()),
            Self::LineOffHook { shared, reason, number } => {
                write_enum(buf, "reason", reason)?;
                buf.write_string("number", shared.number_bits(), number)
            }
            Self::Ringing { shared, number } => {
                write_reserved(buf, "reserved", 8, 0x01)?;
                buf.write_string("number", shared.number_bits(), number)
            }
            Self::RecallLastNumber {
                shared,
                recall_last_number_type,
                number,
            } => {
                buf.write_byte("recallLastNumberType", *recall_last_number_type)?;
                write_virtual(buf, "isNumberOfLastOutgoingCall", &(*recall_last_number_type == 0x01))?;
                write_virtual(buf, "isNumberOfLastIncomingCall", &(*recall_last_number_type == 0x02))?;
                buf.write_string("number", shared.number_bits(), number)
            }
        }
    }

    fn shared_bits(_: &TelephonyShared) -> usize {
        16
    }

    fn variant_bits(&self) -> usize {
        match self {
            Self::LineOnHook(_) => 0,
            Self::LineOffHook { number, .. } | Self::Ringing { number, .. } | Self::RecallLastNumber { number, .. } => {
                8 + 8 * number.len()
            }
        }
    }
}

impl Decode for TelephonyData {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        parse_family(p, ())
    }
}

impl Encode for TelephonyData {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_family(self, buf)
    }
}

impl LengthAware for TelephonyData {
    fn length_in_bits(&self) -> usize {
        family_bits(self)
    }
}
