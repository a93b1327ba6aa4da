//! Common application layer (CAL) commands addressed to a single unit

use crate::conv::error::{SerializeError, SerializeResult};
use crate::conv::target::Target;
use crate::conv::{Decode, Encode, LengthAware};
use crate::family::{family_bits, parse_family, write_family, Family};
use crate::field::{read_enum, read_virtual, write_enum, write_sized_bytes, write_virtual};
use crate::parse::{ParseResult, Parser};
use crate::unmapped;

use super::enums::{CalCommandType, CalCommandTypeContainer};

/// Payload of a point-to-point command
///
/// The command byte selects both the variant and, for `Write`, the length
/// of the parameter value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum CalData {
    Reset(CalCommandTypeContainer),
    Recall {
        command_type_container: CalCommandTypeContainer,
        param_no: u8,
        count: u8,
    },
    Identify {
        command_type_container: CalCommandTypeContainer,
        attribute: u8,
    },
    GetStatus {
        command_type_container: CalCommandTypeContainer,
        param_no: u8,
        count: u8,
    },
    Acknowledge {
        command_type_container: CalCommandTypeContainer,
        param_no: u8,
        code: u8,
    },
    Write {
        command_type_container: CalCommandTypeContainer,
        param_no: u8,
        code: u8,
        /// `num_bytes - 2` bytes
        parameter_value: Vec<u8>,
    },
}

impl CalData {
    /// Write command whose container is chosen to fit `parameter_value`
    #[must_use]
    pub fn write(param_no: u8, code: u8, parameter_value: Vec<u8>) -> Option<Self> {
        let len = u8::try_from(parameter_value.len() + 2).ok()?;
        Some(Self::Write {
            command_type_container: CalCommandTypeContainer::write_of_len(len)?,
            param_no,
            code,
            parameter_value,
        })
    }

    #[must_use]
    pub fn command_type(&self) -> Option<CalCommandType> {
        self.shared().command_type()
    }
}

impl Family for CalData {
    const TYPE_NAME: &'static str = "CalData";
    type Args = ();
    type Shared = CalCommandTypeContainer;

    fn parse_shared<P: Parser>(p: &mut P, _: ()) -> ParseResult<CalCommandTypeContainer> {
        read_enum(p, "commandTypeContainer")
    }

    fn parse_variant<P: Parser>(p: &mut P, container: CalCommandTypeContainer, _: ()) -> ParseResult<Self> {
        let command_type = read_virtual("commandType", container.command_type());
        Ok(match command_type {
            Some(CalCommandType::Reset) => Self::Reset(container),
            Some(CalCommandType::Recall) => Self::Recall {
                command_type_container: container,
                param_no: p.read_byte("paramNo")?,
                count: p.read_byte("count")?,
            },
            Some(CalCommandType::Identify) => Self::Identify {
                command_type_container: container,
                attribute: p.read_byte("attribute")?,
            },
            Some(CalCommandType::GetStatus) => Self::GetStatus {
                command_type_container: container,
                param_no: p.read_byte("paramNo")?,
                count: p.read_byte("count")?,
            },
            Some(CalCommandType::Acknowledge) => Self::Acknowledge {
                command_type_container: container,
                param_no: p.read_byte("paramNo")?,
                code: p.read_byte("code")?,
            },
            Some(CalCommandType::Write) => Self::Write {
                command_type_container: container,
                param_no: p.read_byte("paramNo")?,
                code: p.read_byte("code")?,
                parameter_value: p.read_bytes("parameterValue", usize::from(container.num_bytes()) - 2)?,
            },
            None => return Err(unmapped!(Self::TYPE_NAME; "commandTypeContainer" => container)),
        })
    }

    fn shared(&self) -> &CalCommandTypeContainer {
        match self {
            Self::Reset(container)
            | Self::Recall {
                command_type_container: container,
                ..
            }
            | Self::Identify {
                command_type_container: container,
                ..
            }
            | Self::GetStatus {
                command_type_container: container,
                ..
            }
            | Self::Acknowledge {
                command_type_container: container,
                ..
            }
            | Self::Write {
                command_type_container: container,
                ..
            } => container,
        }
    }

    fn selects_variant(&self) -> bool {
        let expected = match self {
            Self::Reset(_) => CalCommandType::Reset,
            Self::Recall { .. } => CalCommandType::Recall,
            Self::Identify { .. } => CalCommandType::Identify,
            Self::GetStatus { .. } => CalCommandType::GetStatus,
            Self::Acknowledge { .. } => CalCommandType::Acknowledge,
            Self::Write { .. } => CalCommandType::Write,
        };
        self.command_type() == Some(expected)
    }

    fn write_shared<T: Target>(container: &CalCommandTypeContainer, buf: &mut T) -> SerializeResult<()> {
        write_enum(buf, "commandTypeContainer", container)?;
        write_virtual(buf, "commandType", &container.command_type())
    }

    fn write_variant<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        match self {
            Self::Reset(_) => Ok(()),
            Self::Recall { param_no, count, .. } | Self::GetStatus { param_no, count, .. } => {
                buf.write_byte("paramNo", *param_no)?;
                buf.write_byte("count", *count)
            }
            Self::Identify { attribute, .. } => buf.write_byte("attribute", *attribute),
            Self::Acknowledge { param_no, code, .. } => {
                buf.write_byte("paramNo", *param_no)?;
                buf.write_byte("code", *code)
            }
            Self::Write {
                command_type_container,
                param_no,
                code,
                parameter_value,
            } => {
                buf.write_byte("paramNo", *param_no)?;
                buf.write_byte("code", *code)?;
                let expected = usize::from(command_type_container.num_bytes())
                    .checked_sub(2)
                    .ok_or_else(|| {
                        SerializeError::Validation(format!(
                            "{command_type_container} cannot carry a parameter value"
                        ))
                    })?;
                write_sized_bytes(buf, "parameterValue", expected, parameter_value)
            }
        }
    }

    fn shared_bits(container: &CalCommandTypeContainer) -> usize {
        container.length_in_bits()
    }

    fn variant_bits(&self) -> usize {
        match self {
            Self::Reset(_) => 0,
            Self::Identify { .. } => 8,
            Self::Recall { .. } | Self::GetStatus { .. } | Self::Acknowledge { .. } => 16,
            Self::Write { parameter_value, .. } => 16 + 8 * parameter_value.len(),
        }
    }
}

impl Decode for CalData {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        parse_family(p, ())
    }
}

impl Encode for CalData {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_family(self, buf)
    }
}

impl LengthAware for CalData {
    fn length_in_bits(&self) -> usize {
        family_bits(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::error::UnmappedVariant;
    use crate::conv::target::BitWriter;
    use crate::parse::ParseError;

    #[test]
    fn write_value_length_follows_container() {
        let bytes = [0xA4u8, 0x30, 0x01, 0xBE, 0xEF];
        let cal = CalData::decode(bytes);
        assert_eq!(
            cal,
            CalData::Write {
                command_type_container: CalCommandTypeContainer::Write4,
                param_no: 0x30,
                code: 0x01,
                parameter_value: vec![0xBE, 0xEF],
            }
        );
        assert_eq!(cal.length_in_bits(), 40);
        assert_eq!(cal.serialize().unwrap(), bytes.to_vec());
        assert_eq!(CalData::write(0x30, 0x01, vec![0xBE, 0xEF]), Some(cal));
    }

    #[test]
    fn every_variant_round_trips() {
        for bytes in [
            vec![0x08],
            vec![0x1A, 0x30, 0x02],
            vec![0x21, 0x01],
            vec![0x2A, 0x30, 0x01],
            vec![0x32, 0x30, 0x80],
            vec![0xA2, 0x30, 0x00],
        ] {
            let cal = CalData::decode(&bytes);
            assert_eq!(cal.serialize().unwrap(), bytes);
            assert_eq!(cal.length_in_bits(), 8 * bytes.len());
            assert_eq!(cal.counted_bits().unwrap(), cal.length_in_bits());
        }
    }

    #[test]
    fn unknown_command_is_unmapped() {
        let err = CalData::try_decode([0x99u8]).unwrap_err();
        assert_eq!(
            err.root(),
            &ParseError::Unmapped(UnmappedVariant {
                type_name: "CalData",
                discriminators: vec![("commandTypeContainer", String::from("UNKNOWN(0x99)"))],
            })
        );
    }

    #[test]
    fn inconsistent_write_is_rejected_on_serialize() {
        let cal = CalData::Write {
            command_type_container: CalCommandTypeContainer::Write5,
            param_no: 0,
            code: 0,
            parameter_value: vec![1],
        };
        let err = cal.serialize().unwrap_err();
        assert!(matches!(
            err.root(),
            SerializeError::LengthMismatch {
                field: "parameterValue",
                expected: 24,
                actual: 8
            }
        ));
    }

    #[test]
    fn write_under_foreign_container_is_rejected() {
        for container in [
            CalCommandTypeContainer::Reset,
            CalCommandTypeContainer::Identify,
            CalCommandTypeContainer::Unknown(0x99),
        ] {
            let cal = CalData::Write {
                command_type_container: container,
                param_no: 1,
                code: 2,
                parameter_value: vec![],
            };
            let err = cal.serialize().unwrap_err();
            assert_eq!(err.root(), &SerializeError::Misclassified { type_name: "CalData" });

            let mut w = BitWriter::new();
            assert!(matches!(cal.write_variant(&mut w), Err(SerializeError::Validation(_))));
        }
    }

    #[test]
    fn variant_must_match_its_command_byte() {
        let cal = CalData::Recall {
            command_type_container: CalCommandTypeContainer::GetStatus,
            param_no: 0x30,
            count: 1,
        };
        let err = cal.serialize().unwrap_err();
        assert_eq!(err.root(), &SerializeError::Misclassified { type_name: "CalData" });
        assert!(!CalData::Reset(CalCommandTypeContainer::Write2).selects_variant());
        assert!(CalData::Reset(CalCommandTypeContainer::Reset).selects_variant());
    }
}
