//! Error reporting application payloads

use crate::builder::Checklist;
use crate::conv::error::SerializeResult;
use crate::conv::target::Target;
use crate::conv::{Decode, Encode, FixedBits, LengthAware};
use crate::family::{family_bits, parse_family, write_family, Family};
use crate::field::{read_complex, read_enum, read_virtual, validate, write_complex, write_enum, write_virtual};
use crate::parse::{ParseResult, Parser};
use crate::{message_builder, unmapped};

use super::enums::{ErrorReportingCommandTypeContainer, ErrorReportingSeverity, ErrorReportingSystemCategoryClass};

/// Source of a reported error, 10 bits
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorReportingSystemCategory {
    pub system_category_class: ErrorReportingSystemCategoryClass,
    /// 4 bits, meaning depends on the class
    pub system_category_type: u8,
    /// 2 bits
    pub system_category_variant: u8,
}

message_builder! {
    pub struct ErrorReportingSystemCategoryBuilder => ErrorReportingSystemCategory {
        system_category_class: ErrorReportingSystemCategoryClass = with_system_category_class,
        system_category_type: u8 = with_system_category_type,
        system_category_variant: u8 = with_system_category_variant,
    }
}

impl FixedBits for ErrorReportingSystemCategory {
    const BITS: usize = 10;
}

impl Decode for ErrorReportingSystemCategory {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        Ok(Self {
            system_category_class: read_enum(p, "systemCategoryClass")?,
            system_category_type: p.read_u8("systemCategoryType", 4)?,
            system_category_variant: p.read_u8("systemCategoryVariant", 2)?,
        })
    }
}

impl Encode for ErrorReportingSystemCategory {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_enum(buf, "systemCategoryClass", &self.system_category_class)?;
        buf.write_u8("systemCategoryType", 4, self.system_category_type)?;
        buf.write_u8("systemCategoryVariant", 2, self.system_category_variant)
    }
}

/// Body shared by every error reporting command
///
/// At least one of `most_recent` and `most_severe` is always set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorReportingDataGeneric {
    pub system_category: ErrorReportingSystemCategory,
    pub most_recent: bool,
    pub acknowledge: bool,
    pub most_severe: bool,
    pub severity: ErrorReportingSeverity,
    pub device_id: u8,
    pub error_data1: u8,
    pub error_data2: u8,
}

message_builder! {
    pub struct ErrorReportingDataGenericBuilder => ErrorReportingDataGeneric {
        system_category: ErrorReportingSystemCategory = with_system_category / with_system_category_builder,
        most_recent: bool = with_most_recent,
        acknowledge: bool = with_acknowledge,
        most_severe: bool = with_most_severe,
        severity: ErrorReportingSeverity = with_severity,
        device_id: u8 = with_device_id,
        error_data1: u8 = with_error_data1,
        error_data2: u8 = with_error_data2,
    }
    check ErrorReportingDataGeneric::check
}

const INVALID_CONDITION: &str = "Invalid Error condition";

impl ErrorReportingDataGeneric {
    #[must_use]
    pub fn is_most_severe_error(&self) -> bool {
        self.most_severe
    }

    #[must_use]
    pub fn is_most_recent_error(&self) -> bool {
        self.most_recent
    }

    #[must_use]
    pub fn is_most_recent_and_most_severe(&self) -> bool {
        self.is_most_recent_error() && self.is_most_severe_error()
    }

    fn check(&self, checklist: &mut Checklist) {
        checklist.check(self.most_recent || self.most_severe, INVALID_CONDITION);
    }
}

impl FixedBits for ErrorReportingDataGeneric {
    const BITS: usize = ErrorReportingSystemCategory::BITS + 3 + ErrorReportingSeverity::BITS + 24;
}

impl Decode for ErrorReportingDataGeneric {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        let system_category = read_complex(p, "systemCategory")?;
        let most_recent = p.read_bit("mostRecent")?;
        let acknowledge = p.read_bit("acknowledge")?;
        let most_severe = p.read_bit("mostSevere")?;
        validate(most_recent || most_severe, INVALID_CONDITION)?;
        let is_most_severe_error = read_virtual("isMostSevereError", most_severe);
        let is_most_recent_error = read_virtual("isMostRecentError", most_recent);
        read_virtual(
            "isMostRecentAndMostSevere",
            is_most_recent_error && is_most_severe_error,
        );
        Ok(Self {
            system_category,
            most_recent,
            acknowledge,
            most_severe,
            severity: read_enum(p, "severity")?,
            device_id: p.read_byte("deviceId")?,
            error_data1: p.read_byte("errorData1")?,
            error_data2: p.read_byte("errorData2")?,
        })
    }
}

impl Encode for ErrorReportingDataGeneric {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_complex(buf, "systemCategory", &self.system_category)?;
        buf.write_bit("mostRecent", self.most_recent)?;
        buf.write_bit("acknowledge", self.acknowledge)?;
        buf.write_bit("mostSevere", self.most_severe)?;
        write_virtual(buf, "isMostSevereError", &self.is_most_severe_error())?;
        write_virtual(buf, "isMostRecentError", &self.is_most_recent_error())?;
        write_virtual(buf, "isMostRecentAndMostSevere", &self.is_most_recent_and_most_severe())?;
        write_enum(buf, "severity", &self.severity)?;
        buf.write_byte("deviceId", self.device_id)?;
        buf.write_byte("errorData1", self.error_data1)?;
        buf.write_byte("errorData2", self.error_data2)
    }
}

/// Error reporting payload; every known command carries the generic body
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorReportingData {
    Generic {
        command_type_container: ErrorReportingCommandTypeContainer,
        body: ErrorReportingDataGeneric,
    },
}

impl Family for ErrorReportingData {
    const TYPE_NAME: &'static str = "ErrorReportingData";
    type Args = ();
    type Shared = ErrorReportingCommandTypeContainer;

    fn parse_shared<P: Parser>(p: &mut P, _: ()) -> ParseResult<ErrorReportingCommandTypeContainer> {
        read_enum(p, "commandTypeContainer")
    }

    fn parse_variant<P: Parser>(
        p: &mut P,
        container: ErrorReportingCommandTypeContainer,
        _: (),
    ) -> ParseResult<Self> {
        match container {
            ErrorReportingCommandTypeContainer::Unknown(_) => {
                Err(unmapped!(Self::TYPE_NAME; "commandTypeContainer" => container))
            }
            _ => Ok(Self::Generic {
                command_type_container: container,
                body: ErrorReportingDataGeneric::parse(p)?,
            }),
        }
    }

    fn shared(&self) -> &ErrorReportingCommandTypeContainer {
        let Self::Generic {
            command_type_container,
            ..
        } = self;
        command_type_container
    }

    fn selects_variant(&self) -> bool {
        !matches!(self.shared(), ErrorReportingCommandTypeContainer::Unknown(_))
    }

    fn write_shared<T: Target>(container: &ErrorReportingCommandTypeContainer, buf: &mut T) -> SerializeResult<()> {
        write_enum(buf, "commandTypeContainer", container)
    }

    fn write_variant<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        let Self::Generic { body, .. } = self;
        body.write_to(buf)
    }

    fn shared_bits(_: &ErrorReportingCommandTypeContainer) -> usize {
        ErrorReportingCommandTypeContainer::BITS
    }

    fn variant_bits(&self) -> usize {
        ErrorReportingDataGeneric::BITS
    }
}

impl Decode for ErrorReportingData {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        parse_family(p, ())
    }
}

impl Encode for ErrorReportingData {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_family(self, buf)
    }
}

impl LengthAware for ErrorReportingData {
    fn length_in_bits(&self) -> usize {
        family_bits(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::error::BuildProblem;
    use crate::parse::ParseError;
    use crate::SerializeError;

    // class 0x4, type 0x2, variant 0b01, most recent, severity MinorFailure
    const REPORT: [u8; 6] = [0x15, 0b0100_0010, 0b01_1_0_0_010, 0x07, 0x11, 0x22];

    #[test]
    fn generic_report_round_trip() {
        let data = ErrorReportingData::decode(REPORT);
        let ErrorReportingData::Generic { body, .. } = &data;
        assert_eq!(
            body.system_category,
            ErrorReportingSystemCategory {
                system_category_class: ErrorReportingSystemCategoryClass::InputUnits,
                system_category_type: 0x2,
                system_category_variant: 0x1,
            }
        );
        assert!(body.is_most_recent_error());
        assert!(!body.is_most_recent_and_most_severe());
        assert_eq!(body.severity, ErrorReportingSeverity::MinorFailure);
        assert_eq!(body.device_id, 0x07);
        assert_eq!(data.length_in_bits(), 48);
        assert_eq!(data.serialize().unwrap(), REPORT.to_vec());
    }

    #[test]
    fn neither_recent_nor_severe_is_invalid() {
        let mut bytes = REPORT;
        bytes[2] = 0b01_0_1_0_010;
        let err = ErrorReportingData::try_decode(bytes).unwrap_err();
        assert_eq!(err.root(), &ParseError::Validation(String::from("Invalid Error condition")));

        let err = ErrorReportingDataGenericBuilder::new()
            .with_system_category_builder(|b| {
                b.with_system_category_class(ErrorReportingSystemCategoryClass::Climate)
                    .with_system_category_type(0)
                    .with_system_category_variant(0)
            })
            .with_most_recent(false)
            .with_acknowledge(true)
            .with_most_severe(false)
            .with_severity(ErrorReportingSeverity::Ok)
            .with_device_id(1)
            .with_error_data1(0)
            .with_error_data2(0)
            .build()
            .unwrap_err();
        assert_eq!(
            err.problems(),
            &[BuildProblem::Invalid(String::from("Invalid Error condition"))]
        );
    }

    #[test]
    fn unknown_command_is_unmapped() {
        let mut bytes = REPORT;
        bytes[0] = 0x45;
        assert!(matches!(
            ErrorReportingData::try_decode(bytes).unwrap_err().root(),
            ParseError::Unmapped(_)
        ));
    }

    #[test]
    fn virtual_fields_are_stable_across_decodes() {
        let first = ErrorReportingData::decode(REPORT);
        let second = ErrorReportingData::decode(REPORT);
        let (ErrorReportingData::Generic { body: a, .. }, ErrorReportingData::Generic { body: b, .. }) = (&first, &second);
        let virtuals = |body: &ErrorReportingDataGeneric| {
            (
                body.is_most_severe_error(),
                body.is_most_recent_error(),
                body.is_most_recent_and_most_severe(),
            )
        };
        assert_eq!(virtuals(a), (false, true, false));
        assert_eq!(virtuals(a), virtuals(b));
        assert_eq!(first.serialize().unwrap(), second.serialize().unwrap());
        assert_eq!(second.serialize().unwrap(), REPORT.to_vec());
    }

    #[test]
    fn unknown_command_is_not_written() {
        let ErrorReportingData::Generic { body, .. } = ErrorReportingData::decode(REPORT);
        let data = ErrorReportingData::Generic {
            command_type_container: ErrorReportingCommandTypeContainer::Unknown(0x45),
            body,
        };
        assert_eq!(
            data.serialize().unwrap_err().root(),
            &SerializeError::Misclassified { type_name: "ErrorReportingData" }
        );
    }
}
