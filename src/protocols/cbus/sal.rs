//! Status application layer (SAL) payloads, one family per application

use crate::conv::error::SerializeResult;
use crate::conv::target::Target;
use crate::conv::{DecodeWith, Encode, LengthAware};
use crate::field::{read_complex, read_in_context, write_complex};
use crate::parse::{ParseResult, Parser};
use crate::unmapped;

use super::enums::ApplicationId;
use super::{ErrorReportingData, LightingData, MeteringData, TelephonyData};

/// Payload of a multi-point command
///
/// The variant is not encoded in the payload itself: it is selected by the
/// application address that precedes it, passed in as an [`ApplicationId`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum SalData {
    Lighting(LightingData),
    Metering(MeteringData),
    ErrorReporting(ErrorReportingData),
    Telephony(TelephonyData),
}

impl SalData {
    pub const TYPE_NAME: &'static str = "SalData";

    /// Application this payload belongs to
    #[must_use]
    pub fn application_id(&self) -> ApplicationId {
        match self {
            Self::Lighting(_) => ApplicationId::Lighting,
            Self::Metering(_) => ApplicationId::Metering,
            Self::ErrorReporting(_) => ApplicationId::ErrorReporting,
            Self::Telephony(_) => ApplicationId::TelephonyStatusAndControl,
        }
    }
}

impl DecodeWith<ApplicationId> for SalData {
    fn parse_with<P: Parser>(p: &mut P, application_id: ApplicationId) -> ParseResult<Self> {
        read_in_context(p, Self::TYPE_NAME, |p| match application_id {
            ApplicationId::Lighting => Ok(Self::Lighting(read_complex(p, "lightingData")?)),
            ApplicationId::Metering => Ok(Self::Metering(read_complex(p, "meteringData")?)),
            ApplicationId::ErrorReporting => Ok(Self::ErrorReporting(read_complex(p, "errorReportingData")?)),
            ApplicationId::TelephonyStatusAndControl => Ok(Self::Telephony(read_complex(p, "telephonyData")?)),
            other => Err(unmapped!(Self::TYPE_NAME; "applicationId" => other)),
        })
    }
}

impl Encode for SalData {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        match self {
            Self::Lighting(data) => write_complex(buf, "lightingData", data),
            Self::Metering(data) => write_complex(buf, "meteringData", data),
            Self::ErrorReporting(data) => write_complex(buf, "errorReportingData", data),
            Self::Telephony(data) => write_complex(buf, "telephonyData", data),
        }
    }
}

impl LengthAware for SalData {
    fn length_in_bits(&self) -> usize {
        match self {
            Self::Lighting(data) => data.length_in_bits(),
            Self::Metering(data) => data.length_in_bits(),
            Self::ErrorReporting(data) => data.length_in_bits(),
            Self::Telephony(data) => data.length_in_bits(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::error::UnmappedVariant;
    use crate::parse::ParseError;

    #[test]
    fn application_selects_family() {
        let sal = SalData::try_decode_with([0x79u8, 0x03], ApplicationId::Lighting).unwrap();
        assert!(matches!(sal, SalData::Lighting(LightingData::On { group: 0x03, .. })));
        assert_eq!(sal.application_id(), ApplicationId::Lighting);

        // The same bytes mean something else to another application
        let sal = SalData::try_decode_with([0x09u8, 0x01], ApplicationId::TelephonyStatusAndControl).unwrap();
        assert_eq!(sal, SalData::Telephony(TelephonyData::line_on_hook()));
        assert_eq!(sal.serialize().unwrap(), vec![0x09, 0x01]);
        assert_eq!(sal.length_in_bits(), 16);
    }

    #[test]
    fn unsupported_application_is_unmapped() {
        let err = SalData::try_decode_with([0x00u8], ApplicationId::ClockAndTimekeeping).unwrap_err();
        assert_eq!(err.breadcrumb(), vec!["SalData"]);
        assert_eq!(
            err.root(),
            &ParseError::Unmapped(UnmappedVariant {
                type_name: "SalData",
                discriminators: vec![("applicationId", String::from("ClockAndTimekeeping"))],
            })
        );
    }

    #[test]
    fn nested_errors_carry_every_context() {
        let err = SalData::try_decode_with([0xA4u8, 0x30], ApplicationId::Metering).unwrap_err();
        assert_eq!(err.breadcrumb(), vec!["SalData", "meteringData", "MeteringData"]);
    }
}
