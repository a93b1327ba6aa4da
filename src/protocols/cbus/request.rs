//! ASCII framing of commands sent to a CBus interface

use crate::conv::error::{SerializeResult, SerializeResultExt};
use crate::conv::target::Target;
use crate::conv::{Decode, DecodeWith, Encode, LengthAware};
use crate::field::{assert_that, read_const, read_in_context, read_optional, write_const, write_in_context, write_optional};
use crate::hexframe::{self, HexFrameOptions};
use crate::message_builder;
use crate::parse::error::ParseResultExt;
use crate::parse::{ParseResult, Parser};

use super::CBusCommand;

const INITIATOR: u64 = b'\\' as u64;
const TERMINATOR: u64 = b'\r' as u64;

/// Connection options of a CBus interface
///
/// Only `srchk` changes the wire format handled here: when it is set, every
/// hex-encoded command carries a trailing checksum byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct CBusOptions {
    pub connect: bool,
    pub smart: bool,
    pub idmon: bool,
    pub exstat: bool,
    pub monitor: bool,
    pub monall: bool,
    pub pun: bool,
    pub pcn: bool,
    pub srchk: bool,
}

impl CBusOptions {
    #[must_use]
    pub const fn frame_options(&self) -> HexFrameOptions {
        HexFrameOptions::with_checksum(self.srchk)
    }
}

/// Confirmation tag appended to a request, echoed back by the interface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct Alpha(u8);

impl Alpha {
    /// Returns `None` unless `character` is in `'g'..='z'`
    #[must_use]
    pub fn new(character: u8) -> Option<Self> {
        hexframe::is_tag(character).then_some(Self(character))
    }

    #[must_use]
    pub const fn character(&self) -> u8 {
        self.0
    }
}

impl Decode for Alpha {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        let character = p.read_byte("character")?;
        assert_that(hexframe::is_tag(character), "alpha tag outside 'g'..='z'")?;
        Ok(Self(character))
    }
}

impl Encode for Alpha {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        buf.write_byte("character", self.0)
    }
}

/// A [`CBusCommand`] as sent over the serial interface
///
/// ```text
/// '\' HEX(command [checksum]) [alpha] '\r'
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestCommand {
    pub cbus_command: CBusCommand,
    pub alpha: Option<Alpha>,
    pub cbus_options: CBusOptions,
}

message_builder! {
    pub struct RequestCommandBuilder => RequestCommand {
        cbus_command: CBusCommand = with_cbus_command,
        cbus_options: CBusOptions = with_cbus_options,
    }
    optional {
        alpha: Alpha = with_alpha,
    }
}

impl RequestCommand {
    pub const TYPE_NAME: &'static str = "RequestCommand";
}

impl DecodeWith<CBusOptions> for RequestCommand {
    fn parse_with<P: Parser>(p: &mut P, cbus_options: CBusOptions) -> ParseResult<Self> {
        read_in_context(p, Self::TYPE_NAME, |p| {
            read_const(p, "initiator", 8, INITIATOR)?;
            let payload = hexframe::read_hex_payload(p, "cbusCommand", cbus_options.frame_options())?;
            tracing::debug!(bytes = payload.len(), srchk = cbus_options.srchk, "decoding framed cbus command");
            let cbus_command = CBusCommand::try_decode(&payload).within("cbusCommand")?;
            let has_alpha = p.has_more(8) && hexframe::is_tag(p.peek_byte("alpha")?);
            let alpha = read_optional(p, "alpha", has_alpha, Alpha::parse)?;
            read_const(p, "termination", 8, TERMINATOR)?;
            Ok(Self {
                cbus_command,
                alpha,
                cbus_options,
            })
        })
    }
}

impl Encode for RequestCommand {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_in_context(buf, Self::TYPE_NAME, |buf| {
            write_const(buf, "initiator", 8, INITIATOR)?;
            let payload = self.cbus_command.serialize().within("cbusCommand")?;
            hexframe::write_hex_payload(buf, "cbusCommand", &payload, self.cbus_options.frame_options())?;
            write_optional(buf, "alpha", &self.alpha, |buf, alpha| alpha.write_to(buf))?;
            write_const(buf, "termination", 8, TERMINATOR)
        })
    }
}

impl LengthAware for RequestCommand {
    fn length_in_bits(&self) -> usize {
        let payload = hexframe::hex_payload_bits(self.cbus_command.length_in_bytes(), self.cbus_options.frame_options());
        let alpha = if self.alpha.is_some() { 8 } else { 0 };
        8 + payload + alpha + 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Builder, ToBuilder};
    use crate::error::{ChecksumError, HexConvError};
    use crate::parse::ParseError;
    use crate::protocols::cbus::{LightingData, MultiPointBody, SalData};

    // point-to-multi-point, lighting 0x38, ON group 0x05
    const COMMAND: [u8; 5] = [0x05, 0x38, 0x00, 0x79, 0x05];

    fn checked() -> CBusOptions {
        CBusOptions {
            srchk: true,
            ..CBusOptions::default()
        }
    }

    #[test]
    fn plain_request() {
        let request = RequestCommand::try_decode_with(b"\\0538007905\r", CBusOptions::default()).unwrap();
        assert_eq!(request.alpha, None);
        assert_eq!(request.cbus_command, CBusCommand::decode(COMMAND));
        let CBusCommand::PointToMultiPoint { command, .. } = &request.cbus_command else {
            panic!("unexpected command {:?}", request.cbus_command);
        };
        assert!(matches!(
            command.body,
            MultiPointBody::Normal {
                sal_data: SalData::Lighting(LightingData::On { group: 0x05, .. }),
                ..
            }
        ));
        assert_eq!(request.length_in_bits(), 12 * 8);
        assert_eq!(request.serialize().unwrap(), b"\\0538007905\r".to_vec());
    }

    #[test]
    fn trailing_tag_is_not_part_of_payload() {
        let request = RequestCommand::try_decode_with(b"\\053800790545g\r", checked()).unwrap();
        assert_eq!(request.alpha, Alpha::new(b'g'));
        assert_eq!(request.cbus_command, CBusCommand::decode(COMMAND));
        assert_eq!(request.length_in_bits(), 15 * 8);
        assert_eq!(request.serialize().unwrap(), b"\\053800790545g\r".to_vec());
    }

    #[test]
    fn checksum_is_enforced_only_with_srchk() {
        let err = RequestCommand::try_decode_with(b"\\053800790546\r", checked()).unwrap_err();
        assert_eq!(err.breadcrumb(), vec!["RequestCommand"]);
        assert_eq!(
            err.root(),
            &ParseError::Checksum(ChecksumError {
                computed: 0x45,
                received: 0x46
            })
        );
        let request = RequestCommand::try_decode_with(b"\\053800790545\r", checked()).unwrap();
        assert_eq!(request.cbus_command, CBusCommand::decode(COMMAND));
    }

    #[test]
    fn malformed_frames() {
        let err = RequestCommand::try_decode_with(b"\\\r", CBusOptions::default()).unwrap_err();
        assert_eq!(err.root(), &ParseError::Hex(HexConvError::Empty));

        let err = RequestCommand::try_decode_with(b"/0538007905\r", CBusOptions::default()).unwrap_err();
        assert!(matches!(err.root(), ParseError::ConstMismatch { field: "initiator", .. }));

        let err = RequestCommand::try_decode_with(b"\\0538007905", CBusOptions::default()).unwrap_err();
        assert!(matches!(err.root(), ParseError::Underrun { field: "termination", .. }));

        let err = RequestCommand::try_decode_with(b"\\05380079\r", CBusOptions::default()).unwrap_err();
        assert_eq!(err.breadcrumb()[..2], ["RequestCommand", "cbusCommand"]);
    }

    #[test]
    fn built_request_matches_wire_form() {
        let request = RequestCommandBuilder::new()
            .with_cbus_command(CBusCommand::decode(COMMAND))
            .with_cbus_options(checked())
            .with_alpha(Alpha::new(b'h'))
            .must_build();
        assert_eq!(request.serialize().unwrap(), b"\\053800790545h\r".to_vec());

        let untagged = request.to_builder().with_alpha(None).must_build();
        assert_eq!(untagged.serialize().unwrap(), b"\\053800790545\r".to_vec());
        assert_eq!(request.alpha, Alpha::new(b'h'));
    }

    #[test]
    fn alpha_range() {
        assert!(Alpha::new(b'f').is_none());
        assert_eq!(Alpha::new(b'z').map(|a| a.character()), Some(b'z'));
    }
}
