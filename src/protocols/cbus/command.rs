//! CBus commands, dispatched on the addressing mode in their header

use crate::builder::{BuildResult, Builder, Checklist, Compose, Narrowed, ToBuilder};
use crate::conv::error::{SerializeError, SerializeResult};
use crate::conv::target::Target;
use crate::conv::{Decode, Encode, FixedBits, LengthAware};
use crate::family::{family_bits, parse_family, write_family, Family};
use crate::field::{
    read_complex, read_complex_with, read_const, read_enum, read_reserved, read_virtual, validate, write_complex,
    write_const, write_enum, write_reserved, write_virtual,
};
use crate::parse::{ParseResult, Parser};
use crate::{message_builder, unmapped};

use super::enums::{ApplicationIdContainer, DestinationAddressType};
use super::{CBusHeader, CalData, NetworkRoute, SalData};

/// Status query addressed to every unit of an application
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusRequest {
    BinaryState {
        application: ApplicationIdContainer,
    },
    BinaryStateDeprecated {
        application: ApplicationIdContainer,
    },
    Level {
        application: ApplicationIdContainer,
        /// Multiple of 0x20
        starting_group_address_label: u8,
    },
}

impl StatusRequest {
    pub const TYPE_NAME: &'static str = "StatusRequest";

    fn status_type(&self) -> u8 {
        match self {
            Self::BinaryState { .. } => 0x7A,
            Self::BinaryStateDeprecated { .. } => 0xFA,
            Self::Level { .. } => 0x73,
        }
    }
}

impl Decode for StatusRequest {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        let status_type = p.peek_byte("statusType")?;
        match status_type {
            0x7A | 0xFA => {
                read_reserved(p, "reserved", 8, u64::from(status_type))?;
                let application = read_enum(p, "application")?;
                read_reserved(p, "reserved", 8, 0x00)?;
                Ok(if status_type == 0x7A {
                    Self::BinaryState { application }
                } else {
                    Self::BinaryStateDeprecated { application }
                })
            }
            0x73 => {
                read_reserved(p, "reserved", 8, 0x73)?;
                read_reserved(p, "reserved", 8, 0x07)?;
                let application = read_enum(p, "application")?;
                let starting_group_address_label = p.read_byte("startingGroupAddressLabel")?;
                validate(starting_group_address_label & 0x1F == 0, "invalid label")?;
                Ok(Self::Level {
                    application,
                    starting_group_address_label,
                })
            }
            other => Err(unmapped!(Self::TYPE_NAME; "statusType" => crate::family::Hex(other.into()))),
        }
    }
}

impl Encode for StatusRequest {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_reserved(buf, "reserved", 8, u64::from(self.status_type()))?;
        match self {
            Self::BinaryState { application } | Self::BinaryStateDeprecated { application } => {
                write_enum(buf, "application", application)?;
                write_reserved(buf, "reserved", 8, 0x00)
            }
            Self::Level {
                application,
                starting_group_address_label,
            } => {
                write_reserved(buf, "reserved", 8, 0x07)?;
                write_enum(buf, "application", application)?;
                buf.write_byte("startingGroupAddressLabel", *starting_group_address_label)
            }
        }
    }
}

impl LengthAware for StatusRequest {
    fn length_in_bits(&self) -> usize {
        match self {
            Self::BinaryState { .. } | Self::BinaryStateDeprecated { .. } => 24,
            Self::Level { .. } => 32,
        }
    }
}

/// Body of a command addressed to all units of an application
///
/// The first byte is peeked: `0xFF` introduces a status request, anything
/// else is the application address of a SAL payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum MultiPointBody {
    Status(StatusRequest),
    Normal {
        application: ApplicationIdContainer,
        sal_data: SalData,
    },
}

impl MultiPointBody {
    const STATUS_MARKER: u64 = 0xFF;

    /// `padded` bodies carry a reserved zero byte after their first byte
    fn parse<P: Parser>(p: &mut P, padded: bool) -> ParseResult<Self> {
        let peeked = p.peek_byte("peekedApplication")?;
        let is_status = read_virtual("isStatus", u64::from(peeked) == Self::STATUS_MARKER);
        if is_status {
            read_reserved(p, "reserved", 8, Self::STATUS_MARKER)?;
            if padded {
                read_reserved(p, "reserved", 8, 0x00)?;
            }
            Ok(Self::Status(read_complex(p, "statusRequest")?))
        } else {
            let application: ApplicationIdContainer = read_enum(p, "application")?;
            if padded {
                read_reserved(p, "reserved", 8, 0x00)?;
            }
            let sal_data = read_complex_with(p, "salData", application.application_id())?;
            Ok(Self::Normal { application, sal_data })
        }
    }

    fn write<T: Target>(&self, buf: &mut T, padded: bool) -> SerializeResult<()> {
        write_virtual(buf, "isStatus", &matches!(self, Self::Status(_)))?;
        match self {
            Self::Status(status_request) => {
                write_reserved(buf, "reserved", 8, Self::STATUS_MARKER)?;
                if padded {
                    write_reserved(buf, "reserved", 8, 0x00)?;
                }
                write_complex(buf, "statusRequest", status_request)
            }
            Self::Normal { application, sal_data } => {
                if application.application_id() != sal_data.application_id() {
                    return Err(SerializeError::Misclassified {
                        type_name: SalData::TYPE_NAME,
                    });
                }
                write_enum(buf, "application", application)?;
                if padded {
                    write_reserved(buf, "reserved", 8, 0x00)?;
                }
                write_complex(buf, "salData", sal_data)
            }
        }
    }

    fn bits(&self, padded: bool) -> usize {
        let padding = if padded { 8 } else { 0 };
        8 + padding
            + match self {
                Self::Status(status_request) => status_request.length_in_bits(),
                Self::Normal { sal_data, .. } => sal_data.length_in_bits(),
            }
    }

    fn check(&self, checklist: &mut Checklist) {
        if let Self::Normal { application, sal_data } = self {
            checklist.check(
                application.application_id() == sal_data.application_id(),
                format!("application {application} does not carry {} data", sal_data.application_id()),
            );
        }
    }
}

/// How a point-to-point command reaches its unit
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum PointToPointRouting {
    Direct {
        unit_address: u8,
    },
    Indirect {
        bridge_address: u8,
        network_route: NetworkRoute,
        unit_address: u8,
    },
}

/// Command addressed to a single unit, possibly through bridges
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct CBusPointToPointCommand {
    pub routing: PointToPointRouting,
    pub cal_data: CalData,
}

message_builder! {
    pub struct CBusPointToPointCommandBuilder => CBusPointToPointCommand {
        routing: PointToPointRouting = with_routing,
        cal_data: CalData = with_cal_data,
    }
}

impl CBusPointToPointCommand {
    #[must_use]
    pub fn is_direct(&self) -> bool {
        matches!(self.routing, PointToPointRouting::Direct { .. })
    }
}

impl Decode for CBusPointToPointCommand {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        let bridge_address_count_peek = p.peek_bits("bridgeAddressCountPeek", 16)?;
        let is_direct = read_virtual("isDirect", bridge_address_count_peek & 0x00FF == 0x0000);
        let routing = if is_direct {
            let unit_address = p.read_byte("unitAddress")?;
            read_reserved(p, "reserved", 8, 0x00)?;
            PointToPointRouting::Direct { unit_address }
        } else {
            PointToPointRouting::Indirect {
                bridge_address: p.read_byte("bridgeAddress")?,
                network_route: read_complex(p, "networkRoute")?,
                unit_address: p.read_byte("unitAddress")?,
            }
        };
        Ok(Self {
            routing,
            cal_data: read_complex(p, "calData")?,
        })
    }
}

impl Encode for CBusPointToPointCommand {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_virtual(buf, "isDirect", &self.is_direct())?;
        match &self.routing {
            PointToPointRouting::Direct { unit_address } => {
                buf.write_byte("unitAddress", *unit_address)?;
                write_reserved(buf, "reserved", 8, 0x00)?;
            }
            PointToPointRouting::Indirect {
                bridge_address,
                network_route,
                unit_address,
            } => {
                buf.write_byte("bridgeAddress", *bridge_address)?;
                write_complex(buf, "networkRoute", network_route)?;
                buf.write_byte("unitAddress", *unit_address)?;
            }
        }
        write_complex(buf, "calData", &self.cal_data)
    }
}

impl LengthAware for CBusPointToPointCommand {
    fn length_in_bits(&self) -> usize {
        let routing = match &self.routing {
            PointToPointRouting::Direct { .. } => 16,
            PointToPointRouting::Indirect { network_route, .. } => 16 + network_route.length_in_bits(),
        };
        routing + self.cal_data.length_in_bits()
    }
}

/// Command addressed to all units of an application
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct CBusPointToMultiPointCommand {
    pub body: MultiPointBody,
}

message_builder! {
    pub struct CBusPointToMultiPointCommandBuilder => CBusPointToMultiPointCommand {
        body: MultiPointBody = with_body,
    }
    check CBusPointToMultiPointCommand::check
}

impl CBusPointToMultiPointCommand {
    fn check(&self, checklist: &mut Checklist) {
        self.body.check(checklist);
    }
}

impl Decode for CBusPointToMultiPointCommand {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        Ok(Self {
            body: MultiPointBody::parse(p, true)?,
        })
    }
}

impl Encode for CBusPointToMultiPointCommand {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        self.body.write(buf, true)
    }
}

impl LengthAware for CBusPointToMultiPointCommand {
    fn length_in_bits(&self) -> usize {
        self.body.bits(true)
    }
}

/// Command addressed to all units of an application on a remote network
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct CBusPointToPointToMultiPointCommand {
    pub bridge_address: u8,
    pub network_route: NetworkRoute,
    pub body: MultiPointBody,
}

message_builder! {
    pub struct CBusPointToPointToMultiPointCommandBuilder => CBusPointToPointToMultiPointCommand {
        bridge_address: u8 = with_bridge_address,
        network_route: NetworkRoute = with_network_route / with_network_route_builder,
        body: MultiPointBody = with_body,
    }
    check CBusPointToPointToMultiPointCommand::check
}

impl CBusPointToPointToMultiPointCommand {
    fn check(&self, checklist: &mut Checklist) {
        self.body.check(checklist);
    }
}

impl Decode for CBusPointToPointToMultiPointCommand {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        Ok(Self {
            bridge_address: p.read_byte("bridgeAddress")?,
            network_route: read_complex(p, "networkRoute")?,
            body: MultiPointBody::parse(p, false)?,
        })
    }
}

impl Encode for CBusPointToPointToMultiPointCommand {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        buf.write_byte("bridgeAddress", self.bridge_address)?;
        write_complex(buf, "networkRoute", &self.network_route)?;
        self.body.write(buf, false)
    }
}

impl LengthAware for CBusPointToPointToMultiPointCommand {
    fn length_in_bits(&self) -> usize {
        8 + self.network_route.length_in_bits() + self.body.bits(false)
    }
}

/// Parameter write addressed to the device a connection is attached to
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct CBusCommandDeviceManagement {
    pub param_no: u8,
    pub parameter_value: u8,
}

message_builder! {
    pub struct CBusCommandDeviceManagementBuilder => CBusCommandDeviceManagement {
        param_no: u8 = with_param_no,
        parameter_value: u8 = with_parameter_value,
    }
}

impl FixedBits for CBusCommandDeviceManagement {
    const BITS: usize = 24;
}

impl Decode for CBusCommandDeviceManagement {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        let param_no = p.read_byte("paramNo")?;
        read_const(p, "delimiter", 8, 0x00)?;
        Ok(Self {
            param_no,
            parameter_value: p.read_byte("parameterValue")?,
        })
    }
}

impl Encode for CBusCommandDeviceManagement {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        buf.write_byte("paramNo", self.param_no)?;
        write_const(buf, "delimiter", 8, 0x00)?;
        buf.write_byte("parameterValue", self.parameter_value)
    }
}

/// A complete CBus command: header, then the body its addressing mode selects
///
/// The variant is chosen jointly by the header's destination address type
/// and its `dp` flag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum CBusCommand {
    PointToPoint {
        header: CBusHeader,
        command: CBusPointToPointCommand,
    },
    PointToMultiPoint {
        header: CBusHeader,
        command: CBusPointToMultiPointCommand,
    },
    PointToPointToMultiPoint {
        header: CBusHeader,
        command: CBusPointToPointToMultiPointCommand,
    },
    DeviceManagement {
        header: CBusHeader,
        command: CBusCommandDeviceManagement,
    },
}

impl CBusCommand {
    /// Whether the command was issued for device management
    #[must_use]
    pub fn is_device_management(&self) -> bool {
        self.shared().dp
    }
}

impl Family for CBusCommand {
    const TYPE_NAME: &'static str = "CBusCommand";
    type Args = ();
    type Shared = CBusHeader;

    fn parse_shared<P: Parser>(p: &mut P, _: ()) -> ParseResult<CBusHeader> {
        read_complex(p, "header")
    }

    fn parse_variant<P: Parser>(p: &mut P, header: CBusHeader, _: ()) -> ParseResult<Self> {
        let is_device_management = read_virtual("isDeviceManagement", header.dp);
        Ok(match (header.destination_address_type, is_device_management) {
            (DestinationAddressType::PointToPoint, true) => Self::DeviceManagement {
                command: CBusCommandDeviceManagement::parse(p)?,
                header,
            },
            (DestinationAddressType::PointToPoint, false) => Self::PointToPoint {
                command: CBusPointToPointCommand::parse(p)?,
                header,
            },
            (DestinationAddressType::PointToMultiPoint, false) => Self::PointToMultiPoint {
                command: CBusPointToMultiPointCommand::parse(p)?,
                header,
            },
            (DestinationAddressType::PointToPointToMultiPoint, false) => Self::PointToPointToMultiPoint {
                command: CBusPointToPointToMultiPointCommand::parse(p)?,
                header,
            },
            (destination_address_type, is_device_management) => {
                return Err(unmapped!(
                    Self::TYPE_NAME;
                    "destinationAddressType" => destination_address_type,
                    "isDeviceManagement" => is_device_management,
                ))
            }
        })
    }

    fn shared(&self) -> &CBusHeader {
        match self {
            Self::PointToPoint { header, .. }
            | Self::PointToMultiPoint { header, .. }
            | Self::PointToPointToMultiPoint { header, .. }
            | Self::DeviceManagement { header, .. } => header,
        }
    }

    fn selects_variant(&self) -> bool {
        let header = self.shared();
        let destination_address_type = match self {
            Self::PointToPoint { .. } | Self::DeviceManagement { .. } => DestinationAddressType::PointToPoint,
            Self::PointToMultiPoint { .. } => DestinationAddressType::PointToMultiPoint,
            Self::PointToPointToMultiPoint { .. } => DestinationAddressType::PointToPointToMultiPoint,
        };
        header.destination_address_type == destination_address_type
            && header.dp == matches!(self, Self::DeviceManagement { .. })
    }

    fn write_shared<T: Target>(header: &CBusHeader, buf: &mut T) -> SerializeResult<()> {
        write_complex(buf, "header", header)?;
        write_virtual(buf, "isDeviceManagement", &header.dp)
    }

    fn write_variant<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        match self {
            Self::PointToPoint { command, .. } => command.write_to(buf),
            Self::PointToMultiPoint { command, .. } => command.write_to(buf),
            Self::PointToPointToMultiPoint { command, .. } => command.write_to(buf),
            Self::DeviceManagement { command, .. } => command.write_to(buf),
        }
    }

    fn shared_bits(_: &CBusHeader) -> usize {
        CBusHeader::BITS
    }

    fn variant_bits(&self) -> usize {
        match self {
            Self::PointToPoint { command, .. } => command.length_in_bits(),
            Self::PointToMultiPoint { command, .. } => command.length_in_bits(),
            Self::PointToPointToMultiPoint { command, .. } => command.length_in_bits(),
            Self::DeviceManagement { command, .. } => command.length_in_bits(),
        }
    }
}

impl Decode for CBusCommand {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        parse_family(p, ())
    }
}

impl Encode for CBusCommand {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_family(self, buf)
    }
}

impl LengthAware for CBusCommand {
    fn length_in_bits(&self) -> usize {
        family_bits(self)
    }
}

#[derive(Clone, Debug)]
enum CBusCommandVariant {
    PointToPoint(CBusPointToPointCommandBuilder),
    PointToMultiPoint(CBusPointToMultiPointCommandBuilder),
    PointToPointToMultiPoint(CBusPointToPointToMultiPointCommandBuilder),
    DeviceManagement(CBusCommandDeviceManagementBuilder),
}

/// Builder for [`CBusCommand`]
///
/// The header's `destination_address_type` and `dp` are discriminators, so
/// they are overwritten on build with the values the selected variant
/// requires; the remaining header fields are taken as given.
#[derive(Clone, Debug, Default)]
pub struct CBusCommandBuilder {
    header: Option<CBusHeader>,
    variant: Option<CBusCommandVariant>,
}

impl CBusCommandBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_header(mut self, header: CBusHeader) -> Self {
        self.header = Some(header);
        self
    }

    #[must_use]
    pub fn as_point_to_point(self) -> Narrowed<Self, CBusPointToPointCommandBuilder> {
        self.narrow()
    }

    #[must_use]
    pub fn as_point_to_multi_point(self) -> Narrowed<Self, CBusPointToMultiPointCommandBuilder> {
        self.narrow()
    }

    #[must_use]
    pub fn as_point_to_point_to_multi_point(self) -> Narrowed<Self, CBusPointToPointToMultiPointCommandBuilder> {
        self.narrow()
    }

    #[must_use]
    pub fn as_device_management(self) -> Narrowed<Self, CBusCommandDeviceManagementBuilder> {
        self.narrow()
    }
}

macro_rules! compose_variant {
    ( $( $variant:ident => $child:ty ),+ $(,)? ) => {
        $(
            impl Compose<$child> for CBusCommandBuilder {
                fn adopt(mut self, child: $child) -> Self {
                    self.variant = Some(CBusCommandVariant::$variant(child));
                    self
                }

                fn take_child(&mut self) -> Option<$child> {
                    match self.variant.take() {
                        Some(CBusCommandVariant::$variant(child)) => Some(child),
                        other => {
                            self.variant = other;
                            None
                        }
                    }
                }
            }
        )+
    };
}

compose_variant! {
    PointToPoint => CBusPointToPointCommandBuilder,
    PointToMultiPoint => CBusPointToMultiPointCommandBuilder,
    PointToPointToMultiPoint => CBusPointToPointToMultiPointCommandBuilder,
    DeviceManagement => CBusCommandDeviceManagementBuilder,
}

impl Builder for CBusCommandBuilder {
    type Output = CBusCommand;

    fn build(&self) -> BuildResult<CBusCommand> {
        let mut checklist = Checklist::new(CBusCommand::TYPE_NAME);
        let header = checklist.require("header", &self.header);
        let variant = checklist.require_variant(&self.variant);
        let built = match variant {
            Some(CBusCommandVariant::PointToPoint(b)) => checklist
                .nested("command", b.build())
                .map(|command| (DestinationAddressType::PointToPoint, false, VariantBody::PointToPoint(command))),
            Some(CBusCommandVariant::PointToMultiPoint(b)) => checklist.nested("command", b.build()).map(|command| {
                (
                    DestinationAddressType::PointToMultiPoint,
                    false,
                    VariantBody::PointToMultiPoint(command),
                )
            }),
            Some(CBusCommandVariant::PointToPointToMultiPoint(b)) => {
                checklist.nested("command", b.build()).map(|command| {
                    (
                        DestinationAddressType::PointToPointToMultiPoint,
                        false,
                        VariantBody::PointToPointToMultiPoint(command),
                    )
                })
            }
            Some(CBusCommandVariant::DeviceManagement(b)) => checklist
                .nested("command", b.build())
                .map(|command| (DestinationAddressType::PointToPoint, true, VariantBody::DeviceManagement(command))),
            None => None,
        };
        let (Some(mut header), Some((destination_address_type, dp, body))) = (header, built) else {
            return Err(checklist.into_error());
        };
        checklist.check(header.rc < 4, format!("rc {} does not fit in 2 bits", header.rc));
        checklist.finish()?;
        header.destination_address_type = destination_address_type;
        header.dp = dp;
        Ok(match body {
            VariantBody::PointToPoint(command) => CBusCommand::PointToPoint { header, command },
            VariantBody::PointToMultiPoint(command) => CBusCommand::PointToMultiPoint { header, command },
            VariantBody::PointToPointToMultiPoint(command) => CBusCommand::PointToPointToMultiPoint { header, command },
            VariantBody::DeviceManagement(command) => CBusCommand::DeviceManagement { header, command },
        })
    }
}

enum VariantBody {
    PointToPoint(CBusPointToPointCommand),
    PointToMultiPoint(CBusPointToMultiPointCommand),
    PointToPointToMultiPoint(CBusPointToPointToMultiPointCommand),
    DeviceManagement(CBusCommandDeviceManagement),
}

impl ToBuilder for CBusCommand {
    type Builder = CBusCommandBuilder;

    fn to_builder(&self) -> CBusCommandBuilder {
        let variant = match self {
            Self::PointToPoint { command, .. } => CBusCommandVariant::PointToPoint(command.to_builder()),
            Self::PointToMultiPoint { command, .. } => CBusCommandVariant::PointToMultiPoint(command.to_builder()),
            Self::PointToPointToMultiPoint { command, .. } => {
                CBusCommandVariant::PointToPointToMultiPoint(command.to_builder())
            }
            Self::DeviceManagement { command, .. } => CBusCommandVariant::DeviceManagement(command.to_builder()),
        };
        CBusCommandBuilder {
            header: Some(self.shared().clone()),
            variant: Some(variant),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildProblem;
    use crate::parse::error::UnmappedVariant;
    use crate::parse::ParseError;
    use crate::protocols::cbus::enums::{CalCommandTypeContainer, PriorityClass};
    use crate::protocols::cbus::{LightingData, NetworkProtocolControlInformation};

    fn header(destination_address_type: DestinationAddressType) -> CBusHeader {
        CBusHeader {
            priority_class: PriorityClass::Class4,
            dp: false,
            rc: 0,
            destination_address_type,
        }
    }

    #[test]
    fn routed_header_selects_point_to_point_to_multi_point() {
        // header 0x4B, bridge 0x21, route depth 1, lighting on group 0x05
        let bytes = [0x4Bu8, 0x21, 0x01, 0x38, 0x79, 0x05];
        let command = CBusCommand::decode(bytes);
        let CBusCommand::PointToPointToMultiPoint { header, command: inner } = &command else {
            panic!("expected routed multi-point command, got {command:?}");
        };
        assert_eq!(header.priority_class, PriorityClass::Class3);
        assert_eq!(header.rc, 1);
        assert_eq!(inner.bridge_address, 0x21);
        assert!(inner.network_route.additional_bridge_addresses.is_empty());
        assert!(matches!(
            &inner.body,
            MultiPointBody::Normal {
                application: ApplicationIdContainer::Lighting38,
                sal_data: SalData::Lighting(LightingData::On { group: 0x05, .. }),
            }
        ));
        assert_eq!(command.length_in_bits(), 48);
        assert_eq!(command.serialize().unwrap(), bytes.to_vec());
    }

    #[test]
    fn direct_and_indirect_point_to_point() {
        let direct = [0x06u8, 0x31, 0x00, 0x21, 0x01];
        let command = CBusCommand::decode(direct);
        let CBusCommand::PointToPoint { command: inner, .. } = &command else {
            panic!("expected point-to-point, got {command:?}");
        };
        assert!(inner.is_direct());
        assert_eq!(
            inner.cal_data,
            CalData::Identify {
                command_type_container: CalCommandTypeContainer::Identify,
                attribute: 0x01
            }
        );
        assert_eq!(command.serialize().unwrap(), direct.to_vec());

        let indirect = [0x06u8, 0x21, 0x02, 0x22, 0x31, 0x08];
        let command = CBusCommand::decode(indirect);
        let CBusCommand::PointToPoint { command: inner, .. } = &command else {
            panic!("expected point-to-point, got {command:?}");
        };
        assert!(!inner.is_direct());
        assert_eq!(
            inner.routing,
            PointToPointRouting::Indirect {
                bridge_address: 0x21,
                network_route: NetworkRoute {
                    route_type: NetworkProtocolControlInformation {
                        stack_counter: 0,
                        stack_depth: 2
                    },
                    additional_bridge_addresses: vec![0x22],
                },
                unit_address: 0x31,
            }
        );
        assert_eq!(command.length_in_bits(), 48);
        assert_eq!(command.serialize().unwrap(), indirect.to_vec());
    }

    #[test]
    fn status_requests() {
        let binary = [0x05u8, 0xFF, 0x00, 0x7A, 0x38, 0x00];
        let command = CBusCommand::decode(binary);
        assert!(matches!(
            &command,
            CBusCommand::PointToMultiPoint {
                command: CBusPointToMultiPointCommand {
                    body: MultiPointBody::Status(StatusRequest::BinaryState {
                        application: ApplicationIdContainer::Lighting38
                    })
                },
                ..
            }
        ));
        assert_eq!(command.serialize().unwrap(), binary.to_vec());

        let level = [0x05u8, 0xFF, 0x00, 0x73, 0x07, 0x38, 0x40];
        let command = CBusCommand::decode(level);
        assert_eq!(command.length_in_bits(), 56);
        assert_eq!(command.serialize().unwrap(), level.to_vec());

        let err = CBusCommand::try_decode([0x05u8, 0xFF, 0x00, 0x73, 0x07, 0x38, 0x41]).unwrap_err();
        assert_eq!(err.root(), &ParseError::Validation(String::from("invalid label")));
        assert_eq!(err.breadcrumb(), vec!["CBusCommand", "statusRequest"]);
    }

    #[test]
    fn device_management_requires_delimiter() {
        let bytes = [0x26u8, 0x30, 0x00, 0x4F];
        let command = CBusCommand::decode(bytes);
        assert!(command.is_device_management());
        assert_eq!(command.serialize().unwrap(), bytes.to_vec());

        let err = CBusCommand::try_decode([0x26u8, 0x30, 0x01, 0x4F]).unwrap_err();
        assert_eq!(
            err.root(),
            &ParseError::ConstMismatch {
                field: "delimiter",
                expected: 0x00,
                actual: 0x01
            }
        );
    }

    #[test]
    fn unmapped_addressing_mode() {
        let err = CBusCommand::try_decode([0x25u8, 0x00]).unwrap_err();
        assert_eq!(
            err.root(),
            &ParseError::Unmapped(UnmappedVariant {
                type_name: "CBusCommand",
                discriminators: vec![
                    ("destinationAddressType", String::from("PointToMultiPoint")),
                    ("isDeviceManagement", String::from("true")),
                ],
            })
        );
    }

    #[test]
    fn underrun_is_reported_with_breadcrumbs() {
        let err = CBusCommand::try_decode([0x06u8, 0x31, 0x00, 0x1A, 0x30]).unwrap_err();
        assert_eq!(err.breadcrumb(), vec!["CBusCommand", "calData", "CalData"]);
        assert_eq!(
            err.root(),
            &ParseError::Underrun {
                field: "count",
                requested: 8,
                available: 0
            }
        );
    }

    #[test]
    fn builder_narrows_and_sets_discriminators() {
        let command = CBusCommandBuilder::new()
            .with_header(header(DestinationAddressType::PointToMultiPoint))
            .as_device_management()
            .with(|b| b.with_param_no(0x30).with_parameter_value(0x4F))
            .done()
            .must_build();
        assert_eq!(command.shared().destination_address_type, DestinationAddressType::PointToPoint);
        assert!(command.is_device_management());
        assert_eq!(command.serialize().unwrap(), vec![0x26, 0x30, 0x00, 0x4F]);
    }

    #[test]
    fn builder_reports_nested_problems() {
        let err = CBusCommandBuilder::new()
            .as_point_to_point()
            .with(|b| b.with_routing(PointToPointRouting::Direct { unit_address: 1 }))
            .done()
            .build()
            .unwrap_err();
        assert_eq!(err.missing_fields(), vec!["header"]);
        let [_, BuildProblem::SubBuilder { field: "command", source }] = err.problems() else {
            panic!("unexpected problems: {err}");
        };
        assert_eq!(source.missing_fields(), vec!["cal_data"]);

        let err = CBusCommandBuilder::new()
            .with_header(header(DestinationAddressType::PointToPoint))
            .build()
            .unwrap_err();
        assert_eq!(err.problems(), &[BuildProblem::MissingVariant("CBusCommand")]);
    }

    #[test]
    fn rebuilt_command_does_not_alias_original() {
        let original = CBusCommand::decode([0x4Bu8, 0x21, 0x01, 0x38, 0x79, 0x05]);
        let copy = original.deep_copy();
        let edited = original
            .to_builder()
            .as_point_to_point_to_multi_point()
            .with(|b| b.with_bridge_address(0x22))
            .done()
            .must_build();
        assert_eq!(copy, original);
        assert_ne!(edited, original);
        assert_eq!(edited.serialize().unwrap()[1], 0x22);
        assert_eq!(original.serialize().unwrap()[1], 0x21);
    }

    #[test]
    fn mismatched_application_is_rejected_by_builder() {
        let err = CBusPointToMultiPointCommandBuilder::new()
            .with_body(MultiPointBody::Normal {
                application: ApplicationIdContainer::MeteringD1,
                sal_data: SalData::Lighting(LightingData::decode([0x79u8, 0x01])),
            })
            .build()
            .unwrap_err();
        assert!(matches!(err.problems(), [BuildProblem::Invalid(_)]));
    }

    #[test]
    fn header_must_select_variant() {
        let management = CBusCommand::DeviceManagement {
            header: header(DestinationAddressType::PointToPoint),
            command: CBusCommandDeviceManagement {
                param_no: 0x3E,
                parameter_value: 0x01,
            },
        };
        assert_eq!(
            management.serialize().unwrap_err().root(),
            &SerializeError::Misclassified { type_name: "CBusCommand" }
        );

        let multi_point = CBusCommand::PointToMultiPoint {
            header: header(DestinationAddressType::PointToPoint),
            command: CBusPointToMultiPointCommand {
                body: MultiPointBody::Normal {
                    application: ApplicationIdContainer::Lighting38,
                    sal_data: SalData::Lighting(LightingData::decode([0x79u8, 0x01])),
                },
            },
        };
        assert!(!multi_point.selects_variant());
        assert!(multi_point.serialize().is_err());
    }

    #[test]
    fn mismatched_application_is_not_written() {
        let command = CBusCommand::PointToMultiPoint {
            header: header(DestinationAddressType::PointToMultiPoint),
            command: CBusPointToMultiPointCommand {
                body: MultiPointBody::Normal {
                    application: ApplicationIdContainer::MeteringD1,
                    sal_data: SalData::Lighting(LightingData::decode([0x79u8, 0x01])),
                },
            },
        };
        assert!(command.selects_variant());
        assert_eq!(
            command.serialize().unwrap_err().root(),
            &SerializeError::Misclassified { type_name: "SalData" }
        );
    }
}
