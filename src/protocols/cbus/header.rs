//! Command header and bridge routing information

use crate::conv::error::SerializeResult;
use crate::conv::target::Target;
use crate::conv::{Decode, Encode, FixedBits, LengthAware};
use crate::field::{read_count_array, read_enum, read_reserved, validate, write_array, write_enum, write_reserved};
use crate::message_builder;
use crate::parse::{ParseResult, Parser};

use super::enums::{DestinationAddressType, PriorityClass};

/// First byte of every CBus command
///
/// ```text
///  7 6   5    4 3    2 1 0
/// [prio][dp][ rc ][  dat  ]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct CBusHeader {
    pub priority_class: PriorityClass,
    /// Set on device-management commands
    pub dp: bool,
    /// Retransmission counter, 2 bits
    pub rc: u8,
    pub destination_address_type: DestinationAddressType,
}

message_builder! {
    pub struct CBusHeaderBuilder => CBusHeader {
        priority_class: PriorityClass = with_priority_class,
        dp: bool = with_dp,
        rc: u8 = with_rc,
        destination_address_type: DestinationAddressType = with_destination_address_type,
    }
    check CBusHeader::check
}

impl CBusHeader {
    fn check(&self, checklist: &mut crate::builder::Checklist) {
        checklist.check(self.rc < 4, format!("rc {} does not fit in 2 bits", self.rc));
    }
}

impl FixedBits for CBusHeader {
    const BITS: usize = 8;
}

impl Decode for CBusHeader {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        Ok(Self {
            priority_class: read_enum(p, "priorityClass")?,
            dp: p.read_bit("dp")?,
            rc: p.read_u8("rc", 2)?,
            destination_address_type: read_enum(p, "destinationAddressType")?,
        })
    }
}

impl Encode for CBusHeader {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_enum(buf, "priorityClass", &self.priority_class)?;
        buf.write_bit("dp", self.dp)?;
        buf.write_u8("rc", 2, self.rc)?;
        write_enum(buf, "destinationAddressType", &self.destination_address_type)
    }
}

/// Control byte of a [`NetworkRoute`]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkProtocolControlInformation {
    /// 3 bits
    pub stack_counter: u8,
    /// Number of bridges on the route, 3 bits
    pub stack_depth: u8,
}

message_builder! {
    pub struct NetworkProtocolControlInformationBuilder => NetworkProtocolControlInformation {
        stack_counter: u8 = with_stack_counter,
        stack_depth: u8 = with_stack_depth,
    }
}

impl FixedBits for NetworkProtocolControlInformation {
    const BITS: usize = 8;
}

impl Decode for NetworkProtocolControlInformation {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        read_reserved(p, "reserved", 2, 0x0)?;
        Ok(Self {
            stack_counter: p.read_u8("stackCounter", 3)?,
            stack_depth: p.read_u8("stackDepth", 3)?,
        })
    }
}

impl Encode for NetworkProtocolControlInformation {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_reserved(buf, "reserved", 2, 0x0)?;
        buf.write_u8("stackCounter", 3, self.stack_counter)?;
        buf.write_u8("stackDepth", 3, self.stack_depth)
    }
}

/// Route through a chain of bridges
///
/// The first bridge is addressed by the enclosing command; the route lists
/// the remaining `stack_depth - 1`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkRoute {
    pub route_type: NetworkProtocolControlInformation,
    pub additional_bridge_addresses: Vec<u8>,
}

message_builder! {
    pub struct NetworkRouteBuilder => NetworkRoute {
        route_type: NetworkProtocolControlInformation = with_route_type / with_route_type_builder,
        additional_bridge_addresses: Vec<u8> = with_additional_bridge_addresses,
    }
    check NetworkRoute::check
}

impl NetworkRoute {
    fn check(&self, checklist: &mut crate::builder::Checklist) {
        let depth = usize::from(self.route_type.stack_depth);
        checklist.check(
            depth >= 1 && self.additional_bridge_addresses.len() == depth - 1,
            format!(
                "stack depth {depth} requires {} additional bridge addresses, got {}",
                depth.saturating_sub(1),
                self.additional_bridge_addresses.len()
            ),
        );
    }
}

impl Decode for NetworkRoute {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        let route_type = NetworkProtocolControlInformation::parse(p)?;
        validate(route_type.stack_depth >= 1, "network route with a stack depth of zero")?;
        let count = usize::from(route_type.stack_depth) - 1;
        let additional_bridge_addresses =
            read_count_array(p, "additionalBridgeAddresses", count, |p| p.read_byte("bridgeAddress"))?;
        Ok(Self {
            route_type,
            additional_bridge_addresses,
        })
    }
}

impl Encode for NetworkRoute {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        self.route_type.write_to(buf)?;
        write_array(buf, "additionalBridgeAddresses", &self.additional_bridge_addresses, |buf, b| {
            buf.write_byte("bridgeAddress", *b)
        })
    }
}

impl LengthAware for NetworkRoute {
    fn length_in_bits(&self) -> usize {
        self.route_type.length_in_bits() + 8 * self.additional_bridge_addresses.len()
    }
}
