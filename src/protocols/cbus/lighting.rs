//! Lighting application payloads

use crate::builder::Checklist;
use crate::conv::error::SerializeResult;
use crate::conv::target::Target;
use crate::conv::{Decode, Encode, FixedBits, LengthAware};
use crate::family::{family_bits, parse_family, write_family, Family};
use crate::field::{
    read_enum, read_optional, read_reserved, read_virtual, validate, write_enum, write_optional, write_reserved,
    write_sized_bytes, write_virtual,
};
use crate::parse::{ParseResult, Parser};
use crate::{message_builder, unmapped};

use super::enums::{Language, LightingCommandType, LightingCommandTypeContainer, LightingLabelFlavour, LightingLabelType};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum LightingData {
    Off {
        command_type_container: LightingCommandTypeContainer,
        group: u8,
    },
    On {
        command_type_container: LightingCommandTypeContainer,
        group: u8,
    },
    RampToLevel {
        command_type_container: LightingCommandTypeContainer,
        group: u8,
        level: u8,
    },
    TerminateRamp {
        command_type_container: LightingCommandTypeContainer,
        group: u8,
    },
    Label {
        command_type_container: LightingCommandTypeContainer,
        label: LightingLabel,
    },
}

/// Bit-packed options byte of a label command
///
/// ```text
///   7     6 5     4   3     2 1    0
/// [res][flavour][res][res][ type ][res]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct LightingLabelOptions {
    pub label_flavour: LightingLabelFlavour,
    pub label_type: LightingLabelType,
}

message_builder! {
    pub struct LightingLabelOptionsBuilder => LightingLabelOptions {
        label_flavour: LightingLabelFlavour = with_label_flavour,
        label_type: LightingLabelType = with_label_type,
    }
}

impl FixedBits for LightingLabelOptions {
    const BITS: usize = 8;
}

impl Decode for LightingLabelOptions {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        read_reserved(p, "reserved", 1, 0)?;
        let label_flavour = read_enum(p, "labelFlavour")?;
        read_reserved(p, "reserved", 1, 0)?;
        read_reserved(p, "reserved", 1, 0)?;
        let label_type = read_enum(p, "labelType")?;
        read_reserved(p, "reserved", 1, 0)?;
        Ok(Self {
            label_flavour,
            label_type,
        })
    }
}

impl Encode for LightingLabelOptions {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_reserved(buf, "reserved", 1, 0)?;
        write_enum(buf, "labelFlavour", &self.label_flavour)?;
        write_reserved(buf, "reserved", 1, 0)?;
        write_reserved(buf, "reserved", 1, 0)?;
        write_enum(buf, "labelType", &self.label_type)?;
        write_reserved(buf, "reserved", 1, 0)
    }
}

/// Text or icon label for a group
///
/// The language is carried for every label type except `LoadDynamicIcon`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct LightingLabel {
    pub group: u8,
    pub label_options: LightingLabelOptions,
    pub language: Option<Language>,
    pub data: Vec<u8>,
}

message_builder! {
    pub struct LightingLabelBuilder => LightingLabel {
        group: u8 = with_group,
        label_options: LightingLabelOptions = with_label_options / with_label_options_builder,
        data: Vec<u8> = with_data,
    }
    optional {
        language: Language = with_language,
    }
    check LightingLabel::check
}

impl LightingLabel {
    fn has_language(options: &LightingLabelOptions) -> bool {
        options.label_type != LightingLabelType::LoadDynamicIcon
    }

    /// Bytes after the command byte
    fn num_bytes(&self) -> usize {
        2 + usize::from(self.language.is_some()) + self.data.len()
    }

    fn check(&self, checklist: &mut Checklist) {
        checklist.check(
            Self::has_language(&self.label_options) == self.language.is_some(),
            "language must be set exactly when the label type is not LoadDynamicIcon",
        );
        checklist.check(self.num_bytes() <= 10, "label data is longer than 7 bytes");
    }

    fn parse<P: Parser>(p: &mut P, num_bytes: usize) -> ParseResult<Self> {
        let group = p.read_byte("group")?;
        let label_options = LightingLabelOptions::parse(p)?;
        let language = read_optional(p, "language", Self::has_language(&label_options), |p| {
            read_enum(p, "language")
        })?;
        let header = 2 + usize::from(language.is_some());
        validate(num_bytes >= header, "label command too short for its options")?;
        let data = p.read_bytes("data", num_bytes - header)?;
        Ok(Self {
            group,
            label_options,
            language,
            data,
        })
    }

    fn write_to<T: Target>(&self, buf: &mut T, num_bytes: usize) -> SerializeResult<()> {
        buf.write_byte("group", self.group)?;
        self.label_options.write_to(buf)?;
        write_optional(buf, "language", &self.language, |buf, language| {
            write_enum(buf, "language", language)
        })?;
        let header = 2 + usize::from(self.language.is_some());
        write_sized_bytes(buf, "data", num_bytes.saturating_sub(header), &self.data)
    }
}

impl LightingData {
    /// Label command whose container is chosen to fit `label`
    #[must_use]
    pub fn label(label: LightingLabel) -> Option<Self> {
        let num_bytes = u64::try_from(label.num_bytes()).ok().filter(|n| *n <= 0x1F)?;
        let container = <LightingCommandTypeContainer as crate::adt::WireEnum>::from_raw(0xA0 | num_bytes);
        (container.command_type() == Some(LightingCommandType::Label)).then_some(Self::Label {
            command_type_container: container,
            label,
        })
    }

    /// Group addressed by the command
    #[must_use]
    pub fn group(&self) -> u8 {
        match self {
            Self::Off { group, .. }
            | Self::On { group, .. }
            | Self::RampToLevel { group, .. }
            | Self::TerminateRamp { group, .. } => *group,
            Self::Label { label, .. } => label.group,
        }
    }
}

impl Family for LightingData {
    const TYPE_NAME: &'static str = "LightingData";
    type Args = ();
    type Shared = LightingCommandTypeContainer;

    fn parse_shared<P: Parser>(p: &mut P, _: ()) -> ParseResult<LightingCommandTypeContainer> {
        read_enum(p, "commandTypeContainer")
    }

    fn parse_variant<P: Parser>(p: &mut P, container: LightingCommandTypeContainer, _: ()) -> ParseResult<Self> {
        let command_type = read_virtual("commandType", container.command_type());
        Ok(match command_type {
            Some(LightingCommandType::Off) => Self::Off {
                command_type_container: container,
                group: p.read_byte("group")?,
            },
            Some(LightingCommandType::On) => Self::On {
                command_type_container: container,
                group: p.read_byte("group")?,
            },
            Some(LightingCommandType::RampToLevel) => Self::RampToLevel {
                command_type_container: container,
                group: p.read_byte("group")?,
                level: p.read_byte("level")?,
            },
            Some(LightingCommandType::TerminateRamp) => Self::TerminateRamp {
                command_type_container: container,
                group: p.read_byte("group")?,
            },
            Some(LightingCommandType::Label) => Self::Label {
                command_type_container: container,
                label: LightingLabel::parse(p, usize::from(container.num_bytes()))?,
            },
            None => return Err(unmapped!(Self::TYPE_NAME; "commandTypeContainer" => container)),
        })
    }

    fn shared(&self) -> &LightingCommandTypeContainer {
        match self {
            Self::Off {
                command_type_container,
                ..
            }
            | Self::On {
                command_type_container,
                ..
            }
            | Self::RampToLevel {
                command_type_container,
                ..
            }
            | Self::TerminateRamp {
                command_type_container,
                ..
            }
            | Self::Label {
                command_type_container,
                ..
            } => command_type_container,
        }
    }

    fn selects_variant(&self) -> bool {
        let expected = match self {
            Self::Off { .. } => LightingCommandType::Off,
            Self::On { .. } => LightingCommandType::On,
            Self::RampToLevel { .. } => LightingCommandType::RampToLevel,
            Self::TerminateRamp { .. } => LightingCommandType::TerminateRamp,
            Self::Label { .. } => LightingCommandType::Label,
        };
        self.shared().command_type() == Some(expected)
    }

    fn write_shared<T: Target>(container: &LightingCommandTypeContainer, buf: &mut T) -> SerializeResult<()> {
        write_enum(buf, "commandTypeContainer", container)?;
        write_virtual(buf, "commandType", &container.command_type())
    }

    fn write_variant<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        match self {
            Self::Off { group, .. } | Self::On { group, .. } | Self::TerminateRamp { group, .. } => {
                buf.write_byte("group", *group)
            }
            Self::RampToLevel { group, level, .. } => {
                buf.write_byte("group", *group)?;
                buf.write_byte("level", *level)
            }
            Self::Label {
                command_type_container,
                label,
            } => label.write_to(buf, usize::from(command_type_container.num_bytes())),
        }
    }

    fn shared_bits(container: &LightingCommandTypeContainer) -> usize {
        container.length_in_bits()
    }

    fn variant_bits(&self) -> usize {
        match self {
            Self::Off { .. } | Self::On { .. } | Self::TerminateRamp { .. } => 8,
            Self::RampToLevel { .. } => 16,
            Self::Label { label, .. } => 8 * label.num_bytes(),
        }
    }
}

impl Decode for LightingData {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        parse_family(p, ())
    }
}

impl Encode for LightingData {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_family(self, buf)
    }
}

impl LengthAware for LightingData {
    fn length_in_bits(&self) -> usize {
        family_bits(self)
    }
}
