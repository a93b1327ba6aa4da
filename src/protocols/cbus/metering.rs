//! Metering application payloads

use crate::builder::{BuildResult, Builder, Checklist, Compose, Narrowed, ToBuilder};
use crate::conv::error::SerializeResult;
use crate::conv::target::Target;
use crate::conv::{Decode, Encode, LengthAware};
use crate::family::{family_bits, parse_family, write_family, Family, Hex};
use crate::field::{read_enum, read_virtual, write_enum, write_virtual};
use crate::parse::{ParseResult, Parser};
use crate::unmapped;

use super::enums::{MeteringCommandType, MeteringCommandTypeContainer};

/// Fields shared by every metering variant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct MeteringShared {
    pub command_type_container: MeteringCommandTypeContainer,
    pub argument: u8,
}

/// Quantity a metering command measures or reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum MeteredQuantity {
    Electricity,
    Gas,
    DrinkingWater,
    OtherWater,
    Oil,
}

impl MeteredQuantity {
    /// Argument of the request to measure this quantity
    #[must_use]
    pub const fn measure_argument(self) -> u8 {
        match self {
            Self::Electricity => 0x01,
            Self::Gas => 0x02,
            Self::DrinkingWater => 0x03,
            Self::OtherWater => 0x04,
            Self::Oil => 0x05,
        }
    }

    /// Argument of a consumption report of this quantity
    #[must_use]
    pub const fn consumption_argument(self) -> u8 {
        0x80 | self.measure_argument()
    }
}

/// Metering payload, selected jointly by command type and argument
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum MeteringData {
    MeasureElectricity(MeteringShared),
    MeasureGas(MeteringShared),
    MeasureDrinkingWater(MeteringShared),
    MeasureOtherWater(MeteringShared),
    MeasureOil(MeteringShared),
    ElectricityConsumption { shared: MeteringShared, kwhr: u32 },
    GasConsumption { shared: MeteringShared, mj: u32 },
    DrinkingWaterConsumption { shared: MeteringShared, kl: u32 },
    OtherWaterConsumption { shared: MeteringShared, kl: u32 },
    OilConsumption { shared: MeteringShared, l: u32 },
}

impl MeteringData {
    /// Request to measure `quantity`
    #[must_use]
    pub fn measure(command_type_container: MeteringCommandTypeContainer, quantity: MeteredQuantity) -> Self {
        let shared = MeteringShared {
            command_type_container,
            argument: quantity.measure_argument(),
        };
        match quantity {
            MeteredQuantity::Electricity => Self::MeasureElectricity(shared),
            MeteredQuantity::Gas => Self::MeasureGas(shared),
            MeteredQuantity::DrinkingWater => Self::MeasureDrinkingWater(shared),
            MeteredQuantity::OtherWater => Self::MeasureOtherWater(shared),
            MeteredQuantity::Oil => Self::MeasureOil(shared),
        }
    }

    /// Report of `value` units of `quantity` consumed
    #[must_use]
    pub fn consumption(
        command_type_container: MeteringCommandTypeContainer,
        quantity: MeteredQuantity,
        value: u32,
    ) -> Self {
        let shared = MeteringShared {
            command_type_container,
            argument: quantity.consumption_argument(),
        };
        match quantity {
            MeteredQuantity::Electricity => Self::ElectricityConsumption { shared, kwhr: value },
            MeteredQuantity::Gas => Self::GasConsumption { shared, mj: value },
            MeteredQuantity::DrinkingWater => Self::DrinkingWaterConsumption { shared, kl: value },
            MeteredQuantity::OtherWater => Self::OtherWaterConsumption { shared, kl: value },
            MeteredQuantity::Oil => Self::OilConsumption { shared, l: value },
        }
    }

    #[must_use]
    pub fn quantity(&self) -> MeteredQuantity {
        match self {
            Self::MeasureElectricity(_) | Self::ElectricityConsumption { .. } => MeteredQuantity::Electricity,
            Self::MeasureGas(_) | Self::GasConsumption { .. } => MeteredQuantity::Gas,
            Self::MeasureDrinkingWater(_) | Self::DrinkingWaterConsumption { .. } => MeteredQuantity::DrinkingWater,
            Self::MeasureOtherWater(_) | Self::OtherWaterConsumption { .. } => MeteredQuantity::OtherWater,
            Self::MeasureOil(_) | Self::OilConsumption { .. } => MeteredQuantity::Oil,
        }
    }

    /// Consumed amount, for consumption reports
    #[must_use]
    pub fn consumed(&self) -> Option<u32> {
        match self {
            Self::ElectricityConsumption { kwhr: value, .. }
            | Self::GasConsumption { mj: value, .. }
            | Self::DrinkingWaterConsumption { kl: value, .. }
            | Self::OtherWaterConsumption { kl: value, .. }
            | Self::OilConsumption { l: value, .. } => Some(*value),
            _ => None,
        }
    }
}

impl Family for MeteringData {
    const TYPE_NAME: &'static str = "MeteringData";
    type Args = ();
    type Shared = MeteringShared;

    fn parse_shared<P: Parser>(p: &mut P, _: ()) -> ParseResult<MeteringShared> {
        Ok(MeteringShared {
            command_type_container: read_enum(p, "commandTypeContainer")?,
            argument: p.read_byte("argument")?,
        })
    }

    fn parse_variant<P: Parser>(p: &mut P, shared: MeteringShared, _: ()) -> ParseResult<Self> {
        let command_type = read_virtual("commandType", shared.command_type_container.command_type());
        Ok(match (command_type, shared.argument) {
            (Some(MeteringCommandType::Event), 0x01) => Self::MeasureElectricity(shared),
            (Some(MeteringCommandType::Event), 0x02) => Self::MeasureGas(shared),
            (Some(MeteringCommandType::Event), 0x03) => Self::MeasureDrinkingWater(shared),
            (Some(MeteringCommandType::Event), 0x04) => Self::MeasureOtherWater(shared),
            (Some(MeteringCommandType::Event), 0x05) => Self::MeasureOil(shared),
            (Some(MeteringCommandType::Event), 0x81) => Self::ElectricityConsumption {
                shared,
                kwhr: p.read_u32("kWhr", 32)?,
            },
            (Some(MeteringCommandType::Event), 0x82) => Self::GasConsumption {
                shared,
                mj: p.read_u32("mJ", 32)?,
            },
            (Some(MeteringCommandType::Event), 0x83) => Self::DrinkingWaterConsumption {
                shared,
                kl: p.read_u32("kL", 32)?,
            },
            (Some(MeteringCommandType::Event), 0x84) => Self::OtherWaterConsumption {
                shared,
                kl: p.read_u32("kL", 32)?,
            },
            (Some(MeteringCommandType::Event), 0x85) => Self::OilConsumption {
                shared,
                l: p.read_u32("L", 32)?,
            },
            _ => {
                return Err(unmapped!(
                    Self::TYPE_NAME;
                    "commandTypeContainer" => shared.command_type_container,
                    "argument" => Hex(shared.argument.into()),
                ))
            }
        })
    }

    fn shared(&self) -> &MeteringShared {
        match self {
            Self::MeasureElectricity(shared)
            | Self::MeasureGas(shared)
            | Self::MeasureDrinkingWater(shared)
            | Self::MeasureOtherWater(shared)
            | Self::MeasureOil(shared)
            | Self::ElectricityConsumption { shared, .. }
            | Self::GasConsumption { shared, .. }
            | Self::DrinkingWaterConsumption { shared, .. }
            | Self::OtherWaterConsumption { shared, .. }
            | Self::OilConsumption { shared, .. } => shared,
        }
    }

    fn selects_variant(&self) -> bool {
        let shared = self.shared();
        let expected = match self.consumed() {
            Some(_) => self.quantity().consumption_argument(),
            None => self.quantity().measure_argument(),
        };
        shared.command_type_container.command_type().is_some() && shared.argument == expected
    }

    fn write_shared<T: Target>(shared: &MeteringShared, buf: &mut T) -> SerializeResult<()> {
        write_enum(buf, "commandTypeContainer", &shared.command_type_container)?;
        write_virtual(buf, "commandType", &shared.command_type_container.command_type())?;
        buf.write_byte("argument", shared.argument)
    }

    fn write_variant<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        match self {
            Self::ElectricityConsumption { kwhr, .. } => buf.write_u32("kWhr", 32, *kwhr),
            Self::GasConsumption { mj, .. } => buf.write_u32("mJ", 32, *mj),
            Self::DrinkingWaterConsumption { kl, .. } | Self::OtherWaterConsumption { kl, .. } => {
                buf.write_u32("kL", 32, *kl)
            }
            Self::OilConsumption { l, .. } => buf.write_u32("L", 32, *l),
            _ => Ok(()),
        }
    }

    fn shared_bits(_: &MeteringShared) -> usize {
        16
    }

    fn variant_bits(&self) -> usize {
        if self.consumed().is_some() {
            32
        } else {
            0
        }
    }
}

impl Decode for MeteringData {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        parse_family(p, ())
    }
}

impl Encode for MeteringData {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_family(self, buf)
    }
}

impl LengthAware for MeteringData {
    fn length_in_bits(&self) -> usize {
        family_bits(self)
    }
}

/// Variant builder for the `Measure*` requests
#[derive(Clone, Debug, Default)]
pub struct MeasureBuilder {
    quantity: Option<MeteredQuantity>,
}

impl MeasureBuilder {
    #[must_use]
    pub fn with_quantity(mut self, quantity: MeteredQuantity) -> Self {
        self.quantity = Some(quantity);
        self
    }
}

/// Variant builder for the `*Consumption` reports
#[derive(Clone, Debug, Default)]
pub struct ConsumptionBuilder {
    quantity: Option<MeteredQuantity>,
    value: Option<u32>,
}

impl ConsumptionBuilder {
    #[must_use]
    pub fn with_quantity(mut self, quantity: MeteredQuantity) -> Self {
        self.quantity = Some(quantity);
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: u32) -> Self {
        self.value = Some(value);
        self
    }
}

#[derive(Clone, Debug)]
enum MeteringVariantBuilder {
    Measure(MeasureBuilder),
    Consumption(ConsumptionBuilder),
}

/// Builder for [`MeteringData`]
///
/// The argument byte is not set directly: it follows from the variant
/// builder selected with [`as_measure`](Self::as_measure) or
/// [`as_consumption`](Self::as_consumption) and the quantity set on it.
#[derive(Clone, Debug, Default)]
pub struct MeteringDataBuilder {
    command_type_container: Option<MeteringCommandTypeContainer>,
    variant: Option<MeteringVariantBuilder>,
}

impl MeteringDataBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_command_type_container(mut self, value: MeteringCommandTypeContainer) -> Self {
        self.command_type_container = Some(value);
        self
    }

    #[must_use]
    pub fn as_measure(self) -> Narrowed<Self, MeasureBuilder> {
        self.narrow()
    }

    #[must_use]
    pub fn as_consumption(self) -> Narrowed<Self, ConsumptionBuilder> {
        self.narrow()
    }
}

impl Compose<MeasureBuilder> for MeteringDataBuilder {
    fn adopt(mut self, child: MeasureBuilder) -> Self {
        self.variant = Some(MeteringVariantBuilder::Measure(child));
        self
    }

    fn take_child(&mut self) -> Option<MeasureBuilder> {
        match self.variant.take() {
            Some(MeteringVariantBuilder::Measure(child)) => Some(child),
            other => {
                self.variant = other;
                None
            }
        }
    }
}

impl Compose<ConsumptionBuilder> for MeteringDataBuilder {
    fn adopt(mut self, child: ConsumptionBuilder) -> Self {
        self.variant = Some(MeteringVariantBuilder::Consumption(child));
        self
    }

    fn take_child(&mut self) -> Option<ConsumptionBuilder> {
        match self.variant.take() {
            Some(MeteringVariantBuilder::Consumption(child)) => Some(child),
            other => {
                self.variant = other;
                None
            }
        }
    }
}

impl Builder for MeteringDataBuilder {
    type Output = MeteringData;

    fn build(&self) -> BuildResult<MeteringData> {
        let mut checklist = Checklist::new(MeteringData::TYPE_NAME);
        let container = checklist.require("command_type_container", &self.command_type_container);
        let variant = checklist.require_variant(&self.variant);
        let selected = match variant {
            Some(MeteringVariantBuilder::Measure(b)) => checklist
                .require("quantity", &b.quantity)
                .map(|quantity| (quantity, None)),
            Some(MeteringVariantBuilder::Consumption(b)) => {
                let quantity = checklist.require("quantity", &b.quantity);
                let value = checklist.require("value", &b.value);
                quantity.zip(value).map(|(quantity, value)| (quantity, Some(value)))
            }
            None => None,
        };
        let (Some(container), Some((quantity, consumed))) = (container, selected) else {
            return Err(checklist.into_error());
        };
        let built = match consumed {
            Some(value) => MeteringData::consumption(container, quantity, value),
            None => MeteringData::measure(container, quantity),
        };
        let payload = built.length_in_bytes() - 1;
        checklist.check(
            usize::from(container.num_bytes()) == payload,
            format!("{container} announces {} bytes but the payload holds {payload}", container.num_bytes()),
        );
        checklist.finish()?;
        Ok(built)
    }
}

impl ToBuilder for MeteringData {
    type Builder = MeteringDataBuilder;

    fn to_builder(&self) -> MeteringDataBuilder {
        let variant = match self.consumed() {
            Some(value) => MeteringVariantBuilder::Consumption(ConsumptionBuilder {
                quantity: Some(self.quantity()),
                value: Some(value),
            }),
            None => MeteringVariantBuilder::Measure(MeasureBuilder {
                quantity: Some(self.quantity()),
            }),
        };
        MeteringDataBuilder {
            command_type_container: Some(self.shared().command_type_container),
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
    use crate::SerializeError;

    #[test]
    fn measure_oil_has_no_extra_bytes() {
        let data = MeteringData::decode([0x09u8, 0x05]);
        assert_eq!(
            data,
            MeteringData::MeasureOil(MeteringShared {
                command_type_container: MeteringCommandTypeContainer::Event1,
                argument: 0x05,
            })
        );
        assert_eq!(data.length_in_bits(), 16);
        assert_eq!(data.serialize().unwrap(), vec![0x09, 0x05]);
    }

    #[test]
    fn consumption_reports_carry_a_value() {
        let bytes = [0x0Du8, 0x81, 0x00, 0x00, 0x04, 0xD2];
        let data = MeteringData::decode(bytes);
        assert!(matches!(data, MeteringData::ElectricityConsumption { kwhr: 1234, .. }));
        assert_eq!(data.length_in_bits(), 48);
        assert_eq!(data.counted_bits().unwrap(), 48);
        assert_eq!(data.serialize().unwrap(), bytes.to_vec());
    }

    #[test]
    fn unmapped_argument_lists_both_discriminators() {
        let err = MeteringData::try_decode([0x09u8, 0x42]).unwrap_err();
        assert_eq!(
            err.root(),
            &ParseError::Unmapped(UnmappedVariant {
                type_name: "MeteringData",
                discriminators: vec![
                    ("commandTypeContainer", String::from("Event1")),
                    ("argument", String::from("0x42")),
                ],
            })
        );
        assert_eq!(err.root().to_string(), "unmapped type MeteringData for parameters [commandTypeContainer=Event1, argument=0x42]");
    }

    #[test]
    fn narrowed_builder_selects_variant() {
        let data = MeteringDataBuilder::new()
            .with_command_type_container(MeteringCommandTypeContainer::Event5)
            .as_consumption()
            .with(|b| b.with_quantity(MeteredQuantity::Gas).with_value(77))
            .done()
            .must_build();
        assert_eq!(
            data,
            MeteringData::GasConsumption {
                shared: MeteringShared {
                    command_type_container: MeteringCommandTypeContainer::Event5,
                    argument: 0x82,
                },
                mj: 77,
            }
        );
        assert_eq!(MeteringData::decode(data.serialize().unwrap()), data);
    }

    #[test]
    fn builder_aggregates_problems() {
        let err = MeteringDataBuilder::new().build().unwrap_err();
        assert_eq!(
            err.problems(),
            &[
                BuildProblem::MissingField("command_type_container"),
                BuildProblem::MissingVariant("MeteringData"),
            ]
        );

        let err = MeteringDataBuilder::new()
            .as_consumption()
            .done()
            .build()
            .unwrap_err();
        assert_eq!(err.missing_fields(), vec!["command_type_container", "quantity", "value"]);

        let err = MeteringDataBuilder::new()
            .with_command_type_container(MeteringCommandTypeContainer::Event5)
            .as_measure()
            .with(|b| b.with_quantity(MeteredQuantity::Oil))
            .done()
            .build()
            .unwrap_err();
        assert!(matches!(err.problems(), [BuildProblem::Invalid(_)]));
    }

    #[test]
    fn rebuilding_resumes_the_selected_variant() {
        let original = MeteringData::consumption(MeteringCommandTypeContainer::Event5, MeteredQuantity::Oil, 10);
        let updated = original
            .to_builder()
            .as_consumption()
            .with(|b| b.with_value(11))
            .done()
            .must_build();
        assert_eq!(original.consumed(), Some(10));
        assert_eq!(updated.consumed(), Some(11));
        assert_eq!(updated.quantity(), MeteredQuantity::Oil);

        let switched = original
            .to_builder()
            .with_command_type_container(MeteringCommandTypeContainer::Event1)
            .as_measure()
            .with(|b| b.with_quantity(MeteredQuantity::Oil))
            .done()
            .must_build();
        assert!(matches!(switched, MeteringData::MeasureOil(_)));
    }

    #[test]
    fn argument_must_match_variant() {
        let mislabelled = MeteringData::MeasureOil(MeteringShared {
            command_type_container: MeteringCommandTypeContainer::Event0,
            argument: 0x01,
        });
        let err = mislabelled.serialize().unwrap_err();
        assert_eq!(err.root(), &SerializeError::Misclassified { type_name: "MeteringData" });

        let report = MeteringData::GasConsumption {
            shared: MeteringShared {
                command_type_container: MeteringCommandTypeContainer::Event0,
                argument: MeteredQuantity::Gas.measure_argument(),
            },
            mj: 7,
        };
        assert!(report.serialize().is_err());

        let unknown = MeteringData::MeasureGas(MeteringShared {
            command_type_container: MeteringCommandTypeContainer::Unknown(0x00),
            argument: 0x02,
        });
        assert!(!unknown.selects_variant());

        let oil = MeteringData::measure(MeteringCommandTypeContainer::Event0, MeteredQuantity::Oil);
        assert_eq!(oil.serialize().unwrap(), vec![0x08, 0x05]);
    }
}
