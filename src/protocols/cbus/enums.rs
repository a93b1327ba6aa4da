//! Value tables of the enumerated CBus fields

use crate::adt::WireEnum;
use crate::wire_enum;

wire_enum! {
    /// Priority of a command on the bus, highest first
    pub enum PriorityClass: 2 {
        Class4 = 0x0,
        Class3 = 0x1,
        Class2 = 0x2,
        Class1 = 0x3,
    }
}

wire_enum! {
    /// Addressing mode of a command, the main discriminator of [`CBusCommand`](super::CBusCommand)
    pub enum DestinationAddressType: 3 {
        PointToPointToMultiPoint = 0x3,
        PointToMultiPoint = 0x5,
        PointToPoint = 0x6,
    }
}

wire_enum! {
    /// Application addresses, as carried on the wire
    pub enum ApplicationIdContainer: 8 {
        TemperatureBroadcast19 = 0x19,
        Lighting38 = 0x38,
        Lighting39 = 0x39,
        Lighting3A = 0x3A,
        ErrorReportingCE = 0xCE,
        MeteringD1 = 0xD1,
        ClockAndTimekeepingDF = 0xDF,
        TelephonyStatusAndControlE0 = 0xE0,
    }
}

/// Application a [`SalData`](super::SalData) payload belongs to
///
/// Several wire addresses can map to the same application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum ApplicationId {
    Reserved,
    TemperatureBroadcast,
    Lighting,
    ErrorReporting,
    Metering,
    ClockAndTimekeeping,
    TelephonyStatusAndControl,
}

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl ApplicationIdContainer {
    #[must_use]
    pub fn application_id(&self) -> ApplicationId {
        match self {
            Self::TemperatureBroadcast19 => ApplicationId::TemperatureBroadcast,
            Self::Lighting38 | Self::Lighting39 | Self::Lighting3A => ApplicationId::Lighting,
            Self::ErrorReportingCE => ApplicationId::ErrorReporting,
            Self::MeteringD1 => ApplicationId::Metering,
            Self::ClockAndTimekeepingDF => ApplicationId::ClockAndTimekeeping,
            Self::TelephonyStatusAndControlE0 => ApplicationId::TelephonyStatusAndControl,
            Self::Unknown(_) => ApplicationId::Reserved,
        }
    }
}

wire_enum! {
    /// Command byte of a [`CalData`](super::CalData), packing the command and its length
    pub enum CalCommandTypeContainer: 8 {
        Reset = 0x08,
        Recall = 0x1A,
        Identify = 0x21,
        GetStatus = 0x2A,
        Acknowledge = 0x32,
        Write2 = 0xA2,
        Write3 = 0xA3,
        Write4 = 0xA4,
        Write5 = 0xA5,
        Write6 = 0xA6,
        Write7 = 0xA7,
        Write8 = 0xA8,
        Write9 = 0xA9,
        Write10 = 0xAA,
        Write11 = 0xAB,
        Write12 = 0xAC,
        Write13 = 0xAD,
        Write14 = 0xAE,
        Write15 = 0xAF,
    }
}

/// Command selected by a [`CalCommandTypeContainer`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CalCommandType {
    Reset,
    Recall,
    Identify,
    GetStatus,
    Acknowledge,
    Write,
}

impl CalCommandTypeContainer {
    #[must_use]
    pub fn command_type(&self) -> Option<CalCommandType> {
        match self {
            Self::Reset => Some(CalCommandType::Reset),
            Self::Recall => Some(CalCommandType::Recall),
            Self::Identify => Some(CalCommandType::Identify),
            Self::GetStatus => Some(CalCommandType::GetStatus),
            Self::Acknowledge => Some(CalCommandType::Acknowledge),
            Self::Unknown(_) => None,
            _ => Some(CalCommandType::Write),
        }
    }

    /// Number of bytes following the command byte
    #[must_use]
    pub fn num_bytes(&self) -> u8 {
        match self.command_type() {
            Some(CalCommandType::Reset) | None => 0,
            Some(CalCommandType::Identify) => 1,
            Some(CalCommandType::Recall | CalCommandType::GetStatus | CalCommandType::Acknowledge) => 2,
            Some(CalCommandType::Write) => (self.raw() & 0x0F) as u8,
        }
    }

    /// The write container whose length field is `num_bytes`
    #[must_use]
    pub fn write_of_len(num_bytes: u8) -> Option<Self> {
        let value = Self::from_raw(0xA0 | u64::from(num_bytes & 0x0F));
        ((2..=0x0F).contains(&num_bytes) && value.is_known()).then_some(value)
    }
}

wire_enum! {
    /// Command byte of a [`LightingData`](super::LightingData)
    pub enum LightingCommandTypeContainer: 8 {
        Off = 0x01,
        RampToLevelInstantaneous = 0x02,
        TerminateRamp = 0x09,
        RampToLevel4Second = 0x0A,
        RampToLevel8Second = 0x12,
        RampToLevel12Second = 0x1A,
        RampToLevel20Second = 0x22,
        RampToLevel30Second = 0x2A,
        RampToLevel40Second = 0x32,
        RampToLevel60Second = 0x3A,
        RampToLevel90Second = 0x42,
        RampToLevel120Second = 0x4A,
        RampToLevel180Second = 0x52,
        RampToLevel300Second = 0x5A,
        RampToLevel420Second = 0x62,
        RampToLevel600Second = 0x6A,
        RampToLevel900Second = 0x72,
        On = 0x79,
        RampToLevel1020Second = 0x7A,
        Label2 = 0xA2,
        Label3 = 0xA3,
        Label4 = 0xA4,
        Label5 = 0xA5,
        Label6 = 0xA6,
        Label7 = 0xA7,
        Label8 = 0xA8,
        Label9 = 0xA9,
        Label10 = 0xAA,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightingCommandType {
    Off,
    On,
    RampToLevel,
    TerminateRamp,
    Label,
}

impl LightingCommandTypeContainer {
    #[must_use]
    pub fn command_type(&self) -> Option<LightingCommandType> {
        let raw = self.raw();
        match self {
            Self::Off => Some(LightingCommandType::Off),
            Self::On => Some(LightingCommandType::On),
            Self::TerminateRamp => Some(LightingCommandType::TerminateRamp),
            Self::Unknown(_) => None,
            _ if raw >= 0xA0 => Some(LightingCommandType::Label),
            _ => Some(LightingCommandType::RampToLevel),
        }
    }

    /// Number of bytes following the command byte
    #[must_use]
    pub fn num_bytes(&self) -> u8 {
        match self.command_type() {
            Some(LightingCommandType::RampToLevel) => 2,
            Some(LightingCommandType::Label) => (self.raw() & 0x1F) as u8,
            Some(_) => 1,
            None => 0,
        }
    }
}

wire_enum! {
    pub enum LightingLabelFlavour: 2 {
        Flavour0 = 0x0,
        Flavour1 = 0x1,
        Flavour2 = 0x2,
        Flavour3 = 0x3,
    }
}

wire_enum! {
    pub enum LightingLabelType: 2 {
        TextLabel = 0x0,
        PredefinedIcon = 0x1,
        LoadDynamicIcon = 0x2,
        SetPreferredLanguage = 0x3,
    }
}

wire_enum! {
    pub enum Language: 8 {
        NoLanguage = 0x00,
        English = 0x01,
        EnglishAustralia = 0x02,
        EnglishBelize = 0x03,
        EnglishCanada = 0x04,
        EnglishCaribbean = 0x05,
        EnglishIreland = 0x06,
        EnglishJamaica = 0x07,
        EnglishNewZealand = 0x08,
        EnglishPhilippines = 0x09,
        EnglishSouthAfrica = 0x0A,
        EnglishTrinidad = 0x0B,
        EnglishUk = 0x0C,
        EnglishUsa = 0x0D,
        EnglishZimbabwe = 0x0E,
        German = 0x40,
        French = 0x80,
    }
}

wire_enum! {
    /// Command byte of a [`MeteringData`](super::MeteringData)
    pub enum MeteringCommandTypeContainer: 8 {
        Event0 = 0x08,
        Event1 = 0x09,
        Event2 = 0x0A,
        Event3 = 0x0B,
        Event4 = 0x0C,
        Event5 = 0x0D,
        Event6 = 0x0E,
        Event7 = 0x0F,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeteringCommandType {
    Event,
}

impl std::fmt::Display for MeteringCommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EVENT")
    }
}

impl MeteringCommandTypeContainer {
    #[must_use]
    pub fn command_type(&self) -> Option<MeteringCommandType> {
        self.is_known().then_some(MeteringCommandType::Event)
    }

    #[must_use]
    pub fn num_bytes(&self) -> u8 {
        (self.raw() & 0x07) as u8
    }
}

wire_enum! {
    /// Command byte of an [`ErrorReportingData`](super::ErrorReportingData)
    pub enum ErrorReportingCommandTypeContainer: 8 {
        Deprecated = 0x05,
        ErrorReport = 0x15,
        Acknowledge = 0x25,
        ClearMostSevere = 0x35,
    }
}

wire_enum! {
    pub enum ErrorReportingSystemCategoryClass: 4 {
        SystemIndication = 0x0,
        User = 0x1,
        BuildingManagementSystems = 0x2,
        OutputUnits = 0x3,
        InputUnits = 0x4,
        Support = 0x5,
        Climate = 0x6,
    }
}

wire_enum! {
    pub enum ErrorReportingSeverity: 3 {
        AllOk = 0x0,
        Ok = 0x1,
        MinorFailure = 0x2,
        GeneralFailure = 0x3,
        ExtremeFailure = 0x4,
    }
}

wire_enum! {
    /// Command byte of a [`TelephonyData`](super::TelephonyData)
    pub enum TelephonyCommandTypeContainer: 8 {
        LineOnHook = 0x09,
        Event2 = 0xA2,
        Event3 = 0xA3,
        Event4 = 0xA4,
        Event5 = 0xA5,
        Event6 = 0xA6,
        Event7 = 0xA7,
        Event8 = 0xA8,
        Event9 = 0xA9,
        Event10 = 0xAA,
        Event11 = 0xAB,
        Event12 = 0xAC,
    }
}

impl TelephonyCommandTypeContainer {
    /// Number of bytes following the command byte, the argument included
    #[must_use]
    pub fn num_bytes(&self) -> u8 {
        match self {
            Self::LineOnHook => 1,
            Self::Unknown(_) => 0,
            _ => (self.raw() & 0x0F) as u8,
        }
    }

    #[must_use]
    pub fn event_of_len(num_bytes: u8) -> Option<Self> {
        let value = Self::from_raw(0xA0 | u64::from(num_bytes & 0x0F));
        (num_bytes >= 2 && value.is_known() && value.num_bytes() == num_bytes).then_some(value)
    }
}

wire_enum! {
    pub enum LineOffHookReason: 8 {
        NoReason = 0x00,
        IncomingVoiceCall = 0x01,
        IncomingDataCall = 0x02,
        IncomingCall = 0x03,
        OutgoingVoiceCall = 0x10,
        OutgoingDataCall = 0x20,
        OutgoingCall = 0x30,
        CbTest = 0x40,
        CallTransfer = 0x50,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_lengths() {
        assert_eq!(CalCommandTypeContainer::Write4.num_bytes(), 4);
        assert_eq!(CalCommandTypeContainer::Recall.num_bytes(), 2);
        assert_eq!(CalCommandTypeContainer::write_of_len(5), Some(CalCommandTypeContainer::Write5));
        assert_eq!(CalCommandTypeContainer::write_of_len(1), None);
        assert_eq!(CalCommandTypeContainer::from_raw(0x99).command_type(), None);

        assert_eq!(LightingCommandTypeContainer::Label6.num_bytes(), 6);
        assert_eq!(
            LightingCommandTypeContainer::RampToLevel60Second.command_type(),
            Some(LightingCommandType::RampToLevel)
        );
        assert_eq!(MeteringCommandTypeContainer::Event5.num_bytes(), 5);
        assert_eq!(TelephonyCommandTypeContainer::event_of_len(7), Some(TelephonyCommandTypeContainer::Event7));
        assert_eq!(TelephonyCommandTypeContainer::event_of_len(13), None);
    }

    #[test]
    fn application_mapping() {
        assert_eq!(ApplicationIdContainer::Lighting39.application_id(), ApplicationId::Lighting);
        assert_eq!(ApplicationIdContainer::from_raw(0x01).application_id(), ApplicationId::Reserved);
    }
}
