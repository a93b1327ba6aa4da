//! Value tables of the enumerated S7 fields

use crate::wire_enum;

wire_enum! {
    /// Element type of an any-pointer, as carried on the wire
    pub enum TransportSize: 8 {
        Bool = 0x01,
        Byte = 0x02,
        Char = 0x03,
        Word = 0x04,
        Int = 0x05,
        Dword = 0x06,
        Dint = 0x07,
        Real = 0x08,
        Date = 0x09,
        TimeOfDay = 0x0A,
        Time = 0x0B,
        S5Time = 0x0C,
        DateAndTime = 0x0F,
        Counter = 0x1C,
        Timer = 0x1D,
    }
}

wire_enum! {
    /// Memory area addressed by an any-pointer
    pub enum MemoryArea: 8 {
        Counters = 0x1C,
        Timers = 0x1D,
        DirectPeripheralAccess = 0x80,
        Inputs = 0x81,
        Outputs = 0x82,
        FlagsMarkers = 0x83,
        DataBlocks = 0x84,
        InstanceDataBlocks = 0x85,
        LocalData = 0x86,
    }
}

impl TransportSize {
    /// Size of one element in bytes, `None` for bit-sized and unknown types
    #[must_use]
    pub const fn element_bytes(&self) -> Option<usize> {
        match self {
            Self::Byte | Self::Char => Some(1),
            Self::Word | Self::Int | Self::Date | Self::S5Time | Self::Counter | Self::Timer => Some(2),
            Self::Dword | Self::Dint | Self::Real | Self::TimeOfDay | Self::Time => Some(4),
            Self::DateAndTime => Some(8),
            Self::Bool | Self::Unknown(_) => None,
        }
    }
}
