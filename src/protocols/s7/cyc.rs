//! Item descriptors of the cyclic data subscription request

use crate::conv::error::SerializeResult;
use crate::conv::target::Target;
use crate::conv::{Decode, Encode, FixedBits, LengthAware};
use crate::field::{
    read_const, read_count_array, read_enum, read_implicit, read_in_context, read_reserved, write_array, write_const,
    write_enum, write_implicit, write_in_context, write_reserved,
};
use crate::message_builder;
use crate::parse::{ParseResult, Parser};
use crate::unmapped;

use super::enums::{MemoryArea, TransportSize};

const FUNCTION_ID: u64 = 0x12;
const ANY_TYPE: u8 = 0x10;
const DB_READ_TYPE: u8 = 0xB0;

/// Item addressed through an S7 any-pointer
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct CycServiceItemAnyType {
    pub transport_size: TransportSize,
    pub number_of_elements: u16,
    pub db_number: u16,
    pub memory_area: MemoryArea,
    pub byte_address: u16,
    /// 3 bits
    pub bit_address: u8,
}

message_builder! {
    pub struct CycServiceItemAnyTypeBuilder => CycServiceItemAnyType {
        transport_size: TransportSize = with_transport_size,
        number_of_elements: u16 = with_number_of_elements,
        db_number: u16 = with_db_number,
        memory_area: MemoryArea = with_memory_area,
        byte_address: u16 = with_byte_address,
        bit_address: u8 = with_bit_address,
    }
    check CycServiceItemAnyType::check
}

impl CycServiceItemAnyType {
    fn check(&self, checklist: &mut crate::builder::Checklist) {
        checklist.check(
            self.bit_address < 8,
            format!("bit address {} does not fit in 3 bits", self.bit_address),
        );
    }
}

impl FixedBits for CycServiceItemAnyType {
    const BITS: usize = 72;
}

impl Decode for CycServiceItemAnyType {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        let transport_size = read_enum(p, "transportSize")?;
        let number_of_elements = p.read_u16("numberOfElements", 16)?;
        let db_number = p.read_u16("dbNumber", 16)?;
        let memory_area = read_enum(p, "memoryArea")?;
        read_reserved(p, "reserved", 5, 0x00)?;
        Ok(Self {
            transport_size,
            number_of_elements,
            db_number,
            memory_area,
            byte_address: p.read_u16("byteAddress", 16)?,
            bit_address: p.read_u8("bitAddress", 3)?,
        })
    }
}

impl Encode for CycServiceItemAnyType {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_enum(buf, "transportSize", &self.transport_size)?;
        buf.write_u16("numberOfElements", 16, self.number_of_elements)?;
        buf.write_u16("dbNumber", 16, self.db_number)?;
        write_enum(buf, "memoryArea", &self.memory_area)?;
        write_reserved(buf, "reserved", 5, 0x00)?;
        buf.write_u16("byteAddress", 16, self.byte_address)?;
        buf.write_u8("bitAddress", 3, self.bit_address)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct CycServiceItemDbReadSubItem {
    pub bytes_to_read: u8,
    pub db_number: u16,
    pub start_address: u16,
}

message_builder! {
    pub struct CycServiceItemDbReadSubItemBuilder => CycServiceItemDbReadSubItem {
        bytes_to_read: u8 = with_bytes_to_read,
        db_number: u16 = with_db_number,
        start_address: u16 = with_start_address,
    }
}

impl FixedBits for CycServiceItemDbReadSubItem {
    const BITS: usize = 40;
}

impl Decode for CycServiceItemDbReadSubItem {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        Ok(Self {
            bytes_to_read: p.read_byte("bytesToRead")?,
            db_number: p.read_u16("dbNumber", 16)?,
            start_address: p.read_u16("startAddress", 16)?,
        })
    }
}

impl Encode for CycServiceItemDbReadSubItem {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        buf.write_byte("bytesToRead", self.bytes_to_read)?;
        buf.write_u16("dbNumber", 16, self.db_number)?;
        buf.write_u16("startAddress", 16, self.start_address)
    }
}

/// Item reading raw byte ranges of data blocks
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct CycServiceItemDbReadType {
    pub items: Vec<CycServiceItemDbReadSubItem>,
}

message_builder! {
    pub struct CycServiceItemDbReadTypeBuilder => CycServiceItemDbReadType {
        items: Vec<CycServiceItemDbReadSubItem> = with_items,
    }
    check CycServiceItemDbReadType::check
}

impl CycServiceItemDbReadType {
    fn check(&self, checklist: &mut crate::builder::Checklist) {
        checklist.check(
            self.items.len() <= usize::from(u8::MAX),
            format!("{} areas exceed the 8-bit area count", self.items.len()),
        );
    }
}

impl Decode for CycServiceItemDbReadType {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        let number_of_areas = read_implicit(p, "numberOfAreas", 8)? as usize;
        Ok(Self {
            items: read_count_array(p, "items", number_of_areas, CycServiceItemDbReadSubItem::parse)?,
        })
    }
}

impl Encode for CycServiceItemDbReadType {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_implicit(buf, "numberOfAreas", 8, self.items.len() as u64)?;
        write_array(buf, "items", &self.items, |buf, item| item.write_to(buf))
    }
}

impl LengthAware for CycServiceItemDbReadType {
    fn length_in_bits(&self) -> usize {
        8 + self.items.len() * CycServiceItemDbReadSubItem::BITS
    }
}

/// One item of a cyclic subscription, selected by its syntax id
///
/// ```text
/// 0x12 | byteLength | syntaxId | item...
/// ```
///
/// `byteLength` counts the bytes following it and is recomputed on write.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum CycServiceItemType {
    Any(CycServiceItemAnyType),
    DbRead(CycServiceItemDbReadType),
}

impl CycServiceItemType {
    pub const TYPE_NAME: &'static str = "CycServiceItemType";

    #[must_use]
    pub fn syntax_id(&self) -> u8 {
        match self {
            Self::Any(_) => ANY_TYPE,
            Self::DbRead(_) => DB_READ_TYPE,
        }
    }

    fn byte_length(&self) -> usize {
        self.length_in_bytes() - 2
    }
}

impl Decode for CycServiceItemType {
    fn parse<P: Parser>(p: &mut P) -> ParseResult<Self> {
        read_in_context(p, Self::TYPE_NAME, |p| {
            read_const(p, "functionId", 8, FUNCTION_ID)?;
            let byte_length = read_implicit(p, "byteLength", 8)?;
            let syntax_id = p.read_byte("syntaxId")?;
            let item = match syntax_id {
                ANY_TYPE => Self::Any(CycServiceItemAnyType::parse(p)?),
                DB_READ_TYPE => Self::DbRead(CycServiceItemDbReadType::parse(p)?),
                other => return Err(unmapped!(Self::TYPE_NAME; "syntaxId" => crate::family::Hex(other.into()))),
            };
            if byte_length != item.byte_length() as u64 {
                tracing::warn!(
                    declared = byte_length,
                    actual = item.byte_length(),
                    "byte length of cyclic service item does not match its contents"
                );
            }
            Ok(item)
        })
    }
}

impl Encode for CycServiceItemType {
    fn write_to<T: Target>(&self, buf: &mut T) -> SerializeResult<()> {
        write_in_context(buf, Self::TYPE_NAME, |buf| {
            write_const(buf, "functionId", 8, FUNCTION_ID)?;
            write_implicit(buf, "byteLength", 8, self.byte_length() as u64)?;
            buf.write_byte("syntaxId", self.syntax_id())?;
            match self {
                Self::Any(item) => item.write_to(buf),
                Self::DbRead(item) => item.write_to(buf),
            }
        })
    }
}

impl LengthAware for CycServiceItemType {
    fn length_in_bits(&self) -> usize {
        24 + match self {
            Self::Any(item) => item.length_in_bits(),
            Self::DbRead(item) => item.length_in_bits(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::parse::error::UnmappedVariant;
    use crate::parse::ParseError;

    const ANY_ITEM: [u8; 12] = [0x12, 0x0A, 0x10, 0x02, 0x00, 0x04, 0x00, 0x01, 0x84, 0x00, 0x00, 0x83];

    const DB_READ_ITEM: [u8; 14] = [
        0x12, 0x0C, 0xB0, 0x02, // header, two areas
        0x04, 0x00, 0x01, 0x00, 0x00, //
        0x02, 0x00, 0x02, 0x00, 0x10,
    ];

    #[test]
    fn any_pointer_item() {
        let item = CycServiceItemType::decode(ANY_ITEM);
        assert_eq!(
            item,
            CycServiceItemType::Any(CycServiceItemAnyType {
                transport_size: TransportSize::Byte,
                number_of_elements: 4,
                db_number: 1,
                memory_area: MemoryArea::DataBlocks,
                byte_address: 0x10,
                bit_address: 3,
            })
        );
        assert_eq!(item.length_in_bytes(), 12);
        assert_eq!(item.serialize().unwrap(), ANY_ITEM.to_vec());
    }

    #[test]
    fn db_read_item() {
        let item = CycServiceItemType::decode(DB_READ_ITEM);
        let CycServiceItemType::DbRead(db_read) = &item else {
            panic!("expected db read item, got {item:?}");
        };
        assert_eq!(db_read.items.len(), 2);
        assert_eq!(
            db_read.items[1],
            CycServiceItemDbReadSubItem {
                bytes_to_read: 2,
                db_number: 2,
                start_address: 0x10
            }
        );
        assert_eq!(item.serialize().unwrap(), DB_READ_ITEM.to_vec());
    }

    #[test]
    fn byte_length_is_recomputed_on_write() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mut stale = ANY_ITEM;
        stale[1] = 0x20;
        let item = CycServiceItemType::decode(stale);
        assert_eq!(item.serialize().unwrap(), ANY_ITEM.to_vec());

        let built = CycServiceItemType::DbRead(
            CycServiceItemDbReadTypeBuilder::new()
                .with_items(vec![CycServiceItemDbReadSubItemBuilder::new()
                    .with_bytes_to_read(4)
                    .with_db_number(1)
                    .with_start_address(0)
                    .must_build()])
                .must_build(),
        );
        assert_eq!(built.serialize().unwrap(), vec![0x12, 0x07, 0xB0, 0x01, 0x04, 0x00, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn dispatch_failures() {
        let err = CycServiceItemType::try_decode([0x12u8, 0x0A, 0x11]).unwrap_err();
        assert_eq!(err.breadcrumb(), vec!["CycServiceItemType"]);
        assert_eq!(
            err.root(),
            &ParseError::Unmapped(UnmappedVariant {
                type_name: "CycServiceItemType",
                discriminators: vec![("syntaxId", String::from("0x11"))],
            })
        );

        let err = CycServiceItemType::try_decode([0x11u8, 0x0A, 0x10]).unwrap_err();
        assert_eq!(
            err.root(),
            &ParseError::ConstMismatch {
                field: "functionId",
                expected: 0x12,
                actual: 0x11
            }
        );
    }

    #[test]
    fn any_pointer_builder() {
        let err = CycServiceItemAnyTypeBuilder::new()
            .with_transport_size(TransportSize::Real)
            .with_bit_address(9)
            .build()
            .unwrap_err();
        assert_eq!(
            err.missing_fields(),
            vec!["number_of_elements", "db_number", "memory_area", "byte_address"]
        );

        let item = CycServiceItemAnyTypeBuilder::new()
            .with_transport_size(TransportSize::Real)
            .with_number_of_elements(1)
            .with_db_number(7)
            .with_memory_area(MemoryArea::DataBlocks)
            .with_byte_address(4)
            .with_bit_address(0)
            .build();
        assert!(item.is_ok());
        assert!(CycServiceItemAnyTypeBuilder::new()
            .with_transport_size(TransportSize::Real)
            .with_number_of_elements(1)
            .with_db_number(7)
            .with_memory_area(MemoryArea::DataBlocks)
            .with_byte_address(4)
            .with_bit_address(9)
            .build()
            .is_err());
    }
}
