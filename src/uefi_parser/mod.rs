//! UEFI HII wire structures and their nom parsers.
//!
//! Layouts follow the UEFI specification, "HII Protocols" chapter. All
//! integers are little-endian; records are never reinterpreted in place,
//! every field is read explicitly.

use std::fmt;

use nom::bytes::complete::take;
use nom::multi::count;
use nom::number::complete::{le_u16, le_u32};
use nom::IResult;

pub mod fields;
pub mod headers;
pub mod ifr;
mod opcode;

pub use fields::{Field, FieldValue, Fields};
pub use headers::*;
pub use opcode::IfrOpcode;

/// Size of the common package header.
pub const HII_PACKAGE_HEADER_SIZE: usize = 4;
/// Size of the IFR opcode header.
pub const IFR_OPCODE_HEADER_SIZE: usize = 2;
/// Fixed part of the strings package header, up to the language tag.
pub const HII_STRING_PACKAGE_HEADER_SIZE: usize = 46;

/// EDK2 extension opcodes live under this GUID opcode.
pub const IFR_TIANO_GUID: Guid = Guid {
    data1: 0x0F0B_1735,
    data2: 0x87A0,
    data3: 0x4193,
    data4: [0xB2, 0x66, 0x53, 0x8C, 0x38, 0xAF, 0x48, 0xCE],
};

/// Framework compatibility extension opcodes live under this GUID opcode.
pub const IFR_FRAMEWORK_GUID: Guid = Guid {
    data1: 0x31CA_5D1A,
    data2: 0xD511,
    data3: 0x4931,
    data4: [0xB7, 0x82, 0xAE, 0x6B, 0x2B, 0x17, 0x8C, 0xD7],
};

/// EFI_GUID in its mixed-endian wire layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7]
        )
    }
}

pub fn guid(input: &[u8]) -> IResult<&[u8], Guid> {
    let (input, data1) = le_u32(input)?;
    let (input, data2) = le_u16(input)?;
    let (input, data3) = le_u16(input)?;
    let (input, tail) = take(8usize)(input)?;
    let mut data4 = [0u8; 8];
    data4.copy_from_slice(tail);
    Ok((
        input,
        Guid {
            data1,
            data2,
            data3,
            data4,
        },
    ))
}

/// Package type tag, the high byte of the package header word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HiiPackageType {
    All,
    Guid,
    Forms,
    Strings,
    Fonts,
    Images,
    SimpleFonts,
    DevicePath,
    KeyboardLayout,
    Animations,
    End,
    System(u8),
    Unknown(u8),
}

impl From<u8> for HiiPackageType {
    fn from(tag: u8) -> Self {
        match tag {
            0x00 => HiiPackageType::All,
            0x01 => HiiPackageType::Guid,
            0x02 => HiiPackageType::Forms,
            0x04 => HiiPackageType::Strings,
            0x05 => HiiPackageType::Fonts,
            0x06 => HiiPackageType::Images,
            0x07 => HiiPackageType::SimpleFonts,
            0x08 => HiiPackageType::DevicePath,
            0x09 => HiiPackageType::KeyboardLayout,
            0x0A => HiiPackageType::Animations,
            0xDF => HiiPackageType::End,
            0xE0..=0xFF => HiiPackageType::System(tag),
            x => HiiPackageType::Unknown(x),
        }
    }
}

impl HiiPackageType {
    pub fn tag(self) -> u8 {
        match self {
            HiiPackageType::All => 0x00,
            HiiPackageType::Guid => 0x01,
            HiiPackageType::Forms => 0x02,
            HiiPackageType::Strings => 0x04,
            HiiPackageType::Fonts => 0x05,
            HiiPackageType::Images => 0x06,
            HiiPackageType::SimpleFonts => 0x07,
            HiiPackageType::DevicePath => 0x08,
            HiiPackageType::KeyboardLayout => 0x09,
            HiiPackageType::Animations => 0x0A,
            HiiPackageType::End => 0xDF,
            HiiPackageType::System(x) | HiiPackageType::Unknown(x) => x,
        }
    }
}

/// Common 4-byte package header: one LE word, length in bits 0-23, type in bits 24-31.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HiiPackageHeader {
    pub length: u32,
    pub package_type: HiiPackageType,
}

pub fn hii_package_header(input: &[u8]) -> IResult<&[u8], HiiPackageHeader> {
    let (input, word) = le_u32(input)?;
    Ok((
        input,
        HiiPackageHeader {
            length: word & 0x00FF_FFFF,
            package_type: HiiPackageType::from((word >> 24) as u8),
        },
    ))
}

/// Fixed part of EFI_HII_STRING_PACKAGE_HDR, after the common package header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HiiStringPackageHeader {
    pub header_size: u32,
    pub string_info_offset: u32,
    pub language_window: [u16; 16],
    pub language_name_string_id: u16,
}

/// Parses the 42 bytes that follow the 4-byte package header.
pub fn hii_string_package_header(input: &[u8]) -> IResult<&[u8], HiiStringPackageHeader> {
    let (input, header_size) = le_u32(input)?;
    let (input, string_info_offset) = le_u32(input)?;
    let (input, window) = count(le_u16, 16)(input)?;
    let (input, language_name_string_id) = le_u16(input)?;
    let mut language_window = [0u16; 16];
    language_window.copy_from_slice(&window);
    Ok((
        input,
        HiiStringPackageHeader {
            header_size,
            string_info_offset,
            language_window,
            language_name_string_id,
        },
    ))
}

/// String information block type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HiiSibtType {
    End,
    StringScsu,
    StringScsuFont,
    StringsScsu,
    StringsScsuFont,
    StringUcs2,
    StringUcs2Font,
    StringsUcs2,
    StringsUcs2Font,
    Duplicate,
    Skip2,
    Skip1,
    Ext1,
    Ext2,
    Ext4,
    Unknown(u8),
}

impl From<u8> for HiiSibtType {
    fn from(tag: u8) -> Self {
        match tag {
            0x00 => HiiSibtType::End,
            0x10 => HiiSibtType::StringScsu,
            0x11 => HiiSibtType::StringScsuFont,
            0x12 => HiiSibtType::StringsScsu,
            0x13 => HiiSibtType::StringsScsuFont,
            0x14 => HiiSibtType::StringUcs2,
            0x15 => HiiSibtType::StringUcs2Font,
            0x16 => HiiSibtType::StringsUcs2,
            0x17 => HiiSibtType::StringsUcs2Font,
            0x20 => HiiSibtType::Duplicate,
            0x21 => HiiSibtType::Skip2,
            0x22 => HiiSibtType::Skip1,
            0x30 => HiiSibtType::Ext1,
            0x31 => HiiSibtType::Ext2,
            0x32 => HiiSibtType::Ext4,
            x => HiiSibtType::Unknown(x),
        }
    }
}
