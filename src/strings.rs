//! Strings packages and the per-language string database.

use std::collections::BTreeMap;

use log::{debug, trace};

use crate::cursor::BinaryCursor;
use crate::error::{Component, DecodeError, Diagnostics, Result};
use crate::package::Package;
use crate::uefi_parser::{
    hii_string_package_header, HiiSibtType, HII_PACKAGE_HEADER_SIZE,
    HII_STRING_PACKAGE_HEADER_SIZE,
};

/// Language tried when the preferred one lacks a string.
pub const FALLBACK_LANGUAGE: &str = "en-US";

/// An EXT1/EXT2/EXT4 block, kept uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SibtExtBlock {
    pub offset: usize,
    pub block_type: u8,
    pub data: Vec<u8>,
}

/// One decoded strings package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringsPackage {
    /// Absolute offset of the package header.
    pub offset: usize,
    pub length: usize,
    /// RFC 4646 language tag, e.g. "en-US".
    pub language: String,
    /// `(id, text)` in block order; ids are strictly increasing.
    pub entries: Vec<(u16, String)>,
    pub ext_blocks: Vec<SibtExtBlock>,
}

impl StringsPackage {
    pub fn get(&self, id: u16) -> Option<&str> {
        self.entries
            .binary_search_by_key(&id, |(k, _)| *k)
            .ok()
            .map(|i| self.entries[i].1.as_str())
    }
}

/// Running string id of a SIBT scan.
struct IdCounter {
    current: u32,
}

impl IdCounter {
    fn bump(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount);
    }

    /// Advance by one and return the id of the new string.
    fn next(&mut self, offset: usize) -> Result<u16> {
        self.bump(1);
        u16::try_from(self.current).map_err(|_| DecodeError::StringIdOverflow { offset })
    }
}

/// Decode a strings package. `package` covers the whole package, header included.
pub fn decode_string_package(
    package: BinaryCursor,
    diagnostics: &mut Diagnostics,
) -> Result<StringsPackage> {
    let fixed = package.subview(
        HII_PACKAGE_HEADER_SIZE,
        HII_STRING_PACKAGE_HEADER_SIZE - HII_PACKAGE_HEADER_SIZE,
    )?;
    let (_, header) = hii_string_package_header(fixed.as_slice()).map_err(|_| {
        DecodeError::OutOfBounds {
            offset: fixed.offset(),
            requested: HII_STRING_PACKAGE_HEADER_SIZE,
            available: package.len(),
        }
    })?;
    if (header.header_size as usize) < HII_STRING_PACKAGE_HEADER_SIZE {
        diagnostics.warning(
            Component::StringPackage,
            format!(
                "strings package at offset 0x{:X} declares header size {}",
                package.offset(),
                header.header_size
            ),
        );
    }

    let mut body = package.tail(HII_STRING_PACKAGE_HEADER_SIZE)?;
    let language = body.read_null_terminated_ascii()?;
    let info_start = body.offset() - package.offset();
    if header.string_info_offset as usize != info_start {
        diagnostics.warning(
            Component::StringPackage,
            format!(
                "strings package {}: string info offset 0x{:X}, blocks start at 0x{:X}",
                language, header.string_info_offset, info_start
            ),
        );
    }
    debug!(
        "strings package {} at offset 0x{:X}, {} bytes",
        language,
        package.offset(),
        package.len()
    );

    let mut result = StringsPackage {
        offset: package.offset(),
        length: package.len(),
        language,
        entries: Vec::new(),
        ext_blocks: Vec::new(),
    };
    decode_sibt_blocks(body, &mut result, diagnostics)?;
    Ok(result)
}

fn decode_sibt_blocks(
    mut blocks: BinaryCursor,
    package: &mut StringsPackage,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let mut counter = IdCounter { current: 0 };

    loop {
        let offset = blocks.offset();
        let block_type = blocks.read_u8(0)?;
        blocks.advance(1)?;
        trace!("SIBT 0x{:02X} at offset 0x{:X}", block_type, offset);

        match HiiSibtType::from(block_type) {
            // 0x00: End
            HiiSibtType::End => break,
            // 0x10: StringScsu
            HiiSibtType::StringScsu => {
                let text = blocks.read_null_terminated_ascii()?;
                package.entries.push((counter.next(offset)?, text));
            }
            // 0x11: StringScsuFont
            HiiSibtType::StringScsuFont => {
                blocks.advance(1)?;
                let text = blocks.read_null_terminated_ascii()?;
                package.entries.push((counter.next(offset)?, text));
            }
            // 0x12: StringsScsu
            HiiSibtType::StringsScsu => {
                let count = blocks.read_u16(0)?;
                blocks.advance(2)?;
                for _ in 0..count {
                    let text = blocks.read_null_terminated_ascii()?;
                    package.entries.push((counter.next(offset)?, text));
                }
            }
            // 0x13: StringsScsuFont
            HiiSibtType::StringsScsuFont => {
                let count = blocks.read_u16(1)?;
                blocks.advance(3)?;
                for _ in 0..count {
                    let text = blocks.read_null_terminated_ascii()?;
                    package.entries.push((counter.next(offset)?, text));
                }
            }
            // 0x14: StringUcs2
            HiiSibtType::StringUcs2 => {
                let id = counter.next(offset)?;
                let text = blocks.read_null_terminated_utf16()?;
                package.entries.push((id, text));
            }
            // 0x15: StringUcs2Font
            HiiSibtType::StringUcs2Font => {
                blocks.advance(1)?;
                let id = counter.next(offset)?;
                let text = blocks.read_null_terminated_utf16()?;
                package.entries.push((id, text));
            }
            // 0x16: StringsUcs2
            HiiSibtType::StringsUcs2 => {
                let count = blocks.read_u16(0)?;
                blocks.advance(2)?;
                for _ in 0..count {
                    let text = blocks.read_null_terminated_utf16()?;
                    package.entries.push((counter.next(offset)?, text));
                }
            }
            // 0x17: StringsUcs2Font
            HiiSibtType::StringsUcs2Font => {
                let count = blocks.read_u16(1)?;
                blocks.advance(3)?;
                for _ in 0..count {
                    let text = blocks.read_null_terminated_utf16()?;
                    package.entries.push((counter.next(offset)?, text));
                }
            }
            // 0x20: Duplicate
            HiiSibtType::Duplicate => {
                let source = blocks.read_u16(0)?;
                blocks.advance(2)?;
                let id = counter.next(offset)?;
                match package.get(source).map(str::to_owned) {
                    Some(text) => package.entries.push((id, text)),
                    None => diagnostics.warning(
                        Component::StringPackage,
                        format!(
                            "duplicate block at offset 0x{:X} refers to missing string {}",
                            offset, source
                        ),
                    ),
                }
            }
            // 0x21: Skip2
            HiiSibtType::Skip2 => {
                let count = blocks.read_u16(0)?;
                blocks.advance(2)?;
                counter.bump(u32::from(count));
            }
            // 0x22: Skip1
            HiiSibtType::Skip1 => {
                let count = blocks.read_u8(0)?;
                blocks.advance(1)?;
                counter.bump(u32::from(count));
            }
            // 0x30: Ext1, 0x31: Ext2, 0x32: Ext4
            ext @ (HiiSibtType::Ext1 | HiiSibtType::Ext2 | HiiSibtType::Ext4) => {
                let width = match ext {
                    HiiSibtType::Ext1 => 1,
                    HiiSibtType::Ext2 => 2,
                    _ => 4,
                };
                let subtype = blocks.read_u8(0)?;
                let declared = blocks.read_field(width, 1)? as usize;
                // Length covers the whole block, block type byte included
                let header = 2 + width;
                if declared < header {
                    return Err(DecodeError::InvalidLength {
                        what: "SIBT extended block",
                        offset,
                        declared,
                        minimum: header,
                    });
                }
                let remaining = blocks.len() + 1;
                if declared > remaining {
                    return Err(DecodeError::LengthExceedsRemaining {
                        what: "SIBT extended block",
                        offset,
                        declared,
                        remaining,
                    });
                }
                blocks.advance(header - 1)?;
                let data = blocks.take(declared - header)?;
                package.ext_blocks.push(SibtExtBlock {
                    offset,
                    block_type: subtype,
                    data: data.raw_bytes(),
                });
            }
            HiiSibtType::Unknown(block_type) => {
                return Err(DecodeError::UnknownSibtBlock { block_type, offset });
            }
        }
    }
    Ok(())
}

/// All decoded string tables of a file, keyed by language.
///
/// Built once, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringDatabase {
    tables: BTreeMap<String, Vec<(u16, String)>>,
}

impl StringDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_packages<'a, I>(packages: I) -> Self
    where
        I: IntoIterator<Item = &'a Package>,
    {
        let mut db = Self::new();
        for package in packages {
            if let Package::Strings(strings) = package {
                db.insert(strings);
            }
        }
        db
    }

    /// Merge a package into its language's table. An id that is already
    /// present keeps its first text.
    pub fn insert(&mut self, package: &StringsPackage) {
        let table = self.tables.entry(package.language.clone()).or_default();
        for (id, text) in &package.entries {
            if let Err(pos) = table.binary_search_by_key(id, |(k, _)| *k) {
                table.insert(pos, (*id, text.clone()));
            }
        }
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn table(&self, language: &str) -> Option<&[(u16, String)]> {
        self.tables.get(language).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(Vec::is_empty)
    }

    /// Exact lookup in one language, no fallback.
    pub fn get(&self, id: u16, language: &str) -> Option<&str> {
        let table = self.tables.get(language)?;
        table
            .binary_search_by_key(&id, |(k, _)| *k)
            .ok()
            .map(|i| table[i].1.as_str())
    }

    /// Text of `id`, trying `language` and then [`FALLBACK_LANGUAGE`].
    ///
    /// Id 0 is the empty string. A missing id yields `UNKNOWN_STRING_ID(<id>)`.
    pub fn resolve(&self, id: u16, language: &str) -> String {
        self.lookup(id, language)
            .map(str::to_owned)
            .unwrap_or_else(|| unknown_string(id))
    }

    /// Same as [`resolve`](Self::resolve), recording a warning for a missing id.
    pub fn resolve_with(&self, id: u16, language: &str, diagnostics: &mut Diagnostics) -> String {
        match self.lookup(id, language) {
            Some(text) => text.to_owned(),
            None => {
                diagnostics.warning(
                    Component::StringDatabase,
                    format!("string id {} not found for language {}", id, language),
                );
                unknown_string(id)
            }
        }
    }

    fn lookup(&self, id: u16, language: &str) -> Option<&str> {
        if id == 0 {
            return Some("");
        }
        self.get(id, language)
            .or_else(|| self.get(id, FALLBACK_LANGUAGE))
    }
}

fn unknown_string(id: u16) -> String {
    format!("UNKNOWN_STRING_ID({})", id)
}
