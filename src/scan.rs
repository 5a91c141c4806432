//! Search for HII packages inside arbitrary binaries.
//!
//! Firmware drivers embed their strings and forms packages somewhere in the
//! image without any index, so every offset is tried as a package header.
//! A candidate is accepted only if it decodes completely.

use std::collections::BTreeSet;

use log::debug;

use crate::config::ListingOptions;
use crate::cursor::BinaryCursor;
use crate::error::{Diagnostics, Result};
use crate::listing::render_forms_package;
use crate::package::{FormsPackage, Package, PackageListDecoder};
use crate::strings::{decode_string_package, StringDatabase, StringsPackage};
use crate::tree::OpcodeTreeDecoder;
use crate::uefi_parser::{
    hii_package_header, HiiPackageType, IfrOpcode, HII_PACKAGE_HEADER_SIZE,
    HII_STRING_PACKAGE_HEADER_SIZE,
};

/// A strings package found in a binary.
#[cfg_attr(feature = "python", pyo3::pyclass(get_all))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringPackageInfo {
    /// Byte offset in the original blob.
    pub offset: usize,
    /// Length in bytes.
    pub length: usize,
    /// RFC 4646 language tag (e.g. "en-US").
    pub language: String,
    pub string_count: usize,
}

/// A forms package found in a binary.
#[cfg_attr(feature = "python", pyo3::pyclass(get_all))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPackageInfo {
    /// Byte offset in the original blob.
    pub offset: usize,
    /// Length in bytes.
    pub length: usize,
    /// Number of unique strings used.
    pub used_strings: usize,
    /// Minimum StringId referenced.
    pub min_string_id: u16,
    /// Maximum StringId referenced.
    pub max_string_id: u16,
}

/// Scan `data` for all UEFI HII strings and forms packages.
/// Returns `(string_packages, form_packages)`.
pub fn find_uefi_packages(data: &[u8]) -> (Vec<StringPackageInfo>, Vec<FormPackageInfo>) {
    let mut strings = Vec::new();
    let mut i = 0;
    while i < data.len() {
        match string_package_at(data, i) {
            Some(info) => {
                i += info.length;
                strings.push(info);
            }
            None => i += 1,
        }
    }

    // Forms cannot be shown without strings
    if strings.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let mut forms = Vec::new();
    i = 0;
    while i < data.len() {
        match form_package_at(data, i) {
            Some(info) => {
                i += info.length;
                forms.push(info);
            }
            None => i += 1,
        }
    }

    if forms.is_empty() {
        return (Vec::new(), Vec::new());
    }
    debug!(
        "found {} strings and {} forms packages",
        strings.len(),
        forms.len()
    );
    (strings, forms)
}

/// Header type and length of a package candidate at `offset`, if it fits.
fn candidate(
    data: &[u8],
    offset: usize,
    expected: HiiPackageType,
    minimum: usize,
) -> Option<BinaryCursor> {
    let (_, header) = hii_package_header(data.get(offset..)?).ok()?;
    let length = header.length as usize;
    if header.package_type != expected || length < minimum {
        return None;
    }
    BinaryCursor::new(data).subview(offset, length).ok()
}

fn decode_strings(view: BinaryCursor) -> Result<StringsPackage> {
    decode_string_package(view, &mut Diagnostics::new())
}

fn string_package_at(data: &[u8], offset: usize) -> Option<StringPackageInfo> {
    let view = candidate(data, offset, HiiPackageType::Strings, HII_STRING_PACKAGE_HEADER_SIZE)?;
    let header_size = view.read_u32(HII_PACKAGE_HEADER_SIZE).ok()? as usize;
    if header_size < HII_STRING_PACKAGE_HEADER_SIZE || header_size > view.len() {
        return None;
    }
    let strings = decode_strings(view).ok()?;
    Some(StringPackageInfo {
        offset,
        length: view.len(),
        language: strings.language,
        string_count: strings.entries.len(),
    })
}

fn form_package_at(data: &[u8], offset: usize) -> Option<FormPackageInfo> {
    let view = candidate(data, offset, HiiPackageType::Forms, HII_PACKAGE_HEADER_SIZE + 2)?;
    // The stream must open with a FormSet scope
    let opcode = IfrOpcode::from(view.read_u8(HII_PACKAGE_HEADER_SIZE).ok()?);
    let length_and_scope = view.read_u8(HII_PACKAGE_HEADER_SIZE + 1).ok()?;
    if opcode != IfrOpcode::FormSet || BinaryCursor::read_bits(length_and_scope, 0x01, 7) == 0 {
        return None;
    }
    let roots = OpcodeTreeDecoder::default()
        .decode(view.tail(HII_PACKAGE_HEADER_SIZE).ok()?, &mut Diagnostics::new())
        .ok()?;
    let forms = FormsPackage {
        offset,
        length: view.len(),
        roots,
    };

    // Find min and max StringId, and the number of unique ones
    let string_ids: BTreeSet<u16> = forms
        .nodes()
        .flat_map(|node| node.string_ids())
        .filter(|&id| id != 0)
        .collect();
    let min_string_id = *string_ids.iter().next()?;
    let max_string_id = *string_ids.iter().next_back()?;
    Some(FormPackageInfo {
        offset,
        length: forms.length,
        used_strings: string_ids.len(),
        min_string_id,
        max_string_id,
    })
}

/// Extract the IFR text for one found forms package, resolving strings
/// through one found strings package.
/// If `verbose` is `true`, prepends each opcode with its byte offset.
pub fn extract_uefi_ifr(
    data: &[u8],
    form: &FormPackageInfo,
    strings: &StringPackageInfo,
    verbose: bool,
    diagnostics: &mut Diagnostics,
) -> String {
    let mut db = StringDatabase::new();
    let mut decoder = PackageListDecoder::default();
    if let Ok(view) = BinaryCursor::new(data).subview(strings.offset, strings.length) {
        for package in decoder.decode_view(view, diagnostics) {
            if let Package::Strings(package) = package {
                db.insert(&package);
            }
        }
    }

    let options = ListingOptions {
        language: strings.language.clone(),
        verbose,
    };
    let mut text = format!(
        "Program version: {}, Extraction mode: UEFI\n",
        env!("CARGO_PKG_VERSION")
    );
    if let Ok(view) = BinaryCursor::new(data).subview(form.offset, form.length) {
        for package in decoder.decode_view(view, diagnostics) {
            if let Package::Forms(forms) = package {
                text.push_str(&render_forms_package(&forms, &db, &options, diagnostics));
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings_package() -> Vec<u8> {
        let mut blocks = vec![0x14];
        blocks.extend("Main".encode_utf16().flat_map(u16::to_le_bytes));
        blocks.extend_from_slice(&[0, 0, 0x00]);
        let info_offset = (HII_STRING_PACKAGE_HEADER_SIZE + 6) as u32;
        let total = info_offset as usize + blocks.len();
        let mut out = ((total as u32) | (0x04 << 24)).to_le_bytes().to_vec();
        out.extend_from_slice(&info_offset.to_le_bytes());
        out.extend_from_slice(&info_offset.to_le_bytes());
        out.extend_from_slice(&[0u8; 34]);
        out.extend_from_slice(b"en-US\0");
        out.extend(blocks);
        out
    }

    fn forms_package() -> Vec<u8> {
        // FORM_SET(guid 0, title 1, help 0, no class guids) { } END
        let mut stream = vec![0x0E, 0x97];
        stream.extend_from_slice(&[0u8; 16]);
        stream.extend_from_slice(&[0x01, 0x00, 0x00, 0x00, 0x00]);
        stream.extend_from_slice(&[0x29, 0x02]);
        let mut out = (((stream.len() + 4) as u32) | (0x02 << 24)).to_le_bytes().to_vec();
        out.extend(stream);
        out
    }

    fn image() -> Vec<u8> {
        let mut data = vec![0xCC; 7];
        data.extend(strings_package());
        data.extend_from_slice(&[0x90; 3]);
        data.extend(forms_package());
        data.extend_from_slice(&[0x00; 5]);
        data
    }

    #[test]
    fn finds_packages_at_any_offset() {
        let data = image();
        let (strings, forms) = find_uefi_packages(&data);
        assert_eq!(strings.len(), 1);
        assert_eq!(strings[0].offset, 7);
        assert_eq!(strings[0].language, "en-US");
        assert_eq!(strings[0].string_count, 1);

        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].offset, 7 + strings[0].length + 3);
        assert_eq!(forms[0].used_strings, 1);
        assert_eq!(forms[0].min_string_id, 1);
        assert_eq!(forms[0].max_string_id, 1);
    }

    #[test]
    fn no_strings_means_no_forms() {
        let mut data = vec![0xCC; 3];
        data.extend(forms_package());
        assert_eq!(find_uefi_packages(&data), (Vec::new(), Vec::new()));
    }

    #[test]
    fn extraction_resolves_found_strings() {
        let data = image();
        let (strings, forms) = find_uefi_packages(&data);
        let text = extract_uefi_ifr(&data, &forms[0], &strings[0], true, &mut Diagnostics::new());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with(&format!("0x{:X}: FormSet Guid: ", forms[0].offset + 4)));
        assert!(lines[1].contains("Title: \"Main\""), "{}", lines[1]);
    }
}
