//! Byte builders shared by the integration tests.
#![allow(dead_code)]

pub const STRINGS: u8 = 0x04;
pub const FORMS: u8 = 0x02;
pub const END: u8 = 0xDF;

/// Package header followed by `body`.
pub fn package(package_type: u8, body: &[u8]) -> Vec<u8> {
    let length = (body.len() + 4) as u32;
    let mut out = (length | (u32::from(package_type) << 24)).to_le_bytes().to_vec();
    out.extend_from_slice(body);
    out
}

/// One IFR record with the given payload.
pub fn opcode(tag: u8, scope: bool, payload: &[u8]) -> Vec<u8> {
    let length = payload.len() + 2;
    assert!(length <= 0x7F);
    let mut out = vec![tag, length as u8 | if scope { 0x80 } else { 0 }];
    out.extend_from_slice(payload);
    out
}

pub fn end() -> Vec<u8> {
    opcode(0x29, false, &[])
}

pub fn uint8(value: u8) -> Vec<u8> {
    opcode(0x42, false, &[value])
}

pub fn uint32(value: u32) -> Vec<u8> {
    opcode(0x44, false, &value.to_le_bytes())
}

/// FORM_SET with a zero guid, no class guids and its scope opened.
pub fn form_set(title: u16, help: u16) -> Vec<u8> {
    let mut payload = vec![0u8; 16];
    payload.extend_from_slice(&title.to_le_bytes());
    payload.extend_from_slice(&help.to_le_bytes());
    payload.push(0);
    opcode(0x0E, true, &payload)
}

/// A VALUE scope wrapping `tokens`, closed by END.
pub fn value_scope(tokens: &[Vec<u8>]) -> Vec<u8> {
    let mut out = opcode(0x5A, true, &[]);
    for token in tokens {
        out.extend_from_slice(token);
    }
    out.extend(end());
    out
}

pub fn ucs2(text: &str) -> Vec<u8> {
    let mut out = vec![0x14];
    out.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
    out.extend_from_slice(&[0, 0]);
    out
}

pub fn skip1(count: u8) -> Vec<u8> {
    vec![0x22, count]
}

/// A complete strings package: fixed header, language tag, `blocks`, END block.
pub fn strings_package(language: &str, blocks: &[Vec<u8>]) -> Vec<u8> {
    let info_offset = (46 + language.len() + 1) as u32;
    let mut body = info_offset.to_le_bytes().to_vec();
    body.extend_from_slice(&info_offset.to_le_bytes());
    body.extend_from_slice(&[0u8; 34]);
    body.extend_from_slice(language.as_bytes());
    body.push(0);
    for block in blocks {
        body.extend_from_slice(block);
    }
    body.push(0x00);
    package(STRINGS, &body)
}
