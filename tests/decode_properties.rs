//! Property-based tests for the decoders.
//!
//! - Header-only records are framed by their declared length alone
//! - String ids advance by one per string and by the count of a skip
//! - Arbitrary bytes never panic any public entry point

mod common;

use common::*;
use hii_ifr_decoder::{
    decode_file, extract_uefi_ifr, find_uefi_packages, render_listing, Diagnostics,
    ListingOptions, Package, StringDatabase,
};
use proptest::prelude::*;

// Opcodes whose records carry nothing past the opcode header
fn header_only_tag() -> impl Strategy<Value = u8> {
    prop::sample::select(vec![
        0x15, 0x16, 0x17, 0x2F, 0x30, 0x33, 0x35, 0x3A, 0x3C, 0x46, 0x47, 0x52, 0x53, 0x54, 0x55,
        0x58,
    ])
}

fn record_strategy() -> impl Strategy<Value = (u8, Vec<u8>)> {
    (header_only_tag(), prop::collection::vec(any::<u8>(), 0..30))
}

#[test]
fn prop_header_only_records_keep_framing() {
    proptest!(|(records in prop::collection::vec(record_strategy(), 1..20))| {
        let mut stream = Vec::new();
        for (tag, payload) in &records {
            stream.extend(opcode(*tag, false, payload));
        }
        let (packages, diagnostics) = decode_file(&package(FORMS, &stream));
        prop_assert!(diagnostics.is_empty());

        let roots = match &packages[..] {
            [Package::Forms(forms)] => &forms.roots,
            other => return Err(TestCaseError::fail(format!("{:?}", other))),
        };
        prop_assert_eq!(roots.len(), records.len());
        let mut offset = 4;
        for (node, (_, payload)) in roots.iter().zip(&records) {
            prop_assert_eq!(node.offset, offset);
            prop_assert_eq!(node.length, payload.len() + 2);
            prop_assert!(node.children.is_empty());
            offset += node.length;
        }
    });
}

#[test]
fn prop_string_ids_follow_skips() {
    proptest!(|(blocks in prop::collection::vec(prop::option::of(1u8..=20), 1..30))| {
        let mut encoded = Vec::new();
        let mut expected = Vec::new();
        let mut next = 1u16;
        for (i, block) in blocks.iter().enumerate() {
            match block {
                Some(skip) => {
                    encoded.push(skip1(*skip));
                    next += u16::from(*skip);
                }
                None => {
                    let text = format!("S{}", i);
                    encoded.push(ucs2(&text));
                    expected.push((next, text));
                    next += 1;
                }
            }
        }
        let (packages, diagnostics) = decode_file(&strings_package("en-US", &encoded));
        prop_assert!(diagnostics.is_empty());
        match &packages[..] {
            [Package::Strings(strings)] => prop_assert_eq!(&strings.entries, &expected),
            other => return Err(TestCaseError::fail(format!("{:?}", other))),
        }
    });
}

#[test]
fn prop_arbitrary_bytes_never_panic() {
    proptest!(|(bytes in prop::collection::vec(any::<u8>(), 0..512))| {
        let (packages, mut diagnostics) = decode_file(&bytes);
        let db = StringDatabase::from_packages(&packages);
        let _ = render_listing(&packages, &db, &ListingOptions::default(), &mut diagnostics);

        let (strings, forms) = find_uefi_packages(&bytes);
        if let (Some(s), Some(f)) = (strings.first(), forms.first()) {
            let _ = extract_uefi_ifr(&bytes, f, s, true, &mut Diagnostics::new());
        }
    });
}

#[test]
fn prop_framed_garbage_never_panics() {
    proptest!(|(package_type in prop::sample::select(vec![STRINGS, FORMS]),
                body in prop::collection::vec(any::<u8>(), 0..256))| {
        let bytes = package(package_type, &body);
        let (packages, mut diagnostics) = decode_file(&bytes);
        let db = StringDatabase::from_packages(&packages);
        let _ = render_listing(&packages, &db, &ListingOptions::default(), &mut diagnostics);
    });
}
