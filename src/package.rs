//! Top-level HII package iteration.

use log::debug;

use crate::config::DecodeOptions;
use crate::cursor::BinaryCursor;
use crate::error::{Component, DecodeError, Diagnostics, Result};
use crate::strings::{decode_string_package, StringsPackage};
use crate::tree::{OpcodeNode, OpcodeTreeDecoder};
use crate::uefi_parser::{
    hii_package_header, HiiPackageHeader, HiiPackageType, HII_PACKAGE_HEADER_SIZE,
};

/// A decoded forms package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormsPackage {
    /// Absolute offset of the package header.
    pub offset: usize,
    pub length: usize,
    pub roots: Vec<OpcodeNode>,
}

impl FormsPackage {
    /// Pre-order walk over every node of every root.
    pub fn nodes(&self) -> impl Iterator<Item = &OpcodeNode> {
        self.roots.iter().flat_map(OpcodeNode::walk)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Package {
    Strings(StringsPackage),
    Forms(FormsPackage),
    /// A package type this crate does not decode.
    Other {
        package_type: HiiPackageType,
        offset: usize,
        raw_length: usize,
    },
}

/// Iterates the packages of a buffer and dispatches each by type.
#[derive(Debug, Clone, Default)]
pub struct PackageListDecoder {
    tree: OpcodeTreeDecoder,
}

impl PackageListDecoder {
    pub fn new(options: &DecodeOptions) -> Self {
        Self {
            tree: OpcodeTreeDecoder::new(options),
        }
    }

    /// Decode every package in `bytes`.
    ///
    /// A package that fails to decode is reported and skipped. Only corrupt
    /// framing (a header that cannot be read, or a length that cannot be
    /// honored) ends the loop early.
    pub fn decode(&mut self, bytes: &[u8], diagnostics: &mut Diagnostics) -> Vec<Package> {
        self.decode_view(BinaryCursor::new(bytes), diagnostics)
    }

    /// Same as [`decode`](Self::decode) over a window of a larger buffer;
    /// reported offsets stay absolute.
    pub fn decode_view(
        &mut self,
        view: BinaryCursor,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Package> {
        let mut packages = Vec::new();
        let mut cursor = view;

        while !cursor.is_empty() {
            let offset = cursor.offset();
            let package = match next_package(&mut cursor) {
                Ok(x) => x,
                Err(e) => {
                    diagnostics.error(
                        Component::PackageList,
                        Some(offset),
                        format!("package list framing is corrupt: {}", e),
                    );
                    break;
                }
            };
            let (header, view) = package;
            debug!(
                "package {:?} at offset 0x{:X}, {} bytes",
                header.package_type, offset, header.length
            );

            match header.package_type {
                HiiPackageType::Strings => match decode_string_package(view, diagnostics) {
                    Ok(strings) => packages.push(Package::Strings(strings)),
                    Err(e) => diagnostics.error(
                        Component::StringPackage,
                        Some(offset),
                        format!("strings package abandoned: {}", e),
                    ),
                },
                HiiPackageType::Forms => match self.decode_forms(view, diagnostics) {
                    Ok(forms) => packages.push(Package::Forms(forms)),
                    Err(e) => diagnostics.error(
                        Component::OpcodeTree,
                        Some(offset),
                        format!("forms package abandoned: {}", e),
                    ),
                },
                HiiPackageType::End => {}
                other => {
                    diagnostics.warning(
                        Component::PackageList,
                        format!(
                            "unimplemented package type 0x{:02X} at offset 0x{:X}, skipped",
                            other.tag(),
                            offset
                        ),
                    );
                    packages.push(Package::Other {
                        package_type: other,
                        offset,
                        raw_length: view.len(),
                    });
                }
            }
        }
        packages
    }

    fn decode_forms(
        &mut self,
        package: BinaryCursor,
        diagnostics: &mut Diagnostics,
    ) -> Result<FormsPackage> {
        let roots = self
            .tree
            .decode(package.tail(HII_PACKAGE_HEADER_SIZE)?, diagnostics)?;
        Ok(FormsPackage {
            offset: package.offset(),
            length: package.len(),
            roots,
        })
    }
}

/// Read one package header and split off the package it frames.
fn next_package<'a>(cursor: &mut BinaryCursor<'a>) -> Result<(HiiPackageHeader, BinaryCursor<'a>)> {
    let offset = cursor.offset();
    let (_, header) =
        hii_package_header(cursor.as_slice()).map_err(|_| DecodeError::OutOfBounds {
            offset,
            requested: HII_PACKAGE_HEADER_SIZE,
            available: cursor.len(),
        })?;
    let length = header.length as usize;
    if length < HII_PACKAGE_HEADER_SIZE {
        return Err(DecodeError::InvalidLength {
            what: "package",
            offset,
            declared: length,
            minimum: HII_PACKAGE_HEADER_SIZE,
        });
    }
    if length > cursor.len() {
        return Err(DecodeError::LengthExceedsRemaining {
            what: "package",
            offset,
            declared: length,
            remaining: cursor.len(),
        });
    }
    Ok((header, cursor.take(length)?))
}

/// Decode a buffer of HII packages with default options.
pub fn decode_file(bytes: &[u8]) -> (Vec<Package>, Diagnostics) {
    decode_file_with(bytes, &DecodeOptions::default())
}

pub fn decode_file_with(bytes: &[u8], options: &DecodeOptions) -> (Vec<Package>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let packages = PackageListDecoder::new(options).decode(bytes, &mut diagnostics);
    (packages, diagnostics)
}
