//! HII IFR decoder library.
//!
//! Decodes UEFI HII package lists: string tables, IFR opcode trees and the
//! postfix logic expressions that guard form statements. Decoding never
//! aborts on malformed input; problems are reported through [`Diagnostics`].
//!
//! ```no_run
//! let bytes = std::fs::read("Setup.hpk").unwrap();
//! let (packages, diagnostics) = hii_ifr_decoder::decode_file(&bytes);
//! let db = hii_ifr_decoder::StringDatabase::from_packages(&packages);
//! let mut diagnostics = diagnostics;
//! let text = hii_ifr_decoder::render_listing(
//!     &packages,
//!     &db,
//!     &Default::default(),
//!     &mut diagnostics,
//! );
//! print!("{}", text);
//! ```

// Parser
pub mod cursor;
pub mod error;
pub mod uefi_parser;

// Decoders
pub mod logic;
pub mod package;
pub mod strings;
pub mod tree;

// Main
pub mod config;
pub mod listing;
pub mod scan;

// Python
#[cfg(feature = "python")]
mod python;

pub use config::{DecodeOptions, ListingOptions};
pub use cursor::BinaryCursor;
pub use error::{Component, DecodeError, Diagnostic, Diagnostics, Severity};
pub use listing::render_listing;
pub use logic::{reconstruct_logic_expression, LogicExpressionReconstructor};
pub use package::{decode_file, decode_file_with, FormsPackage, Package, PackageListDecoder};
pub use scan::{extract_uefi_ifr, find_uefi_packages, FormPackageInfo, StringPackageInfo};
pub use strings::{StringDatabase, StringsPackage};
pub use tree::{OpcodeNode, OpcodeTreeDecoder};
