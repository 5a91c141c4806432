//! Declarative per-struct field tables.
//!
//! Each header struct lists its printable fields once with [`field_table!`];
//! consumers walk the resulting [`Field`]s instead of matching every struct.

use std::fmt;

use super::Guid;

/// A field value tagged with its wire width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    /// Index into the string database.
    StringId(u16),
    Guid(Guid),
}

impl FieldValue {
    /// Width of the field on the wire, in bytes.
    pub fn width(&self) -> usize {
        match self {
            FieldValue::U8(_) => 1,
            FieldValue::U16(_) | FieldValue::StringId(_) => 2,
            FieldValue::U32(_) => 4,
            FieldValue::U64(_) => 8,
            FieldValue::Guid(_) => 16,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::U8(x) => write!(f, "0x{:X}", x),
            FieldValue::U16(x) | FieldValue::StringId(x) => write!(f, "0x{:X}", x),
            FieldValue::U32(x) => write!(f, "0x{:X}", x),
            FieldValue::U64(x) => write!(f, "0x{:X}", x),
            FieldValue::Guid(g) => write!(f, "{}", g),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub value: FieldValue,
}

impl Field {
    pub fn new(name: &'static str, value: FieldValue) -> Self {
        Self { name, value }
    }
}

/// Structures that can list their printable fields.
pub trait Fields {
    fn fields(&self) -> Vec<Field>;
}

/// Implement [`Fields`] from a table of `member: Kind = "Name"` entries.
///
/// An optional `: base` after the type name prepends the fields of a nested
/// common header.
macro_rules! field_table {
    ($ty:ident $(: $base:ident)? { $($field:ident: $kind:ident = $name:literal),* $(,)? }) => {
        impl $crate::uefi_parser::fields::Fields for $ty {
            fn fields(&self) -> Vec<$crate::uefi_parser::fields::Field> {
                #[allow(unused_mut)]
                let mut fields = Vec::new();
                $(fields.extend($crate::uefi_parser::fields::Fields::fields(&self.$base));)?
                $(fields.push($crate::uefi_parser::fields::Field::new(
                    $name,
                    $crate::uefi_parser::fields::FieldValue::$kind(self.$field),
                ));)*
                fields
            }
        }
    };
}

pub(crate) use field_table;
