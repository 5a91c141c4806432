//! Error and diagnostic types.
//!
//! Fatal conditions (anything that desynchronizes the byte stream) are
//! [`DecodeError`]s and abort the smallest enclosing unit, usually one
//! package. Everything recoverable is recorded as a [`Diagnostic`] in an
//! explicit [`Diagnostics`] collector that callers thread through decoding.

use std::fmt;

use log::{error, info, warn};
use thiserror::Error;

use crate::uefi_parser::IfrOpcode;

/// Conditions that abort the decode of the enclosing package.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A read or slice went past the end of the current view.
    #[error(
        "out of bounds at offset 0x{offset:X}: requested {requested} bytes, {available} available"
    )]
    OutOfBounds {
        offset: usize,
        requested: usize,
        available: usize,
    },

    /// No terminator was found before the view ended.
    #[error("unterminated {encoding} string starting at offset 0x{offset:X}")]
    UnterminatedString {
        offset: usize,
        encoding: &'static str,
    },

    /// A length field claims more bytes than are left.
    #[error("{what} at offset 0x{offset:X} declares {declared} bytes, only {remaining} remain")]
    LengthExceedsRemaining {
        what: &'static str,
        offset: usize,
        declared: usize,
        remaining: usize,
    },

    /// A length field is smaller than the structure it frames.
    #[error("{what} at offset 0x{offset:X} declares {declared} bytes, minimum is {minimum}")]
    InvalidLength {
        what: &'static str,
        offset: usize,
        declared: usize,
        minimum: usize,
    },

    /// A record is too short for the payload shape its opcode requires.
    #[error("{opcode} record at offset 0x{offset:X} is truncated ({length} bytes)")]
    TruncatedRecord {
        opcode: IfrOpcode,
        offset: usize,
        length: usize,
    },

    /// None of the known header variants of the opcode has this size.
    #[error("ambiguous header size: {opcode} record at offset 0x{offset:X} has length {length}")]
    AmbiguousHeaderSize {
        opcode: IfrOpcode,
        offset: usize,
        length: usize,
    },

    /// A string information block of unknown (and so unknown-length) type.
    #[error("unknown SIBT block type 0x{block_type:02X} at offset 0x{offset:X}")]
    UnknownSibtBlock { block_type: u8, offset: usize },

    /// An integer field wider than 8 bytes, or empty.
    #[error("unsupported field width {width} at offset 0x{offset:X}")]
    UnsupportedWidth { width: usize, offset: usize },

    /// More strings than a 16-bit id can number.
    #[error("string id overflows 0xFFFF at offset 0x{offset:X}")]
    StringIdOverflow { offset: usize },

    /// Scope nesting exceeded the configured maximum.
    #[error("scope nesting deeper than {max_depth} at offset 0x{offset:X}")]
    ScopeTooDeep { offset: usize, max_depth: usize },

    /// The payload ran out before an END closed an open scope.
    #[error("{opcode} scope opened at offset 0x{offset:X} is never closed")]
    UnterminatedScope { opcode: IfrOpcode, offset: usize },
}

/// A convenience `Result` type alias using [`DecodeError`].
pub type Result<T> = std::result::Result<T, DecodeError>;

/// How bad a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// The part of the decoder a diagnostic comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Cursor,
    PackageList,
    StringPackage,
    OpcodeTree,
    StringDatabase,
    LogicExpression,
}

/// One recorded condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub component: Component,
    pub message: String,
    /// Diagnostic id of the offending opcode node, if any.
    pub node_id: Option<u32>,
    /// Absolute byte offset in the decoded buffer, if known.
    pub offset: Option<usize>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {:?}: {}", self.severity, self.component, self.message)?;
        if let Some(id) = self.node_id {
            write!(f, " (node #{})", id)?;
        }
        if let Some(offset) = self.offset {
            write!(f, " at offset 0x{:X}", offset)?;
        }
        Ok(())
    }
}

/// Ordered collector of diagnostics.
///
/// Every pushed entry is also mirrored to the `log` facade so a host
/// application that installs a logger sees them as they happen.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => error!("{}", diagnostic),
            Severity::Warning => warn!("{}", diagnostic),
            Severity::Info => info!("{}", diagnostic),
        }
        self.entries.push(diagnostic);
    }

    pub fn info(&mut self, component: Component, message: impl Into<String>) {
        self.record(Severity::Info, component, message.into(), None, None);
    }

    pub fn warning(&mut self, component: Component, message: impl Into<String>) {
        self.record(Severity::Warning, component, message.into(), None, None);
    }

    /// Warning attached to one opcode node.
    pub fn node_warning(
        &mut self,
        component: Component,
        node_id: u32,
        offset: Option<usize>,
        message: impl Into<String>,
    ) {
        self.record(Severity::Warning, component, message.into(), Some(node_id), offset);
    }

    pub fn error(
        &mut self,
        component: Component,
        offset: Option<usize>,
        message: impl Into<String>,
    ) {
        self.record(Severity::Error, component, message.into(), None, offset);
    }

    fn record(
        &mut self,
        severity: Severity,
        component: Component,
        message: String,
        node_id: Option<u32>,
        offset: Option<usize>,
    ) {
        self.push(Diagnostic {
            severity,
            component,
            message,
            node_id,
            offset,
        });
    }

    /// Move every entry of `other` to the end of this collector.
    pub fn append(&mut self, other: &mut Diagnostics) {
        self.entries.append(&mut other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries with the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|d| d.severity == severity).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_keeps_order_and_counts_by_severity() {
        let mut diags = Diagnostics::new();
        diags.warning(Component::OpcodeTree, "first");
        diags.error(Component::PackageList, Some(0x10), "second");
        diags.node_warning(Component::LogicExpression, 7, None, "third");

        assert_eq!(diags.len(), 3);
        assert_eq!(diags.count(Severity::Warning), 2);
        assert_eq!(diags.count(Severity::Error), 1);

        let all = diags.into_vec();
        assert_eq!(all[0].message, "first");
        assert_eq!(all[1].offset, Some(0x10));
        assert_eq!(all[2].node_id, Some(7));
    }

    #[test]
    fn display_includes_node_and_offset() {
        let d = Diagnostic {
            severity: Severity::Warning,
            component: Component::OpcodeTree,
            message: "count mismatch".into(),
            node_id: Some(3),
            offset: Some(0x2A),
        };
        assert_eq!(
            d.to_string(),
            "[Warning] OpcodeTree: count mismatch (node #3) at offset 0x2A"
        );
    }
}
