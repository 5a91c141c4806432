//! IFR opcode stream to scoped tree.
//!
//! A record with the scope bit set owns every following record, recursively,
//! until the END record that closes it. END is consumed, never stored.

use log::trace;

use crate::config::DecodeOptions;
use crate::cursor::BinaryCursor;
use crate::error::{Component, DecodeError, Diagnostics, Result};
use crate::uefi_parser::ifr::{parse_record, RecordError};
use crate::uefi_parser::{
    FieldValue, Fields, IfrExtra, IfrHeader, IfrOpcode, IFR_OPCODE_HEADER_SIZE,
};

/// One decoded IFR record and the records its scope owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeNode {
    pub opcode: IfrOpcode,
    pub header: IfrHeader,
    pub extra: Option<IfrExtra>,
    pub children: Vec<OpcodeNode>,
    pub has_own_scope: bool,
    /// Diagnostic id, unique within one decoded file.
    pub id: u32,
    /// Absolute offset of the opcode header.
    pub offset: usize,
    /// Total record length, opcode header included.
    pub length: usize,
}

impl OpcodeNode {
    /// Pre-order iterator over this node and everything below it.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    pub fn find_by_id(&self, id: u32) -> Option<&OpcodeNode> {
        self.walk().find(|node| node.id == id)
    }

    /// String ids referenced by this record (not its children).
    pub fn string_ids(&self) -> Vec<u16> {
        let mut ids: Vec<u16> = self
            .header
            .fields()
            .into_iter()
            .filter_map(|field| match field.value {
                FieldValue::StringId(id) => Some(id),
                _ => None,
            })
            .collect();
        if let Some(extra) = &self.extra {
            ids.extend(extra.string_ids());
        }
        ids
    }

    /// Leading children that form the postfix expression of a conditional
    /// or value-holding scope.
    pub fn expression_children(&self) -> &[OpcodeNode] {
        let count = self
            .children
            .iter()
            .take_while(|child| child.opcode.is_expression() || child.opcode == IfrOpcode::Value)
            .count();
        &self.children[..count]
    }
}

/// See [`OpcodeNode::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a OpcodeNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a OpcodeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Recursive-descent decoder. One instance numbers the nodes of a whole file.
#[derive(Debug, Clone)]
pub struct OpcodeTreeDecoder {
    next_id: u32,
    max_scope_depth: usize,
}

impl Default for OpcodeTreeDecoder {
    fn default() -> Self {
        Self::new(&DecodeOptions::default())
    }
}

impl OpcodeTreeDecoder {
    pub fn new(options: &DecodeOptions) -> Self {
        Self {
            next_id: 0,
            max_scope_depth: options.max_scope_depth,
        }
    }

    /// Decode a whole opcode stream into its top-level nodes.
    pub fn decode(
        &mut self,
        stream: BinaryCursor,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<OpcodeNode>> {
        let mut stream = stream;
        self.decode_scope(&mut stream, 0, None, diagnostics)
    }

    fn decode_scope(
        &mut self,
        stream: &mut BinaryCursor,
        depth: usize,
        owner: Option<(IfrOpcode, usize)>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<OpcodeNode>> {
        let mut nodes = Vec::new();
        loop {
            if stream.is_empty() {
                return match owner {
                    Some((opcode, offset)) => {
                        Err(DecodeError::UnterminatedScope { opcode, offset })
                    }
                    None => Ok(nodes),
                };
            }

            let offset = stream.offset();
            let opcode = IfrOpcode::from(stream.read_u8(0)?);
            let length_and_scope = stream.read_u8(1)?;
            let length = usize::from(BinaryCursor::read_bits(length_and_scope, 0x7F, 0));
            let scope = BinaryCursor::read_bits(length_and_scope, 0x01, 7) == 1;

            if length < IFR_OPCODE_HEADER_SIZE {
                return Err(DecodeError::InvalidLength {
                    what: "opcode record",
                    offset,
                    declared: length,
                    minimum: IFR_OPCODE_HEADER_SIZE,
                });
            }
            if length > stream.len() {
                return Err(DecodeError::LengthExceedsRemaining {
                    what: "opcode record",
                    offset,
                    declared: length,
                    remaining: stream.len(),
                });
            }
            let record = stream.take(length)?;
            trace!("{} at 0x{:X}, length {}, scope {}", opcode, offset, length, scope);

            if opcode == IfrOpcode::End {
                if owner.is_some() {
                    return Ok(nodes);
                }
                diagnostics.warning(
                    Component::OpcodeTree,
                    format!("END without an open scope at offset 0x{:X}", offset),
                );
                continue;
            }

            let id = self.next_id;
            self.next_id = self.next_id.wrapping_add(1);

            let payload = record.tail(IFR_OPCODE_HEADER_SIZE)?;
            let parsed = parse_record(opcode, length, payload.as_slice()).map_err(|e| match e {
                RecordError::Truncated => DecodeError::TruncatedRecord {
                    opcode,
                    offset,
                    length,
                },
                RecordError::AmbiguousSize => DecodeError::AmbiguousHeaderSize {
                    opcode,
                    offset,
                    length,
                },
            })?;
            for warning in parsed.warnings {
                diagnostics.node_warning(Component::OpcodeTree, id, Some(offset), warning);
            }
            if let IfrOpcode::Unknown(tag) = opcode {
                diagnostics.node_warning(
                    Component::OpcodeTree,
                    id,
                    Some(offset),
                    format!("unimplemented opcode 0x{:02X}, decoded header only", tag),
                );
            }
            if opcode == IfrOpcode::FormSet && depth > 0 {
                diagnostics.node_warning(
                    Component::OpcodeTree,
                    id,
                    Some(offset),
                    "FormSet inside another scope",
                );
            }

            let children = if scope {
                if depth >= self.max_scope_depth {
                    return Err(DecodeError::ScopeTooDeep {
                        offset,
                        max_depth: self.max_scope_depth,
                    });
                }
                self.decode_scope(stream, depth + 1, Some((opcode, offset)), diagnostics)?
            } else {
                Vec::new()
            };

            nodes.push(OpcodeNode {
                opcode,
                header: parsed.header,
                extra: parsed.extra,
                children,
                has_own_scope: scope,
                id,
                offset,
                length,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Severity;

    fn decode(bytes: &[u8]) -> (Result<Vec<OpcodeNode>>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let result =
            OpcodeTreeDecoder::default().decode(BinaryCursor::new(bytes), &mut diagnostics);
        (result, diagnostics)
    }

    #[test]
    fn scope_owns_records_until_end() {
        // SUPPRESS_IF { TRUE } END, FALSE
        let bytes = [0x0A, 0x82, 0x46, 0x02, 0x29, 0x02, 0x47, 0x02];
        let (result, diagnostics) = decode(&bytes);
        let nodes = result.unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].opcode, IfrOpcode::SuppressIf);
        assert!(nodes[0].has_own_scope);
        assert_eq!(nodes[0].children.len(), 1);
        assert_eq!(nodes[0].children[0].opcode, IfrOpcode::True);
        assert_eq!(nodes[1].opcode, IfrOpcode::False);
        assert_eq!(nodes[1].offset, 6);
    }

    #[test]
    fn ids_are_assigned_in_construction_order() {
        let bytes = [0x0A, 0x82, 0x46, 0x02, 0x29, 0x02, 0x47, 0x02];
        let nodes = decode(&bytes).0.unwrap();
        let ids: Vec<u32> = nodes.iter().flat_map(|n| n.walk()).map(|n| n.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(nodes[0].find_by_id(1).map(|n| n.opcode), Some(IfrOpcode::True));
        assert!(nodes[0].find_by_id(2).is_none());
    }

    #[test]
    fn open_scope_at_end_of_stream_is_fatal() {
        let (result, _) = decode(&[0x0A, 0x82, 0x46, 0x02]);
        assert!(matches!(
            result,
            Err(DecodeError::UnterminatedScope {
                opcode: IfrOpcode::SuppressIf,
                offset: 0
            })
        ));
    }

    #[test]
    fn overlong_record_is_fatal() {
        let (result, _) = decode(&[0x46, 0x02, 0x01, 0x10, 0x00]);
        assert!(matches!(
            result,
            Err(DecodeError::LengthExceedsRemaining { offset: 2, .. })
        ));
        let (result, _) = decode(&[0x46, 0x01]);
        assert!(matches!(result, Err(DecodeError::InvalidLength { .. })));
    }

    #[test]
    fn unknown_opcode_keeps_stream_in_sync() {
        let (result, diagnostics) = decode(&[0xA0, 0x04, 0xDE, 0xAD, 0x53, 0x02]);
        let nodes = result.unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].opcode, IfrOpcode::Unknown(0xA0));
        assert_eq!(nodes[1].opcode, IfrOpcode::One);
        assert_eq!(diagnostics.count(Severity::Warning), 1);
        assert_eq!(diagnostics.iter().next().and_then(|d| d.node_id), Some(0));
    }

    #[test]
    fn stray_end_is_a_warning() {
        let (result, diagnostics) = decode(&[0x29, 0x02, 0x53, 0x02]);
        assert_eq!(result.unwrap().len(), 1);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut decoder = OpcodeTreeDecoder::new(&DecodeOptions { max_scope_depth: 1 });
        let bytes = [0x0A, 0x82, 0x0A, 0x82, 0x29, 0x02, 0x29, 0x02];
        let mut diagnostics = Diagnostics::new();
        let result = decoder.decode(BinaryCursor::new(&bytes), &mut diagnostics);
        assert!(matches!(result, Err(DecodeError::ScopeTooDeep { offset: 2, .. })));
    }

    #[test]
    fn string_ids_cover_header_and_extra() {
        // ONE_OF_OPTION: option 0x20, flags 0, type string, value 0x21
        let bytes = [0x09, 0x08, 0x20, 0x00, 0x00, 0x07, 0x21, 0x00];
        let nodes = decode(&bytes).0.unwrap();
        assert_eq!(nodes[0].string_ids(), vec![0x20, 0x21]);
    }

    #[test]
    fn expression_children_stop_at_statements() {
        // SUPPRESS_IF { TRUE, TEXT(...) } END
        let bytes = [
            0x0A, 0x82, 0x46, 0x02, 0x03, 0x08, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x29, 0x02,
        ];
        let nodes = decode(&bytes).0.unwrap();
        let expression = nodes[0].expression_children();
        assert_eq!(expression.len(), 1);
        assert_eq!(expression[0].opcode, IfrOpcode::True);
        assert_eq!(nodes[0].children.len(), 2);
        assert_eq!(nodes[0].children[1].string_ids(), vec![1, 2, 3]);
    }
}
