//! Postfix IFR logic to infix text.
//!
//! The reconstructor walks expression opcodes depth first, left to right,
//! with every node handled before its own scope children. Each opcode pops
//! its operands from a stack of already-rendered text and pushes one string.
//! Nothing is evaluated; the output is purely descriptive.
//!
//! Binary operators come in two conventions. After popping `x` (top) and
//! then `y`:
//!
//! * comparison and logical operators push `(x OP y)`,
//! * arithmetic and shift operators push `(y OP x)`.
//!
//! Malformed input never fails. Underflow yields `EMPTYSTACK`, a final stack
//! that does not hold exactly one value yields `INVALIDSTACK(...)`, and every
//! such case is recorded in the diagnostics.

use log::trace;

use crate::error::{Component, Diagnostics};
use crate::strings::StringDatabase;
use crate::tree::OpcodeNode;
use crate::uefi_parser::{IfrExtra, IfrHeader, IfrOpcode};

const EMPTY_STACK: &str = "EMPTYSTACK";

/// Rendered operands of one reconstruction call.
#[derive(Debug, Default)]
struct LogicStack {
    items: Vec<String>,
}

impl LogicStack {
    fn push(&mut self, text: impl Into<String>) {
        self.items.push(text.into());
    }

    fn pop(&mut self, node: &OpcodeNode, diagnostics: &mut Diagnostics) -> String {
        match self.items.pop() {
            Some(text) => text,
            None => {
                diagnostics.node_warning(
                    Component::LogicExpression,
                    node.id,
                    Some(node.offset),
                    format!("{} pops an empty logic stack", node.opcode),
                );
                EMPTY_STACK.to_string()
            }
        }
    }

    fn finish(mut self, root: &OpcodeNode, diagnostics: &mut Diagnostics) -> String {
        if self.items.len() == 1 {
            if let Some(result) = self.items.pop() {
                return result;
            }
        }
        diagnostics.node_warning(
            Component::LogicExpression,
            root.id,
            Some(root.offset),
            format!("logic stack holds {} values at the end", self.items.len()),
        );
        format!("INVALIDSTACK({})", self.items.join(","))
    }
}

/// Postfix-to-infix decompiler bound to one string database and language.
#[derive(Debug, Clone, Copy)]
pub struct LogicExpressionReconstructor<'a> {
    db: &'a StringDatabase,
    language: &'a str,
}

impl<'a> LogicExpressionReconstructor<'a> {
    pub fn new(db: &'a StringDatabase, language: &'a str) -> Self {
        Self { db, language }
    }

    /// Reconstruct the expression rooted at `node`.
    ///
    /// A conditional or value-holding opcode (SUPPRESS_IF, RULE, VALUE, ...)
    /// yields the expression that leads its scope. Any other node is itself
    /// the first token, followed by its scope children.
    pub fn reconstruct(&self, node: &OpcodeNode, diagnostics: &mut Diagnostics) -> String {
        if node.opcode.holds_expression() {
            return self.reconstruct_scope(node, diagnostics);
        }
        let mut stack = LogicStack::default();
        self.feed(node, &mut stack, diagnostics);
        stack.finish(node, diagnostics)
    }

    /// Reconstruct the leading expression of a conditional or value-holding
    /// scope. Problems are reported against `container`.
    pub fn reconstruct_scope(
        &self,
        container: &OpcodeNode,
        diagnostics: &mut Diagnostics,
    ) -> String {
        let mut stack = LogicStack::default();
        for token in container.expression_children() {
            self.feed(token, &mut stack, diagnostics);
        }
        stack.finish(container, diagnostics)
    }

    fn feed(&self, node: &OpcodeNode, stack: &mut LogicStack, diagnostics: &mut Diagnostics) {
        trace!("logic token {} (node #{})", node.opcode, node.id);
        if node.opcode == IfrOpcode::Map {
            self.map(node, stack, diagnostics);
            return;
        }
        self.apply(node, stack, diagnostics);
        for child in &node.children {
            self.feed(child, stack, diagnostics);
        }
    }

    fn apply(&self, node: &OpcodeNode, stack: &mut LogicStack, diagnostics: &mut Diagnostics) {
        use IfrOpcode as Op;

        match node.opcode {
            Op::Value | Op::End => {}

            // Nullary
            Op::True => stack.push("TRUE"),
            Op::False => stack.push("FALSE"),
            Op::Zero => stack.push("0"),
            Op::One => stack.push("1"),
            Op::Ones => stack.push("0xFFFFFFFFFFFFFFFF"),
            Op::Undefined => stack.push("UNDEFINED"),
            Op::Version => stack.push("GetVersion()"),
            Op::This => stack.push("THIS"),
            Op::Uint8
            | Op::Uint16
            | Op::Uint32
            | Op::Uint64
            | Op::RuleRef
            | Op::QuestionRef1
            | Op::StringRef1
            | Op::Get
            | Op::Security
            | Op::EqIdVal
            | Op::EqIdId
            | Op::EqIdValList => {
                let text = self
                    .nullary(node, diagnostics)
                    .unwrap_or_else(|| invalid_parameters(node, None));
                stack.push(text);
            }

            // Unary
            Op::Not => {
                let x = stack.pop(node, diagnostics);
                stack.push(format!("!{}", x));
            }
            Op::BitwiseNot => {
                let x = stack.pop(node, diagnostics);
                stack.push(format!("~{}", x));
            }
            Op::Length | Op::ToBoolean | Op::ToUint | Op::ToUpper | Op::ToLower => {
                let x = stack.pop(node, diagnostics);
                stack.push(format!("{:?}({})", node.opcode, x));
            }
            Op::ToString => {
                let x = stack.pop(node, diagnostics);
                let text = match node.header {
                    IfrHeader::ToString(h) => {
                        format!("ToString({}, Format = 0x{:02X})", x, h.format)
                    }
                    _ => invalid_parameters(node, Some(&x)),
                };
                stack.push(text);
            }
            Op::QuestionRef2 => {
                let x = stack.pop(node, diagnostics);
                stack.push(format!("QuestionValue(Id = ({}))", x));
            }
            Op::QuestionRef3 => {
                let x = stack.pop(node, diagnostics);
                let mut text = format!("QuestionValue(Id = ({})", x);
                if let IfrHeader::QuestionRef3(h) = node.header {
                    if let Some(id) = h.device_path_string_id {
                        text.push_str(&format!(", DevicePath = {}", self.string(id, diagnostics)));
                    }
                    if let Some(guid) = h.guid {
                        text.push_str(&format!(", Guid = {}", guid));
                    }
                }
                text.push(')');
                stack.push(text);
            }
            Op::Set => {
                let x = stack.pop(node, diagnostics);
                let text = match node.header {
                    IfrHeader::Set(h) => format!(
                        "Set(VarStoreId = 0x{:04X}, VarStoreInfo = 0x{:04X}, \
                         VarStoreType = 0x{:02X}, Value = {})",
                        h.var_store_id, h.var_store_info, h.var_store_type, x
                    ),
                    _ => invalid_parameters(node, Some(&x)),
                };
                stack.push(text);
            }
            Op::StringRef2 => {
                let x = stack.pop(node, diagnostics);
                let text = match parse_integer(&x) {
                    Some(id) => self.string(id, diagnostics),
                    None => format!("GetString(Id = ({}))", x),
                };
                stack.push(text);
            }

            // Binary, (x OP y)
            Op::And
            | Op::Or
            | Op::BitwiseAnd
            | Op::BitwiseOr
            | Op::Equal
            | Op::NotEqual
            | Op::GreaterThan
            | Op::GreaterEqual
            | Op::LessThan
            | Op::LessEqual => {
                let x = stack.pop(node, diagnostics);
                let y = stack.pop(node, diagnostics);
                stack.push(format!("({} {} {})", x, operator(node.opcode), y));
            }

            // Binary, (y OP x)
            Op::Add
            | Op::Subtract
            | Op::Multiply
            | Op::Divide
            | Op::Modulo
            | Op::ShiftLeft
            | Op::ShiftRight => {
                let x = stack.pop(node, diagnostics);
                let y = stack.pop(node, diagnostics);
                stack.push(format!("({} {} {})", y, operator(node.opcode), x));
            }

            Op::Catenate => {
                let x = stack.pop(node, diagnostics);
                let y = stack.pop(node, diagnostics);
                stack.push(format!("Catenate({}, {})", y, x));
            }
            Op::Match => {
                let x = stack.pop(node, diagnostics);
                let y = stack.pop(node, diagnostics);
                stack.push(format!("Match(String = {}, Pattern = {})", x, y));
            }
            Op::Match2 => {
                let x = stack.pop(node, diagnostics);
                let y = stack.pop(node, diagnostics);
                let text = match node.header {
                    IfrHeader::Match2(h) => format!(
                        "Match2(String = {}, Pattern = {}, SyntaxType = {})",
                        x, y, h.guid
                    ),
                    _ => invalid_parameters(node, Some(&x)),
                };
                stack.push(text);
            }

            // Ternary
            Op::Conditional => {
                let when_true = stack.pop(node, diagnostics);
                let when_false = stack.pop(node, diagnostics);
                let condition = stack.pop(node, diagnostics);
                stack.push(format!("({} ? {} : {})", condition, when_true, when_false));
            }
            Op::Find => {
                let (first, second, third) = pop3(node, stack, diagnostics);
                let text = match node.header {
                    IfrHeader::Find(h) => format!(
                        "Find(String = {}, Substring = {}, Start = {}, Format = 0x{:02X})",
                        first, second, third, h.format
                    ),
                    _ => invalid_parameters(node, Some(&first)),
                };
                stack.push(text);
            }
            Op::Mid => {
                let (first, second, third) = pop3(node, stack, diagnostics);
                stack.push(format!(
                    "Mid(String = {}, Start = {}, Length = {})",
                    first, second, third
                ));
            }
            Op::Token => {
                let (first, second, third) = pop3(node, stack, diagnostics);
                stack.push(format!(
                    "Token(String = {}, Delimiters = {}, Index = {})",
                    first, second, third
                ));
            }
            Op::Span => {
                let (first, second, third) = pop3(node, stack, diagnostics);
                let text = match node.header {
                    IfrHeader::Span(h) => format!(
                        "Span(String = {}, Characters = {}, Start = {}, Flags = 0x{:02X})",
                        first, second, third, h.flags
                    ),
                    _ => invalid_parameters(node, Some(&first)),
                };
                stack.push(text);
            }

            // Handled by feed()
            Op::Map => {}

            _ => {
                diagnostics.node_warning(
                    Component::LogicExpression,
                    node.id,
                    Some(node.offset),
                    format!("unimplemented logic opcode {}", node.opcode),
                );
                stack.push(format!("UNKNOWNOPCODE({})", node.opcode));
            }
        }
    }

    /// Literal text of an operand-less opcode that carries data.
    fn nullary(&self, node: &OpcodeNode, diagnostics: &mut Diagnostics) -> Option<String> {
        let text = match &node.header {
            IfrHeader::Uint8(h) => format!("0x{:02X}", h.value),
            IfrHeader::Uint16(h) => format!("0x{:04X}", h.value),
            IfrHeader::Uint32(h) => format!("0x{:08X}", h.value),
            IfrHeader::Uint64(h) => format!("0x{:016X}", h.value),
            IfrHeader::RuleRef(h) => format!("RuleRef(Id = 0x{:02X})", h.rule_id),
            IfrHeader::QuestionRef1(h) => question_value(h.question_id),
            IfrHeader::StringRef1(h) => self.string(h.string_id, diagnostics),
            IfrHeader::Get(h) => format!(
                "Get(VarStoreId = 0x{:04X}, VarStoreInfo = 0x{:04X}, VarStoreType = 0x{:02X})",
                h.var_store_id, h.var_store_info, h.var_store_type
            ),
            IfrHeader::Security(h) => format!("Security(Permissions = {})", h.guid),
            IfrHeader::EqIdVal(h) => format!(
                "({} == 0x{:04X})",
                question_value(h.question_id),
                h.value
            ),
            IfrHeader::EqIdId(h) => format!(
                "({} == {})",
                question_value(h.question_id_1),
                question_value(h.question_id_2)
            ),
            IfrHeader::EqIdValList(h) => {
                let values = match &node.extra {
                    Some(IfrExtra::ValueList(values)) => values
                        .iter()
                        .map(|v| format!("0x{:04X}", v))
                        .collect::<Vec<_>>()
                        .join(", "),
                    _ => String::new(),
                };
                format!("({} in {{{}}})", question_value(h.question_id), values)
            }
            _ => return None,
        };
        Some(text)
    }

    fn map(&self, node: &OpcodeNode, stack: &mut LogicStack, diagnostics: &mut Diagnostics) {
        let subject = stack.pop(node, diagnostics);
        if node.children.len() % 2 != 0 {
            diagnostics.node_warning(
                Component::LogicExpression,
                node.id,
                Some(node.offset),
                format!("MAP has {} children, expected pairs", node.children.len()),
            );
            stack.push(format!("INVALIDOPCODEPARAMETERS(MAP, Value = {})", subject));
            return;
        }
        let mut text = format!("Switch({}", subject);
        for pair in node.children.chunks_exact(2) {
            let key = self.reconstruct(&pair[0], diagnostics);
            let value = self.reconstruct(&pair[1], diagnostics);
            text.push_str(&format!(", {{{},{}}}", key, value));
        }
        text.push(')');
        stack.push(text);
    }

    fn string(&self, id: u16, diagnostics: &mut Diagnostics) -> String {
        format!(
            "GetString(Id = {:05} [\"{}\"])",
            id,
            self.db.resolve_with(id, self.language, diagnostics)
        )
    }
}

/// Reconstruct the expression rooted at `node` with `db` strings in `language`.
pub fn reconstruct_logic_expression(
    node: &OpcodeNode,
    db: &StringDatabase,
    language: &str,
    diagnostics: &mut Diagnostics,
) -> String {
    LogicExpressionReconstructor::new(db, language).reconstruct(node, diagnostics)
}

fn pop3(
    node: &OpcodeNode,
    stack: &mut LogicStack,
    diagnostics: &mut Diagnostics,
) -> (String, String, String) {
    let third = stack.pop(node, diagnostics);
    let second = stack.pop(node, diagnostics);
    let first = stack.pop(node, diagnostics);
    (first, second, third)
}

fn operator(opcode: IfrOpcode) -> &'static str {
    use IfrOpcode as Op;
    match opcode {
        Op::And => "&&",
        Op::Or => "||",
        Op::BitwiseAnd => "&",
        Op::BitwiseOr => "|",
        Op::Equal => "==",
        Op::NotEqual => "!=",
        Op::GreaterThan => ">",
        Op::GreaterEqual => ">=",
        Op::LessThan => "<",
        Op::LessEqual => "<=",
        Op::Add => "+",
        Op::Subtract => "-",
        Op::Multiply => "*",
        Op::Divide => "/",
        Op::Modulo => "%",
        Op::ShiftLeft => "<<",
        Op::ShiftRight => ">>",
        _ => "?",
    }
}

fn question_value(id: u16) -> String {
    format!("QuestionValue(Id = 0x{:04X})", id)
}

fn invalid_parameters(node: &OpcodeNode, value: Option<&str>) -> String {
    match value {
        Some(value) => format!("INVALIDOPCODEPARAMETERS({}, Value = {})", node.opcode, value),
        None => format!("INVALIDOPCODEPARAMETERS({})", node.opcode),
    }
}

/// Decimal or `0x` hexadecimal text that fits a string id.
fn parse_integer(text: &str) -> Option<u16> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Severity;
    use crate::strings::StringsPackage;
    use crate::uefi_parser::{
        Guid, IfrEqIdId, IfrEqIdVal, IfrEqIdValList, IfrFormat, IfrGuidHeader, IfrQuestionRef3,
        IfrSpan, IfrStringRef1, IfrUint16, IfrUint32, IfrUint8, IfrVarAccess, QuestionRef3Variant,
    };

    fn node(id: u32, opcode: IfrOpcode, header: IfrHeader) -> OpcodeNode {
        OpcodeNode {
            opcode,
            header,
            extra: None,
            children: Vec::new(),
            has_own_scope: false,
            id,
            offset: 0,
            length: 2,
        }
    }

    fn op(id: u32, opcode: IfrOpcode) -> OpcodeNode {
        node(id, opcode, IfrHeader::None)
    }

    fn u8_(id: u32, value: u8) -> OpcodeNode {
        node(id, IfrOpcode::Uint8, IfrHeader::Uint8(IfrUint8 { value }))
    }

    /// A VALUE scope holding `tokens`.
    fn value(tokens: Vec<OpcodeNode>) -> OpcodeNode {
        let mut root = op(100, IfrOpcode::Value);
        root.has_own_scope = true;
        root.children = tokens;
        root
    }

    fn db() -> StringDatabase {
        let mut db = StringDatabase::new();
        db.insert(&StringsPackage {
            offset: 0,
            length: 0,
            language: "en-US".into(),
            entries: vec![(42, "Enable".into())],
            ext_blocks: Vec::new(),
        });
        db
    }

    fn run(root: &OpcodeNode) -> (String, Diagnostics) {
        let db = db();
        let mut diagnostics = Diagnostics::new();
        let text = reconstruct_logic_expression(root, &db, "en-US", &mut diagnostics);
        (text, diagnostics)
    }

    #[test]
    fn arithmetic_keeps_encoding_order() {
        let root = value(vec![
            op(1, IfrOpcode::One),
            node(2, IfrOpcode::Uint32, IfrHeader::Uint32(IfrUint32 { value: 5 })),
            op(3, IfrOpcode::Add),
        ]);
        let (text, diagnostics) = run(&root);
        assert_eq!(text, "(1 + 0x00000005)");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn comparison_reverses_encoding_order() {
        let root = value(vec![u8_(1, 1), u8_(2, 2), op(3, IfrOpcode::LessThan)]);
        assert_eq!(run(&root).0, "(0x02 < 0x01)");
    }

    #[test]
    fn nested_operators() {
        // (1 - 2) == 0 && TRUE
        let root = value(vec![
            u8_(1, 1),
            u8_(2, 2),
            op(3, IfrOpcode::Subtract),
            op(4, IfrOpcode::Zero),
            op(5, IfrOpcode::Equal),
            op(6, IfrOpcode::True),
            op(7, IfrOpcode::And),
        ]);
        assert_eq!(run(&root).0, "(TRUE && (0 == (0x01 - 0x02)))");
    }

    #[test]
    fn question_and_string_references() {
        let root = value(vec![node(
            1,
            IfrOpcode::EqIdVal,
            IfrHeader::EqIdVal(IfrEqIdVal {
                question_id: 0x10,
                value: 1,
            }),
        )]);
        assert_eq!(run(&root).0, "(QuestionValue(Id = 0x0010) == 0x0001)");

        let root = value(vec![node(
            1,
            IfrOpcode::StringRef1,
            IfrHeader::StringRef1(IfrStringRef1 { string_id: 42 }),
        )]);
        assert_eq!(run(&root).0, "GetString(Id = 00042 [\"Enable\"])");
    }

    #[test]
    fn string_ref2_branches_on_integer_operand() {
        let root = value(vec![
            node(1, IfrOpcode::Uint16, IfrHeader::Uint16(IfrUint16 { value: 42 })),
            op(2, IfrOpcode::StringRef2),
        ]);
        assert_eq!(run(&root).0, "GetString(Id = 00042 [\"Enable\"])");

        let root = value(vec![op(1, IfrOpcode::This), op(2, IfrOpcode::StringRef2)]);
        assert_eq!(run(&root).0, "GetString(Id = (THIS))");
    }

    #[test]
    fn conditional_and_three_operand_calls() {
        let root = value(vec![
            op(1, IfrOpcode::True),
            u8_(2, 1),
            u8_(3, 2),
            op(4, IfrOpcode::Conditional),
        ]);
        assert_eq!(run(&root).0, "(TRUE ? 0x02 : 0x01)");

        let root = value(vec![
            op(1, IfrOpcode::This),
            u8_(2, 3),
            op(3, IfrOpcode::Zero),
            node(4, IfrOpcode::Find, IfrHeader::Find(IfrFormat { format: 1 })),
        ]);
        assert_eq!(
            run(&root).0,
            "Find(String = THIS, Substring = 0x03, Start = 0, Format = 0x01)"
        );
    }

    fn u16_(id: u32, value: u16) -> OpcodeNode {
        node(id, IfrOpcode::Uint16, IfrHeader::Uint16(IfrUint16 { value }))
    }

    const SYNTAX: Guid = Guid {
        data1: 1,
        data2: 2,
        data3: 3,
        data4: [4, 5, 6, 7, 8, 9, 10, 11],
    };

    /// THIS, 0x01 and 0x02 pushed in that order, then `last`.
    fn three_operands(last: OpcodeNode) -> OpcodeNode {
        value(vec![op(1, IfrOpcode::This), u8_(2, 1), u8_(3, 2), last])
    }

    #[test]
    fn two_operand_calls() {
        let root = value(vec![op(1, IfrOpcode::This), u8_(2, 1), op(3, IfrOpcode::Catenate)]);
        assert_eq!(run(&root).0, "Catenate(THIS, 0x01)");

        let root = value(vec![op(1, IfrOpcode::This), u8_(2, 1), op(3, IfrOpcode::Match)]);
        assert_eq!(run(&root).0, "Match(String = 0x01, Pattern = THIS)");

        let root = value(vec![
            op(1, IfrOpcode::This),
            u8_(2, 1),
            node(3, IfrOpcode::Match2, IfrHeader::Match2(IfrGuidHeader { guid: SYNTAX })),
        ]);
        assert_eq!(
            run(&root).0,
            "Match2(String = 0x01, Pattern = THIS, \
             SyntaxType = 00000001-0002-0003-0405-060708090A0B)"
        );
    }

    #[test]
    fn string_slicing_calls() {
        assert_eq!(
            run(&three_operands(op(4, IfrOpcode::Mid))).0,
            "Mid(String = THIS, Start = 0x01, Length = 0x02)"
        );
        assert_eq!(
            run(&three_operands(op(4, IfrOpcode::Token))).0,
            "Token(String = THIS, Delimiters = 0x01, Index = 0x02)"
        );
        let span = node(4, IfrOpcode::Span, IfrHeader::Span(IfrSpan { flags: 0x10 }));
        assert_eq!(
            run(&three_operands(span)).0,
            "Span(String = THIS, Characters = 0x01, Start = 0x02, Flags = 0x10)"
        );
    }

    #[test]
    fn to_string_carries_its_format() {
        let root = value(vec![
            u8_(1, 5),
            node(2, IfrOpcode::ToString, IfrHeader::ToString(IfrFormat { format: 2 })),
        ]);
        assert_eq!(run(&root).0, "ToString(0x05, Format = 0x02)");
    }

    #[test]
    fn question_ref3_variants() {
        let question_ref3 = |device_path_string_id, guid, variant| {
            node(
                2,
                IfrOpcode::QuestionRef3,
                IfrHeader::QuestionRef3(IfrQuestionRef3 {
                    variant,
                    device_path_string_id,
                    guid,
                }),
            )
        };

        let root = value(vec![
            u16_(1, 7),
            question_ref3(None, None, QuestionRef3Variant::QuestionRef3),
        ]);
        assert_eq!(run(&root).0, "QuestionValue(Id = (0x0007))");

        let root = value(vec![
            u16_(1, 7),
            question_ref3(Some(42), None, QuestionRef3Variant::QuestionRef3_2),
        ]);
        assert_eq!(
            run(&root).0,
            "QuestionValue(Id = (0x0007), DevicePath = GetString(Id = 00042 [\"Enable\"]))"
        );

        let root = value(vec![
            u16_(1, 7),
            question_ref3(Some(42), Some(SYNTAX), QuestionRef3Variant::QuestionRef3_3),
        ]);
        assert_eq!(
            run(&root).0,
            "QuestionValue(Id = (0x0007), DevicePath = GetString(Id = 00042 [\"Enable\"]), \
             Guid = 00000001-0002-0003-0405-060708090A0B)"
        );
    }

    #[test]
    fn var_store_access() {
        let access = IfrVarAccess {
            var_store_id: 1,
            var_store_info: 0x20,
            var_store_type: 0,
        };
        let root = value(vec![node(1, IfrOpcode::Get, IfrHeader::Get(access))]);
        assert_eq!(
            run(&root).0,
            "Get(VarStoreId = 0x0001, VarStoreInfo = 0x0020, VarStoreType = 0x00)"
        );

        let root = value(vec![
            op(1, IfrOpcode::True),
            node(2, IfrOpcode::Set, IfrHeader::Set(access)),
        ]);
        assert_eq!(
            run(&root).0,
            "Set(VarStoreId = 0x0001, VarStoreInfo = 0x0020, VarStoreType = 0x00, Value = TRUE)"
        );
    }

    #[test]
    fn question_comparisons() {
        let root = value(vec![node(
            1,
            IfrOpcode::EqIdId,
            IfrHeader::EqIdId(IfrEqIdId {
                question_id_1: 1,
                question_id_2: 2,
            }),
        )]);
        assert_eq!(
            run(&root).0,
            "(QuestionValue(Id = 0x0001) == QuestionValue(Id = 0x0002))"
        );

        let mut list = node(
            1,
            IfrOpcode::EqIdValList,
            IfrHeader::EqIdValList(IfrEqIdValList {
                question_id: 3,
                list_length: 2,
            }),
        );
        list.extra = Some(IfrExtra::ValueList(vec![1, 0x10]));
        assert_eq!(
            run(&value(vec![list])).0,
            "(QuestionValue(Id = 0x0003) in {0x0001, 0x0010})"
        );
    }

    #[test]
    fn conditional_roots_yield_their_leading_expression() {
        let mut suppress = op(10, IfrOpcode::SuppressIf);
        suppress.has_own_scope = true;
        suppress.children = vec![
            op(11, IfrOpcode::True),
            op(12, IfrOpcode::Not),
            op(13, IfrOpcode::Subtitle),
        ];
        let (text, diagnostics) = run(&suppress);
        assert_eq!(text, "!TRUE");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn empty_stack_is_substituted() {
        let root = value(vec![op(1, IfrOpcode::Not)]);
        let (text, diagnostics) = run(&root);
        assert_eq!(text, "!EMPTYSTACK");
        assert_eq!(diagnostics.count(Severity::Warning), 1);
        assert_eq!(diagnostics.iter().next().and_then(|d| d.node_id), Some(1));
    }

    #[test]
    fn leftover_values_give_invalid_stack() {
        let root = value(vec![op(1, IfrOpcode::True), op(2, IfrOpcode::False)]);
        let (text, diagnostics) = run(&root);
        assert_eq!(text, "INVALIDSTACK(TRUE,FALSE)");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.iter().next().and_then(|d| d.node_id), Some(100));

        let (text, diagnostics) = run(&value(Vec::new()));
        assert_eq!(text, "INVALIDSTACK()");
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn map_renders_switch_over_pairs() {
        let mut map = op(2, IfrOpcode::Map);
        map.has_own_scope = true;
        map.children = vec![u8_(3, 1), op(4, IfrOpcode::True), u8_(5, 2), op(6, IfrOpcode::False)];
        let root = value(vec![op(1, IfrOpcode::This), map]);
        assert_eq!(run(&root).0, "Switch(THIS, {0x01,TRUE}, {0x02,FALSE})");
    }

    #[test]
    fn map_with_odd_children_is_reported() {
        let mut map = op(2, IfrOpcode::Map);
        map.has_own_scope = true;
        map.children = vec![u8_(3, 1)];
        let root = value(vec![op(1, IfrOpcode::This), map]);
        let (text, diagnostics) = run(&root);
        assert_eq!(text, "INVALIDOPCODEPARAMETERS(MAP, Value = THIS)");
        assert_eq!(diagnostics.count(Severity::Warning), 1);
    }

    #[test]
    fn unknown_tokens_are_named() {
        let root = value(vec![op(1, IfrOpcode::Dup)]);
        let (text, diagnostics) = run(&root);
        assert_eq!(text, "UNKNOWNOPCODE(Dup)");
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn scope_of_a_conditional_uses_leading_tokens() {
        let mut suppress = op(10, IfrOpcode::SuppressIf);
        suppress.has_own_scope = true;
        suppress.children = vec![
            op(11, IfrOpcode::True),
            op(12, IfrOpcode::Not),
            op(13, IfrOpcode::Subtitle),
        ];
        let db = db();
        let mut diagnostics = Diagnostics::new();
        let text = LogicExpressionReconstructor::new(&db, "en-US")
            .reconstruct_scope(&suppress, &mut diagnostics);
        assert_eq!(text, "!TRUE");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn integer_operands() {
        assert_eq!(parse_integer("0x002A"), Some(42));
        assert_eq!(parse_integer("17"), Some(17));
        assert_eq!(parse_integer("0x1FFFF"), None);
        assert_eq!(parse_integer("(1 + 2)"), None);
    }
}
