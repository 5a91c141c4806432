//! IFR opcode tags and their expression roles.

use std::fmt;

macro_rules! ifr_opcodes {
    ($($tag:literal => $name:ident),* $(,)?) => {
        /// IFR opcode tags.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum IfrOpcode {
            $($name,)*
            Unknown(u8),
        }

        impl From<u8> for IfrOpcode {
            fn from(tag: u8) -> Self {
                match tag {
                    $($tag => IfrOpcode::$name,)*
                    x => IfrOpcode::Unknown(x),
                }
            }
        }

        impl IfrOpcode {
            /// Wire tag of the opcode.
            pub fn tag(self) -> u8 {
                match self {
                    $(IfrOpcode::$name => $tag,)*
                    IfrOpcode::Unknown(x) => x,
                }
            }
        }
    };
}

ifr_opcodes! {
    0x01 => Form,
    0x02 => Subtitle,
    0x03 => Text,
    0x04 => Image,
    0x05 => OneOf,
    0x06 => CheckBox,
    0x07 => Numeric,
    0x08 => Password,
    0x09 => OneOfOption,
    0x0A => SuppressIf,
    0x0B => Locked,
    0x0C => Action,
    0x0D => ResetButton,
    0x0E => FormSet,
    0x0F => Ref,
    0x10 => NoSubmitIf,
    0x11 => InconsistentIf,
    0x12 => EqIdVal,
    0x13 => EqIdId,
    0x14 => EqIdValList,
    0x15 => And,
    0x16 => Or,
    0x17 => Not,
    0x18 => Rule,
    0x19 => GrayOutIf,
    0x1A => Date,
    0x1B => Time,
    0x1C => String,
    0x1D => Refresh,
    0x1E => DisableIf,
    0x1F => Animation,
    0x20 => ToLower,
    0x21 => ToUpper,
    0x22 => Map,
    0x23 => OrderedList,
    0x24 => VarStore,
    0x25 => VarStoreNameValue,
    0x26 => VarStoreEfi,
    0x27 => VarStoreDevice,
    0x28 => Version,
    0x29 => End,
    0x2A => Match,
    0x2B => Get,
    0x2C => Set,
    0x2D => Read,
    0x2E => Write,
    0x2F => Equal,
    0x30 => NotEqual,
    0x31 => GreaterThan,
    0x32 => GreaterEqual,
    0x33 => LessThan,
    0x34 => LessEqual,
    0x35 => BitwiseAnd,
    0x36 => BitwiseOr,
    0x37 => BitwiseNot,
    0x38 => ShiftLeft,
    0x39 => ShiftRight,
    0x3A => Add,
    0x3B => Subtract,
    0x3C => Multiply,
    0x3D => Divide,
    0x3E => Modulo,
    0x3F => RuleRef,
    0x40 => QuestionRef1,
    0x41 => QuestionRef2,
    0x42 => Uint8,
    0x43 => Uint16,
    0x44 => Uint32,
    0x45 => Uint64,
    0x46 => True,
    0x47 => False,
    0x48 => ToUint,
    0x49 => ToString,
    0x4A => ToBoolean,
    0x4B => Mid,
    0x4C => Find,
    0x4D => Token,
    0x4E => StringRef1,
    0x4F => StringRef2,
    0x50 => Conditional,
    0x51 => QuestionRef3,
    0x52 => Zero,
    0x53 => One,
    0x54 => Ones,
    0x55 => Undefined,
    0x56 => Length,
    0x57 => Dup,
    0x58 => This,
    0x59 => Span,
    0x5A => Value,
    0x5B => Default,
    0x5C => DefaultStore,
    0x5D => FormMap,
    0x5E => Catenate,
    0x5F => Guid,
    0x60 => Security,
    0x61 => ModalTag,
    0x62 => RefreshId,
    0x63 => WarningIf,
    0x64 => Match2,
}

impl IfrOpcode {
    /// Opcodes that appear as tokens of a postfix logic expression.
    pub fn is_expression(self) -> bool {
        use IfrOpcode as Op;
        matches!(
            self,
            Op::EqIdVal
                | Op::EqIdId
                | Op::EqIdValList
                | Op::And
                | Op::Or
                | Op::Not
                | Op::ToLower
                | Op::ToUpper
                | Op::Map
                | Op::Version
                | Op::Match
                | Op::Get
                | Op::Set
                | Op::Read
                | Op::Write
                | Op::Equal
                | Op::NotEqual
                | Op::GreaterThan
                | Op::GreaterEqual
                | Op::LessThan
                | Op::LessEqual
                | Op::BitwiseAnd
                | Op::BitwiseOr
                | Op::BitwiseNot
                | Op::ShiftLeft
                | Op::ShiftRight
                | Op::Add
                | Op::Subtract
                | Op::Multiply
                | Op::Divide
                | Op::Modulo
                | Op::RuleRef
                | Op::QuestionRef1
                | Op::QuestionRef2
                | Op::QuestionRef3
                | Op::Uint8
                | Op::Uint16
                | Op::Uint32
                | Op::Uint64
                | Op::True
                | Op::False
                | Op::ToUint
                | Op::ToString
                | Op::ToBoolean
                | Op::Mid
                | Op::Find
                | Op::Token
                | Op::StringRef1
                | Op::StringRef2
                | Op::Conditional
                | Op::Zero
                | Op::One
                | Op::Ones
                | Op::Undefined
                | Op::Length
                | Op::Dup
                | Op::This
                | Op::Span
                | Op::Catenate
                | Op::Security
                | Op::Match2
        )
    }

    /// Opcodes whose scope starts with a logic expression.
    pub fn holds_expression(self) -> bool {
        use IfrOpcode as Op;
        matches!(
            self,
            Op::SuppressIf
                | Op::GrayOutIf
                | Op::DisableIf
                | Op::NoSubmitIf
                | Op::InconsistentIf
                | Op::WarningIf
                | Op::Rule
                | Op::Value
                | Op::Default
                | Op::Read
                | Op::Write
        )
    }
}

impl fmt::Display for IfrOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IfrOpcode::Unknown(x) => write!(f, "Unknown(0x{:02X})", x),
            known => write!(f, "{:?}", known),
        }
    }
}
