//! Decoded IFR record payloads.
//!
//! One struct per payload shape; [`IfrHeader`] is the closed union over all
//! of them and [`IfrExtra`] carries the variable-length trailers (arrays,
//! typed values, names).

use std::fmt;

use super::fields::{field_table, Field, FieldValue, Fields};
use super::Guid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IfrStatementHeader {
    pub prompt_string_id: u16,
    pub help_string_id: u16,
}

field_table!(IfrStatementHeader {
    prompt_string_id: StringId = "Prompt",
    help_string_id: StringId = "Help",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IfrQuestionHeader {
    pub statement: IfrStatementHeader,
    pub question_id: u16,
    pub var_store_id: u16,
    pub var_store_info: u16,
    pub flags: u8,
}

field_table!(IfrQuestionHeader: statement {
    flags: U8 = "QuestionFlags",
    question_id: U16 = "QuestionId",
    var_store_id: U16 = "VarStoreId",
    var_store_info: U16 = "VarStoreInfo",
});

// 0x01
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrForm {
    pub form_id: u16,
    pub title_string_id: u16,
}

field_table!(IfrForm {
    form_id: U16 = "FormId",
    title_string_id: StringId = "Title",
});

// 0x02
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrSubtitle {
    pub statement: IfrStatementHeader,
    pub flags: u8,
}

field_table!(IfrSubtitle: statement { flags: U8 = "Flags" });

// 0x03
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrText {
    pub statement: IfrStatementHeader,
    pub text_two_string_id: u16,
}

field_table!(IfrText: statement { text_two_string_id: StringId = "Text" });

// 0x04
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrImage {
    pub image_id: u16,
}

field_table!(IfrImage { image_id: U16 = "ImageId" });

/// Min/max/step triple whose width is picked by the numeric size flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfrMinMaxStep {
    U8 { min: u8, max: u8, step: u8 },
    U16 { min: u16, max: u16, step: u16 },
    U32 { min: u32, max: u32, step: u32 },
    U64 { min: u64, max: u64, step: u64 },
}

impl IfrMinMaxStep {
    /// Width of one element in bits.
    pub fn size(&self) -> u8 {
        match self {
            IfrMinMaxStep::U8 { .. } => 8,
            IfrMinMaxStep::U16 { .. } => 16,
            IfrMinMaxStep::U32 { .. } => 32,
            IfrMinMaxStep::U64 { .. } => 64,
        }
    }
}

impl Fields for IfrMinMaxStep {
    fn fields(&self) -> Vec<Field> {
        let (min, max, step) = match *self {
            IfrMinMaxStep::U8 { min, max, step } => {
                (FieldValue::U8(min), FieldValue::U8(max), FieldValue::U8(step))
            }
            IfrMinMaxStep::U16 { min, max, step } => {
                (FieldValue::U16(min), FieldValue::U16(max), FieldValue::U16(step))
            }
            IfrMinMaxStep::U32 { min, max, step } => {
                (FieldValue::U32(min), FieldValue::U32(max), FieldValue::U32(step))
            }
            IfrMinMaxStep::U64 { min, max, step } => {
                (FieldValue::U64(min), FieldValue::U64(max), FieldValue::U64(step))
            }
        };
        vec![
            Field::new("Min", min),
            Field::new("Max", max),
            Field::new("Step", step),
        ]
    }
}

// 0x05 OneOf, 0x07 Numeric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrNumeric {
    pub question: IfrQuestionHeader,
    pub flags: u8,
    pub data: IfrMinMaxStep,
}

impl Fields for IfrNumeric {
    fn fields(&self) -> Vec<Field> {
        let mut fields = self.question.fields();
        fields.push(Field::new("Flags", FieldValue::U8(self.flags)));
        fields.push(Field::new("Size", FieldValue::U8(self.data.size())));
        fields.extend(self.data.fields());
        fields
    }
}

// 0x06
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrCheckBox {
    pub question: IfrQuestionHeader,
    pub flags: u8,
}

field_table!(IfrCheckBox: question { flags: U8 = "Flags" });

// 0x08
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrPassword {
    pub question: IfrQuestionHeader,
    pub min_size: u16,
    pub max_size: u16,
}

field_table!(IfrPassword: question {
    min_size: U16 = "MinSize",
    max_size: U16 = "MaxSize",
});

// 0x09
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrOneOfOption {
    pub option_string_id: u16,
    pub flags: u8,
    pub value_type: u8,
}

field_table!(IfrOneOfOption {
    option_string_id: StringId = "Option",
    flags: U8 = "Flags",
    value_type: U8 = "ValueType",
});

/// Known sizes of the ACTION record, in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionVariant {
    /// With a configuration string id.
    Action,
    /// Question header only.
    Action1,
}

// 0x0C
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrAction {
    pub variant: ActionVariant,
    pub question: IfrQuestionHeader,
    pub config_string_id: Option<u16>,
}

impl Fields for IfrAction {
    fn fields(&self) -> Vec<Field> {
        let mut fields = self.question.fields();
        if let Some(id) = self.config_string_id {
            fields.push(Field::new("QuestionConfig", FieldValue::StringId(id)));
        }
        fields
    }
}

// 0x0D
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrResetButton {
    pub statement: IfrStatementHeader,
    pub default_id: u16,
}

field_table!(IfrResetButton: statement { default_id: U16 = "DefaultId" });

// 0x0E
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrFormSet {
    pub guid: Guid,
    pub title_string_id: u16,
    pub help_string_id: u16,
    pub flags: u8,
}

impl IfrFormSet {
    /// Number of class GUIDs the header claims follow it.
    pub fn class_guid_count(&self) -> usize {
        usize::from(crate::cursor::BinaryCursor::read_bits(self.flags, 0x03, 0))
    }
}

field_table!(IfrFormSet {
    guid: Guid = "Guid",
    title_string_id: StringId = "Title",
    help_string_id: StringId = "Help",
    flags: U8 = "Flags",
});

/// Known sizes of the REF record, in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefVariant {
    /// Target form in the same form set.
    Ref1,
    /// Target question on a form.
    Ref2,
    /// Target form set by GUID.
    Ref3,
    /// Target form set in another driver, by device path.
    Ref4,
    /// Target taken from the question's value.
    Ref5,
}

// 0x0F
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrRef {
    pub variant: RefVariant,
    pub question: IfrQuestionHeader,
    pub form_id: Option<u16>,
    pub ref_question_id: Option<u16>,
    pub form_set_guid: Option<Guid>,
    pub device_path_string_id: Option<u16>,
}

impl Fields for IfrRef {
    fn fields(&self) -> Vec<Field> {
        let mut fields = self.question.fields();
        if let Some(x) = self.form_id {
            fields.push(Field::new("FormId", FieldValue::U16(x)));
        }
        if let Some(x) = self.ref_question_id {
            fields.push(Field::new("RefQuestionId", FieldValue::U16(x)));
        }
        if let Some(x) = self.form_set_guid {
            fields.push(Field::new("FormSetGuid", FieldValue::Guid(x)));
        }
        if let Some(x) = self.device_path_string_id {
            fields.push(Field::new("DevicePath", FieldValue::StringId(x)));
        }
        fields
    }
}

// 0x10 NoSubmitIf, 0x11 InconsistentIf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrErrorPopup {
    pub error_string_id: u16,
}

field_table!(IfrErrorPopup { error_string_id: StringId = "Error" });

// 0x12
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrEqIdVal {
    pub question_id: u16,
    pub value: u16,
}

field_table!(IfrEqIdVal {
    question_id: U16 = "QuestionId",
    value: U16 = "Value",
});

// 0x13
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrEqIdId {
    pub question_id_1: u16,
    pub question_id_2: u16,
}

field_table!(IfrEqIdId {
    question_id_1: U16 = "QuestionId1",
    question_id_2: U16 = "QuestionId2",
});

// 0x14
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrEqIdValList {
    pub question_id: u16,
    pub list_length: u16,
}

field_table!(IfrEqIdValList {
    question_id: U16 = "QuestionId",
    list_length: U16 = "ListLength",
});

// 0x18 Rule, 0x3F RuleRef
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrRule {
    pub rule_id: u8,
}

field_table!(IfrRule { rule_id: U8 = "RuleId" });

// 0x1A
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrDate {
    pub question: IfrQuestionHeader,
    pub flags: u8,
}

field_table!(IfrDate: question { flags: U8 = "Flags" });

// 0x1B
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrTime {
    pub question: IfrQuestionHeader,
    pub flags: u8,
}

field_table!(IfrTime: question { flags: U8 = "Flags" });

// 0x1C
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrString {
    pub question: IfrQuestionHeader,
    pub min_size: u8,
    pub max_size: u8,
    pub flags: u8,
}

field_table!(IfrString: question {
    min_size: U8 = "MinSize",
    max_size: U8 = "MaxSize",
    flags: U8 = "Flags",
});

// 0x1D
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrRefresh {
    pub refresh_interval: u8,
}

field_table!(IfrRefresh { refresh_interval: U8 = "RefreshInterval" });

// 0x1F
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrAnimation {
    pub animation_id: u16,
}

field_table!(IfrAnimation { animation_id: U16 = "AnimationId" });

// 0x23
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrOrderedList {
    pub question: IfrQuestionHeader,
    pub max_containers: u8,
    pub flags: u8,
}

field_table!(IfrOrderedList: question {
    max_containers: U8 = "MaxContainers",
    flags: U8 = "Flags",
});

// 0x24
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrVarStore {
    pub guid: Guid,
    pub var_store_id: u16,
    pub size: u16,
}

field_table!(IfrVarStore {
    guid: Guid = "Guid",
    var_store_id: U16 = "VarStoreId",
    size: U16 = "Size",
});

// 0x25
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrVarStoreNameValue {
    pub var_store_id: u16,
    pub guid: Guid,
}

field_table!(IfrVarStoreNameValue {
    var_store_id: U16 = "VarStoreId",
    guid: Guid = "Guid",
});

// 0x26
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrVarStoreEfi {
    pub var_store_id: u16,
    pub guid: Guid,
    pub attributes: u32,
    /// Absent in the short pre-2.3 layout.
    pub size: Option<u16>,
}

impl Fields for IfrVarStoreEfi {
    fn fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::new("VarStoreId", FieldValue::U16(self.var_store_id)),
            Field::new("Guid", FieldValue::Guid(self.guid)),
            Field::new("Attributes", FieldValue::U32(self.attributes)),
        ];
        if let Some(size) = self.size {
            fields.push(Field::new("Size", FieldValue::U16(size)));
        }
        fields
    }
}

// 0x27
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrVarStoreDevice {
    pub device_path_string_id: u16,
}

field_table!(IfrVarStoreDevice { device_path_string_id: StringId = "DevicePath" });

// 0x2B Get, 0x2C Set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrVarAccess {
    pub var_store_id: u16,
    pub var_store_info: u16,
    pub var_store_type: u8,
}

field_table!(IfrVarAccess {
    var_store_id: U16 = "VarStoreId",
    var_store_info: U16 = "VarStoreInfo",
    var_store_type: U8 = "VarStoreType",
});

// 0x40
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrQuestionRef1 {
    pub question_id: u16,
}

field_table!(IfrQuestionRef1 { question_id: U16 = "QuestionId" });

// 0x42
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrUint8 {
    pub value: u8,
}

field_table!(IfrUint8 { value: U8 = "Value" });

// 0x43
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrUint16 {
    pub value: u16,
}

field_table!(IfrUint16 { value: U16 = "Value" });

// 0x44
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrUint32 {
    pub value: u32,
}

field_table!(IfrUint32 { value: U32 = "Value" });

// 0x45
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrUint64 {
    pub value: u64,
}

field_table!(IfrUint64 { value: U64 = "Value" });

// 0x49 ToString, 0x4C Find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrFormat {
    pub format: u8,
}

field_table!(IfrFormat { format: U8 = "Format" });

// 0x4E
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrStringRef1 {
    pub string_id: u16,
}

field_table!(IfrStringRef1 { string_id: StringId = "String" });

/// Known sizes of the QUESTION_REF3 record, in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionRef3Variant {
    /// Header only.
    QuestionRef3,
    /// With a device path string id.
    QuestionRef3_2,
    /// With a device path string id and a question GUID.
    QuestionRef3_3,
}

// 0x51
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrQuestionRef3 {
    pub variant: QuestionRef3Variant,
    pub device_path_string_id: Option<u16>,
    pub guid: Option<Guid>,
}

impl Fields for IfrQuestionRef3 {
    fn fields(&self) -> Vec<Field> {
        let mut fields = Vec::new();
        if let Some(x) = self.device_path_string_id {
            fields.push(Field::new("DevicePath", FieldValue::StringId(x)));
        }
        if let Some(x) = self.guid {
            fields.push(Field::new("Guid", FieldValue::Guid(x)));
        }
        fields
    }
}

// 0x59
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrSpan {
    pub flags: u8,
}

field_table!(IfrSpan { flags: U8 = "Flags" });

// 0x5B
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrDefault {
    pub default_id: u16,
    pub value_type: u8,
}

field_table!(IfrDefault {
    default_id: U16 = "DefaultId",
    value_type: U8 = "ValueType",
});

// 0x5C
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrDefaultStore {
    pub name_string_id: u16,
    pub default_id: u16,
}

field_table!(IfrDefaultStore {
    name_string_id: StringId = "Name",
    default_id: U16 = "DefaultId",
});

// 0x5D
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrFormMap {
    pub form_id: u16,
}

field_table!(IfrFormMap { form_id: U16 = "FormId" });

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrFormMapMethod {
    pub method_title_string_id: u16,
    pub method_guid: Guid,
}

field_table!(IfrFormMapMethod {
    method_title_string_id: StringId = "MethodTitle",
    method_guid: Guid = "MethodGuid",
});

// 0x5F Guid, 0x60 Security, 0x62 RefreshId, 0x64 Match2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrGuidHeader {
    pub guid: Guid,
}

field_table!(IfrGuidHeader { guid: Guid = "Guid" });

// 0x63
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfrWarningIf {
    pub warning_string_id: u16,
    pub timeout: u8,
}

field_table!(IfrWarningIf {
    warning_string_id: StringId = "Warning",
    timeout: U8 = "Timeout",
});

/// Fixed-shape part of one decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfrHeader {
    /// Opcodes that carry nothing past the 2-byte opcode header.
    None,
    Form(IfrForm),
    Subtitle(IfrSubtitle),
    Text(IfrText),
    Image(IfrImage),
    OneOf(IfrNumeric),
    CheckBox(IfrCheckBox),
    Numeric(IfrNumeric),
    Password(IfrPassword),
    OneOfOption(IfrOneOfOption),
    Action(IfrAction),
    ResetButton(IfrResetButton),
    FormSet(IfrFormSet),
    Ref(IfrRef),
    NoSubmitIf(IfrErrorPopup),
    InconsistentIf(IfrErrorPopup),
    EqIdVal(IfrEqIdVal),
    EqIdId(IfrEqIdId),
    EqIdValList(IfrEqIdValList),
    Rule(IfrRule),
    Date(IfrDate),
    Time(IfrTime),
    String(IfrString),
    Refresh(IfrRefresh),
    Animation(IfrAnimation),
    OrderedList(IfrOrderedList),
    VarStore(IfrVarStore),
    VarStoreNameValue(IfrVarStoreNameValue),
    VarStoreEfi(IfrVarStoreEfi),
    VarStoreDevice(IfrVarStoreDevice),
    Get(IfrVarAccess),
    Set(IfrVarAccess),
    RuleRef(IfrRule),
    QuestionRef1(IfrQuestionRef1),
    Uint8(IfrUint8),
    Uint16(IfrUint16),
    Uint32(IfrUint32),
    Uint64(IfrUint64),
    ToString(IfrFormat),
    Find(IfrFormat),
    StringRef1(IfrStringRef1),
    QuestionRef3(IfrQuestionRef3),
    Span(IfrSpan),
    Default(IfrDefault),
    DefaultStore(IfrDefaultStore),
    FormMap(IfrFormMap),
    Guid(IfrGuidHeader),
    Security(IfrGuidHeader),
    RefreshId(IfrGuidHeader),
    WarningIf(IfrWarningIf),
    Match2(IfrGuidHeader),
}

impl IfrHeader {
    /// The question header, for opcodes that declare a question.
    pub fn question(&self) -> Option<&IfrQuestionHeader> {
        match self {
            IfrHeader::OneOf(x) | IfrHeader::Numeric(x) => Some(&x.question),
            IfrHeader::CheckBox(x) => Some(&x.question),
            IfrHeader::Password(x) => Some(&x.question),
            IfrHeader::Action(x) => Some(&x.question),
            IfrHeader::Ref(x) => Some(&x.question),
            IfrHeader::Date(x) => Some(&x.question),
            IfrHeader::Time(x) => Some(&x.question),
            IfrHeader::String(x) => Some(&x.question),
            IfrHeader::OrderedList(x) => Some(&x.question),
            _ => None,
        }
    }
}

impl Fields for IfrHeader {
    fn fields(&self) -> Vec<Field> {
        match self {
            IfrHeader::None => Vec::new(),
            IfrHeader::Form(x) => x.fields(),
            IfrHeader::Subtitle(x) => x.fields(),
            IfrHeader::Text(x) => x.fields(),
            IfrHeader::Image(x) => x.fields(),
            IfrHeader::OneOf(x) | IfrHeader::Numeric(x) => x.fields(),
            IfrHeader::CheckBox(x) => x.fields(),
            IfrHeader::Password(x) => x.fields(),
            IfrHeader::OneOfOption(x) => x.fields(),
            IfrHeader::Action(x) => x.fields(),
            IfrHeader::ResetButton(x) => x.fields(),
            IfrHeader::FormSet(x) => x.fields(),
            IfrHeader::Ref(x) => x.fields(),
            IfrHeader::NoSubmitIf(x) | IfrHeader::InconsistentIf(x) => x.fields(),
            IfrHeader::EqIdVal(x) => x.fields(),
            IfrHeader::EqIdId(x) => x.fields(),
            IfrHeader::EqIdValList(x) => x.fields(),
            IfrHeader::Rule(x) | IfrHeader::RuleRef(x) => x.fields(),
            IfrHeader::Date(x) => x.fields(),
            IfrHeader::Time(x) => x.fields(),
            IfrHeader::String(x) => x.fields(),
            IfrHeader::Refresh(x) => x.fields(),
            IfrHeader::Animation(x) => x.fields(),
            IfrHeader::OrderedList(x) => x.fields(),
            IfrHeader::VarStore(x) => x.fields(),
            IfrHeader::VarStoreNameValue(x) => x.fields(),
            IfrHeader::VarStoreEfi(x) => x.fields(),
            IfrHeader::VarStoreDevice(x) => x.fields(),
            IfrHeader::Get(x) | IfrHeader::Set(x) => x.fields(),
            IfrHeader::QuestionRef1(x) => x.fields(),
            IfrHeader::Uint8(x) => x.fields(),
            IfrHeader::Uint16(x) => x.fields(),
            IfrHeader::Uint32(x) => x.fields(),
            IfrHeader::Uint64(x) => x.fields(),
            IfrHeader::ToString(x) | IfrHeader::Find(x) => x.fields(),
            IfrHeader::StringRef1(x) => x.fields(),
            IfrHeader::QuestionRef3(x) => x.fields(),
            IfrHeader::Span(x) => x.fields(),
            IfrHeader::Default(x) => x.fields(),
            IfrHeader::DefaultStore(x) => x.fields(),
            IfrHeader::FormMap(x) => x.fields(),
            IfrHeader::Guid(x)
            | IfrHeader::Security(x)
            | IfrHeader::RefreshId(x)
            | IfrHeader::Match2(x) => x.fields(),
            IfrHeader::WarningIf(x) => x.fields(),
        }
    }
}

/// EFI_IFR_TYPE_VALUE, selected by a value-type byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfrTypeValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Boolean(bool),
    Time { hour: u8, minute: u8, second: u8 },
    Date { year: u16, month: u8, day: u8 },
    String(u16),
    Other(Vec<u8>),
    Undefined,
    Action(u16),
    Buffer(Vec<u8>),
    Ref {
        question_id: u16,
        form_id: u16,
        form_set_guid: Guid,
        device_path_string_id: u16,
    },
    Unknown { value_type: u8, raw: Vec<u8> },
}

impl IfrTypeValue {
    /// String id carried by the value, if it is a string or action value.
    pub fn string_id(&self) -> Option<u16> {
        match self {
            IfrTypeValue::String(x) | IfrTypeValue::Action(x) => Some(*x),
            _ => None,
        }
    }
}

impl fmt::Display for IfrTypeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IfrTypeValue::U8(x) => write!(f, "0x{:X}", x),
            IfrTypeValue::U16(x) => write!(f, "0x{:X}", x),
            IfrTypeValue::U32(x) => write!(f, "0x{:X}", x),
            IfrTypeValue::U64(x) => write!(f, "0x{:X}", x),
            IfrTypeValue::Boolean(x) => write!(f, "{}", x),
            IfrTypeValue::Time {
                hour,
                minute,
                second,
            } => write!(f, "{:02}:{:02}:{:02}", hour, minute, second),
            IfrTypeValue::Date { year, month, day } => {
                write!(f, "{:04}-{:02}-{:02}", year, month, day)
            }
            IfrTypeValue::String(x) => write!(f, "StringId(0x{:X})", x),
            IfrTypeValue::Action(x) => write!(f, "ActionStringId(0x{:X})", x),
            IfrTypeValue::Undefined => write!(f, "Undefined"),
            IfrTypeValue::Other(raw) | IfrTypeValue::Buffer(raw) => write!(f, "{:02X?}", raw),
            IfrTypeValue::Ref {
                question_id,
                form_id,
                form_set_guid,
                device_path_string_id,
            } => write!(
                f,
                "QuestionId: 0x{:X}, FormId: 0x{:X}, FormSetGuid: {}, DevicePath: 0x{:X}",
                question_id, form_id, form_set_guid, device_path_string_id
            ),
            IfrTypeValue::Unknown { value_type, raw } => {
                write!(f, "Type 0x{:X}: {:02X?}", value_type, raw)
            }
        }
    }
}

/// Decoded payload of a GUID opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfrGuidExtension {
    Edk2Label { number: u16 },
    Edk2Banner { title_string_id: u16, line_number: u16, alignment: u8 },
    Edk2Timeout { timeout: u16 },
    Edk2Class { class: u16 },
    Edk2SubClass { sub_class: u16 },
    FrameworkOptionKey { question_id: u16, data: Vec<u8> },
    FrameworkVarEqName { question_id: u16, name_string_id: u16 },
    /// Unrecognized GUID or extension opcode.
    Raw(Vec<u8>),
}

impl fmt::Display for IfrGuidExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IfrGuidExtension::Edk2Label { number } => write!(f, "Label: 0x{:X}", number),
            IfrGuidExtension::Edk2Banner {
                title_string_id,
                line_number,
                alignment,
            } => write!(
                f,
                "Banner: Title 0x{:X}, LineNumber: 0x{:X}, Alignment: 0x{:X}",
                title_string_id, line_number, alignment
            ),
            IfrGuidExtension::Edk2Timeout { timeout } => write!(f, "Timeout: 0x{:X}", timeout),
            IfrGuidExtension::Edk2Class { class } => write!(f, "Class: 0x{:X}", class),
            IfrGuidExtension::Edk2SubClass { sub_class } => {
                write!(f, "SubClass: 0x{:X}", sub_class)
            }
            IfrGuidExtension::FrameworkOptionKey { question_id, data } => write!(
                f,
                "OptionKey: QuestionId 0x{:X}, Data: {:02X?}",
                question_id, data
            ),
            IfrGuidExtension::FrameworkVarEqName {
                question_id,
                name_string_id,
            } => write!(
                f,
                "VarEqName: QuestionId 0x{:X}, NameId: 0x{:X}",
                question_id, name_string_id
            ),
            IfrGuidExtension::Raw(data) => write!(f, "RawData: {:02X?}", data),
        }
    }
}

/// Variable-length trailer of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfrExtra {
    /// Typed value of ONE_OF_OPTION and DEFAULT.
    Value(IfrTypeValue),
    /// EQ_ID_VAL_LIST values.
    ValueList(Vec<u16>),
    /// FORM_SET class GUIDs.
    ClassGuids(Vec<Guid>),
    /// FORM_MAP methods.
    FormMapMethods(Vec<IfrFormMapMethod>),
    /// VARSTORE / VARSTORE_EFI name.
    Name(String),
    GuidExtension(IfrGuidExtension),
}

impl IfrExtra {
    /// String ids referenced from the trailer.
    pub fn string_ids(&self) -> Vec<u16> {
        match self {
            IfrExtra::Value(v) => v.string_id().into_iter().collect(),
            IfrExtra::FormMapMethods(methods) => {
                methods.iter().map(|m| m.method_title_string_id).collect()
            }
            IfrExtra::GuidExtension(IfrGuidExtension::Edk2Banner {
                title_string_id, ..
            }) => vec![*title_string_id],
            IfrExtra::GuidExtension(IfrGuidExtension::FrameworkVarEqName {
                name_string_id,
                ..
            }) => vec![*name_string_id],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> IfrQuestionHeader {
        IfrQuestionHeader {
            statement: IfrStatementHeader {
                prompt_string_id: 0x10,
                help_string_id: 0x11,
            },
            question_id: 0x1000,
            var_store_id: 1,
            var_store_info: 0x20,
            flags: 0x04,
        }
    }

    #[test]
    fn field_table_prepends_base_header() {
        let cb = IfrCheckBox {
            question: question(),
            flags: 0x01,
        };
        let names: Vec<_> = cb.fields().iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            [
                "Prompt",
                "Help",
                "QuestionFlags",
                "QuestionId",
                "VarStoreId",
                "VarStoreInfo",
                "Flags"
            ]
        );
        assert_eq!(cb.fields()[0].value, FieldValue::StringId(0x10));
    }

    #[test]
    fn numeric_fields_follow_selected_width() {
        let n = IfrNumeric {
            question: question(),
            flags: 0x01,
            data: IfrMinMaxStep::U16 {
                min: 1,
                max: 0x100,
                step: 1,
            },
        };
        let fields = n.fields();
        let max = fields.iter().find(|f| f.name == "Max").unwrap();
        assert_eq!(max.value, FieldValue::U16(0x100));
        assert_eq!(max.value.width(), 2);
        assert!(fields.contains(&Field::new("Size", FieldValue::U8(16))));
    }

    #[test]
    fn optional_ref_fields_only_when_present() {
        let r = IfrRef {
            variant: RefVariant::Ref2,
            question: question(),
            form_id: Some(2),
            ref_question_id: Some(3),
            form_set_guid: None,
            device_path_string_id: None,
        };
        let names: Vec<_> = IfrHeader::Ref(r).fields().iter().map(|f| f.name).collect();
        assert!(names.contains(&"RefQuestionId"));
        assert!(!names.contains(&"FormSetGuid"));
    }

    #[test]
    fn extras_report_string_ids() {
        assert_eq!(
            IfrExtra::Value(IfrTypeValue::String(7)).string_ids(),
            vec![7]
        );
        assert!(IfrExtra::Value(IfrTypeValue::U8(7)).string_ids().is_empty());
        assert_eq!(
            IfrTypeValue::Date {
                year: 2024,
                month: 2,
                day: 9
            }
            .to_string(),
            "2024-02-09"
        );
    }
}
