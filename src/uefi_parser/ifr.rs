//! nom parsers for IFR record payloads and the opcode dispatch table.
//!
//! Every parser here sees the payload of one record, i.e. the bytes after
//! the 2-byte opcode header, already sliced to the record's declared length.

use nom::combinator::rest;
use nom::multi::count;
use nom::number::complete::{le_u16, le_u32, le_u64, le_u8};
use nom::sequence::tuple;
use nom::IResult;

use super::headers::*;
use super::{guid, Guid, IfrOpcode, IFR_FRAMEWORK_GUID, IFR_OPCODE_HEADER_SIZE, IFR_TIANO_GUID};
use crate::cursor::BinaryCursor;

type PResult<'a, T> = IResult<&'a [u8], T>;

/// Header and trailer of one record, plus non-fatal findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub header: IfrHeader,
    pub extra: Option<IfrExtra>,
    /// Recoverable inconsistencies, e.g. a count field that disagrees with the array.
    pub warnings: Vec<String>,
}

impl ParsedRecord {
    fn header_only() -> Self {
        Self::new(IfrHeader::None)
    }

    fn new(header: IfrHeader) -> Self {
        Self {
            header,
            extra: None,
            warnings: Vec::new(),
        }
    }

    fn with_extra(header: IfrHeader, extra: IfrExtra) -> Self {
        Self {
            header,
            extra: Some(extra),
            warnings: Vec::new(),
        }
    }
}

/// Why a record payload could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    /// The payload is shorter than its shape requires.
    Truncated,
    /// No known header variant of the opcode has the record's length.
    AmbiguousSize,
}

impl<E> From<nom::Err<E>> for RecordError {
    fn from(_: nom::Err<E>) -> Self {
        RecordError::Truncated
    }
}

// Length-disambiguation tables: total record length (header included) of
// each known variant, in match priority order.
pub const REF_VARIANTS: [(usize, RefVariant); 5] = [
    (15, RefVariant::Ref1),
    (17, RefVariant::Ref2),
    (33, RefVariant::Ref3),
    (35, RefVariant::Ref4),
    (13, RefVariant::Ref5),
];

pub const ACTION_VARIANTS: [(usize, ActionVariant); 2] =
    [(15, ActionVariant::Action), (13, ActionVariant::Action1)];

pub const QUESTION_REF3_VARIANTS: [(usize, QuestionRef3Variant); 3] = [
    (2, QuestionRef3Variant::QuestionRef3),
    (4, QuestionRef3Variant::QuestionRef3_2),
    (20, QuestionRef3Variant::QuestionRef3_3),
];

/// First variant whose size equals `length` exactly.
pub fn select_variant<V: Copy>(table: &[(usize, V)], length: usize) -> Option<V> {
    table
        .iter()
        .find(|(size, _)| *size == length)
        .map(|(_, variant)| *variant)
}

pub fn statement_header(input: &[u8]) -> PResult<IfrStatementHeader> {
    let (input, (prompt_string_id, help_string_id)) = tuple((le_u16, le_u16))(input)?;
    Ok((
        input,
        IfrStatementHeader {
            prompt_string_id,
            help_string_id,
        },
    ))
}

pub fn question_header(input: &[u8]) -> PResult<IfrQuestionHeader> {
    let (input, statement) = statement_header(input)?;
    let (input, (question_id, var_store_id, var_store_info, flags)) =
        tuple((le_u16, le_u16, le_u16, le_u8))(input)?;
    Ok((
        input,
        IfrQuestionHeader {
            statement,
            question_id,
            var_store_id,
            var_store_info,
            flags,
        },
    ))
}

pub fn ifr_form(input: &[u8]) -> PResult<IfrForm> {
    let (input, (form_id, title_string_id)) = tuple((le_u16, le_u16))(input)?;
    Ok((
        input,
        IfrForm {
            form_id,
            title_string_id,
        },
    ))
}

pub fn ifr_subtitle(input: &[u8]) -> PResult<IfrSubtitle> {
    let (input, statement) = statement_header(input)?;
    let (input, flags) = le_u8(input)?;
    Ok((input, IfrSubtitle { statement, flags }))
}

pub fn ifr_text(input: &[u8]) -> PResult<IfrText> {
    let (input, statement) = statement_header(input)?;
    let (input, text_two_string_id) = le_u16(input)?;
    Ok((
        input,
        IfrText {
            statement,
            text_two_string_id,
        },
    ))
}

pub fn ifr_image(input: &[u8]) -> PResult<IfrImage> {
    let (input, image_id) = le_u16(input)?;
    Ok((input, IfrImage { image_id }))
}

fn min_max_step(size: u8, input: &[u8]) -> PResult<IfrMinMaxStep> {
    match size {
        0 => {
            let (input, (min, max, step)) = tuple((le_u8, le_u8, le_u8))(input)?;
            Ok((input, IfrMinMaxStep::U8 { min, max, step }))
        }
        1 => {
            let (input, (min, max, step)) = tuple((le_u16, le_u16, le_u16))(input)?;
            Ok((input, IfrMinMaxStep::U16 { min, max, step }))
        }
        2 => {
            let (input, (min, max, step)) = tuple((le_u32, le_u32, le_u32))(input)?;
            Ok((input, IfrMinMaxStep::U32 { min, max, step }))
        }
        _ => {
            let (input, (min, max, step)) = tuple((le_u64, le_u64, le_u64))(input)?;
            Ok((input, IfrMinMaxStep::U64 { min, max, step }))
        }
    }
}

/// ONE_OF and NUMERIC share one layout.
pub fn ifr_numeric(input: &[u8]) -> PResult<IfrNumeric> {
    let (input, question) = question_header(input)?;
    let (input, flags) = le_u8(input)?;
    let (input, data) = min_max_step(BinaryCursor::read_bits(flags, 0x03, 0), input)?;
    Ok((
        input,
        IfrNumeric {
            question,
            flags,
            data,
        },
    ))
}

pub fn ifr_check_box(input: &[u8]) -> PResult<IfrCheckBox> {
    let (input, question) = question_header(input)?;
    let (input, flags) = le_u8(input)?;
    Ok((input, IfrCheckBox { question, flags }))
}

pub fn ifr_password(input: &[u8]) -> PResult<IfrPassword> {
    let (input, question) = question_header(input)?;
    let (input, (min_size, max_size)) = tuple((le_u16, le_u16))(input)?;
    Ok((
        input,
        IfrPassword {
            question,
            min_size,
            max_size,
        },
    ))
}

/// EFI_IFR_TYPE_VALUE of the given type; consumes the rest for buffer-like types.
pub fn type_value(value_type: u8, input: &[u8]) -> PResult<IfrTypeValue> {
    match value_type {
        0x00 => le_u8(input).map(|(i, x)| (i, IfrTypeValue::U8(x))),
        0x01 => le_u16(input).map(|(i, x)| (i, IfrTypeValue::U16(x))),
        0x02 => le_u32(input).map(|(i, x)| (i, IfrTypeValue::U32(x))),
        0x03 => le_u64(input).map(|(i, x)| (i, IfrTypeValue::U64(x))),
        0x04 => le_u8(input).map(|(i, x)| (i, IfrTypeValue::Boolean(x != 0))),
        0x05 => {
            let (input, (hour, minute, second)) = tuple((le_u8, le_u8, le_u8))(input)?;
            Ok((
                input,
                IfrTypeValue::Time {
                    hour,
                    minute,
                    second,
                },
            ))
        }
        0x06 => {
            let (input, (year, month, day)) = tuple((le_u16, le_u8, le_u8))(input)?;
            Ok((input, IfrTypeValue::Date { year, month, day }))
        }
        0x07 => le_u16(input).map(|(i, x)| (i, IfrTypeValue::String(x))),
        0x08 => rest(input).map(|(i, x): (&[u8], &[u8])| (i, IfrTypeValue::Other(x.to_vec()))),
        0x09 => Ok((input, IfrTypeValue::Undefined)),
        0x0A => le_u16(input).map(|(i, x)| (i, IfrTypeValue::Action(x))),
        0x0B => rest(input).map(|(i, x): (&[u8], &[u8])| (i, IfrTypeValue::Buffer(x.to_vec()))),
        0x0C => {
            let (input, (question_id, form_id)) = tuple((le_u16, le_u16))(input)?;
            let (input, form_set_guid) = guid(input)?;
            let (input, device_path_string_id) = le_u16(input)?;
            Ok((
                input,
                IfrTypeValue::Ref {
                    question_id,
                    form_id,
                    form_set_guid,
                    device_path_string_id,
                },
            ))
        }
        other => {
            let (input, raw) = rest(input)?;
            Ok((
                input,
                IfrTypeValue::Unknown {
                    value_type: other,
                    raw: raw.to_vec(),
                },
            ))
        }
    }
}

pub fn ifr_one_of_option(input: &[u8]) -> PResult<(IfrOneOfOption, IfrTypeValue)> {
    let (input, (option_string_id, flags, value_type)) = tuple((le_u16, le_u8, le_u8))(input)?;
    let (input, value) = type_value(value_type, input)?;
    Ok((
        input,
        (
            IfrOneOfOption {
                option_string_id,
                flags,
                value_type,
            },
            value,
        ),
    ))
}

pub fn ifr_action(variant: ActionVariant, input: &[u8]) -> PResult<IfrAction> {
    let (input, question) = question_header(input)?;
    let (input, config_string_id) = match variant {
        ActionVariant::Action => {
            let (input, id) = le_u16(input)?;
            (input, Some(id))
        }
        ActionVariant::Action1 => (input, None),
    };
    Ok((
        input,
        IfrAction {
            variant,
            question,
            config_string_id,
        },
    ))
}

pub fn ifr_reset_button(input: &[u8]) -> PResult<IfrResetButton> {
    let (input, statement) = statement_header(input)?;
    let (input, default_id) = le_u16(input)?;
    Ok((
        input,
        IfrResetButton {
            statement,
            default_id,
        },
    ))
}

pub fn ifr_form_set(input: &[u8]) -> PResult<IfrFormSet> {
    let (input, guid) = guid(input)?;
    let (input, (title_string_id, help_string_id, flags)) =
        tuple((le_u16, le_u16, le_u8))(input)?;
    Ok((
        input,
        IfrFormSet {
            guid,
            title_string_id,
            help_string_id,
            flags,
        },
    ))
}

pub fn ifr_ref(variant: RefVariant, input: &[u8]) -> PResult<IfrRef> {
    let (mut input, question) = question_header(input)?;
    let mut r = IfrRef {
        variant,
        question,
        form_id: None,
        ref_question_id: None,
        form_set_guid: None,
        device_path_string_id: None,
    };
    if variant == RefVariant::Ref5 {
        return Ok((input, r));
    }
    let (i, form_id) = le_u16(input)?;
    r.form_id = Some(form_id);
    input = i;
    if matches!(variant, RefVariant::Ref2 | RefVariant::Ref3 | RefVariant::Ref4) {
        let (i, id) = le_u16(input)?;
        r.ref_question_id = Some(id);
        input = i;
    }
    if matches!(variant, RefVariant::Ref3 | RefVariant::Ref4) {
        let (i, g) = guid(input)?;
        r.form_set_guid = Some(g);
        input = i;
    }
    if variant == RefVariant::Ref4 {
        let (i, id) = le_u16(input)?;
        r.device_path_string_id = Some(id);
        input = i;
    }
    Ok((input, r))
}

pub fn ifr_error_popup(input: &[u8]) -> PResult<IfrErrorPopup> {
    let (input, error_string_id) = le_u16(input)?;
    Ok((input, IfrErrorPopup { error_string_id }))
}

pub fn ifr_eq_id_val(input: &[u8]) -> PResult<IfrEqIdVal> {
    let (input, (question_id, value)) = tuple((le_u16, le_u16))(input)?;
    Ok((input, IfrEqIdVal { question_id, value }))
}

pub fn ifr_eq_id_id(input: &[u8]) -> PResult<IfrEqIdId> {
    let (input, (question_id_1, question_id_2)) = tuple((le_u16, le_u16))(input)?;
    Ok((
        input,
        IfrEqIdId {
            question_id_1,
            question_id_2,
        },
    ))
}

/// The value list is sized by the record, not by `ListLength`.
pub fn ifr_eq_id_val_list(input: &[u8]) -> PResult<(IfrEqIdValList, Vec<u16>)> {
    let (input, (question_id, list_length)) = tuple((le_u16, le_u16))(input)?;
    let (input, values) = count(le_u16, input.len() / 2)(input)?;
    Ok((
        input,
        (
            IfrEqIdValList {
                question_id,
                list_length,
            },
            values,
        ),
    ))
}

pub fn ifr_rule(input: &[u8]) -> PResult<IfrRule> {
    let (input, rule_id) = le_u8(input)?;
    Ok((input, IfrRule { rule_id }))
}

pub fn ifr_date(input: &[u8]) -> PResult<IfrDate> {
    let (input, question) = question_header(input)?;
    let (input, flags) = le_u8(input)?;
    Ok((input, IfrDate { question, flags }))
}

pub fn ifr_time(input: &[u8]) -> PResult<IfrTime> {
    let (input, question) = question_header(input)?;
    let (input, flags) = le_u8(input)?;
    Ok((input, IfrTime { question, flags }))
}

pub fn ifr_string(input: &[u8]) -> PResult<IfrString> {
    let (input, question) = question_header(input)?;
    let (input, (min_size, max_size, flags)) = tuple((le_u8, le_u8, le_u8))(input)?;
    Ok((
        input,
        IfrString {
            question,
            min_size,
            max_size,
            flags,
        },
    ))
}

pub fn ifr_refresh(input: &[u8]) -> PResult<IfrRefresh> {
    let (input, refresh_interval) = le_u8(input)?;
    Ok((input, IfrRefresh { refresh_interval }))
}

pub fn ifr_animation(input: &[u8]) -> PResult<IfrAnimation> {
    let (input, animation_id) = le_u16(input)?;
    Ok((input, IfrAnimation { animation_id }))
}

pub fn ifr_ordered_list(input: &[u8]) -> PResult<IfrOrderedList> {
    let (input, question) = question_header(input)?;
    let (input, (max_containers, flags)) = tuple((le_u8, le_u8))(input)?;
    Ok((
        input,
        IfrOrderedList {
            question,
            max_containers,
            flags,
        },
    ))
}

/// NUL-terminated ASCII name filling the rest of the record.
fn ascii_name(input: &[u8]) -> Result<String, RecordError> {
    let mut cursor = BinaryCursor::new(input);
    cursor
        .read_null_terminated_ascii()
        .map_err(|_| RecordError::Truncated)
}

pub fn ifr_var_store(input: &[u8]) -> PResult<IfrVarStore> {
    let (input, guid) = guid(input)?;
    let (input, (var_store_id, size)) = tuple((le_u16, le_u16))(input)?;
    Ok((
        input,
        IfrVarStore {
            guid,
            var_store_id,
            size,
        },
    ))
}

pub fn ifr_var_store_name_value(input: &[u8]) -> PResult<IfrVarStoreNameValue> {
    let (input, var_store_id) = le_u16(input)?;
    let (input, guid) = guid(input)?;
    Ok((input, IfrVarStoreNameValue { var_store_id, guid }))
}

pub fn ifr_var_store_efi(input: &[u8]) -> PResult<IfrVarStoreEfi> {
    let (input, var_store_id) = le_u16(input)?;
    let (input, guid) = guid(input)?;
    let (input, attributes) = le_u32(input)?;
    let (input, size) = if input.len() >= 2 {
        let (i, size) = le_u16(input)?;
        (i, Some(size))
    } else {
        (input, None)
    };
    Ok((
        input,
        IfrVarStoreEfi {
            var_store_id,
            guid,
            attributes,
            size,
        },
    ))
}

pub fn ifr_var_store_device(input: &[u8]) -> PResult<IfrVarStoreDevice> {
    let (input, device_path_string_id) = le_u16(input)?;
    Ok((
        input,
        IfrVarStoreDevice {
            device_path_string_id,
        },
    ))
}

/// GET and SET share one layout.
pub fn ifr_var_access(input: &[u8]) -> PResult<IfrVarAccess> {
    let (input, (var_store_id, var_store_info, var_store_type)) =
        tuple((le_u16, le_u16, le_u8))(input)?;
    Ok((
        input,
        IfrVarAccess {
            var_store_id,
            var_store_info,
            var_store_type,
        },
    ))
}

pub fn ifr_question_ref_1(input: &[u8]) -> PResult<IfrQuestionRef1> {
    let (input, question_id) = le_u16(input)?;
    Ok((input, IfrQuestionRef1 { question_id }))
}

pub fn ifr_format(input: &[u8]) -> PResult<IfrFormat> {
    let (input, format) = le_u8(input)?;
    Ok((input, IfrFormat { format }))
}

pub fn ifr_string_ref_1(input: &[u8]) -> PResult<IfrStringRef1> {
    let (input, string_id) = le_u16(input)?;
    Ok((input, IfrStringRef1 { string_id }))
}

pub fn ifr_question_ref_3(variant: QuestionRef3Variant, input: &[u8]) -> PResult<IfrQuestionRef3> {
    let mut r = IfrQuestionRef3 {
        variant,
        device_path_string_id: None,
        guid: None,
    };
    let mut input = input;
    if variant != QuestionRef3Variant::QuestionRef3 {
        let (i, id) = le_u16(input)?;
        r.device_path_string_id = Some(id);
        input = i;
    }
    if variant == QuestionRef3Variant::QuestionRef3_3 {
        let (i, g) = guid(input)?;
        r.guid = Some(g);
        input = i;
    }
    Ok((input, r))
}

pub fn ifr_span(input: &[u8]) -> PResult<IfrSpan> {
    let (input, flags) = le_u8(input)?;
    Ok((input, IfrSpan { flags }))
}

/// The value is absent when it is supplied by a nested VALUE opcode instead.
pub fn ifr_default(input: &[u8]) -> PResult<(IfrDefault, Option<IfrTypeValue>)> {
    let (input, (default_id, value_type)) = tuple((le_u16, le_u8))(input)?;
    let header = IfrDefault {
        default_id,
        value_type,
    };
    if input.is_empty() {
        return Ok((input, (header, None)));
    }
    let (input, value) = type_value(value_type, input)?;
    Ok((input, (header, Some(value))))
}

pub fn ifr_default_store(input: &[u8]) -> PResult<IfrDefaultStore> {
    let (input, (name_string_id, default_id)) = tuple((le_u16, le_u16))(input)?;
    Ok((
        input,
        IfrDefaultStore {
            name_string_id,
            default_id,
        },
    ))
}

fn form_map_method(input: &[u8]) -> PResult<IfrFormMapMethod> {
    let (input, method_title_string_id) = le_u16(input)?;
    let (input, method_guid) = guid(input)?;
    Ok((
        input,
        IfrFormMapMethod {
            method_title_string_id,
            method_guid,
        },
    ))
}

pub fn ifr_form_map(input: &[u8]) -> PResult<(IfrFormMap, Vec<IfrFormMapMethod>)> {
    let (input, form_id) = le_u16(input)?;
    let (input, methods) = count(form_map_method, input.len() / 18)(input)?;
    Ok((input, (IfrFormMap { form_id }, methods)))
}

pub fn ifr_guid_header(input: &[u8]) -> PResult<IfrGuidHeader> {
    let (input, guid) = guid(input)?;
    Ok((input, IfrGuidHeader { guid }))
}

/// Interpret the bytes after the GUID of a GUID opcode.
pub fn guid_extension(owner: &Guid, input: &[u8]) -> IfrGuidExtension {
    let decoded = if *owner == IFR_TIANO_GUID {
        edk2_extension(input).ok().map(|(_, x)| x)
    } else if *owner == IFR_FRAMEWORK_GUID {
        framework_extension(input).ok().map(|(_, x)| x)
    } else {
        None
    };
    decoded.unwrap_or_else(|| IfrGuidExtension::Raw(input.to_vec()))
}

fn edk2_extension(input: &[u8]) -> PResult<IfrGuidExtension> {
    let (input, extend_opcode) = le_u8(input)?;
    match extend_opcode {
        0x00 => le_u16(input).map(|(i, number)| (i, IfrGuidExtension::Edk2Label { number })),
        0x01 => {
            let (input, (title_string_id, line_number, alignment)) =
                tuple((le_u16, le_u16, le_u8))(input)?;
            Ok((
                input,
                IfrGuidExtension::Edk2Banner {
                    title_string_id,
                    line_number,
                    alignment,
                },
            ))
        }
        0x02 => le_u16(input).map(|(i, timeout)| (i, IfrGuidExtension::Edk2Timeout { timeout })),
        0x03 => le_u16(input).map(|(i, class)| (i, IfrGuidExtension::Edk2Class { class })),
        0x04 => le_u16(input)
            .map(|(i, sub_class)| (i, IfrGuidExtension::Edk2SubClass { sub_class })),
        _ => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Switch,
        ))),
    }
}

fn framework_extension(input: &[u8]) -> PResult<IfrGuidExtension> {
    let (input, (extend_opcode, question_id)) = tuple((le_u8, le_u16))(input)?;
    match extend_opcode {
        0x00 => {
            let (input, data) = rest(input)?;
            Ok((
                input,
                IfrGuidExtension::FrameworkOptionKey {
                    question_id,
                    data: data.to_vec(),
                },
            ))
        }
        0x01 => {
            let (input, name_string_id) = le_u16(input)?;
            Ok((
                input,
                IfrGuidExtension::FrameworkVarEqName {
                    question_id,
                    name_string_id,
                },
            ))
        }
        _ => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Switch,
        ))),
    }
}

pub fn ifr_warning_if(input: &[u8]) -> PResult<IfrWarningIf> {
    let (input, (warning_string_id, timeout)) = tuple((le_u16, le_u8))(input)?;
    Ok((
        input,
        IfrWarningIf {
            warning_string_id,
            timeout,
        },
    ))
}

fn header<'a, T>(
    parsed: PResult<'a, T>,
    wrap: fn(T) -> IfrHeader,
) -> Result<ParsedRecord, RecordError> {
    let (_, value) = parsed?;
    Ok(ParsedRecord::new(wrap(value)))
}

fn variant_of<V: Copy>(table: &[(usize, V)], length: usize) -> Result<V, RecordError> {
    select_variant(table, length).ok_or(RecordError::AmbiguousSize)
}

/// Decode the payload of one record.
///
/// `length` is the record's total declared length (header included),
/// `payload` the bytes after the 2-byte opcode header.
pub fn parse_record(
    opcode: IfrOpcode,
    length: usize,
    payload: &[u8],
) -> Result<ParsedRecord, RecordError> {
    use IfrOpcode as Op;
    debug_assert_eq!(length, payload.len() + IFR_OPCODE_HEADER_SIZE);

    match opcode {
        // 0x01: Form
        Op::Form => header(ifr_form(payload), IfrHeader::Form),
        // 0x02: Subtitle
        Op::Subtitle => header(ifr_subtitle(payload), IfrHeader::Subtitle),
        // 0x03: Text
        Op::Text => header(ifr_text(payload), IfrHeader::Text),
        // 0x04: Image
        Op::Image => header(ifr_image(payload), IfrHeader::Image),
        // 0x05: OneOf
        Op::OneOf => header(ifr_numeric(payload), IfrHeader::OneOf),
        // 0x06: CheckBox
        Op::CheckBox => header(ifr_check_box(payload), IfrHeader::CheckBox),
        // 0x07: Numeric
        Op::Numeric => header(ifr_numeric(payload), IfrHeader::Numeric),
        // 0x08: Password
        Op::Password => header(ifr_password(payload), IfrHeader::Password),
        // 0x09: OneOfOption
        Op::OneOfOption => {
            let (_, (option, value)) = ifr_one_of_option(payload)?;
            Ok(ParsedRecord::with_extra(
                IfrHeader::OneOfOption(option),
                IfrExtra::Value(value),
            ))
        }
        // 0x0C: Action
        Op::Action => {
            let variant = variant_of(&ACTION_VARIANTS, length)?;
            header(ifr_action(variant, payload), IfrHeader::Action)
        }
        // 0x0D: ResetButton
        Op::ResetButton => header(ifr_reset_button(payload), IfrHeader::ResetButton),
        // 0x0E: FormSet
        Op::FormSet => {
            let (input, form_set) = ifr_form_set(payload)?;
            let actual = input.len() / 16;
            let (_, class_guids) = count(guid, actual)(input)?;
            let mut record = ParsedRecord::with_extra(
                IfrHeader::FormSet(form_set),
                IfrExtra::ClassGuids(class_guids),
            );
            if form_set.class_guid_count() != actual {
                record.warnings.push(format!(
                    "FormSet declares {} class GUIDs, record holds {}",
                    form_set.class_guid_count(),
                    actual
                ));
            }
            Ok(record)
        }
        // 0x0F: Ref
        Op::Ref => {
            let variant = variant_of(&REF_VARIANTS, length)?;
            header(ifr_ref(variant, payload), IfrHeader::Ref)
        }
        // 0x10: NoSubmitIf
        Op::NoSubmitIf => header(ifr_error_popup(payload), IfrHeader::NoSubmitIf),
        // 0x11: InconsistentIf
        Op::InconsistentIf => header(ifr_error_popup(payload), IfrHeader::InconsistentIf),
        // 0x12: EqIdVal
        Op::EqIdVal => header(ifr_eq_id_val(payload), IfrHeader::EqIdVal),
        // 0x13: EqIdId
        Op::EqIdId => header(ifr_eq_id_id(payload), IfrHeader::EqIdId),
        // 0x14: EqIdValList
        Op::EqIdValList => {
            let (_, (list, values)) = ifr_eq_id_val_list(payload)?;
            let actual = values.len();
            let mut record =
                ParsedRecord::with_extra(IfrHeader::EqIdValList(list), IfrExtra::ValueList(values));
            if usize::from(list.list_length) != actual {
                record.warnings.push(format!(
                    "EqIdValList declares {} values, record holds {}",
                    list.list_length, actual
                ));
            }
            Ok(record)
        }
        // 0x18: Rule
        Op::Rule => header(ifr_rule(payload), IfrHeader::Rule),
        // 0x1A: Date
        Op::Date => header(ifr_date(payload), IfrHeader::Date),
        // 0x1B: Time
        Op::Time => header(ifr_time(payload), IfrHeader::Time),
        // 0x1C: String
        Op::String => header(ifr_string(payload), IfrHeader::String),
        // 0x1D: Refresh
        Op::Refresh => header(ifr_refresh(payload), IfrHeader::Refresh),
        // 0x1F: Animation
        Op::Animation => header(ifr_animation(payload), IfrHeader::Animation),
        // 0x23: OrderedList
        Op::OrderedList => header(ifr_ordered_list(payload), IfrHeader::OrderedList),
        // 0x24: VarStore
        Op::VarStore => {
            let (input, var_store) = ifr_var_store(payload)?;
            let name = ascii_name(input)?;
            Ok(ParsedRecord::with_extra(
                IfrHeader::VarStore(var_store),
                IfrExtra::Name(name),
            ))
        }
        // 0x25: VarStoreNameValue
        Op::VarStoreNameValue => {
            header(ifr_var_store_name_value(payload), IfrHeader::VarStoreNameValue)
        }
        // 0x26: VarStoreEfi
        Op::VarStoreEfi => {
            let (input, var_store) = ifr_var_store_efi(payload)?;
            if input.is_empty() {
                return Ok(ParsedRecord::new(IfrHeader::VarStoreEfi(var_store)));
            }
            let name = ascii_name(input)?;
            Ok(ParsedRecord::with_extra(
                IfrHeader::VarStoreEfi(var_store),
                IfrExtra::Name(name),
            ))
        }
        // 0x27: VarStoreDevice
        Op::VarStoreDevice => header(ifr_var_store_device(payload), IfrHeader::VarStoreDevice),
        // 0x2B: Get
        Op::Get => header(ifr_var_access(payload), IfrHeader::Get),
        // 0x2C: Set
        Op::Set => header(ifr_var_access(payload), IfrHeader::Set),
        // 0x3F: RuleRef
        Op::RuleRef => header(ifr_rule(payload), IfrHeader::RuleRef),
        // 0x40: QuestionRef1
        Op::QuestionRef1 => header(ifr_question_ref_1(payload), IfrHeader::QuestionRef1),
        // 0x42: Uint8
        Op::Uint8 => header(
            le_u8(payload).map(|(i, value)| (i, IfrUint8 { value })),
            IfrHeader::Uint8,
        ),
        // 0x43: Uint16
        Op::Uint16 => header(
            le_u16(payload).map(|(i, value)| (i, IfrUint16 { value })),
            IfrHeader::Uint16,
        ),
        // 0x44: Uint32
        Op::Uint32 => header(
            le_u32(payload).map(|(i, value)| (i, IfrUint32 { value })),
            IfrHeader::Uint32,
        ),
        // 0x45: Uint64
        Op::Uint64 => header(
            le_u64(payload).map(|(i, value)| (i, IfrUint64 { value })),
            IfrHeader::Uint64,
        ),
        // 0x49: ToString
        Op::ToString => header(ifr_format(payload), IfrHeader::ToString),
        // 0x4C: Find
        Op::Find => header(ifr_format(payload), IfrHeader::Find),
        // 0x4E: StringRef1
        Op::StringRef1 => header(ifr_string_ref_1(payload), IfrHeader::StringRef1),
        // 0x51: QuestionRef3
        Op::QuestionRef3 => {
            let variant = variant_of(&QUESTION_REF3_VARIANTS, length)?;
            header(ifr_question_ref_3(variant, payload), IfrHeader::QuestionRef3)
        }
        // 0x59: Span
        Op::Span => header(ifr_span(payload), IfrHeader::Span),
        // 0x5B: Default
        Op::Default => {
            let (_, (default, value)) = ifr_default(payload)?;
            Ok(ParsedRecord {
                header: IfrHeader::Default(default),
                extra: value.map(IfrExtra::Value),
                warnings: Vec::new(),
            })
        }
        // 0x5C: DefaultStore
        Op::DefaultStore => header(ifr_default_store(payload), IfrHeader::DefaultStore),
        // 0x5D: FormMap
        Op::FormMap => {
            let (_, (form_map, methods)) = ifr_form_map(payload)?;
            Ok(ParsedRecord::with_extra(
                IfrHeader::FormMap(form_map),
                IfrExtra::FormMapMethods(methods),
            ))
        }
        // 0x5F: Guid
        Op::Guid => {
            let (input, g) = ifr_guid_header(payload)?;
            let extension = guid_extension(&g.guid, input);
            Ok(ParsedRecord::with_extra(
                IfrHeader::Guid(g),
                IfrExtra::GuidExtension(extension),
            ))
        }
        // 0x60: Security
        Op::Security => header(ifr_guid_header(payload), IfrHeader::Security),
        // 0x62: RefreshId
        Op::RefreshId => header(ifr_guid_header(payload), IfrHeader::RefreshId),
        // 0x63: WarningIf
        Op::WarningIf => header(ifr_warning_if(payload), IfrHeader::WarningIf),
        // 0x64: Match2
        Op::Match2 => header(ifr_guid_header(payload), IfrHeader::Match2),

        // Opcodes with nothing past the opcode header
        Op::SuppressIf
        | Op::Locked
        | Op::And
        | Op::Or
        | Op::Not
        | Op::GrayOutIf
        | Op::DisableIf
        | Op::ToLower
        | Op::ToUpper
        | Op::Map
        | Op::Version
        | Op::End
        | Op::Match
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
        | Op::QuestionRef2
        | Op::True
        | Op::False
        | Op::ToUint
        | Op::ToBoolean
        | Op::Mid
        | Op::Token
        | Op::StringRef2
        | Op::Conditional
        | Op::Zero
        | Op::One
        | Op::Ones
        | Op::Undefined
        | Op::Length
        | Op::Dup
        | Op::This
        | Op::Value
        | Op::Catenate
        | Op::ModalTag => Ok(ParsedRecord::header_only()),

        // Length is known from the opcode header, so the stream stays in sync
        Op::Unknown(_) => Ok(ParsedRecord::header_only()),
    }
}
