//! Plain-text IFR listing.

use std::fmt::{self, Write};

use crate::config::ListingOptions;
use crate::error::Diagnostics;
use crate::logic::LogicExpressionReconstructor;
use crate::package::{FormsPackage, Package};
use crate::strings::StringDatabase;
use crate::tree::OpcodeNode;
use crate::uefi_parser::{FieldValue, Fields, IfrExtra, IfrTypeValue};

/// Listing of every forms package in `packages`, one line per opcode.
pub fn render_listing(
    packages: &[Package],
    db: &StringDatabase,
    options: &ListingOptions,
    diagnostics: &mut Diagnostics,
) -> String {
    let mut text = String::new();
    match write_listing(&mut text, packages, db, options, diagnostics) {
        Ok(()) => text,
        Err(_) => String::new(),
    }
}

fn write_listing(
    out: &mut String,
    packages: &[Package],
    db: &StringDatabase,
    options: &ListingOptions,
    diagnostics: &mut Diagnostics,
) -> fmt::Result {
    writeln!(
        out,
        "Program version: {}, Extraction mode: UEFI",
        env!("CARGO_PKG_VERSION")
    )?;
    for package in packages {
        if let Package::Forms(forms) = package {
            write_forms_package(out, forms, db, options, diagnostics)?;
        }
    }
    Ok(())
}

/// Listing lines of one forms package, without the version line.
pub fn render_forms_package(
    forms: &FormsPackage,
    db: &StringDatabase,
    options: &ListingOptions,
    diagnostics: &mut Diagnostics,
) -> String {
    let mut text = String::new();
    match write_forms_package(&mut text, forms, db, options, diagnostics) {
        Ok(()) => text,
        Err(_) => String::new(),
    }
}

fn write_forms_package(
    out: &mut String,
    forms: &FormsPackage,
    db: &StringDatabase,
    options: &ListingOptions,
    diagnostics: &mut Diagnostics,
) -> fmt::Result {
    let mut writer = ListingWriter {
        out,
        db,
        options,
        logic: LogicExpressionReconstructor::new(db, &options.language),
        diagnostics,
    };
    for root in &forms.roots {
        writer.node(root, 0)?;
    }
    Ok(())
}

struct ListingWriter<'a, 'd> {
    out: &'a mut String,
    db: &'a StringDatabase,
    options: &'a ListingOptions,
    logic: LogicExpressionReconstructor<'a>,
    diagnostics: &'d mut Diagnostics,
}

impl<'a, 'd> ListingWriter<'a, 'd> {
    fn node(&mut self, node: &OpcodeNode, depth: usize) -> fmt::Result {
        if self.options.verbose {
            write!(self.out, "0x{:X}: ", node.offset)?;
        }
        for _ in 0..depth {
            self.out.push('\t');
        }
        write!(self.out, "{}", node.opcode)?;

        let mut separator = " ";
        for field in node.header.fields() {
            let value = self.field_value(field.value);
            write!(self.out, "{}{}: {}", separator, field.name, value)?;
            separator = ", ";
        }
        if let Some(extra) = &node.extra {
            write!(self.out, "{}", separator)?;
            self.extra(extra)?;
            separator = ", ";
        }
        if node.has_own_scope && node.opcode.holds_expression() {
            let expression = self.logic.reconstruct_scope(node, self.diagnostics);
            write!(self.out, "{}Expression: {}", separator, expression)?;
        }
        writeln!(self.out)?;

        for child in &node.children {
            self.node(child, depth + 1)?;
        }
        Ok(())
    }

    fn field_value(&mut self, value: FieldValue) -> String {
        match value {
            FieldValue::StringId(id) => self.quoted(id),
            other => other.to_string(),
        }
    }

    fn quoted(&mut self, id: u16) -> String {
        format!(
            "\"{}\"",
            self.db.resolve_with(id, &self.options.language, self.diagnostics)
        )
    }

    fn extra(&mut self, extra: &IfrExtra) -> fmt::Result {
        match extra {
            IfrExtra::Value(IfrTypeValue::String(id))
            | IfrExtra::Value(IfrTypeValue::Action(id)) => {
                let text = self.quoted(*id);
                write!(self.out, "Value: {}", text)
            }
            IfrExtra::Value(value) => write!(self.out, "Value: {}", value),
            IfrExtra::ValueList(values) => {
                let values: Vec<String> = values.iter().map(|v| format!("0x{:X}", v)).collect();
                write!(self.out, "Values: [{}]", values.join(", "))
            }
            IfrExtra::ClassGuids(guids) => {
                let guids: Vec<String> = guids.iter().map(ToString::to_string).collect();
                write!(self.out, "ClassGuids: [{}]", guids.join(", "))
            }
            IfrExtra::FormMapMethods(methods) => {
                let mut rendered = Vec::with_capacity(methods.len());
                for method in methods {
                    let title = self.quoted(method.method_title_string_id);
                    rendered.push(format!("{} {}", title, method.method_guid));
                }
                write!(self.out, "Methods: [{}]", rendered.join(", "))
            }
            IfrExtra::Name(name) => write!(self.out, "Name: {}", name),
            IfrExtra::GuidExtension(extension) => write!(self.out, "{}", extension),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::decode_file;

    fn listing(bytes: &[u8], verbose: bool) -> String {
        let (packages, _) = decode_file(bytes);
        let db = StringDatabase::from_packages(&packages);
        let options = ListingOptions {
            verbose,
            ..ListingOptions::default()
        };
        render_listing(&packages, &db, &options, &mut Diagnostics::new())
    }

    fn forms(stream: &[u8]) -> Vec<u8> {
        let length = (stream.len() + 4) as u32;
        let mut out = (length | (0x02 << 24)).to_le_bytes().to_vec();
        out.extend_from_slice(stream);
        out
    }

    #[test]
    fn lines_are_indented_by_scope() {
        // FORM(1, title 0) { SUPPRESS_IF { TRUE } END } END
        let bytes = forms(&[
            0x01, 0x86, 0x01, 0x00, 0x00, 0x00, 0x0A, 0x82, 0x46, 0x02, 0x29, 0x02, 0x29, 0x02,
        ]);
        let text = listing(&bytes, false);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("Program version: "));
        assert!(lines[0].ends_with(", Extraction mode: UEFI"));
        assert_eq!(lines[1], "Form FormId: 0x1, Title: \"\"");
        assert_eq!(lines[2], "\tSuppressIf Expression: TRUE");
        assert_eq!(lines[3], "\t\tTrue");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn verbose_lines_carry_offsets() {
        let text = listing(&forms(&[0x53, 0x02, 0x52, 0x02]), true);
        let lines: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(lines, vec!["0x4: One", "0x6: Zero"]);
    }

    #[test]
    fn missing_strings_are_marked() {
        // FORM(2, title 7) { } END
        let text = listing(&forms(&[0x01, 0x86, 0x02, 0x00, 0x07, 0x00, 0x29, 0x02]), false);
        assert!(text.contains("Title: \"UNKNOWN_STRING_ID(7)\""), "{}", text);
    }
}
