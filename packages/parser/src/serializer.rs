use crate::ast::*;
use crate::escape::{escape_attr, escape_text};
use crate::id_generator::Identifier;
use crate::wire::{self, encode_bool};
use serde::{Deserialize, Serialize};

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerOptions {
    pub indent: String,
    pub line_ending: LineEnding,
    pub xml_declaration: bool,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            line_ending: LineEnding::Lf,
            xml_declaration: true,
        }
    }
}

/// Serializer converts the MSF tree back to XML text
///
/// Field order is fixed per entity type and never depends on how the source
/// document was laid out. Empty and absent values both become an explicit
/// `<Name></Name>` pair; self-closing tags are never written.
pub struct Serializer {
    indent_level: usize,
    options: SerializerOptions,
}

impl Serializer {
    pub fn new() -> Self {
        Self::with_options(SerializerOptions::default())
    }

    pub fn with_indent(indent: &str) -> Self {
        Self::with_options(SerializerOptions {
            indent: indent.to_string(),
            ..SerializerOptions::default()
        })
    }

    pub fn with_options(options: SerializerOptions) -> Self {
        Self {
            indent_level: 0,
            options,
        }
    }

    /// Serialize an Instrument to MSF text
    pub fn serialize(&mut self, doc: &Instrument) -> String {
        let mut output = String::new();
        self.indent_level = 0;

        if self.options.xml_declaration {
            output.push_str(XML_DECLARATION);
            self.newline(&mut output);
        }

        self.open_with(wire::ROOT, &doc.extra.attributes, &mut output);

        let extra = &doc.extra;
        self.write_ids(extra, &doc.object_guid, &doc.revision_guid, doc.sequence, &mut output);
        self.field(extra, wire::FORMAT_VERSION, &doc.format_version, &mut output);
        self.write_audit(extra, &doc.audit, &mut output);
        self.write_extra_elements(extra, &mut output);
        self.serialize_header(&doc.header, &mut output);

        self.open_with(wire::FUNCTIONS, extra.field_attributes(wire::FUNCTIONS), &mut output);
        for function in &doc.functions {
            self.serialize_function(function, &mut output);
        }
        self.close(wire::FUNCTIONS, &mut output);

        self.close(wire::ROOT, &mut output);
        output
    }

    fn serialize_header(&mut self, header: &Header, output: &mut String) {
        let extra = &header.extra;
        self.open_with(wire::HEADER, &extra.attributes, output);
        self.write_ids(extra, &header.object_guid, &header.revision_guid, header.sequence, output);
        self.field(extra, wire::MANUFACTURER, &header.manufacturer, output);
        self.field(extra, wire::MODEL, &header.model, output);
        self.write_optional(extra, wire::DESCRIPTION, &header.description, output);
        self.field(extra, wire::INSTRUMENT_TYPE, &header.instrument_type, output);
        self.field(extra, wire::PROCEDURE_NUMBER, &header.procedure_number, output);
        self.field(extra, wire::REVISION, &header.revision, output);
        self.write_audit(extra, &header.audit, output);
        self.write_extra_elements(extra, output);
        self.close(wire::HEADER, output);
    }

    fn serialize_function(&mut self, function: &Function, output: &mut String) {
        let extra = &function.extra;
        self.open_with(wire::FUNCTION, &extra.attributes, output);
        self.write_ids(extra, &function.object_guid, &function.revision_guid, function.sequence, output);
        self.field(extra, wire::BASE_FUNCTION, &function.base_function, output);
        self.write_optional(extra, wire::MODIFIER, &function.modifier, output);
        self.field(extra, wire::UNIT, &function.unit, output);
        self.field(extra, wire::ENABLED, encode_bool(function.enabled), output);
        self.write_audit(extra, &function.audit, output);
        self.write_extra_elements(extra, output);
        for range in &function.ranges {
            self.serialize_range(range, output);
        }
        self.close(wire::FUNCTION, output);
    }

    fn serialize_range(&mut self, range: &Range, output: &mut String) {
        let extra = &range.extra;
        self.open_with(wire::RANGE, &extra.attributes, output);
        self.write_ids(extra, &range.object_guid, &range.revision_guid, range.sequence, output);
        self.field(extra, wire::RANGE_VALUE, &range.range_value, output);
        self.write_optional(extra, wire::FREQUENCY_BAND, &range.frequency_band, output);
        self.field(extra, wire::RESOLUTION, range.resolution.as_str(), output);
        self.write_audit(extra, &range.audit, output);
        self.write_extra_elements(extra, output);
        self.serialize_parameter(&range.parameter, output);
        for spec in &range.specifications {
            self.serialize_specification(spec, output);
        }
        self.close(wire::RANGE, output);
    }

    fn serialize_parameter(&mut self, parameter: &Parameter, output: &mut String) {
        let extra = &parameter.extra;
        self.open_with(wire::PARAMETER, &extra.attributes, output);
        self.write_ids(extra, &parameter.object_guid, &parameter.revision_guid, parameter.sequence, output);
        self.field(extra, wire::NOMINAL, parameter.nominal.as_str(), output);
        self.field(extra, wire::UNIT, &parameter.unit, output);
        self.field(extra, wire::FREQUENCY, parameter.frequency.as_str(), output);
        self.write_audit(extra, &parameter.audit, output);
        self.write_extra_elements(extra, output);
        self.close(wire::PARAMETER, output);
    }

    fn serialize_specification(&mut self, spec: &Specification, output: &mut String) {
        let extra = &spec.extra;
        self.open_with(wire::SPECIFICATION, &extra.attributes, output);
        self.write_ids(extra, &spec.object_guid, &spec.revision_guid, spec.sequence, output);
        self.field(extra, wire::TIME_PERIOD, &spec.time_period, output);
        self.field(extra, wire::ACCURACY_READING, spec.accuracy_reading.as_str(), output);
        self.field(extra, wire::ACCURACY_RANGE, spec.accuracy_range.as_str(), output);
        self.field(extra, wire::FLOOR, spec.floor.as_str(), output);
        self.field(extra, wire::UNIT, &spec.unit, output);
        self.write_audit(extra, &spec.audit, output);
        self.write_extra_elements(extra, output);
        self.close(wire::SPECIFICATION, output);
    }

    /// Primary identifier always precedes the secondary one
    fn write_ids(
        &self,
        extra: &Extras,
        primary: &Identifier,
        secondary: &Identifier,
        sequence: u32,
        output: &mut String,
    ) {
        self.field(extra, wire::OBJECT_GUID, primary.as_str(), output);
        self.field(extra, wire::REVISION_GUID, secondary.as_str(), output);
        self.field(extra, wire::SEQUENCE, &sequence.to_string(), output);
    }

    fn write_audit(&mut self, extra: &Extras, audit: &Audit, output: &mut String) {
        self.field(extra, wire::VERIFIED, encode_bool(audit.verified), output);
        self.field(extra, wire::REVIEW, encode_bool(audit.review), output);

        if audit.notes.is_empty() {
            self.field(extra, wire::NOTES, "", output);
            return;
        }
        self.open_with(wire::NOTES, extra.field_attributes(wire::NOTES), output);
        for note in &audit.notes {
            self.write_field(wire::NOTE, note, output);
        }
        self.close(wire::NOTES, output);
    }

    /// Unrecognized elements go after the entity's own fields
    fn write_extra_elements(&mut self, extra: &Extras, output: &mut String) {
        for element in &extra.elements {
            self.write_raw(element, output);
        }
    }

    fn write_raw(&mut self, element: &RawElement, output: &mut String) {
        if element.children.is_empty() {
            self.write_element(&element.name, &element.attributes, &element.text, output);
            return;
        }

        self.open_with(&element.name, &element.attributes, output);
        if !element.text.is_empty() {
            self.write_indent(output);
            output.push_str(&escape_text(&element.text));
            self.newline(output);
        }
        for child in &element.children {
            self.write_raw(child, output);
        }
        self.close(&element.name, output);
    }

    /// Absent collapses to the same wire form as empty
    fn write_optional(&self, extra: &Extras, name: &str, value: &Option<String>, output: &mut String) {
        self.field(extra, name, value.as_deref().unwrap_or(""), output);
    }

    fn field(&self, extra: &Extras, name: &str, value: &str, output: &mut String) {
        self.write_element(name, extra.field_attributes(name), value, output);
    }

    fn write_field(&self, name: &str, value: &str, output: &mut String) {
        self.write_element(name, &[], value, output);
    }

    fn write_element(&self, name: &str, attributes: &[(String, String)], value: &str, output: &mut String) {
        self.write_indent(output);
        output.push('<');
        output.push_str(name);
        write_attributes(attributes, output);
        output.push('>');
        output.push_str(&escape_text(value));
        output.push_str("</");
        output.push_str(name);
        output.push('>');
        self.newline(output);
    }

    fn open_with(&mut self, name: &str, attributes: &[(String, String)], output: &mut String) {
        self.write_indent(output);
        output.push('<');
        output.push_str(name);
        write_attributes(attributes, output);
        output.push('>');
        self.newline(output);
        self.indent_level += 1;
    }

    fn close(&mut self, name: &str, output: &mut String) {
        self.indent_level = self.indent_level.saturating_sub(1);
        self.write_indent(output);
        output.push_str("</");
        output.push_str(name);
        output.push('>');
        self.newline(output);
    }

    fn write_indent(&self, output: &mut String) {
        for _ in 0..self.indent_level {
            output.push_str(&self.options.indent);
        }
    }

    fn newline(&self, output: &mut String) {
        output.push_str(self.options.line_ending.as_str());
    }
}

fn write_attributes(attributes: &[(String, String)], output: &mut String) {
    for (name, value) in attributes {
        output.push(' ');
        output.push_str(name);
        output.push_str("=\"");
        output.push_str(&escape_attr(value));
        output.push('"');
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize with default formatting (two-space indent, LF, XML declaration)
pub fn serialize(doc: &Instrument) -> String {
    Serializer::new().serialize(doc)
}

pub fn serialize_with(doc: &Instrument, options: SerializerOptions) -> String {
    Serializer::with_options(options).serialize(doc)
}
