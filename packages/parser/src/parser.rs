use crate::ast::*;
use crate::error::{FormatError, FormatResult};
use crate::escape::decode_text;
use crate::id_generator::{null_identifier, Identifier};
use crate::tokenizer::{tokenize, Token};
use crate::wire::{self, decode_bool};
use std::borrow::Cow;
use tracing::{debug, warn};

/// Generic element tree, built before normalization into the MSF model
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct XmlElement<'src> {
    pub name: &'src str,
    pub attributes: Vec<(&'src str, Cow<'src, str>)>,
    pub children: Vec<XmlNode<'src>>,
    pub pos: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum XmlNode<'src> {
    Element(XmlElement<'src>),
    Text(Cow<'src, str>),
}

/// Parser for MSF documents
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(Token<'src>, std::ops::Range<usize>)>,
    pos: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> FormatResult<Self> {
        let tokens = tokenize(source)?;
        Ok(Self {
            source,
            tokens,
            pos: 0,
        })
    }

    /// Parse a complete document into the normalized tree
    pub fn parse_document(&mut self) -> FormatResult<Instrument> {
        let root = self.parse_element_tree()?;

        if root.name != wire::ROOT {
            return Err(FormatError::wrong_root(root.pos, wire::ROOT, root.name));
        }

        Ok(build_instrument(&root))
    }

    /// Build the element tree, checking well-formedness along the way.
    ///
    /// Uses an explicit stack so deeply nested input cannot overflow.
    pub(crate) fn parse_element_tree(&mut self) -> FormatResult<XmlElement<'src>> {
        let mut stack: Vec<XmlElement<'src>> = Vec::new();
        let mut root: Option<XmlElement<'src>> = None;

        while let Some((token, span)) = self.advance() {
            match token {
                Token::ProcessingInstruction(_) | Token::Comment | Token::Doctype => {}
                Token::Text(text) => match stack.last_mut() {
                    Some(parent) => {
                        let decoded = decode_text(text, span.start)?;
                        parent.children.push(XmlNode::Text(decoded));
                    }
                    None if without_bom(text, span.start).trim().is_empty() => {}
                    None => {
                        return Err(FormatError::invalid_syntax(
                            span.start,
                            "text outside the root element",
                        ));
                    }
                },
                Token::CData(text) => match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Text(Cow::Borrowed(text))),
                    None => {
                        return Err(FormatError::invalid_syntax(
                            span.start,
                            "CDATA outside the root element",
                        ));
                    }
                },
                Token::StartTag(tag) => {
                    if root.is_some() {
                        return Err(FormatError::invalid_syntax(
                            span.start,
                            "multiple root elements",
                        ));
                    }
                    let (element, self_closing) = parse_start_tag(tag, span.start)?;
                    if self_closing {
                        attach(&mut stack, &mut root, element);
                    } else {
                        stack.push(element);
                    }
                }
                Token::EndTag(tag) => {
                    let name = tag[2..tag.len() - 1].trim_end();
                    let element = stack.pop().ok_or_else(|| {
                        FormatError::unexpected_token(span.start, "start tag", tag)
                    })?;
                    if element.name != name {
                        return Err(FormatError::unexpected_token(
                            span.start,
                            format!("</{}>", element.name),
                            tag,
                        ));
                    }
                    attach(&mut stack, &mut root, element);
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(FormatError::unexpected_eof(
                self.source.len(),
                format!("</{}>", open.name),
            ));
        }

        root.ok_or(FormatError::MissingRoot)
    }

    fn advance(&mut self) -> Option<(Token<'src>, std::ops::Range<usize>)> {
        let next = self.tokens.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }
}

/// Parse MSF source text into an [`Instrument`] tree
pub fn parse(source: &str) -> FormatResult<Instrument> {
    Parser::new(source)?.parse_document()
}

/// A byte-order mark may only precede everything else
fn without_bom(text: &str, pos: usize) -> &str {
    if pos == 0 {
        text.strip_prefix(wire::BYTE_ORDER_MARK).unwrap_or(text)
    } else {
        text
    }
}

fn attach<'src>(
    stack: &mut [XmlElement<'src>],
    root: &mut Option<XmlElement<'src>>,
    element: XmlElement<'src>,
) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => *root = Some(element),
    }
}

fn parse_start_tag(tag: &str, pos: usize) -> FormatResult<(XmlElement<'_>, bool)> {
    let self_closing = tag.ends_with("/>");
    let inner = &tag[1..tag.len() - if self_closing { 2 } else { 1 }];
    let name_end = inner
        .find(|c: char| c.is_whitespace())
        .unwrap_or(inner.len());
    let name = &inner[..name_end];

    if !is_xml_name(name) {
        return Err(FormatError::invalid_syntax(
            pos + 1,
            format!("invalid element name '{}'", name),
        ));
    }

    let attributes = parse_attributes(&inner[name_end..], pos + 1 + name_end)?;

    Ok((
        XmlElement {
            name,
            attributes,
            children: Vec::new(),
            pos,
        },
        self_closing,
    ))
}

fn parse_attributes(src: &str, base: usize) -> FormatResult<Vec<(&str, Cow<'_, str>)>> {
    let bytes = src.as_bytes();
    let mut attributes: Vec<(&str, Cow<'_, str>)> = Vec::new();
    let mut i = 0;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
            i += 1;
        }
        let name = &src[name_start..i];
        if !is_xml_name(name) {
            return Err(FormatError::invalid_syntax(
                base + name_start,
                format!("invalid attribute name '{}'", name),
            ));
        }

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            return Err(FormatError::invalid_syntax(
                base + i,
                format!("expected '=' after attribute '{}'", name),
            ));
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let quote = match bytes.get(i) {
            Some(b'"') => '"',
            Some(b'\'') => '\'',
            _ => {
                return Err(FormatError::invalid_syntax(
                    base + i,
                    format!("attribute '{}' value must be quoted", name),
                ));
            }
        };
        let value_start = i + 1;
        let len = src[value_start..].find(quote).ok_or_else(|| {
            FormatError::invalid_syntax(base + i, "unterminated attribute value")
        })?;
        let raw = &src[value_start..value_start + len];
        if raw.contains('<') {
            return Err(FormatError::invalid_syntax(
                base + value_start,
                "'<' is not allowed in attribute values",
            ));
        }
        if attributes.iter().any(|(existing, _)| *existing == name) {
            return Err(FormatError::invalid_syntax(
                base + name_start,
                format!("duplicate attribute '{}'", name),
            ));
        }

        attributes.push((name, decode_text(raw, base + value_start)?));
        i = value_start + len + 1;
    }

    Ok(attributes)
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
}

// ---------------------------------------------------------------------------
// Normalization: element tree -> MSF model
// ---------------------------------------------------------------------------

impl<'src> XmlElement<'src> {
    fn child(&self, name: &str) -> Option<&XmlElement<'src>> {
        self.elements().find(|e| e.name == name)
    }

    fn elements(&self) -> impl Iterator<Item = &XmlElement<'src>> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenated direct text content
    fn text(&self) -> Cow<'_, str> {
        let mut texts = self.children.iter().filter_map(|node| match node {
            XmlNode::Text(t) => Some(t.as_ref()),
            XmlNode::Element(_) => None,
        });
        let first = match texts.next() {
            Some(first) => first,
            None => return Cow::Borrowed(""),
        };
        match texts.next() {
            None => Cow::Borrowed(first),
            Some(second) => {
                let mut joined = String::from(first);
                joined.push_str(second);
                texts.for_each(|t| joined.push_str(t));
                Cow::Owned(joined)
            }
        }
    }

    /// Repeatable children, whether bare or inside a named wrapper.
    ///
    /// Always yields a list in document order, even for a single occurrence.
    fn repeated(&self, item: &str, wrapper: &str) -> Vec<&XmlElement<'src>> {
        let mut items = Vec::new();
        for element in self.elements() {
            if element.name == item {
                items.push(element);
            } else if element.name == wrapper {
                items.extend(element.elements().filter(|e| e.name == item));
            }
        }
        items
    }

    fn text_field(&self, name: &str) -> String {
        self.child(name)
            .map(|e| e.text().into_owned())
            .unwrap_or_default()
    }

    /// Absent-capable field: missing and empty both become `None`
    fn optional_field(&self, name: &str) -> Option<String> {
        self.child(name)
            .map(|e| e.text().into_owned())
            .filter(|text| !text.is_empty())
    }

    fn bool_field(&self, name: &str) -> bool {
        self.child(name).map_or(false, |e| decode_bool(&e.text()))
    }

    fn numeric_field(&self, name: &str) -> Numeric {
        Numeric::new(self.text_field(name))
    }

    fn identifier(&self, name: &str) -> Identifier {
        match self.child(name).map(|e| e.text()) {
            Some(text) if !text.trim().is_empty() => Identifier::from_raw(text.trim()),
            _ => {
                warn!(
                    "<{}> at byte {} has no {}; using null identifier",
                    self.name, self.pos, name
                );
                null_identifier()
            }
        }
    }

    fn sequence(&self, position: usize) -> u32 {
        let raw = self.text_field(wire::SEQUENCE);
        match raw.trim().parse::<u32>() {
            Ok(sequence) => sequence,
            Err(_) => {
                warn!(
                    "<{}> at byte {} has invalid sequence {:?}; using position {}",
                    self.name, self.pos, raw, position
                );
                position as u32
            }
        }
    }

    fn audit(&self) -> Audit {
        Audit {
            verified: self.bool_field(wire::VERIFIED),
            review: self.bool_field(wire::REVIEW),
            notes: self
                .repeated(wire::NOTE, wire::NOTES)
                .into_iter()
                .map(|note| note.text().into_owned())
                .collect(),
        }
    }

    /// Owned copy of this element, carried through a save unchanged
    fn to_raw(&self) -> RawElement {
        let children: Vec<RawElement> = self.elements().map(XmlElement::to_raw).collect();
        let text = self.text();
        let text = if children.is_empty() {
            text.into_owned()
        } else {
            text.trim().to_string()
        };

        RawElement {
            name: self.name.to_string(),
            attributes: owned_attributes(&self.attributes),
            text,
            children,
        }
    }

    /// Everything on this entity element the model does not read.
    ///
    /// `fields` are read once, so a repeated field lands in the extras.
    /// `entities` have extras of their own. `lists` pairs each repeatable
    /// item with its wrapper; unknown elements inside a wrapper move to
    /// this entity.
    fn extras(&self, fields: &[&str], entities: &[&str], lists: &[(&str, &str)]) -> Extras {
        let mut extra = Extras {
            attributes: owned_attributes(&self.attributes),
            ..Extras::default()
        };
        let mut seen: Vec<&str> = Vec::new();

        for element in self.elements() {
            let name = element.name;

            if let Some((item, _)) = lists.iter().find(|(_, wrapper)| *wrapper == name) {
                if WRITTEN_WRAPPERS.contains(&name) {
                    record_field_attributes(&mut extra, element);
                }
                for inner in element.elements().filter(|e| e.name != *item) {
                    debug!("keeping unknown element <{}> in <{}>", inner.name, name);
                    extra.elements.push(inner.to_raw());
                }
            } else if lists.iter().any(|(item, _)| *item == name) {
                continue;
            } else if entities.contains(&name) && !seen.contains(&name) {
                seen.push(name);
            } else if fields.contains(&name) && !seen.contains(&name) {
                seen.push(name);
                record_field_attributes(&mut extra, element);
            } else {
                debug!("keeping unknown element <{}> in <{}>", name, self.name);
                extra.elements.push(element.to_raw());
            }
        }

        extra
    }
}

/// Wrappers the serializer always writes, so their attributes have a home
const WRITTEN_WRAPPERS: [&str; 2] = [wire::FUNCTIONS, wire::NOTES];

const COMMON_FIELDS: [&str; 5] = [
    wire::OBJECT_GUID,
    wire::REVISION_GUID,
    wire::SEQUENCE,
    wire::VERIFIED,
    wire::REVIEW,
];

fn owned_attributes(attributes: &[(&str, Cow<'_, str>)]) -> Vec<(String, String)> {
    attributes
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn record_field_attributes(extra: &mut Extras, element: &XmlElement<'_>) {
    if !element.attributes.is_empty() {
        extra
            .field_attributes
            .entry(element.name.to_string())
            .or_insert_with(|| owned_attributes(&element.attributes));
    }
}

fn entity_extras(
    el: &XmlElement<'_>,
    fields: &[&str],
    entities: &[&str],
    lists: &[(&str, &str)],
) -> Extras {
    let mut all_fields: Vec<&str> = COMMON_FIELDS.to_vec();
    all_fields.extend_from_slice(fields);
    let mut all_lists: Vec<(&str, &str)> = vec![(wire::NOTE, wire::NOTES)];
    all_lists.extend_from_slice(lists);
    el.extras(&all_fields, entities, &all_lists)
}

fn build_instrument(root: &XmlElement<'_>) -> Instrument {
    let header = match root.child(wire::HEADER) {
        Some(header) => build_header(header),
        None => {
            warn!("document has no <{}>; using an empty header", wire::HEADER);
            Header::default()
        }
    };

    Instrument {
        object_guid: root.identifier(wire::OBJECT_GUID),
        revision_guid: root.identifier(wire::REVISION_GUID),
        sequence: root.sequence(0),
        format_version: root.text_field(wire::FORMAT_VERSION),
        audit: root.audit(),
        header,
        functions: root
            .repeated(wire::FUNCTION, wire::FUNCTIONS)
            .into_iter()
            .enumerate()
            .map(|(i, f)| build_function(f, i))
            .collect(),
        extra: entity_extras(
            root,
            &[wire::FORMAT_VERSION],
            &[wire::HEADER],
            &[(wire::FUNCTION, wire::FUNCTIONS)],
        ),
    }
}

fn build_header(el: &XmlElement<'_>) -> Header {
    Header {
        object_guid: el.identifier(wire::OBJECT_GUID),
        revision_guid: el.identifier(wire::REVISION_GUID),
        sequence: el.sequence(0),
        manufacturer: el.text_field(wire::MANUFACTURER),
        model: el.text_field(wire::MODEL),
        description: el.optional_field(wire::DESCRIPTION),
        instrument_type: el.text_field(wire::INSTRUMENT_TYPE),
        procedure_number: el.text_field(wire::PROCEDURE_NUMBER),
        revision: el.text_field(wire::REVISION),
        audit: el.audit(),
        extra: entity_extras(
            el,
            &[
                wire::MANUFACTURER,
                wire::MODEL,
                wire::DESCRIPTION,
                wire::INSTRUMENT_TYPE,
                wire::PROCEDURE_NUMBER,
                wire::REVISION,
            ],
            &[],
            &[],
        ),
    }
}

fn build_function(el: &XmlElement<'_>, position: usize) -> Function {
    Function {
        object_guid: el.identifier(wire::OBJECT_GUID),
        revision_guid: el.identifier(wire::REVISION_GUID),
        sequence: el.sequence(position),
        base_function: el.text_field(wire::BASE_FUNCTION),
        modifier: el.optional_field(wire::MODIFIER),
        unit: el.text_field(wire::UNIT),
        enabled: el.bool_field(wire::ENABLED),
        audit: el.audit(),
        view: ViewState::default(),
        ranges: el
            .repeated(wire::RANGE, wire::RANGES)
            .into_iter()
            .enumerate()
            .map(|(i, r)| build_range(r, i))
            .collect(),
        extra: entity_extras(
            el,
            &[wire::BASE_FUNCTION, wire::MODIFIER, wire::UNIT, wire::ENABLED],
            &[],
            &[(wire::RANGE, wire::RANGES)],
        ),
    }
}

fn build_range(el: &XmlElement<'_>, position: usize) -> Range {
    let parameter = match el.child(wire::PARAMETER) {
        Some(parameter) => build_parameter(parameter),
        None => {
            warn!(
                "<{}> at byte {} has no <{}>; using an empty parameter",
                el.name,
                el.pos,
                wire::PARAMETER
            );
            Parameter::default()
        }
    };

    Range {
        object_guid: el.identifier(wire::OBJECT_GUID),
        revision_guid: el.identifier(wire::REVISION_GUID),
        sequence: el.sequence(position),
        range_value: el.text_field(wire::RANGE_VALUE),
        frequency_band: el.optional_field(wire::FREQUENCY_BAND),
        resolution: el.numeric_field(wire::RESOLUTION),
        audit: el.audit(),
        view: ViewState::default(),
        parameter,
        specifications: el
            .repeated(wire::SPECIFICATION, wire::SPECIFICATIONS)
            .into_iter()
            .enumerate()
            .map(|(i, s)| build_specification(s, i))
            .collect(),
        extra: entity_extras(
            el,
            &[wire::RANGE_VALUE, wire::FREQUENCY_BAND, wire::RESOLUTION],
            &[wire::PARAMETER],
            &[(wire::SPECIFICATION, wire::SPECIFICATIONS)],
        ),
    }
}

fn build_parameter(el: &XmlElement<'_>) -> Parameter {
    Parameter {
        object_guid: el.identifier(wire::OBJECT_GUID),
        revision_guid: el.identifier(wire::REVISION_GUID),
        sequence: el.sequence(0),
        nominal: el.numeric_field(wire::NOMINAL),
        unit: el.text_field(wire::UNIT),
        frequency: el.numeric_field(wire::FREQUENCY),
        audit: el.audit(),
        extra: entity_extras(el, &[wire::NOMINAL, wire::UNIT, wire::FREQUENCY], &[], &[]),
    }
}

fn build_specification(el: &XmlElement<'_>, position: usize) -> Specification {
    Specification {
        object_guid: el.identifier(wire::OBJECT_GUID),
        revision_guid: el.identifier(wire::REVISION_GUID),
        sequence: el.sequence(position),
        time_period: el.text_field(wire::TIME_PERIOD),
        accuracy_reading: el.numeric_field(wire::ACCURACY_READING),
        accuracy_range: el.numeric_field(wire::ACCURACY_RANGE),
        floor: el.numeric_field(wire::FLOOR),
        unit: el.text_field(wire::UNIT),
        audit: el.audit(),
        extra: entity_extras(
            el,
            &[
                wire::TIME_PERIOD,
                wire::ACCURACY_READING,
                wire::ACCURACY_RANGE,
                wire::FLOOR,
                wire::UNIT,
            ],
            &[],
            &[],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(source: &str) -> FormatResult<XmlElement<'_>> {
        Parser::new(source)?.parse_element_tree()
    }

    #[test]
    fn test_element_tree_shape() {
        let root = tree("<MSF a=\"1\"><Header><Model>34401A</Model></Header></MSF>").unwrap();
        assert_eq!(root.name, "MSF");
        assert_eq!(root.attributes, vec![("a", Cow::Borrowed("1"))]);
        let header = root.child("Header").unwrap();
        assert_eq!(header.text_field("Model"), "34401A");
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = tree("<MSF><Header></MSF>").unwrap_err();
        assert_eq!(err, FormatError::unexpected_token(13, "</Header>", "</MSF>"));
    }

    #[test]
    fn test_unclosed_element() {
        let err = tree("<MSF><Header>").unwrap_err();
        assert!(matches!(err, FormatError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_multiple_roots() {
        assert!(tree("<MSF></MSF><MSF></MSF>").is_err());
    }

    #[test]
    fn test_text_outside_root() {
        assert!(tree("junk<MSF></MSF>").is_err());
        assert!(tree("  \n<MSF></MSF>\n").is_ok());
    }

    #[test]
    fn test_empty_input_has_no_root() {
        assert_eq!(tree("").unwrap_err(), FormatError::MissingRoot);
        assert_eq!(
            tree("<?xml version=\"1.0\"?>\n<!-- nothing -->").unwrap_err(),
            FormatError::MissingRoot
        );
    }

    #[test]
    fn test_attribute_errors() {
        assert!(tree("<MSF a=1></MSF>").is_err());
        assert!(tree("<MSF a=\"1\" a=\"2\"></MSF>").is_err());
        assert!(tree("<MSF a></MSF>").is_err());
    }

    #[test]
    fn test_text_concatenation_with_cdata() {
        let root = tree("<MSF><Note>a <![CDATA[<b>]]> c</Note></MSF>").unwrap();
        assert_eq!(root.text_field("Note"), "a <b> c");
    }

    #[test]
    fn test_repeated_bare_and_wrapped() {
        let root = tree(
            "<MSF><Function><Sequence>0</Sequence></Function>\
             <Functions><Function><Sequence>1</Sequence></Function></Functions></MSF>",
        )
        .unwrap();
        let items = root.repeated("Function", "Functions");
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].sequence(9), 1);
    }

    #[test]
    fn test_sequence_fallback() {
        let root = tree("<MSF><Function><Sequence>x</Sequence></Function></MSF>").unwrap();
        let function = root.child("Function").unwrap();
        assert_eq!(function.sequence(3), 3);
    }

    #[test]
    fn test_leading_byte_order_mark() {
        assert!(tree("\u{FEFF}<?xml version=\"1.0\"?>\n<MSF></MSF>").is_ok());
        assert!(tree("\u{FEFF}<MSF></MSF>").is_ok());
        // only at the very start
        assert!(tree("<?xml version=\"1.0\"?>\u{FEFF}<MSF></MSF>").is_err());
    }

    #[test]
    fn test_unknown_children_become_extras() {
        let root = tree(
            "<MSF><Function a=\"1\"><BaseFunction>DCV</BaseFunction><Tolerance>5</Tolerance>\
             <Unit system=\"SI\">V</Unit><Unit>mV</Unit><Ranges><Range/><Hint>x</Hint></Ranges>\
             </Function></MSF>",
        )
        .unwrap();
        let function = build_function(root.child("Function").unwrap(), 0);

        assert_eq!(function.unit, "V");
        assert_eq!(function.extra.attributes, vec![("a".to_string(), "1".to_string())]);
        assert_eq!(function.extra.field_attributes("Unit"), &[("system".to_string(), "SI".to_string())]);
        let names: Vec<&str> = function.extra.elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Tolerance", "Unit", "Hint"]);
        assert_eq!(function.extra.elements[0].text, "5");
    }

    #[test]
    fn test_raw_element_keeps_nesting() {
        let root = tree("<MSF><Limits kind=\"abs\">\n  <Low>1</Low>\n  <High>2</High>\n</Limits></MSF>").unwrap();
        let raw = root.child("Limits").unwrap().to_raw();
        assert_eq!(raw.attributes, vec![("kind".to_string(), "abs".to_string())]);
        assert_eq!(raw.text, "");
        assert_eq!(raw.children.len(), 2);
        assert_eq!(raw.children[1].text, "2");
    }

    #[test]
    fn test_wrong_root() {
        let err = parse("<Procedure></Procedure>").unwrap_err();
        assert_eq!(err, FormatError::wrong_root(0, "MSF", "Procedure"));
    }
}
