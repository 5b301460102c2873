use crate::id_generator::{null_identifier, Identifier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Numeric domain value kept as its source literal.
///
/// The literal is written back untouched, so `1.000` stays `1.000`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Numeric(String);

impl Numeric {
    pub fn new(literal: impl Into<String>) -> Self {
        Self(literal.into())
    }

    pub fn from_f64(value: f64) -> Self {
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parsed value, `None` when the literal is empty or not a number
    pub fn value(&self) -> Option<f64> {
        self.0.trim().parse().ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Review state shared by every entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    pub verified: bool,
    pub review: bool,
    pub notes: Vec<String>,
}

/// Editor-only presentation state. Never written to the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub expanded: bool,
    pub selected: bool,
}

/// Element the model has no field for, carried through a save unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawElement {
    pub name: String,
    /// Attributes in source order
    pub attributes: Vec<(String, String)>,
    /// Direct text content, trimmed when the element also has child elements
    pub text: String,
    pub children: Vec<RawElement>,
}

/// Wire content of an entity that the model does not interpret
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extras {
    /// Attributes of the entity's own element (namespace declarations etc.)
    pub attributes: Vec<(String, String)>,
    /// Attributes found on known field elements, by element name
    pub field_attributes: BTreeMap<String, Vec<(String, String)>>,
    /// Unrecognized child elements, in source order
    pub elements: Vec<RawElement>,
}

impl Extras {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.field_attributes.is_empty() && self.elements.is_empty()
    }

    pub fn field_attributes(&self, field: &str) -> &[(String, String)] {
        self.field_attributes
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Root document node (`<MSF>`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub object_guid: Identifier,
    pub revision_guid: Identifier,
    pub sequence: u32,
    pub format_version: String,
    pub audit: Audit,
    pub header: Header,
    pub functions: Vec<Function>,
    pub extra: Extras,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub object_guid: Identifier,
    pub revision_guid: Identifier,
    pub sequence: u32,
    pub manufacturer: String,
    pub model: String,
    pub description: Option<String>,
    pub instrument_type: String,
    pub procedure_number: String,
    pub revision: String,
    pub audit: Audit,
    pub extra: Extras,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub object_guid: Identifier,
    pub revision_guid: Identifier,
    pub sequence: u32,
    pub base_function: String,
    pub modifier: Option<String>,
    pub unit: String,
    pub enabled: bool,
    pub audit: Audit,
    pub view: ViewState,
    pub ranges: Vec<Range>,
    pub extra: Extras,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub object_guid: Identifier,
    pub revision_guid: Identifier,
    pub sequence: u32,
    pub range_value: String,
    pub frequency_band: Option<String>,
    pub resolution: Numeric,
    pub audit: Audit,
    pub view: ViewState,
    pub parameter: Parameter,
    pub specifications: Vec<Specification>,
    pub extra: Extras,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub object_guid: Identifier,
    pub revision_guid: Identifier,
    pub sequence: u32,
    pub nominal: Numeric,
    pub unit: String,
    pub frequency: Numeric,
    pub audit: Audit,
    pub extra: Extras,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub object_guid: Identifier,
    pub revision_guid: Identifier,
    pub sequence: u32,
    pub time_period: String,
    pub accuracy_reading: Numeric,
    pub accuracy_range: Numeric,
    pub floor: Numeric,
    pub unit: String,
    pub audit: Audit,
    pub extra: Extras,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            object_guid: null_identifier(),
            revision_guid: null_identifier(),
            sequence: 0,
            manufacturer: String::new(),
            model: String::new(),
            description: None,
            instrument_type: String::new(),
            procedure_number: String::new(),
            revision: String::new(),
            audit: Audit::default(),
            extra: Extras::default(),
        }
    }
}

impl Default for Parameter {
    fn default() -> Self {
        Self {
            object_guid: null_identifier(),
            revision_guid: null_identifier(),
            sequence: 0,
            nominal: Numeric::default(),
            unit: String::new(),
            frequency: Numeric::default(),
            audit: Audit::default(),
            extra: Extras::default(),
        }
    }
}

impl Instrument {
    /// Empty document with fresh identifiers, for trees built outside the parser
    pub fn new() -> Self {
        Self {
            object_guid: Identifier::generate(),
            revision_guid: Identifier::generate(),
            sequence: 0,
            format_version: String::new(),
            audit: Audit::default(),
            header: Header {
                object_guid: Identifier::generate(),
                revision_guid: Identifier::generate(),
                ..Header::default()
            },
            functions: Vec::new(),
            extra: Extras::default(),
        }
    }

    pub fn find_function(&self, id: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.object_guid.as_str() == id)
    }

    pub fn find_function_mut(&mut self, id: &str) -> Option<&mut Function> {
        self.functions.iter_mut().find(|f| f.object_guid.as_str() == id)
    }

    pub fn find_range_mut(&mut self, id: &str) -> Option<&mut Range> {
        self.functions
            .iter_mut()
            .flat_map(|f| f.ranges.iter_mut())
            .find(|r| r.object_guid.as_str() == id)
    }

    /// Audit block of any entity, looked up by primary identifier
    pub fn find_audit_mut(&mut self, id: &str) -> Option<&mut Audit> {
        if self.object_guid.as_str() == id {
            return Some(&mut self.audit);
        }
        if self.header.object_guid.as_str() == id {
            return Some(&mut self.header.audit);
        }
        for function in &mut self.functions {
            if function.object_guid.as_str() == id {
                return Some(&mut function.audit);
            }
            for range in &mut function.ranges {
                if range.object_guid.as_str() == id {
                    return Some(&mut range.audit);
                }
                if range.parameter.object_guid.as_str() == id {
                    return Some(&mut range.parameter.audit);
                }
                if let Some(spec) = range
                    .specifications
                    .iter_mut()
                    .find(|s| s.object_guid.as_str() == id)
                {
                    return Some(&mut spec.audit);
                }
            }
        }
        None
    }

    /// Dense 0-based sequence numbers for the functions. Nested collections
    /// keep their numbering.
    pub fn resequence(&mut self) {
        for (i, function) in self.functions.iter_mut().enumerate() {
            function.sequence = i as u32;
        }
    }

    /// Total number of entities in the tree, root included
    pub fn entity_count(&self) -> usize {
        2 + self
            .functions
            .iter()
            .map(|f| {
                1 + f
                    .ranges
                    .iter()
                    .map(|r| 2 + r.specifications.len())
                    .sum::<usize>()
            })
            .sum::<usize>()
    }
}

impl Function {
    /// Display name used by the editor outline, e.g. "DC Voltage (4-wire)"
    pub fn display_name(&self) -> String {
        match self.modifier.as_deref() {
            Some(modifier) if !modifier.is_empty() => {
                format!("{} ({})", self.base_function, modifier)
            }
            _ => self.base_function.clone(),
        }
    }

    pub fn resequence(&mut self) {
        for (i, range) in self.ranges.iter_mut().enumerate() {
            range.sequence = i as u32;
        }
    }
}

impl Range {
    pub fn resequence(&mut self) {
        for (i, spec) in self.specifications.iter_mut().enumerate() {
            spec.sequence = i as u32;
        }
    }
}
