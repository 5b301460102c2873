//! # Templates
//!
//! Identity-free blueprints of Function, Range, Parameter and Specification
//! entities.
//!
//! A template carries only content fields. Identifiers, audit state and view
//! state do not exist on template types, so a template can never leak them.
//! Instantiation mints a fresh identifier pair at every level of the new tree.
//!
//! ```text
//! Function ──extract_template──▶ FunctionTemplate ──instantiate(seq)──▶ Function
//!  (ids, audit)                    (content only)                  (fresh ids)
//! ```

use msf_parser::{
    Audit, Extras, Function, Identifier, Numeric, Parameter, Range, Specification, ViewState,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Content blueprint for one entity type
pub trait Blueprint: Clone + Serialize + DeserializeOwned {
    type Entity;

    /// Deep copy of the content fields of `entity` and all its descendants
    fn from_entity(entity: &Self::Entity) -> Self;

    /// Build a new entity tree with fresh identifiers at every level
    fn instantiate(&self, sequence: u32) -> Self::Entity;
}

/// Entity types that have a blueprint
pub trait Templated: Sized {
    type Template: Blueprint<Entity = Self>;
}

pub fn extract_template<E: Templated>(entity: &E) -> E::Template {
    E::Template::from_entity(entity)
}

pub fn instantiate<B: Blueprint>(template: &B, sequence: u32) -> B::Entity {
    template.instantiate(sequence)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionTemplate {
    pub base_function: String,
    pub modifier: Option<String>,
    pub unit: String,
    pub enabled: bool,
    pub ranges: Vec<RangeTemplate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeTemplate {
    pub range_value: String,
    pub frequency_band: Option<String>,
    pub resolution: Numeric,
    pub parameter: ParameterTemplate,
    pub specifications: Vec<SpecificationTemplate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterTemplate {
    pub nominal: Numeric,
    pub unit: String,
    pub frequency: Numeric,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificationTemplate {
    pub time_period: String,
    pub accuracy_reading: Numeric,
    pub accuracy_range: Numeric,
    pub floor: Numeric,
    pub unit: String,
}

impl Blueprint for FunctionTemplate {
    type Entity = Function;

    fn from_entity(function: &Function) -> Self {
        Self {
            base_function: function.base_function.clone(),
            modifier: function.modifier.clone(),
            unit: function.unit.clone(),
            enabled: function.enabled,
            ranges: function.ranges.iter().map(RangeTemplate::from_entity).collect(),
        }
    }

    fn instantiate(&self, sequence: u32) -> Function {
        Function {
            object_guid: Identifier::generate(),
            revision_guid: Identifier::generate(),
            sequence,
            base_function: self.base_function.clone(),
            modifier: self.modifier.clone(),
            unit: self.unit.clone(),
            enabled: self.enabled,
            audit: Audit::default(),
            view: ViewState::default(),
            ranges: self
                .ranges
                .iter()
                .enumerate()
                .map(|(i, range)| range.instantiate(i as u32))
                .collect(),
            extra: Extras::default(),
        }
    }
}

impl Blueprint for RangeTemplate {
    type Entity = Range;

    fn from_entity(range: &Range) -> Self {
        Self {
            range_value: range.range_value.clone(),
            frequency_band: range.frequency_band.clone(),
            resolution: range.resolution.clone(),
            parameter: ParameterTemplate::from_entity(&range.parameter),
            specifications: range
                .specifications
                .iter()
                .map(SpecificationTemplate::from_entity)
                .collect(),
        }
    }

    fn instantiate(&self, sequence: u32) -> Range {
        Range {
            object_guid: Identifier::generate(),
            revision_guid: Identifier::generate(),
            sequence,
            range_value: self.range_value.clone(),
            frequency_band: self.frequency_band.clone(),
            resolution: self.resolution.clone(),
            audit: Audit::default(),
            view: ViewState::default(),
            parameter: self.parameter.instantiate(0),
            specifications: self
                .specifications
                .iter()
                .enumerate()
                .map(|(i, spec)| spec.instantiate(i as u32))
                .collect(),
            extra: Extras::default(),
        }
    }
}

impl Blueprint for ParameterTemplate {
    type Entity = Parameter;

    fn from_entity(parameter: &Parameter) -> Self {
        Self {
            nominal: parameter.nominal.clone(),
            unit: parameter.unit.clone(),
            frequency: parameter.frequency.clone(),
        }
    }

    fn instantiate(&self, sequence: u32) -> Parameter {
        Parameter {
            object_guid: Identifier::generate(),
            revision_guid: Identifier::generate(),
            sequence,
            nominal: self.nominal.clone(),
            unit: self.unit.clone(),
            frequency: self.frequency.clone(),
            audit: Audit::default(),
            extra: Extras::default(),
        }
    }
}

impl Blueprint for SpecificationTemplate {
    type Entity = Specification;

    fn from_entity(spec: &Specification) -> Self {
        Self {
            time_period: spec.time_period.clone(),
            accuracy_reading: spec.accuracy_reading.clone(),
            accuracy_range: spec.accuracy_range.clone(),
            floor: spec.floor.clone(),
            unit: spec.unit.clone(),
        }
    }

    fn instantiate(&self, sequence: u32) -> Specification {
        Specification {
            object_guid: Identifier::generate(),
            revision_guid: Identifier::generate(),
            sequence,
            time_period: self.time_period.clone(),
            accuracy_reading: self.accuracy_reading.clone(),
            accuracy_range: self.accuracy_range.clone(),
            floor: self.floor.clone(),
            unit: self.unit.clone(),
            audit: Audit::default(),
            extra: Extras::default(),
        }
    }
}

impl Templated for Function {
    type Template = FunctionTemplate;
}

impl Templated for Range {
    type Template = RangeTemplate;
}

impl Templated for Parameter {
    type Template = ParameterTemplate;
}

impl Templated for Specification {
    type Template = SpecificationTemplate;
}

/// Any stored template, tagged by entity kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Template {
    Function(FunctionTemplate),
    Range(RangeTemplate),
    Parameter(ParameterTemplate),
    Specification(SpecificationTemplate),
}

/// Named templates, looked up by key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateLibrary {
    templates: BTreeMap<String, Template>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library preloaded with the built-in templates
    pub fn builtin() -> Self {
        let mut library = Self::new();

        library.register("dc-voltage", Template::Function(dc_voltage()));
        library.register("ac-voltage", Template::Function(ac_voltage()));
        library.register("dc-current", Template::Function(dc_current()));
        library.register("resistance", Template::Function(resistance()));
        library.register("frequency", Template::Function(frequency()));

        library.register("range", Template::Range(range("", "", "", vec![spec_1_year("", "", "")])));
        library.register("spec-90-day", Template::Specification(spec("90 Day", "", "", "")));
        library.register("spec-1-year", Template::Specification(spec_1_year("", "", "")));

        library
    }

    /// Add or replace a template; returns the one it replaced
    pub fn register(&mut self, key: impl Into<String>, template: Template) -> Option<Template> {
        self.templates.insert(key.into(), template)
    }

    pub fn get(&self, key: &str) -> Option<&Template> {
        self.templates.get(key)
    }

    pub fn function(&self, key: &str) -> Option<&FunctionTemplate> {
        match self.get(key)? {
            Template::Function(template) => Some(template),
            _ => None,
        }
    }

    pub fn range(&self, key: &str) -> Option<&RangeTemplate> {
        match self.get(key)? {
            Template::Range(template) => Some(template),
            _ => None,
        }
    }

    pub fn specification(&self, key: &str) -> Option<&SpecificationTemplate> {
        match self.get(key)? {
            Template::Specification(template) => Some(template),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Template)> {
        self.templates.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn spec(time_period: &str, reading: &str, range: &str, unit: &str) -> SpecificationTemplate {
    SpecificationTemplate {
        time_period: time_period.to_string(),
        accuracy_reading: Numeric::new(reading),
        accuracy_range: Numeric::new(range),
        floor: Numeric::default(),
        unit: unit.to_string(),
    }
}

fn spec_1_year(reading: &str, range: &str, unit: &str) -> SpecificationTemplate {
    spec("1 Year", reading, range, unit)
}

fn range(
    range_value: &str,
    nominal: &str,
    unit: &str,
    specifications: Vec<SpecificationTemplate>,
) -> RangeTemplate {
    RangeTemplate {
        range_value: range_value.to_string(),
        frequency_band: None,
        resolution: Numeric::default(),
        parameter: ParameterTemplate {
            nominal: Numeric::new(nominal),
            unit: unit.to_string(),
            frequency: Numeric::default(),
        },
        specifications,
    }
}

fn function(base: &str, modifier: Option<&str>, unit: &str, ranges: Vec<RangeTemplate>) -> FunctionTemplate {
    FunctionTemplate {
        base_function: base.to_string(),
        modifier: modifier.map(str::to_string),
        unit: unit.to_string(),
        enabled: true,
        ranges,
    }
}

fn dc_voltage() -> FunctionTemplate {
    function(
        "DC Voltage",
        None,
        "V",
        vec![
            range("1 V", "1", "V", vec![spec_1_year("0.0040", "0.0007", "%")]),
            range("10 V", "10", "V", vec![spec_1_year("0.0035", "0.0005", "%")]),
        ],
    )
}

fn ac_voltage() -> FunctionTemplate {
    let mut ten_volt = range("10 V", "10", "V", vec![spec_1_year("0.06", "0.03", "%")]);
    ten_volt.frequency_band = Some("10 Hz - 20 kHz".to_string());
    ten_volt.parameter.frequency = Numeric::new("1000");

    function("AC Voltage", Some("True RMS"), "V", vec![ten_volt])
}

fn dc_current() -> FunctionTemplate {
    function(
        "DC Current",
        None,
        "A",
        vec![range("100 mA", "0.1", "A", vec![spec_1_year("0.050", "0.005", "%")])],
    )
}

fn resistance() -> FunctionTemplate {
    function(
        "Resistance",
        Some("4-wire"),
        "Ω",
        vec![range("10 kΩ", "10000", "Ω", vec![spec_1_year("0.010", "0.001", "%")])],
    )
}

fn frequency() -> FunctionTemplate {
    function(
        "Frequency",
        None,
        "Hz",
        vec![range("10 kHz", "10000", "Hz", vec![spec_1_year("0.010", "", "%")])],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_keys() {
        let library = TemplateLibrary::builtin();
        for key in ["dc-voltage", "ac-voltage", "dc-current", "resistance", "frequency"] {
            assert!(library.function(key).is_some(), "missing {}", key);
        }
        assert!(library.range("range").is_some());
        assert!(library.specification("spec-90-day").is_some());
        assert!(library.function("range").is_none());
        assert!(library.get("nope").is_none());
    }

    #[test]
    fn test_instantiate_assigns_descendant_sequences() {
        let template = TemplateLibrary::builtin().function("dc-voltage").cloned().unwrap();
        let function = instantiate(&template, 7);

        assert_eq!(function.sequence, 7);
        assert_eq!(function.ranges[0].sequence, 0);
        assert_eq!(function.ranges[1].sequence, 1);
        assert_eq!(function.ranges[1].parameter.sequence, 0);
        assert_eq!(function.ranges[1].specifications[0].sequence, 0);
        assert!(!function.audit.verified);
        assert!(function.audit.notes.is_empty());
        assert!(!function.view.expanded);
    }

    #[test]
    fn test_extract_drops_identity_and_audit() {
        let template = TemplateLibrary::builtin().function("resistance").cloned().unwrap();
        let mut function = instantiate(&template, 0);
        function.audit.verified = true;
        function.audit.notes.push("checked".to_string());
        function.view.selected = true;

        let extracted = extract_template(&function);
        assert_eq!(extracted, template);

        let json = serde_json::to_string(&extracted).unwrap();
        assert!(!json.contains("Guid"));
        assert!(!json.contains("verified"));
        assert!(!json.contains("notes"));
    }

    #[test]
    fn test_register_replaces() {
        let mut library = TemplateLibrary::new();
        assert!(library.is_empty());
        assert!(library
            .register("x", Template::Specification(SpecificationTemplate::default()))
            .is_none());
        assert!(library
            .register("x", Template::Function(FunctionTemplate::default()))
            .is_some());
        assert_eq!(library.len(), 1);
        assert!(library.function("x").is_some());
    }
}
