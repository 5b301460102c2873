//! Integration tests for editor crate

use msf_editor::{
    extract_template, instantiate, Document, MemoryStorage, Mutation, PageMappingIndex, Template,
    TemplateLibrary,
};
use msf_parser::{extract_all_identifiers, is_valid, parse, Identifier};
use std::collections::HashSet;

const SAMPLE: &str = include_str!("../../parser/tests/fixtures/34401A.msf");

fn load() -> Document {
    Document::from_source("/procedures/34401A.msf", SAMPLE.to_string()).unwrap()
}

#[test]
fn test_cascade_delete_first_function() {
    let mut doc = load();
    assert_eq!(doc.instrument().functions.len(), 5);

    let first = doc.instrument().functions[0].clone();
    let doomed: HashSet<Identifier> = {
        let mut ids = vec![first.object_guid.clone(), first.revision_guid.clone()];
        for range in &first.ranges {
            ids.push(range.object_guid.clone());
            ids.push(range.parameter.object_guid.clone());
            ids.extend(range.specifications.iter().map(|s| s.object_guid.clone()));
        }
        ids.into_iter().collect()
    };

    let result = doc.apply(Mutation::RemoveFunction {
        function_id: first.object_guid.to_string(),
    });
    assert!(result.is_some());

    let instrument = doc.instrument();
    assert_eq!(instrument.functions.len(), 4);
    assert_eq!(instrument.functions[0].base_function, "AC Voltage");

    let remaining: HashSet<Identifier> = extract_all_identifiers(instrument).into_iter().collect();
    assert!(remaining.is_disjoint(&doomed));

    let seqs: Vec<u32> = instrument.functions.iter().map(|f| f.sequence).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3]);

    // and the text reflects it after a round trip
    let reparsed = parse(&doc.serialize()).unwrap();
    assert_eq!(&reparsed, doc.instrument());
}

#[test]
fn test_remove_range_and_specification_resequence() {
    let mut doc = load();
    let dcv = &doc.instrument().functions[0];
    let range_id = dcv.ranges[0].object_guid.to_string();
    let spec_id = dcv.ranges[1].specifications[0].object_guid.to_string();

    assert!(doc.apply(Mutation::RemoveSpecification { specification_id: spec_id }).is_some());
    assert!(doc.apply(Mutation::RemoveRange { range_id: range_id.clone() }).is_some());
    assert!(doc.apply(Mutation::RemoveRange { range_id }).is_none());

    let dcv = &doc.instrument().functions[0];
    assert_eq!(dcv.ranges.len(), 1);
    assert_eq!(dcv.ranges[0].sequence, 0);
    assert!(dcv.ranges[0].specifications.iter().enumerate().all(|(i, s)| s.sequence == i as u32));
    assert_eq!(doc.version, 2);
}

#[test]
fn test_instantiation_uniqueness() {
    let doc = load();
    let template = extract_template(&doc.instrument().functions[0]);

    let a = instantiate(&template, 0);
    let b = instantiate(&template, 0);

    let ids = |f: &msf_parser::Function| -> HashSet<Identifier> {
        let mut out = vec![f.object_guid.clone(), f.revision_guid.clone()];
        for range in &f.ranges {
            out.push(range.object_guid.clone());
            out.push(range.revision_guid.clone());
            out.push(range.parameter.object_guid.clone());
            out.push(range.parameter.revision_guid.clone());
            for spec in &range.specifications {
                out.push(spec.object_guid.clone());
                out.push(spec.revision_guid.clone());
            }
        }
        out.into_iter().collect()
    };

    let ids_a = ids(&a);
    let ids_b = ids(&b);
    assert_eq!(ids_a.len(), 2 + 4 * a.ranges.len() + 2 * a.ranges.iter().map(|r| r.specifications.len()).sum::<usize>());
    assert!(ids_a.is_disjoint(&ids_b));
    assert!(ids_a.iter().all(|id| is_valid(id.as_str())));

    let source_ids: HashSet<Identifier> = extract_all_identifiers(doc.instrument()).into_iter().collect();
    assert!(ids_a.is_disjoint(&source_ids));
}

#[test]
fn test_template_stripping() {
    let doc = load();
    let function = &doc.instrument().functions[0];
    assert!(function.audit.verified);

    let template = extract_template(function);
    let json = serde_json::to_value(&template).unwrap();
    let text = json.to_string();

    for leaked in ["Guid", "guid", "verified", "review", "notes", "sequence", "expanded"] {
        assert!(!text.contains(leaked), "template leaks {}", leaked);
    }

    let stamped = instantiate(&template, 3);
    assert_eq!(stamped.base_function, function.base_function);
    assert_eq!(stamped.ranges.len(), function.ranges.len());
    assert!(!stamped.audit.verified);
    assert!(stamped.audit.notes.is_empty());
}

#[test]
fn test_custom_template_from_json() {
    let json = r#"{
        "kind": "specification",
        "timePeriod": "2 Year",
        "accuracyReading": "0.0045",
        "accuracyRange": "0.0006",
        "floor": "",
        "unit": "%"
    }"#;
    let template: Template = serde_json::from_str(json).unwrap();

    let mut library = TemplateLibrary::builtin();
    library.register("spec-2-year", template);

    let mut doc = load();
    let range_id = doc.instrument().functions[0].ranges[0].object_guid.to_string();
    let spec = library.specification("spec-2-year").cloned().unwrap();

    let result = doc
        .apply(Mutation::InsertSpecification { range_id, index: 0, template: spec })
        .unwrap();

    let range = &doc.instrument().functions[0].ranges[0];
    assert_eq!(range.specifications[0].object_guid, result.inserted.unwrap());
    assert_eq!(range.specifications[0].time_period, "2 Year");
    assert_eq!(range.specifications[1].sequence, 1);
}

#[test]
fn test_page_mapping_for_document() -> anyhow::Result<()> {
    let doc = load();
    let functions = &doc.instrument().functions;
    let mut pages = PageMappingIndex::new();
    let mut storage = MemoryStorage::new();

    let estimated: Vec<u32> = functions
        .iter()
        .enumerate()
        .map(|(i, f)| pages.resolve_page(f.object_guid.as_str(), i, functions.len(), Some(20)))
        .collect();
    assert_eq!(estimated[0], 1);
    assert!(estimated.windows(2).all(|w| w[0] <= w[1]));

    assert!(pages.set(functions[2].object_guid.as_str(), 14));
    assert!(pages.persist(&mut storage, &doc.path_key()));

    let mut restored = PageMappingIndex::new();
    assert!(restored.load_persisted(&storage, &doc.path_key()));
    assert_eq!(
        restored.resolve_page(functions[2].object_guid.as_str(), 2, functions.len(), Some(20)),
        14
    );

    Ok(())
}

#[test]
fn test_unknown_content_survives_edit_and_commit() {
    let source = SAMPLE.replacen(
        "<FormatVersion>3.2</FormatVersion>",
        "<FormatVersion>3.2</FormatVersion>\n  <Calibrator model=\"5720A\">Fluke</Calibrator>",
        1,
    );
    let mut doc = Document::from_source("/procedures/34401A.msf", source).unwrap();
    let last = doc.instrument().functions[4].object_guid.to_string();

    assert!(doc.apply(Mutation::RemoveFunction { function_id: last }).is_some());
    let text = doc.commit(&Default::default()).to_string();

    assert!(text.contains("<Calibrator model=\"5720A\">Fluke</Calibrator>"));
    assert!(text.contains("xmlns:xsi="));
}
