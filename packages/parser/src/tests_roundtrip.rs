/// Round-trip tests: parse → serialize → parse keeps structure and identity
use crate::*;

const SAMPLE: &str = include_str!("../tests/fixtures/34401A.msf");

/// Same content shape as a hand-authored export: no wrappers, self-closing
/// empties, CRLF line endings, comments and attributes on inner elements.
const HAND_AUTHORED: &str = "<?xml version=\"1.0\"?>\r\n\
<!-- exported by hand -->\r\n\
<MSF>\r\n\
<ObjectGUID>{11111111-1111-1111-1111-111111111111}</ObjectGUID>\r\n\
<RevisionGUID>{22222222-2222-2222-2222-222222222222}</RevisionGUID>\r\n\
<Header kind=\"main\"><ObjectGUID>{33333333-3333-3333-3333-333333333333}</ObjectGUID>\
<RevisionGUID>{44444444-4444-4444-4444-444444444444}</RevisionGUID><Model>8846A</Model>\
<Description/></Header>\r\n\
<Function>\r\n\
  <ObjectGUID>{55555555-5555-5555-5555-555555555555}</ObjectGUID>\r\n\
  <RevisionGUID>{66666666-6666-6666-6666-666666666666}</RevisionGUID>\r\n\
  <BaseFunction>DC Voltage</BaseFunction>\r\n\
  <Modifier/>\r\n\
  <Enabled>1</Enabled>\r\n\
  <Note>only note</Note>\r\n\
  <Range>\r\n\
    <ObjectGUID>{77777777-7777-7777-7777-777777777777}</ObjectGUID>\r\n\
    <RevisionGUID>{88888888-8888-8888-8888-888888888888}</RevisionGUID>\r\n\
    <RangeValue>10 V</RangeValue>\r\n\
    <Parameter><ObjectGUID>{99999999-9999-9999-9999-999999999999}</ObjectGUID>\
<RevisionGUID>{AAAAAAAA-AAAA-AAAA-AAAA-AAAAAAAAAAAA}</RevisionGUID><Nominal>10</Nominal></Parameter>\r\n\
    <Specification><ObjectGUID>{BBBBBBBB-BBBB-BBBB-BBBB-BBBBBBBBBBBB}</ObjectGUID>\
<RevisionGUID>{CCCCCCCC-CCCC-CCCC-CCCC-CCCCCCCCCCCC}</RevisionGUID><TimePeriod>1 Year</TimePeriod>\
<Verified>-1</Verified></Specification>\r\n\
  </Range>\r\n\
</Function>\r\n\
</MSF>\r\n";

#[test]
fn test_roundtrip_identifier_list() {
    let doc = parse(SAMPLE).unwrap();
    let reparsed = parse(&serialize(&doc)).unwrap();

    let source_ids = extract_all_identifiers(&doc);
    assert_eq!(source_ids.len(), 58);
    assert_eq!(source_ids, extract_all_identifiers(&reparsed));
}

#[test]
fn test_roundtrip_structural_equality() {
    let doc = parse(SAMPLE).unwrap();
    let reparsed = parse(&serialize(&doc)).unwrap();
    assert_eq!(doc, reparsed);

    let hand = parse(HAND_AUTHORED).unwrap();
    let hand_reparsed = parse(&serialize(&hand)).unwrap();
    assert_eq!(hand, hand_reparsed);
}

#[test]
fn test_canonical_document_is_reproduced_byte_for_byte() {
    let doc = parse(SAMPLE).unwrap();
    assert_eq!(serialize(&doc), SAMPLE);
}

#[test]
fn test_serialize_is_idempotent() {
    let hand = parse(HAND_AUTHORED).unwrap();
    let once = serialize(&hand);
    let twice = serialize(&parse(&once).unwrap());
    assert_eq!(once, twice);

    let built = Instrument::new();
    let once = serialize(&built);
    assert_eq!(serialize(&parse(&once).unwrap()), once);
}

#[test]
fn test_hand_authored_normalization() {
    let doc = parse(HAND_AUTHORED).unwrap();

    // single bare Function, Range, Specification, Note all become lists
    assert_eq!(doc.functions.len(), 1);
    let function = &doc.functions[0];
    assert_eq!(function.ranges.len(), 1);
    assert_eq!(function.ranges[0].specifications.len(), 1);
    assert_eq!(function.audit.notes, vec!["only note".to_string()]);

    // missing Sequence falls back to position
    assert_eq!(function.sequence, 0);

    // "1" is not the true sentinel
    assert!(!function.enabled);
    assert!(function.ranges[0].specifications[0].audit.verified);

    // designated optional fields: self-closing empty is absent
    assert_eq!(function.modifier, None);
    assert_eq!(doc.header.description, None);

    // ordinary text fields: missing is empty
    assert_eq!(function.unit, "");
    assert_eq!(doc.header.model, "8846A");
    assert_eq!(function.ranges[0].parameter.nominal.as_str(), "10");
}

#[test]
fn test_hand_authored_serializes_canonically() {
    let text = serialize(&parse(HAND_AUTHORED).unwrap());
    assert!(text.contains("<Functions>\n    <Function>"));
    assert!(text.contains("<Modifier></Modifier>"));
    assert!(text.contains("<Enabled>0</Enabled>"));
    assert!(!text.contains("/>"));
    assert!(!text.contains('\r'));
    assert!(text.contains("<Header kind=\"main\">"));
}

#[test]
fn test_unknown_content_survives_a_save() {
    let source = "<MSF><Function><BaseFunction>DCV</BaseFunction><Tolerance>5</Tolerance>\
                  <Range kind=\"x\"><RangeValue unit=\"V\">10</RangeValue>\
                  <Limits><Low>1</Low><High>2</High></Limits></Range></Function>\
                  <Calibrator model=\"5720A\"/></MSF>";
    let doc = parse(source).unwrap();
    let text = serialize(&doc);

    assert!(text.contains("<Tolerance>5</Tolerance>"));
    assert!(text.contains("<Range kind=\"x\">"));
    assert!(text.contains("<RangeValue unit=\"V\">10</RangeValue>"));
    assert!(text.contains("<Low>1</Low>"));
    assert!(text.contains("<Calibrator model=\"5720A\"></Calibrator>"));

    let reparsed = parse(&text).unwrap();
    assert_eq!(reparsed, doc);
    assert_eq!(serialize(&reparsed), text);
}

#[test]
fn test_byte_order_mark_is_accepted() {
    let doc = parse("\u{FEFF}<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<MSF></MSF>\n").unwrap();
    assert!(doc.functions.is_empty());

    let with_bom = format!("\u{FEFF}{}", SAMPLE);
    assert_eq!(parse(&with_bom).unwrap(), parse(SAMPLE).unwrap());
}

#[test]
fn test_sample_contents() {
    let doc = parse(SAMPLE).unwrap();
    assert_eq!(doc.header.manufacturer, "Keysight");
    assert_eq!(doc.header.description.as_deref(), Some("6½ digit multimeter"));
    assert_eq!(
        doc.extra.attributes,
        vec![(
            "xmlns:xsi".to_string(),
            "http://www.w3.org/2001/XMLSchema-instance".to_string()
        )]
    );

    let names: Vec<String> = doc.functions.iter().map(|f| f.display_name()).collect();
    assert_eq!(
        names,
        vec![
            "DC Voltage",
            "AC Voltage (True RMS)",
            "Resistance (4-wire)",
            "DC Current",
            "Frequency",
        ]
    );

    let dcv = &doc.functions[0];
    assert!(dcv.enabled);
    assert!(dcv.audit.verified);
    assert_eq!(dcv.audit.notes, vec!["Check <10 V ranges".to_string()]);
    assert_eq!(dcv.ranges.len(), 2);
    assert_eq!(dcv.ranges[0].frequency_band, None);
    assert_eq!(dcv.ranges[0].resolution.as_str(), "0.0000001");
    assert_eq!(dcv.ranges[0].specifications[1].time_period, "1 Year");
    assert_eq!(doc.functions[1].ranges[0].frequency_band.as_deref(), Some("3 Hz - 5 Hz"));
}

#[test]
fn test_every_parsed_entity_has_valid_identifiers() {
    let doc = parse(SAMPLE).unwrap();
    for id in extract_all_identifiers(&doc) {
        assert!(is_valid(id.as_str()), "bad id {}", id);
    }
}

#[test]
fn test_missing_identifiers_become_null() {
    let doc = parse("<MSF><Function><BaseFunction>X</BaseFunction></Function></MSF>").unwrap();
    let function = &doc.functions[0];
    assert!(function.object_guid.is_null());
    assert!(function.revision_guid.is_null());
    // missing Header is replaced by an empty one
    assert!(doc.header.object_guid.is_null());
}

#[test]
fn test_empty_string_vs_absent_is_per_field() {
    let source = "<MSF><Function><BaseFunction></BaseFunction><Modifier></Modifier>\
                  <Unit></Unit></Function></MSF>";
    let function = &parse(source).unwrap().functions[0];
    assert_eq!(function.base_function, "");
    assert_eq!(function.unit, "");
    assert_eq!(function.modifier, None);

    let source = "<MSF><Function><Modifier> </Modifier></Function></MSF>";
    assert_eq!(
        parse(source).unwrap().functions[0].modifier.as_deref(),
        Some(" ")
    );
}

#[test]
fn test_malformed_inputs_fail() {
    assert!(parse("").is_err());
    assert!(parse("not xml at all").is_err());
    assert!(parse("<MSF><Header></MSF>").is_err());
    assert!(parse("<MSF><Note>&nbsp;</Note></MSF>").is_err());
    assert!(matches!(
        parse("<msf></msf>"),
        Err(FormatError::WrongRoot { .. })
    ));
    let truncated = &SAMPLE[..SAMPLE.find("<Functions>").unwrap()];
    assert!(matches!(
        parse(truncated),
        Err(FormatError::UnexpectedEof { .. })
    ));
}

#[test]
fn test_boolean_fidelity_both_directions() {
    let mut doc = parse(SAMPLE).unwrap();
    doc.functions[3].enabled = false;
    doc.functions[4].audit.review = true;

    let text = serialize(&doc);
    let reparsed = parse(&text).unwrap();
    assert!(!reparsed.functions[3].enabled);
    assert!(reparsed.functions[4].audit.review);
    for line in text.lines().filter(|l| l.contains("<Enabled>") || l.contains("<Review>")) {
        assert!(line.contains(">-1<") || line.contains(">0<"), "{}", line);
    }
}
