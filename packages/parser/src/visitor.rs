use crate::ast::*;
use crate::id_generator::Identifier;

/// Visitor pattern for traversing the MSF tree immutably
///
/// This trait provides default implementations that walk the entire tree
/// in document order. Override specific visit_* methods to act on nodes.
pub trait Visitor: Sized {
    fn visit_instrument(&mut self, doc: &Instrument) {
        walk_instrument(self, doc);
    }

    fn visit_header(&mut self, _header: &Header) {
        // Leaf node, no children to walk
    }

    fn visit_function(&mut self, function: &Function) {
        walk_function(self, function);
    }

    fn visit_range(&mut self, range: &Range) {
        walk_range(self, range);
    }

    fn visit_parameter(&mut self, _parameter: &Parameter) {
        // Leaf node, no children to walk
    }

    fn visit_specification(&mut self, _spec: &Specification) {
        // Leaf node, no children to walk
    }
}

pub fn walk_instrument<V: Visitor>(visitor: &mut V, doc: &Instrument) {
    visitor.visit_header(&doc.header);
    for function in &doc.functions {
        visitor.visit_function(function);
    }
}

pub fn walk_function<V: Visitor>(visitor: &mut V, function: &Function) {
    for range in &function.ranges {
        visitor.visit_range(range);
    }
}

pub fn walk_range<V: Visitor>(visitor: &mut V, range: &Range) {
    visitor.visit_parameter(&range.parameter);
    for spec in &range.specifications {
        visitor.visit_specification(spec);
    }
}

/// Collects primary then secondary identifier of every entity, in document order
#[derive(Default)]
struct IdentifierCollector {
    ids: Vec<Identifier>,
}

impl IdentifierCollector {
    fn push(&mut self, primary: &Identifier, secondary: &Identifier) {
        self.ids.push(primary.clone());
        self.ids.push(secondary.clone());
    }
}

impl Visitor for IdentifierCollector {
    fn visit_instrument(&mut self, doc: &Instrument) {
        self.push(&doc.object_guid, &doc.revision_guid);
        walk_instrument(self, doc);
    }

    fn visit_header(&mut self, header: &Header) {
        self.push(&header.object_guid, &header.revision_guid);
    }

    fn visit_function(&mut self, function: &Function) {
        self.push(&function.object_guid, &function.revision_guid);
        walk_function(self, function);
    }

    fn visit_range(&mut self, range: &Range) {
        self.push(&range.object_guid, &range.revision_guid);
        walk_range(self, range);
    }

    fn visit_parameter(&mut self, parameter: &Parameter) {
        self.push(&parameter.object_guid, &parameter.revision_guid);
    }

    fn visit_specification(&mut self, spec: &Specification) {
        self.push(&spec.object_guid, &spec.revision_guid);
    }
}

/// Every identifier in the tree, duplicates preserved, for auditing and diffing
pub fn extract_all_identifiers(doc: &Instrument) -> Vec<Identifier> {
    let mut collector = IdentifierCollector::default();
    collector.visit_instrument(doc);
    collector.ids
}
