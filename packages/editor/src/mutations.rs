//! # Tree Mutations
//!
//! Semantic edits on an [`Instrument`] tree.
//!
//! ## Mutation Semantics
//!
//! ### Remove
//! - Deletes the entity and all descendants (a Function takes its Ranges,
//!   their Parameter and their Specifications with it)
//! - Remaining siblings are resequenced densely from 0
//!
//! ### Insert
//! - Instantiates a template with fresh identifiers at every level
//! - Index is clamped to the sibling count; siblings are resequenced
//!
//! ### Audit
//! - `SetVerified`, `SetReview` and `AddNote` address any entity by its
//!   primary identifier
//!
//! Invalid input never aborts an editing session: [`Mutation::apply`] logs a
//! warning and returns `false`.

use crate::templates::{Blueprint, FunctionTemplate, RangeTemplate, SpecificationTemplate};
use msf_parser::{is_valid, Identifier, Instrument};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    RemoveFunction {
        function_id: String,
    },

    RemoveRange {
        range_id: String,
    },

    RemoveSpecification {
        specification_id: String,
    },

    /// Insert a new Function built from a template at `index`
    InsertFunction {
        index: usize,
        template: FunctionTemplate,
    },

    InsertRange {
        function_id: String,
        index: usize,
        template: RangeTemplate,
    },

    InsertSpecification {
        range_id: String,
        index: usize,
        template: SpecificationTemplate,
    },

    SetVerified {
        entity_id: String,
        value: bool,
    },

    SetReview {
        entity_id: String,
        value: bool,
    },

    AddNote {
        entity_id: String,
        note: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Malformed identifier: {0}")]
    MalformedId(String),

    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    #[error("Range not found: {0}")]
    RangeNotFound(String),

    #[error("Specification not found: {0}")]
    SpecificationNotFound(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),
}

impl Mutation {
    /// Apply to `doc`; rejected mutations are logged and leave `doc` untouched
    pub fn apply(&self, doc: &mut Instrument) -> bool {
        match self.try_apply(doc) {
            Ok(_) => true,
            Err(e) => {
                warn!("rejected {}: {}", self.name(), e);
                false
            }
        }
    }

    /// Apply to `doc`, returning the primary identifier of an inserted entity
    pub fn try_apply(&self, doc: &mut Instrument) -> Result<Option<Identifier>, MutationError> {
        self.validate()?;

        match self {
            Mutation::RemoveFunction { function_id } => {
                Self::apply_remove_function(doc, function_id).map(|_| None)
            }

            Mutation::RemoveRange { range_id } => {
                Self::apply_remove_range(doc, range_id).map(|_| None)
            }

            Mutation::RemoveSpecification { specification_id } => {
                Self::apply_remove_specification(doc, specification_id).map(|_| None)
            }

            Mutation::InsertFunction { index, template } => {
                Ok(Some(Self::apply_insert_function(doc, *index, template)))
            }

            Mutation::InsertRange { function_id, index, template } => {
                Self::apply_insert_range(doc, function_id, *index, template).map(Some)
            }

            Mutation::InsertSpecification { range_id, index, template } => {
                Self::apply_insert_specification(doc, range_id, *index, template).map(Some)
            }

            Mutation::SetVerified { entity_id, value } => {
                Self::audit_of(doc, entity_id)?.verified = *value;
                Ok(None)
            }

            Mutation::SetReview { entity_id, value } => {
                Self::audit_of(doc, entity_id)?.review = *value;
                Ok(None)
            }

            Mutation::AddNote { entity_id, note } => {
                Self::audit_of(doc, entity_id)?.notes.push(note.clone());
                Ok(None)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mutation::RemoveFunction { .. } => "RemoveFunction",
            Mutation::RemoveRange { .. } => "RemoveRange",
            Mutation::RemoveSpecification { .. } => "RemoveSpecification",
            Mutation::InsertFunction { .. } => "InsertFunction",
            Mutation::InsertRange { .. } => "InsertRange",
            Mutation::InsertSpecification { .. } => "InsertSpecification",
            Mutation::SetVerified { .. } => "SetVerified",
            Mutation::SetReview { .. } => "SetReview",
            Mutation::AddNote { .. } => "AddNote",
        }
    }

    fn target_id(&self) -> Option<&str> {
        match self {
            Mutation::RemoveFunction { function_id }
            | Mutation::InsertRange { function_id, .. } => Some(function_id.as_str()),
            Mutation::RemoveRange { range_id }
            | Mutation::InsertSpecification { range_id, .. } => Some(range_id.as_str()),
            Mutation::RemoveSpecification { specification_id } => Some(specification_id.as_str()),
            Mutation::SetVerified { entity_id, .. }
            | Mutation::SetReview { entity_id, .. }
            | Mutation::AddNote { entity_id, .. } => Some(entity_id.as_str()),
            Mutation::InsertFunction { .. } => None,
        }
    }

    fn validate(&self) -> Result<(), MutationError> {
        match self.target_id() {
            Some(id) if !is_valid(id) => Err(MutationError::MalformedId(id.to_string())),
            _ => Ok(()),
        }
    }

    fn apply_remove_function(doc: &mut Instrument, function_id: &str) -> Result<(), MutationError> {
        let pos = doc
            .functions
            .iter()
            .position(|f| f.object_guid.as_str() == function_id)
            .ok_or_else(|| MutationError::FunctionNotFound(function_id.to_string()))?;

        doc.functions.remove(pos);
        doc.resequence();
        Ok(())
    }

    fn apply_remove_range(doc: &mut Instrument, range_id: &str) -> Result<(), MutationError> {
        for function in &mut doc.functions {
            if let Some(pos) = function.ranges.iter().position(|r| r.object_guid.as_str() == range_id) {
                function.ranges.remove(pos);
                function.resequence();
                return Ok(());
            }
        }

        Err(MutationError::RangeNotFound(range_id.to_string()))
    }

    fn apply_remove_specification(
        doc: &mut Instrument,
        specification_id: &str,
    ) -> Result<(), MutationError> {
        for range in doc.functions.iter_mut().flat_map(|f| f.ranges.iter_mut()) {
            if let Some(pos) = range
                .specifications
                .iter()
                .position(|s| s.object_guid.as_str() == specification_id)
            {
                range.specifications.remove(pos);
                range.resequence();
                return Ok(());
            }
        }

        Err(MutationError::SpecificationNotFound(specification_id.to_string()))
    }

    fn apply_insert_function(doc: &mut Instrument, index: usize, template: &FunctionTemplate) -> Identifier {
        let insert_index = index.min(doc.functions.len());
        let function = template.instantiate(insert_index as u32);
        let id = function.object_guid.clone();

        doc.functions.insert(insert_index, function);
        doc.resequence();
        id
    }

    fn apply_insert_range(
        doc: &mut Instrument,
        function_id: &str,
        index: usize,
        template: &RangeTemplate,
    ) -> Result<Identifier, MutationError> {
        let function = doc
            .find_function_mut(function_id)
            .ok_or_else(|| MutationError::FunctionNotFound(function_id.to_string()))?;

        let insert_index = index.min(function.ranges.len());
        let range = template.instantiate(insert_index as u32);
        let id = range.object_guid.clone();

        function.ranges.insert(insert_index, range);
        function.resequence();
        Ok(id)
    }

    fn apply_insert_specification(
        doc: &mut Instrument,
        range_id: &str,
        index: usize,
        template: &SpecificationTemplate,
    ) -> Result<Identifier, MutationError> {
        let range = doc
            .find_range_mut(range_id)
            .ok_or_else(|| MutationError::RangeNotFound(range_id.to_string()))?;

        let insert_index = index.min(range.specifications.len());
        let spec = template.instantiate(insert_index as u32);
        let id = spec.object_guid.clone();

        range.specifications.insert(insert_index, spec);
        range.resequence();
        Ok(id)
    }

    fn audit_of<'a>(
        doc: &'a mut Instrument,
        entity_id: &str,
    ) -> Result<&'a mut msf_parser::Audit, MutationError> {
        doc.find_audit_mut(entity_id)
            .ok_or_else(|| MutationError::EntityNotFound(entity_id.to_string()))
    }
}
