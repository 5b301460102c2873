//! # MSF Editor
//!
//! Editing layer on top of the MSF document model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: MSF text ⇄ Instrument tree          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Document lifecycle + mutations      │
//! │  - Apply mutations with cascade/resequence  │
//! │  - Stamp new entities from templates        │
//! │  - Map functions to datasheet pages         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Tree is source of truth**: text is derived by serializing it
//! 2. **Fresh identity**: every instantiated entity gets new identifiers
//! 3. **Never abort an edit session**: invalid input is logged and ignored
//!
//! ## Usage
//!
//! ```rust,ignore
//! use msf_editor::{Document, Mutation, TemplateLibrary};
//!
//! let mut doc = Document::from_source("34401A.msf", source)?;
//!
//! let template = TemplateLibrary::builtin().function("dc-voltage").cloned().unwrap();
//! doc.apply(Mutation::InsertFunction { index: 0, template });
//!
//! let text = doc.commit(&Default::default());
//! ```

mod document;
mod errors;
mod mutations;
mod page_map;
mod templates;

pub use document::{Document, MutationResult};
pub use errors::{EditorError, StorageError};
pub use mutations::{Mutation, MutationError};
pub use page_map::{
    estimate_page_number, storage_key, MappingStorage, MemoryStorage, PageMappingIndex,
    DEFAULT_PAGES_PER_FUNCTION,
};
pub use templates::{
    extract_template, instantiate, Blueprint, FunctionTemplate, ParameterTemplate, RangeTemplate,
    SpecificationTemplate, Template, TemplateLibrary, Templated,
};

// Re-export common types for convenience
pub use msf_parser::{Identifier, Instrument};
