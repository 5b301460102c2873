//! # Document Handle
//!
//! A Document owns one parsed MSF tree and its editing state.
//!
//! ## Lifecycle
//!
//! ```text
//! Source → Parse → Edit → Serialize → Source
//!   ↓        ↓       ↓         ↓
//! text   Instrument Mutations  text
//! ```
//!
//! The document performs no I/O. Callers read the source text and write the
//! committed text wherever the document lives.

use crate::{EditorError, Mutation};
use msf_parser::{
    extract_all_identifiers, parse, serialize_with, Identifier, Instrument, LineIndex, SerializerOptions,
};
use std::path::PathBuf;
use tracing::warn;

/// Editable MSF document
#[derive(Debug, Clone)]
pub struct Document {
    /// Path the document was loaded from (used for storage keys)
    pub path: PathBuf,

    /// Current version number (increments on each applied mutation)
    pub version: u64,

    instrument: Instrument,

    /// Text as last parsed or committed
    source: String,

    dirty: bool,
}

/// Outcome of an applied mutation
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult {
    pub version: u64,
    /// Primary identifier of the inserted entity, for insert mutations
    pub inserted: Option<Identifier>,
}

impl Document {
    /// Parse `source` into a new document
    pub fn from_source(path: impl Into<PathBuf>, source: String) -> Result<Self, EditorError> {
        let instrument = parse(&source)?;

        Ok(Self {
            path: path.into(),
            version: 0,
            instrument,
            source,
            dirty: false,
        })
    }

    /// Wrap a tree built outside the parser, e.g. by an extraction pipeline
    pub fn from_instrument(path: impl Into<PathBuf>, instrument: Instrument) -> Self {
        Self {
            path: path.into(),
            version: 0,
            instrument,
            source: String::new(),
            dirty: true,
        }
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Direct tree access; marks the document dirty
    pub fn instrument_mut(&mut self) -> &mut Instrument {
        self.dirty = true;
        &mut self.instrument
    }

    /// Apply a mutation. Rejected mutations return `None` and change nothing.
    pub fn apply(&mut self, mutation: Mutation) -> Option<MutationResult> {
        match mutation.try_apply(&mut self.instrument) {
            Ok(inserted) => {
                self.version += 1;
                self.dirty = true;
                Some(MutationResult {
                    version: self.version,
                    inserted,
                })
            }
            Err(e) => {
                warn!("rejected {} on {}: {}", mutation.name(), self.path.display(), e);
                None
            }
        }
    }

    pub fn serialize(&self) -> String {
        self.serialize_with(&SerializerOptions::default())
    }

    pub fn serialize_with(&self, options: &SerializerOptions) -> String {
        serialize_with(&self.instrument, options.clone())
    }

    /// Serialize and record the result as the new clean source
    pub fn commit(&mut self, options: &SerializerOptions) -> &str {
        self.source = self.serialize_with(options);
        self.dirty = false;
        &self.source
    }

    /// Source text as last parsed or committed
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn line_index(&self) -> LineIndex {
        LineIndex::build(&self.source)
    }

    pub fn identifiers(&self) -> Vec<Identifier> {
        extract_all_identifiers(&self.instrument)
    }

    /// Path as a string, for storage keys
    pub fn path_key(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Check if document has uncommitted changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
