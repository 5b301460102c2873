//! # MSF Parser
//!
//! Document model and round-trip engine for MSF calibration-procedure XML.
//!
//! ```text
//! raw text ──parse──▶ Instrument tree ──serialize──▶ raw text
//!     │
//!     └──build_line_index──▶ LineIndex (gutter / cursor sync)
//! ```

pub mod ast;
pub mod error;
pub mod escape;
pub mod id_generator;
pub mod line_index;
pub mod parser;
pub mod serializer;
pub mod tokenizer;
pub mod visitor;
pub mod wire;

#[cfg(test)]
mod tests_roundtrip;

pub use ast::{
    Audit, Extras, Function, Header, Instrument, Numeric, Parameter, Range, RawElement, Specification, ViewState,
};
pub use error::{FormatError, FormatResult};
#[cfg(feature = "pretty-errors")]
pub use error::format_error;
pub use id_generator::{generate, get_document_id, is_valid, null_identifier, Identifier};
pub use line_index::{
    build_line_index, find_by_line, is_indexed_line, search_by_name, LineEntry, LineIndex, DEFAULT_INDEX_TAG,
};
pub use parser::{parse, Parser};
pub use serializer::{serialize, serialize_with, LineEnding, Serializer, SerializerOptions};
pub use tokenizer::{tokenize, Token};
pub use visitor::{extract_all_identifiers, Visitor};
