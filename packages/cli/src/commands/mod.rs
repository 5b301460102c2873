pub mod check;
pub mod ids;
pub mod lines;
pub mod pages;
pub mod roundtrip;
pub mod templates;

pub use check::{check, CheckArgs};
pub use ids::{ids, IdsArgs};
pub use lines::{lines, LinesArgs};
pub use pages::{pages, PagesArgs};
pub use roundtrip::{roundtrip, RoundtripArgs};
pub use templates::{templates, TemplatesArgs};

use anyhow::{Context, Result};
use msf_parser::{format_error, parse, Instrument};
use std::fs;
use std::path::Path;

/// Read and parse one document, printing a pretty report on failure
pub(crate) fn load_document(path: &Path) -> Result<(String, Instrument)> {
    let source = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;

    match parse(&source) {
        Ok(instrument) => Ok((source, instrument)),
        Err(err) => {
            eprintln!("{}", format_error(&source, &path.to_string_lossy(), &err));
            Err(anyhow::anyhow!("Failed to parse {}: {}", path.display(), err))
        }
    }
}
