use crate::commands::load_document;
use crate::config::Config;
use crate::storage::JsonFileStorage;
use anyhow::{anyhow, bail, Result};
use clap::Args;
use colored::Colorize;
use msf_editor::PageMappingIndex;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct PagesArgs {
    /// Input .msf file
    pub input: PathBuf,

    /// Total page count of the source datasheet
    #[arg(short, long)]
    pub total: Option<u32>,

    /// Record an explicit mapping, as FUNCTION_INDEX=PAGE (repeatable)
    #[arg(long = "set", value_name = "INDEX=PAGE")]
    pub set: Vec<String>,

    /// Forget all persisted mappings for this document
    #[arg(long)]
    pub clear: bool,
}

pub fn pages(args: PagesArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let (_, doc) = load_document(&args.input)?;
    let document_path = args.input.canonicalize()?.to_string_lossy().into_owned();

    let mut storage = JsonFileStorage::open(config.page_map_path(cwd))?;
    let mut index = PageMappingIndex::with_pages_per_function(config.pages_per_function);

    if args.clear {
        if !PageMappingIndex::clear_persisted(&mut storage, &document_path) {
            bail!("Could not clear page mappings in {}", storage.path().display());
        }
    } else {
        index.load_persisted(&storage, &document_path);
    }

    if !args.set.is_empty() {
        for assignment in &args.set {
            let (position, page) = parse_assignment(assignment)?;
            let function = doc
                .functions
                .get(position)
                .ok_or_else(|| anyhow!("No function at index {}", position))?;
            if !index.set(function.object_guid.as_str(), page) {
                bail!("Rejected mapping {} (page must be at least 1)", assignment);
            }
        }
        if !index.persist(&mut storage, &document_path) {
            bail!("Could not save page mappings to {}", storage.path().display());
        }
    }

    let count = doc.functions.len();
    for (i, function) in doc.functions.iter().enumerate() {
        let id = function.object_guid.as_str();
        let page = index.resolve_page(id, i, count, args.total);
        let source = if index.get(id).is_some() {
            "mapped".green()
        } else {
            "estimated".dimmed()
        };
        println!("{:>3}  p.{:<4} {:<10} {}", i, page, source, function.display_name());
    }

    Ok(())
}

fn parse_assignment(assignment: &str) -> Result<(usize, i64)> {
    let (position, page) = assignment
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected INDEX=PAGE, got {}", assignment))?;
    Ok((position.trim().parse()?, page.trim().parse()?))
}
