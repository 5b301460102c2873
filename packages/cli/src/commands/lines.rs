use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use msf_parser::{LineEntry, LineIndex};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct LinesArgs {
    /// Input .msf file (does not need to parse)
    pub input: PathBuf,

    /// Show the entity on this 1-based line
    #[arg(short, long)]
    pub line: Option<usize>,

    /// Case-insensitive name filter
    #[arg(short, long)]
    pub search: Option<String>,

    /// Leaf tag to index (overrides config)
    #[arg(short, long)]
    pub tag: Option<String>,
}

pub fn lines(args: LinesArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("Cannot read {}", args.input.display()))?;

    let tag = args.tag.as_deref().unwrap_or(&config.line_index_tag);
    let index = LineIndex::build_for_tag(&text, tag);

    if let Some(line) = args.line {
        match index.find_by_line(line) {
            Some(entry) => print_entry(entry),
            None => println!("{} no <{}> on line {}", "✗".red(), tag, line),
        }
        return Ok(());
    }

    let hits = index.search_by_name(args.search.as_deref().unwrap_or(""));
    for entry in &hits {
        print_entry(entry);
    }
    println!();
    println!("   {} of {} <{}> entries", hits.len(), index.len(), tag);

    Ok(())
}

fn print_entry(entry: &LineEntry) {
    println!(
        "{:>6}:{:<4} {}",
        entry.line.to_string().cyan(),
        entry.column + 1,
        entry.name
    );
}
