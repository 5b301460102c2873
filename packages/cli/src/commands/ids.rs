use crate::commands::load_document;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use msf_parser::extract_all_identifiers;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct IdsArgs {
    /// Input .msf file
    pub input: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn ids(args: IdsArgs, _cwd: &str) -> Result<()> {
    let (_, doc) = load_document(&args.input)?;
    let ids = extract_all_identifiers(&doc);

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&ids)?);
        return Ok(());
    }

    for id in &ids {
        if id.is_valid() {
            println!("{}", id);
        } else {
            println!("{} {}", id, "(malformed)".yellow());
        }
    }

    Ok(())
}
