use crate::commands::load_document;
use crate::config::Config;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use msf_parser::{extract_all_identifiers, parse, serialize_with};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RoundtripArgs {
    /// Input .msf file
    pub input: PathBuf,

    /// Write the serialized document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn roundtrip(args: RoundtripArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let (source, doc) = load_document(&args.input)?;

    let text = serialize_with(&doc, config.serializer_options());
    let reparsed = parse(&text).context("Serialized output does not parse")?;

    let before = extract_all_identifiers(&doc);
    let after = extract_all_identifiers(&reparsed);
    if before != after {
        bail!(
            "Identifier list changed across round trip ({} before, {} after)",
            before.len(),
            after.len()
        );
    }
    if reparsed != doc {
        bail!("Document structure changed across round trip");
    }

    match &args.output {
        Some(output) => {
            fs::write(output, &text).with_context(|| format!("Cannot write {}", output.display()))?;
            println!(
                "{} {} → {} ({} identifiers preserved{})",
                "✓".green(),
                args.input.display(),
                output.display(),
                before.len(),
                if text == source { ", byte-identical" } else { "" }
            );
        }
        None => {
            print!("{}", text);
            eprintln!("{} {} identifiers preserved", "✓".green(), before.len());
        }
    }

    Ok(())
}
