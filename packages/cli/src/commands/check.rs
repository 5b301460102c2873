use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use msf_parser::{extract_all_identifiers, format_error, is_valid, parse};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const EXTENSIONS: [&str; 2] = ["msf", "xml"];

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Input .msf file or directory to check
    pub input: PathBuf,

    /// Print a line for every file, not just failures
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Debug, Default)]
struct FileSummary {
    functions: usize,
    ranges: usize,
    specifications: usize,
    identifiers: usize,
    malformed_ids: usize,
}

pub fn check(args: CheckArgs, _cwd: &str) -> Result<()> {
    println!("🔍 {} MSF check", "Starting".green().bold());
    println!("   Input: {}", args.input.display());
    println!();

    let files = if args.input.is_file() {
        vec![args.input.clone()]
    } else if args.input.is_dir() {
        let files = find_msf_files(&args.input);
        println!("   Found {} documents", files.len());
        println!();
        files
    } else {
        bail!("Input path does not exist: {}", args.input.display());
    };

    let mut failed = 0;
    for file in &files {
        match check_file(file)? {
            Some(summary) => {
                if args.all || summary.malformed_ids > 0 {
                    println!(
                        "{} {} ({} functions, {} ranges, {} specifications, {} identifiers)",
                        "✓".green(),
                        file.display(),
                        summary.functions,
                        summary.ranges,
                        summary.specifications,
                        summary.identifiers
                    );
                }
                if summary.malformed_ids > 0 {
                    println!(
                        "  {} {} identifiers do not match the {{8-4-4-4-12}} grammar",
                        "warning".yellow().bold(),
                        summary.malformed_ids
                    );
                }
            }
            None => failed += 1,
        }
    }

    println!();
    println!(
        "✨ {} Check complete!",
        if failed > 0 { "Done".red().bold() } else { "Done".green().bold() }
    );
    println!("   Documents checked: {}", files.len());

    if failed > 0 {
        bail!("{} of {} documents failed to parse", failed, files.len());
    }

    println!("   {} No parse errors", "✓".green());
    Ok(())
}

/// `None` when the file does not parse; the error has been printed
fn check_file(path: &Path) -> Result<Option<FileSummary>> {
    let source = fs::read_to_string(path)?;
    debug!("checking {} ({} bytes)", path.display(), source.len());

    let doc = match parse(&source) {
        Ok(doc) => doc,
        Err(err) => {
            eprintln!("{} {}", "✗".red(), path.display());
            eprintln!("{}", format_error(&source, &path.to_string_lossy(), &err));
            return Ok(None);
        }
    };

    let ids = extract_all_identifiers(&doc);
    let ranges = doc.functions.iter().flat_map(|f| &f.ranges);

    Ok(Some(FileSummary {
        functions: doc.functions.len(),
        ranges: ranges.clone().count(),
        specifications: ranges.map(|r| r.specifications.len()).sum(),
        identifiers: ids.len(),
        malformed_ids: ids.iter().filter(|id| !is_valid(id.as_str())).count(),
    }))
}

fn find_msf_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_msf_files_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.msf"), "<MSF></MSF>").unwrap();
        fs::write(dir.path().join("sub").join("b.XML"), "<MSF></MSF>").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let files = find_msf_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.msf"));
    }

    #[test]
    fn test_check_file_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.msf");
        let bad = dir.path().join("bad.msf");
        fs::write(&good, "<MSF><Function><BaseFunction>X</BaseFunction></Function></MSF>").unwrap();
        fs::write(&bad, "<MSF><Function></MSF>").unwrap();

        let summary = check_file(&good).unwrap().unwrap();
        assert_eq!(summary.functions, 1);
        assert_eq!(summary.identifiers, 6);
        assert_eq!(summary.malformed_ids, 0);
        assert!(check_file(&bad).unwrap().is_none());
    }
}
