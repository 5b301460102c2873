mod commands;
mod config;
mod storage;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    check, ids, lines, pages, roundtrip, templates, CheckArgs, IdsArgs, LinesArgs, PagesArgs,
    RoundtripArgs, TemplatesArgs,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// MSF CLI - inspect and round-trip calibration procedure documents
#[derive(Parser, Debug)]
#[command(name = "msf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse documents and report errors
    Check(CheckArgs),

    /// Parse, re-serialize and verify nothing was lost
    Roundtrip(RoundtripArgs),

    /// List every identifier in document order
    Ids(IdsArgs),

    /// Show the line index of a document
    Lines(LinesArgs),

    /// List built-in templates
    Templates(TemplatesArgs),

    /// Show datasheet pages per function
    Pages(PagesArgs),
}

/// Initialize tracing on stderr so stdout stays clean for document output
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Check(args) => check(args, &cwd),
        Command::Roundtrip(args) => roundtrip(args, &cwd),
        Command::Ids(args) => ids(args, &cwd),
        Command::Lines(args) => lines(args, &cwd),
        Command::Templates(args) => templates(args, &cwd),
        Command::Pages(args) => pages(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
