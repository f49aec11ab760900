//! Command-line front-end for the htmldown conversion engine.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use htmldown::{CodeBlockStyle, HeadingStyle, HtmldownOptions, HtmldownService};
use log::{debug, LevelFilter};

/// Convert HTML to CommonMark Markdown.
///
/// Reads HTML from standard input (or --file) and writes Markdown to
/// standard output.
#[derive(Parser, Debug)]
#[command(name = "htmldown", version, about)]
struct Cli {
    /// Read HTML from a file instead of standard input
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Use ATX headings (#) instead of setext
    #[arg(long)]
    atx_headings: bool,

    /// Use fenced code blocks (```) instead of indented
    #[arg(long)]
    fenced: bool,

    /// Line break marker (default: two spaces)
    #[arg(long, value_name = "TEXT")]
    br: Option<String>,

    /// Bullet list marker (*, - or +)
    #[arg(long, value_name = "CHAR")]
    bullet: Option<char>,

    /// Enable verbose debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let html = match &cli.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read standard input")?;
            buffer
        }
    };
    debug!("read {} bytes of HTML", html.len());

    let mut options = HtmldownOptions::default();
    if cli.atx_headings {
        options.heading_style = HeadingStyle::Atx;
    }
    if cli.fenced {
        options.code_block_style = CodeBlockStyle::Fenced;
    }
    if let Some(br) = &cli.br {
        options.br = br.clone();
    }
    if let Some(bullet) = cli.bullet {
        options.bullet_list_marker = bullet;
    }

    let service = HtmldownService::with_options(options);
    let mut markdown = service.convert(&html).context("conversion failed")?;
    debug!("produced {} bytes of Markdown", markdown.len());

    if !markdown.is_empty() {
        markdown.push('\n');
    }
    io::stdout()
        .write_all(markdown.as_bytes())
        .context("failed to write standard output")?;
    Ok(())
}
