use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use wiki_parser::{extract_sections, ExtractConfig};

#[derive(Parser, Debug)]
#[command(
    name = "wiki_parser",
    version,
    about = "Print the sections extracted from one Wikimedia HTML article as JSON"
)]
struct ParserCli {
    /// HTML file to read, or '-' for stdin (the default)
    input: Option<PathBuf>,

    /// Extract tables and infoboxes
    #[arg(long, env = "WIKI_PARSER_INCLUDE_TABLES", default_value_t = false)]
    include_tables: bool,

    /// Keep lists as body lines
    #[arg(long, env = "WIKI_PARSER_INCLUDE_LISTS", default_value_t = false)]
    include_lists: bool,
}

fn main() -> Result<()> {
    let cli = ParserCli::parse();
    let html = match cli.input.as_deref() {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?,
        _ => read_stdin()?,
    };

    let config = ExtractConfig {
        include_tables: cli.include_tables,
        include_lists: cli.include_lists,
        include_links: false,
    };
    let sections = extract_sections(&html, &config);
    for section in &sections {
        for err in &section.dropped {
            eprintln!("{}: dropped table in '{}': {err}", env!("CARGO_PKG_NAME"), section.title);
        }
    }

    let json = serde_json::to_string_pretty(&sections).context("failed to serialize JSON")?;
    println!("{json}");
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}
