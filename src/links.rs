//! links command: Parse and normalize an export without fetching anything
//!
//! Prints the deduplicated links, most recent first, as JSON or YAML.

use crate::archive::load_links;
use crate::link::Link;
use crate::parse::ExportFormat;
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args)]
pub struct LinksArgs {
    /// Bookmark export file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Export format (detected when omitted)
    #[arg(long, short, value_enum)]
    pub format: Option<ExportFormat>,

    /// Only list links with a timestamp at or after this one
    #[arg(long)]
    pub resume: Option<String>,

    /// Output format: json (default) or yaml
    #[arg(long, default_value = "json")]
    pub output_format: String,
}

#[derive(Debug, Serialize)]
pub struct LinksOutput {
    pub format: ExportFormat,
    pub total: usize,
    pub links: Vec<Link>,
}

pub async fn run_links(args: LinksArgs) -> Result<()> {
    let (format, links) = load_links(&args.file, args.format, args.resume.as_deref()).await?;

    if links.is_empty() {
        eprintln!(
            "No links found in {}, is it a {} export file?",
            args.file.display(),
            format
        );
        std::process::exit(1);
    }

    let output = LinksOutput {
        format,
        total: links.len(),
        links,
    };

    let rendered = match args.output_format.as_str() {
        "yaml" | "yml" => serde_yaml::to_string(&output)?,
        _ => serde_json::to_string_pretty(&output)?,
    };
    println!("{}", rendered);

    Ok(())
}
