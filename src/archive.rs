//! run command: Build or update an archive from a bookmark export
//!
//! Writes `<output>/index.html` and `<output>/archive/<timestamp>/` for every
//! link, then prints a compact JSON summary to stdout.

use crate::config::{ArchiveConfig, FetchArgs};
use crate::deps::check_dependencies;
use crate::fetch::{set_mode_recursive, Archiver, LinkReport, StepOutcome};
use crate::index::write_index;
use crate::link::Link;
use crate::normalize::{filter_resume, normalize_and_dedupe};
use crate::parse::{parse_export, ExportFormat};
use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Args;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args)]
pub struct ArchiveArgs {
    /// Bookmark export file (Pocket HTML, Pinboard JSON or browser bookmarks)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Export format (detected when omitted)
    #[arg(long, short, value_enum)]
    pub format: Option<ExportFormat>,

    /// Only archive links with a timestamp at or after this one
    #[arg(long)]
    pub resume: Option<String>,

    /// Output folder (default: the export format name, e.g. "pocket")
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Re-fetch artifacts that already exist
    #[arg(long)]
    pub overwrite: bool,

    #[command(flatten)]
    pub fetch: FetchArgs,
}

/// Step counts across the whole batch
#[derive(Debug, Default, Serialize)]
pub struct StepTotals {
    pub done: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Printed to stdout once the batch finishes
#[derive(Debug, Serialize)]
pub struct ArchiveSummary {
    pub format: ExportFormat,
    pub output: String,
    pub index: String,
    pub links: usize,
    pub steps: StepTotals,
    pub finished: String,
}

pub async fn run_archive(args: ArchiveArgs) -> Result<()> {
    let config = args.fetch.into_config(args.overwrite);
    let summary = create_archive(
        &args.file,
        args.format,
        args.resume.as_deref(),
        args.output.as_deref(),
        config,
    )
    .await?;

    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

/// Read, parse and normalize an export, then apply the resume threshold
pub async fn load_links(
    file: &Path,
    format: Option<ExportFormat>,
    resume: Option<&str>,
) -> Result<(ExportFormat, Vec<Link>)> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read file: {}", file.display()))?;

    let (format, raw) = parse_export(&content, format)
        .with_context(|| format!("Failed to parse {}", file.display()))?;
    let parsed = raw.len();

    let mut links = normalize_and_dedupe(raw);
    if let Some(resume) = resume {
        links = filter_resume(links, resume)?;
    }

    info!(
        "Parsed {} {} links, {} to archive",
        parsed,
        format,
        links.len()
    );
    Ok((format, links))
}

/// Update or create index.html and download an archive of every link
pub async fn create_archive(
    file: &Path,
    format: Option<ExportFormat>,
    resume: Option<&str>,
    output: Option<&Path>,
    config: ArchiveConfig,
) -> Result<ArchiveSummary> {
    info!(
        "[+] [{}] Starting archive from {} export file",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        file.display()
    );

    let (format, links) = load_links(file, format, resume).await?;
    if links.is_empty() {
        bail!(
            "No links found in {}, is it a {} export file?",
            file.display(),
            format
        );
    }

    let out_root = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format.to_string()));
    fs::create_dir_all(out_root.join("archive"))
        .with_context(|| format!("Failed to create {}", out_root.display()))?;

    let index = write_index(&links, &out_root)?;
    set_mode_recursive(&out_root, config.archive_permissions)
        .with_context(|| format!("Failed to set permissions on {}", out_root.display()))?;

    info!(
        "[*] [{}] Created archive index with {} links",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        links.len()
    );

    let deps = check_dependencies(&config).await?;
    if let Some(chrome) = &deps.chrome {
        info!("    using {}", chrome);
    }

    let mut archiver = Archiver::new(config)?;
    let mut totals = StepTotals::default();

    for link in &links {
        let report = archiver.archive_link(link, &out_root).await?;
        add_totals(&mut totals, &report);
    }
    archiver.close().await?;

    info!(
        "[√] [{}] Archive update complete: {} done, {} skipped, {} failed",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        totals.done,
        totals.skipped,
        totals.failed
    );

    Ok(ArchiveSummary {
        format,
        output: out_root.display().to_string(),
        index: index.display().to_string(),
        links: links.len(),
        steps: totals,
        finished: Local::now().to_rfc3339(),
    })
}

fn add_totals(totals: &mut StepTotals, report: &LinkReport) {
    totals.done += report.count(|o| *o == StepOutcome::Done);
    totals.skipped += report.count(|o| *o == StepOutcome::Skipped);
    totals.failed += report.count(|o| matches!(o, StepOutcome::Failed(_)));
}
