//! bookmark-archiver CLI
//!
//! Create a browsable html archive of a list of links.
//! Fetch options also read the environment (FETCH_PDF, CHROME_BINARY, TIMEOUT, ...).

use anyhow::Result;
use bookmark_archiver::archive::{run_archive, ArchiveArgs};
use bookmark_archiver::deps::{run_check_deps, CheckDepsArgs};
use bookmark_archiver::links::{run_links, LinksArgs};
use bookmark_archiver::logging::init_logging;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "archive")]
#[command(version)]
#[command(about = "Bookmark Archiver: Create a browsable html archive of a list of links")]
#[command(long_about = "Create a browsable html archive of a list of links.\n\nSupports Pocket HTML, Pinboard JSON and browser bookmark exports.\n\nCommands:\n  run          Archive every link in an export\n  links        Print the normalized links of an export\n  check-deps   Verify Chrome and wget")]
struct Cli {
    /// Debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive every link in a bookmark export
    Run(ArchiveArgs),
    /// Print the normalized, deduplicated links of an export
    Links(LinksArgs),
    /// Check that the tools for the enabled fetch steps are installed
    CheckDeps(CheckDepsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run(args) => run_archive(args).await,
        Commands::Links(args) => run_links(args).await,
        Commands::CheckDeps(args) => run_check_deps(args).await,
    }
}
