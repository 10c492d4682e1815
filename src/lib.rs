//! bookmark-archiver: Create a browsable html archive of a list of links
//!
//! Commands:
//! - run: Parse an export, write index.html and archive every link
//! - links: Print the normalized, deduplicated links of an export
//! - check-deps: Verify Chrome and wget for the enabled fetch steps

pub mod archive;
pub mod browser;
pub mod config;
pub mod deps;
pub mod fetch;
pub mod index;
pub mod link;
pub mod links;
pub mod logging;
pub mod normalize;
pub mod parse;

pub use archive::{create_archive, load_links, ArchiveSummary};
pub use config::{ArchiveConfig, Resolution};
pub use fetch::{Archiver, LinkReport, Step, StepOutcome};
pub use link::{Link, LinkType};
pub use normalize::{filter_resume, next_uniq_timestamp, normalize_and_dedupe};
pub use parse::{parse_export, ExportFormat};
