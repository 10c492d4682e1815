//! Fetch configuration
//!
//! Every option can be set by flag or by the environment variable named
//! after it (`FETCH_PDF=False archive run export.html`).

use clap::{ArgAction, Args};
use std::str::FromStr;
use std::time::Duration;

pub const ARCHIVE_ORG_URL: &str = "https://web.archive.org";
pub const FAVICON_SERVICE_URL: &str = "https://www.google.com/s2/favicons";

/// Options controlling which artifacts are fetched and how
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Mirror the page with wget
    pub fetch_wget: bool,
    /// Also fetch page requisites (css, images) and convert links
    pub fetch_wget_requisites: bool,
    /// Print the page to output.pdf
    pub fetch_pdf: bool,
    /// Capture screenshot.png
    pub fetch_screenshot: bool,
    /// Download favicon.ico
    pub fetch_favicon: bool,
    /// Submit the URL to archive.org and record the snapshot URL
    pub submit_archive_dot_org: bool,
    /// Browser window size for screenshots
    pub resolution: Resolution,
    /// Mode applied to every archived file and directory
    pub archive_permissions: u32,
    /// Chrome or Chromium executable
    pub chrome_binary: String,
    /// wget executable
    pub wget_binary: String,
    /// Upper bound for each external call
    pub timeout: Duration,
    /// Re-fetch artifacts that already exist
    pub overwrite: bool,
    /// archive.org base URL
    pub archive_org_url: String,
    /// Favicon service endpoint, queried with `?domain=`
    pub favicon_url: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            fetch_wget: true,
            fetch_wget_requisites: true,
            fetch_pdf: true,
            fetch_screenshot: true,
            fetch_favicon: true,
            submit_archive_dot_org: true,
            resolution: Resolution::default(),
            archive_permissions: 0o755,
            chrome_binary: "chromium-browser".to_string(),
            wget_binary: "wget".to_string(),
            timeout: Duration::from_secs(60),
            overwrite: false,
            archive_org_url: ARCHIVE_ORG_URL.to_string(),
            favicon_url: FAVICON_SERVICE_URL.to_string(),
        }
    }
}

impl ArchiveConfig {
    /// True when any step needs the headless browser
    pub fn needs_chrome(&self) -> bool {
        self.fetch_pdf || self.fetch_screenshot
    }
}

/// Browser window size, written as `WIDTH,HEIGHT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 900,
        }
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(',')
            .ok_or_else(|| format!("expected WIDTH,HEIGHT, got {:?}", s))?;
        let width = w
            .trim()
            .parse()
            .map_err(|_| format!("invalid width in {:?}", s))?;
        let height = h
            .trim()
            .parse()
            .map_err(|_| format!("invalid height in {:?}", s))?;
        Ok(Self { width, height })
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.width, self.height)
    }
}

/// Env-style boolean: only "true" (any case) enables a flag
pub fn parse_flag(s: &str) -> Result<bool, String> {
    Ok(s.trim().eq_ignore_ascii_case("true"))
}

/// Octal file mode such as "755"
pub fn parse_permissions(s: &str) -> Result<u32, String> {
    u32::from_str_radix(s.trim(), 8).map_err(|_| format!("invalid octal permissions: {:?}", s))
}

/// Fetch options shared by commands that touch the archive
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Mirror each page with wget
    #[arg(long, env = "FETCH_WGET", default_value = "True", value_parser = parse_flag, action = ArgAction::Set)]
    pub fetch_wget: bool,

    /// Fetch page requisites with wget
    #[arg(long, env = "FETCH_WGET_REQUISITES", default_value = "True", value_parser = parse_flag, action = ArgAction::Set)]
    pub fetch_wget_requisites: bool,

    /// Print each page to PDF with headless Chrome
    #[arg(long, env = "FETCH_PDF", default_value = "True", value_parser = parse_flag, action = ArgAction::Set)]
    pub fetch_pdf: bool,

    /// Screenshot each page with headless Chrome
    #[arg(long, env = "FETCH_SCREENSHOT", default_value = "True", value_parser = parse_flag, action = ArgAction::Set)]
    pub fetch_screenshot: bool,

    /// Download each site's favicon
    #[arg(long, env = "FETCH_FAVICON", default_value = "True", value_parser = parse_flag, action = ArgAction::Set)]
    pub fetch_favicon: bool,

    /// Submit each link to archive.org
    #[arg(long, env = "SUBMIT_ARCHIVE_DOT_ORG", default_value = "True", value_parser = parse_flag, action = ArgAction::Set)]
    pub submit_archive_dot_org: bool,

    /// Screenshot window size (WIDTH,HEIGHT)
    #[arg(long, env = "RESOLUTION", default_value = "1440,900")]
    pub resolution: Resolution,

    /// Octal permissions applied to archived files
    #[arg(long, env = "ARCHIVE_PERMISSIONS", default_value = "755", value_parser = parse_permissions)]
    pub archive_permissions: u32,

    /// Chrome/Chromium binary
    #[arg(long, env = "CHROME_BINARY", default_value = "chromium-browser")]
    pub chrome_binary: String,

    /// wget binary
    #[arg(long, env = "WGET_BINARY", default_value = "wget")]
    pub wget_binary: String,

    /// Timeout per fetch step in seconds
    #[arg(long, env = "TIMEOUT", default_value = "60")]
    pub timeout: u64,
}

impl FetchArgs {
    pub fn into_config(self, overwrite: bool) -> ArchiveConfig {
        ArchiveConfig {
            fetch_wget: self.fetch_wget,
            fetch_wget_requisites: self.fetch_wget_requisites,
            fetch_pdf: self.fetch_pdf,
            fetch_screenshot: self.fetch_screenshot,
            fetch_favicon: self.fetch_favicon,
            submit_archive_dot_org: self.submit_archive_dot_org,
            resolution: self.resolution,
            archive_permissions: self.archive_permissions,
            chrome_binary: self.chrome_binary,
            wget_binary: self.wget_binary,
            timeout: Duration::from_secs(self.timeout),
            overwrite,
            ..ArchiveConfig::default()
        }
    }
}
