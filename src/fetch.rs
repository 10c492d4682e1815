//! Per-link archival: wget mirror, PDF, screenshot, archive.org, favicon
//!
//! Steps run one after another and are best-effort: a failing step is logged
//! with the command to reproduce it and the next step still runs.

use crate::browser::ChromeSession;
use crate::config::ArchiveConfig;
use crate::link::Link;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

const PDF_FILE: &str = "output.pdf";
const SCREENSHOT_FILE: &str = "screenshot.png";
const ARCHIVE_ORG_FILE: &str = "archive.org.txt";
const FAVICON_FILE: &str = "favicon.ico";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to run {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("`{command}` exited with {code:?}: {stderr}")]
    Exit {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("`{command}` timed out after {}s", .after.as_secs())]
    Timeout { command: String, after: Duration },
    #[error("{} does not exist (did the previous step fail?)", .0.display())]
    Missing(PathBuf),
    #[error("no Content-Location header in archive.org response for {0}")]
    NoContentLocation(String),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("browser: {0:#}")]
    Browser(anyhow::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Archival steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Wget,
    Pdf,
    Screenshot,
    ArchiveDotOrg,
    Favicon,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Wget => write!(f, "wget"),
            Step::Pdf => write!(f, "pdf"),
            Step::Screenshot => write!(f, "screenshot"),
            Step::ArchiveDotOrg => write!(f, "archive.org"),
            Step::Favicon => write!(f, "favicon"),
        }
    }
}

/// Result of one step for one link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "lowercase")]
pub enum StepOutcome {
    Done,
    Skipped,
    Failed(String),
}

#[derive(Debug, Serialize)]
pub struct StepReport {
    pub step: Step,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// What happened to a single link
#[derive(Debug, Serialize)]
pub struct LinkReport {
    pub timestamp: String,
    pub url: String,
    pub steps: Vec<StepReport>,
}

impl LinkReport {
    pub fn count(&self, pred: impl Fn(&StepOutcome) -> bool) -> usize {
        self.steps.iter().filter(|s| pred(&s.outcome)).count()
    }
}

/// Directory holding every artifact for `link`
pub fn link_dir(out_root: &Path, link: &Link) -> PathBuf {
    out_root.join("archive").join(&link.timestamp)
}

/// Runs the enabled fetch steps for each link
pub struct Archiver {
    config: ArchiveConfig,
    client: reqwest::Client,
    chrome: Option<ChromeSession>,
}

impl Archiver {
    pub fn new(config: ArchiveConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("bookmark-archiver/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            client,
            chrome: None,
        })
    }

    /// Download the page, PDF, screenshot and favicon into a folder named after
    /// the link's timestamp
    pub async fn archive_link(&mut self, link: &Link, out_root: &Path) -> Result<LinkReport> {
        info!(
            timestamp = %link.timestamp,
            time = %link.time,
            "[+] \"{}\": {}",
            link.title,
            link.base_url
        );

        let out_dir = link_dir(out_root, link);
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("Failed to create {}", out_dir.display()))?;
        apply_permissions(&out_dir, self.config.archive_permissions);

        if let Some(link_type) = link.link_type {
            info!("    i Type: {}", link_type);
        }

        let mut report = LinkReport {
            timestamp: link.timestamp.clone(),
            url: link.url.clone(),
            steps: Vec::new(),
        };

        if !link.is_archivable() {
            warn!("    X Skipping: invalid link");
            return Ok(report);
        }

        if self.config.fetch_wget {
            let result = self.fetch_wget(&out_dir, link).await;
            report.steps.push(record(Step::Wget, result));
        }
        if self.config.fetch_pdf {
            let result = self.fetch_pdf(&out_dir, link).await;
            report.steps.push(record(Step::Pdf, result));
        }
        if self.config.fetch_screenshot {
            let result = self.fetch_screenshot(&out_dir, link).await;
            report.steps.push(record(Step::Screenshot, result));
        }
        if self.config.submit_archive_dot_org {
            let result = self.archive_dot_org(&out_dir, link).await;
            report.steps.push(record(Step::ArchiveDotOrg, result));
        }
        if self.config.fetch_favicon {
            let result = self.fetch_favicon(&out_dir, link).await;
            report.steps.push(record(Step::Favicon, result));
        }

        Ok(report)
    }

    /// Mirror the site with wget into `<out_dir>/<domain>/`
    pub async fn fetch_wget(&self, out_dir: &Path, link: &Link) -> Result<StepOutcome, FetchError> {
        let domain = link.base_url.split('/').next().unwrap_or_default();
        if out_dir.join(domain).exists() && !self.config.overwrite {
            return Ok(StepOutcome::Skipped);
        }

        info!("    - Downloading full site");
        let mut args: Vec<String> = ["--timestamping", "--adjust-extension", "--no-parent"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        if self.config.fetch_wget_requisites {
            args.push("--page-requisites".to_string());
            args.push("--convert-links".to_string());
        }
        args.push(link.url.clone());

        self.run(&self.config.wget_binary, &args, out_dir).await?;
        self.chmod(out_dir, domain)?;
        Ok(StepOutcome::Done)
    }

    /// Print the page to `output.pdf` with headless Chrome
    pub async fn fetch_pdf(&mut self, out_dir: &Path, link: &Link) -> Result<StepOutcome, FetchError> {
        if (out_dir.join(PDF_FILE).exists() && !self.config.overwrite) || link.is_static_file() {
            return Ok(StepOutcome::Skipped);
        }

        info!("    - Printing PDF");
        let timeout = self.config.timeout;
        self.chrome()
            .await?
            .print_pdf(&link.url, &out_dir.join(PDF_FILE), timeout)
            .await
            .map_err(FetchError::Browser)?;
        self.chmod(out_dir, PDF_FILE)?;
        Ok(StepOutcome::Done)
    }

    /// Capture `screenshot.png` at the configured resolution
    pub async fn fetch_screenshot(
        &mut self,
        out_dir: &Path,
        link: &Link,
    ) -> Result<StepOutcome, FetchError> {
        if (out_dir.join(SCREENSHOT_FILE).exists() && !self.config.overwrite)
            || link.is_static_file()
        {
            return Ok(StepOutcome::Skipped);
        }

        info!("    - Snapping screenshot");
        let timeout = self.config.timeout;
        self.chrome()
            .await?
            .screenshot(&link.url, &out_dir.join(SCREENSHOT_FILE), timeout)
            .await
            .map_err(FetchError::Browser)?;
        self.chmod(out_dir, SCREENSHOT_FILE)?;
        Ok(StepOutcome::Done)
    }

    /// Submit the URL (without query) to archive.org and save the snapshot URL
    pub async fn archive_dot_org(&self, out_dir: &Path, link: &Link) -> Result<StepOutcome, FetchError> {
        if out_dir.join(ARCHIVE_ORG_FILE).exists() && !self.config.overwrite {
            return Ok(StepOutcome::Skipped);
        }

        info!("    - Submitting to archive.org");
        let base = self.config.archive_org_url.trim_end_matches('/');
        let target = link.url.split('?').next().unwrap_or_default();
        let submit_url = format!("{}/save/{}", base, target);

        let response = self.client.head(&submit_url).send().await?;
        let location = response
            .headers()
            .get(reqwest::header::CONTENT_LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| FetchError::NoContentLocation(submit_url.clone()))?;

        let saved_url = format!("{}{}", base, location);
        tokio::fs::write(out_dir.join(ARCHIVE_ORG_FILE), &saved_url).await?;
        self.chmod(out_dir, ARCHIVE_ORG_FILE)?;
        Ok(StepOutcome::Done)
    }

    /// Download the site's favicon into `favicon.ico`
    pub async fn fetch_favicon(&self, out_dir: &Path, link: &Link) -> Result<StepOutcome, FetchError> {
        if out_dir.join(FAVICON_FILE).exists() && !self.config.overwrite {
            return Ok(StepOutcome::Skipped);
        }

        info!("    - Fetching favicon");
        let url =
            url::Url::parse_with_params(&self.config.favicon_url, &[("domain", &link.domain)])?;

        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        tokio::fs::write(out_dir.join(FAVICON_FILE), &bytes).await?;
        self.chmod(out_dir, FAVICON_FILE)?;
        Ok(StepOutcome::Done)
    }

    /// Shut down the browser if one was launched
    pub async fn close(self) -> Result<()> {
        if let Some(chrome) = self.chrome {
            chrome.close().await?;
        }
        Ok(())
    }

    async fn chrome(&mut self) -> Result<&ChromeSession, FetchError> {
        if self.chrome.is_none() {
            let session = ChromeSession::launch(&self.config)
                .await
                .map_err(FetchError::Browser)?;
            self.chrome = Some(session);
        }
        self.chrome
            .as_ref()
            .ok_or_else(|| FetchError::Browser(anyhow::anyhow!("browser not running")))
    }

    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<Output, FetchError> {
        let command = format!("cd {}; {} {}", cwd.display(), program, args.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.config.timeout, cmd.output())
            .await
            .map_err(|_| FetchError::Timeout {
                command: command.clone(),
                after: self.config.timeout,
            })?
            .map_err(|source| FetchError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Exit {
                command,
                code: output.status.code(),
                stderr: last_line(&stderr).to_string(),
            });
        }

        Ok(output)
    }

    fn chmod(&self, out_dir: &Path, name: &str) -> Result<(), FetchError> {
        let path = out_dir.join(name);
        if !path.exists() {
            return Err(FetchError::Missing(path));
        }
        set_mode_recursive(&path, self.config.archive_permissions)?;
        Ok(())
    }
}

fn record(step: Step, result: Result<StepOutcome, FetchError>) -> StepReport {
    let outcome = match result {
        Ok(StepOutcome::Skipped) => {
            info!("    √ Skipping {}", step);
            StepOutcome::Skipped
        }
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(step = %step, "       Failed: {}", e);
            StepOutcome::Failed(e.to_string())
        }
    };
    StepReport { step, outcome }
}

fn last_line(s: &str) -> &str {
    s.lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_default()
        .trim()
}

/// Apply `mode` to a single path
pub fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

/// `set_mode`, logging a failure instead of returning it
fn apply_permissions(path: &Path, mode: u32) -> bool {
    match set_mode(path, mode) {
        Ok(()) => true,
        Err(e) => {
            warn!("    ! Failed to chmod {} to {:o}: {}", path.display(), mode, e);
            false
        }
    }
}

/// Apply `mode` to `path` and, for directories, everything below it
pub fn set_mode_recursive(path: &Path, mode: u32) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        return Ok(());
    }
    set_mode(path, mode)?;
    if meta.is_dir() {
        for entry in fs::read_dir(path)? {
            set_mode_recursive(&entry?.path(), mode)?;
        }
    }
    Ok(())
}
