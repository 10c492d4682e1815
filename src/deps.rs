//! External tool checks run before any link is fetched

use crate::config::{ArchiveConfig, FetchArgs};
use anyhow::Result;
use clap::Args;
use regex::Regex;
use serde::Serialize;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::info;

/// Oldest Chrome with headless PDF and screenshot support
pub const MIN_CHROME_VERSION: u32 = 59;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("missing dependency: {0}")]
    Missing(String),
    #[error("could not read version of {binary} from {output:?}")]
    UnknownVersion { binary: String, output: String },
    #[error(
        "{binary} version {version} found, {} or greater is required for headless PDF and screenshot saving",
        MIN_CHROME_VERSION
    )]
    ChromeTooOld { binary: String, version: u32 },
}

/// Versions of the tools the enabled steps need
#[derive(Debug, Default, Serialize)]
pub struct Dependencies {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wget: Option<String>,
}

#[derive(Args)]
pub struct CheckDepsArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,
}

pub async fn run_check_deps(args: CheckDepsArgs) -> Result<()> {
    let config = args.fetch.into_config(false);
    let deps = check_dependencies(&config).await?;
    println!("{}", serde_json::to_string(&deps)?);
    Ok(())
}

/// Verify the binaries required by the enabled fetch steps
pub async fn check_dependencies(config: &ArchiveConfig) -> Result<Dependencies, DependencyError> {
    info!("[*] Checking dependencies");
    let mut deps = Dependencies::default();

    if config.needs_chrome() {
        let output = version_output(&config.chrome_binary).await?;
        let major =
            chrome_major_version(&output).ok_or_else(|| DependencyError::UnknownVersion {
                binary: config.chrome_binary.clone(),
                output: output.clone(),
            })?;
        if major < MIN_CHROME_VERSION {
            return Err(DependencyError::ChromeTooOld {
                binary: config.chrome_binary.clone(),
                version: major,
            });
        }
        deps.chrome = Some(output.trim().to_string());
    }

    if config.fetch_wget {
        let output = version_output(&config.wget_binary).await?;
        deps.wget = output.lines().next().map(|l| l.trim().to_string());
    }

    Ok(deps)
}

async fn version_output(binary: &str) -> Result<String, DependencyError> {
    let probe = Command::new(binary)
        .arg("--version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(PROBE_TIMEOUT, probe).await {
        Ok(Ok(output)) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        }
        Ok(Err(e)) if e.kind() != io::ErrorKind::NotFound => {
            Err(DependencyError::Missing(format!("{} ({})", binary, e)))
        }
        _ => Err(DependencyError::Missing(binary.to_string())),
    }
}

/// Major version from output such as "Google Chrome 61.0.3114.0 canary"
/// or "Chromium 59.0.3029.110 built on Ubuntu, running on Ubuntu 16.04"
pub fn chrome_major_version(output: &str) -> Option<u32> {
    let re = Regex::new(r"(\d+)\.\d+\.\d+").ok()?;
    re.captures(output)?.get(1)?.as_str().parse().ok()
}
