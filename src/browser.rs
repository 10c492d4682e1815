//! Headless Chrome session via chromiumoxide, used for PDF and screenshot capture

use crate::config::ArchiveConfig;
use anyhow::{anyhow, bail, Context, Result};
use crate::config::Resolution;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, PrintToPdfParams};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A running browser, launched once and reused for every link
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    /// Launch the configured Chrome binary headless at the configured window size
    pub async fn launch(config: &ArchiveConfig) -> Result<Self> {
        let (browser, mut handler) = Browser::launch(browser_config(config)?)
            .await
            .with_context(|| format!("Failed to launch {}", config.chrome_binary))?;

        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        Ok(Self { browser, handler })
    }

    /// Print `url` to a PDF file at `path`
    pub async fn print_pdf(&self, url: &str, path: &Path, timeout: Duration) -> Result<()> {
        let page = self.open(url, timeout).await?;
        let result = page.save_pdf(PrintToPdfParams::default(), path).await;
        let _ = page.close().await;
        result.context("Failed to print PDF")?;
        Ok(())
    }

    /// Save a PNG of the visible viewport of `url` at `path`
    pub async fn screenshot(&self, url: &str, path: &Path, timeout: Duration) -> Result<()> {
        let page = self.open(url, timeout).await?;
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(false)
            .build();
        let result = page.save_screenshot(params, path).await;
        let _ = page.close().await;
        result.context("Failed to take screenshot")?;
        Ok(())
    }

    async fn open(&self, url: &str, timeout: Duration) -> Result<Page> {
        let page = self.browser.new_page("about:blank").await?;

        let nav = tokio::time::timeout(timeout, page.goto(url))
            .await
            .map(|r| r.map(|_| ()));

        match nav {
            Ok(Ok(())) => Ok(page),
            Ok(Err(e)) => {
                let _ = page.close().await;
                bail!("{}: {}", describe_error(&e.to_string()), e)
            }
            Err(_) => {
                let _ = page.close().await;
                bail!("Navigation timeout after {}s", timeout.as_secs())
            }
        }
    }

    /// Close the browser
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        let _ = self.browser.wait().await;
        self.handler.abort();
        Ok(())
    }
}

/// Browser launch options. Pages are emulated at the configured resolution,
/// otherwise chromiumoxide falls back to an 800x600 viewport.
fn browser_config(config: &ArchiveConfig) -> Result<BrowserConfig> {
    BrowserConfig::builder()
        .chrome_executable(&config.chrome_binary)
        .window_size(config.resolution.width, config.resolution.height)
        .viewport(viewport(config.resolution))
        .request_timeout(config.timeout)
        .no_sandbox()
        .arg("--disable-gpu")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-setuid-sandbox")
        .arg("--no-first-run")
        .arg("--headless=new")
        .build()
        .map_err(|e| anyhow!("Browser config error: {}", e))
}

fn viewport(resolution: Resolution) -> Viewport {
    Viewport {
        width: resolution.width,
        height: resolution.height,
        ..Viewport::default()
    }
}

fn describe_error(error: &str) -> &'static str {
    if error.contains("ERR_NAME_NOT_RESOLVED") {
        "DNS_FAILED"
    } else if error.contains("ERR_CONNECTION_REFUSED") {
        "CONNECTION_REFUSED"
    } else if error.contains("ERR_CONNECTION_TIMED_OUT") {
        "TIMEOUT"
    } else if error.contains("ERR_CERT") || error.contains("SSL") {
        "SSL_ERROR"
    } else {
        "NETWORK_ERROR"
    }
}
