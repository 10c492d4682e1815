//! Link record shared by every export parser, the normalizer, the fetch
//! orchestrator and the index renderer.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Legacy prefix Pocket and Readability exports wrapped around real URLs.
pub const READABILITY_PREFIX: &str = "http://www.readability.com/read?url=";

/// Suffix Readability appended to saved titles.
pub const READABILITY_TITLE_SUFFIX: &str = " — Readability";

const IMAGE_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "svg", "bmp", "gif", "tiff", "webp"];

/// A single bookmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Absolute URL as found in the export
    pub url: String,
    /// Host portion of the URL
    pub domain: String,
    /// URL without scheme and query string
    pub base_url: String,
    /// Sort key and directory name, e.g. "1500000000" or "1500000000.1"
    pub timestamp: String,
    /// Human readable rendering of the timestamp
    pub time: String,
    /// Free-text tags, possibly empty
    pub tags: String,
    /// Display title
    pub title: String,
    /// Special handling category
    #[serde(rename = "type")]
    pub link_type: Option<LinkType>,
}

impl Link {
    /// Build a link from the fields every export format provides.
    ///
    /// `title` falls back to the URL without its scheme when empty.
    pub fn new(url: &str, timestamp: &str, time: String, tags: &str, title: &str) -> Self {
        let without_scheme = without_scheme(url);
        let domain = domain(url);
        let base_url = base_url(url);
        let title = if title.is_empty() {
            without_scheme
        } else {
            title.to_string()
        };
        let link_type = LinkType::classify(&base_url, &domain);

        Self {
            url: url.to_string(),
            domain,
            base_url,
            timestamp: timestamp.to_string(),
            time,
            tags: tags.to_string(),
            title,
            link_type,
        }
    }

    /// True for links whose fetched file already is the content (no PDF or screenshot)
    pub fn is_static_file(&self) -> bool {
        matches!(self.link_type, Some(LinkType::Pdf) | Some(LinkType::Image))
    }

    /// True for URLs that the fetchers can archive (http, https, ftp)
    pub fn is_archivable(&self) -> bool {
        self.url.starts_with("http") || self.url.starts_with("ftp")
    }
}

/// Links that need special handling during fetch and rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkType {
    #[serde(rename = "PDF")]
    Pdf,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "wiki")]
    Wiki,
    #[serde(rename = "youtube")]
    Youtube,
}

impl LinkType {
    /// Infer the link type from its base URL suffix and domain
    pub fn classify(base_url: &str, domain: &str) -> Option<Self> {
        let extension = base_url
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        if base_url.ends_with(".pdf") {
            Some(LinkType::Pdf)
        } else if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            Some(LinkType::Image)
        } else if domain.contains("wikipedia.org") {
            Some(LinkType::Wiki)
        } else if domain.contains("youtube.com") {
            Some(LinkType::Youtube)
        } else {
            None
        }
    }
}

impl std::fmt::Display for LinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkType::Pdf => write!(f, "PDF"),
            LinkType::Image => write!(f, "image"),
            LinkType::Wiki => write!(f, "wiki"),
            LinkType::Youtube => write!(f, "youtube"),
        }
    }
}

/// URL with a leading `http://` or `https://` removed
pub fn without_scheme(url: &str) -> String {
    url.replace("http://", "").replace("https://", "")
}

/// Host portion of a URL (scheme and path stripped)
pub fn domain(url: &str) -> String {
    without_scheme(url)
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// URL without scheme and query string
pub fn base_url(url: &str) -> String {
    without_scheme(url)
        .split('?')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Render a seconds-since-epoch timestamp as `%Y-%m-%d %H:%M` local time
pub fn format_time(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
