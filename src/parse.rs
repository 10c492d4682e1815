//! Bookmark export parsers
//!
//! Supported formats:
//! - Pocket HTML export (getpocket.com/export)
//! - Pinboard JSON export (pinboard.in/export)
//! - Netscape bookmarks HTML (produced by all browsers)

use crate::link::{format_time, Link, READABILITY_PREFIX, READABILITY_TITLE_SUFFIX};
use chrono::NaiveDateTime;
use clap::ValueEnum;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const PINBOARD_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Known export file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// getpocket.com HTML export
    Pocket,
    /// pinboard.in JSON export
    Pinboard,
    /// Netscape-format browser bookmarks
    Bookmarks,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Pocket => write!(f, "pocket"),
            ExportFormat::Pinboard => write!(f, "pinboard"),
            ExportFormat::Bookmarks => write!(f, "bookmarks"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid pinboard JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("pinboard entry {index}: {source}")]
    Entry {
        index: usize,
        source: serde_json::Error,
    },
    #[error("pinboard entry {index}: invalid time {value:?}")]
    Time { index: usize, value: String },
}

/// Parse an export, detecting the format when none is given.
///
/// Detection order: Pinboard JSON, then Pocket, then Netscape bookmarks.
pub fn parse_export(
    content: &str,
    format: Option<ExportFormat>,
) -> Result<(ExportFormat, Vec<Link>), ParseError> {
    match format {
        Some(ExportFormat::Pocket) => Ok((ExportFormat::Pocket, parse_pocket_export(content))),
        Some(ExportFormat::Pinboard) => {
            Ok((ExportFormat::Pinboard, parse_pinboard_export(content)?))
        }
        Some(ExportFormat::Bookmarks) => {
            Ok((ExportFormat::Bookmarks, parse_bookmarks_export(content)))
        }
        None => Ok(detect_and_parse(content)),
    }
}

fn detect_and_parse(content: &str) -> (ExportFormat, Vec<Link>) {
    match parse_pinboard_export(content) {
        Ok(links) => return (ExportFormat::Pinboard, links),
        Err(e) => debug!("not a pinboard export: {}", e),
    }

    let links = parse_pocket_export(content);
    if !links.is_empty() {
        return (ExportFormat::Pocket, links);
    }

    (ExportFormat::Bookmarks, parse_bookmarks_export(content))
}

/// Parse Pocket `<li><a href=".." time_added=".." tags="..">title</a></li>` entries
pub fn parse_pocket_export(content: &str) -> Vec<Link> {
    let doc = Html::parse_document(content);
    let Ok(selector) = Selector::parse("li > a[href][time_added]") else {
        return Vec::new();
    };

    doc.select(&selector)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let secs = parse_secs(a.value().attr("time_added")?)?;
            let url = href.replace(READABILITY_PREFIX, "");
            let tags = a.value().attr("tags").unwrap_or_default();
            let title = element_text(&a)
                .replace(READABILITY_TITLE_SUFFIX, "")
                .replace(READABILITY_PREFIX, "");

            Some(Link::new(
                &url,
                &secs.to_string(),
                format_time(secs),
                tags,
                title.trim(),
            ))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct PinboardEntry {
    href: String,
    time: String,
    #[serde(default)]
    tags: String,
    #[serde(default)]
    description: String,
}

/// Parse a Pinboard JSON array of bookmark objects
pub fn parse_pinboard_export(content: &str) -> Result<Vec<Link>, ParseError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(content)?;
    let mut links = Vec::with_capacity(entries.len());

    for (index, value) in entries.into_iter().enumerate() {
        if is_empty_entry(&value) {
            continue;
        }
        let entry: PinboardEntry =
            serde_json::from_value(value).map_err(|source| ParseError::Entry { index, source })?;

        let raw_time = entry.time.split(',').next().unwrap_or_default();
        let secs = NaiveDateTime::parse_from_str(raw_time, PINBOARD_TIME_FORMAT)
            .map_err(|_| ParseError::Time {
                index,
                value: entry.time.clone(),
            })?
            .and_utc()
            .timestamp();

        let title = entry.description.replace(READABILITY_TITLE_SUFFIX, "");
        links.push(Link::new(
            &entry.href,
            &secs.to_string(),
            format_time(secs),
            &entry.tags,
            title.trim(),
        ));
    }

    Ok(links)
}

fn is_empty_entry(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Parse Netscape-format `<a href=".." add_date="..">title</a>` entries
pub fn parse_bookmarks_export(content: &str) -> Vec<Link> {
    let doc = Html::parse_document(content);
    let Ok(selector) = Selector::parse("a[href][add_date]") else {
        return Vec::new();
    };

    doc.select(&selector)
        .filter_map(|a| {
            let url = a.value().attr("href")?;
            let secs = parse_secs(a.value().attr("add_date")?)?;
            let title = element_text(&a);

            Some(Link::new(
                url,
                &secs.to_string(),
                format_time(secs),
                "",
                title.trim(),
            ))
        })
        .collect()
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>()
}

fn parse_secs(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        debug!("skipping entry with non-numeric timestamp {:?}", raw);
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkType;

    const POCKET: &str = r#"<!DOCTYPE html>
<html>
<head><title>Pocket Export</title></head>
<body>
<h1>Unread</h1>
<ul>
<li><a href="https://example.com/article?ref=feed" time_added="1500000000" tags="rust,cli">Example Article</a></li>
<li><a href="http://www.readability.com/read?url=http://old.example.org/post" time_added="1400000000" tags="">Old Post — Readability</a></li>
<li><a href="https://untitled.example.net/page" time_added="1300000000" tags=""></a></li>
</ul>
</body>
</html>"#;

    const PINBOARD: &str = r#"[
        {"href": "https://example.com/a", "description": "A — Readability", "extended": "", "meta": "x", "hash": "y", "time": "2017-07-14T02:40:00Z", "shared": "no", "toread": "no", "tags": "one two"},
        null,
        {},
        {"href": "https://en.wikipedia.org/wiki/Rust", "description": "", "time": "2017-07-14T02:40:00Z,extra", "tags": ""}
    ]"#;

    const BOOKMARKS: &str = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<META HTTP-EQUIV="Content-Type" CONTENT="text/html; charset=UTF-8">
<TITLE>Bookmarks</TITLE>
<H1>Bookmarks</H1>
<DL><p>
    <DT><H3 ADD_DATE="1500000000">Folder</H3>
    <DL><p>
        <DT><A HREF="https://www.rust-lang.org/" ADD_DATE="1500000001" ICON="data:x">Rust</A>
        <DT><A HREF="https://example.com/paper.pdf" ADD_DATE="1500000002">Paper</A>
        <DT><A HREF="place:sort=8" ADD_DATE="1500000003">Recent</A>
    </DL><p>
</DL><p>"#;

    #[test]
    fn test_parse_pocket() {
        let links = parse_pocket_export(POCKET);
        assert_eq!(links.len(), 3);

        assert_eq!(links[0].url, "https://example.com/article?ref=feed");
        assert_eq!(links[0].timestamp, "1500000000");
        assert_eq!(links[0].tags, "rust,cli");
        assert_eq!(links[0].base_url, "example.com/article");
        assert_eq!(links[0].title, "Example Article");

        assert_eq!(links[1].url, "http://old.example.org/post");
        assert_eq!(links[1].title, "Old Post");

        assert_eq!(links[2].title, "untitled.example.net/page");
    }

    #[test]
    fn test_parse_pinboard() {
        let links = parse_pinboard_export(PINBOARD).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].timestamp, "1500000000");
        assert_eq!(links[0].title, "A");
        assert_eq!(links[0].tags, "one two");
        assert_eq!(links[1].timestamp, "1500000000");
        assert_eq!(links[1].link_type, Some(LinkType::Wiki));
        assert_eq!(links[1].title, "en.wikipedia.org/wiki/Rust");
    }

    #[test]
    fn test_parse_pinboard_missing_field() {
        let err = parse_pinboard_export(r#"[{"description": "no href", "time": "2017-07-14T02:40:00Z"}]"#)
            .unwrap_err();
        assert!(matches!(err, ParseError::Entry { index: 0, .. }));
        assert!(err.to_string().contains("href"));
    }

    #[test]
    fn test_parse_pinboard_bad_time() {
        let err = parse_pinboard_export(r#"[{"href": "https://a.com", "time": "last week"}]"#)
            .unwrap_err();
        assert!(matches!(err, ParseError::Time { index: 0, .. }));
    }

    #[test]
    fn test_parse_bookmarks() {
        let links = parse_bookmarks_export(BOOKMARKS);
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].url, "https://www.rust-lang.org/");
        assert_eq!(links[0].timestamp, "1500000001");
        assert_eq!(links[0].title, "Rust");
        assert_eq!(links[0].tags, "");
        assert_eq!(links[1].link_type, Some(LinkType::Pdf));
        // invalid schemes are left to the normalizer
        assert_eq!(links[2].url, "place:sort=8");
    }

    #[test]
    fn test_detect_format() {
        let (format, links) = parse_export(PINBOARD, None).unwrap();
        assert_eq!(format, ExportFormat::Pinboard);
        assert_eq!(links.len(), 2);

        let (format, links) = parse_export(POCKET, None).unwrap();
        assert_eq!(format, ExportFormat::Pocket);
        assert_eq!(links.len(), 3);

        let (format, links) = parse_export(BOOKMARKS, None).unwrap();
        assert_eq!(format, ExportFormat::Bookmarks);
        assert_eq!(links.len(), 3);
    }

    #[test]
    fn test_detect_nothing() {
        let (format, links) = parse_export("just some text", None).unwrap();
        assert_eq!(format, ExportFormat::Bookmarks);
        assert!(links.is_empty());
    }

    #[test]
    fn test_explicit_format_errors() {
        assert!(parse_export(POCKET, Some(ExportFormat::Pinboard)).is_err());
    }

    #[test]
    fn test_format_display() {
        assert_eq!(ExportFormat::Pocket.to_string(), "pocket");
        assert_eq!(ExportFormat::Pinboard.to_string(), "pinboard");
        assert_eq!(ExportFormat::Bookmarks.to_string(), "bookmarks");
    }
}
