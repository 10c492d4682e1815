//! index.html rendering for an archive folder

use crate::link::Link;
use anyhow::{Context, Result};
use askama::Template;
use chrono::Local;
use std::path::{Path, PathBuf};

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    updated: String,
    rows: Vec<IndexRow<'a>>,
}

/// One table row, with every link already resolved against the archive layout
struct IndexRow<'a> {
    time: &'a str,
    timestamp: &'a str,
    title: String,
    tags: &'a str,
    base_url: &'a str,
    domain: &'a str,
    url: &'a str,
    archive_href: String,
    pdf_href: String,
    screenshot_href: String,
}

impl<'a> IndexRow<'a> {
    fn new(link: &'a Link) -> Self {
        let dir = format!("archive/{}", link.timestamp);

        // PDFs and images are not printed or screenshotted; every column
        // points at the file wget saved instead
        let (title, archive_href, pdf_href, screenshot_href) = match link.link_type {
            Some(link_type) if link.is_static_file() => {
                let file = format!("{}/{}", dir, link.base_url);
                (
                    format!("{} ({})", link.title, link_type),
                    file.clone(),
                    file.clone(),
                    file,
                )
            }
            _ => (
                link.title.clone(),
                format!("{}/{}", dir, archive_url(link)),
                format!("{}/output.pdf", dir),
                format!("{}/screenshot.png", dir),
            ),
        };

        Self {
            time: &link.time,
            timestamp: &link.timestamp,
            title,
            tags: &link.tags,
            base_url: &link.base_url,
            domain: &link.domain,
            url: &link.url,
            archive_href,
            pdf_href,
            screenshot_href,
        }
    }
}

/// Path of the wget'ed html file relative to the link's folder.
///
/// wget `--adjust-extension` appends `.html` (or `index.html` for directory
/// URLs), so the saved path can differ from `base_url`.
pub fn archive_url(link: &Link) -> String {
    let (page, fragment) = match link.url.split_once('#') {
        Some((page, fragment)) => (page, Some(fragment)),
        None => (link.url.as_str(), None),
    };

    if has_html_extension(page) {
        return link.base_url.clone();
    }

    let without_scheme = page.split_once("://").map_or(page, |(_, rest)| rest);
    let mut path = if without_scheme.ends_with('/') {
        format!("{}index.html", without_scheme)
    } else {
        format!("{}.html", without_scheme)
    };
    if let Some(fragment) = fragment {
        path.push('#');
        path.push_str(fragment);
    }
    path
}

fn has_html_extension(page: &str) -> bool {
    let lower = page.to_ascii_lowercase();
    [".html", ".htm"]
        .iter()
        .any(|ext| lower.len() > ext.len() && lower.ends_with(ext))
}

/// Render the index page for `links` in the order given
pub fn render_index(links: &[Link], updated: &str) -> Result<String> {
    let template = IndexTemplate {
        updated: updated.to_string(),
        rows: links.iter().map(IndexRow::new).collect(),
    };
    template.render().context("Failed to render index.html")
}

/// Write `<out_root>/index.html`, returning its path
pub fn write_index(links: &[Link], out_root: &Path) -> Result<PathBuf> {
    let updated = Local::now().format("%Y-%m-%d %H:%M").to_string();
    let html = render_index(links, &updated)?;
    let path = out_root.join("index.html");
    std::fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn link(url: &str, title: &str) -> Link {
        Link::new(url, "1500000000", "2017-07-14 02:40".to_string(), "rust", title)
    }

    #[test]
    fn test_archive_url_appends_html() {
        assert_eq!(
            archive_url(&link("https://example.com/post", "t")),
            "example.com/post.html"
        );
        assert_eq!(
            archive_url(&link("https://example.com/blog/", "t")),
            "example.com/blog/index.html"
        );
    }

    #[test]
    fn test_archive_url_keeps_html() {
        assert_eq!(
            archive_url(&link("https://example.com/page.HTML", "t")),
            "example.com/page.HTML"
        );
        assert_eq!(
            archive_url(&link("http://example.com/old.htm", "t")),
            "example.com/old.htm"
        );
    }

    #[test]
    fn test_archive_url_keeps_fragment() {
        assert_eq!(
            archive_url(&link("https://example.com/docs#install", "t")),
            "example.com/docs.html#install"
        );
        assert_eq!(
            archive_url(&link("https://example.com/#top", "t")),
            "example.com/index.html#top"
        );
    }

    #[test]
    fn test_static_file_row() {
        let l = link("https://example.com/paper.pdf", "Paper");
        let row = IndexRow::new(&l);
        assert_eq!(row.title, "Paper (PDF)");
        assert_eq!(row.archive_href, "archive/1500000000/example.com/paper.pdf");
        assert_eq!(row.pdf_href, row.archive_href);
        assert_eq!(row.screenshot_href, row.archive_href);
    }

    #[test]
    fn test_page_row() {
        let l = link("https://example.com/post", "Post");
        let row = IndexRow::new(&l);
        assert_eq!(row.title, "Post");
        assert_eq!(row.archive_href, "archive/1500000000/example.com/post.html");
        assert_eq!(row.pdf_href, "archive/1500000000/output.pdf");
        assert_eq!(row.screenshot_href, "archive/1500000000/screenshot.png");
    }

    #[test]
    fn test_render_escapes_and_counts() {
        let links = vec![
            link("https://a.com/1", "Fish & Chips"),
            link("https://b.com/2", "<script>alert(1)</script>"),
        ];
        let html = render_index(&links, "2024-01-01 00:00").unwrap();
        assert_eq!(html.matches("<tr>").count(), 3);
        assert!(html.contains("Fish &amp; Chips"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("2024-01-01 00:00"));
        assert!(html.contains("Saved Article (2)"));
    }

    #[test]
    fn test_write_index() {
        let dir = tempdir().unwrap();
        let path = write_index(&[link("https://a.com/", "A")], dir.path()).unwrap();
        assert_eq!(path, dir.path().join("index.html"));
        assert!(std::fs::read_to_string(path).unwrap().contains("1500000000"));
    }
}
