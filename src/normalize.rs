//! Link normalization: scheme filtering, ordering and timestamp deduplication
//!
//! Browser exports (Firefox in particular) give many bookmarks the same
//! timestamp. Since the timestamp doubles as the archive directory name, every
//! distinct link must end up with its own. Colliding links get a decimal nonce
//! appended: `1234`, `1234.1`, `1234.2`, ...

use crate::link::Link;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Filter, sort and uniqueify raw parser output.
///
/// The result is ordered most recent first. An empty result is a valid
/// outcome here; callers decide whether that is fatal.
pub fn normalize_and_dedupe(links: Vec<Link>) -> Vec<Link> {
    uniquefied_links(valid_links(links))
}

/// Remove chrome://, about:, mailto: and other links that can't be archived
pub fn valid_links(links: Vec<Link>) -> Vec<Link> {
    links.into_iter().filter(Link::is_archivable).collect()
}

/// Sort by descending `(timestamp, url)` string key and give every distinct
/// URL its own timestamp. Exact duplicates (same timestamp and URL) are dropped.
pub fn uniquefied_links(mut links: Vec<Link>) -> Vec<Link> {
    sort_links(&mut links);

    // timestamp -> url that claimed it
    let mut claimed: HashMap<String, String> = HashMap::with_capacity(links.len());
    // (original timestamp, url) pairs already emitted
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(links.len());
    let mut unique = Vec::with_capacity(links.len());

    for mut link in links {
        let key = (link.timestamp.clone(), link.url.clone());
        if seen.contains(&key) {
            continue;
        }
        if let Some(owner) = claimed.get(&link.timestamp) {
            if *owner == link.url {
                continue;
            }
            link.timestamp = next_uniq_timestamp(&claimed, &link.timestamp);
        }
        seen.insert(key);
        claimed.insert(link.timestamp.clone(), link.url.clone());
        unique.push(link);
    }

    unique
}

/// Lexicographic, not numeric: "9" sorts after "100".
fn sort_links(links: &mut [Link]) {
    links.sort_by(|a, b| {
        (a.timestamp.as_str(), a.url.as_str()).cmp(&(b.timestamp.as_str(), b.url.as_str()))
    });
    links.reverse();
}

/// Find the first free `<base>.<n>` for a colliding timestamp.
///
/// `base` is everything before the first dot. An existing integer suffix is
/// the starting nonce (it is already known to collide); otherwise the search
/// starts at 1. The nonce is kept as decimal text so it has no upper bound.
pub fn next_uniq_timestamp<V>(claimed: &HashMap<String, V>, timestamp: &str) -> String {
    if !claimed.contains_key(timestamp) {
        return timestamp.to_string();
    }

    let (base, mut nonce) = match timestamp.split_once('.') {
        Some((base, rest)) if is_nonce(rest) => (base, canonical_nonce(rest)),
        _ => (timestamp, "1".to_string()),
    };

    loop {
        let candidate = format!("{}.{}", base, nonce);
        if !claimed.contains_key(&candidate) {
            return candidate;
        }
        nonce = increment_nonce(&nonce);
    }
}

fn is_nonce(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// "007" -> "7", "000" -> "0"
fn canonical_nonce(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Add one to a string of decimal digits
fn increment_nonce(digits: &str) -> String {
    let mut bytes = digits.as_bytes().to_vec();
    for b in bytes.iter_mut().rev() {
        if *b == b'9' {
            *b = b'0';
        } else {
            *b += 1;
            return String::from_utf8_lossy(&bytes).into_owned();
        }
    }
    let mut carried = String::with_capacity(bytes.len() + 1);
    carried.push('1');
    carried.push_str(&String::from_utf8_lossy(&bytes));
    carried
}

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("resume value is not a valid number: {0}")]
    InvalidResume(String),
    #[error("link timestamp is not a valid number: {0}")]
    InvalidTimestamp(String),
}

/// Keep only links at or after `resume` (numeric comparison).
///
/// Applied after normalization so the dedup order is unaffected.
pub fn filter_resume(links: Vec<Link>, resume: &str) -> Result<Vec<Link>, ResumeError> {
    let threshold: f64 = resume
        .trim()
        .parse()
        .map_err(|_| ResumeError::InvalidResume(resume.to_string()))?;

    let mut kept = Vec::with_capacity(links.len());
    for link in links {
        let ts: f64 = link
            .timestamp
            .parse()
            .map_err(|_| ResumeError::InvalidTimestamp(link.timestamp.clone()))?;
        if ts >= threshold {
            kept.push(link);
        }
    }
    Ok(kept)
}
