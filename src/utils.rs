//! Utility functions for hashing, slugs, dates, domains and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - URL identity hashing for entry ids and staging directories
//! - Title normalization and slugification for dedup and folder names
//! - Best-effort publish date parsing
//! - Registrable domain extraction for same-site filtering
//! - File system validation for the archive root

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Maximum slug length used in entry folder names.
pub const MAX_SLUG_LEN: usize = 60;

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes (on a char boundary) with an
/// ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Hex SHA-256 of a URL. Used as the stable article id.
pub fn url_hash(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Short, filesystem-safe hash of a URL (first 12 hex chars of [`url_hash`]).
pub fn short_hash(url: &str) -> String {
    url_hash(url)[..12].to_string()
}

/// Convert a title to a folder-safe slug.
///
/// Lowercases, drops everything that is not alphanumeric, joins the remaining
/// words with single hyphens and caps the result at `max_len` characters
/// without leaving a trailing hyphen.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify_title("Hello World", 60), "hello-world");
/// assert_eq!(slugify_title("Trump-Xi 'situationship'", 60), "trump-xi-situationship");
/// ```
pub fn slugify_title(title: &str, max_len: usize) -> String {
    let lowered = title.to_lowercase();
    let words = lowered
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_' || c == '/')
        .map(|w| w.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>();

    let mut slug = words.join("-");
    if slug.chars().count() > max_len {
        slug = slug.chars().take(max_len).collect();
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// Normalized form of a title used for duplicate detection.
pub fn normalize_title(title: &str) -> String {
    collapse_whitespace(title).to_lowercase()
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// English month name used in the archive's date partitions.
pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "january",
        2 => "february",
        3 => "march",
        4 => "april",
        5 => "may",
        6 => "june",
        7 => "july",
        8 => "august",
        9 => "september",
        10 => "october",
        11 => "november",
        12 => "december",
        _ => "unknown",
    }
}

/// Parse a publish date from a machine-readable attribute or visible text.
///
/// Offsets are dropped after parsing: the archive files articles by the
/// publisher's own wall-clock date and time. Date-only values parse as
/// midnight.
pub fn parse_publish_date(raw: &str) -> Option<NaiveDateTime> {
    let cleaned = collapse_whitespace(raw);
    let trimmed = strip_date_prefix(&cleaned);
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M%z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.naive_local());
        }
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    // "2024-01-15T09:00:00.000Z"-style strings with trailing junk
    if let Some(head) = trimmed.get(..10) {
        if let Ok(d) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn strip_date_prefix(s: &str) -> &str {
    let lower = s.to_lowercase();
    for prefix in ["published on", "published:", "published", "updated on", "updated:", "updated", "posted on", "posted"] {
        if lower.starts_with(prefix) && s.is_char_boundary(prefix.len()) {
            return s[prefix.len()..].trim();
        }
    }
    s.trim()
}

/// Render a parsed date in the archive's canonical ISO-8601 form.
pub fn format_publish_date(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Registrable domain (eTLD+1) of a host, from the Public Suffix List.
///
/// Private suffixes count, so `alice.github.io` and `bob.github.io` are
/// different sites. IP literals and hosts with no listed suffix come back
/// lower-cased as-is.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(registrable_domain("www.bbc.co.uk"), "bbc.co.uk");
/// assert_eq!(registrable_domain("lite.cnn.com"), "cnn.com");
/// ```
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();
    if host.trim_matches(['[', ']']).parse::<std::net::IpAddr>().is_ok() {
        return host;
    }
    match psl::domain(host.as_bytes()) {
        Some(domain) => String::from_utf8_lossy(domain.as_bytes()).to_string(),
        None => host,
    }
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Archive directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
