//! Chronological Markdown index of the archive (`ARCHIVE_INDEX.md`).
//!
//! Entries are grouped by year, then month, newest first. Each line links
//! the entry folder and shows its publish date and author.
//!
//! The file is regenerated from scratch on every export.

use chrono::Datelike;
use itertools::Itertools;
use std::fmt::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use crate::archive::layout::partition_time_of;
use crate::error::StoreError;
use crate::models::ArchiveEntry;
use crate::utils::month_name;

pub const INDEX_FILE: &str = "ARCHIVE_INDEX.md";

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Build the chronological index for `domain`.
pub fn render_chronological_index(domain: &str, entries: &[ArchiveEntry]) -> String {
    let mut md = String::new();
    writeln!(md, "# {domain} archive\n").ok();
    writeln!(md, "{} articles.\n", entries.len()).ok();

    let dated = entries
        .iter()
        .map(|e| (partition_time_of(&e.metadata), e))
        .sorted_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));

    let mut current_year = None;
    let mut current_month = None;
    for (when, entry) in dated {
        if current_year != Some(when.year()) {
            if current_year.is_some() {
                md.push('\n');
            }
            current_year = Some(when.year());
            current_month = None;
            writeln!(md, "## {}\n", when.year()).ok();
        }
        if current_month != Some(when.month()) {
            if current_month.is_some() {
                md.push('\n');
            }
            current_month = Some(when.month());
            writeln!(md, "### {}\n", capitalize(month_name(when.month()))).ok();
        }
        writeln!(
            md,
            "- [{}](./{}/) - {} - {}",
            entry.metadata.title,
            entry.folder_path,
            when.format("%Y-%m-%d"),
            entry.metadata.author
        )
        .ok();
    }

    md
}

#[instrument(level = "info", skip_all, fields(%domain, entries = entries.len()))]
pub async fn write_chronological_index(
    domain_root: &Path,
    domain: &str,
    entries: &[ArchiveEntry],
) -> Result<(), StoreError> {
    let md = render_chronological_index(domain, entries);
    fs::write(domain_root.join(INDEX_FILE), md).await?;
    info!("Updated chronological index");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryMetadata;
    use chrono::Utc;

    fn entry(id: &str, title: &str, date: &str) -> ArchiveEntry {
        ArchiveEntry {
            id: id.to_string(),
            folder_path: format!("articles/{id}"),
            metadata: EntryMetadata {
                url: format!("https://example.com/{id}"),
                title: title.to_string(),
                author: "Jane".to_string(),
                publish_date: date.to_string(),
                word_count: 10,
                tags: vec![],
                image_count: 0,
                video_count: 0,
                scraped_at: Utc::now(),
            },
            media_manifest: vec![],
        }
    }

    #[test]
    fn test_newest_first_grouped_by_year_and_month() {
        let entries = vec![
            entry("a", "Old Story", "2023-06-01T10:00:00"),
            entry("b", "New Story", "2024-02-03T08:00:00"),
            entry("c", "Middle Story", "2024-01-15T09:00:00"),
        ];
        let md = render_chronological_index("example.com", &entries);

        let y2024 = md.find("## 2024").unwrap();
        let y2023 = md.find("## 2023").unwrap();
        assert!(y2024 < y2023);

        let feb = md.find("### February").unwrap();
        let jan = md.find("### January").unwrap();
        assert!(feb < jan);

        let new = md.find("[New Story](./articles/b/) - 2024-02-03 - Jane").unwrap();
        let middle = md.find("[Middle Story]").unwrap();
        let old = md.find("[Old Story]").unwrap();
        assert!(new < middle && middle < old);
        assert!(md.contains("3 articles."));
    }

    #[test]
    fn test_empty_archive() {
        let md = render_chronological_index("example.com", &[]);
        assert_eq!(md, "# example.com archive\n\n0 articles.\n\n");
    }
}
