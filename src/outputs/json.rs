//! JSON outputs of the archive.
//!
//! # Files
//!
//! ```text
//! {domain}/
//! ├── index.json      # dedup index + counts
//! ├── articles.json   # master list of entries
//! ├── summary.json    # domain-level statistics
//! └── articles/…/article.json
//! ```
//!
//! Sets and maps are written in sorted order so that exporting an unchanged
//! archive twice produces the same counts and ordering.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::archive::layout::partition_time_of;
use crate::error::StoreError;
use crate::models::{ArchiveEntry, DedupIndex};

/// Number of tags kept in `summary.json`.
pub const TOP_TAGS: usize = 50;

/// Write any serializable value as pretty JSON.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).await?;
    Ok(())
}

/// On-disk form of the dedup index.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedIndex {
    #[serde(flatten)]
    pub index: DedupIndex,
    #[serde(default)]
    pub total_articles: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Load `index.json`. A missing or corrupt file yields an empty index.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_index(path: &Path) -> DedupIndex {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No dedup index yet; starting empty");
            return DedupIndex::default();
        }
        Err(e) => {
            warn!(error = %e, "Unreadable dedup index; starting empty");
            return DedupIndex::default();
        }
    };
    match serde_json::from_str::<PersistedIndex>(&raw) {
        Ok(persisted) => {
            info!(
                urls = persisted.index.urls.len(),
                titles = persisted.index.titles.len(),
                "Loaded dedup index"
            );
            persisted.index
        }
        Err(e) => {
            warn!(error = %e, "Corrupt dedup index; starting empty");
            DedupIndex::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DateRange {
    pub earliest: String,
    pub latest: String,
}

/// Domain-level statistics written to `summary.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainSummary {
    pub domain: String,
    pub total_articles: usize,
    pub total_words: usize,
    pub total_images: usize,
    pub total_videos: usize,
    pub authors: BTreeMap<String, usize>,
    /// `(tag, count)`, most frequent first, ties by name.
    pub top_tags: Vec<(String, usize)>,
    pub date_range: Option<DateRange>,
    pub generated_at: DateTime<Utc>,
}

impl DomainSummary {
    pub fn from_entries(domain: &str, entries: &[ArchiveEntry]) -> Self {
        let mut authors = BTreeMap::new();
        let mut tag_counts: BTreeMap<String, usize> = BTreeMap::new();
        for entry in entries {
            *authors.entry(entry.metadata.author.clone()).or_insert(0) += 1;
            // count a tag once per article
            let unique: BTreeSet<&String> = entry.metadata.tags.iter().collect();
            for tag in unique {
                *tag_counts.entry(tag.clone()).or_insert(0) += 1;
            }
        }

        let top_tags = tag_counts
            .into_iter()
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            .take(TOP_TAGS)
            .collect();

        let dates = entries
            .iter()
            .map(|e| partition_time_of(&e.metadata))
            .minmax();
        let date_range = dates.into_option().map(|(earliest, latest)| DateRange {
            earliest: earliest.format("%Y-%m-%dT%H:%M:%S").to_string(),
            latest: latest.format("%Y-%m-%dT%H:%M:%S").to_string(),
        });

        Self {
            domain: domain.to_string(),
            total_articles: entries.len(),
            total_words: entries.iter().map(|e| e.metadata.word_count).sum(),
            total_images: entries.iter().map(|e| e.metadata.image_count).sum(),
            total_videos: entries.iter().map(|e| e.metadata.video_count).sum(),
            authors,
            top_tags,
            date_range,
            generated_at: Utc::now(),
        }
    }
}
