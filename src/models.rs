//! Data models for discovered candidates, extracted articles and committed entries.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`CandidateUrl`]: An article-shaped link found on a listing page
//! - [`Article`]: Structured article data extracted from a rendered page
//! - [`MediaAsset`] / [`MediaManifest`]: Downloaded media and where it lives
//! - [`DedupIndex`]: Known URLs and normalized titles
//! - [`ArchiveEntry`]: The committed, on-disk representation of one article
//!
//! JSON field names are camelCase to match the archive layout read by
//! downstream tools.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::utils::{normalize_title, url_hash, word_count};

/// Title used when no extraction rule produces a usable headline.
pub const UNTITLED: &str = "Untitled Article";

/// Author used when no extraction rule produces a usable byline.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Body text returned when every body strategy comes up empty.
pub const NO_CONTENT: &str = "No content extracted";

/// A discovered link that structurally resembles an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateUrl {
    /// Absolute URL of the candidate.
    pub url: String,
    /// Registrable domain the URL belongs to.
    pub domain: String,
}

/// Whether a video reference is a downloadable file or an embedded player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoKind {
    File,
    Embed,
}

/// An image referenced by an article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageRef {
    pub url: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub title: String,
}

/// A video referenced by an article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VideoRef {
    pub url: String,
    pub kind: VideoKind,
}

/// Structured article data produced by the content extractor.
///
/// `raw_markup` is never part of the JSON record; the archive writes it to
/// its own `article.html` file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub url: String,
    pub title: String,
    pub author: String,
    /// ISO-8601 timestamp when one could be parsed, otherwise the raw value.
    pub publish_date: String,
    pub body_text: String,
    /// Ordered, duplicate-free.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub videos: Vec<VideoRef>,
    #[serde(skip)]
    pub raw_markup: Option<String>,
    pub extracted_at: DateTime<Utc>,
}

impl Article {
    /// Stable identity of the article: hex SHA-256 of its URL.
    pub fn id(&self) -> String {
        url_hash(&self.url)
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.body_text)
    }

    /// The compact record published to job observers on completion.
    pub fn summary(&self) -> ArticleSummary {
        ArticleSummary {
            title: self.title.clone(),
            author: self.author.clone(),
            publish_date: self.publish_date.clone(),
            word_count: self.word_count(),
            image_count: self.images.len(),
            video_count: self.videos.len(),
        }
    }
}

/// Media category of a downloaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A media file that was downloaded for an article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    /// Path relative to the domain root (staging path before commit,
    /// entry `media/` path after).
    pub local_relative_path: String,
    pub kind: MediaKind,
}

/// Media acquired for one article, still sitting in its staging directory.
#[derive(Debug, Clone, Default)]
pub struct MediaManifest {
    pub assets: Vec<MediaAsset>,
    /// Staging directory relative to the domain root, if one was created.
    pub staging_dir: Option<String>,
}

/// Known URLs and normalized titles used to skip already-archived articles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DedupIndex {
    #[serde(default)]
    pub urls: BTreeSet<String>,
    #[serde(default)]
    pub titles: BTreeSet<String>,
}

impl DedupIndex {
    /// Duplicate iff the exact URL or the normalized title is already known.
    ///
    /// The placeholder title is never matched, otherwise every untitled page
    /// would collide with the first one.
    pub fn contains(&self, url: &str, title: &str) -> bool {
        if self.urls.contains(url) {
            return true;
        }
        let normalized = normalize_title(title);
        !normalized.is_empty()
            && normalized != normalize_title(UNTITLED)
            && self.titles.contains(&normalized)
    }

    pub fn insert(&mut self, url: &str, title: &str) {
        self.urls.insert(url.to_string());
        let normalized = normalize_title(title);
        if !normalized.is_empty() && normalized != normalize_title(UNTITLED) {
            self.titles.insert(normalized);
        }
    }
}

/// Flat per-entry metadata: one row of the master list and spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMetadata {
    pub url: String,
    pub title: String,
    pub author: String,
    pub publish_date: String,
    pub word_count: usize,
    pub tags: Vec<String>,
    pub image_count: usize,
    pub video_count: usize,
    pub scraped_at: DateTime<Utc>,
}

/// A committed article in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveEntry {
    pub id: String,
    /// Entry folder relative to the domain root, `/`-separated.
    pub folder_path: String,
    pub metadata: EntryMetadata,
    pub media_manifest: Vec<MediaAsset>,
}

/// The full structured record written to `article.json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredArticle {
    pub id: String,
    pub folder_path: String,
    #[serde(flatten)]
    pub article: Article,
    pub word_count: usize,
    #[serde(default)]
    pub media: Vec<MediaAsset>,
}

impl StoredArticle {
    /// Rebuild the in-memory entry from a record read back from disk.
    pub fn to_entry(&self) -> ArchiveEntry {
        ArchiveEntry {
            id: self.id.clone(),
            folder_path: self.folder_path.clone(),
            metadata: EntryMetadata {
                url: self.article.url.clone(),
                title: self.article.title.clone(),
                author: self.article.author.clone(),
                publish_date: self.article.publish_date.clone(),
                word_count: self.word_count,
                tags: self.article.tags.clone(),
                image_count: self.article.images.len(),
                video_count: self.article.videos.len(),
                scraped_at: self.article.extracted_at,
            },
            media_manifest: self.media.clone(),
        }
    }
}

/// Completion summary published to job observers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub title: String,
    pub author: String,
    pub publish_date: String,
    pub word_count: usize,
    pub image_count: usize,
    pub video_count: usize,
}

/// Counters for one orchestrator pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub discovered: usize,
    pub scraped: usize,
    pub duplicates: usize,
    pub failed: usize,
    /// Summary of the most recently committed article.
    pub last_article: Option<ArticleSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article() -> Article {
        Article {
            url: "https://example.com/news/2024/01/15/headline-123456".to_string(),
            title: "City Council Approves New Budget".to_string(),
            author: "Jane Reporter".to_string(),
            publish_date: "2024-01-15T14:30:00".to_string(),
            body_text: "one two three four five".to_string(),
            tags: vec!["politics".to_string()],
            images: vec![ImageRef {
                url: "https://example.com/a.jpg".to_string(),
                alt: "A".to_string(),
                title: String::new(),
            }],
            videos: vec![],
            raw_markup: Some("<html></html>".to_string()),
            extracted_at: Utc::now(),
        }
    }

    #[test]
    fn test_article_serializes_camel_case_without_markup() {
        let json = serde_json::to_string(&sample_article()).unwrap();
        assert!(json.contains("\"publishDate\""));
        assert!(json.contains("\"bodyText\""));
        assert!(!json.contains("rawMarkup"));
        assert!(!json.contains("<html>"));
    }

    #[test]
    fn test_article_id_is_stable() {
        let a = sample_article();
        assert_eq!(a.id(), a.clone().id());
        assert_eq!(a.id().len(), 64);
    }

    #[test]
    fn test_summary_counts() {
        let summary = sample_article().summary();
        assert_eq!(summary.word_count, 5);
        assert_eq!(summary.image_count, 1);
        assert_eq!(summary.video_count, 0);
    }

    #[test]
    fn test_dedup_index_matches_url_or_normalized_title() {
        let mut index = DedupIndex::default();
        index.insert("https://example.com/a", "Breaking News Today");
        assert!(index.contains("https://example.com/a", "Something else"));
        assert!(index.contains("https://example.com/b", "  breaking NEWS today "));
        assert!(!index.contains("https://example.com/c", "Different story"));
    }

    #[test]
    fn test_dedup_index_ignores_placeholder_title() {
        let mut index = DedupIndex::default();
        index.insert("https://example.com/a", UNTITLED);
        assert!(index.titles.is_empty());
        assert!(!index.contains("https://example.com/b", UNTITLED));
    }

    #[test]
    fn test_video_kind_serialization() {
        let v = VideoRef {
            url: "https://www.youtube.com/embed/x".to_string(),
            kind: VideoKind::Embed,
        };
        let json = serde_json::to_string(&v).unwrap();
        assert!(json.contains("\"embed\""));
    }

    #[test]
    fn test_stored_article_roundtrips_to_entry() {
        let article = sample_article();
        let stored = StoredArticle {
            id: article.id(),
            folder_path: "articles/2024/january/15/x".to_string(),
            word_count: article.word_count(),
            article,
            media: vec![],
        };
        let json = serde_json::to_string(&stored).unwrap();
        let back: StoredArticle = serde_json::from_str(&json).unwrap();
        let entry = back.to_entry();
        assert_eq!(entry.id, stored.id);
        assert_eq!(entry.metadata.image_count, 1);
        assert_eq!(entry.metadata.word_count, 5);
    }
}
