//! The on-disk archive of one domain.
//!
//! [`ArchiveStore`] owns the dedup index, the date-partitioned entry folders
//! and the aggregate exports under `{archive_root}/{domain}/`.
//!
//! # Commit
//!
//! 1. Create the entry folder (see [`layout::entry_folder`])
//! 2. Move staged media into `{entry}/media/` by rename, rewriting each
//!    asset's recorded path. A failed move is logged and the asset keeps its
//!    staged path. The emptied staging directory is removed.
//! 3. Write `article.json`, then `article.html` / `article.md` when enabled,
//!    then `README.txt`
//! 4. Record the entry and update the in-memory dedup index
//!
//! The persisted `index.json` is only rewritten by [`ArchiveStore::export_all`].
//! Entries committed after the last export are not in the on-disk index if the
//! process dies before the next export.

pub mod layout;

use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::error::StoreError;
use crate::models::{Article, ArchiveEntry, DedupIndex, MediaManifest, StoredArticle};
use crate::outputs::csv::write_csv;
use crate::outputs::indexes::write_chronological_index;
use crate::outputs::json::{DomainSummary, PersistedIndex, load_index, write_json};
use crate::outputs::markdown::{article_to_markdown, entry_readme};

pub const INDEX_JSON: &str = "index.json";
pub const ARTICLES_JSON: &str = "articles.json";
pub const ARTICLES_CSV: &str = "articles.csv";
pub const SUMMARY_JSON: &str = "summary.json";
pub const MEDIA_DIR: &str = "media";
pub const SCREENSHOT_FILE: &str = "screenshot.png";

/// Single-writer store for one domain's archive.
#[derive(Debug)]
pub struct ArchiveStore {
    domain: String,
    domain_root: PathBuf,
    index: DedupIndex,
    entries: Vec<ArchiveEntry>,
    save_markdown: bool,
}

impl ArchiveStore {
    pub fn new(archive_root: &Path, domain: &str, save_markdown: bool) -> Self {
        Self {
            domain: domain.to_string(),
            domain_root: archive_root.join(domain),
            index: DedupIndex::default(),
            entries: Vec::new(),
            save_markdown,
        }
    }

    pub fn domain_root(&self) -> &Path {
        &self.domain_root
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Create the domain root, load the persisted dedup index and reload
    /// committed entries from their `article.json` records.
    ///
    /// Reloaded entries feed the exports only; the dedup index comes from
    /// `index.json` alone.
    #[instrument(level = "info", skip_all, fields(domain = %self.domain))]
    pub async fn initialize(&mut self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.domain_root).await?;
        self.index = load_index(&self.domain_root.join(INDEX_JSON)).await;
        self.entries = self.reload_entries().await?;
        info!(
            entries = self.entries.len(),
            urls = self.index.urls.len(),
            "Archive store ready"
        );
        Ok(())
    }

    async fn reload_entries(&self) -> Result<Vec<ArchiveEntry>, StoreError> {
        let mut entries = Vec::new();
        let mut pending = vec![self.domain_root.join(layout::ARTICLES_DIR)];

        while let Some(dir) = pending.pop() {
            let mut read = match fs::read_dir(&dir).await {
                Ok(read) => read,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(item) = read.next_entry().await? {
                let path = item.path();
                if item.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                if path.file_name().is_none_or(|n| n != "article.json") {
                    continue;
                }
                let raw = fs::read_to_string(&path).await?;
                match serde_json::from_str::<StoredArticle>(&raw) {
                    Ok(stored) => entries.push(stored.to_entry()),
                    Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable record"),
                }
            }
        }

        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    pub fn is_duplicate(&self, article: &Article) -> bool {
        self.index.contains(&article.url, &article.title)
    }

    /// URL-only lookup, usable before a page has been fetched.
    pub fn is_known_url(&self, url: &str) -> bool {
        self.index.urls.contains(url)
    }

    /// Commit one article and its staged media. See the module docs for the order.
    #[instrument(level = "info", skip_all, fields(url = %article.url))]
    pub async fn commit(
        &mut self,
        article: &Article,
        manifest: MediaManifest,
        screenshot: Option<Vec<u8>>,
    ) -> Result<ArchiveEntry, StoreError> {
        let folder = layout::entry_folder(article);
        let dir = self.domain_root.join(&folder);
        fs::create_dir_all(&dir).await?;

        let mut media = Vec::with_capacity(manifest.assets.len());
        if !manifest.assets.is_empty() {
            fs::create_dir_all(dir.join(MEDIA_DIR)).await?;
        }
        for mut asset in manifest.assets {
            let staged = self.domain_root.join(&asset.local_relative_path);
            let Some(file_name) = staged.file_name().map(|n| n.to_string_lossy().to_string()) else {
                warn!(path = %asset.local_relative_path, "Staged media has no file name; keeping path");
                media.push(asset);
                continue;
            };
            let target_rel = format!("{folder}/{MEDIA_DIR}/{file_name}");
            match fs::rename(&staged, self.domain_root.join(&target_rel)).await {
                Ok(()) => asset.local_relative_path = target_rel,
                Err(e) => warn!(
                    source_url = %asset.source_url,
                    path = %asset.local_relative_path,
                    error = %e,
                    "Media move failed; asset keeps staged path"
                ),
            }
            media.push(asset);
        }
        if let Some(staging) = &manifest.staging_dir {
            if let Err(e) = fs::remove_dir(self.domain_root.join(staging)).await {
                debug!(%staging, error = %e, "Staging directory not removed");
            }
        }

        let stored = StoredArticle {
            id: article.id(),
            folder_path: folder.clone(),
            article: article.clone(),
            word_count: article.word_count(),
            media,
        };

        let mut files = vec!["article.json"];
        write_json(&dir.join("article.json"), &stored).await?;
        if let Some(markup) = &article.raw_markup {
            fs::write(dir.join("article.html"), markup).await?;
            files.push("article.html");
        }
        if self.save_markdown {
            fs::write(dir.join("article.md"), article_to_markdown(&stored)).await?;
            files.push("article.md");
        }
        if let Some(png) = screenshot {
            fs::write(dir.join(SCREENSHOT_FILE), png).await?;
            files.push(SCREENSHOT_FILE);
        }
        fs::write(dir.join("README.txt"), entry_readme(&stored, &files)).await?;

        let entry = stored.to_entry();
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry.clone(),
            None => self.entries.push(entry.clone()),
        }
        self.index.insert(&article.url, &article.title);

        info!(
            folder = %folder,
            media = entry.media_manifest.len(),
            words = entry.metadata.word_count,
            "Committed entry"
        );
        Ok(entry)
    }

    /// Entries newest first by partition time, ties by id.
    pub fn sorted_entries(&self) -> Vec<ArchiveEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| {
            layout::partition_time_of(&b.metadata)
                .cmp(&layout::partition_time_of(&a.metadata))
                .then_with(|| a.id.cmp(&b.id))
        });
        sorted
    }

    /// Rebuild every aggregate file from the in-memory entry list and flush
    /// the dedup index.
    #[instrument(level = "info", skip_all, fields(domain = %self.domain, entries = self.entries.len()))]
    pub async fn export_all(&self) -> Result<DomainSummary, StoreError> {
        let root = &self.domain_root;
        fs::create_dir_all(root).await?;
        let sorted = self.sorted_entries();

        write_json(&root.join(ARTICLES_JSON), &sorted).await?;
        write_csv(&root.join(ARTICLES_CSV), &sorted).await?;

        let persisted = PersistedIndex {
            index: self.index.clone(),
            total_articles: sorted.len(),
            last_updated: Some(Utc::now()),
        };
        write_json(&root.join(INDEX_JSON), &persisted).await?;

        let summary = DomainSummary::from_entries(&self.domain, &sorted);
        write_json(&root.join(SUMMARY_JSON), &summary).await?;

        write_chronological_index(root, &self.domain, &sorted).await?;

        info!(
            total_articles = summary.total_articles,
            total_words = summary.total_words,
            "Exported archive"
        );
        Ok(summary)
    }
}
