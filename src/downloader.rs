//! Media acquisition into a per-article staging directory.
//!
//! Every image and file video of an article is downloaded into
//! `{domain_root}/.staging/{short-hash(article url)}/`. The archive store moves
//! the files into the entry folder on commit.
//!
//! # Deduplication
//!
//! Keyed by the hash of the **source URL**, for the lifetime of the acquirer
//! (one run). A URL that was already downloaded is skipped, so two references
//! to it produce a single file and a single manifest entry. Byte-identical
//! files served from different URLs are kept as distinct assets.
//!
//! # Failures
//!
//! A failed download is logged and the asset is left out of the manifest.

use futures::StreamExt;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::error::AssetError;
use crate::models::{Article, MediaAsset, MediaKind, MediaManifest, VideoKind};
use crate::utils::{short_hash, url_hash};

/// Name of the staging directory under a domain root.
pub const STAGING_DIR: &str = ".staging";

/// Downloads article media into staging with in-run URL deduplication.
#[derive(Debug)]
pub struct MediaAcquirer {
    client: reqwest::Client,
    domain_root: PathBuf,
    max_bytes: u64,
    seen: HashSet<String>,
}

/// File extension from a content type, then the URL path, then `bin`.
pub fn extension_for(content_type: Option<&str>, url: &str) -> String {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|m| m.trim().to_lowercase());
    let from_mime = match mime.as_deref() {
        Some("image/jpeg") | Some("image/jpg") | Some("image/pjpeg") => Some("jpg"),
        Some("image/png") => Some("png"),
        Some("image/gif") => Some("gif"),
        Some("image/webp") => Some("webp"),
        Some("image/svg+xml") => Some("svg"),
        Some("image/avif") => Some("avif"),
        Some("image/bmp") => Some("bmp"),
        Some("video/mp4") => Some("mp4"),
        Some("video/webm") => Some("webm"),
        Some("video/quicktime") => Some("mov"),
        Some("video/ogg") => Some("ogv"),
        _ => None,
    };
    if let Some(ext) = from_mime {
        return ext.to_string();
    }

    let from_url = url::Url::parse(url).ok().and_then(|u| {
        let last = u.path_segments()?.next_back()?.to_string();
        let (_, ext) = last.rsplit_once('.')?;
        let ok = !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric());
        ok.then(|| ext.to_lowercase())
    });
    from_url.unwrap_or_else(|| "bin".to_string())
}

fn to_rel(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

impl MediaAcquirer {
    pub fn new(client: reqwest::Client, domain_root: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            client,
            domain_root: domain_root.into(),
            max_bytes,
            seen: HashSet::new(),
        }
    }

    /// Staging directory for an article, relative to the domain root.
    pub fn staging_rel(article_url: &str) -> PathBuf {
        Path::new(STAGING_DIR).join(short_hash(article_url))
    }

    /// Download every image and file video of `article` into its staging directory.
    #[instrument(level = "info", skip_all, fields(url = %article.url))]
    pub async fn acquire(&mut self, article: &Article) -> MediaManifest {
        let staging_rel = Self::staging_rel(&article.url);
        let mut manifest = MediaManifest::default();

        let refs = article
            .images
            .iter()
            .map(|i| (i.url.as_str(), MediaKind::Image))
            .chain(
                article
                    .videos
                    .iter()
                    .filter(|v| v.kind == VideoKind::File)
                    .map(|v| (v.url.as_str(), MediaKind::Video)),
            );

        for (source_url, kind) in refs {
            let key = url_hash(source_url);
            if self.seen.contains(&key) {
                debug!(%source_url, "Already downloaded this run; skipping");
                continue;
            }
            match self.download(source_url, kind, &staging_rel).await {
                Ok(asset) => {
                    self.seen.insert(key);
                    manifest.staging_dir = Some(to_rel(&staging_rel));
                    manifest.assets.push(asset);
                }
                Err(e) => warn!(%source_url, error = %e, "Media download failed; omitting asset"),
            }
        }

        if manifest.assets.is_empty() {
            // a failed download may have created the directory; only an empty one goes
            if let Err(e) = fs::remove_dir(self.domain_root.join(&staging_rel)).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!(error = %e, "Staging directory not removed");
                }
            }
        }

        info!(assets = manifest.assets.len(), "Acquired media");
        manifest
    }

    /// Drop a staging directory whose article was never committed.
    pub async fn discard(&self, staging_dir: &str) {
        match fs::remove_dir_all(self.domain_root.join(staging_dir)).await {
            Ok(()) => debug!(%staging_dir, "Discarded staged media"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(%staging_dir, error = %e, "Could not discard staged media"),
        }
    }

    async fn download(
        &self,
        source_url: &str,
        kind: MediaKind,
        staging_rel: &Path,
    ) -> Result<MediaAsset, AssetError> {
        let response = self
            .client
            .get(source_url)
            .send()
            .await
            .map_err(|source| AssetError::Http {
                url: source_url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Status {
                url: source_url.to_string(),
                status: status.as_u16(),
            });
        }
        if response.content_length().is_some_and(|len| len > self.max_bytes) {
            return Err(AssetError::TooLarge {
                url: source_url.to_string(),
                limit: self.max_bytes,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let ext = extension_for(content_type.as_deref(), source_url);
        let prefix = match kind {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        };
        let file_name = format!("{prefix}_{}.{ext}", short_hash(source_url));

        let dir = self.domain_root.join(staging_rel);
        fs::create_dir_all(&dir).await?;
        let path = dir.join(&file_name);

        let mut file = fs::File::create(&path).await?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(source) => {
                    drop(file);
                    let _ = fs::remove_file(&path).await;
                    return Err(AssetError::Http {
                        url: source_url.to_string(),
                        source,
                    });
                }
            };
            written += chunk.len() as u64;
            if written > self.max_bytes {
                drop(file);
                let _ = fs::remove_file(&path).await;
                return Err(AssetError::TooLarge {
                    url: source_url.to_string(),
                    limit: self.max_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!(%source_url, bytes = written, file = %file_name, "Staged media");
        Ok(MediaAsset {
            source_url: source_url.to_string(),
            local_relative_path: to_rel(&staging_rel.join(&file_name)),
            kind,
        })
    }
}
