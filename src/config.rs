//! Runtime configuration for an archive run.
//!
//! Values come from an optional YAML file and are then overridden by any
//! command-line flags that were given explicitly.
//!
//! ```yaml
//! archive_root: ./archive
//! max_articles: 25
//! max_retries: 3
//! retry_delay_ms: 2000
//! download_media: true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

use crate::cli::Cli;
use crate::error::ConfigError;

/// Settings shared by every pipeline stage.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Root directory; each domain gets its own subfolder.
    pub archive_root: PathBuf,
    /// Upper bound on candidates processed per run.
    pub max_articles: usize,
    /// Attempts per candidate before it is marked failed.
    pub max_retries: usize,
    /// Fixed delay between attempts.
    pub retry_delay_ms: u64,
    pub navigation_timeout_secs: u64,
    /// Body text shorter than this is an invalid article.
    pub min_content_length: usize,
    /// Paragraphs shorter than this are ignored by body extraction.
    pub min_paragraph_length: usize,
    /// Per-asset download ceiling.
    pub max_media_bytes: u64,
    pub download_media: bool,
    /// Keep a copy of the raw page markup as `article.html`.
    pub save_html: bool,
    /// Write the `article.md` rendering.
    pub save_markdown: bool,
    /// Ask the fetcher for a full-page raster capture.
    pub capture_screenshot: bool,
    /// Accept any non-empty title up to 300 chars instead of requiring > 10.
    pub permissive_titles: bool,
    /// Accepted for compatibility; candidates are always processed one at a time.
    pub concurrency: usize,
    pub user_agent: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            archive_root: PathBuf::from("./archive"),
            max_articles: 50,
            max_retries: 3,
            retry_delay_ms: 2000,
            navigation_timeout_secs: 30,
            min_content_length: 200,
            min_paragraph_length: 40,
            max_media_bytes: 50 * 1024 * 1024,
            download_media: true,
            save_html: true,
            save_markdown: true,
            capture_screenshot: false,
            permissive_titles: false,
            concurrency: 1,
            user_agent: format!(
                "Mozilla/5.0 (compatible; awful_news_archive/{})",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }
}

impl ArchiveConfig {
    /// Load a YAML config file. Missing keys fall back to defaults.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let config: ArchiveConfig =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
                path: display,
                source,
            })?;
        info!("Loaded configuration");
        Ok(config)
    }

    /// Build the effective configuration: file (if any), then CLI overrides.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::load(Path::new(path))?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(root) = &cli.archive_root {
            self.archive_root = PathBuf::from(root);
        }
        if let Some(n) = cli.max_articles {
            self.max_articles = n;
        }
        if let Some(n) = cli.retries {
            self.max_retries = n;
        }
        if let Some(secs) = cli.timeout {
            self.navigation_timeout_secs = secs;
        }
        if cli.no_media {
            self.download_media = false;
        }
        if cli.no_html {
            self.save_html = false;
        }
        if cli.permissive {
            self.permissive_titles = true;
        }
        if cli.screenshot {
            self.capture_screenshot = true;
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ArchiveConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.concurrency, 1);
        assert!(config.download_media);
        assert_eq!(config.retry_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_load_partial_yaml_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_articles: 7\nsave_html: false").unwrap();
        let config = ArchiveConfig::load(file.path()).unwrap();
        assert_eq!(config.max_articles, 7);
        assert!(!config.save_html);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_load_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_articles: [not a number").unwrap();
        assert!(matches!(
            ArchiveConfig::load(file.path()),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            ArchiveConfig::load(Path::new("/definitely/not/here.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_articles: 7\narchive_root: /tmp/from-file").unwrap();
        let path = file.path().to_string_lossy().to_string();
        let cli = Cli::parse_from([
            "awful_news_archive",
            "https://example.com",
            "--config",
            &path,
            "-n",
            "3",
            "--no-media",
        ]);
        let config = ArchiveConfig::resolve(&cli).unwrap();
        assert_eq!(config.max_articles, 3);
        assert_eq!(config.archive_root, PathBuf::from("/tmp/from-file"));
        assert!(!config.download_media);
    }
}
