//! Command-line interface definitions for Awful News Archive.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every flag is optional and overrides the matching key of the YAML config.

use clap::Parser;

/// Command-line arguments for the Awful News Archive application.
///
/// # Examples
///
/// ```sh
/// # Archive up to 50 articles linked from a news front page
/// awful_news_archive https://news.example.com
///
/// # Custom archive root, 10 articles, skip media
/// awful_news_archive https://news.example.com -o ./archive -n 10 --no-media
///
/// # Rebuild exports for an existing domain without scraping
/// awful_news_archive https://news.example.com --export-only
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Listing page (or single article) to archive from
    pub url: String,

    /// Root directory of the archive
    #[arg(short = 'o', long, env = "ARCHIVE_ROOT")]
    pub archive_root: Option<String>,

    /// Optional path to config.yaml file
    #[arg(short, long, env = "ARCHIVE_CONFIG")]
    pub config: Option<String>,

    /// Maximum number of articles to process
    #[arg(short = 'n', long)]
    pub max_articles: Option<usize>,

    /// Attempts per article before giving up
    #[arg(long)]
    pub retries: Option<usize>,

    /// Navigation timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Do not download images or videos
    #[arg(long)]
    pub no_media: bool,

    /// Do not keep the raw page markup
    #[arg(long)]
    pub no_html: bool,

    /// Accept short titles
    #[arg(long)]
    pub permissive: bool,

    /// Store a full-page capture when the fetcher supports one
    #[arg(long)]
    pub screenshot: bool,

    /// Rebuild the aggregate exports from disk and exit
    #[arg(long)]
    pub export_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "awful_news_archive",
            "https://news.example.com",
            "--archive-root",
            "./archive",
        ]);

        assert_eq!(cli.url, "https://news.example.com");
        assert_eq!(cli.archive_root.as_deref(), Some("./archive"));
        assert!(!cli.export_only);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "awful_news_archive",
            "https://news.example.com",
            "-o",
            "/tmp/archive",
            "-n",
            "5",
        ]);

        assert_eq!(cli.archive_root.as_deref(), Some("/tmp/archive"));
        assert_eq!(cli.max_articles, Some(5));
    }

    #[test]
    fn test_cli_switches() {
        let cli = Cli::parse_from([
            "awful_news_archive",
            "https://news.example.com",
            "--no-media",
            "--no-html",
            "--permissive",
            "--export-only",
        ]);
        assert!(cli.no_media && cli.no_html && cli.permissive && cli.export_only);
    }
}
