//! Typed errors for every stage of the archival pipeline.
//!
//! Per-candidate errors ([`FetchError`], [`ExtractError`]) are retryable and
//! never abort a run. Per-asset errors ([`AssetError`]) only drop that asset.
//! [`PipelineError::FetcherInit`] is the one failure that ends a whole run.

use thiserror::Error;

/// Failures while rendering a page through the page fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, TLS, connection reset).
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Navigation did not finish inside the configured timeout.
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// The URL could not be parsed.
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

/// Extraction produced an article that fails the validity gate.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("content too short: {len} chars (minimum {min})")]
    TooShort { len: usize, min: usize },
}

/// A single media download failed. Never fatal.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("HTTP error downloading {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for asset {url}")]
    Status { url: String, status: u16 },

    #[error("asset {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: u64 },

    #[error("I/O error staging asset: {0}")]
    Io(#[from] std::io::Error),
}

/// Archive store failures (record-level, so a commit or export fails).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Configuration file could not be read or parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The page fetcher could not be constructed; the run cannot start.
    #[error("page fetcher failed to initialize: {0}")]
    FetcherInit(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Whether the per-candidate retry budget applies to this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Fetch(_) | PipelineError::Extract(_))
    }
}
