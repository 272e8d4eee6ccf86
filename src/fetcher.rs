//! Page fetching capability.
//!
//! The pipeline only needs rendered markup for a URL. [`PageFetcher`] is the
//! seam: [`HttpFetcher`] is the shipped implementation, tests plug in a fake.
//! A headless-browser backend would implement the same trait and also
//! provide [`PageFetcher::capture`].

use std::future::Future;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{FetchError, PipelineError};

/// A page rendered for one fetch attempt.
///
/// Owned by a single attempt and dropped on every exit path, so nothing
/// about a previous page leaks into the next one.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub requested_url: String,
    /// URL after redirects.
    pub final_url: String,
    pub html: String,
    pub status: u16,
}

/// Something that can turn a URL into rendered markup.
pub trait PageFetcher {
    /// Navigate to `url` and return the page once its content is loaded.
    fn render(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<RenderedPage, FetchError>>;

    /// Full-page raster capture of a rendered page, when supported.
    fn capture(&self, _page: &RenderedPage) -> impl Future<Output = Option<Vec<u8>>> {
        async { None }
    }
}

/// Plain HTTP fetcher. Returns server-rendered markup; no script execution.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build the HTTP client. Failing here is fatal for the whole run.
    pub fn new(user_agent: &str) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| PipelineError::FetcherInit(e.to_string()))?;
        Ok(Self { client })
    }

    /// The underlying client, shared with the media downloader.
    pub fn client(&self) -> reqwest::Client {
        self.client.clone()
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage, FetchError> {
        if url::Url::parse(url).is_err() {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
            });
        }

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Non-success status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let html = response.text().await.map_err(|e| classify(url, e))?;
        debug!(bytes = html.len(), %final_url, "Rendered page");

        Ok(RenderedPage {
            requested_url: url.to_string(),
            final_url,
            html,
            status: status.as_u16(),
        })
    }
}

fn classify(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: e,
        }
    }
}
