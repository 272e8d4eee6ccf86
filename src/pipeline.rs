//! The archival run: discover, then extract, dedup, acquire and commit each
//! candidate in turn, then rebuild the exports.
//!
//! # Flow
//!
//! ```text
//! seed ─► render ─► discover ─► for each candidate:
//!                                 render + extract (retried)
//!                                 ─► duplicate? skip
//!                                 ─► acquire media ─► commit
//!                             ─► export_all
//! ```
//!
//! Candidates are processed strictly one after another. A candidate that
//! fails never stops the run; only a fetcher that cannot start, an unusable
//! seed, or a failing archive root end it early. Progress is published as
//! [`PipelineEvent`]s; the orchestrator holds no durable state of its own.

use scraper::Html;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::archive::ArchiveStore;
use crate::config::ArchiveConfig;
use crate::downloader::MediaAcquirer;
use crate::error::{FetchError, PipelineError};
use crate::fetcher::PageFetcher;
use crate::jobs::{CandidateOutcome, JobStatus, PipelineEvent};
use crate::models::{Article, CandidateUrl, MediaManifest, RunReport};
use crate::outputs::json::DomainSummary;
use crate::retry::RetryPolicy;
use crate::scrapers::article::{ExtractOptions, extract};
use crate::scrapers::links::{discover, is_excluded, looks_like_article};
use crate::utils::{registrable_domain, truncate_for_log};

/// Parse the seed URL and derive the archive domain from it.
pub fn seed_domain(seed: &str) -> Result<(Url, String), FetchError> {
    let invalid = || FetchError::InvalidUrl {
        url: seed.to_string(),
    };
    let url = Url::parse(seed).map_err(|_| invalid())?;
    let host = url.host_str().ok_or_else(invalid)?;
    let domain = registrable_domain(host);
    Ok((url, domain))
}

/// Rebuild the aggregate exports of the seed's domain from what is on disk.
#[instrument(level = "info", skip_all, fields(%seed))]
pub async fn rebuild_exports(config: &ArchiveConfig, seed: &str) -> Result<DomainSummary, PipelineError> {
    let (_, domain) = seed_domain(seed)?;
    let mut store = ArchiveStore::new(&config.archive_root, &domain, config.save_markdown);
    store.initialize().await?;
    let summary = store.export_all().await?;
    info!(entries = store.entries().len(), "Rebuilt exports");
    Ok(summary)
}

/// Runs the archival pipeline over one seed URL.
pub struct Orchestrator<F> {
    fetcher: F,
    media_client: reqwest::Client,
    config: ArchiveConfig,
    events: UnboundedSender<PipelineEvent>,
}

impl<F: PageFetcher> Orchestrator<F> {
    pub fn new(
        fetcher: F,
        media_client: reqwest::Client,
        config: ArchiveConfig,
        events: UnboundedSender<PipelineEvent>,
    ) -> Self {
        Self {
            fetcher,
            media_client,
            config,
            events,
        }
    }

    fn emit(&self, event: PipelineEvent) {
        // a dropped receiver only means nobody is watching
        let _ = self.events.send(event);
    }

    fn fail(&self, e: PipelineError, processed: usize) -> PipelineError {
        error!(error = %e, processed, "Run failed");
        self.emit(PipelineEvent::Failed {
            message: e.to_string(),
            processed,
        });
        e
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.max_retries, self.config.retry_delay())
    }

    /// Archive everything reachable from `seed`.
    #[instrument(level = "info", skip_all, fields(%seed))]
    pub async fn run(&self, seed: &str) -> Result<RunReport, PipelineError> {
        let t0 = Instant::now();
        self.emit(PipelineEvent::StatusChanged(JobStatus::Initializing));

        let (seed_url, domain) = seed_domain(seed).map_err(|e| self.fail(e.into(), 0))?;
        let mut store = ArchiveStore::new(&self.config.archive_root, &domain, self.config.save_markdown);
        store.initialize().await.map_err(|e| self.fail(e.into(), 0))?;

        if self.config.concurrency > 1 {
            warn!(
                concurrency = self.config.concurrency,
                "Concurrent candidates are not supported; processing sequentially"
            );
        }

        self.emit(PipelineEvent::StatusChanged(JobStatus::Discovering));
        let candidates = self
            .discover_candidates(&seed_url, &domain)
            .await
            .map_err(|e| self.fail(e, 0))?;
        let total = candidates.len();
        self.emit(PipelineEvent::Discovered { total });

        let mut report = RunReport {
            discovered: total,
            ..RunReport::default()
        };

        self.emit(PipelineEvent::StatusChanged(JobStatus::Scraping));
        let mut acquirer = MediaAcquirer::new(
            self.media_client.clone(),
            store.domain_root(),
            self.config.max_media_bytes,
        );

        for (i, candidate) in candidates.iter().enumerate() {
            self.emit(PipelineEvent::CandidateStarted {
                index: i + 1,
                total,
                url: candidate.url.clone(),
            });
            let outcome = self
                .process_candidate(candidate, &mut store, &mut acquirer, &mut report)
                .await;
            self.emit(PipelineEvent::CandidateFinished {
                url: candidate.url.clone(),
                outcome,
            });
        }

        self.emit(PipelineEvent::StatusChanged(JobStatus::Saving));
        store
            .export_all()
            .await
            .map_err(|e| self.fail(e.into(), total))?;

        info!(
            discovered = report.discovered,
            scraped = report.scraped,
            duplicates = report.duplicates,
            failed = report.failed,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Run finished"
        );
        self.emit(PipelineEvent::Completed(report.clone()));
        Ok(report)
    }

    /// Render the seed and collect candidates, capped at `max_articles`.
    ///
    /// When the seed page links to no articles but is itself article-shaped,
    /// it becomes the only candidate.
    async fn discover_candidates(&self, seed: &Url, domain: &str) -> Result<Vec<CandidateUrl>, PipelineError> {
        let timeout = self.config.navigation_timeout();
        let page = self
            .retry_policy()
            .run(|_| async move { Ok(self.fetcher.render(seed.as_str(), timeout).await?) })
            .await?;

        let base = Url::parse(&page.final_url).unwrap_or_else(|_| seed.clone());
        let mut candidates = {
            let doc = Html::parse_document(&page.html);
            discover(&doc, &base)
        };

        if candidates.is_empty() && looks_like_article(seed) && !is_excluded(seed) {
            info!("No links found; archiving the seed page itself");
            self.emit(PipelineEvent::Log(format!("using seed {seed} as the only candidate")));
            candidates.push(CandidateUrl {
                url: seed.to_string(),
                domain: domain.to_string(),
            });
        }

        if candidates.len() > self.config.max_articles {
            info!(
                found = candidates.len(),
                max = self.config.max_articles,
                "Capping candidates"
            );
            candidates.truncate(self.config.max_articles);
        }
        Ok(candidates)
    }

    /// Render and extract one candidate, retried as a unit. The rendered page
    /// lives only inside a single attempt.
    async fn fetch_article(&self, url: &str) -> Result<(Article, Option<Vec<u8>>), PipelineError> {
        let options = ExtractOptions::from(&self.config);
        let timeout = self.config.navigation_timeout();
        let capture = self.config.capture_screenshot;

        self.retry_policy()
            .run(|attempt| {
                let options = &options;
                async move {
                    let page = self.fetcher.render(url, timeout).await?;
                    debug!(
                        attempt,
                        status = page.status,
                        requested = %page.requested_url,
                        final_url = %page.final_url,
                        "Rendered candidate"
                    );
                    let article = extract(&page.html, url, options)?;
                    let screenshot = if capture {
                        self.fetcher.capture(&page).await
                    } else {
                        None
                    };
                    if attempt > 1 {
                        info!(attempt, "Recovered after retry");
                    }
                    Ok((article, screenshot))
                }
            })
            .await
    }

    #[instrument(level = "info", skip_all, fields(url = %candidate.url, domain = %candidate.domain))]
    async fn process_candidate(
        &self,
        candidate: &CandidateUrl,
        store: &mut ArchiveStore,
        acquirer: &mut MediaAcquirer,
        report: &mut RunReport,
    ) -> CandidateOutcome {
        if store.is_known_url(&candidate.url) {
            report.duplicates += 1;
            info!("Already archived; not fetching");
            return CandidateOutcome::Duplicate;
        }

        let (article, screenshot) = match self.fetch_article(&candidate.url).await {
            Ok(found) => found,
            Err(e) => {
                report.failed += 1;
                warn!(error = %e, "Candidate failed");
                return CandidateOutcome::Failed { error: e.to_string() };
            }
        };

        if store.is_duplicate(&article) {
            report.duplicates += 1;
            info!(title = %truncate_for_log(&article.title, 80), "Duplicate; skipping");
            return CandidateOutcome::Duplicate;
        }

        let manifest = if self.config.download_media {
            acquirer.acquire(&article).await
        } else {
            MediaManifest::default()
        };
        let staging = manifest.staging_dir.clone();

        match store.commit(&article, manifest, screenshot).await {
            Ok(entry) => {
                report.scraped += 1;
                report.last_article = Some(article.summary());
                CandidateOutcome::Committed {
                    folder: entry.folder_path,
                }
            }
            Err(e) => {
                report.failed += 1;
                error!(error = %e, "Commit failed");
                if let Some(staging) = staging {
                    acquirer.discard(&staging).await;
                }
                CandidateOutcome::Failed { error: e.to_string() }
            }
        }
    }
}
