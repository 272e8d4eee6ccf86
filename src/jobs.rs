//! Job status tracking driven by pipeline events.
//!
//! The orchestrator publishes [`PipelineEvent`]s on an unbounded channel and
//! knows nothing about who listens. [`JobStore`] folds those events into one
//! [`JobRecord`] per job so a caller can poll status, progress and the log.
//!
//! # Progress
//!
//! - 0 while initializing
//! - 10 once discovery reports its candidate count
//! - `10 + 80 * done / total` as candidates finish
//! - 100 on completion

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, instrument, warn};

use crate::models::{ArticleSummary, RunReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Initializing,
    Discovering,
    Scraping,
    Saving,
    Completed,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Initializing => "initializing",
            JobStatus::Discovering => "discovering",
            JobStatus::Scraping => "scraping",
            JobStatus::Saving => "saving",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// How a single candidate ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "outcome")]
pub enum CandidateOutcome {
    Committed { folder: String },
    Duplicate,
    Failed { error: String },
}

/// Observations published by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    StatusChanged(JobStatus),
    Discovered { total: usize },
    CandidateStarted { index: usize, total: usize, url: String },
    CandidateFinished { url: String, outcome: CandidateOutcome },
    Log(String),
    Completed(RunReport),
    Failed { message: String, processed: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub status: JobStatus,
    /// 0 to 100.
    pub progress: u8,
    pub log: Vec<(DateTime<Utc>, String)>,
    /// Most recently committed article.
    pub summary: Option<ArticleSummary>,
    pub error: Option<String>,
    pub report: Option<RunReport>,
    #[serde(skip)]
    total: usize,
    #[serde(skip)]
    done: usize,
}

impl Default for JobRecord {
    fn default() -> Self {
        Self {
            status: JobStatus::Initializing,
            progress: 0,
            log: Vec::new(),
            summary: None,
            error: None,
            report: None,
            total: 0,
            done: 0,
        }
    }
}

impl JobRecord {
    fn push_log(&mut self, message: impl Into<String>) {
        self.log.push((Utc::now(), message.into()));
    }

    fn scraping_progress(&self) -> u8 {
        if self.total == 0 {
            return 10;
        }
        let done = self.done.min(self.total);
        (10 + 80 * done / self.total) as u8
    }

    fn apply(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::StatusChanged(status) => {
                self.status = status;
                self.push_log(format!("status: {status}"));
            }
            PipelineEvent::Discovered { total } => {
                self.total = total;
                self.done = 0;
                self.progress = 10;
                self.push_log(format!("discovered {total} candidate(s)"));
            }
            PipelineEvent::CandidateStarted { index, total, url } => {
                self.push_log(format!("[{index}/{total}] {url}"));
            }
            PipelineEvent::CandidateFinished { url, outcome } => {
                self.done += 1;
                self.progress = self.scraping_progress();
                let line = match outcome {
                    CandidateOutcome::Committed { folder } => format!("saved {url} -> {folder}"),
                    CandidateOutcome::Duplicate => format!("duplicate {url}"),
                    CandidateOutcome::Failed { error } => format!("failed {url}: {error}"),
                };
                self.push_log(line);
            }
            PipelineEvent::Log(message) => self.push_log(message),
            PipelineEvent::Completed(report) => {
                self.status = JobStatus::Completed;
                self.progress = 100;
                self.summary = report.last_article.clone();
                self.push_log(format!(
                    "completed: {} scraped, {} duplicate(s), {} failed",
                    report.scraped, report.duplicates, report.failed
                ));
                self.report = Some(report);
            }
            PipelineEvent::Failed { message, processed } => {
                self.status = JobStatus::Failed;
                self.push_log(format!("failed after {processed} candidate(s): {message}"));
                self.error = Some(message);
            }
        }
    }
}

/// Job records keyed by id.
#[derive(Debug, Default)]
pub struct JobStore {
    next_id: u64,
    jobs: HashMap<JobId, JobRecord>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self) -> JobId {
        self.next_id += 1;
        let id = JobId(self.next_id);
        self.jobs.insert(id, JobRecord::default());
        id
    }

    /// Fold one event into the job's record. Unknown ids are ignored.
    pub fn apply(&mut self, id: JobId, event: PipelineEvent) {
        match self.jobs.get_mut(&id) {
            Some(record) => record.apply(event),
            None => warn!(%id, "Event for unknown job dropped"),
        }
    }

    pub fn get(&self, id: JobId) -> Option<&JobRecord> {
        self.jobs.get(&id)
    }

    /// Drain `events` into job `id` until every sender is dropped.
    #[instrument(level = "debug", skip_all, fields(%id))]
    pub async fn follow(&mut self, id: JobId, mut events: UnboundedReceiver<PipelineEvent>) {
        while let Some(event) = events.recv().await {
            debug!(?event, "Job event");
            self.apply(id, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_progress_sequence() {
        let mut store = JobStore::new();
        let id = store.create();
        assert_eq!(store.get(id).unwrap().progress, 0);
        assert_eq!(store.get(id).unwrap().status, JobStatus::Initializing);

        store.apply(id, PipelineEvent::Discovered { total: 4 });
        assert_eq!(store.get(id).unwrap().progress, 10);

        for (i, expected) in [(1, 30), (2, 50), (3, 70), (4, 90)] {
            store.apply(
                id,
                PipelineEvent::CandidateFinished {
                    url: format!("https://example.com/{i}"),
                    outcome: CandidateOutcome::Duplicate,
                },
            );
            assert_eq!(store.get(id).unwrap().progress, expected);
        }

        store.apply(id, PipelineEvent::Completed(RunReport::default()));
        let record = store.get(id).unwrap();
        assert_eq!(record.progress, 100);
        assert_eq!(record.status, JobStatus::Completed);
        assert!(record.report.is_some());
    }

    #[test]
    fn test_failed_records_message() {
        let mut store = JobStore::new();
        let id = store.create();
        store.apply(
            id,
            PipelineEvent::Failed {
                message: "no tls backend".to_string(),
                processed: 2,
            },
        );
        let record = store.get(id).unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("no tls backend"));
        assert!(record.log.last().unwrap().1.contains("after 2 candidate(s)"));
    }

    #[test]
    fn test_ids_are_distinct_and_unknown_ignored() {
        let mut store = JobStore::new();
        let a = store.create();
        let b = store.create();
        assert_ne!(a, b);
        store.apply(JobId(99), PipelineEvent::Log("lost".to_string()));
        assert!(store.get(JobId(99)).is_none());
        assert!(store.get(a).unwrap().log.is_empty());
    }

    #[tokio::test]
    async fn test_follow_drains_channel() {
        let mut store = JobStore::new();
        let id = store.create();
        let (tx, rx) = unbounded_channel();
        tx.send(PipelineEvent::StatusChanged(JobStatus::Discovering)).unwrap();
        tx.send(PipelineEvent::Log("hello".to_string())).unwrap();
        drop(tx);
        store.follow(id, rx).await;
        let record = store.get(id).unwrap();
        assert_eq!(record.status, JobStatus::Discovering);
        assert_eq!(record.log.len(), 2);
    }
}
