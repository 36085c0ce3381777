//! In-process job tracking store.
//!
//! Every submitted document gets an entry keyed by its id. The state machine
//! is `pending -> processing -> completed | failed`; terminal states accept
//! no further transitions and progress never decreases.

use crate::{IngestError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Processing state of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline checkpoints and the progress they stand for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    Validated,
    Extracted,
    Enriched,
    Stored,
}

impl Milestone {
    pub fn progress(self) -> u8 {
        match self {
            Milestone::Validated => 10,
            Milestone::Extracted => 60,
            Milestone::Enriched => 70,
            Milestone::Stored => 90,
        }
    }
}

/// Snapshot returned by [`JobTracker::status`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub document_id: Uuid,
    pub file_name: String,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct JobEntry {
    file_name: String,
    status: JobStatus,
    progress: u8,
    started: Option<Instant>,
    finished: Option<Instant>,
    error: Option<String>,
    updated_at: DateTime<Utc>,
}

impl JobEntry {
    fn estimated_remaining(&self) -> Option<u64> {
        match self.status {
            JobStatus::Completed | JobStatus::Failed => Some(0),
            JobStatus::Pending => None,
            JobStatus::Processing => {
                let started = self.started?;
                if self.progress == 0 {
                    return None;
                }
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let progress = u64::from(self.progress);
                Some(elapsed_ms * (100 - progress) / progress)
            }
        }
    }
}

/// Thread-safe job tracking store. Cloning shares the store.
#[derive(Debug, Clone, Default)]
pub struct JobTracker {
    jobs: Arc<DashMap<Uuid, JobEntry>>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new document as pending.
    pub fn register(&self, document_id: Uuid, file_name: impl Into<String>) {
        self.jobs.insert(
            document_id,
            JobEntry {
                file_name: file_name.into(),
                status: JobStatus::Pending,
                progress: 0,
                started: None,
                finished: None,
                error: None,
                updated_at: Utc::now(),
            },
        );
    }

    /// `pending -> processing`.
    pub fn start(&self, document_id: Uuid) -> Result<()> {
        self.transition(document_id, JobStatus::Processing, |entry| {
            if entry.status != JobStatus::Pending {
                return false;
            }
            entry.started = Some(Instant::now());
            true
        })
    }

    /// Record a checkpoint of a processing job. Progress never moves backwards.
    pub fn advance(&self, document_id: Uuid, milestone: Milestone) -> Result<()> {
        self.transition(document_id, JobStatus::Processing, |entry| {
            if entry.status != JobStatus::Processing {
                return false;
            }
            entry.progress = entry.progress.max(milestone.progress());
            true
        })
    }

    /// `processing -> completed`, progress 100.
    pub fn complete(&self, document_id: Uuid) -> Result<()> {
        self.transition(document_id, JobStatus::Completed, |entry| {
            if entry.status != JobStatus::Processing {
                return false;
            }
            entry.progress = 100;
            entry.finished = Some(Instant::now());
            true
        })
    }

    /// `pending | processing -> failed`. Progress stays where it was.
    pub fn fail(&self, document_id: Uuid, error: impl Into<String>) -> Result<()> {
        let error = error.into();
        self.transition(document_id, JobStatus::Failed, |entry| {
            if entry.status.is_terminal() {
                return false;
            }
            entry.error = Some(error);
            entry.finished = Some(Instant::now());
            true
        })
    }

    /// Current state of a document.
    pub fn status(&self, document_id: Uuid) -> Result<StatusReport> {
        let entry = self
            .jobs
            .get(&document_id)
            .ok_or_else(|| IngestError::UnknownDocument(document_id.to_string()))?;

        Ok(StatusReport {
            document_id,
            file_name: entry.file_name.clone(),
            status: entry.status,
            progress: entry.progress,
            estimated_time_remaining_ms: entry.estimated_remaining(),
            error: entry.error.clone(),
            updated_at: entry.updated_at,
        })
    }

    /// Drop terminal entries that finished at least `older_than` ago.
    ///
    /// Returns the number of entries removed.
    pub fn prune_finished(&self, older_than: Duration) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|_, entry| match entry.finished {
            Some(finished) if entry.status.is_terminal() => finished.elapsed() < older_than,
            _ => true,
        });
        before.saturating_sub(self.jobs.len())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn transition<F>(&self, document_id: Uuid, to: JobStatus, apply: F) -> Result<()>
    where
        F: FnOnce(&mut JobEntry) -> bool,
    {
        let mut entry = self
            .jobs
            .get_mut(&document_id)
            .ok_or_else(|| IngestError::UnknownDocument(document_id.to_string()))?;

        let from = entry.status;
        if !apply(entry.value_mut()) {
            return Err(IngestError::InvalidTransition {
                document_id: document_id.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        entry.status = to;
        entry.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracked() -> (JobTracker, Uuid) {
        let tracker = JobTracker::new();
        let id = Uuid::new_v4();
        tracker.register(id, "lease.pdf");
        (tracker, id)
    }

    #[test]
    fn test_happy_path() {
        let (tracker, id) = tracked();
        let report = tracker.status(id).unwrap();
        assert_eq!(report.status, JobStatus::Pending);
        assert_eq!(report.progress, 0);
        assert_eq!(report.estimated_time_remaining_ms, None);

        tracker.start(id).unwrap();
        tracker.advance(id, Milestone::Validated).unwrap();
        tracker.advance(id, Milestone::Extracted).unwrap();
        let report = tracker.status(id).unwrap();
        assert_eq!(report.status, JobStatus::Processing);
        assert_eq!(report.progress, 60);
        assert!(report.estimated_time_remaining_ms.is_some());

        tracker.complete(id).unwrap();
        let report = tracker.status(id).unwrap();
        assert_eq!(report.status, JobStatus::Completed);
        assert_eq!(report.progress, 100);
        assert_eq!(report.estimated_time_remaining_ms, Some(0));
        assert_eq!(report.file_name, "lease.pdf");
    }

    #[test]
    fn test_progress_is_monotonic() {
        let (tracker, id) = tracked();
        tracker.start(id).unwrap();
        tracker.advance(id, Milestone::Enriched).unwrap();
        tracker.advance(id, Milestone::Validated).unwrap();
        assert_eq!(tracker.status(id).unwrap().progress, 70);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let (tracker, id) = tracked();
        tracker.start(id).unwrap();
        tracker.complete(id).unwrap();

        assert!(matches!(tracker.start(id), Err(IngestError::InvalidTransition { .. })));
        assert!(matches!(
            tracker.advance(id, Milestone::Stored),
            Err(IngestError::InvalidTransition { .. })
        ));
        assert!(matches!(tracker.fail(id, "late"), Err(IngestError::InvalidTransition { .. })));
        assert_eq!(tracker.status(id).unwrap().status, JobStatus::Completed);
    }

    #[test]
    fn test_fail_keeps_progress_and_error() {
        let (tracker, id) = tracked();
        tracker.start(id).unwrap();
        tracker.advance(id, Milestone::Validated).unwrap();
        tracker.fail(id, "Storage error: bucket unreachable").unwrap();

        let report = tracker.status(id).unwrap();
        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(report.progress, 10);
        assert_eq!(report.error.as_deref(), Some("Storage error: bucket unreachable"));
        assert!(tracker.complete(id).is_err());
    }

    #[test]
    fn test_pending_can_fail_but_not_complete() {
        let (tracker, id) = tracked();
        assert!(tracker.complete(id).is_err());
        tracker.fail(id, "rejected").unwrap();
        assert_eq!(tracker.status(id).unwrap().status, JobStatus::Failed);
    }

    #[test]
    fn test_unknown_document() {
        let tracker = JobTracker::new();
        let err = tracker.status(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.kind(), "unknown_document");
        assert!(tracker.start(Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_prune_finished() {
        let tracker = JobTracker::new();
        let done = Uuid::new_v4();
        let running = Uuid::new_v4();
        tracker.register(done, "a.txt");
        tracker.register(running, "b.txt");
        tracker.start(done).unwrap();
        tracker.complete(done).unwrap();
        tracker.start(running).unwrap();

        assert_eq!(tracker.prune_finished(Duration::from_secs(3600)), 0);
        assert_eq!(tracker.prune_finished(Duration::ZERO), 1);
        assert_eq!(tracker.len(), 1);
        assert!(tracker.status(running).is_ok());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&JobStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }
}
