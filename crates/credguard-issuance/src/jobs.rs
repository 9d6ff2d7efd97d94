//! # Async Issuance Jobs
//!
//! Background issuance keyed by a generated `job-<uuid>` id. A job is
//! `Pending` until its task finishes, then holds either the issuance result
//! or the abort message. Finished jobs stay readable for the registry's
//! retention period and are pruned on the next `submit` or `get` after it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use credguard_vc::CredentialIssuanceResult;

use crate::orchestrator::{IssuanceOrchestrator, IssuanceRequest};

/// Where a background issuance job stands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Still running.
    Pending,
    /// The pipeline produced a result (which may itself report failure).
    Completed {
        /// The issuance outcome.
        result: Box<CredentialIssuanceResult>,
    },
    /// The pipeline aborted before producing a result.
    Failed {
        /// Why.
        message: String,
    },
}

impl JobStatus {
    /// Whether the job has finished.
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// How long a finished job stays readable by default.
pub const DEFAULT_JOB_RETENTION: Duration = Duration::from_secs(60 * 60);

#[derive(Debug)]
struct JobEntry {
    status: JobStatus,
    finished_at: Option<Instant>,
}

/// Thread-safe, cloneable registry of background issuance jobs.
///
/// The lock is `parking_lot` and never held across `.await`.
#[derive(Debug, Clone)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<String, JobEntry>>>,
    retention: Duration,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_JOB_RETENTION)
    }
}

impl JobRegistry {
    /// Empty registry with [`DEFAULT_JOB_RETENTION`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty registry keeping finished jobs for `retention`.
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    /// How long finished jobs stay readable.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Start `request` on a background task and return its job id.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, orchestrator: &IssuanceOrchestrator, request: IssuanceRequest) -> String {
        let job_id = format!("job-{}", Uuid::new_v4());
        {
            let mut jobs = self.jobs.write();
            prune_expired(&mut jobs, self.retention);
            jobs.insert(
                job_id.clone(),
                JobEntry {
                    status: JobStatus::Pending,
                    finished_at: None,
                },
            );
        }
        tracing::info!(job_id = %job_id, file_name = %request.file_name, "issuance job submitted");

        let handle = orchestrator.spawn_issue(request);
        let jobs = self.jobs.clone();
        let id = job_id.clone();
        tokio::spawn(async move {
            let status = match handle.await {
                Ok(Ok(result)) => JobStatus::Completed {
                    result: Box::new(result),
                },
                Ok(Err(err)) => JobStatus::Failed {
                    message: err.to_string(),
                },
                Err(join_err) => JobStatus::Failed {
                    message: format!("issuance task did not complete: {join_err}"),
                },
            };
            tracing::info!(job_id = %id, state = status_label(&status), "issuance job finished");
            jobs.write().insert(
                id,
                JobEntry {
                    status,
                    finished_at: Some(Instant::now()),
                },
            );
        });

        job_id
    }

    /// Current status of `job_id`; `None` when unknown or expired.
    pub fn get(&self, job_id: &str) -> Option<JobStatus> {
        let mut jobs = self.jobs.write();
        prune_expired(&mut jobs, self.retention);
        jobs.get(job_id).map(|entry| entry.status.clone())
    }

    /// Number of jobs held, including finished ones not yet pruned.
    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    /// Whether no jobs are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn prune_expired(jobs: &mut HashMap<String, JobEntry>, retention: Duration) {
    let before = jobs.len();
    jobs.retain(|_, entry| match entry.finished_at {
        Some(finished_at) => finished_at.elapsed() < retention,
        None => true,
    });
    let pruned = before - jobs.len();
    if pruned > 0 {
        tracing::debug!(pruned, "expired issuance jobs pruned");
    }
}

fn status_label(status: &JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "PENDING",
        JobStatus::Completed { .. } => "COMPLETED",
        JobStatus::Failed { .. } => "FAILED",
    }
}
