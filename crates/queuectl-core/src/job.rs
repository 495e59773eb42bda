//! Job, config, and control-flag types shared by the store trait and the
//! lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position of a job in its lifecycle.
///
/// `state = Processing` implies `processing_started_at` is set; every other
/// state implies it is `None`. `Completed` and `Dead` are terminal except for
/// the explicit `dead -> pending` transition performed by [`retry_dead`].
///
/// [`retry_dead`]: crate::lifecycle::retry_dead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Dead,
}

impl JobState {
    /// The lowercase string this state is persisted as.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Dead => "dead",
        }
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobState::Pending),
            "processing" => Ok(JobState::Processing),
            "completed" => Ok(JobState::Completed),
            "dead" => Ok(JobState::Dead),
            other => Err(format!("unrecognized job state '{other}'")),
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A durable job row, as returned by scans (`list`, `list_dead`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub command: String,
    pub state: JobState,
    pub attempts: i64,
    pub max_retries: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub processing_started_at: Option<DateTime<Utc>>,
}

/// Fields needed to insert a new job row. `id` collisions are a
/// [`CoreError::DuplicateJob`](crate::error::CoreError::DuplicateJob).
#[derive(Debug, Clone)]
pub struct NewJob {
    pub id: String,
    pub command: String,
    pub max_retries: i64,
}

/// What `claim()` hands a worker: just enough to run the command and report
/// back the outcome.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    pub id: String,
    pub command: String,
    pub attempts: i64,
    pub max_retries: i64,
}

/// Per-state job counts, as printed by `queuectl status`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct JobCounts {
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub dead: i64,
}

/// A worker's most recent heartbeat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerHeartbeat {
    pub worker_id: Uuid,
    pub pid: i64,
    pub last_seen: DateTime<Utc>,
}
