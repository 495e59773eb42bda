//! The store trait: durable, concurrent-safe persistence of jobs, control
//! flags, worker heartbeats, and configuration.
//!
//! Every method here must be safe under arbitrary worker concurrency.
//! `claim_oldest_pending` in particular must be a single atomic
//! select-mutate-return; implementations must never perform it as a
//! select-then-update pair (lost updates / double claims are forbidden).
//! See `queuectl-sqlite` for the concrete implementation and
//! `queuectl-testing` for the in-memory test double.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::CoreError;
use crate::job::{ClaimedJob, Job, JobCounts, JobState, NewJob, WorkerHeartbeat};

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a new `pending` job row. Fails with
    /// [`CoreError::DuplicateJob`] if `job.id` already exists.
    async fn insert_pending_job(
        &self,
        job: NewJob,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError>;

    /// Atomically claim the single oldest eligible `pending` job (by
    /// `created_at`), transitioning it to `processing`. Returns `None` if no
    /// job is eligible. Exactly one caller wins this transition per row.
    async fn claim_oldest_pending(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<ClaimedJob>, CoreError>;

    /// Mark a job `completed`. Unconditional on prior state (idempotent).
    async fn mark_completed(&self, id: &str, now: DateTime<Utc>) -> Result<(), CoreError>;

    /// Transition a failed job back to `pending`, scheduled at
    /// `next_run_at`, recording `attempts` and `last_error`.
    async fn mark_pending_retry(
        &self,
        id: &str,
        attempts: i64,
        next_run_at: DateTime<Utc>,
        last_error: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError>;

    /// Transition a failed job to `dead` (retry budget exhausted).
    async fn mark_dead(
        &self,
        id: &str,
        attempts: i64,
        last_error: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError>;

    /// Conditionally reset a `dead` job to `pending` with `attempts = 0`.
    /// Returns whether a row was actually changed.
    async fn retry_dead(&self, id: &str, now: DateTime<Utc>) -> Result<bool, CoreError>;

    /// List jobs in `created_at` order, optionally filtered by state.
    async fn list_jobs(&self, state: Option<JobState>) -> Result<Vec<Job>, CoreError>;

    /// Per-state job counts.
    async fn job_counts(&self) -> Result<JobCounts, CoreError>;

    /// Dead jobs ordered by `updated_at` descending (most recently dead
    /// first).
    async fn list_dead(&self) -> Result<Vec<Job>, CoreError>;

    /// Requeue every `processing` job whose `processing_started_at` predates
    /// `now - stuck_after_secs`, back to `pending` with `last_error =
    /// "requeued_by_reaper"`. `attempts` is left untouched. Returns the
    /// number of rows requeued.
    async fn reap_stuck(
        &self,
        stuck_after_secs: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, CoreError>;

    /// Read a raw config value (already-normalized key).
    async fn get_config(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// Upsert a raw config value (already-normalized key).
    async fn set_config(&self, key: &str, value: &str) -> Result<(), CoreError>;

    /// The full config mapping.
    async fn get_all_config(&self) -> Result<BTreeMap<String, String>, CoreError>;

    /// Upsert a control flag (e.g. `stop_workers`).
    async fn set_control_flag(&self, key: &str, value: &str) -> Result<(), CoreError>;

    /// Read a control flag; `None` if unset.
    async fn get_control_flag(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// Delete a control flag.
    async fn clear_control_flag(&self, key: &str) -> Result<(), CoreError>;

    /// Upsert a worker's heartbeat row.
    async fn upsert_worker_heartbeat(
        &self,
        worker_id: Uuid,
        pid: i64,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError>;

    /// All known worker heartbeats. Never garbage-collected by the core.
    async fn list_worker_heartbeats(&self) -> Result<Vec<WorkerHeartbeat>, CoreError>;
}
