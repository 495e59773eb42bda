//! The job lifecycle: `enqueue`, `claim`, `complete`, `fail`, `retry_dead`,
//! and the read-only scans. This is the component the rest of the system
//! revolves around — the state machine described in the module docs below.
//!
//! ```text
//!             enqueue
//!     (∅) ─────────────▶ pending
//!                         │
//!              claim      │     (sets processing_started_at,
//!                         ▼      does NOT yet bump attempts)
//!                     processing
//!               ┌─────────┼─────────┐
//!    success    │         │         │  failure (exit≠0, timeout, exception)
//!               ▼         │         ▼
//!           completed     │    (attempts+1)
//!                         │         │
//!                         │         ├── attempts ≤ max_retries ──▶ pending
//!                         │         │      (next_run_at = now + backoff_base^(attempts-1))
//!                         │         └── attempts > max_retries ──▶ dead
//!                         │
//!             reaper: processing_started_at < now − stuck_after
//!                         └──────────────▶ pending
//!                                  (last_error = "requeued_by_reaper";
//!                                   attempts unchanged)
//!
//!          dlq-retry (operator, only from dead)
//!              dead ─────────────▶ pending (attempts reset to 0)
//! ```

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::clock::Clock;
use crate::config::{self, keys};
use crate::error::CoreError;
use crate::job::{ClaimedJob, Job, JobCounts, JobState, NewJob};
use crate::store::Store;

/// Insert a new job. `max_retries` falls back to the `max_retries` config
/// key when not given. Fails with [`CoreError::DuplicateJob`] on an id
/// collision; there are no retries across `enqueue` calls.
pub async fn enqueue(
    store: &dyn Store,
    clock: &dyn Clock,
    id: impl Into<String>,
    command: impl Into<String>,
    max_retries: Option<i64>,
) -> Result<(), CoreError> {
    let now = clock.now();
    let max_retries = match max_retries {
        Some(v) => v,
        None => config::get_i64(store, keys::MAX_RETRIES, config::DEFAULT_MAX_RETRIES).await?,
    };
    store
        .insert_pending_job(
            NewJob {
                id: id.into(),
                command: command.into(),
                max_retries,
            },
            now,
        )
        .await
}

/// Atomically claim the oldest eligible job, if any.
pub async fn claim(store: &dyn Store, clock: &dyn Clock) -> Result<Option<ClaimedJob>, CoreError> {
    store.claim_oldest_pending(clock.now()).await
}

/// Mark a claimed job completed. The caller must only invoke this from the
/// worker that actually claimed `id` (the core does not verify this — see
/// the design notes on claim tokens).
pub async fn complete(store: &dyn Store, clock: &dyn Clock, id: &str) -> Result<(), CoreError> {
    store.mark_completed(id, clock.now()).await
}

/// Record a failed attempt. `attempts_after` is the *new* attempts count
/// (already incremented by the caller). Transitions to `pending` with an
/// exponential-backoff `next_run_at` if the retry budget isn't exhausted,
/// otherwise to `dead`.
pub async fn fail(
    store: &dyn Store,
    clock: &dyn Clock,
    id: &str,
    attempts_after: i64,
    max_retries: i64,
    error_msg: &str,
) -> Result<(), CoreError> {
    let now = clock.now();
    if attempts_after <= max_retries {
        let backoff_base =
            config::get_i64(store, keys::BACKOFF_BASE, config::DEFAULT_BACKOFF_BASE).await?;
        let delay = backoff_delay_seconds(backoff_base, attempts_after);
        let next_run_at = now + ChronoDuration::seconds(delay);
        store
            .mark_pending_retry(id, attempts_after, next_run_at, error_msg, now)
            .await
    } else {
        store.mark_dead(id, attempts_after, error_msg, now).await
    }
}

/// Exponential backoff: `base ^ (attempts_after - 1)` seconds, uncapped and
/// unjittered per spec. `attempts_after` is always >= 1 when a job has just
/// failed, so the exponent is never negative.
pub fn backoff_delay_seconds(base: i64, attempts_after: i64) -> i64 {
    let exponent = (attempts_after - 1).max(0) as u32;
    let base = base.max(0) as u64;
    match base.checked_pow(exponent) {
        Some(v) => v.min(i64::MAX as u64) as i64,
        None => i64::MAX,
    }
}

/// Reset a `dead` job to `pending` with `attempts = 0`. Returns whether any
/// row was actually in `dead` state.
pub async fn retry_dead(store: &dyn Store, clock: &dyn Clock, id: &str) -> Result<bool, CoreError> {
    store.retry_dead(id, clock.now()).await
}

/// List jobs in `created_at` order, optionally filtered by state.
pub async fn list(store: &dyn Store, state: Option<JobState>) -> Result<Vec<Job>, CoreError> {
    store.list_jobs(state).await
}

/// Per-state job counts.
pub async fn counts(store: &dyn Store) -> Result<JobCounts, CoreError> {
    store.job_counts().await
}

/// Dead jobs, most recently dead first.
pub async fn list_dead(store: &dyn Store) -> Result<Vec<Job>, CoreError> {
    store.list_dead().await
}

/// The point at which a `processing` job (started at `processing_started_at`)
/// is considered abandoned, given `stuck_after` seconds.
pub fn stuck_cutoff(now: DateTime<Utc>, stuck_after_secs: i64) -> DateTime<Utc> {
    now - ChronoDuration::seconds(stuck_after_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially_from_base() {
        assert_eq!(backoff_delay_seconds(2, 1), 1);
        assert_eq!(backoff_delay_seconds(2, 2), 2);
        assert_eq!(backoff_delay_seconds(2, 3), 4);
        assert_eq!(backoff_delay_seconds(2, 4), 8);
    }

    #[test]
    fn backoff_never_panics_on_large_attempts() {
        let delay = backoff_delay_seconds(2, 1_000);
        assert_eq!(delay, i64::MAX);
    }

    #[test]
    fn backoff_with_base_one_is_flat() {
        for attempts in 1..10 {
            assert_eq!(backoff_delay_seconds(1, attempts), 1);
        }
    }
}
