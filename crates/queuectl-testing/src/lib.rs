//! Test doubles for `queuectl-core`: an in-memory [`Store`] and a
//! deterministic [`StepClock`], so lifecycle and reaper behavior can be
//! exercised without a real SQLite file or a race against the wall clock.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use queuectl_core::{ClaimedJob, CoreError, Job, JobCounts, JobState, NewJob, Store, WorkerHeartbeat};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Record {
    job: Job,
    seq: u64,
}

#[derive(Default)]
struct State {
    jobs: BTreeMap<String, Record>,
    config: BTreeMap<String, String>,
    control: BTreeMap<String, String>,
    workers: BTreeMap<Uuid, WorkerHeartbeat>,
    next_seq: u64,
}

/// An in-memory [`Store`], guarded by a single mutex. Claim ordering mirrors
/// the SQLite implementation: oldest `created_at` first, ties broken by
/// insertion order so tests with a [`StepClock`] frozen on one instant still
/// get a stable, predictable claim sequence.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_pending_job(&self, job: NewJob, now: DateTime<Utc>) -> Result<(), CoreError> {
        let mut state = self.lock();
        if state.jobs.contains_key(&job.id) {
            return Err(CoreError::DuplicateJob(job.id));
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.jobs.insert(
            job.id.clone(),
            Record {
                job: Job {
                    id: job.id,
                    command: job.command,
                    state: JobState::Pending,
                    attempts: 0,
                    max_retries: job.max_retries,
                    created_at: now,
                    updated_at: now,
                    next_run_at: None,
                    last_error: None,
                    processing_started_at: None,
                },
                seq,
            },
        );
        Ok(())
    }

    async fn claim_oldest_pending(&self, now: DateTime<Utc>) -> Result<Option<ClaimedJob>, CoreError> {
        let mut state = self.lock();
        let winner = state
            .jobs
            .values()
            .filter(|r| {
                r.job.state == JobState::Pending
                    && r.job.next_run_at.map(|t| t <= now).unwrap_or(true)
            })
            .min_by_key(|r| (r.job.created_at, r.seq))
            .map(|r| r.job.id.clone());

        let Some(id) = winner else {
            return Ok(None);
        };

        let record = state.jobs.get_mut(&id).expect("winner id must exist");
        record.job.state = JobState::Processing;
        record.job.processing_started_at = Some(now);
        record.job.updated_at = now;

        Ok(Some(ClaimedJob {
            id: record.job.id.clone(),
            command: record.job.command.clone(),
            attempts: record.job.attempts,
            max_retries: record.job.max_retries,
        }))
    }

    async fn mark_completed(&self, id: &str, now: DateTime<Utc>) -> Result<(), CoreError> {
        let mut state = self.lock();
        if let Some(record) = state.jobs.get_mut(id) {
            record.job.state = JobState::Completed;
            record.job.last_error = None;
            record.job.processing_started_at = None;
            record.job.updated_at = now;
        }
        Ok(())
    }

    async fn mark_pending_retry(
        &self,
        id: &str,
        attempts: i64,
        next_run_at: DateTime<Utc>,
        last_error: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let mut state = self.lock();
        if let Some(record) = state.jobs.get_mut(id) {
            record.job.state = JobState::Pending;
            record.job.attempts = attempts;
            record.job.next_run_at = Some(next_run_at);
            record.job.last_error = Some(last_error.to_string());
            record.job.processing_started_at = None;
            record.job.updated_at = now;
        }
        Ok(())
    }

    async fn mark_dead(
        &self,
        id: &str,
        attempts: i64,
        last_error: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let mut state = self.lock();
        if let Some(record) = state.jobs.get_mut(id) {
            record.job.state = JobState::Dead;
            record.job.attempts = attempts;
            record.job.next_run_at = None;
            record.job.last_error = Some(last_error.to_string());
            record.job.processing_started_at = None;
            record.job.updated_at = now;
        }
        Ok(())
    }

    async fn retry_dead(&self, id: &str, now: DateTime<Utc>) -> Result<bool, CoreError> {
        let mut state = self.lock();
        match state.jobs.get_mut(id) {
            Some(record) if record.job.state == JobState::Dead => {
                record.job.state = JobState::Pending;
                record.job.attempts = 0;
                record.job.next_run_at = None;
                record.job.last_error = None;
                record.job.processing_started_at = None;
                record.job.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_jobs(&self, state_filter: Option<JobState>) -> Result<Vec<Job>, CoreError> {
        let state = self.lock();
        let mut jobs: Vec<(u64, Job)> = state
            .jobs
            .values()
            .filter(|r| state_filter.map(|s| r.job.state == s).unwrap_or(true))
            .map(|r| (r.seq, r.job.clone()))
            .collect();
        jobs.sort_by(|a, b| a.1.created_at.cmp(&b.1.created_at).then(a.0.cmp(&b.0)));
        Ok(jobs.into_iter().map(|(_, job)| job).collect())
    }

    async fn job_counts(&self) -> Result<JobCounts, CoreError> {
        let state = self.lock();
        let mut counts = JobCounts::default();
        for record in state.jobs.values() {
            match record.job.state {
                JobState::Pending => counts.pending += 1,
                JobState::Processing => counts.processing += 1,
                JobState::Completed => counts.completed += 1,
                JobState::Dead => counts.dead += 1,
            }
        }
        Ok(counts)
    }

    async fn list_dead(&self) -> Result<Vec<Job>, CoreError> {
        let state = self.lock();
        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|r| r.job.state == JobState::Dead)
            .map(|r| r.job.clone())
            .collect();
        jobs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(jobs)
    }

    async fn reap_stuck(&self, stuck_after_secs: i64, now: DateTime<Utc>) -> Result<u64, CoreError> {
        let cutoff = now - chrono::Duration::seconds(stuck_after_secs);
        let mut state = self.lock();
        let mut count = 0u64;
        for record in state.jobs.values_mut() {
            if record.job.state == JobState::Processing {
                if let Some(started) = record.job.processing_started_at {
                    if started < cutoff {
                        record.job.state = JobState::Pending;
                        record.job.processing_started_at = None;
                        record.job.last_error = Some("requeued_by_reaper".to_string());
                        record.job.updated_at = now;
                        count += 1;
                    }
                }
            }
        }
        Ok(count)
    }

    async fn get_config(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.lock().config.get(key).cloned())
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.lock().config.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_all_config(&self) -> Result<BTreeMap<String, String>, CoreError> {
        Ok(self.lock().config.clone())
    }

    async fn set_control_flag(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.lock().control.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_control_flag(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.lock().control.get(key).cloned())
    }

    async fn clear_control_flag(&self, key: &str) -> Result<(), CoreError> {
        self.lock().control.remove(key);
        Ok(())
    }

    async fn upsert_worker_heartbeat(
        &self,
        worker_id: Uuid,
        pid: i64,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        self.lock().workers.insert(
            worker_id,
            WorkerHeartbeat {
                worker_id,
                pid,
                last_seen: now,
            },
        );
        Ok(())
    }

    async fn list_worker_heartbeats(&self) -> Result<Vec<WorkerHeartbeat>, CoreError> {
        Ok(self.lock().workers.values().cloned().collect())
    }
}

/// A [`Clock`](queuectl_core::Clock) whose `now()` is set by the test and
/// only ever changes when the test calls [`StepClock::set`] or
/// [`StepClock::advance`].
pub struct StepClock {
    now: Mutex<DateTime<Utc>>,
}

impl StepClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard = *guard + by;
    }
}

impl queuectl_core::Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use queuectl_core::lifecycle;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn claims_in_created_at_order_breaking_ties_by_insertion() {
        let store = MemoryStore::new();
        let clock = StepClock::new(t(0));

        lifecycle::enqueue(&store, &clock, "b", "echo b", Some(0)).await.unwrap();
        lifecycle::enqueue(&store, &clock, "a", "echo a", Some(0)).await.unwrap();

        let first = lifecycle::claim(&store, &clock).await.unwrap().unwrap();
        assert_eq!(first.id, "b");
        let second = lifecycle::claim(&store, &clock).await.unwrap().unwrap();
        assert_eq!(second.id, "a");
    }

    #[tokio::test]
    async fn next_run_at_defers_claim_until_due() {
        let store = MemoryStore::new();
        let clock = StepClock::new(t(0));

        lifecycle::enqueue(&store, &clock, "job", "exit 1", Some(5)).await.unwrap();
        lifecycle::claim(&store, &clock).await.unwrap().unwrap();
        lifecycle::fail(&store, &clock, "job", 1, 5, "exit_code=1").await.unwrap();

        assert!(lifecycle::claim(&store, &clock).await.unwrap().is_none());

        clock.advance(chrono::Duration::seconds(10));
        let claimed = lifecycle::claim(&store, &clock).await.unwrap().unwrap();
        assert_eq!(claimed.id, "job");
        assert_eq!(claimed.attempts, 1);
    }

    #[tokio::test]
    async fn reap_stuck_only_touches_expired_processing_jobs() {
        let store = MemoryStore::new();
        let clock = StepClock::new(t(0));

        lifecycle::enqueue(&store, &clock, "old", "sleep 1", Some(0)).await.unwrap();
        lifecycle::enqueue(&store, &clock, "fresh", "sleep 1", Some(0)).await.unwrap();
        lifecycle::claim(&store, &clock).await.unwrap().unwrap();
        lifecycle::claim(&store, &clock).await.unwrap().unwrap();

        clock.advance(chrono::Duration::seconds(200));
        let count = queuectl_core::reaper::sweep(&store, &clock, 120).await.unwrap();
        assert_eq!(count, 2);

        let counts = lifecycle::counts(&store).await.unwrap();
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.processing, 0);
    }
}
