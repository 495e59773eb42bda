//! SQLite implementation of the queuectl [`Store`] trait.
//!
//! # Features
//!
//! - WAL journal mode for crash-safe durability across process kill and
//!   power loss, with a bounded busy timeout instead of indefinite blocking
//!   under writer contention.
//! - Atomic job claim via a single `UPDATE ... WHERE id = (SELECT ...)
//!   RETURNING` statement — SQLite's single-writer model plus `RETURNING`
//!   gives the same no-double-claim guarantee the teacher's Postgres `FOR
//!   UPDATE SKIP LOCKED` gave, without row locks.
//! - Exponential backoff and dead-letter transitions live in
//!   `queuectl-core::lifecycle`; this crate only implements the mechanical,
//!   atomic-per-row persistence operations `lifecycle` asks for.
//! - Worker heartbeats, config, and control-flag tables, all idempotently
//!   migrated in [`SqliteStore::connect`].
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE jobs (
//!     id TEXT PRIMARY KEY,
//!     command TEXT NOT NULL,
//!     state TEXT NOT NULL,
//!     attempts INTEGER NOT NULL DEFAULT 0,
//!     max_retries INTEGER NOT NULL DEFAULT 3,
//!     created_at TEXT NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     next_run_at TEXT,
//!     last_error TEXT,
//!     processing_started_at TEXT
//! );
//!
//! CREATE TABLE config (key TEXT PRIMARY KEY, value TEXT NOT NULL);
//! CREATE TABLE control (key TEXT PRIMARY KEY, value TEXT NOT NULL);
//! CREATE TABLE workers (worker_id TEXT PRIMARY KEY, pid INTEGER NOT NULL, last_seen TEXT NOT NULL);
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use queuectl_core::config;
use queuectl_core::{ClaimedJob, CoreError, Job, JobCounts, JobState, NewJob, Store, WorkerHeartbeat};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::Row;
use uuid::Uuid;

/// Bounded acquisition timeout for busy-writer contention, per spec (~10s).
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// SQLite-backed, durable, concurrent-safe job store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the store file at `path`, enable WAL mode,
    /// and run idempotent schema migrations plus default config seeding.
    pub async fn connect(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Build a store around an already-open pool, running the same
    /// migrations. Used by tests that want an in-memory or custom-option
    /// pool.
    pub async fn from_pool(pool: SqlitePool) -> anyhow::Result<Self> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                command TEXT NOT NULL,
                state TEXT NOT NULL,
                attempts INTEGER NOT NULL DEFAULT 0,
                max_retries INTEGER NOT NULL DEFAULT 3,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                next_run_at TEXT,
                last_error TEXT,
                processing_started_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE TABLE IF NOT EXISTS config (key TEXT PRIMARY KEY, value TEXT NOT NULL)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE TABLE IF NOT EXISTS control (key TEXT PRIMARY KEY, value TEXT NOT NULL)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workers (
                worker_id TEXT PRIMARY KEY,
                pid INTEGER NOT NULL,
                last_seen TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_jobs_claimable ON jobs (state, next_run_at, created_at)",
        )
        .execute(&self.pool)
        .await?;

        for (key, default) in [
            (config::keys::MAX_RETRIES, config::DEFAULT_MAX_RETRIES),
            (config::keys::BACKOFF_BASE, config::DEFAULT_BACKOFF_BASE),
            (config::keys::CMD_TIMEOUT, config::DEFAULT_CMD_TIMEOUT_SECS),
            (config::keys::STUCK_AFTER, config::DEFAULT_STUCK_AFTER_SECS),
        ] {
            sqlx::query("INSERT OR IGNORE INTO config(key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default.to_string())
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }

    /// The underlying pool, for callers that need raw access (maintenance
    /// tooling, tests).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn to_rfc3339(ts: DateTime<Utc>) -> String {
    ts.trunc_subsecs(0).to_rfc3339()
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, CoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::StoreUnavailable(anyhow::anyhow!(e)))
}

fn parse_ts_opt(s: Option<String>) -> Result<Option<DateTime<Utc>>, CoreError> {
    s.map(|s| parse_ts(&s)).transpose()
}

fn map_sqlx_err(err: sqlx::Error) -> CoreError {
    CoreError::StoreUnavailable(anyhow::anyhow!(err))
}

fn row_to_job(row: SqliteRow) -> Result<Job, CoreError> {
    let state_str: String = row.try_get("state").map_err(map_sqlx_err)?;
    let state =
        JobState::from_str(&state_str).map_err(|e| CoreError::StoreUnavailable(anyhow::anyhow!(e)))?;
    Ok(Job {
        id: row.try_get("id").map_err(map_sqlx_err)?,
        command: row.try_get("command").map_err(map_sqlx_err)?,
        state,
        attempts: row.try_get("attempts").map_err(map_sqlx_err)?,
        max_retries: row.try_get("max_retries").map_err(map_sqlx_err)?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at").map_err(map_sqlx_err)?)?,
        updated_at: parse_ts(&row.try_get::<String, _>("updated_at").map_err(map_sqlx_err)?)?,
        next_run_at: parse_ts_opt(row.try_get("next_run_at").map_err(map_sqlx_err)?)?,
        last_error: row.try_get("last_error").map_err(map_sqlx_err)?,
        processing_started_at: parse_ts_opt(
            row.try_get("processing_started_at").map_err(map_sqlx_err)?,
        )?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_pending_job(&self, job: NewJob, now: DateTime<Utc>) -> Result<(), CoreError> {
        let now = to_rfc3339(now);
        let result = sqlx::query(
            r#"
            INSERT INTO jobs
                (id, command, state, attempts, max_retries, created_at, updated_at, next_run_at, last_error, processing_started_at)
            VALUES (?, ?, 'pending', 0, ?, ?, ?, NULL, NULL, NULL)
            "#,
        )
        .bind(&job.id)
        .bind(&job.command)
        .bind(job.max_retries)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(CoreError::DuplicateJob(job.id))
            }
            Err(e) => Err(map_sqlx_err(e)),
        }
    }

    async fn claim_oldest_pending(&self, now: DateTime<Utc>) -> Result<Option<ClaimedJob>, CoreError> {
        let now_s = to_rfc3339(now);
        let row = sqlx::query(
            r#"
            UPDATE jobs
            SET state = 'processing',
                processing_started_at = ?,
                updated_at = ?
            WHERE id = (
                SELECT id FROM jobs
                WHERE state = 'pending'
                  AND (next_run_at IS NULL OR next_run_at <= ?)
                ORDER BY created_at ASC, id ASC
                LIMIT 1
            )
            RETURNING id, command, attempts, max_retries
            "#,
        )
        .bind(&now_s)
        .bind(&now_s)
        .bind(&now_s)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(match row {
            None => None,
            Some(row) => Some(ClaimedJob {
                id: row.try_get("id").map_err(map_sqlx_err)?,
                command: row.try_get("command").map_err(map_sqlx_err)?,
                attempts: row.try_get("attempts").map_err(map_sqlx_err)?,
                max_retries: row.try_get("max_retries").map_err(map_sqlx_err)?,
            }),
        })
    }

    async fn mark_completed(&self, id: &str, now: DateTime<Utc>) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET state = 'completed',
                last_error = NULL,
                processing_started_at = NULL,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(to_rfc3339(now))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
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
        sqlx::query(
            r#"
            UPDATE jobs
            SET state = 'pending',
                attempts = ?,
                next_run_at = ?,
                last_error = ?,
                processing_started_at = NULL,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(attempts)
        .bind(to_rfc3339(next_run_at))
        .bind(last_error)
        .bind(to_rfc3339(now))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn mark_dead(
        &self,
        id: &str,
        attempts: i64,
        last_error: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET state = 'dead',
                attempts = ?,
                next_run_at = NULL,
                last_error = ?,
                processing_started_at = NULL,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(attempts)
        .bind(last_error)
        .bind(to_rfc3339(now))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn retry_dead(&self, id: &str, now: DateTime<Utc>) -> Result<bool, CoreError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET state = 'pending',
                attempts = 0,
                next_run_at = NULL,
                last_error = NULL,
                processing_started_at = NULL,
                updated_at = ?
            WHERE id = ? AND state = 'dead'
            "#,
        )
        .bind(to_rfc3339(now))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_jobs(&self, state: Option<JobState>) -> Result<Vec<Job>, CoreError> {
        let rows = match state {
            Some(state) => sqlx::query("SELECT * FROM jobs WHERE state = ? ORDER BY created_at ASC")
                .bind(state.as_str())
                .fetch_all(&self.pool)
                .await,
            None => {
                sqlx::query("SELECT * FROM jobs ORDER BY created_at ASC")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(map_sqlx_err)?;

        rows.into_iter().map(row_to_job).collect()
    }

    async fn job_counts(&self) -> Result<JobCounts, CoreError> {
        let rows = sqlx::query("SELECT state, COUNT(*) AS cnt FROM jobs GROUP BY state")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        let mut counts = JobCounts::default();
        for row in rows {
            let state: String = row.try_get("state").map_err(map_sqlx_err)?;
            let cnt: i64 = row.try_get("cnt").map_err(map_sqlx_err)?;
            match state.as_str() {
                "pending" => counts.pending = cnt,
                "processing" => counts.processing = cnt,
                "completed" => counts.completed = cnt,
                "dead" => counts.dead = cnt,
                _ => {}
            }
        }
        Ok(counts)
    }

    async fn list_dead(&self) -> Result<Vec<Job>, CoreError> {
        let rows = sqlx::query("SELECT * FROM jobs WHERE state = 'dead' ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        rows.into_iter().map(row_to_job).collect()
    }

    async fn reap_stuck(&self, stuck_after_secs: i64, now: DateTime<Utc>) -> Result<u64, CoreError> {
        let cutoff = to_rfc3339(now - chrono::Duration::seconds(stuck_after_secs));
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET state = 'pending',
                processing_started_at = NULL,
                last_error = 'requeued_by_reaper',
                updated_at = ?
            WHERE state = 'processing'
              AND processing_started_at IS NOT NULL
              AND processing_started_at < ?
            "#,
        )
        .bind(to_rfc3339(now))
        .bind(&cutoff)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }

    async fn get_config(&self, key: &str) -> Result<Option<String>, CoreError> {
        let row = sqlx::query("SELECT value FROM config WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        row.map(|r| r.try_get("value").map_err(map_sqlx_err)).transpose()
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO config(key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn get_all_config(&self) -> Result<BTreeMap<String, String>, CoreError> {
        let rows = sqlx::query("SELECT key, value FROM config")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        let mut out = BTreeMap::new();
        for row in rows {
            let key: String = row.try_get("key").map_err(map_sqlx_err)?;
            let value: String = row.try_get("value").map_err(map_sqlx_err)?;
            out.insert(key, value);
        }
        Ok(out)
    }

    async fn set_control_flag(&self, key: &str, value: &str) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO control(key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn get_control_flag(&self, key: &str) -> Result<Option<String>, CoreError> {
        let row = sqlx::query("SELECT value FROM control WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        row.map(|r| r.try_get("value").map_err(map_sqlx_err)).transpose()
    }

    async fn clear_control_flag(&self, key: &str) -> Result<(), CoreError> {
        sqlx::query("DELETE FROM control WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn upsert_worker_heartbeat(
        &self,
        worker_id: Uuid,
        pid: i64,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO workers(worker_id, pid, last_seen) VALUES (?, ?, ?)
            ON CONFLICT(worker_id) DO UPDATE SET pid = excluded.pid, last_seen = excluded.last_seen
            "#,
        )
        .bind(worker_id.to_string())
        .bind(pid)
        .bind(to_rfc3339(now))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn list_worker_heartbeats(&self) -> Result<Vec<WorkerHeartbeat>, CoreError> {
        let rows = sqlx::query("SELECT worker_id, pid, last_seen FROM workers")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        rows.into_iter()
            .map(|row| {
                let worker_id: String = row.try_get("worker_id").map_err(map_sqlx_err)?;
                let worker_id = Uuid::parse_str(&worker_id)
                    .map_err(|e| CoreError::StoreUnavailable(anyhow::anyhow!(e)))?;
                Ok(WorkerHeartbeat {
                    worker_id,
                    pid: row.try_get("pid").map_err(map_sqlx_err)?,
                    last_seen: parse_ts(&row.try_get::<String, _>("last_seen").map_err(map_sqlx_err)?)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use queuectl_core::{lifecycle, reaper, SystemClock};
    use std::collections::HashSet;
    use std::sync::Arc;

    async fn temp_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.db");
        let store = SqliteStore::connect(&path).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn enqueue_rejects_duplicate_ids() {
        let (store, _dir) = temp_store().await;
        let clock = SystemClock;
        lifecycle::enqueue(&store, &clock, "dup", "echo hi", None).await.unwrap();
        let err = lifecycle::enqueue(&store, &clock, "dup", "echo hi", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateJob(ref id) if id == "dup"));
    }

    #[tokio::test]
    async fn claim_then_complete_moves_through_states() {
        let (store, _dir) = temp_store().await;
        let clock = SystemClock;
        lifecycle::enqueue(&store, &clock, "job-1", "echo hi", Some(3)).await.unwrap();

        let claimed = lifecycle::claim(&store, &clock).await.unwrap().unwrap();
        assert_eq!(claimed.id, "job-1");
        assert_eq!(claimed.attempts, 0);

        assert!(lifecycle::claim(&store, &clock).await.unwrap().is_none());

        lifecycle::complete(&store, &clock, "job-1").await.unwrap();
        let counts = lifecycle::counts(&store).await.unwrap();
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.processing, 0);
    }

    #[tokio::test]
    async fn fail_past_retry_budget_goes_dead() {
        let (store, _dir) = temp_store().await;
        let clock = SystemClock;
        lifecycle::enqueue(&store, &clock, "job-bad", "exit 1", Some(1)).await.unwrap();

        lifecycle::claim(&store, &clock).await.unwrap().unwrap();
        lifecycle::fail(&store, &clock, "job-bad", 1, 1, "exit_code=1").await.unwrap();
        let counts = lifecycle::counts(&store).await.unwrap();
        assert_eq!(counts.pending, 1);

        lifecycle::claim(&store, &clock).await.unwrap().unwrap();
        lifecycle::fail(&store, &clock, "job-bad", 2, 1, "exit_code=1").await.unwrap();
        let dead = lifecycle::list_dead(&store).await.unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].last_error.as_deref(), Some("exit_code=1"));
    }

    #[tokio::test]
    async fn retry_dead_resets_attempts_and_error() {
        let (store, _dir) = temp_store().await;
        let clock = SystemClock;
        lifecycle::enqueue(&store, &clock, "job-dlq", "exit 1", Some(0)).await.unwrap();
        lifecycle::claim(&store, &clock).await.unwrap().unwrap();
        lifecycle::fail(&store, &clock, "job-dlq", 1, 0, "exit_code=1").await.unwrap();

        let reset = lifecycle::retry_dead(&store, &clock, "job-dlq").await.unwrap();
        assert!(reset);

        let jobs = lifecycle::list(&store, None).await.unwrap();
        let job = jobs.into_iter().find(|j| j.id == "job-dlq").unwrap();
        assert_eq!(job.attempts, 0);
        assert!(job.last_error.is_none());
        assert!(matches!(job.state, JobState::Pending));
    }

    #[tokio::test]
    async fn reaper_requeues_stuck_jobs_without_touching_attempts() {
        let (store, _dir) = temp_store().await;
        let clock = SystemClock;
        lifecycle::enqueue(&store, &clock, "stuck", "sleep 1", Some(3)).await.unwrap();
        let claimed = lifecycle::claim(&store, &clock).await.unwrap().unwrap();
        assert_eq!(claimed.attempts, 0);

        let old = Utc::now() - chrono::Duration::seconds(200);
        sqlx::query("UPDATE jobs SET processing_started_at = ? WHERE id = ?")
            .bind(to_rfc3339(old))
            .bind("stuck")
            .execute(store.pool())
            .await
            .unwrap();

        let count = reaper::sweep(&store, &clock, 120).await.unwrap();
        assert_eq!(count, 1);

        let jobs = lifecycle::list(&store, Some(JobState::Pending)).await.unwrap();
        let job = jobs.into_iter().find(|j| j.id == "stuck").unwrap();
        assert_eq!(job.attempts, 0);
        assert_eq!(job.last_error.as_deref(), Some("requeued_by_reaper"));
    }

    #[tokio::test]
    async fn concurrent_claims_never_double_claim() {
        let (store, _dir) = temp_store().await;
        let clock = SystemClock;
        for i in 0..20 {
            lifecycle::enqueue(&store, &clock, format!("job-{i}"), "echo hi", Some(0))
                .await
                .unwrap();
        }

        let store = Arc::new(store);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let clock = SystemClock;
                let mut claimed = Vec::new();
                loop {
                    match lifecycle::claim(store.as_ref(), &clock).await.unwrap() {
                        Some(job) => claimed.push(job.id),
                        None => break,
                    }
                }
                claimed
            }));
        }

        let mut all_claimed = HashSet::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(all_claimed.insert(id), "a job was claimed more than once");
            }
        }
        assert_eq!(all_claimed.len(), 20);
    }

    #[tokio::test]
    async fn config_round_trips_and_falls_back_to_default() {
        let (store, _dir) = temp_store().await;
        assert_eq!(
            config::get_i64(&store, config::keys::MAX_RETRIES, config::DEFAULT_MAX_RETRIES)
                .await
                .unwrap(),
            config::DEFAULT_MAX_RETRIES
        );

        store.set_config("max_retries", "9").await.unwrap();
        assert_eq!(
            config::get_i64(&store, config::keys::MAX_RETRIES, config::DEFAULT_MAX_RETRIES)
                .await
                .unwrap(),
            9
        );
    }

    #[tokio::test]
    async fn control_flag_round_trips() {
        let (store, _dir) = temp_store().await;
        assert!(store.get_control_flag(queuectl_core::control::STOP_WORKERS).await.unwrap().is_none());
        store
            .set_control_flag(queuectl_core::control::STOP_WORKERS, queuectl_core::control::STOP_VALUE)
            .await
            .unwrap();
        assert_eq!(
            store.get_control_flag(queuectl_core::control::STOP_WORKERS).await.unwrap().as_deref(),
            Some("1")
        );
        store.clear_control_flag(queuectl_core::control::STOP_WORKERS).await.unwrap();
        assert!(store.get_control_flag(queuectl_core::control::STOP_WORKERS).await.unwrap().is_none());
    }
}
