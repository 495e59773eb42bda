//! Operator command handlers: enqueue, status, list, dlq, config. Each
//! mirrors the corresponding `cmd_*` function in the Python prototype
//! (`queuectl.py`), but returns structured data the caller can either
//! pretty-print or serialize with `--json`.

use std::collections::BTreeMap;

use queuectl_core::config;
use queuectl_core::{lifecycle, Job, JobCounts, JobState, Store, SystemClock, WorkerHeartbeat};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CliError;

#[derive(Debug, Deserialize)]
struct EnqueueRequest {
    id: String,
    command: String,
    #[serde(default)]
    max_retries: Option<i64>,
}

pub async fn enqueue(store: &dyn queuectl_core::Store, job_json: &str) -> Result<String, CliError> {
    let req: EnqueueRequest = serde_json::from_str(job_json)
        .map_err(|e| CliError::InvalidInput(format!("invalid JSON: {e}")))?;
    let clock = SystemClock;
    lifecycle::enqueue(store, &clock, &req.id, &req.command, req.max_retries).await?;
    Ok(format!("Enqueued job {}", req.id))
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub counts: JobCounts,
    pub workers: Vec<WorkerHeartbeat>,
}

pub async fn status(store: &dyn queuectl_core::Store) -> Result<StatusReport, CliError> {
    let counts = lifecycle::counts(store).await?;
    let workers = store.list_worker_heartbeats().await?;
    Ok(StatusReport { counts, workers })
}

pub fn render_status(report: &StatusReport) -> String {
    let mut out = String::from("Job states:\n");
    out.push_str(&format!("  pending: {}\n", report.counts.pending));
    out.push_str(&format!("  processing: {}\n", report.counts.processing));
    out.push_str(&format!("  completed: {}\n", report.counts.completed));
    out.push_str(&format!("  dead: {}\n", report.counts.dead));
    out.push_str("\nWorkers:\n");
    if report.workers.is_empty() {
        out.push_str("  (none)\n");
    } else {
        for w in &report.workers {
            out.push_str(&format!(
                "  {} pid={} last_seen={}\n",
                w.worker_id, w.pid, w.last_seen
            ));
        }
    }
    out
}

pub async fn list(
    store: &dyn queuectl_core::Store,
    state: Option<&str>,
) -> Result<Vec<Job>, CliError> {
    let state = state
        .map(|s| {
            s.parse::<JobState>()
                .map_err(|e| CliError::InvalidInput(e))
        })
        .transpose()?;
    Ok(lifecycle::list(store, state).await?)
}

pub fn render_job_line(job: &Job) -> String {
    format!(
        "{}  {}  cmd={}  attempts={}/{}  updated_at={}  last_error={}",
        job.id,
        job.state,
        job.command,
        job.attempts,
        job.max_retries,
        job.updated_at,
        job.last_error.as_deref().unwrap_or("None"),
    )
}

pub async fn dlq_list(store: &dyn queuectl_core::Store) -> Result<Vec<Job>, CliError> {
    Ok(lifecycle::list_dead(store).await?)
}

pub fn render_dlq_line(job: &Job) -> String {
    format!(
        "{} cmd={} attempts={} last_error={}",
        job.id,
        job.command,
        job.attempts,
        job.last_error.as_deref().unwrap_or("None"),
    )
}

pub async fn dlq_retry(store: &dyn queuectl_core::Store, id: &str) -> Result<bool, CliError> {
    let clock = SystemClock;
    Ok(lifecycle::retry_dead(store, &clock, id).await?)
}

pub async fn worker_stop(store: &dyn queuectl_core::Store) -> Result<(), CliError> {
    store
        .set_control_flag(
            queuectl_core::control::STOP_WORKERS,
            queuectl_core::control::STOP_VALUE,
        )
        .await?;
    Ok(())
}

pub async fn worker_clear_stop(store: &dyn queuectl_core::Store) -> Result<(), CliError> {
    store
        .clear_control_flag(queuectl_core::control::STOP_WORKERS)
        .await?;
    Ok(())
}

/// Normalize an operator-supplied config key (`-` -> `_`), per spec.md §4.3.
pub fn normalize_key(key: &str) -> String {
    config::normalize_key(key)
}

pub async fn config_get_one(
    store: &dyn queuectl_core::Store,
    key: &str,
) -> Result<Option<String>, CliError> {
    Ok(store.get_config(&normalize_key(key)).await?)
}

pub async fn config_get_all(
    store: &dyn queuectl_core::Store,
) -> Result<BTreeMap<String, String>, CliError> {
    Ok(store.get_all_config().await?)
}

pub async fn config_set(
    store: &dyn queuectl_core::Store,
    key: &str,
    value: &str,
) -> Result<String, CliError> {
    let key = normalize_key(key);
    store.set_config(&key, value).await?;
    Ok(format!("{key} set to {value}"))
}

pub fn jobs_to_json(jobs: &[Job]) -> Value {
    serde_json::to_value(jobs).expect("Job serializes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use queuectl_sqlite::SqliteStore;

    async fn temp_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::connect(dir.path().join("queue.db")).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn enqueue_rejects_malformed_json() {
        let (store, _dir) = temp_store().await;
        let err = enqueue(&store, "not json").await.unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn enqueue_then_status_reflects_pending_count() {
        let (store, _dir) = temp_store().await;
        enqueue(&store, r#"{"id":"a","command":"echo hi"}"#).await.unwrap();
        let report = status(&store).await.unwrap();
        assert_eq!(report.counts.pending, 1);
    }

    #[tokio::test]
    async fn list_rejects_unknown_state_filter() {
        let (store, _dir) = temp_store().await;
        let err = list(&store, Some("bogus")).await.unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn config_set_then_get_round_trips_with_hyphen_key() {
        let (store, _dir) = temp_store().await;
        config_set(&store, "backoff-base", "5").await.unwrap();
        let val = config_get_one(&store, "backoff-base").await.unwrap();
        assert_eq!(val.as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn dlq_retry_reports_not_found_for_unknown_id() {
        let (store, _dir) = temp_store().await;
        let ok = dlq_retry(&store, "nope").await.unwrap();
        assert!(!ok);
    }

    #[test]
    fn normalize_key_replaces_hyphens() {
        assert_eq!(normalize_key("max-retries"), "max_retries");
    }
}
