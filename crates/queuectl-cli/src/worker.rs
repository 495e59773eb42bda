//! The worker process: heartbeat, cooperative stop, signal handling, and the
//! per-job claim/execute/classify loop from spec.md §4.6.
//!
//! `worker start --count N` (see [`supervise`]) re-execs this binary as a
//! hidden `worker-run` subcommand N times — the same "re-exec self as a
//! detached subprocess" shape `Stovoy-pend`'s `spawn_worker`/`run_worker`
//! split uses — so each worker is a genuine independent OS process and
//! `worker stop` only has to flip a database flag every process's next
//! loop iteration observes.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use queuectl_core::{config, control, lifecycle, reaper, Clock, CoreError, Store, SystemClock};
use tracing::{error, info, warn};
use uuid::Uuid;

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const IDLE_SLEEP: Duration = Duration::from_millis(200);

/// Spawn `count` worker processes and wait for all of them to exit. Each is
/// a re-exec of the current binary with the hidden `worker-run` subcommand,
/// inheriting `--db-path` via the environment so the child resolves the same
/// store file without re-parsing the parent's full argv.
pub async fn supervise(db_path: &PathBuf, count: u32) -> anyhow::Result<()> {
    let exe = std::env::current_exe()?;
    let mut children = Vec::with_capacity(count as usize);
    for _ in 0..count.max(1) {
        let child = tokio::process::Command::new(&exe)
            .arg("worker-run")
            .env("QUEUECTL_DB_PATH", db_path)
            .stdin(Stdio::null())
            .spawn()?;
        children.push(child);
    }

    for mut child in children {
        let _ = child.wait().await;
    }
    Ok(())
}

/// Run the worker loop in the current process until stopped. This is the
/// body of the hidden `worker-run` subcommand.
pub async fn run(store: Arc<dyn queuectl_core::Store>) -> anyhow::Result<()> {
    let clock = SystemClock;
    let worker_id = Uuid::new_v4();
    let pid = std::process::id() as i64;
    info!(worker_id = %worker_id, pid, "worker_started");

    let stop_signaled = Arc::new(AtomicBool::new(false));
    spawn_signal_handlers(stop_signaled.clone());

    let mut last_sweep: Option<chrono::DateTime<chrono::Utc>> = None;

    loop {
        let now = clock.now();
        if let Err(e) = store.upsert_worker_heartbeat(worker_id, pid, now).await {
            handle_store_error(&e, "heartbeat");
        }

        let stopped = stop_signaled.load(Ordering::SeqCst) || {
            match store.get_control_flag(control::STOP_WORKERS).await {
                Ok(Some(v)) => v == control::STOP_VALUE,
                Ok(None) => false,
                Err(e) => {
                    handle_store_error(&e, "control_flag_read");
                    false
                }
            }
        };
        if stopped {
            info!(worker_id = %worker_id, "worker_stopping");
            break;
        }

        if reaper::should_sweep(now, last_sweep) {
            match reaper::sweep(store.as_ref(), &clock, stuck_after(store.as_ref()).await).await {
                Ok(_) => last_sweep = Some(now),
                Err(e) => handle_store_error(&e, "reaper_sweep"),
            }
        }

        // Idle workers sleep only `POLL_INTERVAL`; the trailing `IDLE_SLEEP`
        // applies after job processing only, per spec.md §4.6 step 4's
        // "sleep poll_interval and continue" (mirrored from worker.py, whose
        // idle branch's `continue` skips the bottom-of-loop 200ms sleep).
        match lifecycle::claim(store.as_ref(), &clock).await {
            Ok(Some(job)) => {
                run_one(store.as_ref(), &clock, worker_id, job).await;
                tokio::time::sleep(IDLE_SLEEP).await;
            }
            Ok(None) => {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            Err(e) => {
                handle_store_error(&e, "claim");
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
    }

    info!(worker_id = %worker_id, "worker_exited");
    Ok(())
}

async fn stuck_after(store: &dyn queuectl_core::Store) -> i64 {
    config::get_i64(store, config::keys::STUCK_AFTER, config::DEFAULT_STUCK_AFTER_SECS)
        .await
        .unwrap_or(config::DEFAULT_STUCK_AFTER_SECS)
}

/// Claim result -> one command execution -> lifecycle transition, per
/// spec.md §4.6 steps 5-6. Store errors here are logged and absorbed: the
/// worker loop is the error firewall (spec.md §7).
async fn run_one(
    store: &dyn queuectl_core::Store,
    clock: &dyn Clock,
    worker_id: Uuid,
    job: queuectl_core::ClaimedJob,
) {
    let cmd_timeout_secs =
        config::get_i64(store, config::keys::CMD_TIMEOUT, config::DEFAULT_CMD_TIMEOUT_SECS)
            .await
            .unwrap_or(config::DEFAULT_CMD_TIMEOUT_SECS);

    info!(
        worker_id = %worker_id,
        job_id = %job.id,
        cmd = %job.command,
        attempts = job.attempts,
        max_retries = job.max_retries,
        "job_start"
    );

    let outcome = launch_and_wait(&job.command, cmd_timeout_secs.max(0) as u64).await;

    let result = match outcome {
        Outcome::Success => {
            info!(worker_id = %worker_id, job_id = %job.id, "job_completed");
            lifecycle::complete(store, clock, &job.id).await
        }
        Outcome::Failed(code) => {
            let attempts = job.attempts + 1;
            let err = format!("exit_code={code}");
            info!(worker_id = %worker_id, job_id = %job.id, error = %err, attempts, "job_failed");
            lifecycle::fail(store, clock, &job.id, attempts, job.max_retries, &err).await
        }
        Outcome::TimedOut => {
            let attempts = job.attempts + 1;
            let err = format!("timeout_after_{cmd_timeout_secs}s");
            info!(worker_id = %worker_id, job_id = %job.id, error = %err, attempts, "job_failed_timeout");
            lifecycle::fail(store, clock, &job.id, attempts, job.max_retries, &err).await
        }
        Outcome::SpawnFailed(msg) => {
            let attempts = job.attempts + 1;
            let err = format!("exception: {msg}");
            info!(worker_id = %worker_id, job_id = %job.id, error = %err, attempts, "job_failed_exception");
            lifecycle::fail(store, clock, &job.id, attempts, job.max_retries, &err).await
        }
    };

    if let Err(e) = result {
        handle_store_error(&e, "job_transition");
    }
}

/// Transient store errors are logged and absorbed, matching spec.md §7's
/// "store errors swallowed-and-logged inside the worker loop". A non-transient
/// error means unrecoverable store corruption (spec.md §7's "Fatal"
/// resolution): log it and exit the process rather than spin on a store that
/// can never succeed again.
fn handle_store_error(e: &CoreError, context: &str) {
    if e.is_transient() {
        warn!(error = %e, context, "store error absorbed by worker loop");
    } else {
        error!(error = %e, context, "unrecoverable store error, worker exiting");
        std::process::exit(1);
    }
}

enum Outcome {
    Success,
    Failed(i32),
    TimedOut,
    SpawnFailed(String),
}

/// Launch `command` through a shell, inheriting stdio (no output capture,
/// per spec.md §1's explicit Non-goal and §4.6's "no output capture" design
/// note), waiting up to `timeout_secs`. The child is killed before this
/// function returns on a timeout, per spec.md's explicit requirement.
async fn launch_and_wait(command: &str, timeout_secs: u64) -> Outcome {
    let mut child = match tokio::process::Command::new("sh").arg("-c").arg(command).spawn() {
        Ok(child) => child,
        Err(e) => return Outcome::SpawnFailed(e.to_string()),
    };

    match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait()).await {
        Ok(Ok(status)) => {
            if status.success() {
                Outcome::Success
            } else {
                Outcome::Failed(status.code().unwrap_or(1))
            }
        }
        Ok(Err(e)) => Outcome::SpawnFailed(e.to_string()),
        Err(_) => {
            let _ = child.kill().await;
            let _ = child.wait().await;
            Outcome::TimedOut
        }
    }
}

/// Install SIGTERM/SIGINT handlers that flip `flag` and log `worker_signal`.
/// Same "finish current job, then exit" semantics as the global stop flag
/// (spec.md §5).
fn spawn_signal_handlers(flag: Arc<AtomicBool>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let flag_term = flag.clone();
        tokio::spawn(async move {
            if let Ok(mut sig) = signal(SignalKind::terminate()) {
                sig.recv().await;
                info!(signum = "SIGTERM", "worker_signal");
                flag_term.store(true, Ordering::SeqCst);
            }
        });
        tokio::spawn(async move {
            if let Ok(mut sig) = signal(SignalKind::interrupt()) {
                sig.recv().await;
                info!(signum = "SIGINT", "worker_signal");
                flag.store(true, Ordering::SeqCst);
            }
        });
    }
    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!(signum = "CTRL_C", "worker_signal");
            flag.store(true, Ordering::SeqCst);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn launch_and_wait_reports_success_on_exit_zero() {
        let outcome = launch_and_wait("exit 0", 5).await;
        assert!(matches!(outcome, Outcome::Success));
    }

    #[tokio::test]
    async fn launch_and_wait_reports_exit_code_on_failure() {
        let outcome = launch_and_wait("exit 7", 5).await;
        assert!(matches!(outcome, Outcome::Failed(7)));
    }

    #[tokio::test]
    async fn launch_and_wait_times_out_and_kills_child() {
        let started = std::time::Instant::now();
        let outcome = launch_and_wait("sleep 5", 1).await;
        assert!(matches!(outcome, Outcome::TimedOut));
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
