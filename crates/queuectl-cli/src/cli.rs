//! Argument parsing: the `queuectl` operator surface from spec.md §6,
//! supplemented with a `--json` flag on the read-only commands (absent from
//! the distilled spec, grounded in the Python prototype's pretty-printers —
//! see SPEC_FULL.md §6.2).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "queuectl", version, about = "Durable shell-command job queue")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the default per-user store file location.
    #[arg(long, global = true, env = "QUEUECTL_DB_PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Enqueue a new job from a JSON object containing `id` and `command`.
    Enqueue {
        /// e.g. '{"id":"job1","command":"echo hi","max_retries":3}'
        job_json: String,
    },

    /// Print per-state job counts and worker heartbeats.
    Status {
        #[arg(long)]
        json: bool,
    },

    /// List jobs in `created_at` order, optionally filtered by state.
    List {
        #[arg(long = "state")]
        state: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Dead-letter queue operations.
    Dlq {
        #[command(subcommand)]
        action: DlqAction,
    },

    /// Manage worker processes.
    Worker {
        #[command(subcommand)]
        action: WorkerAction,
    },

    /// Read or write runtime tunables (`config` table).
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Hidden entry point for the re-exec'd worker process. Not part of the
    /// operator surface in spec.md §6 — used internally by `worker start`.
    #[command(hide = true)]
    WorkerRun,
}

#[derive(Debug, Subcommand)]
pub enum DlqAction {
    /// List dead jobs, most recently dead first.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Reset a dead job back to `pending` with a fresh retry budget.
    Retry { id: String },
}

#[derive(Debug, Subcommand)]
pub enum WorkerAction {
    /// Spawn N worker processes (default 1) and wait for them to exit.
    Start {
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Set the global `stop_workers` control flag.
    Stop,
    /// Clear the global `stop_workers` control flag.
    ClearStop,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print one key, or the full mapping when `key` is omitted.
    Get { key: Option<String> },
    /// Upsert a key. `-` is normalized to `_` before storage.
    Set { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_enqueue() {
        let cli = Cli::parse_from(["queuectl", "enqueue", r#"{"id":"a","command":"echo hi"}"#]);
        assert!(matches!(cli.command, Commands::Enqueue { .. }));
    }

    #[test]
    fn parses_worker_start_with_count() {
        let cli = Cli::parse_from(["queuectl", "worker", "start", "--count", "4"]);
        match cli.command {
            Commands::Worker { action: WorkerAction::Start { count } } => assert_eq!(count, 4),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_dlq_retry() {
        let cli = Cli::parse_from(["queuectl", "dlq", "retry", "job-1"]);
        match cli.command {
            Commands::Dlq { action: DlqAction::Retry { id } } => assert_eq!(id, "job-1"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn worker_start_defaults_to_one() {
        let cli = Cli::parse_from(["queuectl", "worker", "start"]);
        match cli.command {
            Commands::Worker { action: WorkerAction::Start { count } } => assert_eq!(count, 1),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
