//! # queuectl-core
//!
//! The durable job-queue engine: a state machine over a single job, an
//! atomic single-job claim protocol, a retry/backoff policy, and a
//! stuck-job reaper — all expressed against a [`Store`] trait so the same
//! logic runs against a real SQLite-backed store in production
//! (`queuectl-sqlite`) and an in-memory double in tests
//! (`queuectl-testing`).
//!
//! ## Division of responsibility
//!
//! - [`store`] — the durability boundary. Every method must be safe under
//!   arbitrary worker concurrency; `claim_oldest_pending` in particular must
//!   be one atomic operation, never select-then-update.
//! - [`lifecycle`] — the state machine: `enqueue`, `claim`, `complete`,
//!   `fail`, `retry_dead`, and the read-only scans. Computes backoff and
//!   decides `pending` vs `dead`, then asks the store to persist the
//!   decision.
//! - [`reaper`] — the opportunistic sweep that returns abandoned
//!   `processing` jobs to `pending` without touching their retry budget.
//! - [`clock`] — a `now()` seam so lifecycle/reaper tests can step time
//!   deterministically instead of racing the wall clock.
//! - [`config`] — the recognized runtime tunables (`max_retries`,
//!   `backoff_base`, `cmd_timeout`, `stuck_after`) and their defaults.
//! - [`control`] — the global control-flag key space (`stop_workers`).
//!
//! What this crate deliberately does *not* own: argument parsing, process
//! spawning, signal handling, and log formatting — those live in
//! `queuectl-cli`, which is the only component that talks to an operator or
//! a shell.

pub mod clock;
pub mod config;
pub mod control;
pub mod error;
pub mod job;
pub mod lifecycle;
pub mod reaper;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use error::CoreError;
pub use job::{ClaimedJob, Job, JobCounts, JobState, NewJob, WorkerHeartbeat};
pub use store::Store;
