//! Monotonic UTC clock, truncated to whole-second precision.

use chrono::{DateTime, SubsecRound, Utc};

/// Produces the timestamps persisted on every job/worker/control mutation.
///
/// Abstracted behind a trait so the lifecycle and reaper tests in
/// [`queuectl-testing`](https://docs.rs/queuectl-testing) can step time
/// deterministically instead of racing the wall clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The production clock: `Utc::now()`, truncated to seconds per spec.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }
}
