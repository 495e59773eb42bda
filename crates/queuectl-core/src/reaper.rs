//! The stuck-job reaper: returns jobs abandoned mid-`processing` back to
//! `pending` without touching their retry budget.
//!
//! Invoked opportunistically from worker loops rather than as a dedicated
//! process (see [`queuectl-cli`]'s worker loop). Concurrent invocations are
//! harmless: the underlying update predicate excludes rows that are no
//! longer `processing` or no longer stuck, so two workers sweeping in the
//! same instant simply race to a no-op on the second one.

use tracing::info;

use crate::clock::Clock;
use crate::error::CoreError;
use crate::store::Store;

/// Sweep stuck `processing` jobs back to `pending`. Emits `reaper_requeued`
/// with the count when non-zero. Returns the number of jobs requeued.
pub async fn sweep(
    store: &dyn Store,
    clock: &dyn Clock,
    stuck_after_secs: i64,
) -> Result<u64, CoreError> {
    let now = clock.now();
    let count = store.reap_stuck(stuck_after_secs, now).await?;
    if count > 0 {
        info!(count, "reaper_requeued");
    }
    Ok(count)
}

/// Whether a worker loop should run the reaper this tick, per the `second %
/// 10 == 0` trigger from the design notes. `last_sweep` is this worker's own
/// record of when it last ran the sweep; it is used as a fallback so a
/// worker polling less often than once a second doesn't skip every
/// divisible-by-10 instant (an open question in the design, resolved in
/// favor of this small supplement).
pub fn should_sweep(
    now: chrono::DateTime<chrono::Utc>,
    last_sweep: Option<chrono::DateTime<chrono::Utc>>,
) -> bool {
    if now.timestamp() % 10 == 0 {
        return true;
    }
    match last_sweep {
        None => true,
        Some(last) => (now - last).num_seconds() >= 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn sweeps_on_the_tens_second() {
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 10).unwrap();
        assert!(should_sweep(t, None));
    }

    #[test]
    fn falls_back_to_ten_seconds_since_last_sweep() {
        let last = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 1).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 13).unwrap();
        assert!(should_sweep(now, Some(last)));
    }

    #[test]
    fn does_not_sweep_twice_in_a_row_off_tick() {
        let last = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 3).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 7).unwrap();
        assert!(!should_sweep(now, Some(last)));
    }
}
