//! Daily expiry of GoodForDay orders.
//!
//! A background worker sleeps until the next local cutoff (16:00 by
//! default), collects the ids of all resting GoodForDay orders under the
//! book lock, releases it, and routes them through the bulk cancel path.
//! The worker never holds the book lock across its sleep and shuts down
//! promptly when the book is dropped.

use std::sync::PoisonError;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, LocalResult, NaiveTime, TimeDelta};
use tracing::{debug, trace};

use super::book::BookShared;

/// Extra wait past the cutoff so a sweep never fires a hair early on coarse
/// timers.
const CUTOFF_SLACK: Duration = Duration::from_millis(100);

/// The default GoodForDay cutoff: 16:00 local time.
pub(super) fn default_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(16, 0, 0).expect("16:00:00 is a valid time of day")
}

/// The next local instant at which GoodForDay orders expire.
///
/// If `now` is already at or past the cutoff, the sweep belongs to the
/// following day.
pub(super) fn next_expiration(now: DateTime<Local>, cutoff: NaiveTime) -> DateTime<Local> {
    let mut date = now.date_naive();
    if now.time() >= cutoff {
        date = date.succ_opt().unwrap_or(date);
    }

    match date.and_time(cutoff).and_local_timezone(Local) {
        LocalResult::Single(at) => at,
        LocalResult::Ambiguous(earliest, _) => earliest,
        // The cutoff falls inside a DST gap; try again a day later.
        LocalResult::None => now + TimeDelta::hours(24),
    }
}

/// Worker loop: wait for the next cutoff (or shutdown), then sweep.
pub(super) fn run(shared: &BookShared) {
    loop {
        let wait = until_next_cutoff(shared.expiration_cutoff);
        trace!(
            "Order book {}: expiry worker sleeping {:?}",
            shared.symbol,
            wait
        );
        if wait_for_shutdown(shared, wait) {
            return;
        }
        sweep(shared);
    }
}

fn until_next_cutoff(cutoff: NaiveTime) -> Duration {
    let now = Local::now();
    let next = next_expiration(now, cutoff);
    (next - now).to_std().unwrap_or(Duration::ZERO) + CUTOFF_SLACK
}

/// Blocks for up to `wait`; returns `true` when shutdown was requested
/// before the wait elapsed.
fn wait_for_shutdown(shared: &BookShared, wait: Duration) -> bool {
    let deadline = Instant::now() + wait;
    let mut shutdown = shared
        .shutdown
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    loop {
        if *shutdown {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        let (guard, _timed_out) = shared
            .expiration_signal
            .wait_timeout(shutdown, deadline - now)
            .unwrap_or_else(PoisonError::into_inner);
        shutdown = guard;
    }
}

/// Collects GoodForDay ids under the book lock, releases it, then cancels
/// through the bulk path (which reacquires). Two phases keep the critical
/// section that touches the global structures short.
fn sweep(shared: &BookShared) {
    let expired = shared.lock_core().good_for_day_ids();
    if expired.is_empty() {
        trace!("Order book {}: no GoodForDay orders to expire", shared.symbol);
        return;
    }

    let result = shared.cancel_orders(&expired);
    debug!(
        "Order book {}: expired {} GoodForDay orders at the daily cutoff",
        shared.symbol,
        result.cancelled_count()
    );
}
