use std::{sync::Arc, time::Duration};

use tracing::trace;

use super::{SubscriptionShared, SubscriptionState};
use crate::timer::Timer;

/// Tick interval while the pending queue is empty.
pub(crate) const SIGNAL_TIMER_SLOW: Duration = Duration::from_millis(10_000);
/// Tick interval while messages are queued. Bounds the delivery latency
/// of a coalesced enqueue to a small multiple of a typical callback.
pub(crate) const SIGNAL_TIMER_FAST: Duration = Duration::from_millis(10);

/// Consecutive failed lock attempts before a tick blocks on the lock.
const BLOCK_AFTER_FAILED_ATTEMPTS: u32 = 10;

/// Start the coalescing signal timer for `shared`
///
/// Under load, broadcasting on every enqueue wastes wakeups on a
/// consumer that is already draining. The network reader instead
/// appends without signaling and this timer periodically wakes the
/// consumer while messages are queued, falling back to a slow tick
/// once the queue is empty.
///
/// The timer task holds one reference to the subscription and releases
/// it when its stop callback runs.
pub(crate) fn start(shared: &Arc<SubscriptionShared>) -> Timer {
    let id = shared.id;
    let tick_shared = Arc::clone(shared);
    let mut failed_attempts = 0_u32;

    Timer::spawn(
        SIGNAL_TIMER_SLOW,
        move || {
            let mut state = match tick_shared.state.try_lock() {
                Some(state) => state,
                None => {
                    failed_attempts += 1;
                    if failed_attempts < BLOCK_AFTER_FAILED_ATTEMPTS {
                        return;
                    }
                    tick_shared.state.lock()
                }
            };
            failed_attempts = 0;

            let should_signal = if state.list.is_empty() {
                slow_mode(&mut state);
                false
            } else {
                state.in_wait > 0
            };
            drop(state);

            if should_signal {
                tick_shared.signal.notify_waiters();
            }
        },
        move || trace!(subscription = %id, "signal timer stopped"),
    )
}

/// Shift the timer into fast mode. The subscription lock is held.
pub(crate) fn fast_mode(state: &mut SubscriptionState) {
    if state.signal_timer_interval != SIGNAL_TIMER_FAST {
        state.signal_timer_interval = SIGNAL_TIMER_FAST;
        if let Some(timer) = &state.signal_timer {
            timer.reset(SIGNAL_TIMER_FAST);
        }
    }
}

fn slow_mode(state: &mut SubscriptionState) {
    if state.signal_timer_interval != SIGNAL_TIMER_SLOW {
        state.signal_timer_interval = SIGNAL_TIMER_SLOW;
        if let Some(timer) = &state.signal_timer {
            timer.reset(SIGNAL_TIMER_SLOW);
        }
    }
}
