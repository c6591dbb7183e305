//! Tick sources and cancellation for the measurement loop

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Time between two measurement cycles.
pub const CYCLE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Cancellation flag shared between the loop and whoever may stop it.
///
/// Waiting on the signal wakes up as soon as [`StopSignal::stop`] is called,
/// so a long interval never delays shutdown.
#[derive(Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        let (flag, condvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        condvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        let (flag, _) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for up to `timeout`. Returns `true` if the signal was raised.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, condvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut stopped = flag.lock().unwrap_or_else(PoisonError::into_inner);

        // Loop to ride out spurious wakeups.
        while !*stopped {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            stopped = condvar
                .wait_timeout(stopped, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *stopped
    }
}

/// Source of cycle ticks.
pub trait Ticker {
    /// Block until the next cycle is due.
    ///
    /// Returns `false` once no further cycle should run, either because the
    /// source is exhausted or because `stop` was raised.
    fn wait_next(&mut self, stop: &StopSignal) -> bool;
}

/// Ticks immediately, then once every `period`.
pub struct Interval {
    period: Duration,
    started: bool,
}

impl Interval {
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            started: false,
        }
    }
}

impl Ticker for Interval {
    fn wait_next(&mut self, stop: &StopSignal) -> bool {
        if !self.started {
            self.started = true;
            return !stop.is_stopped();
        }
        !stop.wait_timeout(self.period)
    }
}

/// Ticks a fixed number of times without waiting.
pub struct Bounded {
    remaining: u64,
}

impl Bounded {
    pub const fn new(ticks: u64) -> Self {
        Self { remaining: ticks }
    }
}

impl Ticker for Bounded {
    fn wait_next(&mut self, stop: &StopSignal) -> bool {
        if self.remaining == 0 || stop.is_stopped() {
            return false;
        }
        self.remaining -= 1;
        true
    }
}
