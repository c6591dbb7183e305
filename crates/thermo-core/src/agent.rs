//! The measurement loop: poll → transmit → wait, until stopped
//!
//! Nothing that goes wrong inside a cycle leaves it. Sensor and delivery
//! failures are logged where they happen and folded into the [`CycleReport`];
//! the next cycle runs regardless.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{info, warn};

use crate::reading::Reading;
use crate::scheduler::{CYCLE_INTERVAL, StopSignal, Ticker};
use crate::sensors::{PollError, RegisterBus, SensorPoller, SensorSite};
use crate::transmit::{Collector, TransmitError, Transmitter};

/// A sensor not read successfully for this long is reported as stale.
pub const STALE_AFTER: Duration = Duration::from_secs(2 * CYCLE_INTERVAL.as_secs());

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// The reading that was (or failed to be) transmitted.
    pub reading: Reading,
    pub sensor_failures: Vec<(SensorSite, PollError)>,
    /// Sites whose transmitted values are older than [`STALE_AFTER`] or were never read.
    pub stale_sites: Vec<SensorSite>,
    pub delivery: Result<(), TransmitError>,
}

/// Running totals since the agent was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u64,
    pub delivered: u64,
    pub delivery_failures: u64,
    pub sensor_failures: u64,
}

impl CycleStats {
    fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        self.sensor_failures += report.sensor_failures.len() as u64;
        match report.delivery {
            Ok(()) => self.delivered += 1,
            Err(_) => self.delivery_failures += 1,
        }
    }
}

/// Owns the bus and the collector for the lifetime of the process and carries
/// the last reading from one cycle to the next.
pub struct Agent<B, C> {
    poller: SensorPoller<B>,
    transmitter: Transmitter<C>,
    last: Reading,
    stats: CycleStats,
}

impl<B: RegisterBus, C: Collector> Agent<B, C> {
    pub fn new(bus: B, collector: C, identity_key: impl Into<String>) -> Self {
        Self {
            poller: SensorPoller::new(bus),
            transmitter: Transmitter::new(collector),
            last: Reading::initial(identity_key),
            stats: CycleStats::default(),
        }
    }

    /// Poll both sensors and transmit whatever the resulting reading holds.
    pub fn run_cycle(&mut self, now: u64) -> CycleReport {
        let outcome = self.poller.poll(&self.last, now);
        info!("Reading: {}", outcome.reading);

        let stale_sites = stale_sites(&outcome.reading, now);
        let delivery = self.transmitter.transmit(&outcome.reading);

        self.last = outcome.reading.clone();
        let report = CycleReport {
            reading: outcome.reading,
            sensor_failures: outcome.failures,
            stale_sites,
            delivery,
        };
        self.stats.record(&report);
        report
    }

    /// Run one cycle per tick until the ticker ends or `stop` is raised.
    ///
    /// Returns the number of cycles completed.
    pub fn run<T: Ticker>(&mut self, ticker: &mut T, stop: &StopSignal) -> u64 {
        info!("Measurement loop started");

        let mut completed = 0;
        while ticker.wait_next(stop) {
            self.run_cycle(unix_now());
            completed += 1;

            let stats = self.stats;
            info!(
                "Cycle {} done: {} delivered, {} failed deliveries, {} failed sensor reads",
                stats.cycles, stats.delivered, stats.delivery_failures, stats.sensor_failures
            );
        }

        info!("Measurement loop stopped after {} cycles", completed);
        completed
    }

    pub fn last_reading(&self) -> &Reading {
        &self.last
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    pub fn poller(&self) -> &SensorPoller<B> {
        &self.poller
    }

    pub fn transmitter(&self) -> &Transmitter<C> {
        &self.transmitter
    }
}

fn stale_sites(reading: &Reading, now: u64) -> Vec<SensorSite> {
    let mut stale = Vec::new();
    for site in SensorSite::ALL {
        let sample = reading.sample(site);
        if !sample.is_stale(now, STALE_AFTER.as_secs()) {
            continue;
        }
        match sample.updated_at {
            Some(at) => warn!(
                "Sending stale {} values, last read {} s ago",
                site.label(),
                now.saturating_sub(at)
            ),
            None => warn!("Sending placeholder {} values, sensor never read", site.label()),
        }
        stale.push(site);
    }
    stale
}

/// Seconds since the unix epoch, or 0 if the clock is set before it.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
