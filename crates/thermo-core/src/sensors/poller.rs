use log::{debug, error, warn};
use thiserror_no_std::Error;

use super::{
    BusError, DecodeError, INPUT_REGISTER_COUNT, INPUT_REGISTER_START, RegisterBus, SensorSite,
    decode,
};
use crate::reading::{Reading, SensorSample};

/// Consecutive failed cycles after which a sensor is reported as stale.
pub const STALE_WARNING_THRESHOLD: u32 = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("bus read failed: {0}")]
    Bus(#[from] BusError),
    #[error("malformed register payload: {0}")]
    Decode(#[from] DecodeError),
}

/// Result of polling every sensor once.
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome {
    pub reading: Reading,
    /// Sensors that could not be read this cycle, in polling order.
    pub failures: Vec<(SensorSite, PollError)>,
}

/// Polls both sensors over a single shared bus.
///
/// Sensors are addressed one after another in [`SensorSite::ALL`] order. A
/// failed read is logged and the sensor keeps its previous values; it never
/// stops the remaining sensors from being read, and no read is retried.
pub struct SensorPoller<B> {
    bus: B,
}

impl<B: RegisterBus> SensorPoller<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Read every sensor and build the next reading from `previous`.
    pub fn poll(&mut self, previous: &Reading, now: u64) -> PollOutcome {
        let mut reading = previous.clone();
        let mut failures = Vec::new();

        for site in SensorSite::ALL {
            let sample = match self.read_site(site) {
                Ok((temperature, humidity)) => {
                    debug!(
                        "{} sensor: {:.2}°C {:.2}%",
                        site.label(),
                        temperature,
                        humidity
                    );
                    SensorSample::fresh(temperature, humidity, now)
                }
                Err(e) => {
                    error!(
                        "Failed to read {} sensor at address {}: {}",
                        site.label(),
                        site.address(),
                        e
                    );
                    failures.push((site, e));

                    let stale = previous.sample(site).carried_forward();
                    if stale.consecutive_failures == STALE_WARNING_THRESHOLD {
                        warn!(
                            "{} sensor has failed {} cycles in a row, reporting last known values",
                            site.label(),
                            stale.consecutive_failures
                        );
                    }
                    stale
                }
            };
            reading = reading.with_sample(site, sample);
        }

        PollOutcome { reading, failures }
    }

    fn read_site(&mut self, site: SensorSite) -> Result<(f32, f32), PollError> {
        self.bus.set_target(site.address());
        let registers = self
            .bus
            .read_input_registers(INPUT_REGISTER_START, INPUT_REGISTER_COUNT)?;
        Ok(decode(&registers)?)
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}
