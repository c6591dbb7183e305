//! The per-cycle measurement snapshot
//!
//! A [`Reading`] is immutable. Each cycle the poller builds a new one from the
//! previous cycle's reading, so a sensor that fails to answer keeps its last
//! known good values and the staleness is visible in [`SensorSample`] rather
//! than hidden in silently reused numbers.

use crate::sensors::SensorSite;

/// Latest known values from one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorSample {
    /// Degrees Celsius, truncated to two decimals
    pub temperature: f32,
    /// Relative humidity in percent, truncated to two decimals
    pub humidity: f32,
    /// Unix seconds of the last successful read, `None` until the first one.
    pub updated_at: Option<u64>,
    /// Failed reads since the last successful one.
    pub consecutive_failures: u32,
}

impl SensorSample {
    /// A sample freshly read at `now`.
    pub const fn fresh(temperature: f32, humidity: f32, now: u64) -> Self {
        Self {
            temperature,
            humidity,
            updated_at: Some(now),
            consecutive_failures: 0,
        }
    }

    /// The same values carried into a cycle whose read failed.
    pub const fn carried_forward(self) -> Self {
        Self {
            consecutive_failures: self.consecutive_failures.saturating_add(1),
            ..self
        }
    }

    /// Whether the values are older than `max_age_secs` at `now`, or were never read.
    pub fn is_stale(&self, now: u64, max_age_secs: u64) -> bool {
        match self.updated_at {
            Some(at) => now.saturating_sub(at) > max_age_secs,
            None => true,
        }
    }
}

/// Snapshot of both sensors plus the device credential.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    identity_key: String,
    outside: SensorSample,
    inside: SensorSample,
}

impl Reading {
    /// The reading a process starts from: zeroed values, nothing read yet.
    pub fn initial(identity_key: impl Into<String>) -> Self {
        Self {
            identity_key: identity_key.into(),
            outside: SensorSample::default(),
            inside: SensorSample::default(),
        }
    }

    pub fn identity_key(&self) -> &str {
        &self.identity_key
    }

    pub fn outside(&self) -> &SensorSample {
        &self.outside
    }

    pub fn inside(&self) -> &SensorSample {
        &self.inside
    }

    pub fn sample(&self, site: SensorSite) -> &SensorSample {
        match site {
            SensorSite::Outside => &self.outside,
            SensorSite::Inside => &self.inside,
        }
    }

    /// Returns a copy of this reading with `site` replaced by `sample`.
    /// The identity key is carried over unchanged.
    pub fn with_sample(mut self, site: SensorSite, sample: SensorSample) -> Self {
        match site {
            SensorSite::Outside => self.outside = sample,
            SensorSite::Inside => self.inside = sample,
        }
        self
    }
}

impl core::fmt::Display for Reading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "outside {:.2}°C/{:.2}% inside {:.2}°C/{:.2}%",
            self.outside.temperature,
            self.outside.humidity,
            self.inside.temperature,
            self.inside.humidity
        )
    }
}
