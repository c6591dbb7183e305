//! Hardware-independent core library for thermo-rs
//!
//! This crate contains the platform-agnostic half of the telemetry agent:
//! register decoding, the per-cycle reading model, sensor polling over an
//! abstract register bus, payload encoding and delivery classification, and the
//! cancellable scheduler that ties them together.
//!
//! Concrete transports (the Modbus RTU serial link and the HTTP client) live in
//! `thermo-agent`; the simulator supplies synthetic ones. Everything here is
//! driven through the [`sensors::RegisterBus`] and [`transmit::Collector`]
//! traits so it can be exercised without hardware or a network.

pub mod agent;
pub mod config;
pub mod reading;
pub mod scheduler;
pub mod sensors;
pub mod transmit;

#[cfg(test)]
mod testing;

pub use agent::{Agent, CycleReport, CycleStats, STALE_AFTER};
pub use reading::{Reading, SensorSample};
pub use scheduler::{Bounded, CYCLE_INTERVAL, Interval, StopSignal, Ticker};
pub use sensors::{BusError, RegisterBus, SensorPoller, SensorSite};
pub use transmit::{Collector, CollectorResponse, TransmitError, Transmitter, TransportError};
