//! Host-side adapters for the thermo-rs telemetry agent
//!
//! This crate binds the hardware-independent `thermo-core` loop to the real
//! world: a Modbus RTU client on a serial port and an HTTP client for the
//! collector.

pub mod http_collector;
pub mod modbus_bus;

pub use http_collector::HttpCollector;
pub use modbus_bus::{DisconnectedBus, RtuBus, SerialSettings};
