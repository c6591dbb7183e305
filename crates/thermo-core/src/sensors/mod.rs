//! Sensor bus abstraction, register decoding and polling
//!
//! Both sensors hang off one shared serial bus and are told apart only by their
//! target address. The bus itself is supplied by the caller through
//! [`RegisterBus`]; this module never opens a port.

mod decoder;
mod poller;

pub use decoder::{DecodeError, MIN_REGISTER_LEN, decode};
pub use poller::{PollError, PollOutcome, STALE_WARNING_THRESHOLD, SensorPoller};

use thiserror_no_std::Error;

/// First input register holding the measurement pair.
pub const INPUT_REGISTER_START: u16 = 1;

/// Number of input registers read per sensor (temperature, humidity).
pub const INPUT_REGISTER_COUNT: u16 = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("no response from sensor {address} within the bus timeout")]
    Timeout { address: u8 },
    #[error("sensor {address} answered with exception: {details}")]
    Exception { address: u8, details: String },
    #[error("serial transport error talking to sensor {address}: {details}")]
    Transport { address: u8, details: String },
    #[error("serial bus is not connected")]
    NotConnected,
}

/// A shared, sequentially addressed register bus.
///
/// Only one request may be in flight at a time: callers select a device with
/// [`RegisterBus::set_target`] and then issue reads against it. The link
/// timeout is a property of the bus, not of individual reads.
pub trait RegisterBus {
    /// Select the device subsequent reads are addressed to.
    fn set_target(&mut self, address: u8);

    /// Read `count` input registers starting at `start` from the current target.
    ///
    /// Returns the register contents as delivered on the wire: two big-endian
    /// bytes per register.
    fn read_input_registers(&mut self, start: u16, count: u16) -> Result<Vec<u8>, BusError>;
}

impl<B: RegisterBus + ?Sized> RegisterBus for Box<B> {
    fn set_target(&mut self, address: u8) {
        (**self).set_target(address);
    }

    fn read_input_registers(&mut self, start: u16, count: u16) -> Result<Vec<u8>, BusError> {
        (**self).read_input_registers(start, count)
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn set_target(&mut self, address: u8) {
        (**self).set_target(address);
    }

    fn read_input_registers(&mut self, start: u16, count: u16) -> Result<Vec<u8>, BusError> {
        (**self).read_input_registers(start, count)
    }
}

/// Where a sensor is mounted. The discriminant is its bus address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorSite {
    Outside = 1,
    Inside = 2,
}

impl SensorSite {
    /// Every site, in polling order.
    pub const ALL: [SensorSite; 2] = [SensorSite::Outside, SensorSite::Inside];

    /// Bus address of the sensor at this site.
    pub const fn address(self) -> u8 {
        self as u8
    }

    /// Short label for log output
    pub const fn label(self) -> &'static str {
        match self {
            Self::Outside => "outside",
            Self::Inside => "inside",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sites_poll_in_address_order() {
        let addresses: Vec<u8> = SensorSite::ALL.iter().map(|s| s.address()).collect();
        assert_eq!(addresses, vec![1, 2]);
    }

    #[test]
    fn test_boxed_bus_forwards_to_inner() {
        struct Echo(u8);
        impl RegisterBus for Echo {
            fn set_target(&mut self, address: u8) {
                self.0 = address;
            }
            fn read_input_registers(&mut self, _: u16, _: u16) -> Result<Vec<u8>, BusError> {
                Ok(vec![self.0])
            }
        }

        let mut bus: Box<dyn RegisterBus> = Box::new(Echo(0));
        bus.set_target(7);
        assert_eq!(bus.read_input_registers(1, 2), Ok(vec![7]));
    }
}
