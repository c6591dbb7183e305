//! Modbus RTU implementation of [`RegisterBus`]
//!
//! One serial port, opened once with fixed link parameters and kept for the
//! lifetime of the process. There is no reconnection: if the port cannot be
//! opened the agent runs on a [`DisconnectedBus`] and every read fails.

use std::io;
use std::time::Duration;

use log::info;
use thermo_core::sensors::{BusError, RegisterBus, SensorSite};
use tokio_modbus::client::sync::{self, Reader as _};
use tokio_modbus::prelude::{Slave, SlaveContext};
use tokio_serial::{DataBits, Parity, StopBits};

pub const BAUD_RATE: u32 = 9600;

/// Upper bound on a single sensor read.
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Serial link parameters. Everything but the device path is fixed: 9600 baud,
/// 8 data bits, no parity, 1 stop bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub path: String,
    pub baud_rate: u32,
    pub timeout: Duration,
}

impl SerialSettings {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: BAUD_RATE,
            timeout: READ_TIMEOUT,
        }
    }
}

/// Blocking Modbus RTU client on a serial port.
pub struct RtuBus {
    ctx: sync::Context,
    target: u8,
}

impl RtuBus {
    /// Open the serial port and prepare a client addressed to the first sensor.
    pub fn connect(settings: &SerialSettings) -> Result<Self, BusError> {
        let builder = tokio_serial::new(&settings.path, settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(settings.timeout);

        let target = SensorSite::Outside.address();
        let ctx =
            sync::rtu::connect_slave_with_timeout(&builder, Slave(target), Some(settings.timeout))
                .map_err(|e| BusError::Transport {
                    address: target,
                    details: format!("cannot open {}: {}", settings.path, e),
                })?;

        info!(
            "Opened {} at {} baud, 8N1, {:?} timeout",
            settings.path, settings.baud_rate, settings.timeout
        );

        Ok(Self { ctx, target })
    }
}

impl RegisterBus for RtuBus {
    fn set_target(&mut self, address: u8) {
        self.target = address;
        self.ctx.set_slave(Slave(address));
    }

    fn read_input_registers(&mut self, start: u16, count: u16) -> Result<Vec<u8>, BusError> {
        let address = self.target;
        match self.ctx.read_input_registers(start, count) {
            Ok(Ok(words)) => Ok(words_to_bytes(&words)),
            Ok(Err(exception)) => Err(BusError::Exception {
                address,
                details: format!("{:?}", exception),
            }),
            Err(tokio_modbus::Error::Transport(e)) if e.kind() == io::ErrorKind::TimedOut => {
                Err(BusError::Timeout { address })
            }
            Err(e) => Err(BusError::Transport {
                address,
                details: e.to_string(),
            }),
        }
    }
}

/// Stand-in for a port that could not be opened at startup.
pub struct DisconnectedBus;

impl RegisterBus for DisconnectedBus {
    fn set_target(&mut self, _address: u8) {}

    fn read_input_registers(&mut self, _start: u16, _count: u16) -> Result<Vec<u8>, BusError> {
        Err(BusError::NotConnected)
    }
}

/// Flatten register words into the big-endian byte stream seen on the wire.
pub fn words_to_bytes(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_be_bytes()).collect()
}
