//! Delivery of readings to the remote collector
//!
//! [`Transmitter`] owns the encoding and the response classification. The
//! network round trip is delegated to a [`Collector`], which only moves bytes.

mod payload;

pub use payload::Payload;

use log::{debug, error, info, warn};
use thiserror_no_std::Error;

use crate::reading::Reading;

/// Collector endpoint readings are posted to.
pub const COLLECTOR_PATH: &str = "/temperatures";

/// The only status the collector answers an accepted reading with.
pub const HTTP_CREATED: u16 = 201;

/// Status and body of a collector reply, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("could not connect to collector: {0}")]
    Connect(String),
    #[error("collector request failed: {0}")]
    Io(String),
}

/// Moves an encoded payload to the collector and hands back its reply.
pub trait Collector {
    /// POST `body` as `application/json` to `path` and return the reply.
    ///
    /// Only failures to obtain a reply at all are errors; a non-success status
    /// is still a response.
    fn submit(&mut self, path: &str, body: &[u8]) -> Result<CollectorResponse, TransportError>;
}

impl<C: Collector + ?Sized> Collector for Box<C> {
    fn submit(&mut self, path: &str, body: &[u8]) -> Result<CollectorResponse, TransportError> {
        (**self).submit(path, body)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransmitError {
    #[error("could not encode payload: {0}")]
    Serialization(String),
    #[error("collector rejected payload with status {status}")]
    Rejected { status: u16 },
    #[error("{0}")]
    Transport(#[from] TransportError),
}

/// Sends one reading per call. Never retries: a failed delivery is logged and
/// the reading is dropped.
pub struct Transmitter<C> {
    collector: C,
}

impl<C: Collector> Transmitter<C> {
    pub const fn new(collector: C) -> Self {
        Self { collector }
    }

    pub fn transmit(&mut self, reading: &Reading) -> Result<(), TransmitError> {
        let result = self.try_transmit(reading);
        match &result {
            Ok(()) => info!("Collector accepted reading ({})", reading),
            Err(TransmitError::Rejected { status }) => {
                warn!("Collector rejected reading with status {}", status)
            }
            Err(e) => error!("Error sending data: {}", e),
        }
        result
    }

    fn try_transmit(&mut self, reading: &Reading) -> Result<(), TransmitError> {
        let body = Payload::from(reading)
            .to_json()
            .map_err(|e| TransmitError::Serialization(e.to_string()))?;
        debug!("POST {} {}", COLLECTOR_PATH, String::from_utf8_lossy(&body));

        let response = self.collector.submit(COLLECTOR_PATH, &body)?;
        if response.status != HTTP_CREATED {
            return Err(TransmitError::Rejected {
                status: response.status,
            });
        }

        // The reply carries nothing the agent acts on; it is only checked for well-formedness.
        if let Err(e) = serde_json::from_slice::<serde_json::Value>(&response.body) {
            debug!("Ignoring undecodable collector reply: {}", e);
        }

        Ok(())
    }

    pub fn collector(&self) -> &C {
        &self.collector
    }
}
