//! In-memory bus and collector fakes shared by the unit tests.

use std::collections::VecDeque;

use crate::sensors::{BusError, RegisterBus};
use crate::transmit::{Collector, CollectorResponse, TransportError};

/// Bus answering from a script of per-read responses. Once the script runs
/// out every read times out.
#[derive(Default)]
pub(crate) struct ScriptedBus {
    pub responses: VecDeque<Result<Vec<u8>, BusError>>,
    /// `(target, start, count)` of every read issued.
    pub requests: Vec<(u8, u16, u16)>,
    target: u8,
}

impl ScriptedBus {
    pub(crate) fn new<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<Vec<u8>, BusError>>,
    {
        Self {
            responses: responses.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl RegisterBus for ScriptedBus {
    fn set_target(&mut self, address: u8) {
        self.target = address;
    }

    fn read_input_registers(&mut self, start: u16, count: u16) -> Result<Vec<u8>, BusError> {
        self.requests.push((self.target, start, count));
        self.responses.pop_front().unwrap_or(Err(BusError::Timeout {
            address: self.target,
        }))
    }
}

/// Wire bytes of a two-register answer.
pub(crate) fn registers(temperature: u8, humidity: u8) -> Result<Vec<u8>, BusError> {
    Ok(vec![0, temperature, 0, humidity])
}

/// Collector that records every request and answers with a canned reply.
pub(crate) struct RecordingCollector {
    pub reply: Result<CollectorResponse, TransportError>,
    /// `(path, body)` of every submission.
    pub requests: Vec<(String, Vec<u8>)>,
}

impl RecordingCollector {
    pub(crate) fn replying(status: u16, body: &str) -> Self {
        Self {
            reply: Ok(CollectorResponse {
                status,
                body: body.as_bytes().to_vec(),
            }),
            requests: Vec::new(),
        }
    }

    pub(crate) fn failing(error: TransportError) -> Self {
        Self {
            reply: Err(error),
            requests: Vec::new(),
        }
    }
}

impl Collector for RecordingCollector {
    fn submit(&mut self, path: &str, body: &[u8]) -> Result<CollectorResponse, TransportError> {
        self.requests.push((path.to_owned(), body.to_vec()));
        self.reply.clone()
    }
}
