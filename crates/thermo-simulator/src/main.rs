//! Desktop simulator for the thermo-rs measurement loop.
//!
//! Runs the real `thermo-core` agent against a synthetic sensor bus so the
//! cycle can be watched without the serial hardware, and optionally against a
//! real collector.
//!
//! # Environment
//!
//! | Variable                 | Effect                                              |
//! |--------------------------|-----------------------------------------------------|
//! | `THERMO_COLLECTOR_URL`   | post to this collector instead of logging payloads |
//! | `Key`                    | identity key sent with each payload                 |
//! | `THERMO_SIM_CYCLES`      | number of cycles to run (default 10)                |
//! | `THERMO_SIM_FAULT_EVERY` | make every n-th sensor read time out (default off)  |

use std::process::ExitCode;
use std::time::Duration;

use log::{debug, error, info, warn};

use thermo_agent::HttpCollector;
use thermo_agent::modbus_bus::words_to_bytes;
use thermo_core::config::{AgentConfig, COLLECTOR_URL_VAR};
use thermo_core::sensors::{BusError, RegisterBus, SensorSite};
use thermo_core::transmit::{Collector, CollectorResponse, HTTP_CREATED, TransportError};
use thermo_core::{Agent, Interval, StopSignal, Ticker};

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Time between simulated cycles.
const SIM_INTERVAL: Duration = Duration::from_secs(2);

/// Simulated time that passes per cycle, so the curves move visibly.
const SIM_SECONDS_PER_CYCLE: f64 = 600.0;

const DEFAULT_CYCLES: u64 = 10;

// ---------------------------------------------------------------------------
// Synthetic sensor bus
// ---------------------------------------------------------------------------

/// Register bus answering with slowly varying temperature and humidity.
///
/// Quantities are encoded the way the sensors do it, as integers scaled ×10 in
/// big-endian registers. Only the low byte of each register is decoded, so
/// every curve stays at or below 25.5 to come back intact.
struct SyntheticBus {
    target: u8,
    elapsed_secs: f64,
    reads: u64,
    fault_every: Option<u64>,
}

impl SyntheticBus {
    fn new(fault_every: Option<u64>) -> Self {
        Self {
            target: 0,
            elapsed_secs: 0.0,
            reads: 0,
            fault_every,
        }
    }

    /// Temperature (°C) and humidity (%) at `site` for the current simulated time.
    fn conditions(&self, site: SensorSite) -> (f64, f64) {
        let t = self.elapsed_secs;
        match site {
            // Outside: 5–25 °C daily swing, 12–24 % humidity inversely correlated
            SensorSite::Outside => {
                let day = (t / 86_400.0 * std::f64::consts::TAU).sin();
                (15.0 + 10.0 * day, 18.0 - 6.0 * day)
            }
            // Inside: held around 21 °C by the heating, dry air
            SensorSite::Inside => {
                let drift = (t / 7_200.0).sin();
                (21.0 + 2.0 * drift, 20.0 + 2.0 * (t / 5_000.0).cos())
            }
        }
    }
}

impl RegisterBus for SyntheticBus {
    fn set_target(&mut self, address: u8) {
        // Outside is always polled first; advance the clock once per cycle.
        if address == SensorSite::Outside.address() {
            self.elapsed_secs += SIM_SECONDS_PER_CYCLE;
        }
        self.target = address;
    }

    fn read_input_registers(&mut self, _start: u16, count: u16) -> Result<Vec<u8>, BusError> {
        self.reads += 1;
        if self.fault_every.is_some_and(|n| self.reads % n == 0) {
            return Err(BusError::Timeout {
                address: self.target,
            });
        }

        let site = match self.target {
            1 => SensorSite::Outside,
            2 => SensorSite::Inside,
            address => {
                return Err(BusError::Timeout { address });
            }
        };

        let (temperature, humidity) = self.conditions(site);
        let words = [(temperature * 10.0) as u16, (humidity * 10.0) as u16];
        Ok(words_to_bytes(&words[..usize::from(count).min(words.len())]))
    }
}

// ---------------------------------------------------------------------------
// Collector stand-in
// ---------------------------------------------------------------------------

/// Accepts every payload and logs it.
struct LogCollector;

impl Collector for LogCollector {
    fn submit(&mut self, path: &str, body: &[u8]) -> Result<CollectorResponse, TransportError> {
        info!("POST {} {}", path, String::from_utf8_lossy(body));
        Ok(CollectorResponse {
            status: HTTP_CREATED,
            body: serde_json::json!({ "accepted": true }).to_string().into_bytes(),
        })
    }
}

// ---------------------------------------------------------------------------
// Ticking
// ---------------------------------------------------------------------------

/// Stops another ticker after a fixed number of ticks.
struct Limited<T> {
    inner: T,
    remaining: u64,
}

impl<T: Ticker> Ticker for Limited<T> {
    fn wait_next(&mut self, stop: &StopSignal) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.inner.wait_next(stop)
    }
}

fn parse_count(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(0) => None,
        Ok(n) => Some(n),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", name, raw, e);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file, using process environment"),
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }

    info!("Starting thermo-rs simulator");

    let config = match AgentConfig::from_lookup(|name| std::env::var(name).ok()) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let cycles = parse_count("THERMO_SIM_CYCLES").unwrap_or(DEFAULT_CYCLES);
    let fault_every = parse_count("THERMO_SIM_FAULT_EVERY");
    if let Some(n) = fault_every {
        info!("Every {} sensor read will time out", n);
    }

    let collector: Box<dyn Collector> = if std::env::var_os(COLLECTOR_URL_VAR).is_some() {
        info!("Posting to {}", config.collector_url);
        Box::new(HttpCollector::new(&config.collector_url))
    } else {
        info!("No collector configured, payloads are logged");
        Box::new(LogCollector)
    };

    let mut agent = Agent::new(SyntheticBus::new(fault_every), collector, config.identity_key);
    let mut ticker = Limited {
        inner: Interval::new(SIM_INTERVAL),
        remaining: cycles,
    };

    agent.run(&mut ticker, &StopSignal::new());

    let stats = agent.stats();
    info!(
        "Simulator exiting: {} cycles, {} delivered, {} failed deliveries, {} failed sensor reads",
        stats.cycles, stats.delivered, stats.delivery_failures, stats.sensor_failures
    );

    ExitCode::SUCCESS
}
