//! thermo-agent: reads both sensors once an hour and posts the reading to the
//! collector, forever.
//!
//! Configuration comes from the environment, optionally seeded from a `.env`
//! file in the working directory:
//!
//! | Variable               | Default                 |
//! |------------------------|-------------------------|
//! | `Key`                  | empty                   |
//! | `THERMO_SERIAL_PORT`   | `/dev/ttyUSB0` (`COM2`) |
//! | `THERMO_COLLECTOR_URL` | `http://localhost:8080` |
//! | `RUST_LOG`             | `info`                  |

use std::process::ExitCode;

use log::{debug, error, info, warn};

use thermo_agent::{DisconnectedBus, HttpCollector, RtuBus, SerialSettings};
use thermo_core::config::AgentConfig;
use thermo_core::{Agent, CYCLE_INTERVAL, Interval, RegisterBus, StopSignal};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file, using process environment"),
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }

    let config = match AgentConfig::from_lookup(|name| std::env::var(name).ok()) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.identity_key.is_empty() {
        warn!("No identity key configured, readings will be sent with an empty Key");
    }

    let bus: Box<dyn RegisterBus> = match RtuBus::connect(&SerialSettings::new(&config.serial_port))
    {
        Ok(bus) => Box::new(bus),
        Err(e) => {
            error!("Serial bus unavailable, every sensor read will fail: {}", e);
            Box::new(DisconnectedBus)
        }
    };

    let collector = HttpCollector::new(&config.collector_url);
    info!(
        "Posting readings to {} every {} minutes",
        collector.base_url(),
        CYCLE_INTERVAL.as_secs() / 60
    );

    let mut agent = Agent::new(bus, collector, config.identity_key);

    // Nothing raises the signal; the process runs until it is killed.
    let stop = StopSignal::new();
    agent.run(&mut Interval::new(CYCLE_INTERVAL), &stop);

    ExitCode::SUCCESS
}
