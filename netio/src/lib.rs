//! # DIS NetIO Library
//!
//! This library connects a local simulation to a Distributed Interactive
//! Simulation (DIS) exercise. It decodes PDUs arriving from other
//! simulators, keeps a network information block (NIB) for every entity it
//! hears about, and publishes the simulation's own entities, emissions and
//! weapon events back onto the network.
//!
//! ## Core Responsibilities
//!
//! ### Receive Path
//! Every cycle drains a bounded number of datagrams from the transport.
//! Each PDU is checked for protocol version and exercise, routed by PDU
//! type to its handler, and applied:
//! - Entity-state updates create or refresh input NIBs
//! - Range filtering and dead-reckoning thresholds decide whether an
//!   update reaches the simulation
//! - Fire, detonation, emission and radio PDUs are handed to the
//!   simulation with the NIBs they refer to
//! - Simulation-management requests addressed to this federate are
//!   answered in the same cycle
//!
//! ### Send Path
//! Local entities are published only when the remote side's dead-reckoned
//! picture has drifted past its thresholds or the heartbeat has expired.
//! Entities that leave the simulation are announced as deactivated.
//!
//! ### Housekeeping
//! Input entities that stay silent longer than their maximum age are
//! reaped and the simulation is told they are gone.
//!
//! ## Module Organization
//!
//! ### Engine (`engine`)
//! The [`NetIo`] engine, its settings, cycle phases and counters.
//!
//! ### Handlers (`handlers`)
//! The default per-PDU-type handlers and the dispatch table they populate.
//!
//! ### Registries (`ntm`, `nib`, `dead_reckoning`, `emission`)
//! Type mappings, entity records, per-kind thresholds and emitter
//! bindings. All of them are configured before the engine starts and are
//! read-only while it runs, apart from the NIB registry.
//!
//! ### Collaborators (`transport`, `simulation`)
//! The two traits the engine is generic over, with UDP and in-memory
//! transports.
//!
//! ### Configuration (`config`, `federate`)
//! TOML configuration and the federate/federation naming helpers.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use netio::{EntitySnapshot, NetIoConfig, Simulation, UdpTransport};
//! use pdu::Vec3;
//! use tokio::time::{interval, Duration, Instant};
//!
//! struct Scenario;
//!
//! impl Simulation for Scenario {
//!     fn publishable_entities(&self) -> Vec<EntitySnapshot> {
//!         vec![EntitySnapshot::new(1, "F-16")]
//!     }
//!
//!     fn ownship_position(&self) -> Option<Vec3> {
//!         None
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NetIoConfig::load("netio.toml")?;
//!     let transport = UdpTransport::new(
//!         "0.0.0.0:3000".parse()?,
//!         "255.255.255.255:3000".parse()?,
//!         true,
//!     );
//!     let mut engine = config.build_engine(transport, Scenario)?;
//!     engine.start()?;
//!
//!     let started = Instant::now();
//!     let mut ticker = interval(Duration::from_millis(50));
//!     loop {
//!         ticker.tick().await;
//!         engine.run_cycle(started.elapsed().as_secs_f64())?;
//!     }
//! }
//! ```

pub mod config;
pub mod dead_reckoning;
pub mod emission;
pub mod engine;
pub mod error;
pub mod federate;
pub mod handlers;
pub mod nib;
pub mod ntm;
pub mod simulation;
pub mod transport;

pub use config::NetIoConfig;
pub use dead_reckoning::{DrOverride, DrParams, DrState, DrTable};
pub use emission::{EmissionHandlerTable, EmissionPduHandler, EmissionThresholds};
pub use engine::{CyclePhase, NetIo, NetIoSettings, Stats};
pub use error::{NetIoError, Result};
pub use federate::{
    make_federate_name, make_federation_name, parse_federate_name, parse_federation_name,
};
pub use handlers::HandlerFn;
pub use nib::{EntityHandle, IoType, Nib, NibKey, NibRegistry};
pub use ntm::{Ntm, NtmRegistry, TypeDescriptor};
pub use simulation::{
    DetonationEvent, EntitySnapshot, FireEvent, OutgoingEvent, SensorSnapshot, Simulation,
};
pub use transport::{LoopbackTransport, Transport, UdpTransport};
