//! Scatter-gather orchestration of a multi-agent simulation across a pool of shards.
//!
//! The `Orchestrator` owns the simulation, partitions every tick's observations by
//! entity, has the shards decide the actions and, once enough entity-steps were
//! accumulated, collects their gradients into a `CycleReport`.

pub mod aggregation;
pub mod batching;
pub mod config;
pub mod cycle;
pub mod error;
pub mod identity;
pub mod orchestrator;
pub mod packager;
pub mod partition;
pub mod reassembly;
pub mod simulation;
pub mod telemetry;
pub mod transport;

pub use batching::{BatchPolicy, BatchState};
pub use config::{OrchestratorConfig, Settings};
pub use error::{OrchestratorError, Result, TransportError};
pub use identity::{Identity, IdentityAllocator, Spawn};
pub use orchestrator::{CycleReport, Orchestrator};
pub use simulation::{Observation, Percept, Simulation};
pub use telemetry::Merge;
pub use transport::{LocalTransport, ShardHandler, TcpTransport, Transport};
