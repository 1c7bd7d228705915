use std::{error::Error, io};

use comms::specs::EntId;
use thiserror::Error;

/// The orchestrator module's result type.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// All errors that can occur in the orchestrator.
///
/// Every variant aborts the `step` call that produced it, none of them is retried.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Invalid configuration, caught before the first tick.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The partitioner sent an entity to a shard that doesn't exist.
    #[error("entity {ent_id} was mapped to shard {shard}, but there are only {shards} shard(s)")]
    ShardOutOfRange {
        ent_id: EntId,
        shard: usize,
        shards: usize,
    },

    /// Cycles never close in evaluation mode, drive the orchestrator through `tick` instead.
    #[error("step called in evaluation mode, no backward tick can ever be armed")]
    EvaluationMode,

    /// Two shards decided for the same entity.
    #[error("entity {ent_id} was decided twice, second time by shard {shard}")]
    DuplicateEntity { ent_id: EntId, shard: usize },

    /// A shard decided for an entity it was never sent.
    #[error("shard {shard} decided for entity {ent_id}, which it was never sent")]
    UnexpectedEntity { ent_id: EntId, shard: usize },

    /// An entity was sent out but no shard decided for it.
    #[error("entity {ent_id} was sent to shard {shard} but got no action back")]
    MissingEntity { ent_id: EntId, shard: usize },

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// Gradient reduction was invoked on a cycle without gradients.
    #[error("cannot reduce an empty gradient list")]
    EmptyReduction,

    #[error("gradient shape mismatch: expected {expected} values, got {got}")]
    GradientShape { expected: usize, got: usize },

    /// The cycle hit the configured tick bound without producing a gradient.
    #[error("cycle stalled: no gradient after {ticks} tick(s)")]
    CycleStalled { ticks: usize },

    #[error("simulation error: {0}")]
    Simulation(#[source] Box<dyn Error + Send + Sync>),
}

impl OrchestratorError {
    /// Wraps an error produced by the simulation.
    pub fn simulation<E: Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Simulation(Box::new(err))
    }

    /// Whether this error signals a corrupted scatter/gather round.
    pub fn is_partition_integrity(&self) -> bool {
        matches!(
            self,
            Self::DuplicateEntity { .. } | Self::UnexpectedEntity { .. } | Self::MissingEntity { .. }
        )
    }
}

/// Failures of the shard transport, fatal for the round they happen in.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("shard {shard} sent an unexpected message: {got}")]
    UnexpectedMessage { shard: usize, got: &'static str },

    #[error("shard {shard} failed: {detail}")]
    Remote { shard: usize, detail: String },

    #[error("round has {got} batch(es), but the topology has {expected} shard(s)")]
    ShardCount { expected: usize, got: usize },

    #[error("expected a response from shard {expected}, got one from shard {got}")]
    ShardMismatch { expected: usize, got: usize },

    #[error("shard {shard} answered tick {got}, expected tick {expected}")]
    RoundMismatch { shard: usize, expected: u64, got: u64 },

    #[error("shard {shard} answered twice in the same round")]
    DuplicateResponse { shard: usize },

    #[error("shard {shard} never answered the round")]
    MissingResponse { shard: usize },

    /// A backward round always yields one non-empty gradient per shard.
    #[error("shard {shard} answered backward tick {tick} without a gradient")]
    MissingGradient { shard: usize, tick: u64 },
}
