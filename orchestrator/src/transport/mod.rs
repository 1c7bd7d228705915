mod local;
mod tcp;

pub use local::{LocalTransport, ShardHandler};
pub use tcp::{NetTransport, TcpTransport};

use comms::specs::{InputBatch, RoundArgs, RoundResponse, RunLog};

use crate::error::TransportError;

/// A shard as seen from the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardHandle {
    pub index: usize,
    /// A human readable description of where the shard lives.
    pub endpoint: String,
}

/// The receipt of a scattered round, to be handed back to `gather`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a scattered round has to be gathered"]
pub struct Pending {
    pub tick: u64,
    pub shards: usize,
}

/// Moves rounds between the orchestrator and its shards.
///
/// Failures are never retried, any error is fatal for the round it happens in.
#[allow(unused)]
#[trait_variant::make(Transport: Send)]
pub trait TransportTemplate {
    /// Returns the shards of the topology, indexed by shard.
    fn shards(&self) -> Vec<ShardHandle>;

    /// Hands every shard its batch together with the round's arguments.
    ///
    /// # Arguments
    /// * `batches` - Exactly one batch per shard, indexed by shard.
    /// * `args` - The arguments broadcast to every shard.
    ///
    /// # Returns
    /// The receipt of the round, as soon as every batch was handed off.
    ///
    /// # Errors
    /// `ShardCount` if the batches don't match the topology, or any io failure.
    async fn scatter(
        &mut self,
        batches: Vec<InputBatch>,
        args: RoundArgs,
    ) -> Result<Pending, TransportError>;

    /// Waits until every shard of the round answered.
    ///
    /// # Arguments
    /// * `pending` - The receipt returned by `scatter`.
    ///
    /// # Returns
    /// One response per shard, in no particular order.
    async fn gather(&mut self, pending: Pending) -> Result<Vec<RoundResponse>, TransportError>;

    /// Returns a copy of the statistics every shard recorded since they were last taken.
    ///
    /// The shards' state is left untouched, so consecutive calls agree.
    async fn shard_logs(&mut self) -> Result<Vec<RunLog>, TransportError>;

    /// Collects the statistics every shard recorded and clears them.
    async fn take_shard_logs(&mut self) -> Result<Vec<RunLog>, TransportError>;
}
