use std::num::{NonZeroU32, NonZeroUsize};

use serde::{Deserialize, Serialize};

/// Wire-level bootstrap specification for a shard instance.
///
/// This type is exchanged over the network during shard bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardSpec {
    /// The index of the shard inside the orchestrator's topology.
    pub index: usize,
    /// The amount of choices of every action head.
    pub action_arity: Vec<NonZeroU32>,
    /// The length of the flat parameter/gradient vector, every backward round returns one.
    pub params: NonZeroUsize,
    pub seed: Option<u64>,
}
