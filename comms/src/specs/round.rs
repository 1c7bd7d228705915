use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::TelemetrySummary;

/// The unique identifier of a simulated entity.
pub type EntId = u64;

/// The identifier of the population (policy group) an entity belongs to.
pub type PopId = u32;

/// The global mapping of entity to decided action for a single tick.
pub type ActionMap = BTreeMap<EntId, Action>;

/// A single entity's observation for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    pub ent_id: EntId,
    pub pop_id: PopId,
    pub features: Vec<f32>,
    pub reward: f32,
    pub done: bool,
}

/// The final reward of an entity that left the simulation this tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    pub ent_id: EntId,
    pub reward: f32,
}

/// The share of a tick's observations that belongs to one shard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputBatch {
    pub shard: usize,
    pub stimuli: Vec<Stimulus>,
    pub terminals: Vec<Terminal>,
}

impl InputBatch {
    /// Creates an empty batch for `shard`.
    pub fn new(shard: usize) -> Self {
        Self {
            shard,
            ..Default::default()
        }
    }

    /// Returns the amount of live entities in this batch.
    pub fn len(&self) -> usize {
        self.stimuli.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stimuli.is_empty() && self.terminals.is_empty()
    }
}

/// The per round arguments broadcast to every shard next to its batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundArgs {
    pub tick: u64,
    /// Whether shards must also compute and return gradients this round.
    pub backward: bool,
    /// New policy parameters to load before deciding.
    pub update: Option<Vec<f32>>,
}

/// A decision for one entity, one discrete argument per action head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub args: Vec<u32>,
}

impl Action {
    pub fn new(args: Vec<u32>) -> Self {
        Self { args }
    }
}

/// A shard's answer to one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResponse {
    pub shard: usize,
    pub tick: u64,
    pub actions: BTreeMap<EntId, Action>,
    /// Only present on backward rounds.
    pub gradient: Option<Vec<f32>>,
    /// Empty unless the round is a backward round.
    pub telemetry: TelemetrySummary,
}
