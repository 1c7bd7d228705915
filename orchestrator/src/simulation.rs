use std::{
    collections::{BTreeMap, BTreeSet},
    error::Error,
};

use comms::specs::{ActionMap, EntId, PopId, RunLog};

use crate::identity::Spawn;

/// What a live entity perceives this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Percept {
    pub pop_id: PopId,
    pub features: Vec<f32>,
}

/// Everything the simulation reports after a reset or a step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    /// The live entities.
    pub obs: BTreeMap<EntId, Percept>,
    pub rewards: BTreeMap<EntId, f32>,
    /// The entities that left the simulation this tick.
    pub dones: BTreeSet<EntId>,
}

impl Observation {
    /// Returns the amount of live entities.
    pub fn live(&self) -> usize {
        self.obs.len()
    }

    /// Returns the reward of `ent_id`, zero when the simulation reported none.
    pub fn reward(&self, ent_id: EntId) -> f32 {
        self.rewards.get(&ent_id).copied().unwrap_or_default()
    }
}

/// The world the orchestrator drives.
///
/// The simulation resolves action priorities itself, the orchestrator only hands over
/// one action per live entity.
pub trait Simulation {
    type Error: Error + Send + Sync + 'static;

    /// Builds the initial world, spawning entities through `spawn`.
    fn reset(&mut self, spawn: &mut dyn Spawn) -> Result<Observation, Self::Error>;

    /// Advances the world one tick using `actions`, spawning entities through `spawn`.
    fn step(&mut self, actions: &ActionMap, spawn: &mut dyn Spawn) -> Result<Observation, Self::Error>;

    /// Returns the simulation level statistics.
    fn logs(&self) -> RunLog;
}
