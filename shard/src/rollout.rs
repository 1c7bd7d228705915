use std::collections::BTreeMap;

use comms::specs::{Blob, EntId, PopId, Stimulus, Terminal};
use log::debug;

#[derive(Debug)]
struct Rollout {
    pop_id: PopId,
    lifetime: u32,
    reward: f32,
    value: f32,
}

impl Rollout {
    fn into_blob(self, ent_id: EntId) -> Blob {
        Blob {
            ent_id,
            pop_id: self.pop_id,
            lifetime: self.lifetime,
            reward: self.reward,
            value: self.value,
        }
    }
}

/// Tracks the rollout of every entity a shard owns until the entity leaves.
#[derive(Debug, Default)]
pub struct Rollouts {
    live: BTreeMap<EntId, Rollout>,
    finished: Vec<Blob>,
}

impl Rollouts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one tick of the entity that perceived `stimulus`.
    ///
    /// # Arguments
    /// * `stimulus` - The entity's observation of the tick.
    /// * `value` - The policy's value estimate for it.
    pub fn observe(&mut self, stimulus: &Stimulus, value: f32) {
        let rollout = self.live.entry(stimulus.ent_id).or_insert(Rollout {
            pop_id: stimulus.pop_id,
            lifetime: 0,
            reward: 0.0,
            value,
        });

        rollout.lifetime += 1;
        rollout.reward += stimulus.reward;
        rollout.value = value;

        if stimulus.done {
            self.finish(stimulus.ent_id, 0.0);
        }
    }

    /// Closes the rollout of an entity that left the simulation.
    pub fn terminate(&mut self, terminal: &Terminal) {
        if !self.finish(terminal.ent_id, terminal.reward) {
            debug!(ent_id = terminal.ent_id; "terminal for an entity without rollout");
        }
    }

    fn finish(&mut self, ent_id: EntId, reward: f32) -> bool {
        let Some(mut rollout) = self.live.remove(&ent_id) else {
            return false;
        };

        rollout.reward += reward;
        self.finished.push(rollout.into_blob(ent_id));
        true
    }

    /// Returns the amount of rollouts still open.
    pub fn live(&self) -> usize {
        self.live.len()
    }

    /// Moves out every rollout finished since the last drain.
    pub fn drain(&mut self) -> Vec<Blob> {
        std::mem::take(&mut self.finished)
    }
}
