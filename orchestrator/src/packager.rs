use std::num::NonZeroUsize;

use comms::specs::{EntId, InputBatch, Stimulus, Terminal};

use crate::{
    error::{OrchestratorError, Result},
    simulation::Observation,
};

/// Groups a tick's observations by the shard that owns each entity.
///
/// Returns exactly one batch per shard, indexed by shard, empty batches included so
/// that every shard takes part in every round. Live entities become stimuli, entities
/// that left the simulation this tick become terminals carrying their last reward.
///
/// # Arguments
/// * `observation` - The observation cached from the last simulation step.
/// * `shards` - The amount of shards of the topology.
/// * `shard_of` - The partitioning function.
///
/// # Errors
/// Returns `ShardOutOfRange` if `shard_of` maps an entity outside of `[0, shards)`.
pub fn package<F>(
    observation: &Observation,
    shards: NonZeroUsize,
    shard_of: F,
) -> Result<Vec<InputBatch>>
where
    F: Fn(EntId) -> usize,
{
    let mut batches: Vec<_> = (0..shards.get()).map(InputBatch::new).collect();

    let route = |ent_id: EntId| -> Result<usize> {
        let shard = shard_of(ent_id);
        if shard >= shards.get() {
            return Err(OrchestratorError::ShardOutOfRange {
                ent_id,
                shard,
                shards: shards.get(),
            });
        }

        Ok(shard)
    };

    for (&ent_id, percept) in &observation.obs {
        let shard = route(ent_id)?;
        batches[shard].stimuli.push(Stimulus {
            ent_id,
            pop_id: percept.pop_id,
            features: percept.features.clone(),
            reward: observation.reward(ent_id),
            done: observation.dones.contains(&ent_id),
        });
    }

    let departed = observation
        .dones
        .iter()
        .filter(|ent_id| !observation.obs.contains_key(*ent_id));

    for &ent_id in departed {
        let shard = route(ent_id)?;
        batches[shard].terminals.push(Terminal {
            ent_id,
            reward: observation.reward(ent_id),
        });
    }

    Ok(batches)
}
