use std::collections::BTreeMap;

use comms::specs::{ActionMap, EntId, InputBatch, RoundResponse};
use log::warn;

use crate::{
    cycle::Cycle,
    error::{OrchestratorError, Result, TransportError},
};

/// Rebuilds the global action map out of the shards' responses.
///
/// Remembers which shard each entity of the round was sent to, so the
/// responses can be checked against the scatter they answer.
#[derive(Debug)]
pub struct Reassembler {
    owners: BTreeMap<EntId, usize>,
    shards: usize,
}

impl Reassembler {
    /// Creates a new `Reassembler` for the round that scatters `batches`.
    pub fn new(batches: &[InputBatch]) -> Self {
        let owners = batches
            .iter()
            .flat_map(|batch| batch.stimuli.iter().map(|s| (s.ent_id, batch.shard)))
            .collect();

        Self {
            owners,
            shards: batches.len(),
        }
    }

    /// Returns the amount of entities awaiting an action this round.
    pub fn expected(&self) -> usize {
        self.owners.len()
    }

    /// Merges the responses of a round into one action map.
    ///
    /// The responses may arrive in any order; they are processed by shard index,
    /// so the gradients pushed into `cycle` and thus their mean don't depend on it.
    /// Nothing is written into `cycle` unless the whole round is valid.
    ///
    /// # Arguments
    /// * `tick` - The tick the round was scattered for.
    /// * `backward` - Whether the round was armed, gradients are only collected then.
    /// * `responses` - Exactly one response per shard.
    /// * `cycle` - The open cycle gradients and telemetry are accumulated into.
    ///
    /// # Errors
    /// A `TransportError` if the set of responses doesn't match the scatter or a
    /// shard answered a backward round without a gradient, or a partition integrity
    /// error if the decided entities don't match the sent ones.
    pub fn reassemble(
        &self,
        tick: u64,
        backward: bool,
        responses: Vec<RoundResponse>,
        cycle: &mut Cycle,
    ) -> Result<ActionMap> {
        let mut slots: Vec<Option<RoundResponse>> = (0..self.shards).map(|_| None).collect();

        for response in responses {
            let shard = response.shard;
            let Some(slot) = slots.get_mut(shard) else {
                return Err(TransportError::ShardMismatch {
                    expected: self.shards - 1,
                    got: shard,
                }
                .into());
            };

            if response.tick != tick {
                return Err(TransportError::RoundMismatch {
                    shard,
                    expected: tick,
                    got: response.tick,
                }
                .into());
            }

            if slot.replace(response).is_some() {
                return Err(TransportError::DuplicateResponse { shard }.into());
            }
        }

        let mut actions = ActionMap::new();
        let mut contributions = Vec::with_capacity(if backward { self.shards } else { 0 });

        for (shard, slot) in slots.into_iter().enumerate() {
            let Some(response) = slot else {
                return Err(TransportError::MissingResponse { shard }.into());
            };

            for (ent_id, action) in response.actions {
                if actions.contains_key(&ent_id) {
                    return Err(OrchestratorError::DuplicateEntity { ent_id, shard });
                }

                if self.owners.get(&ent_id) != Some(&shard) {
                    return Err(OrchestratorError::UnexpectedEntity { ent_id, shard });
                }

                actions.insert(ent_id, action);
            }

            match (backward, response.gradient) {
                (true, Some(gradient)) if !gradient.is_empty() => {
                    contributions.push((gradient, response.telemetry));
                }
                (true, _) => return Err(TransportError::MissingGradient { shard, tick }.into()),
                (false, Some(_)) => {
                    warn!(shard = shard, tick = tick; "ignoring gradient of a forward round")
                }
                (false, None) => {}
            }
        }

        if let Some((&ent_id, &shard)) = self
            .owners
            .iter()
            .find(|(ent_id, _)| !actions.contains_key(*ent_id))
        {
            return Err(OrchestratorError::MissingEntity { ent_id, shard });
        }

        for (gradient, telemetry) in contributions {
            cycle.push_gradient(gradient);
            cycle.merge_telemetry(telemetry);
        }

        Ok(actions)
    }
}
