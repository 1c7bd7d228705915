use comms::specs::ShardSpec;

use crate::{Shard, policy::RandomPolicy};

pub struct ShardBuilder;

impl ShardBuilder {
    /// Builds a `Shard` from a `ShardSpec`.
    ///
    /// # Args
    /// * `spec` - Bootstrap specification received from the orchestrator.
    ///
    /// # Returns
    /// A fully initialized `Shard` running the baseline random policy.
    pub fn build(spec: ShardSpec) -> Shard {
        let seed = spec.seed.map(|seed| seed.wrapping_add(spec.index as u64));
        let policy = RandomPolicy::new(spec.action_arity, spec.params, seed);
        Shard::new(spec.index, Box::new(policy))
    }
}
