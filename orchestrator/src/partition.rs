use std::num::NonZeroUsize;

use comms::specs::EntId;

/// Maps entities to the shard responsible for deciding their actions.
///
/// The mapping is a pure function of the entity id and the shard count, so an entity
/// stays with the same shard for as long as the topology lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioner {
    shards: NonZeroUsize,
}

impl Partitioner {
    /// Creates a new `Partitioner`.
    ///
    /// # Arguments
    /// * `shards` - The fixed amount of shards of the topology.
    pub fn new(shards: NonZeroUsize) -> Self {
        Self { shards }
    }

    /// Returns the amount of shards of the topology.
    pub fn shards(&self) -> NonZeroUsize {
        self.shards
    }

    /// Returns the index of the shard that owns `ent_id`.
    pub fn shard_of(&self, ent_id: EntId) -> usize {
        (ent_id % self.shards.get() as u64) as usize
    }
}
