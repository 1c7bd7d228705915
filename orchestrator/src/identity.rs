use std::num::NonZeroU32;

use comms::specs::{EntId, PopId};

/// The identity handed to the simulation for every new entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub ent_id: EntId,
    pub pop_id: PopId,
    /// The simulation appends the entity id to it to build the entity's name.
    pub name_prefix: String,
}

/// The callback the simulation invokes whenever it creates an entity.
pub trait Spawn {
    fn spawn(&mut self) -> Identity;
}

/// Hands out strictly increasing entity ids, never reusing one, and assigns
/// each entity a population.
#[derive(Debug, Clone)]
pub struct IdentityAllocator {
    spawned: EntId,
    population: NonZeroU32,
    name_prefix: String,
}

impl IdentityAllocator {
    /// Creates a new `IdentityAllocator`.
    ///
    /// # Arguments
    /// * `population` - The amount of populations to spread entities across.
    /// * `name_prefix` - The name prefix given to every entity.
    pub fn new(population: NonZeroU32, name_prefix: impl Into<String>) -> Self {
        Self {
            spawned: 0,
            population,
            name_prefix: name_prefix.into(),
        }
    }

    /// Returns the amount of entities spawned so far, which is also the last handed out id.
    pub fn spawned(&self) -> EntId {
        self.spawned
    }

    pub fn population(&self) -> NonZeroU32 {
        self.population
    }
}

impl Spawn for IdentityAllocator {
    fn spawn(&mut self) -> Identity {
        let pop_id = population_of(self.spawned, self.population);
        self.spawned += 1;

        Identity {
            ent_id: self.spawned,
            pop_id,
            name_prefix: self.name_prefix.clone(),
        }
    }
}

/// Assigns a population from the CRC-32 of the decimal form of `seed`.
///
/// Entity `n` is assigned `population_of(n - 1, ..)`. Changing the hash changes
/// which entities share a policy group across runs.
pub fn population_of(seed: EntId, population: NonZeroU32) -> PopId {
    crc32fast::hash(seed.to_string().as_bytes()) % population.get()
}
