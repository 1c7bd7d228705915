use std::num::{NonZeroU32, NonZeroUsize};

use comms::specs::{Action, Stimulus};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::error::{Result, ShardError};

/// The decision logic a shard runs for every entity it owns.
pub trait Policy: Send {
    /// Replaces the policy's parameters.
    ///
    /// # Errors
    /// `UpdateLength` if `params` doesn't have the policy's parameter count.
    fn load(&mut self, params: &[f32]) -> Result<()>;

    /// Decides one action for the entity that perceived `stimulus`.
    fn act(&mut self, stimulus: &Stimulus) -> Action;

    /// Estimates the value of the state described by `stimulus`.
    fn value(&self, _stimulus: &Stimulus) -> f32 {
        0.0
    }

    /// Returns the gradient accumulated since the last call, one value per parameter.
    fn backward(&mut self) -> Vec<f32>;
}

/// A baseline policy that picks every action argument uniformly at random.
///
/// It has nothing to learn, so its gradient is always zero.
pub struct RandomPolicy {
    arity: Vec<NonZeroU32>,
    params: Vec<f32>,
    rng: StdRng,
}

impl RandomPolicy {
    /// Creates a new `RandomPolicy`.
    ///
    /// # Arguments
    /// * `arity` - The amount of choices of every action head.
    /// * `params` - The length of the parameter vector, and thus of every gradient.
    /// * `seed` - The seed of the generator, taken from the os if missing.
    pub fn new(arity: Vec<NonZeroU32>, params: NonZeroUsize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            arity,
            params: vec![0.0; params.get()],
            rng,
        }
    }

    pub fn params(&self) -> &[f32] {
        &self.params
    }
}

impl Policy for RandomPolicy {
    fn load(&mut self, params: &[f32]) -> Result<()> {
        if params.len() != self.params.len() {
            return Err(ShardError::UpdateLength {
                expected: self.params.len(),
                got: params.len(),
            });
        }

        self.params.copy_from_slice(params);
        Ok(())
    }

    fn act(&mut self, _stimulus: &Stimulus) -> Action {
        let args = self
            .arity
            .iter()
            .map(|arity| self.rng.random_range(0..arity.get()))
            .collect();

        Action::new(args)
    }

    fn backward(&mut self) -> Vec<f32> {
        vec![0.0; self.params.len()]
    }
}
