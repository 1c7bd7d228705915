/// Whether the current tick only decides actions or also collects gradients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    #[default]
    Accumulating,
    /// A one tick pulse, shards compute and return gradients this tick.
    Armed,
}

impl BatchState {
    pub fn is_armed(self) -> bool {
        self == Self::Armed
    }
}

/// Counts entity-steps and arms a backward tick once the count exceeds the threshold.
#[derive(Debug, Clone)]
pub struct BatchPolicy {
    threshold: u64,
    evaluation: bool,
    entity_steps: u64,
    state: BatchState,
}

impl BatchPolicy {
    /// Creates a new `BatchPolicy`.
    ///
    /// # Arguments
    /// * `threshold` - The cumulative entity-steps that have to be exceeded to arm.
    /// * `evaluation` - Evaluation policies never arm.
    pub fn new(threshold: u64, evaluation: bool) -> Self {
        Self {
            threshold,
            evaluation,
            entity_steps: 0,
            state: BatchState::Accumulating,
        }
    }

    /// Advances the policy by one tick that processes `live` entities.
    ///
    /// # Returns
    /// The state of the tick about to run.
    pub fn advance(&mut self, live: usize) -> BatchState {
        self.state = BatchState::Accumulating;
        self.entity_steps += live as u64;

        if !self.evaluation && self.entity_steps > self.threshold {
            self.entity_steps = 0;
            self.state = BatchState::Armed;
        }

        self.state
    }

    /// Returns the state of the last advanced tick.
    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Returns the entity-steps accumulated since the last armed tick.
    pub fn entity_steps(&self) -> u64 {
        self.entity_steps
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn is_evaluation(&self) -> bool {
        self.evaluation
    }
}
