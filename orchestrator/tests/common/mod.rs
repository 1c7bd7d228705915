#![allow(dead_code)]

use std::collections::BTreeSet;

use comms::specs::{
    Action, ActionMap, Blob, EntId, InputBatch, RoundArgs, RoundResponse, RunLog,
    TelemetrySummary,
};
use orchestrator::{
    LocalTransport, Observation, OrchestratorConfig, Percept, ShardHandler, Simulation, Spawn,
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("no action for entity {0}")]
pub struct NoAction(pub EntId);

/// A deterministic world where every entity walks along a line by its action's first argument.
pub struct GridSim {
    seed_ids: Vec<EntId>,
    spawn: usize,
    obs: Observation,
    pub steps: usize,
    pub last_actions: ActionMap,
    /// Entities removed from the world on the given step.
    pub deaths: Vec<(usize, EntId)>,
}

impl GridSim {
    /// A world with exactly `ids`, all in population 0.
    pub fn with_ids(ids: &[EntId]) -> Self {
        Self {
            seed_ids: ids.to_vec(),
            spawn: 0,
            obs: Observation::default(),
            steps: 0,
            last_actions: ActionMap::new(),
            deaths: Vec::new(),
        }
    }

    /// A world that spawns `n` entities through the allocator on reset.
    pub fn spawning(n: usize) -> Self {
        Self {
            spawn: n,
            ..Self::with_ids(&[])
        }
    }

    pub fn position(&self, ent_id: EntId) -> Option<f32> {
        self.obs.obs.get(&ent_id).map(|p| p.features[0])
    }
}

impl Simulation for GridSim {
    type Error = NoAction;

    fn reset(&mut self, spawn: &mut dyn Spawn) -> Result<Observation, Self::Error> {
        let mut obs = Observation::default();

        for &ent_id in &self.seed_ids {
            let percept = Percept {
                pop_id: 0,
                features: vec![0.0],
            };
            obs.obs.insert(ent_id, percept);
        }

        for _ in 0..self.spawn {
            let identity = spawn.spawn();
            let percept = Percept {
                pop_id: identity.pop_id,
                features: vec![0.0],
            };
            obs.obs.insert(identity.ent_id, percept);
        }

        self.obs = obs.clone();
        Ok(obs)
    }

    fn step(&mut self, actions: &ActionMap, _spawn: &mut dyn Spawn) -> Result<Observation, Self::Error> {
        self.steps += 1;

        let mut next = Observation::default();
        let dying: BTreeSet<_> = self
            .deaths
            .iter()
            .filter(|(step, _)| *step == self.steps)
            .map(|(_, ent_id)| *ent_id)
            .collect();

        for (&ent_id, percept) in &self.obs.obs {
            let action = actions.get(&ent_id).ok_or(NoAction(ent_id))?;
            next.rewards.insert(ent_id, 1.0);

            if dying.contains(&ent_id) {
                next.dones.insert(ent_id);
                continue;
            }

            let mut percept = percept.clone();
            percept.features[0] += action.args[0] as f32;
            next.obs.insert(ent_id, percept);
        }

        self.last_actions = actions.clone();
        self.obs = next.clone();
        Ok(next)
    }

    fn logs(&self) -> RunLog {
        let mut log = RunLog::new();
        log.record("sim/steps", self.steps as f64);
        log
    }
}

/// Answers every stimulus with a step of one, on backward rounds every shard
/// returns a gradient filled with the tick and one blob per stimulus.
pub fn stepper(params: usize) -> impl FnMut(&RoundArgs, InputBatch) -> RoundResponse + Send {
    move |args: &RoundArgs, batch: InputBatch| {
        let actions = batch
            .stimuli
            .iter()
            .map(|s| (s.ent_id, Action::new(vec![1])))
            .collect();

        let (gradient, telemetry) = if args.backward {
            let blobs = batch
                .stimuli
                .iter()
                .map(|s| Blob {
                    ent_id: s.ent_id,
                    pop_id: s.pop_id,
                    lifetime: args.tick as u32,
                    reward: s.reward,
                    value: 0.0,
                })
                .collect();

            (
                Some(vec![args.tick as f32; params]),
                TelemetrySummary::new(blobs),
            )
        } else {
            (None, TelemetrySummary::default())
        };

        RoundResponse {
            shard: batch.shard,
            tick: args.tick,
            actions,
            gradient,
            telemetry,
        }
    }
}

/// A stepper that also counts its rounds into its log.
pub struct CountingShard {
    rounds: usize,
    params: usize,
}

impl CountingShard {
    pub fn new(params: usize) -> Self {
        Self { rounds: 0, params }
    }
}

impl ShardHandler for CountingShard {
    fn handle(&mut self, args: &RoundArgs, batch: InputBatch) -> RoundResponse {
        self.rounds += 1;
        let mut step = stepper(self.params);
        step(args, batch)
    }

    fn logs(&self) -> RunLog {
        let mut log = RunLog::new();
        log.record("shard/rounds", self.rounds as f64);
        log
    }

    fn take_logs(&mut self) -> RunLog {
        let log = self.logs();
        self.rounds = 0;
        log
    }
}

pub fn local(shards: usize, params: usize) -> LocalTransport {
    let handlers = (0..shards)
        .map(|_| Box::new(CountingShard::new(params)) as Box<dyn ShardHandler>)
        .collect();
    LocalTransport::new(handlers)
}

pub fn config(shards: usize, threshold: u64) -> OrchestratorConfig {
    OrchestratorConfig::new(shards, 4, threshold)
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
