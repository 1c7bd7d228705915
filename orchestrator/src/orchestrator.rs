use std::time::{Duration, Instant};

use comms::specs::{RoundArgs, RunLog, TelemetrySummary};
use log::{debug, info};

use crate::{
    aggregation,
    batching::{BatchPolicy, BatchState},
    config::{OrchestratorConfig, Settings},
    cycle::Cycle,
    error::{OrchestratorError, Result},
    identity::IdentityAllocator,
    packager,
    partition::Partitioner,
    reassembly::Reassembler,
    simulation::{Observation, Simulation},
    telemetry::Merge,
    transport::{ShardHandle, Transport},
};

/// The result of a closed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// The mean of every gradient collected over the cycle.
    pub gradient: Vec<f32>,
    pub telemetry: TelemetrySummary,
    /// The shards', the simulation's and the orchestrator's statistics merged together.
    pub log: RunLog,
    pub ticks: usize,
    pub elapsed: Duration,
}

/// Drives a simulation through a pool of shards, one cycle per `step`.
pub struct Orchestrator<S, T>
where
    S: Simulation,
    T: Transport,
{
    settings: Settings,
    partitioner: Partitioner,
    identities: IdentityAllocator,
    policy: BatchPolicy,
    cycle: Cycle,
    simulation: S,
    transport: T,
    observation: Observation,
    tick: u64,
}

impl<S, T> Orchestrator<S, T>
where
    S: Simulation,
    T: Transport,
{
    /// Creates a new `Orchestrator` and resets the simulation.
    ///
    /// # Arguments
    /// * `config` - The orchestrator's configuration.
    /// * `simulation` - The world to drive.
    /// * `transport` - The connection to the shards.
    ///
    /// # Errors
    /// `InvalidConfig` if the configuration is invalid or doesn't match the transport's
    /// topology, `Simulation` if the simulation fails to reset.
    pub fn new(config: OrchestratorConfig, mut simulation: S, transport: T) -> Result<Self> {
        let settings = config.validate()?;

        let shards = transport.shards().len();
        if shards != settings.shards.get() {
            return Err(OrchestratorError::InvalidConfig(format!(
                "configured {} shard(s), but the transport connects {shards}",
                settings.shards
            )));
        }

        let mut identities =
            IdentityAllocator::new(settings.population, settings.name_prefix.clone());
        let observation = simulation
            .reset(&mut identities)
            .map_err(OrchestratorError::simulation)?;

        info!(
            shards = shards,
            live = observation.live(),
            populations = identities.population().get(),
            threshold = settings.server_updates;
            "orchestrator ready"
        );

        Ok(Self {
            partitioner: Partitioner::new(settings.shards),
            policy: BatchPolicy::new(settings.server_updates, settings.evaluation),
            identities,
            cycle: Cycle::default(),
            simulation,
            transport,
            observation,
            tick: 0,
            settings,
        })
    }

    /// Runs ticks until a backward tick closes the cycle.
    ///
    /// # Arguments
    /// * `update` - New policy parameters, only sent along the cycle's first tick.
    ///
    /// # Returns
    /// The cycle's report.
    ///
    /// # Errors
    /// `EvaluationMode` in evaluation mode, `CycleStalled` if the configured tick
    /// bound is hit, or the first error of any tick.
    pub async fn step(&mut self, mut update: Option<Vec<f32>>) -> Result<CycleReport> {
        if self.policy.is_evaluation() {
            return Err(OrchestratorError::EvaluationMode);
        }

        let start = Instant::now();
        self.cycle.reset();

        while !self.cycle.is_closed() {
            if let Some(max) = self.settings.max_ticks_per_cycle {
                if self.cycle.ticks() >= max.get() {
                    return Err(OrchestratorError::CycleStalled {
                        ticks: self.cycle.ticks(),
                    });
                }
            }

            self.tick(update.take()).await?;
        }

        let gradient = aggregation::aggregate(self.cycle.gradients())?;
        let telemetry = self.cycle.take_telemetry();
        let ticks = self.cycle.ticks();
        let elapsed = start.elapsed();

        let mut stats = RunLog::new();
        stats.record("orchestrator/ticks", ticks as f64);
        stats.record("orchestrator/step_seconds", elapsed.as_secs_f64());

        let shard_logs = self.transport.take_shard_logs().await?;
        let log = RunLog::merge_all(
            shard_logs
                .into_iter()
                .chain([self.simulation.logs(), stats]),
        );

        debug!(
            ticks = ticks,
            threshold = self.policy.threshold(),
            events = telemetry.events(),
            gradients = self.cycle.gradients().len();
            "cycle closed"
        );

        Ok(CycleReport {
            gradient,
            telemetry,
            log,
            ticks,
            elapsed,
        })
    }

    /// Runs a single scatter/gather round and steps the simulation with its actions.
    ///
    /// # Arguments
    /// * `update` - New policy parameters for the shards to load before deciding.
    ///
    /// # Returns
    /// The batch state the tick ran with.
    pub async fn tick(&mut self, update: Option<Vec<f32>>) -> Result<BatchState> {
        let state = self.policy.advance(self.observation.live());
        self.tick += 1;

        let partitioner = self.partitioner;
        let batches = packager::package(&self.observation, partitioner.shards(), |ent_id| {
            partitioner.shard_of(ent_id)
        })?;
        let reassembler = Reassembler::new(&batches);

        let args = RoundArgs {
            tick: self.tick,
            backward: state.is_armed(),
            update,
        };

        debug!(
            tick = self.tick,
            backward = args.backward,
            live = reassembler.expected();
            "scattering round"
        );

        let pending = self.transport.scatter(batches, args).await?;
        let responses = self.transport.gather(pending).await?;
        let actions =
            reassembler.reassemble(self.tick, state.is_armed(), responses, &mut self.cycle)?;

        self.observation = self
            .simulation
            .step(&actions, &mut self.identities)
            .map_err(OrchestratorError::simulation)?;
        self.cycle.record_tick();

        Ok(state)
    }

    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    /// Returns the simulation level statistics.
    pub fn simulation_log(&self) -> RunLog {
        self.simulation.logs()
    }

    pub fn shards(&self) -> Vec<ShardHandle> {
        self.transport.shards()
    }

    /// Returns a copy of the statistics every shard recorded during the current cycle.
    ///
    /// Monitoring only, the shards keep their logs for the next `CycleReport`.
    pub async fn shard_logs(&mut self) -> Result<Vec<RunLog>> {
        Ok(self.transport.shard_logs().await?)
    }

    /// Returns the observation the next tick will scatter.
    pub fn stimulus(&self) -> &Observation {
        &self.observation
    }

    pub fn cycle(&self) -> &Cycle {
        &self.cycle
    }

    pub fn policy(&self) -> &BatchPolicy {
        &self.policy
    }

    pub fn identities(&self) -> &IdentityAllocator {
        &self.identities
    }

    /// Returns the amount of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Tears the orchestrator apart, handing back the simulation and the transport.
    pub fn into_parts(self) -> (S, T) {
        (self.simulation, self.transport)
    }
}
