use std::{borrow::Cow, mem};

use comms::{
    OnoReceiver, OnoSender,
    msg::{Command, Msg, Payload},
    specs::{ActionMap, InputBatch, RoundArgs, RoundResponse, RunLog, TelemetrySummary},
};
use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    error::{Result, ShardError},
    policy::Policy,
    rollout::Rollouts,
};

/// The starting size of the receiver buffer.
const STARTING_RX_BUF_SIZE: usize = 1028;

/// Decides the actions of the entities one orchestrator assigns to it.
pub struct Shard {
    index: usize,
    policy: Box<dyn Policy>,
    rollouts: Rollouts,
    log: RunLog,
    rounds: u64,
}

impl Shard {
    /// Creates a new `Shard`.
    ///
    /// # Arguments
    /// * `index` - The shard's index inside the orchestrator's topology.
    /// * `policy` - The decision logic.
    pub fn new(index: usize, policy: Box<dyn Policy>) -> Self {
        Self {
            index,
            policy,
            rollouts: Rollouts::new(),
            log: RunLog::new(),
            rounds: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the amount of rounds served so far.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Returns the statistics recorded since the last `TakeLogs`.
    pub fn log(&self) -> &RunLog {
        &self.log
    }

    /// Answers a single round.
    ///
    /// Loads the update if there's one, decides an action for every stimulus and,
    /// on backward rounds, adds the policy's gradient and the finished rollouts.
    ///
    /// # Errors
    /// `WrongShard` if the batch belongs to another shard, `UpdateLength` if the
    /// update doesn't fit the policy.
    pub fn handle_round(&mut self, args: &RoundArgs, batch: &InputBatch) -> Result<RoundResponse> {
        if batch.shard != self.index {
            return Err(ShardError::WrongShard {
                expected: self.index,
                got: batch.shard,
            });
        }

        if let Some(update) = &args.update {
            self.policy.load(update)?;
            debug!(shard = self.index, tick = args.tick; "loaded parameter update");
        }

        let mut actions = ActionMap::new();
        for stimulus in &batch.stimuli {
            let value = self.policy.value(stimulus);
            actions.insert(stimulus.ent_id, self.policy.act(stimulus));
            self.rollouts.observe(stimulus, value);
        }

        for terminal in &batch.terminals {
            self.rollouts.terminate(terminal);
        }

        self.rounds += 1;
        self.log.record("shard/decisions", actions.len() as f64);

        let (gradient, telemetry) = if args.backward {
            let blobs = self.rollouts.drain();
            for blob in &blobs {
                self.log.record("shard/lifetime", blob.lifetime as f64);
                self.log.record("shard/reward", blob.reward as f64);
            }

            (Some(self.policy.backward()), TelemetrySummary::new(blobs))
        } else {
            (None, TelemetrySummary::default())
        };

        Ok(RoundResponse {
            shard: self.index,
            tick: args.tick,
            actions,
            gradient,
            telemetry,
        })
    }

    /// Serves rounds until the orchestrator disconnects.
    ///
    /// # Arguments
    /// * `rx` - Receiving end of the orchestrator channel.
    /// * `tx` - Sending end of the orchestrator channel.
    ///
    /// # Errors
    /// `ShardError` on io failures or protocol violations, reported to the
    /// orchestrator before returning when possible.
    pub async fn run<R, W>(mut self, mut rx: OnoReceiver<R>, mut tx: OnoSender<W>) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let mut rx_buf = vec![0; STARTING_RX_BUF_SIZE];

        loop {
            let msg: Msg = rx.recv_into(&mut rx_buf).await?;

            let result = match msg {
                Msg::Data(Payload::Round { args, batch }) => {
                    match self.handle_round(&args, &batch) {
                        Ok(response) => {
                            let msg = Msg::Data(Payload::Response(Cow::Owned(response)));
                            tx.send(&msg).await?;
                            Ok(())
                        }
                        Err(e) => Err(e),
                    }
                }
                Msg::Control(Command::QueryLogs) => {
                    tx.send(&Msg::Data(Payload::Log(Cow::Borrowed(&self.log))))
                        .await?;
                    Ok(())
                }
                Msg::Control(Command::TakeLogs) => {
                    let log = mem::take(&mut self.log);
                    tx.send(&Msg::Data(Payload::Log(Cow::Owned(log)))).await?;
                    Ok(())
                }
                Msg::Control(Command::Disconnect) => {
                    info!(shard = self.index, rounds = self.rounds; "disconnect received");
                    tx.send(&Msg::Control(Command::Disconnect)).await?;
                    break;
                }
                other => Err(ShardError::UnexpectedMessage {
                    round: self.rounds,
                    got: other.kind(),
                }),
            };

            if let Err(e) = result {
                warn!(shard = self.index, round = self.rounds; "{e}");
                let msg = Msg::Err(Cow::Owned(e.to_string()));
                tx.send(&msg).await?;
                return Err(e);
            }
        }

        Ok(())
    }
}
