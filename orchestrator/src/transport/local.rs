use std::mem;

use comms::specs::{InputBatch, RoundArgs, RoundResponse, RunLog};

use super::{Pending, ShardHandle, Transport};
use crate::error::TransportError;

/// The decision logic of an in-process shard.
pub trait ShardHandler: Send {
    /// Answers one round.
    fn handle(&mut self, args: &RoundArgs, batch: InputBatch) -> RoundResponse;

    /// Returns the statistics recorded since the last `take_logs`.
    fn logs(&self) -> RunLog {
        RunLog::default()
    }

    /// Returns and clears the statistics recorded so far.
    fn take_logs(&mut self) -> RunLog {
        self.logs()
    }
}

impl<F> ShardHandler for F
where
    F: FnMut(&RoundArgs, InputBatch) -> RoundResponse + Send,
{
    fn handle(&mut self, args: &RoundArgs, batch: InputBatch) -> RoundResponse {
        self(args, batch)
    }
}

/// Runs every shard synchronously inside the orchestrator's process.
pub struct LocalTransport {
    handlers: Vec<Box<dyn ShardHandler>>,
    responses: Vec<RoundResponse>,
    reversed: bool,
}

impl LocalTransport {
    /// Creates a new `LocalTransport`, the `i`th handler serving shard `i`.
    pub fn new(handlers: Vec<Box<dyn ShardHandler>>) -> Self {
        Self {
            handlers,
            responses: Vec::new(),
            reversed: false,
        }
    }

    /// Makes `gather` return the responses in reverse shard order.
    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }
}

impl Transport for LocalTransport {
    fn shards(&self) -> Vec<ShardHandle> {
        (0..self.handlers.len())
            .map(|index| ShardHandle {
                index,
                endpoint: format!("local/{index}"),
            })
            .collect()
    }

    async fn scatter(
        &mut self,
        batches: Vec<InputBatch>,
        args: RoundArgs,
    ) -> Result<Pending, TransportError> {
        if batches.len() != self.handlers.len() {
            return Err(TransportError::ShardCount {
                expected: self.handlers.len(),
                got: batches.len(),
            });
        }

        self.responses = self
            .handlers
            .iter_mut()
            .zip(batches)
            .map(|(handler, batch)| handler.handle(&args, batch))
            .collect();

        if self.reversed {
            self.responses.reverse();
        }

        Ok(Pending {
            tick: args.tick,
            shards: self.handlers.len(),
        })
    }

    async fn gather(&mut self, pending: Pending) -> Result<Vec<RoundResponse>, TransportError> {
        let responses = mem::take(&mut self.responses);

        if responses.len() != pending.shards {
            return Err(TransportError::ShardCount {
                expected: pending.shards,
                got: responses.len(),
            });
        }

        Ok(responses)
    }

    async fn shard_logs(&mut self) -> Result<Vec<RunLog>, TransportError> {
        Ok(self.handlers.iter().map(|handler| handler.logs()).collect())
    }

    async fn take_shard_logs(&mut self) -> Result<Vec<RunLog>, TransportError> {
        Ok(self
            .handlers
            .iter_mut()
            .map(|handler| handler.take_logs())
            .collect())
    }
}
