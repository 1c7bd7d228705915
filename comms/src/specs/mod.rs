mod round;
mod shard;
mod telemetry;

pub use round::{Action, ActionMap, EntId, InputBatch, PopId, RoundArgs, RoundResponse, Stimulus, Terminal};
pub use shard::ShardSpec;
pub use telemetry::{Blob, RunLog, TelemetrySummary};
