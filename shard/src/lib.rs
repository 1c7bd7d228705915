pub mod builder;
pub mod error;
pub mod policy;
pub mod rollout;
pub mod shard;

pub use builder::ShardBuilder;
pub use error::{Result, ShardError};
pub use policy::{Policy, RandomPolicy};
pub use shard::Shard;

use comms::{
    OnoReceiver, OnoSender,
    msg::{Command, Msg},
};
use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};

/// Runs a shard after receiving a `CreateShard(ShardSpec)` control message.
///
/// A `Disconnect` before the bootstrap is acknowledged and ends the session.
pub async fn serve<R, W>(mut rx: OnoReceiver<R>, mut tx: OnoSender<W>) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    info!("waiting for CreateShard spec");

    let mut rx_buf = Vec::new();
    let spec = loop {
        match rx.recv_into(&mut rx_buf).await? {
            Msg::Control(Command::CreateShard(spec)) => break spec,
            Msg::Control(Command::Disconnect) => {
                info!("received Disconnect before bootstrap, exiting");
                tx.send(&Msg::Control(Command::Disconnect)).await?;
                return Ok(());
            }
            msg => warn!("expected CreateShard, got {}", msg.kind()),
        }
    };

    debug!(
        shard = spec.index,
        heads = spec.action_arity.len(),
        params = spec.params.get();
        "received shard spec"
    );

    let shard = ShardBuilder::build(spec);
    info!(shard = shard.index(); "shard ready");
    shard.run(rx, tx).await
}
