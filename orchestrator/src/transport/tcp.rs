use std::{borrow::Cow, io, net::SocketAddr};

use comms::{
    OnoReceiver, OnoSender,
    msg::{Command, Msg, Payload},
    specs::{InputBatch, RoundArgs, RoundResponse, RunLog, ShardSpec},
};
use futures::future;
use log::{debug, info};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};

use super::{Pending, ShardHandle, Transport};
use crate::error::TransportError;

/// The starting size of the receiver buffer.
const STARTING_RX_BUF_SIZE: usize = 1028;

/// The connection to a single shard.
struct ShardLink<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    index: usize,
    endpoint: String,
    rx: OnoReceiver<R>,
    tx: OnoSender<W>,
    rx_buf: Vec<u8>,
}

impl<R, W> ShardLink<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send_round(&mut self, args: &RoundArgs, batch: &InputBatch) -> io::Result<()> {
        let msg = Msg::Data(Payload::Round {
            args: Cow::Borrowed(args),
            batch: Cow::Borrowed(batch),
        });

        self.tx.send(&msg).await
    }

    async fn recv_response(&mut self, tick: u64) -> Result<RoundResponse, TransportError> {
        let shard = self.index;

        let response = match self.rx.recv_into(&mut self.rx_buf).await? {
            Msg::Data(Payload::Response(response)) => response.into_owned(),
            Msg::Err(detail) => {
                let detail = detail.into_owned();
                return Err(TransportError::Remote { shard, detail });
            }
            msg => {
                let got = msg.kind();
                return Err(TransportError::UnexpectedMessage { shard, got });
            }
        };

        if response.shard != shard {
            return Err(TransportError::ShardMismatch {
                expected: shard,
                got: response.shard,
            });
        }

        if response.tick != tick {
            return Err(TransportError::RoundMismatch {
                shard,
                expected: tick,
                got: response.tick,
            });
        }

        Ok(response)
    }

    /// Sends `command`, either `QueryLogs` or `TakeLogs`, and waits for the log.
    async fn query_logs(&mut self, command: Command) -> Result<RunLog, TransportError> {
        let shard = self.index;
        self.tx.send(&Msg::Control(command)).await?;

        match self.rx.recv_into(&mut self.rx_buf).await? {
            Msg::Data(Payload::Log(log)) => Ok(log.into_owned()),
            Msg::Err(detail) => {
                let detail = detail.into_owned();
                Err(TransportError::Remote { shard, detail })
            }
            msg => {
                let got = msg.kind();
                Err(TransportError::UnexpectedMessage { shard, got })
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        let msg = Msg::Control(Command::Disconnect);
        self.tx.send(&msg).await?;

        while !matches!(
            self.rx.recv_into(&mut self.rx_buf).await?,
            Msg::Control(Command::Disconnect)
        ) {}

        Ok(())
    }
}

/// A transport that talks to every shard through its own byte stream.
///
/// Rounds are scattered and gathered concurrently across shards.
pub struct NetTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    links: Vec<ShardLink<R, W>>,
}

/// A transport over TCP connections.
pub type TcpTransport = NetTransport<OwnedReadHalf, OwnedWriteHalf>;

impl TcpTransport {
    /// Connects to every shard and bootstraps it.
    ///
    /// # Arguments
    /// * `addrs` - The network addresses of the shards, the `i`th one becomes shard `i`.
    /// * `template` - The shard specification, its index is overwritten per shard.
    ///
    /// # Returns
    /// A new `TcpTransport` or an io error if any shard couldn't be reached.
    pub async fn connect(addrs: Vec<SocketAddr>, template: ShardSpec) -> io::Result<Self> {
        let mut channels = Vec::with_capacity(addrs.len());

        for addr in addrs {
            let stream = TcpStream::connect(addr).await?;
            let (rx, tx) = stream.into_split();
            let (rx, tx) = comms::channel(rx, tx);
            info!("connected to shard at {addr}");
            channels.push((addr.to_string(), rx, tx));
        }

        Self::bootstrap(channels, template).await
    }
}

impl<R, W> NetTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Creates the shards on the other end of already open channels.
    ///
    /// # Arguments
    /// * `channels` - The endpoint description and channel of every shard, indexed by shard.
    /// * `template` - The shard specification, its index is overwritten per shard.
    ///
    /// # Returns
    /// A new `NetTransport` or an io error if any `CreateShard` couldn't be sent.
    pub async fn bootstrap(
        channels: Vec<(String, OnoReceiver<R>, OnoSender<W>)>,
        template: ShardSpec,
    ) -> io::Result<Self> {
        let mut links = Vec::with_capacity(channels.len());

        for (index, (endpoint, rx, mut tx)) in channels.into_iter().enumerate() {
            let spec = ShardSpec {
                index,
                ..template.clone()
            };
            tx.send(&Msg::Control(Command::CreateShard(spec))).await?;
            debug!(shard = index; "sent shard spec");

            links.push(ShardLink {
                index,
                endpoint,
                rx,
                tx,
                rx_buf: vec![0; STARTING_RX_BUF_SIZE],
            });
        }

        Ok(Self { links })
    }

    /// Tells every shard to stop and waits for their acknowledgement.
    ///
    /// # Errors
    /// The first failure of any shard.
    pub async fn disconnect(mut self) -> Result<(), TransportError> {
        let futs = self.links.iter_mut().map(|link| link.disconnect());
        future::try_join_all(futs).await?;
        info!("all shards disconnected");
        Ok(())
    }
}

impl<R, W> Transport for NetTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn shards(&self) -> Vec<ShardHandle> {
        self.links
            .iter()
            .map(|link| ShardHandle {
                index: link.index,
                endpoint: link.endpoint.clone(),
            })
            .collect()
    }

    async fn scatter(
        &mut self,
        batches: Vec<InputBatch>,
        args: RoundArgs,
    ) -> Result<Pending, TransportError> {
        if batches.len() != self.links.len() {
            return Err(TransportError::ShardCount {
                expected: self.links.len(),
                got: batches.len(),
            });
        }

        let args = &args;
        let futs = self
            .links
            .iter_mut()
            .zip(&batches)
            .map(|(link, batch)| link.send_round(args, batch));

        future::try_join_all(futs).await?;

        Ok(Pending {
            tick: args.tick,
            shards: self.links.len(),
        })
    }

    async fn gather(&mut self, pending: Pending) -> Result<Vec<RoundResponse>, TransportError> {
        if pending.shards != self.links.len() {
            return Err(TransportError::ShardCount {
                expected: self.links.len(),
                got: pending.shards,
            });
        }

        let futs = self
            .links
            .iter_mut()
            .map(|link| link.recv_response(pending.tick));

        future::try_join_all(futs).await
    }

    async fn shard_logs(&mut self) -> Result<Vec<RunLog>, TransportError> {
        let futs = self
            .links
            .iter_mut()
            .map(|link| link.query_logs(Command::QueryLogs));
        future::try_join_all(futs).await
    }

    async fn take_shard_logs(&mut self) -> Result<Vec<RunLog>, TransportError> {
        let futs = self
            .links
            .iter_mut()
            .map(|link| link.query_logs(Command::TakeLogs));
        future::try_join_all(futs).await
    }
}
