use std::{
    borrow::Cow,
    num::{NonZeroU32, NonZeroUsize},
};

use comms::{
    Deserialize, Serialize,
    msg::{Command, Msg, Payload},
    specs::{RunLog, ShardSpec},
};
use tokio::io;

struct MyStr<'a>(&'a str);

impl<'a> Serialize<'a> for MyStr<'_> {
    fn serialize(&'a self, _buf: &mut Vec<u8>) -> std::io::Result<Option<&'a [u8]>> {
        Ok(Some(self.0.as_bytes()))
    }
}

impl<'a> Deserialize<'a> for MyStr<'a> {
    fn deserialize(buf: &'a [u8]) -> std::io::Result<Self> {
        std::str::from_utf8(buf)
            .map(Self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[tokio::test]
async fn send_recv() {
    const SIZE: usize = 128;

    let msg = MyStr("Hello, world!");

    let (one, two) = io::duplex(SIZE);
    let (rx, tx) = io::split(one);
    let (_, mut tx) = comms::channel(rx, tx);

    tx.send(&msg).await.unwrap();

    let (rx, tx) = io::split(two);
    let (mut rx, _) = comms::channel(rx, tx);

    let mut buf = Vec::new();
    let s: MyStr = rx.recv_into(&mut buf).await.unwrap();

    assert_eq!(msg.0, s.0);
}

#[tokio::test]
async fn frames_keep_their_boundaries() {
    const SIZE: usize = 4096;

    let (one, two) = io::duplex(SIZE);
    let (rx, tx) = io::split(one);
    let (_, mut tx) = comms::channel(rx, tx);

    let spec = ShardSpec {
        index: 2,
        action_arity: vec![NonZeroU32::new(4).unwrap()],
        params: NonZeroUsize::new(8).unwrap(),
        seed: Some(7),
    };
    let mut log = RunLog::new();
    log.record("lifetime", 12.0);

    tx.send(&Msg::Control(Command::CreateShard(spec.clone())))
        .await
        .unwrap();
    tx.send(&Msg::Data(Payload::Log(Cow::Borrowed(&log))))
        .await
        .unwrap();
    tx.send(&Msg::Control(Command::Disconnect)).await.unwrap();

    let (rx, tx) = io::split(two);
    let (mut rx, _) = comms::channel(rx, tx);
    let mut buf = Vec::new();

    match rx.recv_into(&mut buf).await.unwrap() {
        Msg::Control(Command::CreateShard(got)) => assert_eq!(got, spec),
        msg => panic!("unexpected msg: {msg:?}"),
    }

    match rx.recv_into(&mut buf).await.unwrap() {
        Msg::Data(Payload::Log(got)) => assert_eq!(*got, log),
        msg => panic!("unexpected msg: {msg:?}"),
    }

    let msg: Msg = rx.recv_into(&mut buf).await.unwrap();
    assert!(matches!(msg, Msg::Control(Command::Disconnect)));
}
