use std::{borrow::Cow, io};

use crate::{
    Deserialize, Serialize,
    specs::{InputBatch, RoundArgs, RoundResponse, RunLog, ShardSpec},
};

type Header = u32;
const HEADER_SIZE: usize = size_of::<Header>();

const ERR_KIND: Header = 0;
const CONTROL_KIND: Header = 1;
const DATA_KIND: Header = 2;

/// The payload data for the `Data` variant of the `Msg` enum.
///
/// Sending sides borrow their data, receiving sides always get owned values.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload<'a> {
    /// One shard's share of a scatter round.
    Round {
        args: Cow<'a, RoundArgs>,
        batch: Cow<'a, InputBatch>,
    },
    /// A shard's answer to a `Round`.
    Response(Cow<'a, RoundResponse>),
    /// A shard's answer to `Command::QueryLogs` and `Command::TakeLogs`.
    Log(Cow<'a, RunLog>),
}

/// The command for the `Control` variant of the `Msg` enum.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    CreateShard(ShardSpec),
    /// Asks for a copy of the shard's statistics, leaving them in place.
    QueryLogs,
    /// Asks for the shard's statistics and clears them.
    TakeLogs,
    Disconnect,
}

/// The application layer message for the entire system.
#[derive(Debug)]
pub enum Msg<'a> {
    Control(Command),
    Data(Payload<'a>),
    Err(Cow<'a, str>),
}

impl Msg<'_> {
    /// A short, stable name of the message kind for logging and error reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Msg::Control(Command::CreateShard(_)) => "control/create_shard",
            Msg::Control(Command::QueryLogs) => "control/query_logs",
            Msg::Control(Command::TakeLogs) => "control/take_logs",
            Msg::Control(Command::Disconnect) => "control/disconnect",
            Msg::Data(Payload::Round { .. }) => "data/round",
            Msg::Data(Payload::Response(_)) => "data/response",
            Msg::Data(Payload::Log(_)) => "data/log",
            Msg::Err(_) => "err",
        }
    }

    fn buf_is_too_small<T>(size: usize) -> io::Result<T> {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("The given buffer is too small {size}, must at least be {HEADER_SIZE} bytes"),
        ))
    }

    fn invalid_kind<T>(kind: Header) -> io::Result<T> {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Received an invalid kind header {kind}"),
        ))
    }
}

impl<'a> Serialize<'a> for Msg<'a> {
    fn serialize(&'a self, buf: &mut Vec<u8>) -> io::Result<Option<&'a [u8]>> {
        match self {
            Msg::Err(e) => {
                buf.extend_from_slice(&ERR_KIND.to_be_bytes());
                Ok(Some(e.as_bytes()))
            }
            Msg::Control(cmd) => {
                buf.extend_from_slice(&CONTROL_KIND.to_be_bytes());
                serde_json::to_writer(buf, cmd)?;
                Ok(None)
            }
            Msg::Data(payload) => {
                buf.extend_from_slice(&DATA_KIND.to_be_bytes());
                serde_json::to_writer(buf, payload)?;
                Ok(None)
            }
        }
    }
}

impl<'a> Deserialize<'a> for Msg<'a> {
    fn deserialize(buf: &'a [u8]) -> io::Result<Self> {
        let Some((kind_buf, rest)) = buf.split_first_chunk::<HEADER_SIZE>() else {
            return Self::buf_is_too_small(buf.len());
        };

        match Header::from_be_bytes(*kind_buf) {
            ERR_KIND => {
                let string = std::str::from_utf8(rest)
                    .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

                Ok(Self::Err(Cow::Borrowed(string)))
            }
            CONTROL_KIND => {
                let cmd = serde_json::from_slice(rest)?;
                Ok(Self::Control(cmd))
            }
            DATA_KIND => {
                let payload = serde_json::from_slice(rest)?;
                Ok(Self::Data(payload))
            }
            kind => Self::invalid_kind(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::specs::{Action, Stimulus};

    fn frame(msg: &Msg<'_>) -> Vec<u8> {
        let mut buf = Vec::new();
        let tail = msg.serialize(&mut buf).unwrap();
        if let Some(tail) = tail {
            buf.extend_from_slice(tail);
        }
        buf
    }

    #[test]
    fn test_round_payload_comes_back_owned() {
        let args = RoundArgs {
            tick: 3,
            backward: true,
            update: Some(vec![0.5, -0.5]),
        };
        let batch = InputBatch {
            shard: 1,
            stimuli: vec![Stimulus {
                ent_id: 7,
                pop_id: 1,
                features: vec![1.0, 2.0],
                reward: 0.25,
                done: false,
            }],
            terminals: Vec::new(),
        };

        let msg = Msg::Data(Payload::Round {
            args: Cow::Borrowed(&args),
            batch: Cow::Borrowed(&batch),
        });
        let buf = frame(&msg);

        let Msg::Data(Payload::Round { args: got_args, batch: got_batch }) =
            Msg::deserialize(&buf).unwrap()
        else {
            panic!("unexpected message kind");
        };

        assert!(matches!(got_args, Cow::Owned(_)));
        assert_eq!(*got_args, args);
        assert_eq!(*got_batch, batch);
    }

    #[test]
    fn test_integer_keyed_actions_survive_json() {
        let actions = BTreeMap::from([(1, Action::new(vec![0, 2])), (9, Action::new(vec![1]))]);
        let response = RoundResponse {
            shard: 0,
            tick: 1,
            actions,
            gradient: None,
            telemetry: Default::default(),
        };

        let msg = Msg::Data(Payload::Response(Cow::Borrowed(&response)));
        let buf = frame(&msg);

        let Msg::Data(Payload::Response(got)) = Msg::deserialize(&buf).unwrap() else {
            panic!("unexpected message kind");
        };
        assert_eq!(*got, response);
    }

    #[test]
    fn test_err_is_borrowed_from_the_frame() {
        let msg = Msg::Err(Cow::Borrowed("shard exploded"));
        let buf = frame(&msg);

        let Msg::Err(text) = Msg::deserialize(&buf).unwrap() else {
            panic!("unexpected message kind");
        };
        assert!(matches!(text, Cow::Borrowed("shard exploded")));
    }

    #[test]
    fn test_shard_without_params_is_rejected() {
        let mut buf = CONTROL_KIND.to_be_bytes().to_vec();
        buf.extend_from_slice(
            br#"{"create_shard":{"index":0,"action_arity":[2],"params":0,"seed":null}}"#,
        );
        assert!(Msg::deserialize(&buf).is_err());

        let mut buf = CONTROL_KIND.to_be_bytes().to_vec();
        buf.extend_from_slice(
            br#"{"create_shard":{"index":0,"action_arity":[2],"params":3,"seed":null}}"#,
        );
        let Msg::Control(Command::CreateShard(spec)) = Msg::deserialize(&buf).unwrap() else {
            panic!("unexpected message kind");
        };
        assert_eq!(spec.params.get(), 3);
    }

    #[test]
    fn test_rejects_short_and_unknown_frames() {
        assert!(Msg::deserialize(&[0, 0]).is_err());
        assert!(Msg::deserialize(&[0, 0, 0, 9, b'{', b'}']).is_err());
    }
}
