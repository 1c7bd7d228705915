use std::io;

use thiserror::Error;

/// The shard module's result type.
pub type Result<T> = std::result::Result<T, ShardError>;

/// Shard runtime failures.
#[derive(Debug, Error)]
pub enum ShardError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("unexpected message at round {round}: got {got}")]
    UnexpectedMessage { round: u64, got: &'static str },

    #[error("received a batch for shard {got}, but this is shard {expected}")]
    WrongShard { expected: usize, got: usize },

    #[error("parameter update length mismatch: got {got}, expected {expected}")]
    UpdateLength { expected: usize, got: usize },
}

/// Boundary conversion for binaries / I/O APIs.
impl From<ShardError> for io::Error {
    fn from(value: ShardError) -> Self {
        match value {
            ShardError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
