use std::array::TryFromSliceError;
use std::net::AddrParseError;
use std::str::Utf8Error;
use thiserror::Error;

/// Errors shared between the Shoal replication protocol and the replica runtime.
///
/// The variants fall into the taxonomy used across the replication core:
/// serialization failures (`CannotSerializeCommand`, `InvalidCommand`, ...) abort
/// the affected send without retrying, transport failures (`IoError`, `Disconnected`, ...)
/// are surfaced to the caller which owns the retry policy, and storage failures
/// (`CannotAppendToBinlog`, `CannotApplyWrite`) are reported without stopping the
/// worker that hit them.
#[derive(Debug, Error)]
pub enum ShoalError {
    #[error("Invalid configuration")]
    InvalidConfiguration,
    #[error("Invalid command")]
    InvalidCommand,
    #[error("Invalid command code: {0}")]
    InvalidCommandCode(u32),
    #[error("Cannot serialize command")]
    CannotSerializeCommand,
    #[error("Invalid table name")]
    InvalidTableName,
    #[error("Invalid replica address")]
    InvalidReplicaAddress,
    #[error("Invalid auth token")]
    InvalidAuthToken,
    #[error("Invalid binlog offset")]
    InvalidBinlogOffset,
    #[error("Empty store command")]
    EmptyStoreCommand,
    #[error("Master not found")]
    MasterNotFound,
    #[error("Not connected")]
    NotConnected,
    #[error("Disconnected")]
    Disconnected,
    #[error("Cannot establish connection to {0}")]
    CannotEstablishConnection(String),
    #[error("Cannot append to binlog for partition {0}: {1}")]
    CannotAppendToBinlog(String, String),
    #[error("Cannot apply write to partition {0}: {1}")]
    CannotApplyWrite(String, String),
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Cannot parse integer")]
    CannotParseSlice(#[from] TryFromSliceError),
    #[error("Cannot parse UTF8")]
    CannotParseUtf8(#[from] Utf8Error),
    #[error("Cannot parse address")]
    CannotParseAddress(#[from] AddrParseError),
}
