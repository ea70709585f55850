use crate::bytes_serializable::BytesSerializable;
use crate::error::ShoalError;
use crate::replication::binlog_push::BinlogPush;
use crate::replication::binlog_sync::BinlogSync;
use crate::replication::db_sync::DbSync;
use crate::replication::meta_sync::MetaSync;
use crate::replication::try_sync::TrySync;
use crate::validatable::Validatable;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt::{Debug, Display, Formatter};

pub const META_SYNC: &str = "replica.meta_sync";
pub const META_SYNC_CODE: u32 = 10;
pub const TRY_SYNC: &str = "replica.try_sync";
pub const TRY_SYNC_CODE: u32 = 11;
pub const DB_SYNC: &str = "replica.db_sync";
pub const DB_SYNC_CODE: u32 = 12;
pub const BINLOG_SYNC: &str = "replica.binlog_sync";
pub const BINLOG_SYNC_CODE: u32 = 13;
pub const BINLOG_PUSH: &str = "replica.binlog_push";
pub const BINLOG_PUSH_CODE: u32 = 14;

/// The trait represents an outbound replication protocol command.
pub trait Command: BytesSerializable + Validatable<ShoalError> + Send + Sync + Debug + Display {
    /// Numeric code of the command, the type tag of the request envelope.
    fn code(&self) -> u32;
}

pub fn get_name_from_code(code: u32) -> Result<&'static str, ShoalError> {
    match code {
        META_SYNC_CODE => Ok(META_SYNC),
        TRY_SYNC_CODE => Ok(TRY_SYNC),
        DB_SYNC_CODE => Ok(DB_SYNC),
        BINLOG_SYNC_CODE => Ok(BINLOG_SYNC),
        BINLOG_PUSH_CODE => Ok(BINLOG_PUSH),
        _ => Err(ShoalError::InvalidCommandCode(code)),
    }
}

/// `ReplicationRequest` is the top-level request envelope written to a peer's
/// replication port: a 4-byte little-endian command code selecting the variant,
/// followed by the serialized payload.
#[derive(Debug, PartialEq)]
pub enum ReplicationRequest {
    MetaSync(MetaSync),
    TrySync(TrySync),
    DbSync(DbSync),
    BinlogSync(BinlogSync),
    BinlogPush(BinlogPush),
}

impl ReplicationRequest {
    pub fn code(&self) -> u32 {
        match self {
            ReplicationRequest::MetaSync(payload) => payload.code(),
            ReplicationRequest::TrySync(payload) => payload.code(),
            ReplicationRequest::DbSync(payload) => payload.code(),
            ReplicationRequest::BinlogSync(payload) => payload.code(),
            ReplicationRequest::BinlogPush(payload) => payload.code(),
        }
    }
}

impl Validatable<ShoalError> for ReplicationRequest {
    fn validate(&self) -> Result<(), ShoalError> {
        match self {
            ReplicationRequest::MetaSync(payload) => payload.validate(),
            ReplicationRequest::TrySync(payload) => payload.validate(),
            ReplicationRequest::DbSync(payload) => payload.validate(),
            ReplicationRequest::BinlogSync(payload) => payload.validate(),
            ReplicationRequest::BinlogPush(payload) => payload.validate(),
        }
    }
}

impl BytesSerializable for ReplicationRequest {
    fn to_bytes(&self) -> Bytes {
        let payload = match self {
            ReplicationRequest::MetaSync(payload) => payload.to_bytes(),
            ReplicationRequest::TrySync(payload) => payload.to_bytes(),
            ReplicationRequest::DbSync(payload) => payload.to_bytes(),
            ReplicationRequest::BinlogSync(payload) => payload.to_bytes(),
            ReplicationRequest::BinlogPush(payload) => payload.to_bytes(),
        };
        let mut bytes = BytesMut::with_capacity(4 + payload.len());
        bytes.put_u32_le(self.code());
        bytes.put_slice(&payload);
        bytes.freeze()
    }

    fn from_bytes(bytes: Bytes) -> Result<Self, ShoalError> {
        if bytes.len() < 4 {
            return Err(ShoalError::InvalidCommand);
        }

        let code = u32::from_le_bytes(bytes[0..4].try_into()?);
        let payload = bytes.slice(4..);
        match code {
            META_SYNC_CODE => Ok(ReplicationRequest::MetaSync(MetaSync::from_bytes(payload)?)),
            TRY_SYNC_CODE => Ok(ReplicationRequest::TrySync(TrySync::from_bytes(payload)?)),
            DB_SYNC_CODE => Ok(ReplicationRequest::DbSync(DbSync::from_bytes(payload)?)),
            BINLOG_SYNC_CODE => Ok(ReplicationRequest::BinlogSync(BinlogSync::from_bytes(
                payload,
            )?)),
            BINLOG_PUSH_CODE => Ok(ReplicationRequest::BinlogPush(BinlogPush::from_bytes(
                payload,
            )?)),
            _ => Err(ShoalError::InvalidCommandCode(code)),
        }
    }
}

impl Display for ReplicationRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplicationRequest::MetaSync(payload) => write!(f, "{META_SYNC}|{payload}"),
            ReplicationRequest::TrySync(payload) => write!(f, "{TRY_SYNC}|{payload}"),
            ReplicationRequest::DbSync(payload) => write!(f, "{DB_SYNC}|{payload}"),
            ReplicationRequest::BinlogSync(payload) => write!(f, "{BINLOG_SYNC}|{payload}"),
            ReplicationRequest::BinlogPush(payload) => write!(f, "{BINLOG_PUSH}|{payload}"),
        }
    }
}
