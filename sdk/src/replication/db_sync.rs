use crate::bytes_serializable::BytesSerializable;
use crate::command::{Command, DB_SYNC_CODE};
use crate::error::ShoalError;
use crate::models::binlog_offset::BinlogOffset;
use crate::models::node::ReplicaNode;
use crate::models::partition::PartitionId;
use crate::validatable::Validatable;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// `DbSync` requests a full snapshot transfer of a partition, used when the
/// replica's local state is too stale for incremental catch-up.
/// It has additional payload:
/// - `node` - the replica's own identity.
/// - `partition` - the partition to transfer.
/// - `binlog_offset` - the replica's current (stale) position, reported for diagnostics.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Clone)]
pub struct DbSync {
    /// The replica's own identity.
    pub node: ReplicaNode,
    /// The partition to transfer.
    pub partition: PartitionId,
    /// The replica's current position in the partition's binlog.
    pub binlog_offset: BinlogOffset,
}

impl Command for DbSync {
    fn code(&self) -> u32 {
        DB_SYNC_CODE
    }
}

impl Validatable<ShoalError> for DbSync {
    fn validate(&self) -> Result<(), ShoalError> {
        self.node.validate()?;
        self.partition.validate()
    }
}

impl BytesSerializable for DbSync {
    fn to_bytes(&self) -> Bytes {
        let node_bytes = self.node.to_bytes();
        let partition_bytes = self.partition.to_bytes();
        let mut bytes = BytesMut::with_capacity(
            node_bytes.len() + partition_bytes.len() + BinlogOffset::WIRE_SIZE,
        );
        bytes.put_slice(&node_bytes);
        bytes.put_slice(&partition_bytes);
        bytes.put_slice(&self.binlog_offset.to_bytes());
        bytes.freeze()
    }

    fn from_bytes(bytes: Bytes) -> Result<DbSync, ShoalError> {
        let node = ReplicaNode::from_bytes(bytes.clone())?;
        let mut position = node.get_size_bytes();
        let partition = PartitionId::from_bytes(bytes.slice(position..))?;
        position += partition.get_size_bytes();
        let binlog_offset = BinlogOffset::from_bytes(bytes.slice(position..))?;
        Ok(DbSync {
            node,
            partition,
            binlog_offset,
        })
    }
}

impl Display for DbSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}|{}", self.node, self.partition, self.binlog_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_be_deserialized_from_bytes() {
        let command = DbSync {
            node: ReplicaNode::new("127.0.0.1", 9221),
            partition: PartitionId::new("orders", 3),
            binlog_offset: BinlogOffset::new(0, 0),
        };

        let deserialized = DbSync::from_bytes(command.to_bytes());
        assert!(deserialized.is_ok());
        assert_eq!(deserialized.unwrap(), command);
    }
}
