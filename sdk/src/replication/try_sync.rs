use crate::bytes_serializable::BytesSerializable;
use crate::command::{Command, TRY_SYNC_CODE};
use crate::error::ShoalError;
use crate::models::binlog_offset::BinlogOffset;
use crate::models::node::ReplicaNode;
use crate::models::partition::PartitionId;
use crate::validatable::Validatable;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// `TrySync` asks the master to resume incremental replication of a partition
/// from the replica's current binlog position. The master either accepts and
/// starts streaming from that offset, or replies that the replica is too far
/// behind and must fall back to a full snapshot (`DbSync`).
/// It has additional payload:
/// - `node` - the replica's own identity.
/// - `partition` - the partition to synchronize.
/// - `binlog_offset` - the replica's current position in that partition's binlog.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Clone)]
pub struct TrySync {
    /// The replica's own identity.
    pub node: ReplicaNode,
    /// The partition to synchronize.
    pub partition: PartitionId,
    /// The replica's current position in the partition's binlog.
    pub binlog_offset: BinlogOffset,
}

impl Command for TrySync {
    fn code(&self) -> u32 {
        TRY_SYNC_CODE
    }
}

impl Validatable<ShoalError> for TrySync {
    fn validate(&self) -> Result<(), ShoalError> {
        self.node.validate()?;
        self.partition.validate()
    }
}

impl BytesSerializable for TrySync {
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

    fn from_bytes(bytes: Bytes) -> Result<TrySync, ShoalError> {
        let node = ReplicaNode::from_bytes(bytes.clone())?;
        let mut position = node.get_size_bytes();
        let partition = PartitionId::from_bytes(bytes.slice(position..))?;
        position += partition.get_size_bytes();
        let binlog_offset = BinlogOffset::from_bytes(bytes.slice(position..))?;
        Ok(TrySync {
            node,
            partition,
            binlog_offset,
        })
    }
}

impl Display for TrySync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}|{}", self.node, self.partition, self.binlog_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_be_serialized_as_bytes() {
        let command = TrySync {
            node: ReplicaNode::new("127.0.0.1", 9221),
            partition: PartitionId::new("orders", 3),
            binlog_offset: BinlogOffset::new(5, 1024),
        };

        let bytes = command.to_bytes();
        let node = ReplicaNode::from_bytes(bytes.clone()).unwrap();
        let mut position = node.get_size_bytes();
        let partition = PartitionId::from_bytes(bytes.slice(position..)).unwrap();
        position += partition.get_size_bytes();
        let binlog_offset = BinlogOffset::from_bytes(bytes.slice(position..)).unwrap();

        assert!(!bytes.is_empty());
        assert_eq!(node, command.node);
        assert_eq!(partition, command.partition);
        assert_eq!(binlog_offset, command.binlog_offset);
    }

    #[test]
    fn should_be_deserialized_from_bytes() {
        let command = TrySync {
            node: ReplicaNode::new("10.0.0.7", 6380),
            partition: PartitionId::new("users", 11),
            binlog_offset: BinlogOffset::new(7, 65536),
        };

        let deserialized = TrySync::from_bytes(command.to_bytes());
        assert!(deserialized.is_ok());
        assert_eq!(deserialized.unwrap(), command);
    }
}
