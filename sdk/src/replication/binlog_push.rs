use crate::bytes_serializable::BytesSerializable;
use crate::command::{Command, BINLOG_PUSH_CODE};
use crate::error::ShoalError;
use crate::models::binlog_offset::BinlogOffset;
use crate::models::node::ReplicaNode;
use crate::models::partition::PartitionId;
use crate::validatable::Validatable;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt::Display;

/// `BinlogPush` delivers a single binlog record to a downstream replica,
/// the outbound counterpart of the `BinlogSync` acknowledgment.
/// It has additional payload:
/// - `node` - the target replica the record is addressed to.
/// - `partition` - the partition the record belongs to.
/// - `binlog_offset` - position the record was written at on the sender.
/// - `payload` - the raw binlog record.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct BinlogPush {
    /// The target replica.
    pub node: ReplicaNode,
    /// The partition the record belongs to.
    pub partition: PartitionId,
    /// Position of the record in the sender's binlog.
    pub binlog_offset: BinlogOffset,
    /// The raw binlog record.
    pub payload: Bytes,
}

impl Command for BinlogPush {
    fn code(&self) -> u32 {
        BINLOG_PUSH_CODE
    }
}

impl Validatable<ShoalError> for BinlogPush {
    fn validate(&self) -> Result<(), ShoalError> {
        self.node.validate()?;
        self.partition.validate()?;
        if self.payload.is_empty() {
            return Err(ShoalError::InvalidCommand);
        }

        Ok(())
    }
}

impl BytesSerializable for BinlogPush {
    fn to_bytes(&self) -> Bytes {
        let node_bytes = self.node.to_bytes();
        let partition_bytes = self.partition.to_bytes();
        let mut bytes = BytesMut::with_capacity(
            node_bytes.len()
                + partition_bytes.len()
                + BinlogOffset::WIRE_SIZE
                + 4
                + self.payload.len(),
        );
        bytes.put_slice(&node_bytes);
        bytes.put_slice(&partition_bytes);
        bytes.put_slice(&self.binlog_offset.to_bytes());
        #[allow(clippy::cast_possible_truncation)]
        bytes.put_u32_le(self.payload.len() as u32);
        bytes.put_slice(&self.payload);
        bytes.freeze()
    }

    fn from_bytes(bytes: Bytes) -> Result<BinlogPush, ShoalError> {
        let node = ReplicaNode::from_bytes(bytes.clone())?;
        let mut position = node.get_size_bytes();
        let partition = PartitionId::from_bytes(bytes.slice(position..))?;
        position += partition.get_size_bytes();
        let binlog_offset = BinlogOffset::from_bytes(bytes.slice(position..))?;
        position += BinlogOffset::WIRE_SIZE;
        if bytes.len() < position + 4 {
            return Err(ShoalError::InvalidCommand);
        }

        let payload_length = u32::from_le_bytes(bytes[position..position + 4].try_into()?) as usize;
        position += 4;
        if bytes.len() < position + payload_length {
            return Err(ShoalError::InvalidCommand);
        }

        let payload = bytes.slice(position..position + payload_length);
        Ok(BinlogPush {
            node,
            partition,
            binlog_offset,
            payload,
        })
    }
}

impl Display for BinlogPush {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}|{}|{}|{} bytes",
            self.node,
            self.partition,
            self.binlog_offset,
            self.payload.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_be_deserialized_from_bytes() {
        let command = BinlogPush {
            node: ReplicaNode::new("10.0.0.9", 9221),
            partition: PartitionId::new("orders", 3),
            binlog_offset: BinlogOffset::new(8, 4096),
            payload: Bytes::from_static(b"record"),
        };

        let deserialized = BinlogPush::from_bytes(command.to_bytes());
        assert!(deserialized.is_ok());
        assert_eq!(deserialized.unwrap(), command);
    }

    #[test]
    fn should_fail_validation_for_empty_payload() {
        let command = BinlogPush {
            node: ReplicaNode::new("10.0.0.9", 9221),
            partition: PartitionId::new("orders", 3),
            binlog_offset: BinlogOffset::new(8, 4096),
            payload: Bytes::new(),
        };

        assert!(matches!(command.validate(), Err(ShoalError::InvalidCommand)));
    }

    #[test]
    fn should_fail_for_truncated_payload() {
        let command = BinlogPush {
            node: ReplicaNode::new("10.0.0.9", 9221),
            partition: PartitionId::new("orders", 3),
            binlog_offset: BinlogOffset::new(8, 4096),
            payload: Bytes::from_static(b"record"),
        };

        let bytes = command.to_bytes();
        let truncated = bytes.slice(0..bytes.len() - 3);
        assert!(matches!(
            BinlogPush::from_bytes(truncated),
            Err(ShoalError::InvalidCommand)
        ));
    }
}
