use crate::bytes_serializable::BytesSerializable;
use crate::command::{Command, BINLOG_SYNC_CODE};
use crate::error::ShoalError;
use crate::models::binlog_offset::BinlogOffset;
use crate::models::partition::PartitionId;
use crate::validatable::Validatable;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// `BinlogSync` acknowledges that the replica has durably processed a
/// contiguous range of a partition's binlog; the master advances its
/// per-replica watermark accordingly. No payload reply is expected.
/// It has additional payload:
/// - `partition` - the partition the range belongs to.
/// - `ack_range_start` - first offset of the acknowledged range.
/// - `ack_range_end` - last offset of the acknowledged range, never below the start.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Clone)]
pub struct BinlogSync {
    /// The partition the acknowledged range belongs to.
    pub partition: PartitionId,
    /// First offset of the acknowledged range.
    pub ack_range_start: BinlogOffset,
    /// Last offset of the acknowledged range.
    pub ack_range_end: BinlogOffset,
}

impl Command for BinlogSync {
    fn code(&self) -> u32 {
        BINLOG_SYNC_CODE
    }
}

impl Validatable<ShoalError> for BinlogSync {
    fn validate(&self) -> Result<(), ShoalError> {
        self.partition.validate()?;
        if self.ack_range_end < self.ack_range_start {
            return Err(ShoalError::InvalidBinlogOffset);
        }

        Ok(())
    }
}

impl BytesSerializable for BinlogSync {
    fn to_bytes(&self) -> Bytes {
        let partition_bytes = self.partition.to_bytes();
        let mut bytes =
            BytesMut::with_capacity(partition_bytes.len() + 2 * BinlogOffset::WIRE_SIZE);
        bytes.put_slice(&partition_bytes);
        bytes.put_slice(&self.ack_range_start.to_bytes());
        bytes.put_slice(&self.ack_range_end.to_bytes());
        bytes.freeze()
    }

    fn from_bytes(bytes: Bytes) -> Result<BinlogSync, ShoalError> {
        let partition = PartitionId::from_bytes(bytes.clone())?;
        let mut position = partition.get_size_bytes();
        let ack_range_start = BinlogOffset::from_bytes(bytes.slice(position..))?;
        position += BinlogOffset::WIRE_SIZE;
        let ack_range_end = BinlogOffset::from_bytes(bytes.slice(position..))?;
        Ok(BinlogSync {
            partition,
            ack_range_start,
            ack_range_end,
        })
    }
}

impl Display for BinlogSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}|{}|{}",
            self.partition, self.ack_range_start, self.ack_range_end
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_be_serialized_as_bytes() {
        let command = BinlogSync {
            partition: PartitionId::new("orders", 3),
            ack_range_start: BinlogOffset::new(5, 512),
            ack_range_end: BinlogOffset::new(5, 2048),
        };

        let bytes = command.to_bytes();
        let partition = PartitionId::from_bytes(bytes.clone()).unwrap();
        let mut position = partition.get_size_bytes();
        let ack_range_start = BinlogOffset::from_bytes(bytes.slice(position..)).unwrap();
        position += BinlogOffset::WIRE_SIZE;
        let ack_range_end = BinlogOffset::from_bytes(bytes.slice(position..)).unwrap();

        assert_eq!(partition, command.partition);
        assert_eq!(ack_range_start, command.ack_range_start);
        assert_eq!(ack_range_end, command.ack_range_end);
    }

    #[test]
    fn should_be_deserialized_from_bytes() {
        let command = BinlogSync {
            partition: PartitionId::new("users", 0),
            ack_range_start: BinlogOffset::new(1, 0),
            ack_range_end: BinlogOffset::new(2, 4096),
        };

        let deserialized = BinlogSync::from_bytes(command.to_bytes());
        assert!(deserialized.is_ok());
        assert_eq!(deserialized.unwrap(), command);
    }

    #[test]
    fn should_fail_validation_when_range_is_inverted() {
        let command = BinlogSync {
            partition: PartitionId::new("orders", 3),
            ack_range_start: BinlogOffset::new(6, 0),
            ack_range_end: BinlogOffset::new(5, 4096),
        };

        assert!(matches!(
            command.validate(),
            Err(ShoalError::InvalidBinlogOffset)
        ));
    }
}
