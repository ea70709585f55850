use crate::bytes_serializable::BytesSerializable;
use crate::error::ShoalError;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// `BinlogOffset` identifies a position in a partition's write-ahead log.
/// It consists of the following fields:
/// - `file_sequence` - sequence number of the binlog file.
/// - `byte_offset` - byte offset within that file.
///
/// Offsets are totally ordered by `(file_sequence, byte_offset)` and immutable -
/// advancing a position always produces a new value.
#[derive(
    Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy,
)]
pub struct BinlogOffset {
    /// Sequence number of the binlog file.
    pub file_sequence: u32,
    /// Byte offset within the binlog file.
    pub byte_offset: u64,
}

impl BinlogOffset {
    pub const WIRE_SIZE: usize = 12;

    pub fn new(file_sequence: u32, byte_offset: u64) -> Self {
        Self {
            file_sequence,
            byte_offset,
        }
    }
}

impl BytesSerializable for BinlogOffset {
    fn to_bytes(&self) -> Bytes {
        let mut bytes = BytesMut::with_capacity(Self::WIRE_SIZE);
        bytes.put_u32_le(self.file_sequence);
        bytes.put_u64_le(self.byte_offset);
        bytes.freeze()
    }

    fn from_bytes(bytes: Bytes) -> Result<Self, ShoalError> {
        if bytes.len() < Self::WIRE_SIZE {
            return Err(ShoalError::InvalidBinlogOffset);
        }

        let file_sequence = u32::from_le_bytes(bytes[0..4].try_into()?);
        let byte_offset = u64::from_le_bytes(bytes[4..12].try_into()?);
        Ok(BinlogOffset {
            file_sequence,
            byte_offset,
        })
    }
}

impl Display for BinlogOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file_sequence, self.byte_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_be_ordered_by_file_sequence_first() {
        let a = BinlogOffset::new(1, 9999);
        let b = BinlogOffset::new(2, 0);
        let c = BinlogOffset::new(2, 1);

        assert!(a < b);
        assert!(b < c);
        assert!(a < c);
        assert_eq!(BinlogOffset::new(3, 128), BinlogOffset::new(3, 128));
    }

    #[test]
    fn should_be_serialized_as_bytes() {
        let offset = BinlogOffset::new(5, 1024);
        let bytes = offset.to_bytes();

        assert_eq!(bytes.len(), BinlogOffset::WIRE_SIZE);
        assert_eq!(u32::from_le_bytes(bytes[0..4].try_into().unwrap()), 5);
        assert_eq!(u64::from_le_bytes(bytes[4..12].try_into().unwrap()), 1024);
    }

    #[test]
    fn should_be_deserialized_from_bytes() {
        let offset = BinlogOffset::new(42, u64::MAX - 1);
        let deserialized = BinlogOffset::from_bytes(offset.to_bytes());

        assert!(deserialized.is_ok());
        assert_eq!(deserialized.unwrap(), offset);
    }

    #[test]
    fn should_fail_for_truncated_bytes() {
        let bytes = BinlogOffset::new(1, 2).to_bytes().slice(0..7);
        let result = BinlogOffset::from_bytes(bytes);
        assert!(matches!(result, Err(ShoalError::InvalidBinlogOffset)));
    }
}
