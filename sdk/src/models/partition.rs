use crate::bytes_serializable::BytesSerializable;
use crate::error::ShoalError;
use crate::validatable::Validatable;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Maximum length of a table name in bytes. The name is length-prefixed with a single byte on the wire.
pub const MAX_TABLE_NAME_LENGTH: usize = 255;

/// `PartitionId` identifies a shard of a table - the unit of replication ordering.
/// It consists of the following fields:
/// - `table_name` - name of the sharded table, max length is 255 bytes.
/// - `partition_index` - index of the partition within the table.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash, Clone)]
pub struct PartitionId {
    /// Name of the sharded table.
    pub table_name: String,
    /// Index of the partition within the table.
    pub partition_index: u32,
}

impl PartitionId {
    pub fn new(table_name: &str, partition_index: u32) -> Self {
        Self {
            table_name: table_name.to_string(),
            partition_index,
        }
    }

    /// The key hashed to pick a background worker. All tasks sharing this key
    /// are executed in submission order.
    pub fn dispatch_key(&self) -> String {
        format!("{}:{}", self.table_name, self.partition_index)
    }

    pub fn get_size_bytes(&self) -> usize {
        1 + self.table_name.len() + 4
    }
}

impl Validatable<ShoalError> for PartitionId {
    fn validate(&self) -> Result<(), ShoalError> {
        if self.table_name.is_empty() || self.table_name.len() > MAX_TABLE_NAME_LENGTH {
            return Err(ShoalError::InvalidTableName);
        }

        Ok(())
    }
}

impl BytesSerializable for PartitionId {
    fn to_bytes(&self) -> Bytes {
        let mut bytes = BytesMut::with_capacity(self.get_size_bytes());
        #[allow(clippy::cast_possible_truncation)]
        bytes.put_u8(self.table_name.len() as u8);
        bytes.put_slice(self.table_name.as_bytes());
        bytes.put_u32_le(self.partition_index);
        bytes.freeze()
    }

    fn from_bytes(bytes: Bytes) -> Result<Self, ShoalError> {
        if bytes.len() < 6 {
            return Err(ShoalError::InvalidCommand);
        }

        let name_length = bytes[0] as usize;
        if name_length == 0 || bytes.len() < 1 + name_length + 4 {
            return Err(ShoalError::InvalidTableName);
        }

        let table_name = std::str::from_utf8(&bytes[1..1 + name_length])?.to_string();
        let partition_index =
            u32::from_le_bytes(bytes[1 + name_length..1 + name_length + 4].try_into()?);
        Ok(PartitionId {
            table_name,
            partition_index,
        })
    }
}

impl Display for PartitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.table_name, self.partition_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_be_serialized_as_bytes() {
        let partition = PartitionId::new("orders", 3);
        let bytes = partition.to_bytes();

        assert_eq!(bytes[0] as usize, partition.table_name.len());
        assert_eq!(&bytes[1..7], partition.table_name.as_bytes());
        assert_eq!(u32::from_le_bytes(bytes[7..11].try_into().unwrap()), 3);
    }

    #[test]
    fn should_be_deserialized_from_bytes() {
        let partition = PartitionId::new("orders", 3);
        let deserialized = PartitionId::from_bytes(partition.to_bytes());

        assert!(deserialized.is_ok());
        assert_eq!(deserialized.unwrap(), partition);
    }

    #[test]
    fn should_fail_validation_for_empty_table_name() {
        let partition = PartitionId::new("", 0);
        assert!(matches!(
            partition.validate(),
            Err(ShoalError::InvalidTableName)
        ));
    }

    #[test]
    fn dispatch_key_should_join_table_and_partition() {
        let partition = PartitionId::new("t1", 0);
        assert_eq!(partition.dispatch_key(), "t1:0");
    }
}
