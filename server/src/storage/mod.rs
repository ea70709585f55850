use shoal::error::ShoalError;
use shoal::models::binlog_offset::BinlogOffset;
use shoal::models::partition::PartitionId;
use shoal::models::store_command::StoreCommand;
use std::fmt::Debug;

/// The storage engine that durably persists and queries key-value data. The
/// replication core never interprets a command's effect; it only hands decoded
/// commands over, in per-partition order.
pub trait StorageEngine: Send + Sync {
    fn apply(
        &self,
        table_name: &str,
        partition_index: u32,
        command: &StoreCommand,
    ) -> Result<(), ShoalError>;
}

/// A partition's append-only write-ahead log of committed operations.
/// `append` returns the new tail offset.
pub trait WriteAheadLog: Send + Sync {
    fn append(&self, partition: &PartitionId, payload: &[u8]) -> Result<BinlogOffset, ShoalError>;
}

impl Debug for dyn StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine").finish()
    }
}

impl Debug for dyn WriteAheadLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteAheadLog").finish()
    }
}
