use crate::models::binlog_offset::BinlogOffset;
use bytes::Bytes;
use std::fmt::Display;

/// `BinlogItem` is the metadata of a single appended log record: the offset the
/// record was written at, together with its raw payload. It travels with the
/// storage-apply task so failures can be reported against a concrete position.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct BinlogItem {
    /// Offset of the record in the partition's binlog.
    pub offset: BinlogOffset,
    /// Raw payload of the appended record.
    pub payload: Bytes,
}

impl BinlogItem {
    pub fn new(offset: BinlogOffset, payload: Bytes) -> Self {
        Self { offset, payload }
    }
}

impl Display for BinlogItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{} bytes", self.offset, self.payload.len())
    }
}
