use crate::replication::connection::{ConnectionId, ConnectionRegistry};
use crate::replication::dispatcher::hash_index;
use crate::storage::{StorageEngine, WriteAheadLog};
use bytes::Bytes;
use shoal::bytes_serializable::BytesSerializable;
use shoal::models::binlog_item::BinlogItem;
use shoal::models::binlog_offset::BinlogOffset;
use shoal::models::partition::PartitionId;
use shoal::models::store_command::StoreCommand;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, error};

/// A generic background job with no ordering requirement.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Everything a background worker needs to execute its tasks: the storage
/// collaborators, the registry of live inbound connections, the senders of the
/// lower-half (storage-apply) workers and the channel acknowledgments are
/// forwarded on. Read-only after construction and shared by every worker.
pub struct ReplContext {
    pub wal: Arc<dyn WriteAheadLog>,
    pub storage: Arc<dyn StorageEngine>,
    pub connections: Arc<ConnectionRegistry>,
    pub appliers: Vec<flume::Sender<ReplTask>>,
    pub acks: flume::Sender<PartitionAck>,
    pub pool_size: usize,
}

/// An acknowledgment emitted after a record has been durably appended,
/// forwarded to the master as a `BinlogSync` request.
#[derive(Debug, PartialEq, Clone)]
pub struct PartitionAck {
    pub partition: PartitionId,
    pub ack_range_start: BinlogOffset,
    pub ack_range_end: BinlogOffset,
}

/// A unit of work consumed by exactly one background worker.
pub enum ReplTask {
    WriteBinlog(WriteBinlogTask),
    WriteApply(WriteApplyTask),
    Generic(Job),
    Shutdown,
}

impl ReplTask {
    pub fn execute(self, context: &ReplContext) {
        match self {
            ReplTask::WriteBinlog(task) => task.execute(context),
            ReplTask::WriteApply(task) => task.execute(context),
            ReplTask::Generic(job) => job(),
            ReplTask::Shutdown => {}
        }
    }
}

/// Appends one replicated record to the partition's write-ahead log. Runs on
/// an upper-half worker; only after the append has succeeded does it derive
/// the matching `WriteApplyTask` and emit the acknowledgment.
pub struct WriteBinlogTask {
    pub partition: PartitionId,
    pub payload: Bytes,
    pub connection: ConnectionId,
    /// Opaque caller-supplied data. The task owns it for its lifetime and
    /// releases it when execution completes; the core never interprets it.
    pub context: Option<Box<dyn Any + Send>>,
}

impl WriteBinlogTask {
    pub fn execute(self, context: &ReplContext) {
        if context.connections.get(self.connection).is_none() {
            debug!(
                "Originating connection {} for partition {} is gone, appending anyway",
                self.connection, self.partition
            );
        }

        let offset = match context.wal.append(&self.partition, &self.payload) {
            Ok(offset) => offset,
            Err(error) => {
                error!(
                    "Cannot append replicated record to binlog for partition {}: {error}",
                    self.partition
                );
                return;
            }
        };

        if context
            .acks
            .send(PartitionAck {
                partition: self.partition.clone(),
                ack_range_start: offset,
                ack_range_end: offset,
            })
            .is_err()
        {
            debug!(
                "Acknowledgment channel is closed, skipping ack for partition {} at offset {offset}",
                self.partition
            );
        }

        let command = match StoreCommand::from_bytes(self.payload.clone()) {
            Ok(command) => command,
            Err(error) => {
                // The record is already durable; re-appending would corrupt the
                // log, so only the apply is skipped.
                error!(
                    "Cannot decode replicated record for partition {} at offset {offset}: {error}",
                    self.partition
                );
                return;
            }
        };

        let index = hash_index(&self.partition.dispatch_key(), false, context.pool_size);
        let applier = &context.appliers[index - context.pool_size / 2];
        let apply_task = WriteApplyTask {
            command,
            binlog_item: BinlogItem::new(offset, self.payload),
            table_name: self.partition.table_name.clone(),
            partition_index: self.partition.partition_index,
        };
        if applier.send(ReplTask::WriteApply(apply_task)).is_err() {
            error!(
                "Cannot schedule apply task for partition {} at offset {offset}, the applier has stopped",
                self.partition
            );
        }
    }
}

/// Applies one decoded command to the storage engine. Runs on a lower-half
/// worker. An apply failure is reported and the worker moves on; one bad task
/// must not halt the rest of the partition's queue.
pub struct WriteApplyTask {
    pub command: StoreCommand,
    pub binlog_item: BinlogItem,
    pub table_name: String,
    pub partition_index: u32,
}

impl WriteApplyTask {
    pub fn execute(self, context: &ReplContext) {
        if let Err(error) =
            context
                .storage
                .apply(&self.table_name, self.partition_index, &self.command)
        {
            error!(
                "Cannot apply replicated command to partition {}:{} at offset {}: {error}",
                self.table_name, self.partition_index, self.binlog_item.offset
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal::error::ShoalError;

    struct NoopWal;

    impl WriteAheadLog for NoopWal {
        fn append(
            &self,
            _partition: &PartitionId,
            _payload: &[u8],
        ) -> Result<BinlogOffset, ShoalError> {
            Ok(BinlogOffset::default())
        }
    }

    struct NoopStorage;

    impl StorageEngine for NoopStorage {
        fn apply(
            &self,
            _table_name: &str,
            _partition_index: u32,
            _command: &StoreCommand,
        ) -> Result<(), ShoalError> {
            Ok(())
        }
    }

    struct ReleaseProbe(flume::Sender<()>);

    impl Drop for ReleaseProbe {
        fn drop(&mut self) {
            let _ = self.0.send(());
        }
    }

    fn test_context() -> (
        ReplContext,
        flume::Receiver<ReplTask>,
        flume::Receiver<PartitionAck>,
    ) {
        let (applier_sender, applier_receiver) = flume::unbounded();
        let (ack_sender, ack_receiver) = flume::unbounded();
        let context = ReplContext {
            wal: Arc::new(NoopWal),
            storage: Arc::new(NoopStorage),
            connections: Arc::new(ConnectionRegistry::default()),
            appliers: vec![applier_sender],
            acks: ack_sender,
            pool_size: 2,
        };
        (context, applier_receiver, ack_receiver)
    }

    #[test]
    fn caller_context_should_be_released_once_execution_completes() {
        let (context, _appliers, _acks) = test_context();
        let (released_sender, released_receiver) = flume::bounded(1);
        let command = StoreCommand::new(vec!["set".to_string(), "k".to_string()]);
        let task = WriteBinlogTask {
            partition: PartitionId::new("orders", 0),
            payload: command.to_bytes(),
            connection: 0,
            context: Some(Box::new(ReleaseProbe(released_sender))),
        };

        assert!(released_receiver.is_empty());
        task.execute(&context);
        assert!(released_receiver.try_recv().is_ok());
    }

    #[test]
    fn successful_append_should_emit_an_ack_and_an_apply_task() {
        let (context, appliers, acks) = test_context();
        let command = StoreCommand::new(vec!["set".to_string(), "k".to_string()]);
        let task = WriteBinlogTask {
            partition: PartitionId::new("orders", 0),
            payload: command.to_bytes(),
            connection: 0,
            context: None,
        };

        task.execute(&context);

        let ack = acks.try_recv().unwrap();
        assert_eq!(ack.partition, PartitionId::new("orders", 0));
        assert!(matches!(
            appliers.try_recv(),
            Ok(ReplTask::WriteApply(_))
        ));
    }
}
