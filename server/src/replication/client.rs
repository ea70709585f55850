use crate::configs::server::{ServerConfig, ShutdownPolicy};
use crate::replication::connection::{ConnectionId, ConnectionRegistry};
use crate::replication::endpoint::Transport;
use crate::replication::task::{Job, PartitionAck, ReplContext, ReplTask, WriteApplyTask, WriteBinlogTask};
use crate::replication::worker_pool::ReplWorkerPool;
use crate::replication::REPL_PORT_OFFSET;
use crate::server_error::ServerError;
use crate::storage::{StorageEngine, WriteAheadLog};
use bytes::{BufMut, Bytes, BytesMut};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shoal::bytes_serializable::BytesSerializable;
use shoal::command::{get_name_from_code, ReplicationRequest};
use shoal::error::ShoalError;
use shoal::models::binlog_item::BinlogItem;
use shoal::models::binlog_offset::BinlogOffset;
use shoal::models::node::ReplicaNode;
use shoal::models::partition::PartitionId;
use shoal::models::store_command::StoreCommand;
use shoal::replication::binlog_push::BinlogPush;
use shoal::replication::binlog_sync::BinlogSync;
use shoal::replication::db_sync::DbSync;
use shoal::replication::meta_sync::MetaSync;
use shoal::replication::try_sync::TrySync;
use shoal::validatable::Validatable;
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Read-only view of the cluster membership the replica belongs to. The master
/// may be re-pointed at any time, so callers resolve it on every use and never
/// cache the result.
pub trait ClusterView: Send + Sync {
    /// This replica's own identity (client-facing address).
    fn self_node(&self) -> ReplicaNode;
    /// The currently assigned master, if any.
    fn master(&self) -> Option<ReplicaNode>;
    /// The shared secret the master requires, if any.
    fn master_auth(&self) -> Option<String>;
}

impl Debug for dyn ClusterView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterView").finish()
    }
}

/// The replication client: owns the outbound transport and the background
/// worker pool, and exposes the protocol send paths plus the task scheduling
/// entry points. One instance per replica process.
pub struct ReplClient {
    transport: Arc<dyn Transport>,
    cluster: Arc<dyn ClusterView>,
    connections: Arc<ConnectionRegistry>,
    pool: ReplWorkerPool,
    context: Option<Arc<ReplContext>>,
    ack_receiver: flume::Receiver<PartitionAck>,
    watermarks: Arc<DashMap<PartitionId, BinlogOffset>>,
    ack_forwarder: Option<tokio::task::JoinHandle<()>>,
}

impl ReplClient {
    pub fn new(
        config: &ServerConfig,
        cluster: Arc<dyn ClusterView>,
        transport: Arc<dyn Transport>,
        wal: Arc<dyn WriteAheadLog>,
        storage: Arc<dyn StorageEngine>,
    ) -> Self {
        let pool = ReplWorkerPool::new(
            config.replication.sync_threads,
            config.replication.shutdown_policy,
        );
        let (ack_sender, ack_receiver) = flume::unbounded();
        let connections = Arc::new(ConnectionRegistry::default());
        let context = Arc::new(ReplContext {
            wal,
            storage,
            connections: connections.clone(),
            appliers: pool.applier_senders(),
            acks: ack_sender,
            pool_size: pool.pool_size(),
        });
        Self {
            transport,
            cluster,
            connections,
            pool,
            context: Some(context),
            ack_receiver,
            watermarks: Arc::new(DashMap::new()),
            ack_forwarder: None,
        }
    }

    /// Starts the transport, the worker pool and the acknowledgment forwarder.
    /// Any failure here is unrecoverable and must abort the replica's startup.
    pub async fn start(&mut self) -> Result<(), ServerError> {
        let context = self
            .context
            .clone()
            .ok_or_else(|| ServerError::InvalidConfiguration("client already stopped".to_string()))?;
        self.transport.start().await?;
        self.pool.start(context)?;

        let receiver = self.ack_receiver.clone();
        let transport = self.transport.clone();
        let cluster = self.cluster.clone();
        let watermarks = self.watermarks.clone();
        self.ack_forwarder = Some(tokio::spawn(async move {
            while let Ok(ack) = receiver.recv_async().await {
                if let Err(error) = send_ack(
                    transport.as_ref(),
                    cluster.as_ref(),
                    &watermarks,
                    &ack.partition,
                    ack.ack_range_start,
                    ack.ack_range_end,
                )
                .await
                {
                    error!(
                        "Cannot acknowledge binlog range {}..{} for partition {}: {error}",
                        ack.ack_range_start, ack.ack_range_end, ack.partition
                    );
                }
            }
        }));
        info!("Replication client started");
        Ok(())
    }

    /// Stops the transport first so no new tasks are produced, then shuts the
    /// workers down half by half, draining in-flight tasks per the configured
    /// policy, and finally ends the acknowledgment forwarder. The worker
    /// threads are joined on a blocking task so the runtime is not stalled.
    pub async fn stop(&mut self) {
        self.transport.stop().await;
        let mut pool = std::mem::replace(
            &mut self.pool,
            ReplWorkerPool::new(0, ShutdownPolicy::default()),
        );
        if tokio::task::spawn_blocking(move || pool.stop()).await.is_err() {
            error!("Background worker shutdown task panicked");
        }
        self.context = None;
        if let Some(handle) = self.ack_forwarder.take() {
            let _ = handle.await;
        }
        info!("Replication client stopped");
    }

    /// Registry of live inbound replication connections; tasks reference
    /// connections through it by id.
    pub fn connections(&self) -> Arc<ConnectionRegistry> {
        self.connections.clone()
    }

    /// Last acknowledged offset for the partition within this session.
    pub fn acked_offset(&self, partition: &PartitionId) -> Option<BinlogOffset> {
        self.watermarks.get(partition).map(|offset| *offset)
    }

    /// Enqueues a binlog-append task for the partition onto its upper-half
    /// worker. The task itself derives and schedules the matching apply task
    /// once the append has succeeded.
    pub fn schedule_write_binlog(
        &self,
        partition: PartitionId,
        payload: Bytes,
        connection: ConnectionId,
        context: Option<Box<dyn Any + Send>>,
    ) -> Result<(), ServerError> {
        self.ensure_workers()?;
        let index = self.pool.hash_index(&partition.dispatch_key(), true);
        self.pool.schedule_at(
            index,
            ReplTask::WriteBinlog(WriteBinlogTask {
                partition,
                payload,
                connection,
                context,
            }),
        )
    }

    /// Enqueues a storage-apply task directly onto the lower-half worker for
    /// the dispatch key. Used when the append has already happened, e.g. on
    /// binlog replay after a restart.
    pub fn schedule_write_apply(
        &self,
        dispatch_key: &str,
        command: StoreCommand,
        binlog_item: BinlogItem,
        table_name: String,
        partition_index: u32,
    ) -> Result<(), ServerError> {
        self.ensure_workers()?;
        let index = self.pool.hash_index(dispatch_key, false);
        self.pool.schedule_at(
            index,
            ReplTask::WriteApply(WriteApplyTask {
                command,
                binlog_item,
                table_name,
                partition_index,
            }),
        )
    }

    /// Enqueues an order-free background job on the next worker in round-robin
    /// order.
    pub fn schedule(&self, job: Job) -> Result<(), ServerError> {
        self.pool.schedule_round_robin(ReplTask::Generic(job))
    }

    /// Sends the cluster-join handshake to the current master.
    pub async fn send_meta_sync(&self) -> Result<(), ShoalError> {
        let master = self.master()?;
        let request = ReplicationRequest::MetaSync(MetaSync {
            node: self.cluster.self_node(),
            auth: self.cluster.master_auth(),
        });
        info!("Sending meta sync request to master {master}");
        send_request(self.transport.as_ref(), &master, request).await
    }

    /// Asks the master to stream the partition incrementally from `binlog_offset`.
    pub async fn send_try_sync(
        &self,
        table_name: &str,
        partition_index: u32,
        binlog_offset: BinlogOffset,
    ) -> Result<(), ShoalError> {
        let master = self.master()?;
        let request = ReplicationRequest::TrySync(TrySync {
            node: self.cluster.self_node(),
            partition: PartitionId::new(table_name, partition_index),
            binlog_offset,
        });
        send_request(self.transport.as_ref(), &master, request).await
    }

    /// Asks the master for a full snapshot transfer of the partition.
    pub async fn send_db_sync(
        &self,
        table_name: &str,
        partition_index: u32,
        binlog_offset: BinlogOffset,
    ) -> Result<(), ShoalError> {
        let master = self.master()?;
        let request = ReplicationRequest::DbSync(DbSync {
            node: self.cluster.self_node(),
            partition: PartitionId::new(table_name, partition_index),
            binlog_offset,
        });
        send_request(self.transport.as_ref(), &master, request).await
    }

    /// Acknowledges a durably processed offset range to the current master.
    /// Rejects ranges that regress below the partition's session watermark.
    pub async fn send_binlog_sync_ack(
        &self,
        partition: &PartitionId,
        ack_range_start: BinlogOffset,
        ack_range_end: BinlogOffset,
    ) -> Result<(), ShoalError> {
        send_ack(
            self.transport.as_ref(),
            self.cluster.as_ref(),
            &self.watermarks,
            partition,
            ack_range_start,
            ack_range_end,
        )
        .await
    }

    /// Delivers a binlog record to a downstream replica.
    pub async fn push_binlog(
        &self,
        replica: &ReplicaNode,
        partition: PartitionId,
        binlog_offset: BinlogOffset,
        payload: Bytes,
    ) -> Result<(), ShoalError> {
        let request = ReplicationRequest::BinlogPush(BinlogPush {
            node: replica.clone(),
            partition,
            binlog_offset,
            payload,
        });
        send_request(self.transport.as_ref(), replica, request).await
    }

    /// Raw passthrough for callers that frame their own traffic. No
    /// replication port offset is applied.
    pub async fn write(&self, ip: &str, port: u16, bytes: Bytes) -> Result<(), ShoalError> {
        self.transport.write(ip, port, bytes).await
    }

    fn master(&self) -> Result<ReplicaNode, ShoalError> {
        self.cluster.master().ok_or(ShoalError::MasterNotFound)
    }

    fn ensure_workers(&self) -> Result<(), ServerError> {
        if self.pool.pool_size() == 0 {
            return Err(ServerError::CannotScheduleTask(
                "replication client is stopped".to_string(),
            ));
        }

        Ok(())
    }
}

impl Debug for ReplClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplClient")
            .field("pool_size", &self.pool.pool_size())
            .field("connections", &self.connections.len())
            .finish()
    }
}

/// Validates, serializes and frames the request, then writes it to the peer's
/// replication port. A validation failure aborts the send with a corruption
/// error; nothing reaches the transport.
async fn send_request(
    transport: &dyn Transport,
    node: &ReplicaNode,
    request: ReplicationRequest,
) -> Result<(), ShoalError> {
    let name = get_name_from_code(request.code())?;
    if let Err(error) = request.validate() {
        warn!("Cannot serialize {name} request to peer {node}: {error}");
        return Err(ShoalError::CannotSerializeCommand);
    }

    let payload = request.to_bytes();
    let mut frame = BytesMut::with_capacity(4 + payload.len());
    #[allow(clippy::cast_possible_truncation)]
    frame.put_u32_le(payload.len() as u32);
    frame.put_slice(&payload);
    let port = node
        .port
        .checked_add(REPL_PORT_OFFSET)
        .ok_or(ShoalError::InvalidReplicaAddress)?;
    transport.write(&node.ip, port, frame.freeze()).await
}

async fn send_ack(
    transport: &dyn Transport,
    cluster: &dyn ClusterView,
    watermarks: &DashMap<PartitionId, BinlogOffset>,
    partition: &PartitionId,
    ack_range_start: BinlogOffset,
    ack_range_end: BinlogOffset,
) -> Result<(), ShoalError> {
    if ack_range_end < ack_range_start {
        return Err(ShoalError::InvalidBinlogOffset);
    }

    match watermarks.entry(partition.clone()) {
        Entry::Occupied(mut watermark) => {
            if ack_range_end < *watermark.get() {
                warn!(
                    "Ack range {ack_range_start}..{ack_range_end} for partition {partition} regresses below watermark {}",
                    watermark.get()
                );
                return Err(ShoalError::InvalidBinlogOffset);
            }
            watermark.insert(ack_range_end);
        }
        Entry::Vacant(watermark) => {
            watermark.insert(ack_range_end);
        }
    }

    let master = cluster.master().ok_or(ShoalError::MasterNotFound)?;
    let request = ReplicationRequest::BinlogSync(BinlogSync {
        partition: partition.clone(),
        ack_range_start,
        ack_range_end,
    });
    send_request(transport, &master, request).await
}
