use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub logging: LoggingConfig,
    pub replication: ReplicationConfig,
    pub transport: TransportConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log level, overridable with `RUST_LOG`.
    pub level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReplicationConfig {
    /// Number of synchronization threads. The worker pool hosts twice as many
    /// background workers, so the pool size is always even.
    pub sync_threads: u32,
    /// What happens to tasks still queued when a worker is told to stop.
    pub shutdown_policy: ShutdownPolicy,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TransportConfig {
    /// How long to wait when establishing an outbound replication connection, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Whether to disable Nagle's algorithm on replication connections.
    pub nodelay: bool,
}

#[derive(Debug, Default, Deserialize, Serialize, Display, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShutdownPolicy {
    /// Run every task queued before the stop signal. The safe default, since
    /// discarding binlog-append tasks would lose acknowledged data.
    #[default]
    Drain,
    /// Drop tasks still queued once stop has been signalled.
    Discard,
}
