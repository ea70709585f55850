pub mod client;
pub mod connection;
pub mod dispatcher;
pub mod endpoint;
pub mod task;
pub mod worker;
pub mod worker_pool;

/// Fixed offset between a node's primary client-facing port and the port its
/// replication service listens on. All protocol requests target
/// `peer_port + REPL_PORT_OFFSET`.
pub const REPL_PORT_OFFSET: u16 = 2000;
