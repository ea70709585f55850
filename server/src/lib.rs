pub mod configs;
pub mod logging;
pub mod replication;
pub mod server_error;
pub mod storage;
