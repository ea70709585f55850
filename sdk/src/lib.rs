pub mod bytes_serializable;
pub mod command;
pub mod error;
pub mod models;
pub mod replication;
pub mod validatable;
