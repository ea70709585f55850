pub mod binlog_item;
pub mod binlog_offset;
pub mod node;
pub mod partition;
pub mod store_command;
