pub mod binlog_push;
pub mod binlog_sync;
pub mod db_sync;
pub mod meta_sync;
pub mod try_sync;
