pub mod config_provider;
pub mod defaults;
pub mod server;
pub mod validators;
