use crate::configs::server::{ReplicationConfig, ServerConfig, TransportConfig};
use crate::server_error::ServerError;
use shoal::validatable::Validatable;
use tracing::error;

/// Upper bound on synchronization threads; past this point additional workers
/// only add contention on the write-ahead log.
pub const MAX_SYNC_THREADS: u32 = 24;

impl Validatable<ServerError> for ServerConfig {
    fn validate(&self) -> Result<(), ServerError> {
        self.replication.validate()?;
        self.transport.validate()?;

        Ok(())
    }
}

impl Validatable<ServerError> for ReplicationConfig {
    fn validate(&self) -> Result<(), ServerError> {
        if self.sync_threads == 0 || self.sync_threads > MAX_SYNC_THREADS {
            error!(
                "Replication configuration -> sync threads must be between 1 and {}.",
                MAX_SYNC_THREADS
            );
            return Err(ServerError::InvalidConfiguration(format!(
                "sync_threads must be between 1 and {MAX_SYNC_THREADS}"
            )));
        }

        Ok(())
    }
}

impl Validatable<ServerError> for TransportConfig {
    fn validate(&self) -> Result<(), ServerError> {
        if self.connect_timeout_ms == 0 {
            error!("Transport configuration -> connect timeout must be greater than zero.");
            return Err(ServerError::InvalidConfiguration(
                "connect_timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_should_be_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_zero_sync_threads() {
        let mut config = ServerConfig::default();
        config.replication.sync_threads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_too_many_sync_threads() {
        let mut config = ServerConfig::default();
        config.replication.sync_threads = MAX_SYNC_THREADS + 1;
        assert!(config.validate().is_err());
    }
}
