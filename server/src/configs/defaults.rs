use crate::configs::server::{
    LoggingConfig, ReplicationConfig, ServerConfig, ShutdownPolicy, TransportConfig,
};

impl Default for ServerConfig {
    fn default() -> ServerConfig {
        ServerConfig {
            logging: LoggingConfig::default(),
            replication: ReplicationConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> LoggingConfig {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl Default for ReplicationConfig {
    fn default() -> ReplicationConfig {
        ReplicationConfig {
            sync_threads: 6,
            shutdown_policy: ShutdownPolicy::default(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> TransportConfig {
        TransportConfig {
            connect_timeout_ms: 5000,
            nodelay: true,
        }
    }
}
