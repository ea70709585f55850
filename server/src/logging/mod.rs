use crate::configs::server::LoggingConfig;
use crate::server_error::ServerError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber. `RUST_LOG` takes precedence over
/// the configured level. Fails if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ServerError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()
        .map_err(|_| ServerError::CannotInitializeLogging)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_initialize_logging_only_once() {
        let config = LoggingConfig {
            level: "debug".to_string(),
        };

        assert!(init_logging(&config).is_ok());
        assert!(matches!(
            init_logging(&config),
            Err(ServerError::CannotInitializeLogging)
        ));
    }
}
