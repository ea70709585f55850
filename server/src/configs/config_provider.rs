use crate::configs::server::ServerConfig;
use crate::server_error::ServerError;
use async_trait::async_trait;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use shoal::validatable::Validatable;
use std::env;
use std::path::Path;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "configs/server.toml";
const CONFIG_PATH_ENV: &str = "SHOAL_CONFIG_PATH";
const ENV_PREFIX: &str = "SHOAL_";

#[async_trait]
pub trait ConfigProvider {
    async fn load_config(&self) -> Result<ServerConfig, ServerError>;
}

/// Loads the configuration from a TOML file, with every value overridable
/// through `SHOAL_`-prefixed environment variables (e.g.
/// `SHOAL_REPLICATION_SYNC_THREADS`). Missing file falls back to defaults.
#[derive(Debug)]
pub struct FileConfigProvider {
    path: String,
}

impl FileConfigProvider {
    pub fn new(path: String) -> Self {
        Self { path }
    }
}

impl Default for FileConfigProvider {
    fn default() -> Self {
        Self::new(env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()))
    }
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    async fn load_config(&self) -> Result<ServerConfig, ServerError> {
        info!("Loading config from path: '{}'...", self.path);
        if !Path::new(&self.path).exists() {
            info!(
                "Config file not found at path: '{}', using defaults.",
                self.path
            );
        }

        let config: ServerConfig = Figment::new()
            .merge(Serialized::defaults(ServerConfig::default()))
            .merge(Toml::file(&self.path))
            .merge(Env::prefixed(ENV_PREFIX).split("_"))
            .extract()
            .map_err(|error| ServerError::CannotLoadConfiguration(error.to_string()))?;

        config.validate()?;
        info!("Config loaded from path: '{}'", self.path);
        Ok(config)
    }
}
