use thiserror::Error;
use tokio::io;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error")]
    IoError(#[from] io::Error),
    #[error("SDK error")]
    SdkError(#[from] shoal::error::ShoalError),
    #[error("Cannot load configuration: {0}")]
    CannotLoadConfiguration(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Cannot initialize logging")]
    CannotInitializeLogging,
    #[error("Cannot start background worker {0}: {1}")]
    CannotStartWorker(String, String),
    #[error("Cannot schedule task on background worker {0}")]
    CannotScheduleTask(String),
}
