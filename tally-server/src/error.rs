use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("configuration error: {reason}")]
    ConfigurationError { reason: String },

    #[error("storage error: {reason}")]
    StorageError { reason: String },

    #[error("failed to init server: {reason}")]
    InitError { reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0:?}")]
    FailedToRead(std::io::Error),

    #[error("failed to parse config file: {0}")]
    FailedToParse(serde_yml::Error),

    #[error("invalid config value: {reason}")]
    InvalidValue { reason: String },
}
