use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Directory service error: {0}")]
    DirectoryError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

/// Application result type alias
pub type Result<T> = std::result::Result<T, AppError>;
