use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Cell ({x}, {y}) is no longer processing commands")]
    CellUnavailable { x: i32, y: i32 },

    #[error("Board exhausted while placing {what}")]
    BoardExhausted { what: String },
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("Task failed: {0}")]
    TaskFailed(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] anyhow::Error),
}

impl From<tokio::task::JoinError> for ApplicationError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApplicationError::TaskFailed(err.to_string())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;
