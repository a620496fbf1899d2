use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpanlinkError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("ingest error: {0}")]
    Ingest(String),

    #[error("storage error: {0}")]
    Store(String),

    #[error("read failed: {0}")]
    Read(String),

    #[error("write failed: {0}")]
    Write(String),

    #[error("keyspace {0} does not exist")]
    MissingKeyspace(String),

    #[error("drain barrier timed out after {0:?}")]
    DrainTimeout(Duration),
}

pub type Result<T> = std::result::Result<T, SpanlinkError>;
