use thiserror::Error;

#[derive(Error, Debug)]
pub enum KiqueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Random source unavailable: {0}")]
    Entropy(String),

    #[error("Not connected to Redis")]
    NotConnected,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("A global client is already installed")]
    AlreadyInstalled,
}

pub type Result<T> = std::result::Result<T, KiqueueError>;
