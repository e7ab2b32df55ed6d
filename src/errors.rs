use thiserror::Error;

pub type Result<T> = std::result::Result<T, MiningError>;

#[derive(Error, Debug)]
pub enum MiningError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("A batch is already being processed")]
    ConcurrentBatch,
}
