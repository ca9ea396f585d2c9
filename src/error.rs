use thiserror::Error;

pub type BufkitResult<T, E = BufkitError> = Result<T, E>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufkitError {
    #[error("Invalid frame id: {0}")]
    InvalidFrame(usize),

    #[error("Frame is not evictable: {0}")]
    NotEvictable(usize),

    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),
}
