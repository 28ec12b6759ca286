use skycast_core::{AppError, StorageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage full: {0}")]
    QuotaExceeded(String),

    #[error("Cannot add more than {max} {kind}")]
    LimitReached { kind: &'static str, max: usize },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(e) => AppError::Io(e),
            StoreError::Serialize(e) => StorageError::Corrupt(e.to_string()).into(),
            StoreError::QuotaExceeded(m) => StorageError::WriteFailed(m).into(),
            e @ StoreError::LimitReached { .. } => StorageError::WriteFailed(e.to_string()).into(),
            StoreError::InvalidKey(k) => StorageError::Unavailable(k).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_message() {
        let err = StoreError::LimitReached {
            kind: "alerts",
            max: 20,
        };
        assert_eq!(err.to_string(), "Cannot add more than 20 alerts");

        let app: AppError = err.into();
        assert!(matches!(app, AppError::Storage(StorageError::WriteFailed(_))));
    }
}
