use super::wav::WavError;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum TtsServiceError {
    #[error("{0}")]
    Synthesis(String),
    #[error(transparent)]
    Encoding(#[from] WavError),
    #[error("failed to write scratch file: {0}")]
    Storage(#[from] std::io::Error),
}

/// Every synthesis failure collapses to a 500 carrying the underlying message.
impl From<TtsServiceError> for AppError {
    fn from(err: TtsServiceError) -> Self {
        AppError::Internal(err.to_string())
    }
}
