use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),
    #[error("invalid model config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
    #[error("onnx runtime error: {0}")]
    Runtime(String),
    #[error("unexpected model output: {0}")]
    Output(String),
    #[error("no inference worker available: {0}")]
    Unavailable(String),
    #[error("inference worker failed: {0}")]
    Worker(String),
}

impl InferenceError {
    pub fn runtime(err: impl std::fmt::Display) -> Self {
        Self::Runtime(err.to_string())
    }
}
