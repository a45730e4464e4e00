pub mod config;
pub mod error;
pub mod pool;
pub mod speecht5;

pub use config::{ModelPaths, SpeechT5Config};
pub use error::InferenceError;
pub use pool::InferencePool;
pub use speecht5::SpeechT5Pipeline;
