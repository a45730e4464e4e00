pub mod dto;
pub mod error;
pub mod model;
pub mod service;
pub mod speaker;
pub mod wav;

pub use dto::TtsRequest;
pub use error::TtsServiceError;
pub use model::Waveform;
pub use service::{TtsService, TtsServiceApi, TtsSynthesisResult};
pub use speaker::{SpeakerEmbedding, SpeakerError, SpeakerSource, SPEAKER_EMBEDDING_DIM};
pub use wav::{encode_wav, WavError, SAMPLE_RATE};
