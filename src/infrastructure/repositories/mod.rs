pub mod speecht5_tts_repository;
pub mod tts_repository;

pub use speecht5_tts_repository::SpeechT5TtsRepository;
pub use tts_repository::TtsRepository;
