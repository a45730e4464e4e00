use crate::domain::tts::SpeakerSource;
use crate::infrastructure::inference::ModelPaths;
use std::env;
use std::path::PathBuf;

/// Browser origins allowed by default: the Vite and React dev servers.
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:5174";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    pub cors_allowed_origins: Vec<String>,
    // Model artifacts
    pub model_dir: PathBuf,
    pub vocoder_dir: PathBuf,
    // Voice identity
    pub speaker_embedding_path: Option<PathBuf>,
    pub speaker_seed: Option<u64>,
    // Inference
    pub inference_workers: usize,
    pub intra_threads: usize,
    // TTS Cache
    pub tts_cache_enabled: bool,
    pub scratch_path: Option<PathBuf>,
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = Config {
            host: var("HOST", "0.0.0.0"),
            port: var("PORT", "8000").parse()?,
            environment: match var("ENVIRONMENT", "development").as_str() {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match var("LOG_FORMAT", "pretty").as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            cors_allowed_origins: parse_origins(&var("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ORIGINS)),
            model_dir: PathBuf::from(var("TTS_MODEL_DIR", "models/speecht5_tts")),
            vocoder_dir: PathBuf::from(var("TTS_VOCODER_DIR", "models/speecht5_hifigan")),
            speaker_embedding_path: non_empty("TTS_SPEAKER_EMBEDDING").map(PathBuf::from),
            speaker_seed: non_empty("TTS_SPEAKER_SEED")
                .map(|seed| seed.trim().parse())
                .transpose()?,
            inference_workers: var("TTS_INFERENCE_WORKERS", "1").parse::<usize>()?.max(1),
            intra_threads: var("TTS_INTRA_THREADS", "4").parse::<usize>()?.max(1),
            tts_cache_enabled: var("TTS_CACHE_ENABLED", "false").to_lowercase() == "true",
            scratch_path: non_empty("TTS_SCRATCH_PATH").map(PathBuf::from),
            shutdown_timeout_secs: var("SHUTDOWN_TIMEOUT_SECS", "30").parse()?,
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn model_paths(&self) -> ModelPaths {
        ModelPaths::new(&self.model_dir, &self.vocoder_dir)
    }

    /// A configured file wins over a seed; neither means a random voice.
    pub fn speaker_source(&self) -> SpeakerSource {
        match (&self.speaker_embedding_path, self.speaker_seed) {
            (Some(path), _) => SpeakerSource::File(path.clone()),
            (None, Some(seed)) => SpeakerSource::Seeded(seed),
            (None, None) => SpeakerSource::Random,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
