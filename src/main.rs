use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tts_backend::controllers::tts::TtsController;
use tts_backend::domain::tts::{SpeakerEmbedding, TtsService};
use tts_backend::infrastructure::config::{Config, LogFormat};
use tts_backend::infrastructure::http::{create_router, serve, shutdown_signal};
use tts_backend::infrastructure::repositories::SpeechT5TtsRepository;
use tts_backend::infrastructure::storage::ScratchFile;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting TTS Backend on {}:{}", config.host, config.port);
    if config.is_development() {
        tracing::debug!(?config, "Resolved configuration");
    }

    // Load model artifacts; any failure aborts startup
    let model_paths = config.model_paths();
    let tts_repo = Arc::new(SpeechT5TtsRepository::load(
        &model_paths,
        config.inference_workers,
        config.intra_threads,
    )?);

    // Resolve the process-wide voice
    let speaker_source = config.speaker_source();
    let speaker = SpeakerEmbedding::resolve(&speaker_source, tts_repo.config().speaker_embedding_dim)?;
    tracing::info!(source = ?speaker_source, dimensions = speaker.len(), "Speaker embedding ready");

    let scratch = config.scratch_path.clone().map(|path| {
        tracing::info!(path = %path.display(), "Mirroring latest synthesis to scratch file");
        Arc::new(ScratchFile::new(path))
    });

    // === DEPENDENCY INJECTION SETUP ===
    let tts_service = Arc::new(TtsService::new(
        tts_repo.clone(),
        Arc::new(speaker),
        scratch,
        config.tts_cache_enabled,
    ));
    let tts_controller = Arc::new(TtsController::new(tts_service.clone()));

    let app = create_router(&config, tts_controller, tts_repo)?;

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    serve(
        listener,
        app,
        shutdown_signal(),
        Duration::from_secs(config.shutdown_timeout_secs),
    )
    .await?;

    tts_service.shutdown().await;
    tracing::info!("TTS Backend stopped");

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tts_backend=debug,tower_http=debug".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
