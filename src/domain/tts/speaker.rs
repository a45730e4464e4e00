//! Voice identity used to condition every synthesis in the process.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::path::{Path, PathBuf};

/// Dimension of SpeechT5 x-vector speaker embeddings.
pub const SPEAKER_EMBEDDING_DIM: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum SpeakerError {
    #[error("failed to read speaker embedding {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid speaker embedding JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("speaker embedding file {} is {len} bytes, not a whole number of f32 values", path.display())]
    Misaligned { path: PathBuf, len: usize },
    #[error("speaker embedding must have {expected} values, got {actual}")]
    Dimension { expected: usize, actual: usize },
}

/// Where the process-wide speaker embedding comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeakerSource {
    /// Raw little-endian `f32` values (`.bin`) or a JSON array of numbers.
    File(PathBuf),
    /// Standard normal samples from a seeded generator, stable across restarts.
    Seeded(u64),
    /// Standard normal samples from OS entropy, different on every start.
    Random,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerEmbedding {
    values: Vec<f32>,
}

impl SpeakerEmbedding {
    pub fn resolve(source: &SpeakerSource, dim: usize) -> Result<Self, SpeakerError> {
        match source {
            SpeakerSource::File(path) => Self::from_file(path, dim),
            SpeakerSource::Seeded(seed) => Ok(Self::seeded(*seed, dim)),
            SpeakerSource::Random => Ok(Self::random(dim)),
        }
    }

    pub fn random(dim: usize) -> Self {
        Self::sample(&mut StdRng::from_os_rng(), dim)
    }

    pub fn seeded(seed: u64, dim: usize) -> Self {
        Self::sample(&mut StdRng::seed_from_u64(seed), dim)
    }

    pub fn from_values(values: Vec<f32>, dim: usize) -> Result<Self, SpeakerError> {
        if values.len() != dim {
            return Err(SpeakerError::Dimension {
                expected: dim,
                actual: values.len(),
            });
        }
        Ok(Self { values })
    }

    pub fn from_file(path: &Path, dim: usize) -> Result<Self, SpeakerError> {
        let bytes = std::fs::read(path).map_err(|source| SpeakerError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let values = if is_json {
            serde_json::from_slice::<Vec<f32>>(&bytes).map_err(|source| SpeakerError::Json {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            if bytes.len() % 4 != 0 {
                return Err(SpeakerError::Misaligned {
                    path: path.to_path_buf(),
                    len: bytes.len(),
                });
            }
            bytes
                .chunks_exact(4)
                .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect()
        };

        Self::from_values(values, dim)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn sample<R: Rng>(rng: &mut R, dim: usize) -> Self {
        let values = (0..dim).map(|_| rng.sample::<f32, _>(StandardNormal)).collect();
        Self { values }
    }
}
