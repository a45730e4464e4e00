//! In-memory WAV encoding for synthesized waveforms.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// Output sample rate of the vocoder.
pub const SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, thiserror::Error)]
pub enum WavError {
    #[error("failed to encode WAV: {0}")]
    Encode(#[from] hound::Error),
}

/// Encode mono `f32` samples as a 16-bit PCM RIFF/WAVE container.
///
/// Samples outside `[-1.0, 1.0]` are clipped.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, WavError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(to_pcm16(sample))?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
