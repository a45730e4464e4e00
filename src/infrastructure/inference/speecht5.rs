//! SpeechT5 text-to-speech on ONNX Runtime.
//!
//! Three artifacts: the tokenizer turns text into ids, the acoustic model
//! (encoder + KV-cached decoder) turns ids into a mel spectrogram conditioned
//! on a speaker embedding, and the HiFi-GAN vocoder turns the spectrogram
//! into 16 kHz samples.

use super::config::{ModelPaths, SpeechT5Config, STOP_THRESHOLD};
use super::error::InferenceError;
use ort::{
    session::{builder::GraphOptimizationLevel, Session, SessionInputValue},
    tensor::PrimitiveTensorElementType,
    value::{DynValue, Tensor, Value},
};
use std::borrow::Cow;
use std::fmt::Debug;
use std::path::Path;
use tokenizers::Tokenizer;

const PAST_PREFIX: &str = "past_key_values.";
const PRESENT_PREFIX: &str = "present.";

type SessionInputs = Vec<(Cow<'static, str>, SessionInputValue<'static>)>;

/// One loaded model instance. Not shareable: running a session needs `&mut`.
pub struct SpeechT5Pipeline {
    tokenizer: Tokenizer,
    encoder: Session,
    decoder: Session,
    vocoder: Session,
    config: SpeechT5Config,
    encoder_takes_attention_mask: bool,
    past_inputs: Vec<String>,
    present_outputs: Vec<String>,
}

impl SpeechT5Pipeline {
    pub fn load(paths: &ModelPaths, intra_threads: usize) -> Result<Self, InferenceError> {
        tracing::info!(
            model_dir = %paths.model_dir.display(),
            vocoder_dir = %paths.vocoder_dir.display(),
            "Loading SpeechT5 model"
        );

        let config = SpeechT5Config::load(&paths.config())?;

        let tokenizer_path = paths.tokenizer();
        if !tokenizer_path.exists() {
            return Err(InferenceError::ModelNotFound(tokenizer_path));
        }
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| InferenceError::Tokenizer(e.to_string()))?;

        let encoder = load_session(&paths.encoder(), intra_threads)?;
        let decoder = load_session(&paths.decoder(), intra_threads)?;
        let vocoder = load_session(&paths.vocoder(), intra_threads)?;

        let encoder_takes_attention_mask = encoder
            .inputs
            .iter()
            .any(|input| input.name == "attention_mask");
        let past_inputs: Vec<String> = decoder
            .inputs
            .iter()
            .filter(|input| input.name.starts_with(PAST_PREFIX))
            .map(|input| input.name.clone())
            .collect();
        let present_outputs: Vec<String> = decoder
            .outputs
            .iter()
            .filter(|output| output.name.starts_with(PRESENT_PREFIX))
            .map(|output| output.name.clone())
            .collect();

        tracing::info!(
            cache_tensors = past_inputs.len(),
            num_mel_bins = config.num_mel_bins,
            "SpeechT5 model loaded"
        );

        Ok(Self {
            tokenizer,
            encoder,
            decoder,
            vocoder,
            config,
            encoder_takes_attention_mask,
            past_inputs,
            present_outputs,
        })
    }

    pub fn config(&self) -> &SpeechT5Config {
        &self.config
    }

    /// Run text through tokenizer, acoustic model and vocoder.
    pub fn synthesize(&mut self, text: &str, speaker: &[f32]) -> Result<Vec<f32>, InferenceError> {
        if speaker.len() != self.config.speaker_embedding_dim {
            return Err(InferenceError::Output(format!(
                "speaker embedding has {} values, model expects {}",
                speaker.len(),
                self.config.speaker_embedding_dim
            )));
        }

        let input_ids = self.tokenize(text)?;
        let (hidden_states, encoder_mask) = self.encode(&input_ids)?;
        let encoder_len = hidden_states.shape.get(1).copied().unwrap_or(0);
        let spectrogram = self.decode(&hidden_states, &encoder_mask, encoder_len, speaker)?;
        self.vocode(spectrogram)
    }

    fn tokenize(&self, text: &str) -> Result<Vec<i64>, InferenceError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| InferenceError::Tokenizer(e.to_string()))?;
        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();

        if ids.is_empty() {
            return Err(InferenceError::Tokenizer("text produced no tokens".to_string()));
        }

        tracing::debug!(tokens = ids.len(), "Text tokenized");
        Ok(ids)
    }

    fn encode(
        &mut self,
        input_ids: &[i64],
    ) -> Result<(OwnedTensor<f32>, OwnedTensor<i64>), InferenceError> {
        let ids = OwnedTensor::new(vec![1, input_ids.len()], input_ids.to_vec());
        let mut inputs: SessionInputs = vec![("input_ids".into(), ids.to_input()?)];
        if self.encoder_takes_attention_mask {
            let mask = OwnedTensor::new(vec![1, input_ids.len()], vec![1i64; input_ids.len()]);
            inputs.push(("attention_mask".into(), mask.to_input()?));
        }

        let outputs = self.encoder.run(inputs).map_err(InferenceError::runtime)?;
        let hidden_states = OwnedTensor::<f32>::extract(&outputs["encoder_outputs"])?;
        let mask = OwnedTensor::<i64>::extract(&outputs["encoder_attention_mask"])?;

        Ok((hidden_states, mask))
    }

    /// Autoregressive mel generation; each step emits `reduction_factor` frames.
    fn decode(
        &mut self,
        hidden_states: &OwnedTensor<f32>,
        encoder_mask: &OwnedTensor<i64>,
        encoder_len: usize,
        speaker: &[f32],
    ) -> Result<Vec<f32>, InferenceError> {
        let mel_bins = self.config.num_mel_bins;
        let max_steps = self.config.max_steps(encoder_len);
        let min_steps = self.config.min_steps(encoder_len);

        let empty_cache = vec![1, self.config.decoder_attention_heads, 0, self.config.head_dim()];
        let mut past: Vec<(String, OwnedTensor<f32>)> = self
            .past_inputs
            .iter()
            .map(|name| (name.clone(), OwnedTensor::new(empty_cache.clone(), Vec::new())))
            .collect();

        let speaker = OwnedTensor::new(vec![1, speaker.len()], speaker.to_vec());
        let mut output_sequence = OwnedTensor::new(vec![1, 1, mel_bins], vec![0.0f32; mel_bins]);
        let mut spectrogram = Vec::new();
        let mut use_cache = false;

        for step in 1..=max_steps {
            let mut inputs: SessionInputs = vec![
                ("output_sequence".into(), output_sequence.to_input()?),
                ("encoder_hidden_states".into(), hidden_states.to_input()?),
                ("encoder_attention_mask".into(), encoder_mask.to_input()?),
                ("speaker_embeddings".into(), speaker.to_input()?),
                (
                    "use_cache_branch".into(),
                    OwnedTensor::new(vec![1], vec![use_cache]).to_input()?,
                ),
            ];
            for (name, tensor) in &past {
                inputs.push((name.clone().into(), tensor.to_input()?));
            }

            let outputs = self.decoder.run(inputs).map_err(InferenceError::runtime)?;

            output_sequence = OwnedTensor::extract(&outputs["output_sequence_out"])?;
            let spectrum = OwnedTensor::<f32>::extract(&outputs["spectrum"])?;
            let prob = OwnedTensor::<f32>::extract(&outputs["prob"])?;
            spectrogram.extend_from_slice(&spectrum.data);

            past = self
                .present_outputs
                .iter()
                .map(|name| {
                    let tensor = OwnedTensor::extract(&outputs[name.as_str()])?;
                    Ok((past_input_name(name), tensor))
                })
                .collect::<Result<_, InferenceError>>()?;
            use_cache = true;

            if should_stop(step, min_steps, &prob.data) {
                tracing::debug!(steps = step, max_steps, "Stop token reached");
                break;
            }
        }

        Ok(spectrogram)
    }

    fn vocode(&mut self, spectrogram: Vec<f32>) -> Result<Vec<f32>, InferenceError> {
        let frames = spectrogram_frames(spectrogram.len(), self.config.num_mel_bins)?;
        let spectrogram = OwnedTensor::new(vec![frames, self.config.num_mel_bins], spectrogram);

        let outputs = self
            .vocoder
            .run(vec![("spectrogram", spectrogram.to_input()?)])
            .map_err(InferenceError::runtime)?;
        let waveform = OwnedTensor::<f32>::extract(&outputs["waveform"])?;

        tracing::debug!(frames, samples = waveform.data.len(), "Vocoder finished");
        Ok(waveform.data)
    }
}

fn load_session(path: &Path, intra_threads: usize) -> Result<Session, InferenceError> {
    if !path.exists() {
        return Err(InferenceError::ModelNotFound(path.to_path_buf()));
    }

    Session::builder()
        .map_err(InferenceError::runtime)?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(InferenceError::runtime)?
        .with_intra_threads(intra_threads.max(1))
        .map_err(InferenceError::runtime)?
        .commit_from_file(path)
        .map_err(InferenceError::runtime)
}

/// Maps a decoder cache output onto the input that consumes it next step.
fn past_input_name(present: &str) -> String {
    match present.strip_prefix(PRESENT_PREFIX) {
        Some(rest) => format!("{PAST_PREFIX}{rest}"),
        None => present.to_string(),
    }
}

fn should_stop(step: usize, min_steps: usize, probs: &[f32]) -> bool {
    step >= min_steps && probs.iter().any(|&p| p >= STOP_THRESHOLD)
}

fn spectrogram_frames(len: usize, mel_bins: usize) -> Result<usize, InferenceError> {
    if len == 0 || len % mel_bins != 0 {
        return Err(InferenceError::Output(format!(
            "spectrogram of {len} values is not a whole number of {mel_bins}-bin frames"
        )));
    }
    Ok(len / mel_bins)
}

/// Tensor data copied out of a session output, so it can outlive the run.
#[derive(Debug, Clone, PartialEq)]
struct OwnedTensor<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T> OwnedTensor<T>
where
    T: PrimitiveTensorElementType + Debug + Clone + 'static,
{
    fn new(shape: Vec<usize>, data: Vec<T>) -> Self {
        Self { shape, data }
    }

    fn extract(value: &DynValue) -> Result<Self, InferenceError> {
        let (shape, data) = value
            .try_extract_tensor::<T>()
            .map_err(|e| InferenceError::Output(e.to_string()))?;
        Ok(Self {
            shape: shape.iter().map(|&dim| dim.max(0) as usize).collect(),
            data: data.to_vec(),
        })
    }

    fn to_input(&self) -> Result<SessionInputValue<'static>, InferenceError> {
        let tensor = Tensor::from_array((self.shape.clone(), self.data.clone()))
            .map_err(InferenceError::runtime)?;
        Ok(SessionInputValue::Owned(Value::from(tensor)))
    }
}
