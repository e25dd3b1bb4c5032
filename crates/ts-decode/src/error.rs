use thiserror::Error;

use ts_model::ModelError;
use ts_sampler::SamplerError;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid decoder configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported context length: adapter is bound to {adapter}, decoder configured for {configured}")]
    UnsupportedContextLength { configured: usize, adapter: usize },
    #[error("beam width {beam_width} exceeds the vocabulary of {vocab_size} tokens")]
    BeamWiderThanVocab { beam_width: usize, vocab_size: usize },
    #[error("beam width {beam_width} exceeds the adapter batch limit of {max_batch}")]
    BeamWiderThanBatch { beam_width: usize, max_batch: usize },
    #[error("end-of-sequence id {eos_id} is outside the vocabulary of {vocab_size} tokens")]
    EosOutOfRange { eos_id: u32, vocab_size: usize },
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("prompt has {len} tokens, context length is {max}")]
    PromptTooLong { len: usize, max: usize },
    #[error("adapter returned malformed scores: {0}")]
    MalformedScores(String),
    #[error("decoding step {step} failed after {} emitted tokens: {source}", .emitted.len())]
    StepFailed {
        step: usize,
        emitted: Vec<u32>,
        #[source]
        source: Box<DecodeError>,
    },
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("sampler error: {0}")]
    Sampler(#[from] SamplerError),
}

impl DecodeError {
    /// Tokens emitted before a mid-generation failure. Empty for every
    /// other kind of error.
    pub fn partial_output(&self) -> &[u32] {
        match self {
            DecodeError::StepFailed { emitted, .. } => emitted,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
