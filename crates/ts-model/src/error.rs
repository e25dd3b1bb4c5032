use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("unsupported context length: compute graph is fixed at {expected}, requested {got}")]
    UnsupportedContextLength { expected: usize, got: usize },
    #[error("batch of {got} sequences exceeds the supported maximum of {max}")]
    BatchTooLarge { max: usize, got: usize },
    #[error("sequence {index} in the batch is empty")]
    EmptySequence { index: usize },
    #[error("sequence {index} has {len} tokens, context length is {max}")]
    SequenceTooLong { index: usize, len: usize, max: usize },
    #[error("token id {token} is outside the vocabulary of {vocab_size} tokens")]
    TokenOutOfRange { token: u32, vocab_size: usize },
    #[error("embedding shape error: {0}")]
    EmbeddingShape(String),
    #[error("forward model failed: {0}")]
    Forward(String),
    #[error("tokenizer error: {0}")]
    TokenizerError(String),
    #[error("tensor error: {0}")]
    TensorError(#[from] ts_tensor::TensorError),
}

pub type Result<T> = std::result::Result<T, ModelError>;
