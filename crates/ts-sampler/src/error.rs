use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplerError {
    #[error("invalid k={k} for a distribution over {vocab_size} tokens")]
    InvalidK { k: usize, vocab_size: usize },
    #[error("cannot select from an empty distribution")]
    EmptyDistribution,
}

pub type Result<T> = std::result::Result<T, SamplerError>;
