pub mod adapter;
pub mod error;
pub mod tokenizer;

pub use adapter::{
    AdapterConfig, EmbeddingAdapter, Embeddings, ForwardModel, InferenceAdapter, ScoreMode,
};
pub use error::{ModelError, Result};
pub use tokenizer::{BpeTokenizer, Tokenizer, Vocab};
