//! The batched next-token scoring contract consumed by the decoder, and the
//! reference implementation that wraps an opaque forward model with
//! embedding lookups and a reverse-embedding projection.

pub mod embedding;
pub mod forward;

pub use embedding::{AdapterConfig, EmbeddingAdapter, Embeddings};
pub use forward::ForwardModel;

/// How the adapter turns the projected hidden state into scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreMode {
    /// Raw reverse-embedding output (unnormalized logits).
    #[default]
    Logits,
    /// Log-probabilities (log-softmax over the vocabulary).
    LogSoftmax,
}

/// Batched next-token scoring over fixed-length token windows.
///
/// Implementations are bound to one context length for their whole
/// lifetime. From the caller's point of view `score_batch` is a pure
/// function: any padding, lane filling, or caching stays internal.
pub trait InferenceAdapter: Send {
    /// The context length L this adapter was built for.
    fn context_length(&self) -> usize;

    /// Number of entries in every returned distribution.
    fn vocab_size(&self) -> usize;

    /// Largest number of sequences a single `score_batch` call accepts.
    fn max_batch(&self) -> usize;

    /// Score a batch of token sequences.
    ///
    /// Each sequence must be non-empty and at most `context_length()` long.
    /// Returns one dense vector of length `vocab_size()` per input sequence,
    /// in input order, evaluated at that sequence's last token.
    fn score_batch(&mut self, sequences: &[&[u32]]) -> crate::Result<Vec<Vec<f32>>>;
}

impl<A: InferenceAdapter + ?Sized> InferenceAdapter for &mut A {
    fn context_length(&self) -> usize {
        (**self).context_length()
    }

    fn vocab_size(&self) -> usize {
        (**self).vocab_size()
    }

    fn max_batch(&self) -> usize {
        (**self).max_batch()
    }

    fn score_batch(&mut self, sequences: &[&[u32]]) -> crate::Result<Vec<Vec<f32>>> {
        (**self).score_batch(sequences)
    }
}

impl<A: InferenceAdapter + ?Sized> InferenceAdapter for Box<A> {
    fn context_length(&self) -> usize {
        (**self).context_length()
    }

    fn vocab_size(&self) -> usize {
        (**self).vocab_size()
    }

    fn max_batch(&self) -> usize {
        (**self).max_batch()
    }

    fn score_batch(&mut self, sequences: &[&[u32]]) -> crate::Result<Vec<Vec<f32>>> {
        (**self).score_batch(sequences)
    }
}
