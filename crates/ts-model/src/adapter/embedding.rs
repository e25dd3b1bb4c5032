use std::sync::Arc;

use tracing::{debug, trace};
use ts_tensor::{ComputeBackend, CpuBackend, Shape, Tensor};

use super::{ForwardModel, InferenceAdapter, ScoreMode};
use crate::error::{ModelError, Result};

/// The embedding matrices that sit on either side of the forward model.
///
/// - `token_table`: `[vocab_size, hidden_size]`, one row per token
/// - `positions`: `[max_positions, hidden_size]`, one row per position
/// - `reverse`: `[hidden_size, vocab_size]`, projects hidden states to logits
///
/// Half-precision tables are widened to f32 once, here.
#[derive(Debug, Clone)]
pub struct Embeddings {
    token_table: Tensor,
    positions: Tensor,
    reverse: Tensor,
}

impl Embeddings {
    pub fn new(token_table: Tensor, positions: Tensor, reverse: Tensor) -> Result<Embeddings> {
        for (name, t) in [
            ("token table", &token_table),
            ("position table", &positions),
            ("reverse embedding", &reverse),
        ] {
            if t.shape().ndim() != 2 {
                return Err(ModelError::EmbeddingShape(format!(
                    "{} must be 2D, got {}",
                    name,
                    t.shape()
                )));
            }
        }

        let vocab_size = token_table.shape().dim(0);
        let hidden_size = token_table.shape().dim(1);
        if vocab_size == 0 || hidden_size == 0 {
            return Err(ModelError::EmbeddingShape(format!(
                "token table {} has an empty dimension",
                token_table.shape()
            )));
        }
        if positions.shape().dim(1) != hidden_size {
            return Err(ModelError::EmbeddingShape(format!(
                "position table {} does not match hidden size {}",
                positions.shape(),
                hidden_size
            )));
        }
        if reverse.shape().dims() != [hidden_size, vocab_size] {
            return Err(ModelError::EmbeddingShape(format!(
                "reverse embedding {} should be [{}, {}]",
                reverse.shape(),
                hidden_size,
                vocab_size
            )));
        }

        Ok(Embeddings {
            token_table: token_table.to_f32(),
            positions: positions.to_f32(),
            reverse: reverse.to_f32(),
        })
    }

    pub fn vocab_size(&self) -> usize {
        self.token_table.shape().dim(0)
    }

    pub fn hidden_size(&self) -> usize {
        self.token_table.shape().dim(1)
    }

    /// Number of rows in the position table.
    pub fn max_positions(&self) -> usize {
        self.positions.shape().dim(0)
    }

    /// Embed a full window: row `p` is `token_table[window[p]] + positions[p]`.
    pub fn embed(&self, window: &[u32], backend: &dyn ComputeBackend) -> Result<Tensor> {
        if window.len() > self.max_positions() {
            return Err(ModelError::EmbeddingShape(format!(
                "window of {} tokens exceeds {} positions",
                window.len(),
                self.max_positions()
            )));
        }

        let hidden_size = self.hidden_size();
        let mut data = Vec::with_capacity(window.len() * hidden_size);
        for (pos, &token) in window.iter().enumerate() {
            if token as usize >= self.vocab_size() {
                return Err(ModelError::TokenOutOfRange {
                    token,
                    vocab_size: self.vocab_size(),
                });
            }
            let row = backend.add(self.token_table.row(token as usize)?, self.positions.row(pos)?)?;
            data.extend_from_slice(&row);
        }

        Ok(Tensor::new(data, Shape::matrix(window.len(), hidden_size))?)
    }

    /// Project one hidden-state row onto the vocabulary.
    pub fn project(&self, hidden: &[f32], backend: &dyn ComputeBackend) -> Result<Vec<f32>> {
        Ok(backend.matmul(
            hidden,
            self.reverse.data_f32()?,
            1,
            self.hidden_size(),
            self.vocab_size(),
        )?)
    }
}

/// Settings for an [`EmbeddingAdapter`].
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Context length L requested by the caller. Must equal the forward
    /// model's compiled context length.
    pub context_length: usize,
    /// Token used to right-pad windows and to fill unused lanes.
    pub pad_token_id: u32,
    pub score_mode: ScoreMode,
    /// Batch limit for models without a fixed lane count.
    pub max_batch: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            context_length: 128,
            pad_token_id: 50256,
            score_mode: ScoreMode::Logits,
            max_batch: 8,
        }
    }
}

/// [`InferenceAdapter`] around an opaque [`ForwardModel`].
///
/// Per call: right-pad every sequence to L, embed it, top up fixed-lane
/// batches with all-pad windows, run the model, then project each real
/// sequence's last position through the reverse embedding. Outputs of the
/// synthetic lanes are dropped.
pub struct EmbeddingAdapter<M> {
    model: M,
    embeddings: Embeddings,
    config: AdapterConfig,
    backend: Arc<dyn ComputeBackend>,
    /// Embedded all-pad window, built on first use.
    pad_lane: Option<Tensor>,
}

impl<M: ForwardModel> EmbeddingAdapter<M> {
    /// Bind a forward model and its embeddings.
    ///
    /// # Errors
    /// `UnsupportedContextLength` if the model's compiled context length
    /// differs from `config.context_length`; `EmbeddingShape` if the tables
    /// do not fit the model.
    pub fn new(
        model: M,
        embeddings: Embeddings,
        config: AdapterConfig,
        backend: Arc<dyn ComputeBackend>,
    ) -> Result<Self> {
        if model.context_length() != config.context_length {
            return Err(ModelError::UnsupportedContextLength {
                expected: model.context_length(),
                got: config.context_length,
            });
        }
        if model.hidden_size() != embeddings.hidden_size() {
            return Err(ModelError::EmbeddingShape(format!(
                "model hidden size {} does not match embedding width {}",
                model.hidden_size(),
                embeddings.hidden_size()
            )));
        }
        if embeddings.max_positions() < config.context_length {
            return Err(ModelError::EmbeddingShape(format!(
                "position table has {} rows, context length is {}",
                embeddings.max_positions(),
                config.context_length
            )));
        }
        if config.pad_token_id as usize >= embeddings.vocab_size() {
            return Err(ModelError::TokenOutOfRange {
                token: config.pad_token_id,
                vocab_size: embeddings.vocab_size(),
            });
        }
        if model.lanes() == Some(0) {
            return Err(ModelError::Forward("model reports zero lanes".to_string()));
        }
        if model.lanes().is_none() && config.max_batch == 0 {
            return Err(ModelError::Forward("max_batch must be at least 1".to_string()));
        }

        debug!(
            context_length = config.context_length,
            vocab_size = embeddings.vocab_size(),
            hidden_size = embeddings.hidden_size(),
            lanes = ?model.lanes(),
            backend = backend.name(),
            "bound forward model to embedding adapter"
        );

        Ok(EmbeddingAdapter {
            model,
            embeddings,
            config,
            backend,
            pad_lane: None,
        })
    }

    /// Same as [`EmbeddingAdapter::new`] on the reference CPU backend.
    pub fn with_cpu(model: M, embeddings: Embeddings, config: AdapterConfig) -> Result<Self> {
        Self::new(model, embeddings, config, Arc::new(CpuBackend::new()))
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    fn embed_window(&self, sequence: &[u32]) -> Result<Tensor> {
        let mut window = sequence.to_vec();
        window.resize(self.config.context_length, self.config.pad_token_id);
        self.embeddings.embed(&window, self.backend.as_ref())
    }

    fn pad_lane(&mut self) -> Result<Tensor> {
        if let Some(lane) = &self.pad_lane {
            return Ok(lane.clone());
        }
        let lane = self.embed_window(&[])?;
        self.pad_lane = Some(lane.clone());
        Ok(lane)
    }

    fn validate(&self, sequences: &[&[u32]]) -> Result<()> {
        if sequences.len() > self.max_batch() {
            return Err(ModelError::BatchTooLarge {
                max: self.max_batch(),
                got: sequences.len(),
            });
        }
        for (index, seq) in sequences.iter().enumerate() {
            if seq.is_empty() {
                return Err(ModelError::EmptySequence { index });
            }
            if seq.len() > self.config.context_length {
                return Err(ModelError::SequenceTooLong {
                    index,
                    len: seq.len(),
                    max: self.config.context_length,
                });
            }
        }
        Ok(())
    }
}

impl<M: ForwardModel> InferenceAdapter for EmbeddingAdapter<M> {
    fn context_length(&self) -> usize {
        self.config.context_length
    }

    fn vocab_size(&self) -> usize {
        self.embeddings.vocab_size()
    }

    fn max_batch(&self) -> usize {
        self.model.lanes().unwrap_or(self.config.max_batch)
    }

    fn score_batch(&mut self, sequences: &[&[u32]]) -> Result<Vec<Vec<f32>>> {
        self.validate(sequences)?;
        if sequences.is_empty() {
            return Ok(Vec::new());
        }

        let lanes = self.model.lanes().unwrap_or(sequences.len());
        let mut inputs = Vec::with_capacity(lanes);
        for seq in sequences {
            inputs.push(self.embed_window(seq)?);
        }
        let synthetic = lanes - sequences.len();
        if synthetic > 0 {
            let pad = self.pad_lane()?;
            inputs.extend(std::iter::repeat(pad).take(synthetic));
        }

        trace!(
            sequences = sequences.len(),
            synthetic_lanes = synthetic,
            "running forward model"
        );
        let outputs = self.model.run(&inputs)?;
        if outputs.len() != lanes {
            return Err(ModelError::Forward(format!(
                "model returned {} outputs for {} lanes",
                outputs.len(),
                lanes
            )));
        }

        let hidden_shape = Shape::matrix(self.config.context_length, self.embeddings.hidden_size());
        let vocab_size = self.embeddings.vocab_size();
        let backend = self.backend.as_ref();

        // zip() stops at the real sequences; synthetic lane outputs are dropped.
        let mut scores = Vec::with_capacity(sequences.len());
        for (seq, output) in sequences.iter().zip(&outputs) {
            let hidden = output.to_f32().reshape(hidden_shape.clone())?;
            let logits = self.embeddings.project(hidden.row(seq.len() - 1)?, backend)?;
            let row = match self.config.score_mode {
                ScoreMode::Logits => logits,
                ScoreMode::LogSoftmax => backend.log_softmax(&logits, vocab_size)?,
            };
            scores.push(row);
        }
        Ok(scores)
    }
}
