//! Deterministic adapters and a word-level tokenizer shared by the
//! integration tests.

#![allow(dead_code)]

use ts_model::{InferenceAdapter, ModelError, Tokenizer};

pub const EOS: u32 = 0;

type ScoreFn = Box<dyn FnMut(usize, &[u32]) -> Vec<f32> + Send>;

/// Adapter driven by a closure of `(call_index, window) -> distribution`.
///
/// Records every batch it is asked to score and can be told to fail on a
/// given call.
pub struct StubAdapter {
    pub vocab_size: usize,
    pub context_length: usize,
    pub max_batch: usize,
    pub calls: usize,
    pub batches: Vec<Vec<Vec<u32>>>,
    pub fail_on_call: Option<usize>,
    score: ScoreFn,
}

impl StubAdapter {
    pub fn from_fn(
        vocab_size: usize,
        context_length: usize,
        score: impl FnMut(usize, &[u32]) -> Vec<f32> + Send + 'static,
    ) -> Self {
        Self {
            vocab_size,
            context_length,
            max_batch: 8,
            calls: 0,
            batches: Vec::new(),
            fail_on_call: None,
            score: Box::new(score),
        }
    }

    /// On call `i`, every sequence gets a distribution peaking at
    /// `peaks[i]` (score 0.0; every other token -1.0 minus its id / 100).
    pub fn scripted(vocab_size: usize, context_length: usize, peaks: Vec<u32>) -> Self {
        Self::from_fn(vocab_size, context_length, move |call, _| {
            let peak = peaks.get(call).copied().unwrap_or(EOS);
            one_hot(vocab_size, peak)
        })
    }

    /// Every sequence's distribution depends only on its last token.
    pub fn by_last_token(
        vocab_size: usize,
        context_length: usize,
        table: impl Fn(u32) -> Vec<f32> + Send + 'static,
    ) -> Self {
        Self::from_fn(vocab_size, context_length, move |_, window| {
            table(*window.last().expect("non-empty window"))
        })
    }

    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }
}

/// Distribution with a unique maximum at `peak`.
pub fn one_hot(vocab_size: usize, peak: u32) -> Vec<f32> {
    (0..vocab_size)
        .map(|i| {
            if i as u32 == peak {
                0.0
            } else {
                -1.0 - i as f32 / 100.0
            }
        })
        .collect()
}

impl InferenceAdapter for StubAdapter {
    fn context_length(&self) -> usize {
        self.context_length
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn max_batch(&self) -> usize {
        self.max_batch
    }

    fn score_batch(&mut self, sequences: &[&[u32]]) -> ts_model::Result<Vec<Vec<f32>>> {
        let call = self.calls;
        self.calls += 1;
        self.batches
            .push(sequences.iter().map(|s| s.to_vec()).collect());

        if self.fail_on_call == Some(call) {
            return Err(ModelError::Forward(format!("injected failure on call {}", call)));
        }
        for (index, seq) in sequences.iter().enumerate() {
            if seq.len() > self.context_length {
                return Err(ModelError::SequenceTooLong {
                    index,
                    len: seq.len(),
                    max: self.context_length,
                });
            }
        }

        Ok(sequences.iter().map(|s| (self.score)(call, s)).collect())
    }
}

/// Whitespace-preserving word tokenizer over a fixed word list.
pub struct WordTokenizer {
    pub words: Vec<&'static str>,
}

impl WordTokenizer {
    /// {0 = eos, 1 = "Once", 2 = " upon", 3 = " a", 4 = " time"}
    pub fn once_upon_a_time() -> Self {
        Self {
            words: vec!["<|endoftext|>", "Once", " upon", " a", " time"],
        }
    }
}

impl Tokenizer for WordTokenizer {
    fn encode(&self, text: &str) -> ts_model::Result<Vec<u32>> {
        let mut rest = text;
        let mut ids = Vec::new();
        while !rest.is_empty() {
            let (id, word) = self
                .words
                .iter()
                .enumerate()
                .skip(1)
                .find(|(_, w)| rest.starts_with(**w))
                .ok_or_else(|| ModelError::TokenizerError(format!("cannot encode {:?}", rest)))?;
            ids.push(id as u32);
            rest = &rest[word.len()..];
        }
        Ok(ids)
    }

    fn decode(&self, tokens: &[u32], skip_special_tokens: bool) -> String {
        tokens
            .iter()
            .filter(|&&t| !(skip_special_tokens && t == EOS))
            .filter_map(|&t| self.words.get(t as usize).copied())
            .collect()
    }

    fn eos_id(&self) -> u32 {
        EOS
    }

    fn pad_id(&self) -> u32 {
        EOS
    }
}
