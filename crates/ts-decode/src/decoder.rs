use tracing::{debug, info, trace, warn};
use ts_model::InferenceAdapter;

use crate::beam::{Beam, Hypothesis};
use crate::cancel::CancellationToken;
use crate::config::DecoderConfig;
use crate::error::{DecodeError, Result};

/// Where a decode session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Beam holds only the prompt; no step has run.
    Init,
    /// At least one step has run and more may follow.
    Stepping,
    /// Every hypothesis ended with end-of-sequence, or the step cap was hit.
    Done,
    /// Cancellation was observed between steps.
    Interrupted,
    /// A step returned an error.
    Failed,
}

impl DecodeState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DecodeState::Done | DecodeState::Interrupted | DecodeState::Failed
        )
    }
}

/// Everything a finished (or abandoned) session produced.
#[derive(Debug, Clone)]
pub struct DecodeOutcome {
    pub state: DecodeState,
    /// One token per step: the newest token of the best hypothesis.
    pub emitted: Vec<u32>,
    /// Prompt followed by every emitted token. Never loses its prefix.
    pub transcript: Vec<u32>,
    /// Final beam, best first. Windows are bounded by the context length.
    pub beam: Vec<Hypothesis>,
    pub steps: usize,
    /// Generation stopped at `max_steps` rather than on end-of-sequence.
    pub truncated: bool,
}

/// Beam-search decoder bound to one inference adapter.
///
/// The adapter is handed in once and reused for every prompt.
pub struct BeamDecoder<A> {
    adapter: A,
    config: DecoderConfig,
    eos_id: u32,
}

impl<A: InferenceAdapter> BeamDecoder<A> {
    /// Bind an adapter to a decoder configuration.
    ///
    /// # Errors
    /// Invalid configuration, a context length the adapter is not built
    /// for, a beam wider than the vocabulary or the adapter's batch, or an
    /// end-of-sequence id outside the vocabulary.
    pub fn new(adapter: A, config: DecoderConfig, eos_id: u32) -> Result<Self> {
        config.validate()?;

        if adapter.context_length() != config.context_length {
            return Err(DecodeError::UnsupportedContextLength {
                configured: config.context_length,
                adapter: adapter.context_length(),
            });
        }
        if config.beam_width > adapter.vocab_size() {
            return Err(DecodeError::BeamWiderThanVocab {
                beam_width: config.beam_width,
                vocab_size: adapter.vocab_size(),
            });
        }
        if config.beam_width > adapter.max_batch() {
            return Err(DecodeError::BeamWiderThanBatch {
                beam_width: config.beam_width,
                max_batch: adapter.max_batch(),
            });
        }
        if eos_id as usize >= adapter.vocab_size() {
            return Err(DecodeError::EosOutOfRange {
                eos_id,
                vocab_size: adapter.vocab_size(),
            });
        }

        Ok(Self {
            adapter,
            config,
            eos_id,
        })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn eos_id(&self) -> u32 {
        self.eos_id
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn into_adapter(self) -> A {
        self.adapter
    }

    /// Start decoding from a prompt.
    ///
    /// # Errors
    /// `EmptyPrompt`, or `PromptTooLong` if the prompt exceeds the context
    /// length.
    pub fn session(&mut self, prompt: &[u32]) -> Result<DecodeSession<'_, A>> {
        if prompt.is_empty() {
            return Err(DecodeError::EmptyPrompt);
        }
        if prompt.len() > self.config.context_length {
            return Err(DecodeError::PromptTooLong {
                len: prompt.len(),
                max: self.config.context_length,
            });
        }

        debug!(
            prompt_tokens = prompt.len(),
            beam_width = self.config.beam_width,
            max_steps = ?self.config.max_steps,
            "starting decode session"
        );

        Ok(DecodeSession {
            adapter: &mut self.adapter,
            config: &self.config,
            eos_id: self.eos_id,
            beam: Beam::from_prompt(prompt.to_vec()),
            state: DecodeState::Init,
            steps: 0,
            emitted: Vec::new(),
            transcript: prompt.to_vec(),
            truncated: false,
            cancel: None,
        })
    }

    /// Run a whole session and collect the result.
    pub fn decode(&mut self, prompt: &[u32], cancel: &CancellationToken) -> Result<DecodeOutcome> {
        let mut session = self.session(prompt)?.with_cancellation(cancel.clone());
        while session.step()?.is_some() {}
        Ok(session.finish())
    }
}

/// One generation run. Owns the beam; borrows the adapter exclusively.
///
/// Iterating yields each step's emitted token until the session reaches a
/// terminal state. A failed step yields its error once, then iteration
/// ends.
pub struct DecodeSession<'a, A> {
    adapter: &'a mut A,
    config: &'a DecoderConfig,
    eos_id: u32,
    beam: Beam,
    state: DecodeState,
    steps: usize,
    emitted: Vec<u32>,
    transcript: Vec<u32>,
    truncated: bool,
    cancel: Option<CancellationToken>,
}

impl<'a, A: InferenceAdapter> DecodeSession<'a, A> {
    /// Check `token` before each step and stop as `Interrupted` once it is
    /// cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    pub fn beam(&self) -> &Beam {
        &self.beam
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn emitted(&self) -> &[u32] {
        &self.emitted
    }

    pub fn transcript(&self) -> &[u32] {
        &self.transcript
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Run one decoding step.
    ///
    /// Returns `Ok(Some(token))` for the token emitted by this step and
    /// `Ok(None)` once the session is terminal (possibly becoming so in
    /// this call through cancellation or the step cap).
    ///
    /// # Errors
    /// `StepFailed` carrying the tokens emitted so far. The session is then
    /// `Failed` and further calls return `Ok(None)`.
    pub fn step(&mut self) -> Result<Option<u32>> {
        if self.state.is_terminal() {
            return Ok(None);
        }

        if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            self.state = DecodeState::Interrupted;
            info!(steps = self.steps, "generation interrupted");
            return Ok(None);
        }

        if let Some(max_steps) = self.config.max_steps {
            if self.steps >= max_steps {
                self.state = DecodeState::Done;
                self.truncated = true;
                warn!(max_steps, "step cap reached before end-of-sequence");
                return Ok(None);
            }
        }

        match self.advance() {
            Ok(token) => Ok(Some(token)),
            Err(source) => {
                self.state = DecodeState::Failed;
                warn!(step = self.steps + 1, error = %source, "decoding step failed");
                Err(DecodeError::StepFailed {
                    step: self.steps + 1,
                    emitted: self.emitted.clone(),
                    source: Box::new(source),
                })
            }
        }
    }

    fn advance(&mut self) -> Result<u32> {
        self.state = DecodeState::Stepping;
        let width = self.config.beam_width;

        let slid = self.beam.slide(self.config.context_length);
        if slid > 0 {
            trace!(hypotheses = slid, "context window full, dropped oldest token");
        }

        let windows = self.beam.windows();
        let scores = self.adapter.score_batch(&windows)?;
        if scores.len() != windows.len() {
            return Err(DecodeError::MalformedScores(format!(
                "{} distributions for {} sequences",
                scores.len(),
                windows.len()
            )));
        }
        let vocab_size = self.adapter.vocab_size();
        if let Some(bad) = scores.iter().find(|d| d.len() != vocab_size) {
            return Err(DecodeError::MalformedScores(format!(
                "distribution of length {}, vocabulary has {} tokens",
                bad.len(),
                vocab_size
            )));
        }

        let candidates = self.beam.expand(&scores, width)?;
        self.beam.prune(candidates, width);

        let best = self
            .beam
            .best()
            .ok_or_else(|| DecodeError::MalformedScores("beam is empty".to_string()))?;
        let token = best
            .last_token()
            .ok_or_else(|| DecodeError::MalformedScores("empty hypothesis".to_string()))?;

        self.steps += 1;
        self.emitted.push(token);
        self.transcript.push(token);
        trace!(step = self.steps, token, score = best.score, "emitted token");

        if self.beam.all_end_with(self.eos_id) {
            self.state = DecodeState::Done;
            debug!(steps = self.steps, "all hypotheses reached end-of-sequence");
        }

        Ok(token)
    }

    /// Stop the session and hand back what it produced.
    pub fn finish(self) -> DecodeOutcome {
        DecodeOutcome {
            state: self.state,
            emitted: self.emitted,
            transcript: self.transcript,
            beam: self.beam.hypotheses().to_vec(),
            steps: self.steps,
            truncated: self.truncated,
        }
    }
}

impl<'a, A: InferenceAdapter> Iterator for DecodeSession<'a, A> {
    type Item = Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        self.step().transpose()
    }
}
