use std::time::{Duration, Instant};

use tracing::info;
use ts_model::{InferenceAdapter, Tokenizer};

use crate::cancel::CancellationToken;
use crate::config::DecoderConfig;
use crate::decoder::{BeamDecoder, DecodeOutcome, DecodeState};
use crate::error::Result;
use crate::sink::{FinishReason, TextSink};

/// A generated story.
#[derive(Debug, Clone)]
pub struct Story {
    /// The prompt as the tokenizer renders it back.
    pub prompt_text: String,
    /// Prompt text followed by every streamed fragment.
    pub text: String,
    pub outcome: DecodeOutcome,
    pub finish: FinishReason,
    pub elapsed: Duration,
}

/// Prompt-to-story driver.
///
/// Built once from an adapter and a tokenizer and reused for every prompt;
/// the handle is the only place either lives.
pub struct StoryGenerator<A, T> {
    decoder: BeamDecoder<A>,
    tokenizer: T,
    tokens_generated: usize,
}

impl<A: InferenceAdapter, T: Tokenizer> StoryGenerator<A, T> {
    /// The decoder stops on the tokenizer's end-of-sequence id.
    pub fn new(adapter: A, tokenizer: T, config: DecoderConfig) -> Result<Self> {
        let decoder = BeamDecoder::new(adapter, config, tokenizer.eos_id())?;
        Ok(Self {
            decoder,
            tokenizer,
            tokens_generated: 0,
        })
    }

    pub fn decoder(&self) -> &BeamDecoder<A> {
        &self.decoder
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Tokens emitted over this handle's lifetime, across all calls.
    pub fn tokens_generated(&self) -> usize {
        self.tokens_generated
    }

    /// Generate a continuation of `prompt`, streaming one decoded fragment
    /// per step into `sink`.
    ///
    /// Cancellation ends the run as `FinishReason::Interrupted` and still
    /// returns the partial story. On a failed step the error carries the
    /// tokens emitted so far, and the sink has already received their text.
    pub fn generate(
        &mut self,
        prompt: &str,
        cancel: &CancellationToken,
        sink: &mut dyn TextSink,
    ) -> Result<Story> {
        let prompt_ids = self.tokenizer.encode(prompt)?;
        let prompt_text = self.tokenizer.decode(&prompt_ids, true);
        let mut text = prompt_text.clone();
        let started = Instant::now();

        info!(
            prompt_tokens = prompt_ids.len(),
            beam_width = self.decoder.config().beam_width,
            "generating story"
        );

        let mut session = self
            .decoder
            .session(&prompt_ids)?
            .with_cancellation(cancel.clone());

        loop {
            match session.step() {
                Ok(Some(token)) => {
                    let fragment = self.tokenizer.decode(&[token], true);
                    text.push_str(&fragment);
                    sink.on_fragment(&fragment);
                }
                Ok(None) => break,
                Err(e) => {
                    self.tokens_generated += session.steps();
                    return Err(e);
                }
            }
        }

        let outcome = session.finish();
        self.tokens_generated += outcome.steps;

        let finish = match outcome.state {
            DecodeState::Interrupted => FinishReason::Interrupted,
            _ => FinishReason::Completed {
                truncated: outcome.truncated,
            },
        };
        sink.on_finish(finish);

        let elapsed = started.elapsed();
        info!(
            steps = outcome.steps,
            truncated = outcome.truncated,
            interrupted = finish == FinishReason::Interrupted,
            elapsed_ms = elapsed.as_millis() as u64,
            "story generation finished"
        );

        Ok(Story {
            prompt_text,
            text,
            outcome,
            finish,
            elapsed,
        })
    }
}
