//! `ts-decode` - beam-search text generation over a black-box inference
//! adapter.
//!
//! - [`BeamDecoder`] / [`DecodeSession`]: the decoding state machine, a lazy
//!   iterator of emitted tokens
//! - [`StoryGenerator`]: prompt text in, streamed story text out
//! - [`CancellationToken`]: cooperative stop signal checked between steps

pub mod beam;
pub mod cancel;
pub mod config;
pub mod decoder;
pub mod error;
pub mod generator;
pub mod sink;

pub use beam::{Beam, Candidate, Hypothesis};
pub use cancel::CancellationToken;
pub use config::{DecoderConfig, StoryConfig};
pub use decoder::{BeamDecoder, DecodeOutcome, DecodeSession, DecodeState};
pub use error::{DecodeError, Result};
pub use generator::{Story, StoryGenerator};
pub use sink::{FinishReason, FnSink, StringSink, TextSink};
