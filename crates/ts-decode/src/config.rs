use std::path::{Path, PathBuf};

use crate::error::{DecodeError, Result};

/// Parameters controlling beam-search decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Context length L. Must match the adapter's.
    pub context_length: usize,
    /// Hypotheses kept per step. 1 is greedy decoding.
    pub beam_width: usize,
    /// Safety cap on decoding steps. Reaching it ends generation as
    /// completed-but-truncated. `None` means no cap.
    pub max_steps: Option<usize>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            context_length: 128,
            beam_width: 1,
            max_steps: Some(1024),
        }
    }
}

impl DecoderConfig {
    pub fn with_context_length(mut self, context_length: usize) -> Self {
        self.context_length = context_length;
        self
    }

    pub fn with_beam_width(mut self, beam_width: usize) -> Self {
        self.beam_width = beam_width;
        self
    }

    pub fn with_max_steps(mut self, max_steps: Option<usize>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.context_length == 0 {
            return Err(DecodeError::InvalidConfig(
                "context_length must be at least 1".to_string(),
            ));
        }
        if self.beam_width == 0 {
            return Err(DecodeError::InvalidConfig(
                "beam_width must be at least 1".to_string(),
            ));
        }
        if self.max_steps == Some(0) {
            return Err(DecodeError::InvalidConfig(
                "max_steps must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level settings for a story generation process.
///
/// `data_dir` is opaque to decoding; it only names where the compiled model
/// and its embedding matrices live so whoever builds the adapter can find
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryConfig {
    pub data_dir: PathBuf,
    pub decoder: DecoderConfig,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            decoder: DecoderConfig::default(),
        }
    }
}

impl StoryConfig {
    pub const MODEL_FILE: &'static str = "tinystories33M.dfp";
    pub const EMBEDDING_TABLE_FILE: &'static str = "embedding_table.npy";
    pub const POSITION_TABLE_FILE: &'static str = "positional_embedding_matrix.npy";
    pub const REVERSE_EMBEDDING_FILE: &'static str = "reverse_embedding_matrix.npy";

    pub fn new(data_dir: impl Into<PathBuf>, decoder: DecoderConfig) -> Self {
        Self {
            data_dir: data_dir.into(),
            decoder,
        }
    }

    /// `./models` when that directory exists, else the current directory.
    pub fn default_data_dir() -> PathBuf {
        let models = Path::new("models");
        if models.is_dir() {
            models.to_path_buf()
        } else {
            PathBuf::from(".")
        }
    }

    pub fn model_path(&self) -> PathBuf {
        self.data_dir.join(Self::MODEL_FILE)
    }

    pub fn embedding_table_path(&self) -> PathBuf {
        self.data_dir.join(Self::EMBEDDING_TABLE_FILE)
    }

    pub fn position_table_path(&self) -> PathBuf {
        self.data_dir.join(Self::POSITION_TABLE_FILE)
    }

    pub fn reverse_embedding_path(&self) -> PathBuf {
        self.data_dir.join(Self::REVERSE_EMBEDDING_FILE)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(DecodeError::InvalidConfig("data_dir is empty".to_string()));
        }
        self.decoder.validate()
    }
}
