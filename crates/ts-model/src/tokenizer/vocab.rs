use std::collections::HashMap;

use crate::error::{ModelError, Result};

/// Token vocabulary with its special token ids.
#[derive(Debug, Clone)]
pub struct Vocab {
    /// Token strings, indexed by token ID.
    pub tokens: Vec<String>,
    /// Reverse mapping from token string to token ID.
    pub token_to_id: HashMap<String, u32>,
    /// End-of-sequence token ID.
    pub eos_id: u32,
    /// Padding token ID. GPT-2 style vocabularies reuse the EOS id.
    pub pad_id: u32,
}

impl Vocab {
    /// Build a vocabulary from token strings indexed by id.
    ///
    /// # Errors
    /// Fails if the list is empty, contains a duplicate string, or either
    /// special id is out of range.
    pub fn new(tokens: Vec<String>, eos_id: u32, pad_id: u32) -> Result<Vocab> {
        if tokens.is_empty() {
            return Err(ModelError::TokenizerError("empty vocabulary".to_string()));
        }
        for (name, id) in [("eos", eos_id), ("pad", pad_id)] {
            if id as usize >= tokens.len() {
                return Err(ModelError::TokenizerError(format!(
                    "{} id {} is outside the vocabulary of {} tokens",
                    name,
                    id,
                    tokens.len()
                )));
            }
        }

        let mut token_to_id = HashMap::with_capacity(tokens.len());
        for (id, tok) in tokens.iter().enumerate() {
            if token_to_id.insert(tok.clone(), id as u32).is_some() {
                return Err(ModelError::TokenizerError(format!(
                    "duplicate token {:?}",
                    tok
                )));
            }
        }

        Ok(Vocab {
            tokens,
            token_to_id,
            eos_id,
            pad_id,
        })
    }

    /// Returns true for the end-of-sequence and padding ids.
    pub fn is_special(&self, id: u32) -> bool {
        id == self.eos_id || id == self.pad_id
    }

    /// Number of tokens in the vocabulary.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
