use std::collections::HashMap;

use tracing::debug;

use super::vocab::Vocab;
use super::Tokenizer;
use crate::error::{ModelError, Result};

/// Byte-Pair Encoding tokenizer over an in-memory vocabulary.
pub struct BpeTokenizer {
    /// The token vocabulary (strings and special token IDs).
    pub vocab: Vocab,
    /// Map from merge pair to priority rank (lower rank = higher priority).
    merge_ranks: HashMap<(String, String), usize>,
}

impl BpeTokenizer {
    /// Build a tokenizer from a vocabulary and ordered merge rules.
    ///
    /// Earlier merges have higher priority. Every merge result must itself
    /// be a vocabulary entry.
    pub fn new(vocab: Vocab, merges: Vec<(String, String)>) -> Result<BpeTokenizer> {
        let mut merge_ranks = HashMap::with_capacity(merges.len());
        for (rank, (left, right)) in merges.into_iter().enumerate() {
            let merged = format!("{}{}", left, right);
            if !vocab.token_to_id.contains_key(&merged) {
                return Err(ModelError::TokenizerError(format!(
                    "merge {:?} + {:?} produces {:?}, which is not in the vocabulary",
                    left, right, merged
                )));
            }
            merge_ranks.entry((left, right)).or_insert(rank);
        }

        debug!(
            vocab_size = vocab.len(),
            merges = merge_ranks.len(),
            "built BPE tokenizer"
        );

        Ok(BpeTokenizer { vocab, merge_ranks })
    }

    /// Parse merge rules written one per entry as "left right".
    pub fn parse_merges<'a, I>(lines: I) -> Result<Vec<(String, String)>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        lines
            .into_iter()
            .map(|entry| match entry.split_once(' ') {
                Some((l, r)) if !l.is_empty() && !r.is_empty() => {
                    Ok((l.to_string(), r.to_string()))
                }
                _ => Err(ModelError::TokenizerError(format!(
                    "invalid merge entry: {:?}",
                    entry
                ))),
            })
            .collect()
    }

    /// Split text into initial pieces: a character if the vocabulary has it,
    /// otherwise its UTF-8 bytes as `<0xHH>` tokens.
    fn initial_pieces(&self, text: &str) -> Result<Vec<String>> {
        let mut pieces = Vec::with_capacity(text.len());
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            let ch_str = ch.to_string();
            if self.vocab.token_to_id.contains_key(&ch_str) {
                pieces.push(ch_str);
                continue;
            }
            for byte in ch.encode_utf8(&mut buf).bytes() {
                let byte_token = format!("<0x{:02X}>", byte);
                if !self.vocab.token_to_id.contains_key(&byte_token) {
                    return Err(ModelError::TokenizerError(format!(
                        "no token covers {:?}",
                        ch
                    )));
                }
                pieces.push(byte_token);
            }
        }
        Ok(pieces)
    }
}

impl Tokenizer for BpeTokenizer {
    /// Encode text with BPE.
    ///
    /// Repeatedly merges the adjacent pair with the best rank until no
    /// merge applies, then maps the pieces to ids.
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let mut tokens = self.initial_pieces(text)?;

        while tokens.len() >= 2 {
            let best = tokens
                .windows(2)
                .enumerate()
                .filter_map(|(i, pair)| {
                    self.merge_ranks
                        .get(&(pair[0].clone(), pair[1].clone()))
                        .map(|&rank| (rank, i))
                })
                .min();

            let Some((_, idx)) = best else {
                break;
            };

            let right = tokens.remove(idx + 1);
            tokens[idx].push_str(&right);
        }

        tokens
            .iter()
            .map(|tok| {
                self.vocab.token_to_id.get(tok).copied().ok_or_else(|| {
                    ModelError::TokenizerError(format!("unknown token {:?}", tok))
                })
            })
            .collect()
    }

    /// Decode ids into text. Byte-level `<0xHH>` tokens become raw bytes;
    /// invalid UTF-8 is replaced. Ids outside the vocabulary are skipped.
    fn decode(&self, tokens: &[u32], skip_special_tokens: bool) -> String {
        let mut bytes: Vec<u8> = Vec::new();

        for &id in tokens {
            if skip_special_tokens && self.vocab.is_special(id) {
                continue;
            }
            let Some(tok) = self.vocab.tokens.get(id as usize) else {
                continue;
            };

            if tok.starts_with("<0x") && tok.ends_with('>') && tok.len() == 6 {
                if let Ok(byte_val) = u8::from_str_radix(&tok[3..5], 16) {
                    bytes.push(byte_val);
                    continue;
                }
            }

            bytes.extend_from_slice(tok.as_bytes());
        }

        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn eos_id(&self) -> u32 {
        self.vocab.eos_id
    }

    fn pad_id(&self) -> u32 {
        self.vocab.pad_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> BpeTokenizer {
        let tokens: Vec<String> = [
            "<|endoftext|>", "O", "n", "c", "e", " ", "u", "p", "o", "On", "ce", "Once", "<0xC3>",
            "<0xA9>",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let vocab = Vocab::new(tokens, 0, 0).unwrap();
        let merges = BpeTokenizer::parse_merges(["O n", "c e", "On ce"]).unwrap();
        BpeTokenizer::new(vocab, merges).unwrap()
    }

    #[test]
    fn test_encode_applies_merges_by_rank() {
        let t = tokenizer();
        assert_eq!(t.encode("Once").unwrap(), vec![11]);
        assert_eq!(t.encode("Once up").unwrap(), vec![11, 5, 6, 7]);
        assert_eq!(t.encode("").unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_byte_fallback_round_trip() {
        let t = tokenizer();
        let ids = t.encode("é").unwrap();
        assert_eq!(ids, vec![12, 13]);
        assert_eq!(t.decode(&ids, true), "é");
    }

    #[test]
    fn test_unknown_character() {
        assert!(tokenizer().encode("z").is_err());
    }

    #[test]
    fn test_decode_skips_special_tokens() {
        let t = tokenizer();
        assert_eq!(t.decode(&[11, 0], true), "Once");
        assert_eq!(t.decode(&[11, 0], false), "Once<|endoftext|>");
        assert_eq!(t.decode(&[11, 999], false), "Once");
    }

    #[test]
    fn test_merge_must_exist_in_vocab() {
        let vocab = Vocab::new(vec!["a".to_string(), "b".to_string()], 0, 0).unwrap();
        let merges = BpeTokenizer::parse_merges(["a b"]).unwrap();
        assert!(BpeTokenizer::new(vocab, merges).is_err());
    }

    #[test]
    fn test_parse_merges_rejects_malformed() {
        assert!(BpeTokenizer::parse_merges(["ab"]).is_err());
        assert!(BpeTokenizer::parse_merges([" b"]).is_err());
    }
}
