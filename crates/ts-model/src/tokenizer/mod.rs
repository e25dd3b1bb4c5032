pub mod bpe;
pub mod vocab;

pub use bpe::BpeTokenizer;
pub use vocab::Vocab;

/// Text <-> token id conversion used around generation.
pub trait Tokenizer: Send + Sync {
    /// Encode text into token ids.
    fn encode(&self, text: &str) -> crate::Result<Vec<u32>>;

    /// Decode token ids back into text. With `skip_special_tokens`, the
    /// end-of-sequence and padding tokens produce no output.
    fn decode(&self, tokens: &[u32], skip_special_tokens: bool) -> String;

    /// End-of-sequence token id.
    fn eos_id(&self) -> u32;

    /// Padding token id.
    fn pad_id(&self) -> u32;
}
