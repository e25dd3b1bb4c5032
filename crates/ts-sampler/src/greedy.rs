use crate::error::{Result, SamplerError};
use crate::sampler::{score_desc, TokenLogit};

/// Greedy selection: the single highest-scoring token.
///
/// On ties the lowest token id wins, so the result is deterministic.
pub fn argmax(distribution: &[f32]) -> Result<TokenLogit> {
    distribution
        .iter()
        .enumerate()
        .map(|(i, &logit)| TokenLogit::new(i as u32, logit))
        .min_by(|a, b| score_desc(a.logit, b.logit).then(a.token_id.cmp(&b.token_id)))
        .ok_or(SamplerError::EmptyDistribution)
}
