use crate::error::{Result, SamplerError};
use crate::sampler::TokenLogit;

/// Select the `k` highest-scoring tokens from a distribution.
///
/// Returns exactly `k` entries with distinct token ids, sorted by score
/// descending. Equal scores may come back in any relative order.
///
/// # Errors
/// `InvalidK` when `k == 0` or `k > distribution.len()`.
pub fn top_k(distribution: &[f32], k: usize) -> Result<Vec<TokenLogit>> {
    if k == 0 || k > distribution.len() {
        return Err(SamplerError::InvalidK {
            k,
            vocab_size: distribution.len(),
        });
    }

    let mut candidates: Vec<TokenLogit> = distribution
        .iter()
        .enumerate()
        .map(|(i, &logit)| TokenLogit::new(i as u32, logit))
        .collect();

    // Partition the k best to the front in O(V), then order just those.
    if k < candidates.len() {
        candidates.select_nth_unstable_by(k - 1, TokenLogit::cmp_desc);
        candidates.truncate(k);
    }
    candidates.sort_unstable_by(TokenLogit::cmp_desc);

    Ok(candidates)
}
