use std::cmp::Ordering;

/// A token ID paired with its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenLogit {
    pub token_id: u32,
    pub logit: f32,
}

impl TokenLogit {
    pub fn new(token_id: u32, logit: f32) -> Self {
        Self { token_id, logit }
    }

    /// Descending order by score. NaN sorts after every number.
    pub(crate) fn cmp_desc(a: &TokenLogit, b: &TokenLogit) -> Ordering {
        score_desc(a.logit, b.logit)
    }
}

/// Descending comparison with NaN treated as the lowest possible score.
pub fn score_desc(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
