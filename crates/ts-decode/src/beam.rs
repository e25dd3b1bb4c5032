use ts_sampler::{score_desc, top_k, SamplerError};

/// One live sequence in the beam with its cumulative score.
///
/// `tokens` is the model-input window. Once it reaches the context length
/// its oldest tokens are dropped, so it is not the full story.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    pub tokens: Vec<u32>,
    pub score: f32,
}

impl Hypothesis {
    pub fn last_token(&self) -> Option<u32> {
        self.tokens.last().copied()
    }
}

/// A one-token extension of a beam hypothesis, alive for one step.
///
/// The extended sequence is `parent`'s tokens plus `token`; it is only
/// materialised for candidates that survive pruning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub parent: usize,
    pub token: u32,
    pub score: f32,
}

/// The decoder's ranked set of hypotheses.
#[derive(Debug, Clone)]
pub struct Beam {
    hypotheses: Vec<Hypothesis>,
}

impl Beam {
    /// A single hypothesis holding the prompt, score 0.
    pub fn from_prompt(prompt: Vec<u32>) -> Self {
        Self {
            hypotheses: vec![Hypothesis {
                tokens: prompt,
                score: 0.0,
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.hypotheses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hypotheses.is_empty()
    }

    pub fn hypotheses(&self) -> &[Hypothesis] {
        &self.hypotheses
    }

    /// Highest-ranked hypothesis.
    pub fn best(&self) -> Option<&Hypothesis> {
        self.hypotheses.first()
    }

    /// Drop the oldest token of every hypothesis already at
    /// `context_length`. Returns how many hypotheses slid.
    pub fn slide(&mut self, context_length: usize) -> usize {
        let mut slid = 0;
        for hyp in &mut self.hypotheses {
            if hyp.tokens.len() >= context_length {
                let excess = hyp.tokens.len() + 1 - context_length;
                hyp.tokens.drain(..excess);
                slid += 1;
            }
        }
        slid
    }

    /// The token windows to score, in beam order.
    pub fn windows(&self) -> Vec<&[u32]> {
        self.hypotheses.iter().map(|h| h.tokens.as_slice()).collect()
    }

    /// Extend every hypothesis with its own top-`width` tokens.
    ///
    /// `distributions[i]` is the next-token distribution for hypothesis `i`.
    /// Candidates come out in generation order: parent by parent, each
    /// parent's tokens best first.
    pub fn expand(
        &self,
        distributions: &[Vec<f32>],
        width: usize,
    ) -> Result<Vec<Candidate>, SamplerError> {
        let mut candidates = Vec::with_capacity(self.hypotheses.len() * width);
        for (parent, (hyp, dist)) in self.hypotheses.iter().zip(distributions).enumerate() {
            for pick in top_k(dist, width)? {
                candidates.push(Candidate {
                    parent,
                    token: pick.token_id,
                    score: hyp.score + pick.logit,
                });
            }
        }
        Ok(candidates)
    }

    /// Replace the beam with the best `width` candidates.
    ///
    /// The sort is stable, so equal scores keep generation order.
    pub fn prune(&mut self, mut candidates: Vec<Candidate>, width: usize) {
        candidates.sort_by(|a, b| score_desc(a.score, b.score));
        candidates.truncate(width);

        let next = candidates
            .iter()
            .map(|c| {
                let mut tokens = Vec::with_capacity(self.hypotheses[c.parent].tokens.len() + 1);
                tokens.extend_from_slice(&self.hypotheses[c.parent].tokens);
                tokens.push(c.token);
                Hypothesis {
                    tokens,
                    score: c.score,
                }
            })
            .collect();
        self.hypotheses = next;
    }

    /// True when every hypothesis ends with `token`.
    pub fn all_end_with(&self, token: u32) -> bool {
        !self.hypotheses.is_empty()
            && self
                .hypotheses
                .iter()
                .all(|h| h.last_token() == Some(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn beam(seqs: &[(&[u32], f32)]) -> Beam {
        Beam {
            hypotheses: seqs
                .iter()
                .map(|(t, s)| Hypothesis {
                    tokens: t.to_vec(),
                    score: *s,
                })
                .collect(),
        }
    }

    #[test]
    fn test_from_prompt() {
        let b = Beam::from_prompt(vec![5, 6]);
        assert_eq!(b.len(), 1);
        assert_eq!(b.best().unwrap().tokens, vec![5, 6]);
        assert_eq!(b.best().unwrap().score, 0.0);
    }

    #[test]
    fn test_slide_only_full_windows() {
        let mut b = beam(&[(&[1, 2, 3], 0.0), (&[4, 5], 0.0)]);
        assert_eq!(b.slide(3), 1);
        assert_eq!(b.hypotheses()[0].tokens, vec![2, 3]);
        assert_eq!(b.hypotheses()[1].tokens, vec![4, 5]);
        assert_eq!(b.slide(3), 0);
    }

    #[test]
    fn test_expand_adds_parent_scores() {
        let b = beam(&[(&[1], 1.0), (&[2], -1.0)]);
        let dists = vec![vec![0.0, 0.5, 0.2], vec![0.3, 0.0, 0.1]];
        let c = b.expand(&dists, 2).unwrap();
        assert_eq!(c.len(), 4);
        assert_eq!((c[0].parent, c[0].token), (0, 1));
        assert_relative_eq!(c[0].score, 1.5);
        assert_eq!((c[1].parent, c[1].token), (0, 2));
        assert_eq!((c[2].parent, c[2].token), (1, 0));
        assert_relative_eq!(c[2].score, -0.7);
    }

    #[test]
    fn test_expand_rejects_width_over_vocab() {
        let b = Beam::from_prompt(vec![0]);
        assert!(b.expand(&[vec![0.0, 1.0]], 3).is_err());
    }

    #[test]
    fn test_prune_is_stable_on_ties() {
        let mut b = beam(&[(&[1], 0.0), (&[2], 0.0)]);
        let candidates = vec![
            Candidate { parent: 0, token: 7, score: 1.0 },
            Candidate { parent: 0, token: 8, score: 0.5 },
            Candidate { parent: 1, token: 9, score: 1.0 },
            Candidate { parent: 1, token: 3, score: 2.0 },
        ];
        b.prune(candidates, 3);
        let seqs: Vec<&[u32]> = b.windows();
        assert_eq!(seqs, vec![&[2u32, 3][..], &[1, 7][..], &[2, 9][..]]);
    }

    #[test]
    fn test_all_end_with() {
        assert!(beam(&[(&[1, 0], 0.0), (&[3, 0], 0.0)]).all_end_with(0));
        assert!(!beam(&[(&[1, 0], 0.0), (&[3, 4], 0.0)]).all_end_with(0));
    }
}
