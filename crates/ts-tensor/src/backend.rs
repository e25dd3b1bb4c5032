use std::fmt::Debug;

use crate::error::Result;

/// Trait for pluggable compute backends.
///
/// Data is passed in as row-major f32 slices and returned as owned vectors.
pub trait ComputeBackend: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "cpu").
    fn name(&self) -> &str;

    /// Matrix multiplication: C = A @ B.
    ///
    /// - `a`: row-major data of shape [m, k]
    /// - `b`: row-major data of shape [k, n]
    /// - Returns: row-major data of shape [m, n]
    fn matmul(&self, a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Result<Vec<f32>>;

    /// Element-wise addition: result[i] = a[i] + b[i].
    fn add(&self, a: &[f32], b: &[f32]) -> Result<Vec<f32>>;

    /// Softmax over chunks of `n_vocab` elements.
    fn softmax(&self, x: &[f32], n_vocab: usize) -> Result<Vec<f32>>;

    /// Log-softmax over chunks of `n_vocab` elements:
    /// result[i] = x[i] - max(x) - ln(sum(exp(x[j] - max(x)))).
    fn log_softmax(&self, x: &[f32], n_vocab: usize) -> Result<Vec<f32>>;
}
