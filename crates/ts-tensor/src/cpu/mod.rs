use crate::backend::ComputeBackend;
use crate::error::{Result, TensorError};

/// Pure-Rust CPU compute backend.
///
/// Straightforward loops, optimized for correctness rather than peak
/// performance. The embedding projections it runs are small next to the
/// opaque forward model.
#[derive(Debug, Clone)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        CpuBackend
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn check_chunks(op: &str, len: usize, n_vocab: usize) -> Result<usize> {
    if n_vocab == 0 {
        return Err(TensorError::Other(format!("{}: n_vocab must be > 0", op)));
    }
    if len % n_vocab != 0 {
        return Err(TensorError::Other(format!(
            "{}: x.len()={} is not a multiple of n_vocab={}",
            op, len, n_vocab
        )));
    }
    Ok(len / n_vocab)
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn matmul(&self, a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Result<Vec<f32>> {
        if a.len() != m * k {
            return Err(TensorError::Other(format!(
                "matmul: a.len()={} but expected m*k={}",
                a.len(),
                m * k
            )));
        }
        if b.len() != k * n {
            return Err(TensorError::Other(format!(
                "matmul: b.len()={} but expected k*n={}",
                b.len(),
                k * n
            )));
        }

        // i-p-j loop order keeps the inner loop on contiguous rows of `b`.
        let mut c = vec![0.0f32; m * n];
        for i in 0..m {
            let out = &mut c[i * n..(i + 1) * n];
            for p in 0..k {
                let av = a[i * k + p];
                if av == 0.0 {
                    continue;
                }
                let b_row = &b[p * n..(p + 1) * n];
                for (o, bv) in out.iter_mut().zip(b_row) {
                    *o += av * bv;
                }
            }
        }
        Ok(c)
    }

    fn add(&self, a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
        if a.len() != b.len() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![a.len()],
                got: vec![b.len()],
            });
        }
        Ok(a.iter().zip(b.iter()).map(|(x, y)| x + y).collect())
    }

    fn softmax(&self, x: &[f32], n_vocab: usize) -> Result<Vec<f32>> {
        let n_chunks = check_chunks("softmax", x.len(), n_vocab)?;
        let mut result = vec![0.0f32; x.len()];

        for chunk in 0..n_chunks {
            let offset = chunk * n_vocab;
            let chunk_data = &x[offset..offset + n_vocab];
            let out = &mut result[offset..offset + n_vocab];

            let max_val = chunk_data
                .iter()
                .copied()
                .fold(f32::NEG_INFINITY, f32::max);

            let mut sum = 0.0f32;
            for (o, &v) in out.iter_mut().zip(chunk_data) {
                *o = (v - max_val).exp();
                sum += *o;
            }
            for o in out.iter_mut() {
                *o /= sum;
            }
        }

        Ok(result)
    }

    fn log_softmax(&self, x: &[f32], n_vocab: usize) -> Result<Vec<f32>> {
        let n_chunks = check_chunks("log_softmax", x.len(), n_vocab)?;
        let mut result = vec![0.0f32; x.len()];

        for chunk in 0..n_chunks {
            let offset = chunk * n_vocab;
            let chunk_data = &x[offset..offset + n_vocab];

            let max_val = chunk_data
                .iter()
                .copied()
                .fold(f32::NEG_INFINITY, f32::max);
            let log_sum = chunk_data
                .iter()
                .map(|&v| (v - max_val).exp())
                .sum::<f32>()
                .ln();

            for (o, &v) in result[offset..offset + n_vocab].iter_mut().zip(chunk_data) {
                *o = v - max_val - log_sum;
            }
        }

        Ok(result)
    }
}
