use half::f16;

use crate::dtype::DType;
use crate::error::{Result, TensorError};

/// CPU-side tensor storage.
///
/// Embedding tables are often shipped at half precision. They are kept as
/// `F16` until [`CpuStorage::to_f32`] widens them for compute.
#[derive(Debug, Clone)]
pub enum CpuStorage {
    /// 32-bit floating point storage.
    F32(Vec<f32>),
    /// 16-bit floating point storage.
    F16(Vec<f16>),
}

impl CpuStorage {
    /// Number of elements in this storage.
    pub fn len(&self) -> usize {
        match self {
            CpuStorage::F32(v) => v.len(),
            CpuStorage::F16(v) => v.len(),
        }
    }

    /// Returns true if the storage contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the data as an f32 slice.
    ///
    /// # Errors
    /// Returns an error if the storage is not F32.
    pub fn as_f32_slice(&self) -> Result<&[f32]> {
        match self {
            CpuStorage::F32(v) => Ok(v.as_slice()),
            other => Err(TensorError::UnsupportedDType(format!(
                "expected f32 storage, found {}",
                other.dtype()
            ))),
        }
    }

    /// Create storage from an f32 vector.
    pub fn from_f32_vec(data: Vec<f32>) -> Self {
        CpuStorage::F32(data)
    }

    /// Create storage from an f16 vector.
    pub fn from_f16_vec(data: Vec<f16>) -> Self {
        CpuStorage::F16(data)
    }

    /// Widen the storage to f32. F32 storage is returned unchanged.
    pub fn to_f32(&self) -> CpuStorage {
        match self {
            CpuStorage::F32(v) => CpuStorage::F32(v.clone()),
            CpuStorage::F16(v) => CpuStorage::F32(v.iter().map(|x| x.to_f32()).collect()),
        }
    }

    /// Returns the dtype of this storage.
    pub fn dtype(&self) -> DType {
        match self {
            CpuStorage::F32(_) => DType::F32,
            CpuStorage::F16(_) => DType::F16,
        }
    }
}
