use half::f16;

use crate::backend::ComputeBackend;
use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::storage::CpuStorage;

/// A tensor backed by CPU storage.
///
/// Holds contiguous, row-major data with an associated shape. Operations that
/// require computation are dispatched to a `ComputeBackend` and always run on
/// f32 data.
#[derive(Debug, Clone)]
pub struct Tensor {
    storage: CpuStorage,
    shape: Shape,
}

impl Tensor {
    /// Create a new f32 tensor from data and a shape.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if `data.len() != shape.numel()`.
    pub fn new(data: Vec<f32>, shape: Shape) -> Result<Self> {
        check_len(data.len(), &shape)?;
        Ok(Tensor {
            storage: CpuStorage::from_f32_vec(data),
            shape,
        })
    }

    /// Create a new half-precision tensor from data and a shape.
    pub fn from_f16(data: Vec<f16>, shape: Shape) -> Result<Self> {
        check_len(data.len(), &shape)?;
        Ok(Tensor {
            storage: CpuStorage::from_f16_vec(data),
            shape,
        })
    }

    /// Create a zero-filled f32 tensor with the given shape.
    pub fn zeros(shape: Shape) -> Self {
        let n = shape.numel();
        Tensor {
            storage: CpuStorage::from_f32_vec(vec![0.0; n]),
            shape,
        }
    }

    /// Returns a reference to the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Returns the underlying data as an f32 slice.
    ///
    /// # Errors
    /// Fails for f16 tensors; call [`Tensor::to_f32`] first.
    pub fn data_f32(&self) -> Result<&[f32]> {
        self.storage.as_f32_slice()
    }

    /// Returns an f32 copy of this tensor, widening f16 data if needed.
    pub fn to_f32(&self) -> Tensor {
        Tensor {
            storage: self.storage.to_f32(),
            shape: self.shape.clone(),
        }
    }

    /// Reshape the tensor, returning a new tensor with the same data but
    /// a different shape.
    ///
    /// The total number of elements must remain the same.
    pub fn reshape(&self, new_shape: Shape) -> Result<Tensor> {
        if self.shape.numel() != new_shape.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: self.shape.dims().to_vec(),
                got: new_shape.dims().to_vec(),
            });
        }
        Ok(Tensor {
            storage: self.storage.clone(),
            shape: new_shape,
        })
    }

    /// Borrow row `i` of a 2D f32 tensor.
    pub fn row(&self, i: usize) -> Result<&[f32]> {
        if self.shape.ndim() != 2 {
            return Err(TensorError::Other(format!(
                "row() requires a 2D tensor, got shape {}",
                self.shape
            )));
        }
        let rows = self.shape.dim(0);
        let cols = self.shape.dim(1);
        if i >= rows {
            return Err(TensorError::IndexOutOfRange {
                index: i,
                size: rows,
            });
        }
        let data = self.data_f32()?;
        Ok(&data[i * cols..(i + 1) * cols])
    }

    /// Matrix multiplication of two 2D f32 tensors using the given backend.
    ///
    /// self is [m, k], other is [k, n], result is [m, n].
    pub fn matmul(&self, other: &Tensor, backend: &dyn ComputeBackend) -> Result<Tensor> {
        if self.shape.ndim() != 2 || other.shape.ndim() != 2 {
            return Err(TensorError::Other(
                "matmul requires 2D tensors".to_string(),
            ));
        }

        let m = self.shape.dim(0);
        let k = self.shape.dim(1);
        let k2 = other.shape.dim(0);
        let n = other.shape.dim(1);

        if k != k2 {
            return Err(TensorError::MatmulMismatch { m, k, k2, n });
        }

        let result_data = backend.matmul(self.data_f32()?, other.data_f32()?, m, k, n)?;
        Tensor::new(result_data, Shape::matrix(m, n))
    }
}

fn check_len(len: usize, shape: &Shape) -> Result<()> {
    if len != shape.numel() {
        return Err(TensorError::ShapeMismatch {
            expected: shape.dims().to_vec(),
            got: vec![len],
        });
    }
    Ok(())
}
