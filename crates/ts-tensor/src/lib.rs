//! `ts-tensor` - Dense tensors and compute backends for the tinystory runtime.
//!
//! This crate provides:
//! - A row-major `Tensor` type backed by CPU storage
//! - f16 storage that is widened to f32 before compute
//! - A `ComputeBackend` trait with a reference `CpuBackend`
//! - Shape utilities

pub mod backend;
pub mod cpu;
pub mod dtype;
pub mod error;
pub mod shape;
pub mod storage;
pub mod tensor;

pub use backend::ComputeBackend;
pub use cpu::CpuBackend;
pub use dtype::DType;
pub use error::{Result, TensorError};
pub use shape::Shape;
pub use storage::CpuStorage;
pub use tensor::Tensor;
