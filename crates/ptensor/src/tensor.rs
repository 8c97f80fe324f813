// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The owned native tensor handle.
//!
//! A [`Tensor`] owns exactly one native allocation. The allocation is
//! released exactly once: by [`Tensor::destroy`], or by `Drop` if the
//! tensor was never explicitly destroyed. The handle cannot be cloned, so
//! two wrappers can never release the same pointer.

use crate::dtype::{as_bytes, to_native, Element, HostType};
use crate::runtime::Boundary;
use crate::{DType, PtensorError, Result, Runtime, Shape};
use ptensor_sys::P10Tensor;
use std::any::Any;
use std::fmt;
use std::os::raw::c_void;
use std::ptr;

/// Host array a tensor was built from, kept to serve reads without a copy.
pub(crate) struct Shadow {
    pub(crate) host_type: HostType,
    /// An `ndarray::ArcArray<T, IxDyn>` with `T::HOST_TYPE == host_type`.
    pub(crate) array: Box<dyn Any + Send + Sync>,
}

/// A tensor living in native memory.
pub struct Tensor {
    /// Non-null from construction until release.
    raw: P10Tensor,
    runtime: Runtime,
    pub(crate) shadow: Option<Shadow>,
}

impl Tensor {
    /// Creates a native tensor from row-major bytes.
    ///
    /// `bytes` must hold exactly `shape.num_elements() * dtype.size_bytes()`
    /// bytes. They are copied; the caller keeps its buffer. A scalar shape
    /// holds one element, a shape with a zero extent holds none.
    ///
    /// # Errors
    /// - [`PtensorError::InvalidArgument`] if the shape has too many
    ///   dimensions or the byte length does not match. No native call is made.
    /// - [`PtensorError::Native`] if the library rejects the tensor.
    pub fn from_bytes(
        runtime: &Runtime,
        dtype: DType,
        shape: impl Into<Shape>,
        bytes: &[u8],
    ) -> Result<Self> {
        let shape = shape.into();
        let extents = shape.to_native()?;
        let expected = shape
            .checked_size_bytes(dtype)
            .ok_or_else(|| overflow(dtype, &shape))?;
        if bytes.len() != expected {
            return Err(PtensorError::InvalidArgument(format!(
                "{dtype} tensor of shape {shape} needs {expected} bytes, got {}",
                bytes.len()
            )));
        }

        let mut raw: P10Tensor = ptr::null_mut();
        {
            let boundary = runtime.enter();
            // SAFETY: `extents` and `bytes` are live for the call and sized as
            // the signature requires; the library copies both.
            let code = unsafe {
                (boundary.api().from_data)(
                    &mut raw,
                    dtype.to_raw(),
                    extents.as_ptr(),
                    extents.len(),
                    bytes.as_ptr(),
                )
            };
            boundary.check("p10_from_data", code)?;
        }
        if raw.is_null() {
            return Err(PtensorError::InvalidOperation(
                "p10_from_data reported success but returned a null handle".into(),
            ));
        }

        runtime.record(|s| s.record_construct(bytes.len()));
        tracing::debug!("constructed {dtype} tensor {shape} ({} bytes)", bytes.len());
        Ok(Self {
            raw,
            runtime: runtime.clone(),
            shadow: None,
        })
    }

    /// Creates a native tensor from a flat slice of elements.
    pub fn from_slice<T: Element>(
        runtime: &Runtime,
        shape: impl Into<Shape>,
        values: &[T],
    ) -> Result<Self> {
        let dtype = to_native(T::HOST_TYPE)?;
        let shape = shape.into();
        let count = shape
            .checked_size_bytes(dtype)
            .and_then(|_| shape.checked_num_elements())
            .ok_or_else(|| overflow(dtype, &shape))?;
        if values.len() != count {
            return Err(PtensorError::InvalidArgument(format!(
                "shape {shape} holds {count} elements, got {}",
                values.len()
            )));
        }
        Self::from_bytes(runtime, dtype, shape, as_bytes(values))
    }

    /// Creates a tensor filled with zeros.
    pub fn zeros(runtime: &Runtime, dtype: DType, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        let len = shape
            .checked_size_bytes(dtype)
            .ok_or_else(|| overflow(dtype, &shape))?;
        Self::from_bytes(runtime, dtype, shape, &vec![0u8; len])
    }

    /// Creates a tensor filled with ones.
    pub fn ones(runtime: &Runtime, dtype: DType, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        let count = shape
            .checked_size_bytes(dtype)
            .and_then(|_| shape.checked_num_elements())
            .ok_or_else(|| overflow(dtype, &shape))?;
        let bytes = dtype.one_bytes().repeat(count);
        Self::from_bytes(runtime, dtype, shape, &bytes)
    }

    /// Number of elements.
    pub fn size(&self) -> usize {
        let boundary = self.runtime.enter();
        // SAFETY: `handle()` is live for as long as `self` is.
        unsafe { (boundary.api().get_size)(self.handle()) }
    }

    /// Number of dimensions. Zero for a scalar.
    pub fn dimensions(&self) -> usize {
        let boundary = self.runtime.enter();
        unsafe { (boundary.api().get_dimensions)(self.handle()) }
    }

    /// Element type reported by the library.
    pub fn dtype(&self) -> Result<DType> {
        let boundary = self.runtime.enter();
        self.dtype_locked(&boundary)
    }

    /// Extents reported by the library.
    pub fn shape(&self) -> Result<Shape> {
        let boundary = self.runtime.enter();
        self.shape_locked(&boundary)
    }

    pub(crate) fn dtype_locked(&self, boundary: &Boundary<'_>) -> Result<DType> {
        let raw = unsafe { (boundary.api().get_dtype)(self.handle()) };
        DType::from_raw(raw).ok_or_else(|| {
            PtensorError::InvalidOperation(format!("native library reported unknown dtype {raw}"))
        })
    }

    pub(crate) fn shape_locked(&self, boundary: &Boundary<'_>) -> Result<Shape> {
        let dims = unsafe { (boundary.api().get_dimensions)(self.handle()) };
        let mut extents = vec![0i64; dims];
        // SAFETY: `extents` has exactly `dims` writable slots.
        let code = unsafe {
            (boundary.api().get_shape)(self.handle(), extents.as_mut_ptr(), extents.len())
        };
        boundary.check("p10_get_shape", code)?;
        Shape::from_native(&extents)
    }

    /// Pointer to the native buffer, or null if the tensor has none.
    ///
    /// The memory belongs to the library. It is valid only while `self` is
    /// alive; do not free it, keep it past this tensor, or hand it to a
    /// second owner. Prefer [`to_array`](Tensor::to_array) or
    /// [`to_bytes`](Tensor::to_bytes), which copy under the boundary lock.
    pub fn raw_data(&self) -> *const c_void {
        let boundary = self.runtime.enter();
        unsafe { (boundary.api().get_data)(self.handle()) }.cast_const()
    }

    /// The native handle, for passing to other library entry points.
    ///
    /// `self` must outlive every use of the returned handle. Calls made with
    /// it should hold [`Runtime::lock_boundary`].
    pub fn as_raw(&self) -> P10Tensor {
        self.handle()
    }

    /// The runtime this tensor was created through.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Releases the native allocation now and reports the library's status.
    ///
    /// Dropping a tensor does the same but can only log a failed release.
    pub fn destroy(mut self) -> Result<()> {
        self.release()
        // `self` drops here with a null handle, so Drop does nothing.
    }

    pub(crate) fn handle(&self) -> P10Tensor {
        debug_assert!(!self.raw.is_null(), "tensor used after release");
        self.raw
    }

    fn release(&mut self) -> Result<()> {
        if self.raw.is_null() {
            return Ok(());
        }
        self.shadow = None;
        let result = {
            let boundary = self.runtime.enter();
            // SAFETY: `raw` is live and owned by this tensor alone. The
            // library nulls it; it is nulled again below in case it does not.
            let code = unsafe { (boundary.api().destroy)(&mut self.raw) };
            boundary.check("p10_destroy", code)
        };
        self.raw = ptr::null_mut();
        self.runtime.record(|s| s.record_destroy());
        tracing::debug!("released native tensor");
        result
    }
}

fn overflow(dtype: DType, shape: &Shape) -> PtensorError {
    PtensorError::InvalidArgument(format!("{dtype} tensor of shape {shape} overflows"))
}

impl Drop for Tensor {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("failed to release native tensor: {e}");
        }
    }
}

// SAFETY: the handle is owned exclusively by this tensor, and every native
// call made through it runs under the process-wide boundary lock. The shadow
// array is `Send + Sync` by construction.
unsafe impl Send for Tensor {}
unsafe impl Sync for Tensor {}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let boundary = self.runtime.enter();
        let shape = self
            .shape_locked(&boundary)
            .map_or_else(|_| "?".to_string(), |s| s.to_string());
        let dtype = self
            .dtype_locked(&boundary)
            .map_or_else(|_| "?".to_string(), |d| d.to_string());
        let size = unsafe { (boundary.api().get_size)(self.handle()) };
        write!(f, "Tensor(shape={shape}, dtype={dtype}, size={size})")
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("raw", &self.raw)
            .field("shadow", &self.shadow.as_ref().map(|s| s.host_type))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> Runtime {
        unsafe { Runtime::from_api(ptensor_capi::api()) }
    }

    #[test]
    fn test_from_slice_queries() {
        let rt = reference();
        let values: Vec<f32> = (1..=10).map(|v| v as f32).collect();
        let t = Tensor::from_slice(&rt, Shape::matrix(2, 5), &values).unwrap();
        assert_eq!(t.shape().unwrap(), Shape::matrix(2, 5));
        assert_eq!(t.size(), 10);
        assert_eq!(t.dimensions(), 2);
        assert_eq!(t.dtype().unwrap(), DType::Float32);
        assert!(!t.raw_data().is_null());
        assert!(!t.has_shadow());
    }

    #[test]
    fn test_display() {
        let rt = reference();
        let t = Tensor::zeros(&rt, DType::Float32, vec![2, 5]).unwrap();
        assert_eq!(t.to_string(), "Tensor(shape=[2, 5], dtype=float32, size=10)");
    }

    #[test]
    fn test_byte_length_mismatch() {
        let rt = reference();
        let err = Tensor::from_bytes(&rt, DType::Int32, vec![2, 2], &[0u8; 15]).unwrap_err();
        assert!(matches!(err, PtensorError::InvalidArgument(_)));
        assert_eq!(rt.stats().constructed, 0);
    }

    #[test]
    fn test_slice_length_mismatch() {
        let rt = reference();
        let err = Tensor::from_slice(&rt, vec![3], &[1i64, 2]).unwrap_err();
        assert!(matches!(err, PtensorError::InvalidArgument(_)));
    }

    #[test]
    fn test_host_only_slice_rejected() {
        let rt = reference();
        let err = Tensor::from_slice(&rt, vec![2], &[true, false]).unwrap_err();
        assert!(matches!(err, PtensorError::InvalidArgument(_)));
        let err = Tensor::from_slice(&rt, vec![1], &[7u64]).unwrap_err();
        assert!(matches!(err, PtensorError::InvalidArgument(_)));
    }

    #[test]
    fn test_ones() {
        let rt = reference();
        let t = Tensor::ones(&rt, DType::Int16, vec![3]).unwrap();
        assert_eq!(t.to_vec::<i16>().unwrap(), vec![1, 1, 1]);
        let h = Tensor::ones(&rt, DType::Float16, vec![2]).unwrap();
        assert_eq!(h.to_bytes().unwrap(), [0x3C00u16.to_ne_bytes(), 0x3C00u16.to_ne_bytes()].concat());
    }

    #[test]
    fn test_scalar() {
        let rt = reference();
        let t = Tensor::from_slice(&rt, Shape::scalar(), &[42i32]).unwrap();
        assert_eq!(t.dimensions(), 0);
        assert_eq!(t.size(), 1);
        assert_eq!(t.shape().unwrap(), Shape::scalar());
        assert_eq!(t.to_vec::<i32>().unwrap(), vec![42]);
    }

    #[test]
    fn test_zero_extent() {
        let rt = reference();
        let t = Tensor::zeros(&rt, DType::Float64, vec![4, 0]).unwrap();
        assert_eq!(t.size(), 0);
        assert!(t.raw_data().is_null());
        assert!(t.to_vec::<f64>().unwrap().is_empty());
    }

    #[test]
    fn test_overflowing_shape_rejected() {
        let rt = reference();
        let err = Tensor::from_slice(&rt, vec![usize::MAX, 2], &[1.0f32]).unwrap_err();
        assert!(matches!(err, PtensorError::InvalidArgument(_)));
        let err = Tensor::ones(&rt, DType::Int32, vec![usize::MAX, 2]).unwrap_err();
        assert!(matches!(err, PtensorError::InvalidArgument(_)));
        let err = Tensor::zeros(&rt, DType::Float64, vec![1 << 62, 4]).unwrap_err();
        assert!(matches!(err, PtensorError::InvalidArgument(_)));
        assert_eq!(rt.stats().constructed, 0);
    }

    #[test]
    fn test_zero_extent_after_large_extent() {
        let rt = reference();
        let t = Tensor::from_bytes(&rt, DType::Float32, vec![1 << 62, 0], &[]).unwrap();
        assert_eq!(t.size(), 0);
        let t = Tensor::zeros(&rt, DType::Float32, vec![1 << 62, 0]).unwrap();
        assert_eq!(t.size(), 0);
        assert!(t.to_vec::<f32>().unwrap().is_empty());
    }

    #[test]
    fn test_destroy_and_drop_release_once() {
        let rt = reference();
        let a = Tensor::zeros(&rt, DType::Uint8, vec![4]).unwrap();
        let b = Tensor::zeros(&rt, DType::Uint8, vec![4]).unwrap();
        assert_eq!(rt.stats().live(), 2);
        a.destroy().unwrap();
        drop(b);
        let stats = rt.stats();
        assert_eq!(stats.constructed, 2);
        assert_eq!(stats.destroyed, 2);
        assert_eq!(stats.live(), 0);
        assert_eq!(stats.peak_live, 2);
    }

    #[test]
    fn test_tensor_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Tensor>();
    }

    #[test]
    fn test_shared_across_threads() {
        let rt = reference();
        let t = std::sync::Arc::new(Tensor::ones(&rt, DType::Int32, vec![8]).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let t = t.clone();
                std::thread::spawn(move || t.to_vec::<i32>().unwrap())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), vec![1; 8]);
        }
    }
}
