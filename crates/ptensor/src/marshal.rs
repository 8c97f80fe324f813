// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Moving array data across the boundary.
//!
//! - **Export** ([`Tensor::from_array`]): the host array's elements are
//!   copied into a new native tensor, and the array itself is kept as the
//!   tensor's shadow.
//! - **Import** ([`Tensor::to_array`]): the shadow is returned when present
//!   and no refresh is requested. Otherwise the native buffer is copied into
//!   a fresh host array while the boundary lock is held. The result never
//!   aliases native memory.

use crate::dtype::{as_bytes, to_host, to_native, Element};
use crate::tensor::Shadow;
use crate::{PtensorError, Result, Runtime, Shape, Tensor};
use ndarray::{ArcArray, ArrayBase, ArrayD, ArrayView, ArrayViewD, Data, Dimension, IxDyn};
use std::ptr;

impl Shadow {
    fn new<T: Element>(array: ArcArray<T, IxDyn>) -> Self {
        Self {
            host_type: T::HOST_TYPE,
            array: Box::new(array),
        }
    }

    fn get<T: Element>(&self) -> Result<ArcArray<T, IxDyn>> {
        self.array
            .downcast_ref::<ArcArray<T, IxDyn>>()
            .cloned()
            .ok_or_else(|| {
                PtensorError::InvalidArgument(format!(
                    "tensor holds {} elements, requested {}",
                    self.host_type,
                    T::HOST_TYPE
                ))
            })
    }
}

impl Tensor {
    /// Creates a native tensor from a host array and keeps the array as the
    /// tensor's shadow.
    ///
    /// Arrays that are not in standard row-major layout are copied into a
    /// contiguous buffer first. The element type is checked before anything
    /// crosses the boundary.
    ///
    /// # Example
    /// ```
    /// # #[cfg(feature = "reference")] {
    /// use ndarray::ArcArray;
    /// use ptensor::{Runtime, Tensor};
    ///
    /// let rt = Runtime::reference();
    /// let a = ArcArray::from_shape_vec((2, 5), (1..=10).map(|v| v as f32).collect()).unwrap();
    /// let t = Tensor::from_array(&rt, a.clone()).unwrap();
    /// assert_eq!(t.size(), 10);
    /// assert_eq!(t.to_array::<f32>(true).unwrap(), a.into_dyn());
    /// # }
    /// ```
    pub fn from_array<T: Element, D: Dimension>(
        runtime: &Runtime,
        array: ArcArray<T, D>,
    ) -> Result<Self> {
        let dtype = to_native(T::HOST_TYPE)?;
        let array = array.into_dyn();
        let shape = Shape::from(array.shape());

        let mut tensor = match array.as_slice() {
            Some(values) => Tensor::from_bytes(runtime, dtype, shape, as_bytes(values))?,
            None => {
                tracing::debug!("copying non-contiguous {} array {shape}", T::HOST_TYPE);
                let values: Vec<T> = array.iter().copied().collect();
                Tensor::from_bytes(runtime, dtype, shape, as_bytes(&values))?
            }
        };
        tensor.shadow = Some(Shadow::new(array));
        Ok(tensor)
    }

    /// Creates a native tensor from a borrowed array.
    ///
    /// The view is copied into a shared array, which becomes the shadow.
    pub fn from_array_view<T: Element, D: Dimension>(
        runtime: &Runtime,
        view: ArrayView<'_, T, D>,
    ) -> Result<Self> {
        Self::from_array(runtime, view.to_shared())
    }

    /// Creates a native tensor from any owned or borrowed `ndarray` array.
    pub fn from_ndarray<T: Element, S: Data<Elem = T>, D: Dimension>(
        runtime: &Runtime,
        array: &ArrayBase<S, D>,
    ) -> Result<Self> {
        Self::from_array(runtime, array.to_shared())
    }

    /// Returns the tensor's contents as a host array.
    ///
    /// Without `refresh`, a tensor built by [`from_array`](Tensor::from_array)
    /// returns its shadow and makes no native call. With `refresh`, or when
    /// there is no shadow, the native buffer is copied.
    ///
    /// # Errors
    /// [`PtensorError::InvalidArgument`] if `T` does not match the tensor's
    /// element type, or the native dtype has no host representation.
    pub fn to_array<T: Element>(&self, refresh: bool) -> Result<ArcArray<T, IxDyn>> {
        if !refresh {
            if let Some(shadow) = &self.shadow {
                let array = shadow.get::<T>()?;
                self.runtime().record(|s| s.record_shadow_read());
                return Ok(array);
            }
        }
        let (shape, values) = self.copy_out::<T>()?;
        ArrayD::from_shape_vec(IxDyn(shape.dims()), values)
            .map(ArrayD::into_shared)
            .map_err(|e| PtensorError::InvalidOperation(format!("cannot shape copied data: {e}")))
    }

    /// Runs `f` on a read-only view of the tensor's contents.
    ///
    /// The view is backed by host memory: the shadow, or a fresh copy. The
    /// boundary lock is released before `f` runs, so `f` may use other
    /// tensors freely.
    pub fn with_array<T: Element, R>(
        &self,
        refresh: bool,
        f: impl FnOnce(ArrayViewD<'_, T>) -> R,
    ) -> Result<R> {
        let array = self.to_array::<T>(refresh)?;
        Ok(f(array.view()))
    }

    /// Copies the native buffer into a flat `Vec` in row-major order.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        self.copy_out::<T>().map(|(_, values)| values)
    }

    /// Copies the native buffer as raw bytes. Works for every dtype,
    /// including those without a host element type.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let boundary = self.runtime().enter();
        let dtype = self.dtype_locked(&boundary)?;
        let count = unsafe { (boundary.api().get_size)(self.handle()) };
        let len = count.checked_mul(dtype.size_bytes()).ok_or_else(|| {
            PtensorError::InvalidOperation(format!("native size {count} overflows"))
        })?;
        let mut bytes = vec![0u8; len];
        if len > 0 {
            let data = unsafe { (boundary.api().get_data)(self.handle()) };
            if data.is_null() {
                return Err(null_data(count));
            }
            // SAFETY: the native buffer holds `count` elements of `dtype`,
            // and stays alive while the boundary is held.
            unsafe { ptr::copy_nonoverlapping(data.cast::<u8>(), bytes.as_mut_ptr(), len) };
        }
        drop(boundary);
        self.runtime().record(|s| s.record_copy_out(len));
        Ok(bytes)
    }

    /// Whether reads can be served from a host-side shadow.
    pub fn has_shadow(&self) -> bool {
        self.shadow.is_some()
    }

    /// Copies the native buffer into host memory, checking dtype and size.
    fn copy_out<T: Element>(&self) -> Result<(Shape, Vec<T>)> {
        let boundary = self.runtime().enter();
        let dtype = self.dtype_locked(&boundary)?;
        let host = to_host(dtype)?;
        if host != T::HOST_TYPE {
            return Err(PtensorError::InvalidArgument(format!(
                "tensor holds {dtype} ({host}) elements, requested {}",
                T::HOST_TYPE
            )));
        }
        let shape = self.shape_locked(&boundary)?;
        let count = shape.checked_num_elements().ok_or_else(|| {
            PtensorError::InvalidOperation(format!("native shape {shape} overflows"))
        })?;
        let native_count = unsafe { (boundary.api().get_size)(self.handle()) };
        if native_count != count {
            return Err(PtensorError::InvalidOperation(format!(
                "native size {native_count} does not match shape {shape}"
            )));
        }

        let len = count.checked_mul(dtype.size_bytes()).ok_or_else(|| {
            PtensorError::InvalidOperation(format!("native size {count} overflows"))
        })?;
        let mut values: Vec<T> = Vec::with_capacity(count);
        if count > 0 {
            let data = unsafe { (boundary.api().get_data)(self.handle()) };
            if data.is_null() {
                return Err(null_data(count));
            }
            // SAFETY: the buffer holds `count` elements of `dtype`, whose size
            // equals `size_of::<T>()` since `to_host(dtype) == T::HOST_TYPE`.
            // Copying bytes avoids assuming the native buffer is aligned for
            // `T`. Every bit pattern is a valid value of the numeric types
            // `to_host` can produce.
            unsafe {
                ptr::copy_nonoverlapping(data.cast::<u8>(), values.as_mut_ptr().cast::<u8>(), len);
                values.set_len(count);
            }
        }
        drop(boundary);

        self.runtime().record(|s| s.record_copy_out(len));
        tracing::debug!("copied {len} bytes out of {dtype} tensor {shape}");
        Ok((shape, values))
    }
}

fn null_data(count: usize) -> PtensorError {
    PtensorError::InvalidOperation(format!(
        "p10_get_data returned null for a tensor of {count} elements"
    ))
}
