// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # ptensor-capi
//!
//! A reference implementation of the ptensor C ABI.
//!
//! Built as a `cdylib` it produces `libptensor_capi.so`, which the `ptensor`
//! crate can load like the real engine. Linked as an `rlib`, [`api`] returns
//! a [`P10Api`] table pointing straight at these functions, so tests and the
//! CLI's `--reference` mode run without any shared library on disk.
//!
//! Semantics:
//! - `p10_from_data` copies the caller's bytes; the caller keeps its buffer.
//! - `p10_destroy` frees the tensor and nulls the caller's handle; a null
//!   handle is accepted and ignored.
//! - Failures return a non-zero code and record a message in a thread-local
//!   slot read by `p10_get_last_error_message`.
//! - At most [`P10_MAX_SHAPE`] dimensions; zero dimensions is a scalar.

mod error_state;
mod store;

use error_state::fail;
use ptensor_sys::*;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;
use store::NativeTensor;

/// Returns the function table for this in-process implementation.
pub fn api() -> P10Api {
    P10Api {
        get_last_error_message: p10_get_last_error_message,
        from_data: p10_from_data,
        destroy: p10_destroy,
        get_size: p10_get_size,
        get_dtype: p10_get_dtype,
        get_shape: p10_get_shape,
        get_dimensions: p10_get_dimensions,
        get_data: p10_get_data,
    }
}

/// Returns the message of the last failure on this thread, or null.
///
/// # Safety
/// The returned string is owned by the library and is invalidated by the
/// next failing call on the same thread.
#[no_mangle]
pub unsafe extern "C" fn p10_get_last_error_message() -> *const c_char {
    error_state::last_message()
}

/// Creates a tensor from `num_dims` extents and a row-major byte buffer.
///
/// # Safety
/// `tensor` must be writable. `shape` must point to `num_dims` readable
/// values and `data` to as many bytes as the shape and dtype imply.
#[no_mangle]
pub unsafe extern "C" fn p10_from_data(
    tensor: *mut P10Tensor,
    dtype: P10DTypeEnum,
    shape: *const i64,
    num_dims: usize,
    data: *const u8,
) -> P10ErrorEnum {
    if tensor.is_null() {
        return fail(P10_INVALID_ARGUMENT, "output tensor pointer is null");
    }
    if num_dims > P10_MAX_SHAPE {
        return fail(
            P10_OUT_OF_RANGE,
            &format!("{num_dims} dimensions exceed the maximum of {P10_MAX_SHAPE}"),
        );
    }
    if num_dims > 0 && shape.is_null() {
        return fail(P10_INVALID_ARGUMENT, "shape pointer is null");
    }
    let Some(elem_size) = store::element_size(dtype) else {
        return fail(P10_INVALID_ARGUMENT, "Invalid dtype");
    };

    let dims = if num_dims == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(shape, num_dims).to_vec()
    };
    if let Some(bad) = dims.iter().find(|&&d| d < 0) {
        return fail(P10_INVALID_ARGUMENT, &format!("negative extent {bad}"));
    }
    let Some(len) = store::byte_len(&dims, elem_size) else {
        return fail(P10_OUT_OF_MEMORY, "tensor byte size overflows");
    };
    if len > 0 && data.is_null() {
        return fail(P10_INVALID_ARGUMENT, "data pointer is null");
    }

    let bytes = if len == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(data, len).to_vec()
    };
    let native = Box::new(NativeTensor {
        dtype,
        shape: dims,
        data: bytes,
    });
    *tensor = Box::into_raw(native).cast::<c_void>();
    P10_OK
}

/// Frees a tensor and sets `*tensor` to null.
///
/// # Safety
/// `*tensor` must be null or a handle returned by [`p10_from_data`] that has
/// not been destroyed yet.
#[no_mangle]
pub unsafe extern "C" fn p10_destroy(tensor: *mut P10Tensor) -> c_int {
    if tensor.is_null() || (*tensor).is_null() {
        return P10_OK;
    }
    drop(Box::from_raw((*tensor).cast::<NativeTensor>()));
    *tensor = ptr::null_mut();
    P10_OK
}

/// # Safety
/// `tensor` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn p10_get_size(tensor: P10Tensor) -> usize {
    native(tensor).map_or(0, NativeTensor::size)
}

/// # Safety
/// `tensor` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn p10_get_dtype(tensor: P10Tensor) -> P10DTypeEnum {
    native(tensor).map_or(-1, |t| t.dtype)
}

/// Copies the extents into `shape`, which must have room for all of them.
///
/// # Safety
/// `tensor` must be null or a live handle; `shape` must point to `num_dims`
/// writable values.
#[no_mangle]
pub unsafe extern "C" fn p10_get_shape(
    tensor: P10Tensor,
    shape: *mut i64,
    num_dims: usize,
) -> P10ErrorEnum {
    let Some(native) = native(tensor) else {
        return fail(P10_INVALID_ARGUMENT, "tensor handle is null");
    };
    let dims = native.shape.len();
    if num_dims < dims {
        return fail(
            P10_INVALID_ARGUMENT,
            &format!("shape buffer holds {num_dims} values, tensor has {dims} dimensions"),
        );
    }
    if dims > 0 {
        if shape.is_null() {
            return fail(P10_INVALID_ARGUMENT, "shape buffer is null");
        }
        ptr::copy_nonoverlapping(native.shape.as_ptr(), shape, dims);
    }
    P10_OK
}

/// # Safety
/// `tensor` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn p10_get_dimensions(tensor: P10Tensor) -> usize {
    native(tensor).map_or(0, |t| t.shape.len())
}

/// Returns the backing buffer, or null for an empty tensor.
///
/// # Safety
/// `tensor` must be null or a live handle. The buffer is valid until the
/// tensor is destroyed.
#[no_mangle]
pub unsafe extern "C" fn p10_get_data(tensor: P10Tensor) -> *mut c_void {
    match native(tensor) {
        Some(t) if !t.data.is_empty() => t.data.as_ptr().cast_mut().cast::<c_void>(),
        _ => ptr::null_mut(),
    }
}

unsafe fn native<'a>(tensor: P10Tensor) -> Option<&'a NativeTensor> {
    tensor.cast::<NativeTensor>().as_ref()
}
