// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # ptensor-sys
//!
//! Raw declarations for the ptensor C ABI.
//!
//! This crate provides:
//! - [`P10Tensor`]: the opaque, pointer-sized tensor handle.
//! - Integer codes for dtypes (`P10_DTYPE_*`) and errors (`P10_*`), exactly
//!   as the native headers define them.
//! - [`P10Api`]: a table of function pointers covering every entry point
//!   the bindings use.
//! - [`NativeLibrary`]: locates a shared library, resolves every symbol of
//!   the table and keeps the library mapped for as long as it lives.
//!
//! Nothing here is safe to call directly. The `ptensor` crate wraps the
//! table in owned handle types and checks every returned status.
//!
//! # Handle Contract
//! ```text
//! p10_from_data(&mut handle, ..)   ──► handle owns a native allocation
//!       │
//!       │  p10_get_* (handle)          read-only accessors
//!       ▼
//! p10_destroy(&mut handle)         ──► allocation released, handle nulled
//! ```

mod error;
mod library;

pub use error::LoadError;
pub use library::{candidate_paths, NativeLibrary, DEFAULT_FILE_NAMES, LIB_PATH_ENV};

use std::os::raw::{c_char, c_int, c_void};

/// Opaque handle to a tensor living in native memory.
pub type P10Tensor = *mut c_void;

/// Status code returned by fallible entry points.
pub type P10ErrorEnum = c_int;

/// Element type tag understood by the native library.
pub type P10DTypeEnum = c_int;

pub const P10_OK: P10ErrorEnum = 0;
pub const P10_UNKNOWN_ERROR: P10ErrorEnum = 1;
pub const P10_ASSERTION_ERROR: P10ErrorEnum = 2;
pub const P10_INVALID_ARGUMENT: P10ErrorEnum = 3;
pub const P10_INVALID_OPERATION: P10ErrorEnum = 4;
pub const P10_OUT_OF_MEMORY: P10ErrorEnum = 5;
pub const P10_OUT_OF_RANGE: P10ErrorEnum = 6;
pub const P10_NOT_IMPLEMENTED: P10ErrorEnum = 7;
pub const P10_OS_ERROR: P10ErrorEnum = 8;
pub const P10_IO_ERROR: P10ErrorEnum = 9;

pub const P10_DTYPE_FLOAT32: P10DTypeEnum = 0;
pub const P10_DTYPE_FLOAT64: P10DTypeEnum = 1;
pub const P10_DTYPE_FLOAT16: P10DTypeEnum = 2;
pub const P10_DTYPE_UINT8: P10DTypeEnum = 3;
pub const P10_DTYPE_UINT16: P10DTypeEnum = 4;
pub const P10_DTYPE_UINT32: P10DTypeEnum = 5;
pub const P10_DTYPE_INT8: P10DTypeEnum = 6;
pub const P10_DTYPE_INT16: P10DTypeEnum = 7;
pub const P10_DTYPE_INT32: P10DTypeEnum = 8;
pub const P10_DTYPE_INT64: P10DTypeEnum = 9;

/// Highest valid dtype tag.
pub const P10_DTYPE_LAST: P10DTypeEnum = P10_DTYPE_INT64;

/// Maximum number of dimensions a native tensor may have.
pub const P10_MAX_SHAPE: usize = 8;

/// Returns the message recorded by the last failing call, or null.
pub type GetLastErrorMessageFn = unsafe extern "C" fn() -> *const c_char;

/// Allocates a tensor and copies `data` into it.
pub type FromDataFn = unsafe extern "C" fn(
    tensor: *mut P10Tensor,
    dtype: P10DTypeEnum,
    shape: *const i64,
    num_dims: usize,
    data: *const u8,
) -> P10ErrorEnum;

/// Releases a tensor and nulls the handle it was given.
pub type DestroyFn = unsafe extern "C" fn(tensor: *mut P10Tensor) -> c_int;

pub type GetSizeFn = unsafe extern "C" fn(tensor: P10Tensor) -> usize;

pub type GetDTypeFn = unsafe extern "C" fn(tensor: P10Tensor) -> P10DTypeEnum;

/// Writes the tensor extents into a caller-provided buffer of `num_dims` slots.
pub type GetShapeFn =
    unsafe extern "C" fn(tensor: P10Tensor, shape: *mut i64, num_dims: usize) -> P10ErrorEnum;

pub type GetDimensionsFn = unsafe extern "C" fn(tensor: P10Tensor) -> usize;

/// Returns the tensor's backing buffer. Null means there is none.
pub type GetDataFn = unsafe extern "C" fn(tensor: P10Tensor) -> *mut c_void;

/// Symbol names resolved by [`NativeLibrary`], in [`P10Api`] field order.
pub const SYMBOLS: [&str; 8] = [
    "p10_get_last_error_message",
    "p10_from_data",
    "p10_destroy",
    "p10_get_size",
    "p10_get_dtype",
    "p10_get_shape",
    "p10_get_dimensions",
    "p10_get_data",
];

/// Function table for the ptensor C ABI.
///
/// A table is either resolved from a shared library by [`NativeLibrary`]
/// or assembled from statically linked functions (see `ptensor-capi`).
/// Whoever builds one guarantees that every pointer follows the contract
/// documented on its type alias.
#[derive(Debug, Clone, Copy)]
pub struct P10Api {
    pub get_last_error_message: GetLastErrorMessageFn,
    pub from_data: FromDataFn,
    pub destroy: DestroyFn,
    pub get_size: GetSizeFn,
    pub get_dtype: GetDTypeFn,
    pub get_shape: GetShapeFn,
    pub get_dimensions: GetDimensionsFn,
    pub get_data: GetDataFn,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_contiguous() {
        let errors = [
            P10_OK,
            P10_UNKNOWN_ERROR,
            P10_ASSERTION_ERROR,
            P10_INVALID_ARGUMENT,
            P10_INVALID_OPERATION,
            P10_OUT_OF_MEMORY,
            P10_OUT_OF_RANGE,
            P10_NOT_IMPLEMENTED,
            P10_OS_ERROR,
            P10_IO_ERROR,
        ];
        for (i, code) in errors.iter().enumerate() {
            assert_eq!(*code, i as c_int);
        }
        assert_eq!(P10_DTYPE_LAST, 9);
    }

    #[test]
    fn test_symbol_names_unique() {
        let mut names = SYMBOLS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SYMBOLS.len());
        assert!(SYMBOLS.iter().all(|s| s.starts_with("p10_")));
    }
}
