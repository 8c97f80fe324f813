// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Element types on both sides of the boundary and the mapping between them.
//!
//! [`DType`] is the native library's closed set of tags. [`HostType`] is the
//! set of element types a host array can carry, each implemented by a Rust
//! primitive through [`Element`]. The two sets overlap but are not equal:
//!
//! | Native only | Shared                                        | Host only   |
//! |-------------|-----------------------------------------------|-------------|
//! | `float16`   | f32 f64 u8 u16 u32 i8 i16 i32 i64             | bool, u64   |
//!
//! [`to_native`] and [`to_host`] convert across the shared part and reject
//! everything else with [`PtensorError::InvalidArgument`].

use crate::{PtensorError, Result};
use ptensor_sys::*;
use std::fmt;
use std::str::FromStr;

/// Element types understood by the native library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 32-bit IEEE 754 floating point.
    Float32,
    /// 64-bit IEEE 754 floating point.
    Float64,
    /// 16-bit IEEE 754 floating point. No host counterpart.
    Float16,
    Uint8,
    Uint16,
    Uint32,
    Int8,
    Int16,
    Int32,
    Int64,
}

impl DType {
    /// Every dtype, in native tag order.
    pub const ALL: [DType; 10] = [
        DType::Float32,
        DType::Float64,
        DType::Float16,
        DType::Uint8,
        DType::Uint16,
        DType::Uint32,
        DType::Int8,
        DType::Int16,
        DType::Int32,
        DType::Int64,
    ];

    /// Maps a native tag, or `None` if the tag is unknown.
    pub fn from_raw(raw: P10DTypeEnum) -> Option<Self> {
        match raw {
            P10_DTYPE_FLOAT32 => Some(DType::Float32),
            P10_DTYPE_FLOAT64 => Some(DType::Float64),
            P10_DTYPE_FLOAT16 => Some(DType::Float16),
            P10_DTYPE_UINT8 => Some(DType::Uint8),
            P10_DTYPE_UINT16 => Some(DType::Uint16),
            P10_DTYPE_UINT32 => Some(DType::Uint32),
            P10_DTYPE_INT8 => Some(DType::Int8),
            P10_DTYPE_INT16 => Some(DType::Int16),
            P10_DTYPE_INT32 => Some(DType::Int32),
            P10_DTYPE_INT64 => Some(DType::Int64),
            _ => None,
        }
    }

    /// Returns the native tag.
    pub fn to_raw(self) -> P10DTypeEnum {
        match self {
            DType::Float32 => P10_DTYPE_FLOAT32,
            DType::Float64 => P10_DTYPE_FLOAT64,
            DType::Float16 => P10_DTYPE_FLOAT16,
            DType::Uint8 => P10_DTYPE_UINT8,
            DType::Uint16 => P10_DTYPE_UINT16,
            DType::Uint32 => P10_DTYPE_UINT32,
            DType::Int8 => P10_DTYPE_INT8,
            DType::Int16 => P10_DTYPE_INT16,
            DType::Int32 => P10_DTYPE_INT32,
            DType::Int64 => P10_DTYPE_INT64,
        }
    }

    /// Returns the size of a single element in bytes.
    pub fn size_bytes(self) -> usize {
        match self {
            DType::Uint8 | DType::Int8 => 1,
            DType::Float16 | DType::Uint16 | DType::Int16 => 2,
            DType::Float32 | DType::Uint32 | DType::Int32 => 4,
            DType::Float64 | DType::Int64 => 8,
        }
    }

    /// Returns the name the native library uses for this dtype.
    pub fn as_str(self) -> &'static str {
        match self {
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Float16 => "float16",
            DType::Uint8 => "uint8",
            DType::Uint16 => "uint16",
            DType::Uint32 => "uint32",
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
        }
    }

    /// Native-endian encoding of the value one, used by `Tensor::ones`.
    pub(crate) fn one_bytes(self) -> Vec<u8> {
        match self {
            DType::Float32 => 1f32.to_ne_bytes().to_vec(),
            DType::Float64 => 1f64.to_ne_bytes().to_vec(),
            // IEEE 754 binary16 for 1.0.
            DType::Float16 => 0x3C00u16.to_ne_bytes().to_vec(),
            DType::Uint8 => vec![1],
            DType::Uint16 => 1u16.to_ne_bytes().to_vec(),
            DType::Uint32 => 1u32.to_ne_bytes().to_vec(),
            DType::Int8 => 1i8.to_ne_bytes().to_vec(),
            DType::Int16 => 1i16.to_ne_bytes().to_vec(),
            DType::Int32 => 1i32.to_ne_bytes().to_vec(),
            DType::Int64 => 1i64.to_ne_bytes().to_vec(),
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DType {
    type Err = PtensorError;

    /// Parses a dtype name (`"float32"`, `"int64"`, ...). Case-insensitive.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        DType::ALL
            .into_iter()
            .find(|d| d.as_str() == lower)
            .ok_or_else(|| PtensorError::InvalidArgument(format!("unknown dtype '{s}'")))
    }
}

/// Element types a host array can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl HostType {
    pub const ALL: [HostType; 11] = [
        HostType::Bool,
        HostType::I8,
        HostType::I16,
        HostType::I32,
        HostType::I64,
        HostType::U8,
        HostType::U16,
        HostType::U32,
        HostType::U64,
        HostType::F32,
        HostType::F64,
    ];

    /// Returns the Rust name of the element type.
    pub fn as_str(self) -> &'static str {
        match self {
            HostType::Bool => "bool",
            HostType::I8 => "i8",
            HostType::I16 => "i16",
            HostType::I32 => "i32",
            HostType::I64 => "i64",
            HostType::U8 => "u8",
            HostType::U16 => "u16",
            HostType::U32 => "u32",
            HostType::U64 => "u64",
            HostType::F32 => "f32",
            HostType::F64 => "f64",
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a host element type to its native dtype.
///
/// Fails with [`PtensorError::InvalidArgument`] for host types the native
/// library cannot store.
pub fn to_native(host: HostType) -> Result<DType> {
    match host {
        HostType::F32 => Ok(DType::Float32),
        HostType::F64 => Ok(DType::Float64),
        HostType::U8 => Ok(DType::Uint8),
        HostType::U16 => Ok(DType::Uint16),
        HostType::U32 => Ok(DType::Uint32),
        HostType::I8 => Ok(DType::Int8),
        HostType::I16 => Ok(DType::Int16),
        HostType::I32 => Ok(DType::Int32),
        HostType::I64 => Ok(DType::Int64),
        HostType::Bool | HostType::U64 => Err(PtensorError::InvalidArgument(format!(
            "host element type {host} has no native dtype"
        ))),
    }
}

/// Maps a native dtype to the host element type that represents it.
///
/// Fails with [`PtensorError::InvalidArgument`] for dtypes no host element
/// type can hold.
pub fn to_host(dtype: DType) -> Result<HostType> {
    match dtype {
        DType::Float32 => Ok(HostType::F32),
        DType::Float64 => Ok(HostType::F64),
        DType::Uint8 => Ok(HostType::U8),
        DType::Uint16 => Ok(HostType::U16),
        DType::Uint32 => Ok(HostType::U32),
        DType::Int8 => Ok(HostType::I8),
        DType::Int16 => Ok(HostType::I16),
        DType::Int32 => Ok(HostType::I32),
        DType::Int64 => Ok(HostType::I64),
        DType::Float16 => Err(PtensorError::InvalidArgument(format!(
            "dtype {dtype} has no host element type"
        ))),
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A Rust primitive usable as a host array element.
///
/// Sealed: implemented only for plain-old-data primitives, which is what
/// lets the bindings reinterpret element slices as bytes.
pub trait Element: sealed::Sealed + Copy + Send + Sync + 'static {
    const HOST_TYPE: HostType;
}

macro_rules! impl_element {
    ($($ty:ty => $host:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}
            impl Element for $ty {
                const HOST_TYPE: HostType = HostType::$host;
            }
        )*
    };
}

impl_element! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

/// Views a slice of elements as its underlying bytes.
pub(crate) fn as_bytes<T: Element>(values: &[T]) -> &[u8] {
    // SAFETY: Element is only implemented for primitives without padding,
    // and u8 has alignment 1.
    unsafe { std::slice::from_raw_parts(values.as_ptr().cast::<u8>(), std::mem::size_of_val(values)) }
}
