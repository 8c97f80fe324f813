// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # ptensor
//!
//! Safe, owned bindings for the ptensor native tensor library.
//!
//! This crate provides:
//! - [`Runtime`]: a loaded native library plus the process-wide lock that
//!   serialises every boundary crossing.
//! - [`Tensor`]: an owned native tensor handle, released exactly once.
//! - [`DType`] / [`HostType`]: the native and host element types, and the
//!   [`to_native`] / [`to_host`] mapping between them.
//! - Array marshalling to and from `ndarray` arrays, with a host-side shadow
//!   copy that serves reads without touching native memory.
//! - [`LibraryConfig`]: TOML configuration for locating the library.
//! - [`HandleStats`]: handle and copy counters for leak checks.
//!
//! # Error Handling
//! Every native status is checked. A non-OK status becomes
//! [`PtensorError::Native`] carrying the code and the library's last-error
//! message, fetched before any other call can overwrite it. Input the
//! library would reject is refused up front with
//! [`PtensorError::InvalidArgument`] and never crosses the boundary.
//!
//! # Example
//! ```no_run
//! use ptensor::{LibraryConfig, Runtime, Tensor};
//!
//! # fn main() -> ptensor::Result<()> {
//! let rt = Runtime::load(&LibraryConfig::default())?;
//! let values: Vec<f32> = (1..=10).map(|v| v as f32).collect();
//! let t = Tensor::from_slice(&rt, vec![2, 5], &values)?;
//! assert_eq!(t.size(), 10);
//! assert_eq!(t.to_vec::<f32>()?, values);
//! # Ok(())
//! # }
//! ```

mod config;
mod dtype;
mod error;
mod marshal;
mod runtime;
mod shape;
mod stats;
mod tensor;

pub use config::LibraryConfig;
pub use dtype::{to_host, to_native, DType, Element, HostType};
pub use error::{ErrorCode, PtensorError, Result};
pub use runtime::Runtime;
pub use shape::Shape;
pub use stats::HandleStats;
pub use tensor::Tensor;

pub use ptensor_sys as sys;
