// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A bound native library and the lock that serialises calls into it.
//!
//! The native library keeps a single last-error slot that the next call
//! overwrites. A failing call and the fetch of its message must therefore
//! happen back to back with no other call in between, from any thread.
//! Every boundary crossing in this crate runs inside [`Boundary`], which
//! holds one process-wide mutex for the whole "call + check" or
//! "get pointer + copy" sequence.
//!
//! ```text
//! Tensor::shape()
//!     │  runtime.enter()          ── lock BOUNDARY
//!     │  p10_get_dimensions
//!     │  p10_get_shape ── non-OK? ── p10_get_last_error_message
//!     ▼  drop(Boundary)           ── unlock
//! ```

use crate::{ErrorCode, HandleStats, LibraryConfig, PtensorError, Result};
use ptensor_sys::{NativeLibrary, P10Api, P10ErrorEnum, P10_OK};
use std::ffi::CStr;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Held across every sequence of native calls that must not interleave.
///
/// Process-wide rather than per runtime: two runtimes may resolve to the
/// same library and therefore share its error slot.
static BOUNDARY: Mutex<()> = Mutex::new(());

fn lock() -> MutexGuard<'static, ()> {
    // The guarded data is `()`, so a panic while holding the lock leaves
    // nothing inconsistent behind.
    BOUNDARY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared state behind a [`Runtime`].
struct RuntimeInner {
    api: P10Api,
    /// Keeps the function pointers in `api` mapped. `None` for tables that
    /// point at statically linked code.
    library: Option<NativeLibrary>,
    stats: Mutex<HandleStats>,
}

/// A handle to a bound native library.
///
/// Cheap to clone. Every [`Tensor`](crate::Tensor) holds a clone, so the
/// library stays loaded until the last tensor created through it is gone.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    /// Locates and loads the native library described by `config`.
    pub fn load(config: &LibraryConfig) -> Result<Self> {
        let library = NativeLibrary::discover(
            config.library_path.as_deref(),
            &config.search_paths,
            &config.resolved_file_names(),
        )?;
        Ok(Self::from_library(library))
    }

    /// Loads the native library at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_library(NativeLibrary::open(path)?))
    }

    fn from_library(library: NativeLibrary) -> Self {
        tracing::info!("runtime bound to '{}'", library.path().display());
        Self::build(*library.api(), Some(library))
    }

    /// Wraps a function table that is not backed by a loaded library.
    ///
    /// # Safety
    /// Every pointer in `api` must stay callable for the rest of the program
    /// and follow the contract documented on its `ptensor_sys` type alias.
    pub unsafe fn from_api(api: P10Api) -> Self {
        Self::build(api, None)
    }

    /// Runtime backed by the in-process reference engine.
    #[cfg(feature = "reference")]
    pub fn reference() -> Self {
        tracing::info!("runtime bound to the in-process reference engine");
        // SAFETY: the reference engine is linked into this binary.
        unsafe { Self::from_api(ptensor_capi::api()) }
    }

    fn build(api: P10Api, library: Option<NativeLibrary>) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                api,
                library,
                stats: Mutex::new(HandleStats::default()),
            }),
        }
    }

    /// Path of the loaded library, or `None` for a table built in-process.
    pub fn library_path(&self) -> Option<&Path> {
        self.inner.library.as_ref().map(NativeLibrary::path)
    }

    /// Snapshot of the handle statistics.
    pub fn stats(&self) -> HandleStats {
        self.inner
            .stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Takes the process-wide boundary lock.
    ///
    /// Hold the returned guard while calling native entry points directly on
    /// a handle from [`Tensor::as_raw`](crate::Tensor::as_raw). Do not call
    /// into this crate or drop a tensor while holding it: the lock is not
    /// reentrant.
    pub fn lock_boundary(&self) -> MutexGuard<'static, ()> {
        lock()
    }

    pub(crate) fn enter(&self) -> Boundary<'_> {
        Boundary {
            runtime: self,
            _guard: lock(),
        }
    }

    pub(crate) fn record(&self, f: impl FnOnce(&mut HandleStats)) {
        if let Ok(mut stats) = self.inner.stats.lock() {
            f(&mut stats);
        }
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("library", &self.library_path())
            .finish_non_exhaustive()
    }
}

/// An open boundary crossing. Native calls are only made through one of these.
pub(crate) struct Boundary<'a> {
    runtime: &'a Runtime,
    _guard: MutexGuard<'static, ()>,
}

impl Boundary<'_> {
    pub(crate) fn api(&self) -> &P10Api {
        &self.runtime.inner.api
    }

    /// Turns the status of the call just made into a `Result`.
    ///
    /// On failure the last-error message is fetched before anything else
    /// touches the library. An OK status never triggers a fetch.
    pub(crate) fn check(&self, op: &'static str, code: P10ErrorEnum) -> Result<()> {
        if code == P10_OK {
            return Ok(());
        }
        let code = ErrorCode::from_raw(code);
        // SAFETY: the pointer is either null or a NUL-terminated string owned
        // by the library, valid until the next call, which cannot happen while
        // this boundary is open.
        let message = unsafe {
            let ptr = (self.api().get_last_error_message)();
            (!ptr.is_null()).then(|| CStr::from_ptr(ptr).to_string_lossy().into_owned())
        };
        let message = match message {
            Some(m) if !m.is_empty() => m,
            _ => {
                tracing::warn!("{op} failed with {code} and left no error message");
                code.description().to_string()
            }
        };
        self.runtime.record(HandleStats::record_failure);
        Err(PtensorError::Native { op, code, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::raw::c_char;

    fn reference() -> Runtime {
        unsafe { Runtime::from_api(ptensor_capi::api()) }
    }

    #[test]
    fn test_check_ok_does_not_record() {
        let rt = reference();
        assert!(rt.enter().check("p10_from_data", P10_OK).is_ok());
        assert_eq!(rt.stats().failed_calls, 0);
    }

    unsafe extern "C" fn no_message() -> *const c_char {
        std::ptr::null()
    }

    #[test]
    fn test_check_without_message_uses_description() {
        let mut api = ptensor_capi::api();
        api.get_last_error_message = no_message;
        let rt = unsafe { Runtime::from_api(api) };
        let err = rt
            .enter()
            .check("p10_get_shape", ptensor_sys::P10_OUT_OF_MEMORY)
            .unwrap_err();
        match err {
            PtensorError::Native { op, code, message } => {
                assert_eq!(op, "p10_get_shape");
                assert_eq!(code, ErrorCode::OutOfMemory);
                assert_eq!(message, "out of memory");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(rt.stats().failed_calls, 1);
    }

    #[test]
    fn test_in_process_runtime_has_no_path() {
        let rt = reference();
        assert!(rt.library_path().is_none());
        assert!(format!("{rt:?}").starts_with("Runtime"));
    }

    #[test]
    fn test_clones_share_stats() {
        let rt = reference();
        let other = rt.clone();
        other.record(|s| s.record_construct(4));
        assert_eq!(rt.stats().constructed, 1);
    }

    #[test]
    fn test_open_missing_library() {
        let err = Runtime::open(Path::new("/nonexistent/libptensor.so")).unwrap_err();
        assert!(matches!(err, PtensorError::Load(_)));
        assert_eq!(err.code(), ErrorCode::Os);
    }

    #[test]
    fn test_load_not_found() {
        let config = LibraryConfig {
            library_path: None,
            search_paths: vec!["/nonexistent-ptensor".into()],
            file_names: vec!["libptensor_not_here.so".into()],
        };
        assert!(matches!(Runtime::load(&config), Err(PtensorError::Load(_))));
    }
}
