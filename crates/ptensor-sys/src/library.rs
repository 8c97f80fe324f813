// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Shared-library discovery and symbol resolution.
//!
//! Candidates are tried in this order, first success wins:
//!
//! 1. An explicit path (when given, it is the only candidate).
//! 2. The `PTENSOR_LIB_PATH` environment variable.
//! 3. Every search directory joined with every candidate file name.
//!    Joined paths that do not exist are skipped without invoking the loader.
//! 4. The bare file names, left to the system loader's search path.
//!
//! A library that opens but lacks one of the [`SYMBOLS`](crate::SYMBOLS)
//! is an error, not a reason to keep searching.

use crate::{LoadError, P10Api, SYMBOLS};
use libloading::Library;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable naming the library file to load.
pub const LIB_PATH_ENV: &str = "PTENSOR_LIB_PATH";

/// File names the native build produces on the supported platforms.
pub const DEFAULT_FILE_NAMES: &[&str] = &[
    "libptensor_capi.so",
    "libptensor.so",
    "libptensor.dylib",
    "ptensor_capi.dll",
    "ptensor.dll",
];

/// A loaded ptensor shared library together with its resolved function table.
///
/// The [`P10Api`] returned by [`api`](NativeLibrary::api) points into the
/// mapped library, so it must not be used after the `NativeLibrary` is dropped.
pub struct NativeLibrary {
    path: PathBuf,
    api: P10Api,
    _lib: Library,
}

impl NativeLibrary {
    /// Loads the library at `path` and resolves every entry point.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        // SAFETY: loading runs the library's static initialisers. The ptensor
        // C shim only sets up its error-message storage there.
        let lib = unsafe { Library::new(path) }.map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let api = resolve_api(&lib, path)?;
        tracing::info!("loaded native library '{}'", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            api,
            _lib: lib,
        })
    }

    /// Searches the candidate locations and loads the first library found.
    pub fn discover(
        explicit: Option<&Path>,
        search_paths: &[PathBuf],
        file_names: &[String],
    ) -> Result<Self, LoadError> {
        if let Some(path) = explicit {
            return Self::open(path);
        }

        let candidates = candidate_paths(
            None,
            std::env::var_os(LIB_PATH_ENV),
            search_paths,
            file_names,
        );
        let mut tried = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let bare = candidate.components().count() == 1;
            if !bare && !candidate.is_file() {
                tried.push(candidate);
                continue;
            }
            match Self::open(&candidate) {
                Ok(lib) => return Ok(lib),
                Err(err @ LoadError::MissingSymbol { .. }) => return Err(err),
                Err(err) => {
                    tracing::debug!("skipping '{}': {err}", candidate.display());
                    tried.push(candidate);
                }
            }
        }

        Err(LoadError::NotFound { tried })
    }

    /// Returns the path the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the resolved function table.
    pub fn api(&self) -> &P10Api {
        &self.api
    }
}

impl std::fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Builds the ordered list of locations [`NativeLibrary::discover`] tries.
pub fn candidate_paths(
    explicit: Option<&Path>,
    env_override: Option<OsString>,
    search_paths: &[PathBuf],
    file_names: &[String],
) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path.to_path_buf()];
    }

    let mut candidates = Vec::new();
    if let Some(env) = env_override.filter(|v| !v.is_empty()) {
        candidates.push(PathBuf::from(env));
    }
    for dir in search_paths {
        for name in file_names {
            candidates.push(dir.join(name));
        }
    }
    for name in file_names {
        candidates.push(PathBuf::from(name));
    }
    candidates
}

fn resolve_api(lib: &Library, path: &Path) -> Result<P10Api, LoadError> {
    let [get_last_error_message, from_data, destroy, get_size, get_dtype, get_shape, get_dimensions, get_data] = SYMBOLS;
    Ok(P10Api {
        get_last_error_message: load_symbol(lib, path, get_last_error_message)?,
        from_data: load_symbol(lib, path, from_data)?,
        destroy: load_symbol(lib, path, destroy)?,
        get_size: load_symbol(lib, path, get_size)?,
        get_dtype: load_symbol(lib, path, get_dtype)?,
        get_shape: load_symbol(lib, path, get_shape)?,
        get_dimensions: load_symbol(lib, path, get_dimensions)?,
        get_data: load_symbol(lib, path, get_data)?,
    })
}

fn load_symbol<T: Copy>(lib: &Library, path: &Path, symbol: &'static str) -> Result<T, LoadError> {
    // SAFETY: T is the signature the ptensor headers declare for `symbol`.
    let sym = unsafe { lib.get::<T>(symbol.as_bytes()) }.map_err(|source| {
        LoadError::MissingSymbol {
            path: path.to_path_buf(),
            symbol,
            source,
        }
    })?;
    Ok(*sym)
}
