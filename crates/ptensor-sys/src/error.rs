// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for native library loading.

use std::path::PathBuf;

/// Errors that can occur while locating or binding the native library.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The dynamic loader rejected the file.
    #[error("cannot open native library '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// The library loaded but does not export a required entry point.
    #[error("native library '{path}' does not export '{symbol}': {source}")]
    MissingSymbol {
        path: PathBuf,
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    /// No candidate location produced a loadable library.
    #[error("native library not found (tried: {})", display_paths(.tried))]
    NotFound { tried: Vec<PathBuf> },
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "nothing".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_candidates() {
        let err = LoadError::NotFound {
            tried: vec![PathBuf::from("/a/libptensor.so"), PathBuf::from("ptensor.dll")],
        };
        let msg = err.to_string();
        assert!(msg.contains("/a/libptensor.so"));
        assert!(msg.contains("ptensor.dll"));
    }

    #[test]
    fn test_not_found_empty() {
        let err = LoadError::NotFound { tried: vec![] };
        assert!(err.to_string().contains("nothing"));
    }
}
