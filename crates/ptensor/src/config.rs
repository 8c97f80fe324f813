// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Where to find the native library, loaded from TOML files or constructed
//! programmatically.
//!
//! # TOML Format
//! ```toml
//! library_path = "/opt/ptensor/libptensor_capi.so"
//! search_paths = ["./build/lin-release/native/c", "./build/lin-debug/native/c"]
//! file_names = ["libptensor_capi.so"]
//! ```
//!
//! Every field is optional. `library_path` short-circuits discovery; an empty
//! `file_names` list means the platform defaults.

use crate::{PtensorError, Result};
use ptensor_sys::DEFAULT_FILE_NAMES;
use std::path::{Path, PathBuf};

/// Configuration for locating and loading the native library.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LibraryConfig {
    /// Exact library file to load. Disables the search when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_path: Option<PathBuf>,
    /// Directories searched, in order, for each of `file_names`.
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
    /// Candidate library file names. Empty means [`DEFAULT_FILE_NAMES`].
    #[serde(default)]
    pub file_names: Vec<String>,
}

impl LibraryConfig {
    /// Config that loads exactly `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PtensorError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| PtensorError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PtensorError::Config(format!("TOML serialise error: {e}")))
    }

    /// File names to try, falling back to the platform defaults.
    pub fn resolved_file_names(&self) -> Vec<String> {
        if self.file_names.is_empty() {
            DEFAULT_FILE_NAMES.iter().map(|s| s.to_string()).collect()
        } else {
            self.file_names.clone()
        }
    }
}

impl Default for LibraryConfig {
    /// Searches the native build tree's output directories.
    fn default() -> Self {
        Self {
            library_path: None,
            search_paths: vec![
                PathBuf::from("./build/lin-release/native/c"),
                PathBuf::from("./build/lin-debug/native/c"),
                PathBuf::from("./build/msbuild/native/c/Release"),
                PathBuf::from("./build/msbuild/native/c/Debug"),
            ],
            file_names: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = LibraryConfig::default();
        assert!(c.library_path.is_none());
        assert_eq!(c.search_paths.len(), 4);
        assert_eq!(c.resolved_file_names().len(), DEFAULT_FILE_NAMES.len());
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
library_path = "/opt/ptensor/libptensor_capi.so"
search_paths = ["/a", "/b"]
file_names = ["libcustom.so"]
"#;
        let c = LibraryConfig::from_toml(toml).unwrap();
        assert_eq!(
            c.library_path,
            Some(PathBuf::from("/opt/ptensor/libptensor_capi.so"))
        );
        assert_eq!(c.search_paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(c.resolved_file_names(), vec!["libcustom.so".to_string()]);
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let c = LibraryConfig::from_toml("").unwrap();
        assert!(c.library_path.is_none());
        assert!(c.search_paths.is_empty());
        assert!(c.file_names.is_empty());
    }

    #[test]
    fn test_toml_roundtrip() {
        let c = LibraryConfig::default();
        let text = c.to_toml().unwrap();
        assert!(!text.contains("library_path"));
        assert_eq!(LibraryConfig::from_toml(&text).unwrap(), c);
    }

    #[test]
    fn test_bad_toml() {
        let err = LibraryConfig::from_toml("search_paths = 3").unwrap_err();
        assert!(matches!(err, PtensorError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = LibraryConfig::from_file(Path::new("/nonexistent/ptensor.toml")).unwrap_err();
        assert!(err.to_string().contains("cannot read config"));
    }

    #[test]
    fn test_sample_config_parses() {
        let c = LibraryConfig::from_toml(include_str!("../../../configs/ptensor.toml")).unwrap();
        assert!(c.library_path.is_none());
        assert_eq!(c.search_paths[0], PathBuf::from("./build/lin-release/native/c"));
        assert_eq!(c.resolved_file_names()[0], "libptensor_capi.so");
    }

    #[test]
    fn test_with_path() {
        let c = LibraryConfig::with_path("/x/libptensor.so");
        assert_eq!(c.library_path, Some(PathBuf::from("/x/libptensor.so")));
    }
}
