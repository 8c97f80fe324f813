// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared setup.

pub mod info;
pub mod load;
pub mod roundtrip;

use ptensor::{LibraryConfig, Runtime};
use std::path::Path;

/// Installs the tracing subscriber. `RUST_LOG` overrides the `-v` level.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_target(false).init();
}

/// Binds the runtime the subcommands operate on.
pub fn open_runtime(config: Option<&Path>, reference: bool) -> anyhow::Result<Runtime> {
    if reference {
        return Ok(Runtime::reference());
    }
    let config = match config {
        Some(path) => LibraryConfig::from_file(path)?,
        None => LibraryConfig::default(),
    };
    tracing::debug!("library config: {config:?}");
    Runtime::load(&config).map_err(|e| {
        anyhow::anyhow!("{e}\nhint: set PTENSOR_LIB_PATH, pass --config, or use --reference")
    })
}

/// Prints the boxed header every subcommand starts with.
pub fn banner(title: &str) {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║{:^54}║", format!("ptensor · {title}"));
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
}
