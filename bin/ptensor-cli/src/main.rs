// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # ptensor
//!
//! Command-line probe for the ptensor native library.
//!
//! ## Usage
//! ```bash
//! # Show which library was loaded and the dtype mapping
//! ptensor info
//!
//! # Round-trip a 2x5 array of every supported dtype through the library
//! ptensor roundtrip --rows 2 --cols 5
//!
//! # Build a tensor from a raw little-endian file
//! ptensor load --dtype float32 --shape 2,5 weights.bin
//!
//! # Use the built-in reference engine instead of a shared library
//! ptensor --reference roundtrip
//! ```

mod commands;

use clap::{Parser, Subcommand};
use ptensor::DType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ptensor",
    about = "Probe and exercise the ptensor native tensor library",
    version,
    author
)]
struct Cli {
    /// Path to a TOML library configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use the in-process reference engine instead of loading a library.
    #[arg(long, global = true)]
    reference: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the loaded library and the dtype mapping table.
    Info,

    /// Round-trip an array of every host-representable dtype.
    Roundtrip {
        /// Number of rows.
        #[arg(long, default_value_t = 2)]
        rows: usize,

        /// Number of columns.
        #[arg(long, default_value_t = 5)]
        cols: usize,
    },

    /// Construct a tensor from a raw little-endian data file.
    Load {
        /// Element type: float32, float64, float16, uint8, ..., int64.
        #[arg(short, long)]
        dtype: DType,

        /// Comma-separated extents (e.g., "2,5"). Omit for a scalar.
        #[arg(short, long, value_delimiter = ',')]
        shape: Vec<usize>,

        /// File holding the row-major element data.
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    let runtime = commands::open_runtime(cli.config.as_deref(), cli.reference)?;

    match cli.command {
        Commands::Info => commands::info::execute(&runtime),
        Commands::Roundtrip { rows, cols } => commands::roundtrip::execute(&runtime, rows, cols),
        Commands::Load { dtype, shape, file } => commands::load::execute(&runtime, dtype, shape, file),
    }
}
