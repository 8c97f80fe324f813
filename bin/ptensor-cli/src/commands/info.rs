// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `ptensor info` command: show the bound library and the dtype mapping.

use ptensor::{to_host, to_native, DType, HostType, Runtime};

pub fn execute(runtime: &Runtime) -> anyhow::Result<()> {
    super::banner("Library Info");

    match runtime.library_path() {
        Some(path) => println!("  Library: {}", path.display()),
        None => println!("  Library: in-process reference engine"),
    }
    println!("  Max dimensions: {}", ptensor::sys::P10_MAX_SHAPE);
    println!();

    // ── Native dtypes ──────────────────────────────────────────
    println!("  {:<10} {:>4} {:>6}  {:<6}", "DType", "Tag", "Bytes", "Host");
    println!("  {}", "-".repeat(32));
    for dtype in DType::ALL {
        let host = to_host(dtype).map_or_else(|_| "-".to_string(), |h| h.to_string());
        println!(
            "  {:<10} {:>4} {:>6}  {:<6}",
            dtype.as_str(),
            dtype.to_raw(),
            dtype.size_bytes(),
            host,
        );
    }
    println!();

    // ── Host-only types ────────────────────────────────────────
    let host_only: Vec<String> = HostType::ALL
        .into_iter()
        .filter(|h| to_native(*h).is_err())
        .map(|h| h.to_string())
        .collect();
    println!("  Host types without a native dtype: {}", host_only.join(", "));
    println!();
    Ok(())
}
