// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `ptensor load` command: build a tensor from a raw data file.
//!
//! The file is memory-mapped and handed to the library as-is, so the
//! library's copy is the only one made on little-endian hosts.

use ptensor::{DType, Runtime, Shape, Tensor};
use std::borrow::Cow;
use std::path::PathBuf;

pub fn execute(runtime: &Runtime, dtype: DType, dims: Vec<usize>, file: PathBuf) -> anyhow::Result<()> {
    super::banner("Load");

    let shape = Shape::new(dims);
    let handle = std::fs::File::open(&file)
        .map_err(|e| anyhow::anyhow!("cannot open '{}': {e}", file.display()))?;
    let file_len = handle.metadata()?.len();

    // Mapping an empty file fails on some platforms.
    let mmap = if file_len == 0 {
        None
    } else {
        // SAFETY: the map is read-only and dropped before this function
        // returns; concurrent truncation of the file is the caller's problem.
        let map = unsafe { memmap2::Mmap::map(&handle) }
            .map_err(|e| anyhow::anyhow!("mmap of '{}' failed: {e}", file.display()))?;
        tracing::info!("mapped '{}' ({file_len} bytes)", file.display());
        Some(map)
    };
    let raw: &[u8] = mmap.as_deref().unwrap_or(&[]);
    let bytes = to_native_endian(raw, dtype.size_bytes());

    let tensor = Tensor::from_bytes(runtime, dtype, shape, &bytes)?;

    println!("  File:       {}", file.display());
    println!("  Tensor:     {tensor}");
    println!("  Dimensions: {}", tensor.dimensions());
    println!("  Bytes:      {}", bytes.len());
    println!();
    println!("  {}", runtime.stats().summary());
    println!();

    tensor.destroy()?;
    Ok(())
}

/// Converts little-endian element data to the host's byte order.
fn to_native_endian(raw: &[u8], width: usize) -> Cow<'_, [u8]> {
    if cfg!(target_endian = "little") || width == 1 {
        return Cow::Borrowed(raw);
    }
    let mut swapped = raw.to_vec();
    for chunk in swapped.chunks_exact_mut(width) {
        chunk.reverse();
    }
    Cow::Owned(swapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_byte_elements_borrowed() {
        let raw = [1u8, 2, 3];
        assert!(matches!(to_native_endian(&raw, 1), Cow::Borrowed(_)));
    }

    #[test]
    fn test_native_endian_values() {
        let raw: Vec<u8> = [1u32, 0x0102_0304].iter().flat_map(|v| v.to_le_bytes()).collect();
        let bytes = to_native_endian(&raw, 4);
        let values: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(values, vec![1, 0x0102_0304]);
    }
}
