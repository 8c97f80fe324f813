// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `ptensor roundtrip` command: push an array of each supported dtype
//! through the library and check it comes back unchanged.
//!
//! Values are `1..=rows*cols` in row-major order, wrapped to the element
//! type's range.

use ndarray::{ArrayD, IxDyn};
use ptensor::{to_host, DType, Element, HostType, Runtime, Shape, Tensor};
use std::fmt::Debug;
use std::time::Instant;

pub fn execute(runtime: &Runtime, rows: usize, cols: usize) -> anyhow::Result<()> {
    super::banner("Round Trip");

    let shape = Shape::matrix(rows, cols);
    println!("  Shape: {shape}  ({} elements)", shape.num_elements());
    println!();
    println!("  {:<10} {:<6} {:>10}  Result", "DType", "Host", "Time");
    println!("  {}", "-".repeat(40));

    let mut failures = 0;
    for dtype in DType::ALL {
        let Ok(host) = to_host(dtype) else {
            println!("  {:<10} {:<6} {:>10}  skipped", dtype.as_str(), "-", "-");
            continue;
        };
        let start = Instant::now();
        let outcome = match host {
            HostType::F32 => check(runtime, &shape, |i| i as f32),
            HostType::F64 => check(runtime, &shape, |i| i as f64),
            HostType::U8 => check(runtime, &shape, |i| i as u8),
            HostType::U16 => check(runtime, &shape, |i| i as u16),
            HostType::U32 => check(runtime, &shape, |i| i as u32),
            HostType::I8 => check(runtime, &shape, |i| i as i8),
            HostType::I16 => check(runtime, &shape, |i| i as i16),
            HostType::I32 => check(runtime, &shape, |i| i as i32),
            HostType::I64 => check(runtime, &shape, |i| i as i64),
            HostType::Bool | HostType::U64 => Err(anyhow::anyhow!("{host} has no native dtype")),
        };
        let elapsed = start.elapsed();
        let verdict = match outcome {
            Ok(()) => "PASS".to_string(),
            Err(e) => {
                failures += 1;
                format!("FAIL: {e}")
            }
        };
        println!(
            "  {:<10} {:<6} {:>8.1}us  {verdict}",
            dtype.as_str(),
            host.as_str(),
            elapsed.as_secs_f64() * 1e6,
        );
    }
    println!();
    println!("  {}", runtime.stats().summary());
    println!();

    if failures > 0 {
        anyhow::bail!("{failures} dtype(s) failed to round-trip");
    }
    Ok(())
}

fn check<T>(runtime: &Runtime, shape: &Shape, value: impl Fn(usize) -> T) -> anyhow::Result<()>
where
    T: Element + PartialEq + Debug,
{
    let n = shape.num_elements();
    let array = ArrayD::from_shape_vec(IxDyn(shape.dims()), (1..=n).map(value).collect())?
        .into_shared();
    let tensor = Tensor::from_array(runtime, array.clone())?;

    let native_shape = tensor.shape()?;
    anyhow::ensure!(native_shape == *shape, "shape {native_shape} != {shape}");
    anyhow::ensure!(tensor.size() == n, "size {} != {n}", tensor.size());

    let copied = tensor.to_array::<T>(true)?;
    anyhow::ensure!(copied == array, "copied data differs from the source");
    let shadow = tensor.to_array::<T>(false)?;
    anyhow::ensure!(shadow == array, "shadow differs from the source");

    tensor.destroy()?;
    Ok(())
}
