// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for array marshalling against the reference engine.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::{ArcArray, ArrayD, IxDyn};
use ptensor::{Runtime, Tensor};

const SIDES: [usize; 3] = [16, 128, 512];

fn runtime() -> Runtime {
    // SAFETY: the reference engine is linked into this benchmark.
    unsafe { Runtime::from_api(ptensor_capi::api()) }
}

fn square(side: usize) -> ArcArray<f32, IxDyn> {
    ArrayD::from_shape_fn(IxDyn(&[side, side]), |ix| (ix[0] * side + ix[1]) as f32).into_shared()
}

fn bench_from_array(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("from_array");
    for side in SIDES {
        let array = square(side);
        group.throughput(Throughput::Bytes((side * side * 4) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(side), &array, |b, a| {
            b.iter(|| Tensor::from_array(&rt, black_box(a.clone())).map(|t| t.size()))
        });
    }
    group.finish();
}

fn bench_to_array(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("to_array");
    for side in SIDES {
        let tensor = match Tensor::from_array(&rt, square(side)) {
            Ok(t) => t,
            Err(e) => panic!("cannot build {side}x{side} tensor: {e}"),
        };
        group.throughput(Throughput::Bytes((side * side * 4) as u64));
        group.bench_with_input(BenchmarkId::new("refresh", side), &tensor, |b, t| {
            b.iter(|| t.to_array::<f32>(black_box(true)))
        });
        group.bench_with_input(BenchmarkId::new("shadow", side), &tensor, |b, t| {
            b.iter(|| t.to_array::<f32>(black_box(false)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_from_array, bench_to_array);
criterion_main!(benches);
