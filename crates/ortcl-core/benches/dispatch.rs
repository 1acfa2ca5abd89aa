//! Benchmarks for status translation, kernel launch and image mapping on the
//! host reference device

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ortcl_core::backends::host::{HostContext, HostKernel};
use ortcl_core::{error_string, map_image2d, ContextConfig, KernelLauncher, MapAccess, NdRange, StatusCode};
use ortcl_tracing::TracingConfig;

/// Install the shared subscriber; set `ORTCL_TRACING_PROFILE=performance`
/// to see launch and map timings.
fn init_tracing() {
    let _ = ortcl_tracing::init_global_tracing(&TracingConfig::from_env());
}

/// Benchmark translating every known code plus an unknown one
fn bench_error_string(c: &mut Criterion) {
    init_tracing();
    let mut codes = StatusCode::KNOWN.to_vec();
    codes.push(StatusCode(-1000));

    c.bench_function("error_string/all_codes", |b| {
        b.iter(|| {
            for &code in &codes {
                black_box(error_string(black_box(code)));
            }
        });
    });
}

/// Benchmark bind + enqueue for kernels with growing argument counts
fn bench_launch(c: &mut Criterion) {
    let mut group = c.benchmark_group("launch");

    for args in [2usize, 8, 16] {
        group.bench_with_input(BenchmarkId::new("args", args), &args, |b, &args| {
            let ctx = HostContext::new(ContextConfig::default());
            let image = ctx.queue().create_image2d(64, 64, 4);
            let kernel = HostKernel::new(ctx.queue(), "bench", &vec![8; args]);
            let global = NdRange::new2(64, 64);
            let local = NdRange::new2(8, 8);

            b.iter(|| {
                let mut launcher = KernelLauncher::new(&kernel);
                for _ in 0..args {
                    launcher = launcher.set_image2d(image);
                }
                launcher.launch(&ctx, &global, &local).unwrap();
                ctx.queue().clear_launches();
            });
        });
    }

    group.finish();
}

/// Benchmark map + packed copy + unmap for square RGBA images
fn bench_map_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_roundtrip");

    for side in [16usize, 64, 256] {
        group.throughput(Throughput::Bytes((side * side * 16) as u64));

        group.bench_with_input(BenchmarkId::new("rgba_f32", side), &side, |b, &side| {
            let ctx = HostContext::new(ContextConfig::default());
            let image = ctx.queue().create_image2d(side, side, 16);
            let pixels = vec![[0.5f32; 4]; side * side];

            b.iter(|| {
                let mut mapped = map_image2d(&ctx, image, side, side, MapAccess::Write).unwrap();
                mapped.copy_from_slice(&pixels).unwrap();
                mapped.unmap().unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_error_string, bench_launch, bench_map_roundtrip);
criterion_main!(benches);
