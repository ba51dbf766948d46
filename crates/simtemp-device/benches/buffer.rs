//! Sample buffer hot-path benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use simtemp_device::{SampleBuffer, DEFAULT_CAPACITY};
use simtemp_protocol::{flags, Sample};

fn bench_buffer(c: &mut Criterion) {
    let buffer = SampleBuffer::new(DEFAULT_CAPACITY);
    let sample = Sample::new(1, 30_000, flags::NEW_SAMPLE);

    c.bench_function("admit_saturated", |b| {
        // Buffer stays full, so every admit pays for an eviction too
        b.iter(|| buffer.admit(black_box(sample)))
    });

    let pair = SampleBuffer::new(DEFAULT_CAPACITY);
    c.bench_function("admit_pop", |b| {
        b.iter(|| {
            pair.admit(black_box(sample));
            black_box(pair.pop())
        })
    });
}

criterion_group!(benches, bench_buffer);
criterion_main!(benches);
