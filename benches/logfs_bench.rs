//! Benchmarks for logfs append and read paths

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use logfs::{Config, LogFs, MemoryDevice};

fn open_log() -> LogFs {
    LogFs::with_device(MemoryDevice::new(4096), Config::default()).unwrap()
}

/// Appends per measured iteration; each iteration gets a fresh log so the
/// in-memory device never grows without bound
const APPENDS_PER_ITER: usize = 256;

fn append_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");

    for size in [64usize, 1024, 16 * 1024] {
        let payload = vec![0x5Au8; size];
        group.throughput(Throughput::Bytes((size * APPENDS_PER_ITER) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter_batched(
                open_log,
                |log| {
                    for _ in 0..APPENDS_PER_ITER {
                        log.append(payload).unwrap();
                    }
                    log
                },
                BatchSize::PerIteration,
            );
        });
    }

    group.finish();
}

fn read_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");

    let log = open_log();
    log.append(&vec![0xA5u8; 1024 * 1024]).unwrap();
    log.flush().unwrap();

    // Whole working set fits in the 256-slot cache: steady-state hits
    group.throughput(Throughput::Bytes(4096));
    group.bench_function("cached_block", |b| {
        let mut offset = 0u64;
        b.iter(|| {
            let data = log.read_bytes(offset, 4096).unwrap();
            offset = (offset + 4096) % (1024 * 1024);
            data
        });
    });

    group.bench_function("read_after_append", |b| {
        let log = open_log();
        b.iter(|| {
            let offset = log.append(b"record payload").unwrap();
            log.read_bytes(offset, 14).unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, append_benchmarks, read_benchmarks);
criterion_main!(benches);
