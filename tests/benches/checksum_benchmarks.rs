//! # CS Checksum Benchmarks
//!
//! | Area | Measured |
//! |------|----------|
//! | Checksum primitive | Folding a range in wakeup-sized chunks |
//! | Validator | One pass over a full definition table |
//! | Scheduler | A complete background pass over the default platform |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cs_checksum::adapters::{Crc32ChecksumProvider, SimulatedMemory};
use cs_checksum::domain::validate;
use cs_checksum::{ChecksumProvider, DefinitionEntry, EntryState, ResetKind, TableResource};
use cs_tests::integration::fixtures::{run_pass, Platform};

const RANGE_LEN: usize = 64 * 1024;

// ============================================================================
// CHECKSUM PRIMITIVE
// ============================================================================

fn bench_chunked_checksum(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum-primitive");
    let data: Vec<u8> = (0..RANGE_LEN).map(|i| (i % 251) as u8).collect();
    let provider = Crc32ChecksumProvider::new();
    group.throughput(Throughput::Bytes(RANGE_LEN as u64));

    for budget in [256usize, 4096, 16384, RANGE_LEN] {
        group.bench_with_input(BenchmarkId::new("fold", budget), &budget, |b, &budget| {
            b.iter(|| {
                data.chunks(budget)
                    .fold(0u32, |seed, chunk| provider.calculate(black_box(chunk), seed))
            })
        });
    }
    group.finish();
}

// ============================================================================
// VALIDATOR
// ============================================================================

fn bench_validate_definition(c: &mut Criterion) {
    let mut group = c.benchmark_group("validator");
    let ranges = SimulatedMemory::new(0, 0x10_0000);

    for capacity in [16usize, 64, 256] {
        let memory_table: Vec<DefinitionEntry> = (0..capacity)
            .map(|i| DefinitionEntry::range(EntryState::Enabled, i * 0x100, 0x100))
            .collect();
        let named_table: Vec<DefinitionEntry> = (0..capacity)
            .map(|i| DefinitionEntry::named(EntryState::Enabled, format!("APP{i}.Tbl")))
            .collect();

        group.bench_with_input(
            BenchmarkId::new("memory", capacity),
            &memory_table,
            |b, table| b.iter(|| validate(TableResource::Memory, black_box(table), &ranges)),
        );
        group.bench_with_input(
            BenchmarkId::new("tables", capacity),
            &named_table,
            |b, table| b.iter(|| validate(TableResource::Tables, black_box(table), &ranges)),
        );
    }
    group.finish();
}

// ============================================================================
// SCHEDULER
// ============================================================================

fn bench_background_pass(c: &mut Criterion) {
    let platform = Platform::new();
    let mut engine = platform.boot(ResetKind::PowerOn);

    c.bench_function("background_pass", |b| b.iter(|| run_pass(&mut engine)));
}

criterion_group!(
    benches,
    bench_chunked_checksum,
    bench_validate_definition,
    bench_background_pass
);
criterion_main!(benches);
