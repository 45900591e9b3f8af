use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rdes::{CodecConfig, Compressor, Decompressor, Variant};

const COLUMNS: usize = 4;

/// Slowly drifting sensor rows with an occasional larger jump
fn sample_rows(count: usize) -> Vec<Vec<u32>> {
    (0..count)
        .map(|i| {
            (0..COLUMNS)
                .map(|c| {
                    let drift = (i * (c + 1)) % 23;
                    let jump = if i % 97 == 0 { 40_000 } else { 0 };
                    (1_000_000 + c * 10_000 + drift + jump) as u32
                })
                .collect()
        })
        .collect()
}

fn compress(variant: Variant, rows: &[Vec<u32>]) -> Vec<u8> {
    let mut comp = Compressor::with_capacity(CodecConfig::new(variant, COLUMNS), rows.len()).unwrap();
    for row in rows {
        comp.write_row(row).unwrap();
    }
    comp.to_bytes()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for count in [100, 1000, 10000] {
        let rows = sample_rows(count);
        group.throughput(Throughput::Elements((count * COLUMNS) as u64));
        for variant in Variant::ALL {
            group.bench_function(format!("{variant}/{count}_rows"), |b| {
                b.iter(|| black_box(compress(variant, black_box(&rows))))
            });
        }
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let rows = sample_rows(10000);

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Elements((10000 * COLUMNS) as u64));
    for variant in Variant::ALL {
        let bytes = compress(variant, &rows);
        group.bench_function(format!("{variant}/10000_rows"), |b| {
            b.iter(|| {
                let mut deco = Decompressor::with_variant(variant, COLUMNS).unwrap();
                black_box(deco.decompress(black_box(&bytes)).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_feed(c: &mut Criterion) {
    let rows = sample_rows(10000);
    let bytes = compress(Variant::Rdes3, &rows);

    let mut group = c.benchmark_group("feed");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    for chunk in [16, 256, 4096] {
        group.bench_function(format!("{chunk}_byte_chunks"), |b| {
            b.iter(|| {
                let mut deco = Decompressor::with_variant(Variant::Rdes3, COLUMNS).unwrap();
                let mut decoded = 0;
                for piece in bytes.chunks(chunk) {
                    decoded += deco.feed(black_box(piece)).unwrap().len();
                }
                black_box(decoded)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_feed);
criterion_main!(benches);
