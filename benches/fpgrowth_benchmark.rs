use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use stream_rule_miner::{FpStream, MiningConfig};

/// Deterministic synthetic batch: a catalog of `items` item names, each
/// transaction drawing 2-5 of them with a skewed distribution.
fn synthetic_batch(transactions: usize, items: u64) -> Vec<Vec<String>> {
    let mut state = 0x2545f4914f6cdd1du64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    (0..transactions)
        .map(|_| {
            let size = 2 + (next() % 4) as usize;
            (0..size)
                .map(|_| {
                    // Square the draw to skew toward low item ids, so real
                    // frequent patterns exist.
                    let draw = next() % (items * items);
                    format!("item:{}", (draw as f64).sqrt() as u64 % items)
                })
                .collect()
        })
        .collect()
}

fn bench_process_batch(c: &mut Criterion) {
    let batch = synthetic_batch(2_000, 50);

    c.bench_function("process_batch_2000x50", |b| {
        b.iter(|| {
            let mut miner = FpStream::new(MiningConfig {
                min_support: 0.1,
                max_support_error: 0.05,
            })
            .unwrap();
            miner.process_batch(black_box(&batch), 1.0).unwrap();
            black_box(miner.pattern_tree().node_count())
        })
    });
}

fn bench_streaming_updates(c: &mut Criterion) {
    let batches: Vec<_> = (0..4).map(|i| synthetic_batch(1_000, 30 + i)).collect();

    c.bench_function("stream_4_batches_1000x30", |b| {
        b.iter(|| {
            let mut miner = FpStream::new(MiningConfig {
                min_support: 0.1,
                max_support_error: 0.05,
            })
            .unwrap();
            for batch in &batches {
                miner.process_batch(black_box(batch), 1.0).unwrap();
            }
            black_box(miner.pattern_tree().node_count())
        })
    });
}

fn bench_mine_rules(c: &mut Criterion) {
    let mut miner = FpStream::new(MiningConfig {
        min_support: 0.05,
        max_support_error: 0.02,
    })
    .unwrap();
    miner
        .process_batch(&synthetic_batch(2_000, 40), 1.0)
        .unwrap();

    c.bench_function("mine_rules_quarter", |b| {
        b.iter(|| black_box(miner.mine_rules(0, 0, 0.5).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_process_batch,
    bench_streaming_updates,
    bench_mine_rules
);
criterion_main!(benches);
