use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use schedcop_core::{Analyzer, CommitPolicy, Operation, Schedule};

const ITEMS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// Build a round-robin schedule.
/// `transactions`: number of transactions
/// `ops_per_txn`: reads/writes per transaction before its commit
fn build_schedule(transactions: u32, ops_per_txn: usize) -> Schedule {
    let mut operations = Vec::new();
    for step in 0..ops_per_txn {
        for tx in 1..=transactions {
            let item = ITEMS[(tx as usize + step) % ITEMS.len()];
            if step % 2 == 0 {
                operations.push(Operation::read(tx, item));
            } else {
                operations.push(Operation::write(tx, item));
            }
        }
    }
    operations.extend((1..=transactions).map(Operation::commit));
    operations.into()
}

/// Serial schedule: each transaction runs to its commit before the next starts.
fn build_serial(transactions: u32, ops_per_txn: usize) -> Schedule {
    build_schedule(transactions, ops_per_txn)
        .split_by_transaction()
        .interleave_serially()
}

fn bench_replay(c: &mut Criterion) {
    let small = build_serial(4, 4);
    let medium = build_serial(16, 8);
    let large = build_serial(64, 8);
    let interleaved = build_schedule(16, 8);

    for schedule in [&small, &medium, &large] {
        assert!(
            schedcop_core::is_conflict_serializable(schedule),
            "serial schedules must be conflict serializable",
        );
    }

    let mut group = c.benchmark_group("replay");

    group.bench_function("serial_small", |b| {
        b.iter(|| schedcop_core::analyze(black_box(&small)));
    });

    group.bench_function("serial_medium", |b| {
        b.iter(|| schedcop_core::analyze(black_box(&medium)));
    });

    group.bench_function("serial_large", |b| {
        b.iter(|| schedcop_core::analyze(black_box(&large)));
    });

    group.bench_function("interleaved_medium", |b| {
        b.iter(|| schedcop_core::is_conflict_serializable(black_box(&interleaved)));
    });

    let retain = Analyzer::default().with_commit_policy(CommitPolicy::Retain);
    group.bench_function("serial_large_retain", |b| {
        b.iter(|| retain.analyze(black_box(&large)));
    });

    group.finish();
}

criterion_group!(benches, bench_replay);
criterion_main!(benches);
