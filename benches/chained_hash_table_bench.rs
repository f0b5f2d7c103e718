use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use chained_hash_table::ChainedHashTable;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn filled(seed: u64, n: usize) -> (ChainedHashTable<String, u64>, Vec<String>) {
    let mut t = ChainedHashTable::new();
    let keys: Vec<_> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        t.insert(k.clone(), i as u64);
    }
    (t, keys)
}

// Starts from one bucket, so the loop pays for every doubling.
fn bench_insert_with_growth(c: &mut Criterion) {
    c.bench_function("chained::insert_10k_from_1_bucket", |b| {
        b.iter_batched(
            || ChainedHashTable::<String, u64>::with_capacity(1).unwrap(),
            |mut t| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    t.insert(key(x), i as u64);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_presized(c: &mut Criterion) {
    c.bench_function("chained::insert_10k_presized", |b| {
        b.iter_batched(
            || ChainedHashTable::<String, u64>::with_capacity(20_000).unwrap(),
            |mut t| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    t.insert(key(x), i as u64);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("chained::get_hit", |b| {
        let (t, keys) = filled(7, 20_000);
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(t.get(k.as_str()));
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("chained::get_miss", |b| {
        let (t, _) = filled(11, 10_000);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            let k = key(miss.next().unwrap());
            black_box(t.get(k.as_str()));
        })
    });
}

fn bench_remove(c: &mut Criterion) {
    c.bench_function("chained::remove_10k", |b| {
        b.iter_batched(
            || filled(3, 10_000),
            |(mut t, keys)| {
                for k in &keys {
                    black_box(t.remove(k.as_str()));
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(3));
    targets = bench_insert_with_growth, bench_insert_presized, bench_get_hit, bench_get_miss, bench_remove
}
criterion_main!(benches);
