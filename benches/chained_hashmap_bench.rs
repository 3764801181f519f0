use chained_hashmap::{ChainedHashMap, Handle};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
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

fn filled(seed: u64, n: usize) -> (ChainedHashMap<String, u64>, Vec<String>) {
    let mut m = ChainedHashMap::new();
    let keys: Vec<String> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        m.insert(k.clone(), i as u64);
    }
    (m, keys)
}

// Spread 10k picks over `n` slots with a second LCG.
fn picks(n: usize) -> impl Iterator<Item = usize> {
    let mut s = 0x9e3779b97f4a7c15u64;
    (0..10_000).map(move |_| {
        s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
        (s as usize) % n
    })
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    c.bench_function("chained::insert_fresh_100k", |b| {
        b.iter_batched(
            ChainedHashMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_after_erase_100k(c: &mut Criterion) {
    c.bench_function("chained::insert_after_erase_100k", |b| {
        b.iter_batched(
            || {
                // Grown bucket array, empty store.
                let (mut m, keys) = filled(2, 110_000);
                for k in &keys {
                    m.erase(k.as_str());
                }
                m
            },
            |mut m| {
                for (i, x) in lcg(3).take(100_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_erase_random_10k(c: &mut Criterion) {
    c.bench_function("chained::erase_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let (m, keys) = filled(5, 110_000);
                let targets: Vec<String> = picks(keys.len()).map(|i| keys[i].clone()).collect();
                (m, targets)
            },
            |(mut m, targets)| {
                for k in &targets {
                    black_box(m.erase(k.as_str()));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_hit_10k(c: &mut Criterion) {
    c.bench_function("chained::find_hit_10k_on_100k", |b| {
        let (m, keys) = filled(7, 100_000);
        let queries: Vec<String> = picks(keys.len()).map(|i| keys[i].clone()).collect();
        b.iter(|| {
            for k in &queries {
                black_box(m.find(k.as_str()));
            }
        })
    });
}

fn bench_find_miss_10k(c: &mut Criterion) {
    c.bench_function("chained::find_miss_10k_on_100k", |b| {
        let (m, _) = filled(11, 100_000);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            for x in miss.by_ref().take(10_000) {
                black_box(m.find(key(x).as_str()));
            }
        })
    });
}

fn bench_subscript_increment_10k(c: &mut Criterion) {
    c.bench_function("chained::subscript_increment_10k", |b| {
        let (mut m, keys) = filled(13, 100_000);
        let targets: Vec<String> = picks(keys.len()).map(|i| keys[i].clone()).collect();
        b.iter(|| {
            for k in &targets {
                let v = m.get_or_insert_default(k.clone());
                *v = v.wrapping_add(1);
            }
        })
    });
}

fn bench_handle_access_increment(c: &mut Criterion) {
    c.bench_function("chained::handle_access_increment_10k", |b| {
        b.iter_batched(
            || {
                let mut m = ChainedHashMap::new();
                let handles: Vec<Handle> = lcg(123)
                    .take(100_000)
                    .enumerate()
                    .map(|(i, x)| m.insert(key(x), i as u64))
                    .collect();
                let targets: Vec<Handle> = picks(handles.len()).map(|i| handles[i]).collect();
                (m, targets)
            },
            |(mut m, targets)| {
                for h in targets {
                    if let Some(v) = h.value_mut(&mut m) {
                        *v = v.wrapping_add(1);
                    }
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_iter_and_clone(c: &mut Criterion) {
    c.bench_function("chained::iter_all_100k", |b| {
        let (m, _) = filled(999, 100_000);
        b.iter(|| {
            let mut sum = 0u64;
            for (_k, v) in m.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });

    c.bench_function("chained::clone_100k", |b| {
        let (m, _) = filled(1001, 100_000);
        b.iter(|| black_box(m.clone()))
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_insert_fresh_100k, bench_insert_after_erase_100k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_erase_random_10k,
              bench_find_hit_10k,
              bench_find_miss_10k,
              bench_subscript_increment_10k,
              bench_handle_access_increment,
              bench_iter_and_clone
}
criterion_main!(benches_insert, benches_ops);
