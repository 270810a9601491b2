use chained_hashmap::ChainedHashMap;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

const N: u64 = 100_000;

fn key(n: u64) -> String {
    format!("{n}")
}

// Put N keys, look each one up, then delete them in reverse order.
macro_rules! bulk_cycle {
    ($c:expr, $name:expr, $new:expr, $put:ident, $has:ident, $del:ident, $k:expr, $v:expr) => {
        $c.bench_function($name, |b| {
            b.iter_batched(
                || $new,
                |mut m| {
                    for i in 0..N {
                        m.$put($k(i), $v(i));
                    }
                    for i in 0..N {
                        black_box(m.$has(&$k(i)));
                    }
                    for i in (0..N).rev() {
                        black_box(m.$del(&$k(i)));
                    }
                    black_box(m)
                },
                BatchSize::SmallInput,
            )
        });
    };
}

fn bench_int_keys(c: &mut Criterion) {
    let id = |i: u64| i;
    let next = |i: u64| i + 1;
    bulk_cycle!(c, "chained::int_cycle_100k", ChainedHashMap::<u64, u64>::new(), put, contains_key, del, id, next);
    bulk_cycle!(c, "std_hashmap::int_cycle_100k", HashMap::<u64, u64>::new(), insert, contains_key, remove, id, next);
    bulk_cycle!(c, "hashbrown::int_cycle_100k", hashbrown::HashMap::<u64, u64>::new(), insert, contains_key, remove, id, next);
    bulk_cycle!(c, "btreemap::int_cycle_100k", BTreeMap::<u64, u64>::new(), insert, contains_key, remove, id, next);
}

fn bench_string_keys(c: &mut Criterion) {
    let next = |i: u64| key(i + 1);
    bulk_cycle!(c, "chained::string_cycle_100k", ChainedHashMap::<String, String>::new(), put, contains_key, del, key, next);
    bulk_cycle!(c, "std_hashmap::string_cycle_100k", HashMap::<String, String>::new(), insert, contains_key, remove, key, next);
    bulk_cycle!(c, "btreemap::string_cycle_100k", BTreeMap::<String, String>::new(), insert, contains_key, remove, key, next);
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("chained::get_hit", |b| {
        let mut m = ChainedHashMap::new();
        for i in 0..N {
            m.put(i, i);
        }
        let mut i = 0u64;
        b.iter(|| {
            i = (i + 7919) % N;
            black_box(m.get(&i));
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(20)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_int_keys, bench_string_keys, bench_get_hit
}
criterion_main!(benches);
