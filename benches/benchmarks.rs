use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use local_store::{Record, Store, StoreBuilder};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hint::black_box;
use std::time::Duration;
use tempfile::TempDir;

fn open(dir: &TempDir) -> Store {
    Store::builder()
        .path(dir.path())
        .flush_interval(Duration::from_secs(3600))
        .build()
        .unwrap()
}

fn bench_create_read_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_read_delete");
    for size in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("dashmap", size), &size, |b, &size| {
            let dir = TempDir::new().unwrap();
            let db = open(&dir);
            db.create("anchor", "{}").unwrap();
            b.iter(|| {
                for i in 0..size {
                    db.create(&format!("k{i}"), r#"{"n": 1}"#).unwrap();
                }
                for i in 0..size {
                    black_box(db.read(&format!("k{i}")).unwrap());
                }
                for i in 0..size {
                    db.delete(&format!("k{i}")).unwrap();
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("rwlock", size), &size, |b, &size| {
            let dir = TempDir::new().unwrap();
            let db = StoreBuilder::<RwLock<HashMap<String, Record>>>::new()
                .path(dir.path())
                .flush_interval(Duration::from_secs(3600))
                .build()
                .unwrap();
            db.create("anchor", "{}").unwrap();
            b.iter(|| {
                for i in 0..size {
                    db.create(&format!("k{i}"), r#"{"n": 1}"#).unwrap();
                }
                for i in 0..size {
                    black_box(db.read(&format!("k{i}")).unwrap());
                }
                for i in 0..size {
                    db.delete(&format!("k{i}")).unwrap();
                }
            });
        });
    }
}

fn bench_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("flush");
    group.sample_size(50);
    group.measurement_time(Duration::from_secs(8));
    for size in [100, 1000, 10_000] {
        group.bench_with_input(BenchmarkId::new("overwrite", size), &size, |b, &size| {
            let dir = TempDir::new().unwrap();
            let db = open(&dir);
            for i in 0..size {
                db.create(&format!("k{i}"), r#"{"payload": [1, 2, 3]}"#).unwrap();
            }
            b.iter(|| db.flush().unwrap());
        });
    }
}

fn bench_recovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("recovery");
    group.sample_size(20);
    for size in [1000, 10_000] {
        group.bench_with_input(BenchmarkId::new("open", size), &size, |b, &size| {
            let dir = TempDir::new().unwrap();
            {
                let db = open(&dir);
                for i in 0..size {
                    db.create(&format!("k{i}"), r#"{"n": 1}"#).unwrap();
                }
                db.close_blocking();
            }
            b.iter(|| black_box(open(&dir).len()));
        });
    }
}

criterion_group!(benches, bench_create_read_delete, bench_flush, bench_recovery);
criterion_main!(benches);
