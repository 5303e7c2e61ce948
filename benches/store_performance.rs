use std::sync::Arc;

use chrono::{Duration, Local, TimeZone};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use timeturner::clock::FixedClock;
use timeturner::sort;
use timeturner::store::sqlite::SqliteRepository;
use timeturner::store::{Repository, Retention};
use timeturner::table::{self, Table};

/// A process listing with `rows` data rows and a few wide text columns.
fn process_table(rows: usize) -> Table {
    let mut data = vec![vec![
        "pid".to_string(),
        "user".to_string(),
        "cpu".to_string(),
        "command".to_string(),
    ]];
    for i in 0..rows {
        data.push(vec![
            ((i * 7919) % 65_536).to_string(),
            format!("user{}", i % 13),
            format!("{}.{}", i % 100, i % 10),
            format!("/usr/bin/worker --id {i} --queue \"jobs, batch\""),
        ]);
    }
    Table::new(data)
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_table");
    for rows in [10, 1_000, 10_000] {
        let text = table::encode(&process_table(rows)).unwrap();
        group.bench_with_input(BenchmarkId::new("rows", rows), &text, |b, text| {
            b.iter(|| table::decode(black_box(text)).unwrap());
        });
    }
    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_rows");
    for rows in [1_000, 10_000] {
        let (header, data) = process_table(rows).into_parts();
        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            b.iter(|| sort::sort_rows(&header, black_box(data.clone()), "pid", true));
        });
    }
    group.finish();
}

fn bench_upsert(c: &mut Criterion) {
    let start = Local.with_ymd_and_hms(2013, 10, 6, 0, 0, 0).earliest().unwrap();
    let contents = process_table(100);

    c.bench_function("upsert_new_instant", |b| {
        let clock = Arc::new(FixedClock::new(start));
        let repo = SqliteRepository::open_in_memory(clock.clone(), Retention::default()).unwrap();
        let mut current = start;
        b.iter(|| {
            current += Duration::minutes(5);
            clock.set(current);
            repo.upsert(current, "host1", "processes", black_box(&contents))
                .unwrap()
        });
    });

    c.bench_function("upsert_overwrite", |b| {
        let clock = Arc::new(FixedClock::new(start));
        let repo = SqliteRepository::open_in_memory(clock, Retention::default()).unwrap();
        repo.upsert(start, "host1", "processes", &contents).unwrap();
        b.iter(|| {
            repo.upsert(start, "host1", "processes", black_box(&contents))
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_decode, bench_sort, bench_upsert);
criterion_main!(benches);
