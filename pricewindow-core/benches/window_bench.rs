//! Criterion benchmarks for the per-row window path.
//!
//! Benchmarks:
//! 1. Alignment (binary search over a multi-year series)
//! 2. Full resolve (align → extract → flatten → conform) at several widths
//! 3. Column schema generation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use chrono::{Duration, NaiveDate};
use pricewindow_core::domain::{TimeSeries, TradingSession};
use pricewindow_core::window::{align, resolve, ColumnSchema, WindowSpec};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(n: usize) -> TimeSeries {
    let base_date = NaiveDate::from_ymd_opt(2015, 1, 5).unwrap();
    let sessions = (0..n)
        .map(|i| {
            let close = 2500.0 + (i as f64 * 0.1).sin() * 150.0;
            TradingSession::new(
                base_date + Duration::days((i / 5 * 7 + i % 5) as i64),
                close - 3.3,
                close + 15.5,
                close - 15.5,
                close,
                1_000_000 + (i as u64 % 500_000),
            )
        })
        .collect();
    TimeSeries::new("7203", sessions).unwrap()
}

fn bench_align(c: &mut Criterion) {
    let series = make_series(2_500);
    let nominal = NaiveDate::from_ymd_opt(2020, 6, 13).unwrap();
    c.bench_function("align_2500_sessions", |b| {
        b.iter(|| align(black_box(&series), black_box(nominal)))
    });
}

fn bench_resolve(c: &mut Criterion) {
    let series = make_series(2_500);
    let nominal = NaiveDate::from_ymd_opt(2020, 6, 13).unwrap();
    let mut group = c.benchmark_group("resolve");
    for width in [1usize, 5, 20] {
        let schema = ColumnSchema::new(WindowSpec::new(width, width));
        group.bench_with_input(BenchmarkId::from_parameter(width), &schema, |b, schema| {
            b.iter(|| resolve(black_box(&series), black_box(nominal), schema))
        });
    }
    group.finish();
}

fn bench_schema(c: &mut Criterion) {
    c.bench_function("schema_5_5", |b| {
        b.iter(|| ColumnSchema::new(black_box(WindowSpec::default())))
    });
}

criterion_group!(benches, bench_align, bench_resolve, bench_schema);
criterion_main!(benches);
