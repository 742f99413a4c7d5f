use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tabular_prep::dataset::Dataset;
use tabular_prep::pipeline::process;

/// Builds a dataset of `rows` rows where every seventh age and every eleventh target is missing.
fn synthetic_dataset(rows: usize) -> Dataset {
    let ids: Vec<i64> = (0..rows as i64).collect();
    let ages: Vec<Option<f64>> = (0..rows)
        .map(|i| (i % 7 != 0).then_some(18.0 + (i % 50) as f64))
        .collect();
    let incomes: Vec<f64> = (0..rows).map(|i| 1000.0 + (i * 37 % 500) as f64).collect();
    let cities: Vec<&str> = (0..rows)
        .map(|i| ["north", "south", "east", "west"][i % 4])
        .collect();
    let targets: Vec<Option<f64>> = (0..rows)
        .map(|i| (i % 11 != 0).then_some((i % 2) as f64))
        .collect();
    Dataset::from_columns(vec![
        ("id", Arc::new(Int64Array::from(ids)) as ArrayRef),
        ("age", Arc::new(Float64Array::from(ages)) as ArrayRef),
        ("income", Arc::new(Float64Array::from(incomes)) as ArrayRef),
        ("city", Arc::new(StringArray::from(cities)) as ArrayRef),
        ("target", Arc::new(Float64Array::from(targets)) as ArrayRef),
    ])
    .unwrap()
}

fn bench_fit(c: &mut Criterion) {
    let train = synthetic_dataset(1_000);
    c.bench_function("process_fit_1000_rows", |b| {
        b.iter(|| process(black_box(&train), "target", Some("id"), None, None, None).unwrap())
    });
}

fn bench_apply(c: &mut Criterion) {
    let train = synthetic_dataset(1_000);
    let test = synthetic_dataset(200);
    let fitted = process(&train, "target", Some("id"), None, None, None).unwrap();
    c.bench_function("process_apply_200_rows", |b| {
        b.iter(|| {
            process(
                black_box(&test),
                "target",
                Some("id"),
                None,
                Some(&fitted.scale),
                Some(&fitted.imputation),
            )
            .unwrap()
        })
    });
}

criterion_group!(benches, bench_fit, bench_apply);
criterion_main!(benches);
