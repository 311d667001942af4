use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use groupwise::{col, Column, DataFrame, DynamicOptions, GroupwiseConfig, RollingOptions};

/// Table with `size` rows, a low-cardinality string key and a sorted integer index
fn create_test_dataframe(size: usize) -> DataFrame {
    let categories: Vec<String> = (0..size).map(|i| format!("cat_{}", i % 100)).collect();
    DataFrame::from_columns(vec![
        ("category", Column::from_strs(&categories)),
        ("id", Column::from_i64((0..size as i64).map(|i| i % 1_000).collect())),
        ("t", Column::from_i64((0..size as i64).collect())),
        ("value", Column::from_f64((0..size).map(|i| (i % 997) as f64 * 0.5).collect())),
    ])
    .unwrap()
}

fn serial_config() -> GroupwiseConfig {
    let mut config = GroupwiseConfig::default();
    config.parallel.enabled = false;
    config
}

fn parallel_config() -> GroupwiseConfig {
    let mut config = GroupwiseConfig::default();
    config.parallel.min_rows = 1;
    config.parallel.min_groups = 1;
    config
}

fn bench_key_groupby(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_groupby");

    for size in [10_000usize, 200_000] {
        let df = create_test_dataframe(size);
        group.throughput(Throughput::Elements(size as u64));

        for (label, config) in [("serial", serial_config()), ("parallel", parallel_config())] {
            group.bench_with_input(BenchmarkId::new(label, size), &df, |b, df| {
                b.iter(|| {
                    let gb = df
                        .group_by(&["id"], true)
                        .unwrap()
                        .with_config(config.clone());
                    black_box(
                        gb.agg([
                            col("value").sum(),
                            col("value").mean().alias("mean"),
                            col("category").n_unique(),
                        ])
                        .unwrap(),
                    )
                })
            });
        }
    }

    group.finish();
}

fn bench_window_groupby(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_groupby");
    let size = 100_000;
    let df = create_test_dataframe(size);
    group.throughput(Throughput::Elements(size as u64));

    group.bench_function("rolling_10i", |b| {
        b.iter(|| {
            let gb = df
                .group_by_rolling("t", RollingOptions::new("10i").unwrap())
                .unwrap();
            black_box(gb.agg([col("value").sum()]).unwrap())
        })
    });

    group.bench_function("dynamic_100i_by_category", |b| {
        b.iter(|| {
            let opts = DynamicOptions::new("100i")
                .unwrap()
                .with_by(["category"]);
            let gb = df.group_by_dynamic("t", opts).unwrap();
            black_box(gb.agg([col("value").max()]).unwrap())
        })
    });

    group.finish();
}

criterion_group!(groupby_benches, bench_key_groupby, bench_window_groupby);
criterion_main!(groupby_benches);
