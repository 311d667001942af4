use chrono::NaiveDate;
use groupwise::{
    col, Column, DataFrame, DataValue, Duration, Error, RollingOptions, TimeUnit, WindowClosed,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn values(df: &DataFrame, name: &str) -> Vec<DataValue> {
    df.column(name).unwrap().iter_values().collect()
}

fn lists_of_i64(df: &DataFrame, name: &str) -> Vec<Vec<i64>> {
    values(df, name)
        .iter()
        .map(|v| v.as_list().unwrap().iter().map(|x| x.as_i64().unwrap()).collect())
        .collect()
}

#[test]
fn test_rolling_days_closed_left() {
    let df = DataFrame::from_columns(vec![
        ("date", Column::from_dates(vec![day(1), day(2), day(3), day(10)])),
        ("v", Column::from_i64(vec![1, 2, 3, 10])),
    ])
    .unwrap();
    let opts = RollingOptions::new("3d")
        .unwrap()
        .with_offset("0d")
        .unwrap()
        .with_closed(WindowClosed::Left);
    let out = df
        .group_by_rolling("date", opts)
        .unwrap()
        .agg([col("v").list()])
        .unwrap();

    // one window per row, keyed by the row's own index value
    assert_eq!(
        values(&out, "date"),
        vec![day(1).into(), day(2).into(), day(3).into(), day(10).into()]
    );
    assert_eq!(
        lists_of_i64(&out, "v"),
        vec![vec![1, 2, 3], vec![2, 3], vec![3], vec![10]]
    );
}

#[test]
fn test_rolling_default_offset_trails_anchor() {
    let df = DataFrame::from_columns(vec![
        ("t", Column::from_i64(vec![1, 2, 3, 10])),
        ("v", Column::from_i64(vec![1, 2, 3, 10])),
    ])
    .unwrap();
    let opts = RollingOptions::new("2i").unwrap();
    let out = df
        .group_by_rolling("t", opts)
        .unwrap()
        .agg([col("v").sum().alias("sum"), col("v").count().alias("n")])
        .unwrap();

    // windows are (t - 2, t]
    assert_eq!(values(&out, "sum"), vec![1.into(), 3.into(), 5.into(), 10.into()]);
    assert_eq!(values(&out, "n"), vec![1.into(), 2.into(), 2.into(), 1.into()]);
}

#[test]
fn test_rolling_closed_variants() {
    let df = DataFrame::from_columns(vec![("t", Column::from_i64(vec![0, 1, 2, 3]))]).unwrap();
    let sizes = |closed: WindowClosed| {
        let opts = RollingOptions::new(Duration::from_index_count(2))
            .unwrap()
            .with_closed(closed);
        let out = df.group_by_rolling("t", opts).unwrap().count().unwrap();
        values(&out, "count")
    };

    assert_eq!(sizes(WindowClosed::Right), vec![1.into(), 2.into(), 2.into(), 2.into()]);
    assert_eq!(sizes(WindowClosed::Left), vec![0.into(), 1.into(), 2.into(), 2.into()]);
    assert_eq!(sizes(WindowClosed::Both), vec![1.into(), 2.into(), 3.into(), 3.into()]);
    assert_eq!(sizes(WindowClosed::Neither), vec![0.into(), 1.into(), 1.into(), 1.into()]);
}

#[test]
fn test_rolling_by_partitions() {
    let df = DataFrame::from_columns(vec![
        ("g", Column::from_strs(&["a", "b", "a", "b"])),
        ("t", Column::from_i64(vec![1, 1, 2, 5])),
        ("v", Column::from_i64(vec![10, 20, 30, 40])),
    ])
    .unwrap();
    let opts = RollingOptions::new("2i").unwrap().with_by(["g"]);
    let out = df
        .group_by_rolling("t", opts)
        .unwrap()
        .agg([col("v").sum()])
        .unwrap();

    assert_eq!(
        out.column_names(),
        &["g".to_string(), "t".to_string(), "v".to_string()]
    );
    assert_eq!(
        values(&out, "g"),
        vec!["a".into(), "a".into(), "b".into(), "b".into()]
    );
    assert_eq!(values(&out, "t"), vec![1.into(), 2.into(), 1.into(), 5.into()]);
    assert_eq!(values(&out, "v"), vec![10.into(), 40.into(), 20.into(), 40.into()]);
}

#[test]
fn test_rolling_by_only_needs_sorted_partitions() {
    // globally unsorted, sorted within each partition
    let df = DataFrame::from_columns(vec![
        ("g", Column::from_strs(&["a", "b", "a"])),
        ("t", Column::from_i64(vec![5, 1, 6])),
    ])
    .unwrap();
    let opts = RollingOptions::new("1i").unwrap().with_by(["g"]);
    let gb = df.group_by_rolling("t", opts).unwrap();
    assert_eq!(gb.ngroups().unwrap(), 3);

    let opts = RollingOptions::new("1i").unwrap();
    let gb = df.group_by_rolling("t", opts).unwrap();
    assert!(matches!(
        gb.ngroups(),
        Err(Error::UnsortedIndex { row: 1, .. })
    ));
}

#[test]
fn test_rolling_calendar_months() {
    let df = DataFrame::from_columns(vec![
        (
            "date",
            Column::from_dates(vec![
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            ]),
        ),
        ("v", Column::from_i64(vec![1, 2, 4])),
    ])
    .unwrap();
    let opts = RollingOptions::new("1mo").unwrap();
    let out = df
        .group_by_rolling("date", opts)
        .unwrap()
        .agg([col("v").sum()])
        .unwrap();
    // 2024-01-31 trails back to 2023-12-31; 2024-03-15 only reaches back to 2024-02-15
    assert_eq!(values(&out, "v"), vec![1.into(), 3.into(), 4.into()]);
}

#[test]
fn test_rolling_period_below_index_resolution() {
    let df = DataFrame::from_columns(vec![
        ("t", Column::from_datetime_ticks(vec![0, 1, 2], TimeUnit::Milliseconds)),
        ("v", Column::from_i64(vec![1, 2, 3])),
    ])
    .unwrap();

    assert!(matches!(
        df.group_by_rolling("t", RollingOptions::new("999us").unwrap()),
        Err(Error::InvalidDuration(_))
    ));
    let out = df
        .group_by_rolling("t", RollingOptions::new("2ms").unwrap())
        .unwrap()
        .agg([col("v").sum()])
        .unwrap();
    assert_eq!(values(&out, "v"), vec![1.into(), 3.into(), 5.into()]);
}

#[test]
fn test_rolling_rejects_bad_requests() {
    let df = DataFrame::from_columns(vec![
        ("t", Column::from_i64(vec![1, 2])),
        ("n", Column::from_opt_i64(vec![Some(1), None])),
        ("s", Column::from_strs(&["a", "b"])),
    ])
    .unwrap();

    assert!(matches!(
        df.group_by_rolling("t", RollingOptions::new("1d").unwrap()),
        Err(Error::InvalidDuration(_))
    ));
    assert!(matches!(
        df.group_by_rolling("t", RollingOptions::new("-1i").unwrap()),
        Err(Error::InvalidDuration(_))
    ));
    assert!(matches!(
        df.group_by_rolling("s", RollingOptions::new("1i").unwrap()),
        Err(Error::TypeMismatch(_))
    ));
    assert!(matches!(
        df.group_by_rolling("missing", RollingOptions::new("1i").unwrap()),
        Err(Error::InvalidGroupingKey(_))
    ));
    assert!(matches!(
        RollingOptions::new("3x"),
        Err(Error::InvalidDuration(_))
    ));

    let gb = df
        .group_by_rolling("n", RollingOptions::new("1i").unwrap())
        .unwrap();
    assert!(matches!(gb.agg([col("t").sum()]), Err(Error::NullIndex(_))));
}
