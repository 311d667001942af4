use groupwise::{
    col, lit, Column, DataFrame, DataType, DataValue, DynamicOptions, Error, RollingOptions,
};

fn frame() -> DataFrame {
    DataFrame::from_columns(vec![
        ("k", Column::from_strs(&["x", "y", "x", "y", "x"])),
        ("v", Column::from_f64(vec![1.0, 2.0, 3.0, 4.0, 5.0])),
    ])
    .unwrap()
}

fn values(df: &DataFrame, name: &str) -> Vec<DataValue> {
    df.column(name).unwrap().iter_values().collect()
}

#[test]
fn test_apply_stacks_results_in_group_order() {
    let df = frame();
    let gb = df.group_by(&["k"], true).unwrap();

    let mut calls = 0;
    let out = gb
        .apply(|sub| {
            calls += 1;
            // keep the largest row of each group
            let n = sub.row_count();
            Ok(sub.slice(n - 1, 1))
        })
        .unwrap();

    assert_eq!(calls, 2);
    assert_eq!(values(&out, "k"), vec!["x".into(), "y".into()]);
    assert_eq!(values(&out, "v"), vec![5.0.into(), 4.0.into()]);
}

#[test]
fn test_apply_can_reshape() {
    let df = frame();
    let out = df
        .group_by(&["k"], true)
        .unwrap()
        .apply(|sub| {
            let total: f64 = sub
                .column("v")?
                .iter_values()
                .filter_map(|v| v.as_f64())
                .sum();
            DataFrame::from_columns(vec![
                ("rows", Column::from_i64(vec![sub.row_count() as i64])),
                ("total", Column::from_f64(vec![total])),
            ])
        })
        .unwrap();

    assert_eq!(out.column_names(), &["rows".to_string(), "total".to_string()]);
    assert_eq!(values(&out, "rows"), vec![3.into(), 2.into()]);
    assert_eq!(values(&out, "total"), vec![9.0.into(), 6.0.into()]);
}

#[test]
fn test_apply_callback_error_propagates() {
    let df = frame();
    let result = df
        .group_by(&["k"], false)
        .unwrap()
        .apply(|_| Err(Error::InvalidOperation("refused".into())));
    assert!(matches!(result, Err(Error::InvalidOperation(_))));
}

#[test]
fn test_apply_mismatched_schemas() {
    let df = frame();
    let result = df.group_by(&["k"], true).unwrap().apply(|sub| {
        let first = sub.column("k")?.get(0)?;
        if first == DataValue::from("x") {
            Ok(sub)
        } else {
            sub.select(&["v"])
        }
    });
    assert!(matches!(result, Err(Error::TypeMismatch(_))));
}

#[test]
fn test_apply_with_no_groups_keeps_schema() {
    let df = DataFrame::from_columns(vec![
        ("k", Column::from_strs::<&str>(&[])),
        ("v", Column::from_f64(vec![])),
    ])
    .unwrap();
    let out = df.group_by(&["k"], false).unwrap().apply(Ok).unwrap();
    assert_eq!(out.row_count(), 0);
    assert_eq!(
        out.schema(),
        vec![
            ("k".to_string(), DataType::String),
            ("v".to_string(), DataType::Float64)
        ]
    );
}

#[test]
fn test_apply_rejects_unsupported_groupings() {
    let df = DataFrame::from_columns(vec![
        ("t", Column::from_i64(vec![1, 2, 3])),
        ("v", Column::from_i64(vec![1, 2, 3])),
    ])
    .unwrap();

    let rolling = df
        .group_by_rolling("t", RollingOptions::new("2i").unwrap())
        .unwrap();
    assert!(matches!(
        rolling.apply(Ok),
        Err(Error::CallbackSignatureError(_))
    ));

    let dynamic = df
        .group_by_dynamic("t", DynamicOptions::new("2i").unwrap())
        .unwrap();
    assert!(matches!(
        dynamic.apply(Ok),
        Err(Error::CallbackSignatureError(_))
    ));

    let computed = df
        .group_by_exprs(vec![(col("v") * lit(2i64)).alias("double")], false)
        .unwrap();
    assert!(matches!(
        computed.apply(Ok),
        Err(Error::CallbackSignatureError(_))
    ));
}
