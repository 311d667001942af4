use groupwise::{
    col, Column, DataFrame, DataValue, DynamicOptions, Error, GroupIter, GroupKey, RollingOptions,
};

fn frame() -> DataFrame {
    DataFrame::from_columns(vec![
        ("k", Column::from_strs(&["b", "a", "b", "a", "b"])),
        ("j", Column::from_i64(vec![1, 1, 2, 1, 1])),
        ("v", Column::from_i64(vec![10, 20, 30, 40, 50])),
    ])
    .unwrap()
}

fn values(df: &DataFrame, name: &str) -> Vec<DataValue> {
    df.column(name).unwrap().iter_values().collect()
}

#[test]
fn test_iteration_matches_aggregation_order() {
    let df = frame();
    let gb = df.group_by(&["k"], true).unwrap();
    let iter = gb.iter().unwrap();
    assert_eq!(iter.size_hint(), (2, Some(2)));

    let pairs: Vec<(GroupKey, DataFrame)> = iter.collect::<Result<_, Error>>().unwrap();
    let keys: Vec<GroupKey> = pairs.iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(
        keys,
        vec![GroupKey::Single("b".into()), GroupKey::Single("a".into())]
    );

    let agg = gb.agg([col("v").sum()]).unwrap();
    for (i, (_, sub)) in pairs.iter().enumerate() {
        // the whole source schema, rows in source order
        assert_eq!(sub.column_names(), df.column_names());
        let total: i64 = values(sub, "v").iter().map(|v| v.as_i64().unwrap()).sum();
        assert_eq!(agg.column("v").unwrap().get(i).unwrap(), DataValue::Int64(total));
    }
    assert_eq!(values(&pairs[0].1, "v"), vec![10.into(), 30.into(), 50.into()]);
}

#[test]
fn test_multi_key_tuples() {
    let df = frame();
    let gb = df.group_by(&["k", "j"], true).unwrap();
    let keys: Vec<String> = gb
        .iter()
        .unwrap()
        .map(|r| r.map(|(k, _)| k.to_string()))
        .collect::<Result<_, Error>>()
        .unwrap();
    assert_eq!(keys, vec!["(b, 1)", "(a, 1)", "(b, 2)"]);
}

#[test]
fn test_cursor_states() {
    let df = frame();
    let gb = df.group_by(&["k"], true).unwrap();

    let mut iter = GroupIter::new(&gb);
    assert!(!iter.is_initialized());
    assert_eq!(iter.size_hint(), (0, None));

    assert!(iter.next().unwrap().is_ok());
    assert!(iter.is_initialized());
    assert_eq!(iter.size_hint(), (1, Some(1)));
    assert!(iter.next().unwrap().is_ok());
    assert!(iter.next().is_none());
    assert!(iter.is_exhausted());
    assert!(iter.next().is_none());
}

#[test]
fn test_initialization_error_is_yielded_once() {
    let df = DataFrame::from_columns(vec![("t", Column::from_i64(vec![2, 1]))]).unwrap();
    let gb = df
        .group_by_rolling("t", RollingOptions::new("1i").unwrap())
        .unwrap();

    assert!(matches!(gb.iter(), Err(Error::UnsortedIndex { .. })));

    let mut iter = GroupIter::new(&gb);
    assert!(matches!(iter.next(), Some(Err(Error::UnsortedIndex { .. }))));
    assert!(iter.is_exhausted());
    assert!(iter.next().is_none());
}

#[test]
fn test_window_keys_leave_out_boundaries() {
    let df = DataFrame::from_columns(vec![
        ("t", Column::from_i64(vec![0, 1, 4])),
        ("v", Column::from_i64(vec![1, 2, 3])),
    ])
    .unwrap();
    let opts = DynamicOptions::new("2i").unwrap().with_boundaries(true);
    let gb = df.group_by_dynamic("t", opts).unwrap();

    let pairs: Vec<(GroupKey, DataFrame)> = gb.iter().unwrap().collect::<Result<_, _>>().unwrap();
    let keys: Vec<GroupKey> = pairs.iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(
        keys,
        vec![
            GroupKey::Single(0.into()),
            GroupKey::Single(2.into()),
            GroupKey::Single(4.into()),
        ]
    );
    // the empty window still yields an empty sub-table
    assert_eq!(pairs[1].1.row_count(), 0);
    assert_eq!(values(&pairs[2].1, "v"), vec![3.into()]);
}

#[test]
fn test_rolling_iteration_keys_by_anchor() {
    let df = DataFrame::from_columns(vec![
        ("g", Column::from_strs(&["a", "a", "b"])),
        ("t", Column::from_i64(vec![1, 2, 1])),
    ])
    .unwrap();
    let opts = RollingOptions::new("2i").unwrap().with_by(["g"]);
    let gb = df.group_by_rolling("t", opts).unwrap();
    let keys: Vec<Vec<DataValue>> = gb
        .iter()
        .unwrap()
        .map(|r| r.map(|(k, _)| k.values()))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        keys,
        vec![
            vec!["a".into(), 1.into()],
            vec!["a".into(), 2.into()],
            vec!["b".into(), 1.into()],
        ]
    );
}
