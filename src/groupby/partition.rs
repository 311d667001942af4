//! Key-based partitioning of table rows

use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::column::Column;
use crate::config::GroupwiseConfig;
use crate::core::column::DataType;
use crate::core::data_value::DataValue;
use crate::core::error::{Error, Result};
use crate::dataframe::DataFrame;
use crate::expr::eval::evaluate;
use crate::expr::Expr;
use crate::groupby::groups::{GroupIndexTable, GroupsProxy};
use crate::parallel::collect_indexed;
use crate::IdxSize;

/// Evaluate key expressions to named key columns, rejecting unusable keys
pub(crate) fn evaluate_keys(df: &DataFrame, keys: &[Expr]) -> Result<Vec<(String, Column)>> {
    let mut out = Vec::with_capacity(keys.len());
    for key in keys {
        check_key(df, key)?;
        let name = key
            .output_name()
            .ok_or_else(|| Error::InvalidGroupingKey(key.to_string()))?;
        let column = evaluate(key, df)?;
        if let DataType::List(_) = column.dtype() {
            return Err(Error::TypeMismatch(format!(
                "grouping key '{}' has type {}, which is not equality comparable",
                name,
                column.dtype()
            )));
        }
        out.push((name, column));
    }
    Ok(out)
}

/// A key must be element-wise and read at least one existing column
pub(crate) fn check_key(df: &DataFrame, key: &Expr) -> Result<()> {
    if key.has_aggregation() || key.has_wildcard() {
        return Err(Error::InvalidGroupingKey(format!(
            "'{}' cannot be used as a grouping key",
            key
        )));
    }
    let roots = key.root_columns();
    if roots.is_empty() {
        return Err(Error::InvalidGroupingKey(format!(
            "'{}' does not reference any column",
            key
        )));
    }
    if let Some(missing) = roots.iter().find(|name| !df.contains_column(name)) {
        return Err(Error::InvalidGroupingKey(format!(
            "column '{}' does not exist",
            missing
        )));
    }
    Ok(())
}

#[inline]
fn row_key(columns: &[Column], row: usize) -> Vec<DataValue> {
    columns.iter().map(|c| c.value(row)).collect()
}

fn hash_key(key: &[DataValue]) -> u64 {
    // DefaultHasher::new uses fixed keys, so partitions are reproducible
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

/// Group rows in first-appearance order with a single hash map
fn partition_serial<I: Iterator<Item = usize>>(columns: &[Column], rows: I) -> Vec<Vec<IdxSize>> {
    let mut ids: HashMap<Vec<DataValue>, usize> = HashMap::new();
    let mut groups: Vec<Vec<IdxSize>> = Vec::new();
    for row in rows {
        match ids.entry(row_key(columns, row)) {
            Entry::Vacant(e) => {
                e.insert(groups.len());
                groups.push(vec![row as IdxSize]);
            }
            Entry::Occupied(e) => groups[*e.get()].push(row as IdxSize),
        }
    }
    groups
}

/// Partition row positions by the tuple of key values.
///
/// Rows inside a group keep source order. With `maintain_order`, groups are
/// ordered by first appearance; otherwise parallel runs emit them partition by
/// partition.
pub(crate) fn partition_rows(
    columns: &[Column],
    n_rows: usize,
    maintain_order: bool,
    config: &GroupwiseConfig,
) -> Vec<Vec<IdxSize>> {
    if !config.parallel_rows(n_rows) {
        return partition_serial(columns, 0..n_rows);
    }

    let n_partitions = config.partition_count();
    if config.logging.enabled(log::Level::Trace) {
        log::trace!(
            "partitioning {} rows over {} hash partitions",
            n_rows,
            n_partitions
        );
    }
    let hashes: Vec<u64> = collect_indexed(n_rows, true, |row| hash_key(&row_key(columns, row)));
    let parts: Vec<Vec<Vec<IdxSize>>> = collect_indexed(n_partitions, true, |p| {
        let mine = (0..n_rows).filter(|&row| hashes[row] % n_partitions as u64 == p as u64);
        partition_serial(columns, mine)
    });

    let mut groups: Vec<Vec<IdxSize>> = parts.into_iter().flatten().collect();
    if maintain_order {
        groups.sort_unstable_by_key(|g| g[0]);
    }
    groups
}

/// Build the key table: one row per group, read at each group's first row
pub(crate) fn key_table(named: &[(String, Column)], groups: &[Vec<IdxSize>]) -> Result<DataFrame> {
    let firsts: Vec<IdxSize> = groups.iter().filter_map(|g| g.first().copied()).collect();
    let mut keys = DataFrame::new();
    for (name, column) in named {
        keys.add_column(name.clone(), column.take(&firsts))?;
    }
    Ok(keys)
}

/// Materialize a key grouping
pub(crate) fn group_by_keys(
    df: &DataFrame,
    keys: &[Expr],
    maintain_order: bool,
    config: &GroupwiseConfig,
) -> Result<GroupIndexTable> {
    let named = evaluate_keys(df, keys)?;
    let columns: Vec<Column> = named.iter().map(|(_, c)| c.clone()).collect();
    let groups = partition_rows(&columns, df.row_count(), maintain_order, config);
    let keys = key_table(&named, &groups)?;

    if config.logging.enabled(log::Level::Debug) {
        log::debug!(
            "grouped {} rows by {:?} into {} groups",
            df.row_count(),
            keys.column_names(),
            groups.len()
        );
    }
    Ok(GroupIndexTable {
        keys,
        groups: GroupsProxy::Idx(groups),
    })
}
