//! head/tail: the first or last `n` rows of every group

use crate::core::error::Result;
use crate::dataframe::DataFrame;
use crate::groupby::aggregation::non_key_columns;
use crate::groupby::groups::{GroupIndexTable, GroupsProxy};
use crate::IdxSize;

/// Gather the rows of `cut` into one table: key columns repeated per row,
/// then every non-key source column. Group order is kept.
fn gather(df: &DataFrame, table: &GroupIndexTable, cut: &GroupsProxy) -> Result<DataFrame> {
    let mut rows: Vec<IdxSize> = Vec::new();
    let mut owners: Vec<IdxSize> = Vec::new();
    for (g, group) in cut.iter().enumerate() {
        rows.extend(group.iter());
        owners.extend(std::iter::repeat(g as IdxSize).take(group.len()));
    }

    let mut out = DataFrame::new();
    for (name, column) in table.keys.iter() {
        out.add_column(name, column.take(&owners))?;
    }
    for name in non_key_columns(df, table) {
        let column = df.column(&name)?.take(&rows);
        out.add_column(name, column)?;
    }
    Ok(out)
}

pub(crate) fn head(df: &DataFrame, table: &GroupIndexTable, n: usize) -> Result<DataFrame> {
    gather(df, table, &table.groups.head(n))
}

pub(crate) fn tail(df: &DataFrame, table: &GroupIndexTable, n: usize) -> Result<DataFrame> {
    gather(df, table, &table.groups.tail(n))
}
