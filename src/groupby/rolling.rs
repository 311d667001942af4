//! Rolling grouping: one window anchored at every row of a sorted index

use crate::column::Column;
use crate::config::GroupwiseConfig;
use crate::core::error::{Error, Result};
use crate::dataframe::DataFrame;
use crate::expr::col;
use crate::groupby::groups::{GroupIndexTable, GroupsProxy};
use crate::groupby::index_column::IndexColumn;
use crate::groupby::partition::{evaluate_keys, partition_rows};
use crate::parallel::map_indexed;
use crate::temporal::window::rolling_windows;
use crate::temporal::{Duration, IndexKind, IntoDuration, WindowClosed};
use crate::IdxSize;

/// Options of a rolling grouping.
///
/// `offset` defaults to `-period`, so each window trails its anchor row, and
/// `closed` defaults to `right`.
#[derive(Debug, Clone)]
pub struct RollingOptions {
    pub period: Duration,
    pub offset: Option<Duration>,
    pub closed: WindowClosed,
    pub by: Vec<String>,
}

impl RollingOptions {
    pub fn new(period: impl IntoDuration) -> Result<Self> {
        Ok(Self {
            period: period.into_duration()?,
            offset: None,
            closed: WindowClosed::Right,
            by: Vec::new(),
        })
    }

    pub fn with_offset(mut self, offset: impl IntoDuration) -> Result<Self> {
        self.offset = Some(offset.into_duration()?);
        Ok(self)
    }

    pub fn with_closed(mut self, closed: WindowClosed) -> Self {
        self.closed = closed;
        self
    }

    /// Compute windows separately within each group of these columns
    pub fn with_by<I, S>(mut self, by: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by = by.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn effective_offset(&self) -> Duration {
        self.offset.unwrap_or_else(|| self.period.negate())
    }

    /// Checks that need no pass over the data
    pub(crate) fn validate(&self, df: &DataFrame, index_column: &str) -> Result<IndexKind> {
        let (_, kind) = IndexColumn::resolve_kind(df, index_column)?;
        if !self.period.is_positive() {
            return Err(Error::InvalidDuration(format!(
                "period must be positive, got '{}'",
                self.period
            )));
        }
        self.period.check_kind(kind, "period")?;
        self.period.check_resolution(kind, "period")?;
        self.effective_offset().check_kind(kind, "offset")?;
        check_by_columns(df, &self.by)?;
        Ok(kind)
    }
}

pub(crate) fn check_by_columns(df: &DataFrame, by: &[String]) -> Result<()> {
    match by.iter().find(|name| !df.contains_column(name)) {
        Some(missing) => Err(Error::InvalidGroupingKey(format!(
            "column '{}' does not exist",
            missing
        ))),
        None => Ok(()),
    }
}

/// `by` key columns and row partitions in first-appearance order
pub(crate) fn by_partitions(
    df: &DataFrame,
    by: &[String],
    config: &GroupwiseConfig,
) -> Result<(Vec<(String, Column)>, Vec<Vec<IdxSize>>)> {
    let exprs: Vec<_> = by.iter().map(|name| col(name.as_str())).collect();
    let named = evaluate_keys(df, &exprs)?;
    let columns: Vec<Column> = named.iter().map(|(_, c)| c.clone()).collect();
    let parts = partition_rows(&columns, df.row_count(), true, config);
    Ok((named, parts))
}

/// Materialize a rolling grouping
pub(crate) fn group_by_rolling(
    df: &DataFrame,
    index_column: &str,
    options: &RollingOptions,
    config: &GroupwiseConfig,
) -> Result<GroupIndexTable> {
    options.validate(df, index_column)?;
    let index = IndexColumn::from_frame(df, index_column)?;
    let offset = options.effective_offset();
    let period = options.period;

    if options.by.is_empty() {
        index.check_sorted(0..index.values.len())?;
        let windows = rolling_windows(&index.values, &period, &offset, options.closed, index.kind)?;
        let groups: Vec<[IdxSize; 2]> = windows.iter().map(|w| [w.first, w.len]).collect();

        let mut keys = DataFrame::new();
        keys.add_column(index_column, df.column(index_column)?.clone())?;
        if config.logging.enabled(log::Level::Debug) {
            log::debug!(
                "rolling over '{}' (period {}, offset {}, closed {}): {} windows",
                index_column,
                period,
                offset,
                options.closed,
                groups.len()
            );
        }
        return Ok(GroupIndexTable {
            keys,
            groups: GroupsProxy::Slice(groups),
        });
    }

    let (by_columns, parts) = by_partitions(df, &options.by, config)?;
    let per_part = map_indexed(parts.len(), config.parallel_groups(parts.len()), |p| {
        let rows = &parts[p];
        index.check_sorted(rows.iter().map(|&r| r as usize))?;
        let values: Vec<i64> = rows.iter().map(|&r| index.values[r as usize]).collect();
        let windows = rolling_windows(&values, &period, &offset, options.closed, index.kind)?;
        Ok(windows
            .iter()
            .map(|w| {
                let start = w.first as usize;
                rows[start..start + w.len as usize].to_vec()
            })
            .collect::<Vec<_>>())
    })?;

    // anchors are the partition rows themselves, partition after partition
    let anchors: Vec<IdxSize> = parts.iter().flatten().copied().collect();
    let groups: Vec<Vec<IdxSize>> = per_part.into_iter().flatten().collect();

    let mut keys = DataFrame::new();
    for (name, column) in &by_columns {
        keys.add_column(name.clone(), column.take(&anchors))?;
    }
    keys.add_column(index_column, df.column(index_column)?.take(&anchors))?;

    if config.logging.enabled(log::Level::Debug) {
        log::debug!(
            "rolling over '{}' by {:?}: {} partitions, {} windows",
            index_column,
            options.by,
            parts.len(),
            groups.len()
        );
    }
    Ok(GroupIndexTable {
        keys,
        groups: GroupsProxy::Idx(groups),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_offset_trails_anchor() {
        let opts = RollingOptions::new("2i").unwrap();
        assert_eq!(opts.effective_offset(), Duration::from_index_count(-2));
        assert_eq!(opts.closed, WindowClosed::Right);
    }

    #[test]
    fn test_rolling_by_partitions() {
        let df = DataFrame::from_columns(vec![
            ("g", Column::from_strs(&["a", "b", "a", "b", "a"])),
            ("t", Column::from_i64(vec![1, 1, 2, 5, 3])),
        ])
        .unwrap();
        let opts = RollingOptions::new("2i").unwrap().with_by(["g"]);
        let table = group_by_rolling(&df, "t", &opts, &GroupwiseConfig::default()).unwrap();
        assert_eq!(
            table.groups,
            GroupsProxy::Idx(vec![vec![0], vec![0, 2], vec![2, 4], vec![1], vec![3]])
        );
        assert_eq!(table.key_names(), &["g".to_string(), "t".to_string()]);
    }

    #[test]
    fn test_unsorted_within_partition() {
        let df = DataFrame::from_columns(vec![
            ("g", Column::from_strs(&["a", "b", "a"])),
            ("t", Column::from_i64(vec![3, 1, 2])),
        ])
        .unwrap();
        let opts = RollingOptions::new("2i").unwrap().with_by(["g"]);
        assert!(matches!(
            group_by_rolling(&df, "t", &opts, &GroupwiseConfig::default()),
            Err(Error::UnsortedIndex { row: 2, .. })
        ));
    }
}
