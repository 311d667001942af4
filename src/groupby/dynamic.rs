//! Dynamic grouping: fixed-cadence windows over a sorted index

use crate::config::GroupwiseConfig;
use crate::core::error::{Error, Result};
use crate::dataframe::DataFrame;
use crate::groupby::groups::{GroupIndexTable, GroupsProxy};
use crate::groupby::index_column::IndexColumn;
use crate::groupby::rolling::{by_partitions, check_by_columns};
use crate::parallel::map_indexed;
use crate::temporal::window::{DynamicWindowSpec, Window};
use crate::temporal::{Duration, IndexKind, IntoDuration, StartBy, WindowClosed};
use crate::IdxSize;

pub const LOWER_BOUNDARY: &str = "_lower_boundary";
pub const UPPER_BOUNDARY: &str = "_upper_boundary";

/// Options of a dynamic grouping
#[derive(Debug, Clone)]
pub struct DynamicOptions {
    /// Distance between consecutive window starts
    pub every: Duration,
    /// Window length; defaults to `every`
    pub period: Option<Duration>,
    pub offset: Duration,
    pub closed: WindowClosed,
    pub start_by: StartBy,
    /// Label windows by their start rather than their first index value
    pub truncate: bool,
    /// Add `_lower_boundary` and `_upper_boundary` key columns
    pub include_boundaries: bool,
    /// `None` defers to the configuration default
    pub include_empty_windows: Option<bool>,
    pub by: Vec<String>,
}

impl DynamicOptions {
    pub fn new(every: impl IntoDuration) -> Result<Self> {
        Ok(Self {
            every: every.into_duration()?,
            period: None,
            offset: Duration::default(),
            closed: WindowClosed::Left,
            start_by: StartBy::WindowBound,
            truncate: true,
            include_boundaries: false,
            include_empty_windows: None,
            by: Vec::new(),
        })
    }

    pub fn with_period(mut self, period: impl IntoDuration) -> Result<Self> {
        self.period = Some(period.into_duration()?);
        Ok(self)
    }

    pub fn with_offset(mut self, offset: impl IntoDuration) -> Result<Self> {
        self.offset = offset.into_duration()?;
        Ok(self)
    }

    pub fn with_closed(mut self, closed: WindowClosed) -> Self {
        self.closed = closed;
        self
    }

    pub fn with_start_by(mut self, start_by: StartBy) -> Self {
        self.start_by = start_by;
        self
    }

    pub fn with_truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    pub fn with_boundaries(mut self, include: bool) -> Self {
        self.include_boundaries = include;
        self
    }

    pub fn with_empty_windows(mut self, include: bool) -> Self {
        self.include_empty_windows = Some(include);
        self
    }

    pub fn with_by<I, S>(mut self, by: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by = by.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn effective_period(&self) -> Duration {
        self.period.unwrap_or(self.every)
    }

    pub(crate) fn validate(&self, df: &DataFrame, index_column: &str) -> Result<IndexKind> {
        let (_, kind) = IndexColumn::resolve_kind(df, index_column)?;
        for (name, d) in [("every", self.every), ("period", self.effective_period())] {
            if !d.is_positive() {
                return Err(Error::InvalidDuration(format!(
                    "{} must be positive, got '{}'",
                    name, d
                )));
            }
            d.check_kind(kind, name)?;
            d.check_resolution(kind, name)?;
        }
        self.offset.check_kind(kind, "offset")?;
        if kind == IndexKind::Int && matches!(self.start_by, StartBy::Weekday(_)) {
            return Err(Error::InvalidStartBy(format!(
                "'{}' requires a temporal index",
                self.start_by
            )));
        }
        check_by_columns(df, &self.by)?;
        Ok(kind)
    }

    fn spec(&self, kind: IndexKind) -> DynamicWindowSpec {
        DynamicWindowSpec {
            every: self.every,
            period: self.effective_period(),
            offset: self.offset,
            closed: self.closed,
            start_by: self.start_by,
            kind,
        }
    }
}

/// Windows of one partition, keyed for output
#[derive(Default)]
struct PartitionWindows {
    rows: Vec<Vec<IdxSize>>,
    slices: Vec<[IdxSize; 2]>,
    lower: Vec<Option<i64>>,
    upper: Vec<Option<i64>>,
    label: Vec<Option<i64>>,
}

fn collect_windows(
    windows: Vec<Window>,
    values: &[i64],
    rows: Option<&[IdxSize]>,
    truncate: bool,
    include_empty: bool,
) -> PartitionWindows {
    let mut out = PartitionWindows::default();
    for w in windows.into_iter().filter(|w| include_empty || w.len > 0) {
        let (start, len) = (w.first as usize, w.len as usize);
        out.lower.push(Some(w.lower));
        out.upper.push(Some(w.upper));
        out.label.push(if truncate {
            Some(w.lower)
        } else if len > 0 {
            Some(values[start])
        } else {
            None
        });
        match rows {
            Some(rows) => out.rows.push(rows[start..start + len].to_vec()),
            None => out.slices.push([w.first, w.len]),
        }
    }
    out
}

/// Materialize a dynamic grouping
pub(crate) fn group_by_dynamic(
    df: &DataFrame,
    index_column: &str,
    options: &DynamicOptions,
    config: &GroupwiseConfig,
) -> Result<GroupIndexTable> {
    let kind = options.validate(df, index_column)?;
    let index = IndexColumn::from_frame(df, index_column)?;
    let spec = options.spec(kind);
    let include_empty = options
        .include_empty_windows
        .unwrap_or(config.defaults.include_empty_windows);

    let mut keys = DataFrame::new();
    let (groups, windows) = if options.by.is_empty() {
        index.check_sorted(0..index.values.len())?;
        let windows = collect_windows(
            spec.windows(&index.values)?,
            &index.values,
            None,
            options.truncate,
            include_empty,
        );
        (GroupsProxy::Slice(windows.slices.clone()), windows)
    } else {
        let (by_columns, parts) = by_partitions(df, &options.by, config)?;
        let per_part = map_indexed(parts.len(), config.parallel_groups(parts.len()), |p| {
            let rows = &parts[p];
            index.check_sorted(rows.iter().map(|&r| r as usize))?;
            let values: Vec<i64> = rows.iter().map(|&r| index.values[r as usize]).collect();
            Ok(collect_windows(
                spec.windows(&values)?,
                &values,
                Some(rows.as_slice()),
                options.truncate,
                include_empty,
            ))
        })?;

        // each window carries the `by` values of its partition
        let mut owners: Vec<IdxSize> = Vec::new();
        let mut merged = PartitionWindows::default();
        for (part, windows) in parts.iter().zip(per_part) {
            owners.extend(std::iter::repeat(part[0]).take(windows.rows.len()));
            merged.rows.extend(windows.rows);
            merged.lower.extend(windows.lower);
            merged.upper.extend(windows.upper);
            merged.label.extend(windows.label);
        }
        for (name, column) in &by_columns {
            keys.add_column(name.clone(), column.take(&owners))?;
        }
        (GroupsProxy::Idx(std::mem::take(&mut merged.rows)), merged)
    };

    if options.include_boundaries {
        keys.add_column(LOWER_BOUNDARY, index.column_from(&windows.lower)?)?;
        keys.add_column(UPPER_BOUNDARY, index.column_from(&windows.upper)?)?;
    }
    keys.add_column(index_column, index.column_from(&windows.label)?)?;

    if config.logging.enabled(log::Level::Debug) {
        log::debug!(
            "dynamic windows over '{}' (every {}, period {}, offset {}, closed {}, start_by {}): {} groups",
            index_column,
            options.every,
            options.effective_period(),
            options.offset,
            options.closed,
            options.start_by,
            groups.len()
        );
    }
    Ok(GroupIndexTable { keys, groups })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::core::data_value::DataValue;

    fn frame() -> DataFrame {
        DataFrame::from_columns(vec![
            ("g", Column::from_strs(&["a", "a", "b", "a"])),
            ("t", Column::from_i64(vec![0, 1, 3, 7])),
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_windows_follow_option() {
        let df = frame();
        let opts = DynamicOptions::new("3i").unwrap();
        let table = group_by_dynamic(&df, "t", &opts, &GroupwiseConfig::default()).unwrap();
        assert_eq!(table.groups, GroupsProxy::Slice(vec![[0, 2], [2, 1], [3, 1]]));

        let opts = DynamicOptions::new("2i").unwrap().with_empty_windows(false);
        let table = group_by_dynamic(&df, "t", &opts, &GroupwiseConfig::default()).unwrap();
        // [0,2) [2,4) [6,8); [4,6) is empty and dropped
        assert_eq!(table.groups, GroupsProxy::Slice(vec![[0, 2], [2, 1], [3, 1]]));
        assert_eq!(
            table.keys.column("t").unwrap().get(2).unwrap(),
            DataValue::Int64(6)
        );
    }

    #[test]
    fn test_by_with_boundaries_and_labels() {
        let df = frame();
        let opts = DynamicOptions::new("4i")
            .unwrap()
            .with_by(["g"])
            .with_boundaries(true)
            .with_truncate(false);
        let table = group_by_dynamic(&df, "t", &opts, &GroupwiseConfig::default()).unwrap();
        assert_eq!(
            table.key_names(),
            &["g", LOWER_BOUNDARY, UPPER_BOUNDARY, "t"].map(String::from)
        );
        assert_eq!(
            table.groups,
            GroupsProxy::Idx(vec![vec![0, 1], vec![3], vec![2]])
        );
        let labels: Vec<_> = table.keys.column("t").unwrap().iter_values().collect();
        assert_eq!(labels, vec![0.into(), 7.into(), 3.into()]);
        let upper: Vec<_> = table.keys.column(UPPER_BOUNDARY).unwrap().iter_values().collect();
        assert_eq!(upper, vec![4.into(), 8.into(), 4.into()]);
    }

    #[test]
    fn test_invalid_requests() {
        let df = frame();
        let config = GroupwiseConfig::default();
        let opts = DynamicOptions::new("1d").unwrap();
        assert!(matches!(
            group_by_dynamic(&df, "t", &opts, &config),
            Err(Error::InvalidDuration(_))
        ));
        let opts = DynamicOptions::new("2i")
            .unwrap()
            .with_start_by("monday".parse().unwrap());
        assert!(matches!(
            group_by_dynamic(&df, "t", &opts, &config),
            Err(Error::InvalidStartBy(_))
        ));
        let opts = DynamicOptions::new("-2i").unwrap();
        assert!(matches!(
            group_by_dynamic(&df, "t", &opts, &config),
            Err(Error::InvalidDuration(_))
        ));
    }
}
