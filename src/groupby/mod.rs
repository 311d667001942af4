//! Grouping of a table by key columns, rolling windows or dynamic windows
//!
//! Every request is materialized into a [`GroupIndexTable`] first; aggregation,
//! iteration, head/tail and apply all read that table, so they agree on group
//! order.

mod aggregation;
mod apply;
pub mod dynamic;
pub mod groups;
mod index_column;
mod iter;
mod partition;
mod positional;
pub mod rolling;

pub use dynamic::{DynamicOptions, LOWER_BOUNDARY, UPPER_BOUNDARY};
pub use groups::{GroupIndexTable, GroupRows, GroupsProxy};
pub use iter::{GroupIter, GroupKey};
pub use rolling::RollingOptions;

use crate::column::Column;
use crate::config::{global_config, GroupwiseConfig};
use crate::core::column::DataType;
use crate::core::error::{Error, Result};
use crate::dataframe::DataFrame;
use crate::expr::{all, col, Expr, QuantileInterpolation};

/// What a [`GroupBy`] groups by
#[derive(Debug, Clone)]
pub(crate) enum GroupingRequest {
    Keys {
        keys: Vec<Expr>,
        maintain_order: bool,
    },
    Rolling {
        index_column: String,
        options: RollingOptions,
    },
    Dynamic {
        index_column: String,
        options: DynamicOptions,
    },
}

/// A validated grouping request over a borrowed table
///
/// Construction checks the request against the table; groups are computed on
/// each consuming call.
#[derive(Debug, Clone)]
pub struct GroupBy<'df> {
    df: &'df DataFrame,
    request: GroupingRequest,
    config: GroupwiseConfig,
}

impl<'df> GroupBy<'df> {
    fn new(df: &'df DataFrame, request: GroupingRequest) -> Result<Self> {
        match &request {
            GroupingRequest::Keys { keys, .. } => {
                if keys.is_empty() {
                    return Err(Error::InvalidGroupingKey(
                        "at least one grouping key is required".into(),
                    ));
                }
                for key in keys {
                    partition::check_key(df, key)?;
                    if let Expr::Column(name) = key {
                        if let DataType::List(_) = df.column_dtype(name)? {
                            return Err(Error::TypeMismatch(format!(
                                "grouping key '{}' is a list column",
                                name
                            )));
                        }
                    }
                }
            }
            GroupingRequest::Rolling {
                index_column,
                options,
            } => {
                options.validate(df, index_column)?;
            }
            GroupingRequest::Dynamic {
                index_column,
                options,
            } => {
                options.validate(df, index_column)?;
            }
        }
        Ok(Self {
            df,
            request,
            config: global_config(),
        })
    }

    /// Use `config` instead of the process-wide snapshot taken at construction
    pub fn with_config(mut self, config: GroupwiseConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &GroupwiseConfig {
        &self.config
    }

    pub(crate) fn source(&self) -> &DataFrame {
        self.df
    }

    /// Compute the group index table for this request
    pub(crate) fn materialize(&self) -> Result<GroupIndexTable> {
        match &self.request {
            GroupingRequest::Keys {
                keys,
                maintain_order,
            } => {
                let maintain_order = *maintain_order || self.config.defaults.maintain_order;
                partition::group_by_keys(self.df, keys, maintain_order, &self.config)
            }
            GroupingRequest::Rolling {
                index_column,
                options,
            } => rolling::group_by_rolling(self.df, index_column, options, &self.config),
            GroupingRequest::Dynamic {
                index_column,
                options,
            } => dynamic::group_by_dynamic(self.df, index_column, options, &self.config),
        }
    }

    /// Key columns that identify a group during iteration; window boundaries
    /// are left out.
    pub(crate) fn iteration_key_positions(&self, table: &GroupIndexTable) -> Vec<usize> {
        let boundary = |name: &str| {
            matches!(self.request, GroupingRequest::Dynamic { .. })
                && (name == LOWER_BOUNDARY || name == UPPER_BOUNDARY)
        };
        table
            .key_names()
            .iter()
            .enumerate()
            .filter(|(_, name)| !boundary(name.as_str()))
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of groups
    pub fn ngroups(&self) -> Result<usize> {
        Ok(self.materialize()?.len())
    }

    /// One row per group: the key columns followed by one column per
    /// expression.
    pub fn agg<I>(&self, exprs: I) -> Result<DataFrame>
    where
        I: IntoIterator<Item = Expr>,
    {
        let exprs: Vec<Expr> = exprs.into_iter().collect();
        let table = self.materialize()?;
        aggregation::aggregate(self.df, &table, &exprs, &self.config)
    }

    /// Materialize the groups and return a cursor over `(key, sub-table)` pairs
    pub fn iter(&self) -> Result<GroupIter<'_>> {
        let mut iter = GroupIter::new(self);
        iter.init()?;
        Ok(iter)
    }

    /// First `n` rows of every group
    pub fn head(&self, n: usize) -> Result<DataFrame> {
        let table = self.materialize()?;
        positional::head(self.df, &table, n)
    }

    /// Last `n` rows of every group
    pub fn tail(&self, n: usize) -> Result<DataFrame> {
        let table = self.materialize()?;
        positional::tail(self.df, &table, n)
    }

    /// Run `f` on each group's sub-table and stack the results in group order.
    ///
    /// Only key groupings over plain column names accept a callback.
    pub fn apply<F>(&self, f: F) -> Result<DataFrame>
    where
        F: FnMut(DataFrame) -> Result<DataFrame>,
    {
        match &self.request {
            GroupingRequest::Keys { keys, .. }
                if keys.iter().all(|k| matches!(k, Expr::Column(_))) => {}
            GroupingRequest::Keys { .. } => {
                return Err(Error::CallbackSignatureError(
                    "apply requires grouping by plain column names".into(),
                ))
            }
            _ => {
                return Err(Error::CallbackSignatureError(
                    "apply is not available for window groupings".into(),
                ))
            }
        }
        let table = self.materialize()?;
        apply::apply(self.df, &table, &self.config, f)
    }

    pub fn sum(&self) -> Result<DataFrame> {
        self.agg([all().sum()])
    }

    pub fn mean(&self) -> Result<DataFrame> {
        self.agg([all().mean()])
    }

    pub fn min(&self) -> Result<DataFrame> {
        self.agg([all().min()])
    }

    pub fn max(&self) -> Result<DataFrame> {
        self.agg([all().max()])
    }

    pub fn first(&self) -> Result<DataFrame> {
        self.agg([all().first()])
    }

    pub fn last(&self) -> Result<DataFrame> {
        self.agg([all().last()])
    }

    pub fn n_unique(&self) -> Result<DataFrame> {
        self.agg([all().n_unique()])
    }

    pub fn median(&self) -> Result<DataFrame> {
        self.agg([all().median()])
    }

    pub fn quantile(&self, q: f64, interpolation: QuantileInterpolation) -> Result<DataFrame> {
        self.agg([all().quantile(q, interpolation)])
    }

    /// Collect every non-key column into one list per group
    pub fn all(&self) -> Result<DataFrame> {
        self.agg([all().list()])
    }

    /// Keys plus a `count` column holding each group's row count
    pub fn count(&self) -> Result<DataFrame> {
        let table = self.materialize()?;
        let sizes = table.groups.sizes().into_iter().map(|n| n as i64).collect();
        let mut out = table.keys;
        out.add_column("count", Column::from_i64(sizes))?;
        Ok(out)
    }
}

impl DataFrame {
    /// Group rows by the named key columns
    pub fn group_by<S: AsRef<str>>(&self, keys: &[S], maintain_order: bool) -> Result<GroupBy<'_>> {
        let keys = keys.iter().map(|k| col(k.as_ref())).collect();
        self.group_by_exprs(keys, maintain_order)
    }

    /// Group rows by element-wise key expressions
    pub fn group_by_exprs(&self, keys: Vec<Expr>, maintain_order: bool) -> Result<GroupBy<'_>> {
        GroupBy::new(
            self,
            GroupingRequest::Keys {
                keys,
                maintain_order,
            },
        )
    }

    /// One window per row of the sorted `index_column`
    pub fn group_by_rolling(
        &self,
        index_column: &str,
        options: RollingOptions,
    ) -> Result<GroupBy<'_>> {
        GroupBy::new(
            self,
            GroupingRequest::Rolling {
                index_column: index_column.to_string(),
                options,
            },
        )
    }

    /// Fixed-cadence windows over the sorted `index_column`
    pub fn group_by_dynamic(
        &self,
        index_column: &str,
        options: DynamicOptions,
    ) -> Result<GroupBy<'_>> {
        GroupBy::new(
            self,
            GroupingRequest::Dynamic {
                index_column: index_column.to_string(),
                options,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data_value::DataValue;

    fn frame() -> DataFrame {
        DataFrame::from_columns(vec![
            ("a", Column::from_strs(&["x", "y", "x"])),
            ("b", Column::from_i64(vec![1, 2, 3])),
        ])
        .unwrap()
    }

    #[test]
    fn test_construction_is_eager() {
        let df = frame();
        assert!(matches!(
            df.group_by(&["missing"], false),
            Err(Error::InvalidGroupingKey(_))
        ));
        let empty: [&str; 0] = [];
        assert!(matches!(
            df.group_by(&empty, false),
            Err(Error::InvalidGroupingKey(_))
        ));
        assert!(matches!(
            df.group_by_exprs(vec![col("b").sum()], false),
            Err(Error::InvalidGroupingKey(_))
        ));
    }

    #[test]
    fn test_count_and_ngroups() {
        let df = frame();
        let gb = df.group_by(&["a"], true).unwrap();
        assert_eq!(gb.ngroups().unwrap(), 2);
        let out = gb.count().unwrap();
        assert_eq!(out.column_names(), &["a".to_string(), "count".to_string()]);
        assert_eq!(out.column("count").unwrap().get(0).unwrap(), DataValue::Int64(2));
    }

    #[test]
    fn test_apply_rejects_expression_keys() {
        let df = frame();
        let gb = df
            .group_by_exprs(vec![col("b").gt(crate::expr::lit(1i64))], false)
            .unwrap();
        assert!(matches!(
            gb.apply(|sub| Ok(sub)),
            Err(Error::CallbackSignatureError(_))
        ));
    }

    #[test]
    fn test_config_default_maintains_order() {
        let df = DataFrame::from_columns(vec![(
            "k",
            Column::from_i64((0..20).map(|i| 19 - i).collect()),
        )])
        .unwrap();
        let mut config = GroupwiseConfig::default();
        config.defaults.maintain_order = true;
        let gb = df.group_by(&["k"], false).unwrap().with_config(config);
        let keys: Vec<_> = gb
            .count()
            .unwrap()
            .column("k")
            .unwrap()
            .iter_values()
            .collect();
        let expected: Vec<DataValue> = (0..20).map(|i| DataValue::Int64(19 - i)).collect();
        assert_eq!(keys, expected);
    }
}
