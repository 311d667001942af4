//! Aggregation dispatcher: evaluates expressions once per group

use std::collections::HashSet;

use crate::column::{Column, ListColumn};
use crate::config::GroupwiseConfig;
use crate::core::column::DataType;
use crate::core::data_value::DataValue;
use crate::core::error::{Error, Result};
use crate::dataframe::DataFrame;
use crate::expr::eval::{binary, cast, evaluate, evaluate_with_height};
use crate::expr::{AggFunc, Expr, QuantileInterpolation};
use crate::groupby::groups::{GroupIndexTable, GroupRows, GroupsProxy};
use crate::parallel::collect_indexed;
use crate::IdxSize;

/// Compute one output row per group: key columns, then one column per
/// (wildcard-expanded) expression.
pub(crate) fn aggregate(
    df: &DataFrame,
    table: &GroupIndexTable,
    exprs: &[Expr],
    config: &GroupwiseConfig,
) -> Result<DataFrame> {
    let non_keys = non_key_columns(df, table);
    let expanded: Vec<Expr> = exprs
        .iter()
        .flat_map(|e| e.expand_wildcard(&non_keys))
        .collect();

    if config.logging.enabled(log::Level::Debug) {
        log::debug!(
            "aggregating {} expressions over {} groups",
            expanded.len(),
            table.len()
        );
    }

    let mut out = table.keys.clone();
    for expr in &expanded {
        let name = expr.output_name().ok_or_else(|| {
            Error::InvalidOperation(format!("cannot name the output of '{}'", expr))
        })?;
        let column = evaluate_groups(expr, df, &table.groups, config)?;
        out.add_column(name, column)?;
    }
    Ok(out)
}

/// Source columns that are not key columns, in source order
pub(crate) fn non_key_columns(df: &DataFrame, table: &GroupIndexTable) -> Vec<String> {
    let keys = table.key_names();
    df.column_names()
        .iter()
        .filter(|name| !keys.contains(name))
        .cloned()
        .collect()
}

/// Evaluate `expr` to one value per group
pub(crate) fn evaluate_groups(
    expr: &Expr,
    df: &DataFrame,
    groups: &GroupsProxy,
    config: &GroupwiseConfig,
) -> Result<Column> {
    if expr.is_literal_only() {
        return evaluate_with_height(expr, df, groups.len());
    }
    if !expr.has_aggregation() {
        return Ok(implode(&evaluate(expr, df)?, groups));
    }

    match expr {
        Expr::Alias(inner, _) => evaluate_groups(inner, df, groups, config),
        Expr::Count => Ok(Column::from_i64(
            groups.sizes().into_iter().map(|s| s as i64).collect(),
        )),
        Expr::Agg { input, func } => {
            if input.has_aggregation() {
                return Err(Error::InvalidOperation(format!(
                    "nested aggregation in '{}'",
                    expr
                )));
            }
            let column = evaluate(input, df)?;
            let name = input.output_name().unwrap_or_default();
            reduce(&column, *func, groups, &name, config)
        }
        Expr::BinaryExpr { left, op, right } => {
            let l = evaluate_groups(left, df, groups, config)?;
            let r = evaluate_groups(right, df, groups, config)?;
            if matches!(l.dtype(), DataType::List(_)) || matches!(r.dtype(), DataType::List(_)) {
                return Err(Error::InvalidOperation(format!(
                    "'{}' mixes aggregated and per-row values",
                    expr
                )));
            }
            binary(&l, *op, &r)
        }
        Expr::Cast { expr, data_type } => cast(&evaluate_groups(expr, df, groups, config)?, data_type),
        Expr::Column(_) | Expr::Wildcard | Expr::Literal(_) => Err(Error::InvalidOperation(
            format!("unexpected '{}' in group context", expr),
        )),
    }
}

/// One list per group holding that group's values in row order
pub(crate) fn implode(column: &Column, groups: &GroupsProxy) -> Column {
    let mut offsets = Vec::with_capacity(groups.len() + 1);
    let mut rows: Vec<IdxSize> = Vec::new();
    offsets.push(0);
    for group in groups.iter() {
        rows.extend(group.iter());
        offsets.push(rows.len());
    }
    Column::List(ListColumn::new(offsets, column.take(&rows), None))
}

/// Output type of `func` over an input of `dtype`, or the reason it is rejected
pub(crate) fn output_dtype(func: AggFunc, dtype: &DataType, column: &str) -> Result<DataType> {
    let reject = || Error::agg_type(func.name(), column, dtype);
    let numeric = matches!(dtype, DataType::Int64 | DataType::Float64 | DataType::Boolean);
    match func {
        AggFunc::Sum => match dtype {
            DataType::Int64 | DataType::Boolean => Ok(DataType::Int64),
            DataType::Float64 => Ok(DataType::Float64),
            _ => Err(reject()),
        },
        AggFunc::Mean
        | AggFunc::Median
        | AggFunc::Std
        | AggFunc::Var
        | AggFunc::Quantile(..) => {
            if numeric {
                Ok(DataType::Float64)
            } else {
                Err(reject())
            }
        }
        AggFunc::Min | AggFunc::Max => match dtype {
            DataType::List(_) => Err(reject()),
            other => Ok(other.clone()),
        },
        AggFunc::First | AggFunc::Last => Ok(dtype.clone()),
        AggFunc::Count => Ok(DataType::Int64),
        AggFunc::NUnique => {
            if dtype.is_hashable() {
                Ok(DataType::Int64)
            } else {
                Err(reject())
            }
        }
        AggFunc::List => Ok(DataType::List(Box::new(dtype.clone()))),
    }
}

/// Reduce `column` once per group
pub(crate) fn reduce(
    column: &Column,
    func: AggFunc,
    groups: &GroupsProxy,
    name: &str,
    config: &GroupwiseConfig,
) -> Result<Column> {
    let out_dtype = output_dtype(func, &column.dtype(), name)?;
    if let AggFunc::Quantile(q, _) = func {
        if !(0.0..=1.0).contains(&q) {
            return Err(Error::InvalidValue(format!(
                "quantile must be between 0 and 1, got {}",
                q
            )));
        }
    }

    let parallel = config.parallel_groups(groups.len());
    if parallel && config.logging.enabled(log::Level::Trace) {
        log::trace!("reducing '{}' with {} over {} groups in parallel", name, func.name(), groups.len());
    }
    let values = collect_indexed(groups.len(), parallel, |g| {
        reduce_group(column, groups.get(g), func)
    });
    Column::from_values(&out_dtype, values)
}

/// Non-null values of a group as floats
fn floats(column: &Column, rows: GroupRows<'_>) -> Vec<f64> {
    match column {
        Column::Float64(c) => rows
            .iter()
            .filter_map(|r| c.get_unchecked(r as usize).copied())
            .collect(),
        Column::Int64(c) => rows
            .iter()
            .filter_map(|r| c.get_unchecked(r as usize).map(|&v| v as f64))
            .collect(),
        _ => rows
            .iter()
            .filter_map(|r| column.value(r as usize).as_f64())
            .collect(),
    }
}

fn reduce_group(column: &Column, rows: GroupRows<'_>, func: AggFunc) -> DataValue {
    match func {
        AggFunc::Sum => match column {
            Column::Float64(_) => DataValue::Float64(floats(column, rows).iter().sum()),
            _ => DataValue::Int64(
                rows.iter()
                    .filter_map(|r| column.value(r as usize).as_i64())
                    .fold(0i64, i64::wrapping_add),
            ),
        },
        AggFunc::Mean => {
            let values = floats(column, rows);
            if values.is_empty() {
                DataValue::Null
            } else {
                DataValue::Float64(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
        AggFunc::Min | AggFunc::Max => {
            let want_max = func == AggFunc::Max;
            rows.iter()
                .map(|r| column.value(r as usize))
                .filter(|v| !v.is_null())
                .reduce(|best, v| {
                    let ord = v.total_cmp(&best);
                    let replace = if want_max { ord.is_gt() } else { ord.is_lt() };
                    if replace {
                        v
                    } else {
                        best
                    }
                })
                .unwrap_or(DataValue::Null)
        }
        AggFunc::First => rows
            .first()
            .map_or(DataValue::Null, |r| column.value(r as usize)),
        AggFunc::Last => rows
            .last()
            .map_or(DataValue::Null, |r| column.value(r as usize)),
        AggFunc::Count => DataValue::Int64(
            rows.iter().filter(|&r| !column.is_null(r as usize)).count() as i64,
        ),
        AggFunc::NUnique => {
            let distinct: HashSet<DataValue> = rows.iter().map(|r| column.value(r as usize)).collect();
            DataValue::Int64(distinct.len() as i64)
        }
        AggFunc::Median => quantile(floats(column, rows), 0.5, QuantileInterpolation::Linear),
        AggFunc::Quantile(q, interpolation) => quantile(floats(column, rows), q, interpolation),
        AggFunc::Std => variance(&floats(column, rows)).map_or(DataValue::Null, |v| DataValue::Float64(v.sqrt())),
        AggFunc::Var => variance(&floats(column, rows)).map_or(DataValue::Null, DataValue::Float64),
        AggFunc::List => DataValue::List(rows.iter().map(|r| column.value(r as usize)).collect()),
    }
}

fn quantile(mut values: Vec<f64>, q: f64, interpolation: QuantileInterpolation) -> DataValue {
    if values.is_empty() {
        return DataValue::Null;
    }
    values.sort_unstable_by(f64::total_cmp);

    let pos = q * (values.len() - 1) as f64;
    let (lo, hi) = (pos.floor() as usize, pos.ceil() as usize);
    let v = match interpolation {
        QuantileInterpolation::Nearest => values[pos.round() as usize],
        QuantileInterpolation::Lower => values[lo],
        QuantileInterpolation::Higher => values[hi],
        QuantileInterpolation::Midpoint => (values[lo] + values[hi]) / 2.0,
        QuantileInterpolation::Linear => values[lo] + (pos - lo as f64) * (values[hi] - values[lo]),
    };
    DataValue::Float64(v)
}

/// Sample variance with one delta degree of freedom
fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    Some(values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> GroupsProxy {
        GroupsProxy::Idx(vec![vec![0, 2], vec![1], vec![]])
    }

    #[test]
    fn test_empty_and_null_groups() {
        let col = Column::from_opt_i64(vec![Some(1), None, Some(3)]);
        let config = GroupwiseConfig::default();
        let sums = reduce(&col, AggFunc::Sum, &groups(), "a", &config).unwrap();
        let sums: Vec<_> = sums.iter_values().collect();
        assert_eq!(sums, vec![4.into(), 0.into(), 0.into()]);

        let means = reduce(&col, AggFunc::Mean, &groups(), "a", &config).unwrap();
        assert_eq!(means.get(0).unwrap(), DataValue::Float64(2.0));
        assert!(means.is_null(1));
        assert!(means.is_null(2));

        let n = reduce(&col, AggFunc::NUnique, &groups(), "a", &config).unwrap();
        assert_eq!(n.get(1).unwrap(), DataValue::Int64(1));
    }

    #[test]
    fn test_type_rules() {
        assert!(matches!(
            output_dtype(AggFunc::Sum, &DataType::String, "s"),
            Err(Error::AggregationTypeError { func: "sum", .. })
        ));
        assert_eq!(
            output_dtype(AggFunc::Max, &DataType::String, "s").unwrap(),
            DataType::String
        );
        assert_eq!(
            output_dtype(AggFunc::Sum, &DataType::Boolean, "b").unwrap(),
            DataType::Int64
        );
    }

    #[test]
    fn test_quantile_methods() {
        let v = vec![4.0, 1.0, 3.0, 2.0];
        let q = |i| quantile(v.clone(), 0.5, i);
        assert_eq!(q(QuantileInterpolation::Lower), DataValue::Float64(2.0));
        assert_eq!(q(QuantileInterpolation::Higher), DataValue::Float64(3.0));
        assert_eq!(q(QuantileInterpolation::Linear), DataValue::Float64(2.5));
        assert_eq!(q(QuantileInterpolation::Midpoint), DataValue::Float64(2.5));
        assert_eq!(variance(&[1.0, 2.0, 3.0]), Some(1.0));
    }
}
