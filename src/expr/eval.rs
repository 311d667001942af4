//! Element-wise evaluation of expressions against a whole table

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::column::{Column, ColumnBuilder};
use crate::core::column::{DataType, TimeUnit};
use crate::core::data_value::{date_to_days, DataValue};
use crate::core::error::{Error, Result};
use crate::dataframe::DataFrame;
use crate::expr::{BinaryOperator, Expr};

const NS_DAY: i64 = 86_400_000_000_000;

/// Evaluate an expression to one value per row of `df`
pub fn evaluate(expr: &Expr, df: &DataFrame) -> Result<Column> {
    evaluate_with_height(expr, df, df.row_count())
}

/// Like [`evaluate`], broadcasting literals to `height` rows
pub(crate) fn evaluate_with_height(expr: &Expr, df: &DataFrame, height: usize) -> Result<Column> {
    match expr {
        Expr::Column(name) => df.column(name).cloned(),
        Expr::Wildcard => Err(Error::InvalidOperation(
            "wildcard must be expanded before evaluation".into(),
        )),
        Expr::Literal(value) => literal_column(value, height),
        Expr::Alias(inner, _) => evaluate_with_height(inner, df, height),
        Expr::BinaryExpr { left, op, right } => {
            let l = evaluate_with_height(left, df, height)?;
            let r = evaluate_with_height(right, df, height)?;
            binary(&l, *op, &r)
        }
        Expr::Cast { expr, data_type } => cast(&evaluate_with_height(expr, df, height)?, data_type),
        Expr::Agg { .. } | Expr::Count => Err(Error::InvalidOperation(format!(
            "'{}' aggregates and cannot be evaluated row by row",
            expr
        ))),
    }
}

/// A literal repeated `height` times; a bare null literal is typed Int64
pub(crate) fn literal_column(value: &DataValue, height: usize) -> Result<Column> {
    let dtype = value.dtype().unwrap_or(DataType::Int64);
    Column::broadcast(value, &dtype, height)
}

/// Apply a binary operator row by row; a length-1 side is broadcast
pub fn binary(left: &Column, op: BinaryOperator, right: &Column) -> Result<Column> {
    let len = match (left.len(), right.len()) {
        (l, r) if l == r => l,
        (1, r) => r,
        (l, 1) => l,
        (l, r) => {
            return Err(Error::InconsistentRowCount {
                expected: l,
                found: r,
            })
        }
    };
    let pick = |c: &Column, i: usize| c.value(if c.len() == 1 { 0 } else { i });

    let (ldt, rdt) = (left.dtype(), right.dtype());
    let mismatch = || {
        Error::TypeMismatch(format!(
            "operator '{}' is not defined for {} and {}",
            op, ldt, rdt
        ))
    };

    let out_dtype = if op.is_arithmetic() {
        let int_like = |dt: &DataType| matches!(dt, DataType::Int64 | DataType::Boolean);
        let numeric = |dt: &DataType| int_like(dt) || *dt == DataType::Float64;
        if !numeric(&ldt) || !numeric(&rdt) {
            return Err(mismatch());
        }
        if op == BinaryOperator::Divide || !int_like(&ldt) || !int_like(&rdt) {
            DataType::Float64
        } else {
            DataType::Int64
        }
    } else if op.is_comparison() {
        if !(ldt == rdt || (ldt.is_numeric() && rdt.is_numeric())) {
            return Err(mismatch());
        }
        DataType::Boolean
    } else {
        if ldt != DataType::Boolean || rdt != DataType::Boolean {
            return Err(mismatch());
        }
        DataType::Boolean
    };

    let mut builder = ColumnBuilder::new(&out_dtype, len);
    for i in 0..len {
        let (a, b) = (pick(left, i), pick(right, i));
        if a.is_null() || b.is_null() {
            builder.push_null();
            continue;
        }
        builder.push(apply_scalar(&a, op, &b, &out_dtype))?;
    }
    Ok(builder.finish())
}

fn apply_scalar(a: &DataValue, op: BinaryOperator, b: &DataValue, out: &DataType) -> DataValue {
    use BinaryOperator::*;
    match op {
        Add | Subtract | Multiply | Divide if *out == DataType::Int64 => {
            // int-like operands always convert
            let (x, y) = (a.as_i64().unwrap_or_default(), b.as_i64().unwrap_or_default());
            DataValue::Int64(match op {
                Add => x.wrapping_add(y),
                Subtract => x.wrapping_sub(y),
                _ => x.wrapping_mul(y),
            })
        }
        Add | Subtract | Multiply | Divide => {
            let (x, y) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
            DataValue::Float64(match op {
                Add => x + y,
                Subtract => x - y,
                Multiply => x * y,
                _ => x / y,
            })
        }
        And => DataValue::Boolean(a == &DataValue::Boolean(true) && b == &DataValue::Boolean(true)),
        Or => DataValue::Boolean(a == &DataValue::Boolean(true) || b == &DataValue::Boolean(true)),
        _ => {
            let ord = a.total_cmp(b);
            DataValue::Boolean(match op {
                Equal => ord == Ordering::Equal,
                NotEqual => ord != Ordering::Equal,
                LessThan => ord == Ordering::Less,
                LessThanOrEqual => ord != Ordering::Greater,
                GreaterThan => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            })
        }
    }
}

/// Convert a column to another logical type
pub fn cast(column: &Column, to: &DataType) -> Result<Column> {
    if column.dtype() == *to {
        return Ok(column.clone());
    }
    let mut builder = ColumnBuilder::new(to, column.len());
    for value in column.iter_values() {
        builder.push(cast_value(value, to)?)?;
    }
    Ok(builder.finish())
}

fn rescale(ticks: i64, from: TimeUnit, to: TimeUnit) -> i64 {
    let (f, t) = (from.nanos_per_tick(), to.nanos_per_tick());
    if f >= t {
        ticks.saturating_mul(f / t)
    } else {
        ticks.div_euclid(t / f)
    }
}

pub(crate) fn cast_value(value: DataValue, to: &DataType) -> Result<DataValue> {
    let fail = |v: &DataValue| {
        Error::TypeMismatch(format!("cannot cast '{}' to {}", v, to))
    };

    let out = match (to, &value) {
        (_, DataValue::Null) => DataValue::Null,
        (DataType::String, v) => DataValue::String(v.to_string()),

        (DataType::Int64, DataValue::Float64(f)) if f.is_finite() => DataValue::Int64(f.trunc() as i64),
        (DataType::Int64, DataValue::String(s)) => {
            DataValue::Int64(s.trim().parse().map_err(|_| fail(&value))?)
        }
        (DataType::Int64, v) => DataValue::Int64(v.as_i64().ok_or_else(|| fail(v))?),

        (DataType::Float64, DataValue::String(s)) => {
            DataValue::Float64(s.trim().parse().map_err(|_| fail(&value))?)
        }
        (DataType::Float64, DataValue::Date(_) | DataValue::Datetime(..)) => {
            DataValue::Float64(value.as_i64().ok_or_else(|| fail(&value))? as f64)
        }
        (DataType::Float64, v) => DataValue::Float64(v.as_f64().ok_or_else(|| fail(v))?),

        (DataType::Boolean, DataValue::Int64(i)) => DataValue::Boolean(*i != 0),
        (DataType::Boolean, DataValue::Float64(f)) => DataValue::Boolean(*f != 0.0),
        (DataType::Boolean, DataValue::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" => DataValue::Boolean(true),
            "false" => DataValue::Boolean(false),
            _ => return Err(fail(&value)),
        },

        (DataType::Date, DataValue::Int64(i)) => {
            DataValue::Date(i32::try_from(*i).map_err(|_| fail(&value))?)
        }
        (DataType::Date, DataValue::Datetime(t, tu)) => {
            let days = t.div_euclid(NS_DAY / tu.nanos_per_tick());
            DataValue::Date(i32::try_from(days).map_err(|_| fail(&value))?)
        }
        (DataType::Date, DataValue::String(s)) => {
            let d = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| fail(&value))?;
            DataValue::Date(date_to_days(d))
        }

        (DataType::Datetime(to_unit), DataValue::Datetime(t, from)) => {
            DataValue::Datetime(rescale(*t, *from, *to_unit), *to_unit)
        }
        (DataType::Datetime(to_unit), DataValue::Date(d)) => {
            DataValue::Datetime((*d as i64).saturating_mul(NS_DAY / to_unit.nanos_per_tick()), *to_unit)
        }
        (DataType::Datetime(to_unit), DataValue::Int64(t)) => DataValue::Datetime(*t, *to_unit),

        (DataType::List(inner), DataValue::List(items)) => DataValue::List(
            items
                .iter()
                .cloned()
                .map(|item| cast_value(item, inner))
                .collect::<Result<Vec<_>>>()?,
        ),

        (dt, v) if v.dtype().as_ref() == Some(dt) => value.clone(),
        (_, v) => return Err(fail(v)),
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{col, lit};

    fn frame() -> DataFrame {
        DataFrame::from_columns(vec![
            ("a", Column::from_opt_i64(vec![Some(1), None, Some(3)])),
            ("b", Column::from_f64(vec![0.5, 1.5, 2.5])),
            ("s", Column::from_strs(&["1", "2", "x"])),
        ])
        .unwrap()
    }

    #[test]
    fn test_arithmetic_promotes() {
        let df = frame();
        let out = evaluate(&(col("a") + col("b")), &df).unwrap();
        assert_eq!(out.dtype(), DataType::Float64);
        assert_eq!(out.get(0).unwrap(), DataValue::Float64(1.5));
        assert!(out.is_null(1));

        let out = evaluate(&(col("a") * lit(2)), &df).unwrap();
        assert_eq!(out.dtype(), DataType::Int64);
        assert_eq!(out.get(2).unwrap(), DataValue::Int64(6));

        let out = evaluate(&(col("a") / lit(2)), &df).unwrap();
        assert_eq!(out.get(0).unwrap(), DataValue::Float64(0.5));
    }

    #[test]
    fn test_comparison_and_logic() {
        let df = frame();
        let mask = evaluate(&col("b").gt(lit(1.0)).and(col("a").lt(lit(5))), &df).unwrap();
        assert_eq!(mask.get(0).unwrap(), DataValue::Boolean(false));
        assert!(mask.is_null(1));
        assert_eq!(mask.get(2).unwrap(), DataValue::Boolean(true));
    }

    #[test]
    fn test_type_errors() {
        let df = frame();
        assert!(matches!(
            evaluate(&(col("s") + lit(1)), &df),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(
            evaluate(&col("s").cast(DataType::Int64), &df),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(evaluate(&col("nope"), &df), Err(Error::UnknownColumn(_))));
        assert!(matches!(
            evaluate(&col("a").sum(), &df),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_cast_dates() {
        let days = Column::from_i64(vec![0, 1]);
        let dates = cast(&days, &DataType::Date).unwrap();
        let dt = cast(&dates, &DataType::Datetime(TimeUnit::Milliseconds)).unwrap();
        assert_eq!(
            dt.get(1).unwrap(),
            DataValue::Datetime(86_400_000, TimeUnit::Milliseconds)
        );
    }
}
