use chrono::{NaiveDate, NaiveDateTime};

use crate::column::list_column::ListColumn;
use crate::column::typed_column::{
    BooleanColumn, DateColumn, Float64Column, Int64Column, StringColumn, TypedColumn,
};
use crate::core::column::{BitMask, DataType, TimeUnit};
use crate::core::data_value::{date_to_days, DataValue};
use crate::core::error::{Error, Result};
use crate::IdxSize;

/// Enum representing a column
#[derive(Debug, Clone)]
pub enum Column {
    Int64(Int64Column),
    Float64(Float64Column),
    Boolean(BooleanColumn),
    String(StringColumn),
    Date(DateColumn),
    Datetime(Int64Column, TimeUnit),
    List(ListColumn),
}

/// Dispatches an expression over the scalar variants, binding the typed column to `$c`
macro_rules! with_typed {
    ($self:expr, $c:ident => $body:expr, $list:ident => $list_body:expr) => {
        match $self {
            Column::Int64($c) => $body,
            Column::Float64($c) => $body,
            Column::Boolean($c) => $body,
            Column::String($c) => $body,
            Column::Date($c) => $body,
            Column::Datetime($c, _) => $body,
            Column::List($list) => $list_body,
        }
    };
}

impl Column {
    pub fn from_i64(values: Vec<i64>) -> Self {
        Column::Int64(TypedColumn::new(values))
    }

    pub fn from_opt_i64(values: Vec<Option<i64>>) -> Self {
        Column::Int64(TypedColumn::from_options(values))
    }

    pub fn from_f64(values: Vec<f64>) -> Self {
        Column::Float64(TypedColumn::new(values))
    }

    pub fn from_opt_f64(values: Vec<Option<f64>>) -> Self {
        Column::Float64(TypedColumn::from_options(values))
    }

    pub fn from_bool(values: Vec<bool>) -> Self {
        Column::Boolean(TypedColumn::new(values))
    }

    pub fn from_opt_bool(values: Vec<Option<bool>>) -> Self {
        Column::Boolean(TypedColumn::from_options(values))
    }

    pub fn from_strs<S: AsRef<str>>(values: &[S]) -> Self {
        Column::String(TypedColumn::new(
            values.iter().map(|s| s.as_ref().to_string()).collect(),
        ))
    }

    pub fn from_opt_strs<S: AsRef<str>>(values: &[Option<S>]) -> Self {
        Column::String(TypedColumn::from_options(
            values
                .iter()
                .map(|s| s.as_ref().map(|s| s.as_ref().to_string()))
                .collect(),
        ))
    }

    pub fn from_dates(values: Vec<NaiveDate>) -> Self {
        Column::Date(TypedColumn::new(
            values.into_iter().map(date_to_days).collect(),
        ))
    }

    /// Millisecond-resolution datetime column
    pub fn from_datetimes(values: Vec<NaiveDateTime>) -> Self {
        Column::Datetime(
            TypedColumn::new(
                values
                    .into_iter()
                    .map(|dt| dt.and_utc().timestamp_millis())
                    .collect(),
            ),
            TimeUnit::Milliseconds,
        )
    }

    /// Datetime column from raw ticks since the epoch
    pub fn from_datetime_ticks(values: Vec<i64>, unit: TimeUnit) -> Self {
        Column::Datetime(TypedColumn::new(values), unit)
    }

    /// A zero-length column of the given type
    pub fn empty(dtype: &DataType) -> Self {
        ColumnBuilder::new(dtype, 0).finish()
    }

    /// A column holding `len` NULL values
    pub fn full_null(dtype: &DataType, len: usize) -> Self {
        let mut builder = ColumnBuilder::new(dtype, len);
        for _ in 0..len {
            builder.push_null();
        }
        builder.finish()
    }

    /// Build a column of `dtype` from dynamically typed values
    pub fn from_values(dtype: &DataType, values: Vec<DataValue>) -> Result<Self> {
        let mut builder = ColumnBuilder::new(dtype, values.len());
        for v in values {
            builder.push(v)?;
        }
        Ok(builder.finish())
    }

    /// Repeat one value `len` times
    pub fn broadcast(value: &DataValue, dtype: &DataType, len: usize) -> Result<Self> {
        let mut builder = ColumnBuilder::new(dtype, len);
        for _ in 0..len {
            builder.push(value.clone())?;
        }
        Ok(builder.finish())
    }

    pub fn dtype(&self) -> DataType {
        match self {
            Column::Int64(_) => DataType::Int64,
            Column::Float64(_) => DataType::Float64,
            Column::Boolean(_) => DataType::Boolean,
            Column::String(_) => DataType::String,
            Column::Date(_) => DataType::Date,
            Column::Datetime(_, tu) => DataType::Datetime(*tu),
            Column::List(l) => DataType::List(Box::new(l.inner_dtype())),
        }
    }

    pub fn len(&self) -> usize {
        with_typed!(self, c => c.len(), l => l.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        with_typed!(self, c => c.null_count(), l => l.null_count())
    }

    pub fn is_null(&self, index: usize) -> bool {
        with_typed!(self, c => c.is_null(index), l => l.is_null(index))
    }

    /// Get the value at the specified index
    pub fn get(&self, index: usize) -> Result<DataValue> {
        if index >= self.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                size: self.len(),
            });
        }
        Ok(self.value(index))
    }

    /// Value at `index`; the caller guarantees bounds
    pub(crate) fn value(&self, index: usize) -> DataValue {
        match self {
            Column::Int64(c) => c.get_unchecked(index).map_or(DataValue::Null, |v| DataValue::Int64(*v)),
            Column::Float64(c) => c
                .get_unchecked(index)
                .map_or(DataValue::Null, |v| DataValue::Float64(*v)),
            Column::Boolean(c) => c
                .get_unchecked(index)
                .map_or(DataValue::Null, |v| DataValue::Boolean(*v)),
            Column::String(c) => c
                .get_unchecked(index)
                .map_or(DataValue::Null, |v| DataValue::String(v.clone())),
            Column::Date(c) => c.get_unchecked(index).map_or(DataValue::Null, |v| DataValue::Date(*v)),
            Column::Datetime(c, tu) => c
                .get_unchecked(index)
                .map_or(DataValue::Null, |v| DataValue::Datetime(*v, *tu)),
            Column::List(l) => {
                if l.is_null(index) {
                    DataValue::Null
                } else {
                    let row = l.row(index);
                    DataValue::List(row.iter_values().collect())
                }
            }
        }
    }

    /// Iterate all values as `DataValue`s
    pub fn iter_values(&self) -> impl Iterator<Item = DataValue> + '_ {
        (0..self.len()).map(move |i| self.value(i))
    }

    /// Gather rows by position
    pub fn take(&self, indices: &[IdxSize]) -> Column {
        match self {
            Column::Int64(c) => Column::Int64(c.take(indices)),
            Column::Float64(c) => Column::Float64(c.take(indices)),
            Column::Boolean(c) => Column::Boolean(c.take(indices)),
            Column::String(c) => Column::String(c.take(indices)),
            Column::Date(c) => Column::Date(c.take(indices)),
            Column::Datetime(c, tu) => Column::Datetime(c.take(indices), *tu),
            Column::List(l) => Column::List(l.take(indices)),
        }
    }

    pub fn slice(&self, offset: usize, length: usize) -> Column {
        match self {
            Column::Int64(c) => Column::Int64(c.slice(offset, length)),
            Column::Float64(c) => Column::Float64(c.slice(offset, length)),
            Column::Boolean(c) => Column::Boolean(c.slice(offset, length)),
            Column::String(c) => Column::String(c.slice(offset, length)),
            Column::Date(c) => Column::Date(c.slice(offset, length)),
            Column::Datetime(c, tu) => Column::Datetime(c.slice(offset, length), *tu),
            Column::List(l) => {
                let end = (offset + length).min(l.len());
                let offset = offset.min(end);
                let indices: Vec<IdxSize> = (offset..end).map(|i| i as IdxSize).collect();
                Column::List(l.take(&indices))
            }
        }
    }

    /// Vertically concatenate columns that share one logical type
    pub fn concat(columns: &[&Column]) -> Result<Column> {
        let first = columns
            .first()
            .ok_or_else(|| Error::InvalidOperation("cannot concatenate zero columns".into()))?;
        let dtype = first.dtype();
        if let Some(other) = columns.iter().find(|c| c.dtype() != dtype) {
            return Err(Error::TypeMismatch(format!(
                "cannot concatenate {} with {}",
                dtype,
                other.dtype()
            )));
        }

        macro_rules! concat_typed {
            ($variant:ident, $head:expr) => {{
                let rest = columns[1..].iter().filter_map(|c| match c {
                    Column::$variant(t, ..) => Some(t),
                    _ => None,
                });
                $head.concat(rest)
            }};
        }

        Ok(match first {
            Column::Int64(c) => Column::Int64(concat_typed!(Int64, c)),
            Column::Float64(c) => Column::Float64(concat_typed!(Float64, c)),
            Column::Boolean(c) => Column::Boolean(concat_typed!(Boolean, c)),
            Column::String(c) => Column::String(concat_typed!(String, c)),
            Column::Date(c) => Column::Date(concat_typed!(Date, c)),
            Column::Datetime(c, tu) => Column::Datetime(concat_typed!(Datetime, c), *tu),
            Column::List(_) => {
                let mut builder = ColumnBuilder::new(&dtype, columns.iter().map(|c| c.len()).sum());
                for col in columns {
                    for v in col.iter_values() {
                        builder.push(v)?;
                    }
                }
                builder.finish()
            }
        })
    }

    pub fn as_int64(&self) -> Option<&Int64Column> {
        match self {
            Column::Int64(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_float64(&self) -> Option<&Float64Column> {
        match self {
            Column::Float64(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListColumn> {
        match self {
            Column::List(l) => Some(l),
            _ => None,
        }
    }
}

/// Incrementally builds a column of a declared logical type
#[derive(Debug)]
pub struct ColumnBuilder {
    dtype: DataType,
    values: Vec<DataValue>,
}

impl ColumnBuilder {
    pub fn new(dtype: &DataType, capacity: usize) -> Self {
        Self {
            dtype: dtype.clone(),
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn push_null(&mut self) {
        self.values.push(DataValue::Null);
    }

    /// Append one value, checking it against the declared type.
    /// Integers are widened when the builder holds floats.
    pub fn push(&mut self, value: DataValue) -> Result<()> {
        let value = coerce(&self.dtype, value)?;
        self.values.push(value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn finish(self) -> Column {
        let values = self.values;
        match &self.dtype {
            DataType::Int64 => Column::Int64(TypedColumn::from_options(
                values.iter().map(DataValue::as_i64).collect(),
            )),
            DataType::Float64 => Column::Float64(TypedColumn::from_options(
                values.iter().map(DataValue::as_f64).collect(),
            )),
            DataType::Boolean => Column::Boolean(TypedColumn::from_options(
                values
                    .iter()
                    .map(|v| match v {
                        DataValue::Boolean(b) => Some(*b),
                        _ => None,
                    })
                    .collect(),
            )),
            DataType::String => Column::String(TypedColumn::from_options(
                values
                    .into_iter()
                    .map(|v| match v {
                        DataValue::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            )),
            DataType::Date => Column::Date(TypedColumn::from_options(
                values
                    .iter()
                    .map(|v| match v {
                        DataValue::Date(d) => Some(*d),
                        _ => None,
                    })
                    .collect(),
            )),
            DataType::Datetime(tu) => Column::Datetime(
                TypedColumn::from_options(values.iter().map(DataValue::as_i64).collect()),
                *tu,
            ),
            DataType::List(inner) => {
                let mut offsets = Vec::with_capacity(values.len() + 1);
                let mut nulls = Vec::with_capacity(values.len());
                let mut child = ColumnBuilder::new(inner, values.len());
                offsets.push(0);
                for v in values {
                    match v {
                        DataValue::List(items) => {
                            // items were coerced to the inner type on push
                            child.values.extend(items);
                            nulls.push(false);
                        }
                        _ => nulls.push(true),
                    }
                    offsets.push(child.len());
                }
                Column::List(ListColumn::new(
                    offsets,
                    child.finish(),
                    BitMask::from_bools_opt(&nulls),
                ))
            }
        }
    }
}

fn coerce(dtype: &DataType, value: DataValue) -> Result<DataValue> {
    Ok(match (dtype, value) {
        (_, DataValue::Null) => DataValue::Null,
        (DataType::Int64, v @ DataValue::Int64(_)) => v,
        (DataType::Float64, v @ DataValue::Float64(_)) => v,
        (DataType::Float64, DataValue::Int64(i)) => DataValue::Float64(i as f64),
        (DataType::Boolean, v @ DataValue::Boolean(_)) => v,
        (DataType::String, v @ DataValue::String(_)) => v,
        (DataType::Date, v @ DataValue::Date(_)) => v,
        (DataType::Datetime(tu), DataValue::Datetime(v, other)) if *tu == other => {
            DataValue::Datetime(v, other)
        }
        (DataType::List(inner), DataValue::List(items)) => DataValue::List(
            items
                .into_iter()
                .map(|item| coerce(inner, item))
                .collect::<Result<Vec<_>>>()?,
        ),
        (dtype, v) => {
            return Err(Error::TypeMismatch(format!(
                "cannot store value '{}' in a column of type {}",
                v, dtype
            )))
        }
    })
}
