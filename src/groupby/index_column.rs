use crate::column::Column;
use crate::core::column::{DataType, TimeUnit};
use crate::core::data_value::DataValue;
use crate::core::error::{Error, Result};
use crate::dataframe::DataFrame;
use crate::temporal::IndexKind;

const MS_PER_DAY: i64 = 86_400_000;

/// The index column of a window grouping, widened to `i64` ticks.
///
/// Dates are handled as milliseconds so calendar arithmetic sees one unit.
#[derive(Debug, Clone)]
pub(crate) struct IndexColumn {
    pub name: String,
    pub dtype: DataType,
    pub kind: IndexKind,
    pub values: Vec<i64>,
}

impl IndexColumn {
    /// Check that `name` exists and has an index-capable type
    pub fn resolve_kind(df: &DataFrame, name: &str) -> Result<(DataType, IndexKind)> {
        let column = df.column(name).map_err(|_| {
            Error::InvalidGroupingKey(format!("index column '{}' does not exist", name))
        })?;
        let dtype = column.dtype();
        let kind = match &dtype {
            DataType::Int64 => IndexKind::Int,
            DataType::Date => IndexKind::Temporal(TimeUnit::Milliseconds),
            DataType::Datetime(tu) => IndexKind::Temporal(*tu),
            other => {
                return Err(Error::TypeMismatch(format!(
                    "index column '{}' must be Int64, Date or Datetime, got {}",
                    name, other
                )))
            }
        };
        Ok((dtype, kind))
    }

    pub fn from_frame(df: &DataFrame, name: &str) -> Result<Self> {
        let (dtype, kind) = Self::resolve_kind(df, name)?;
        let column = df.column(name)?;
        if column.null_count() > 0 {
            return Err(Error::NullIndex(name.to_string()));
        }

        let values: Vec<i64> = match column {
            Column::Int64(c) | Column::Datetime(c, _) => c.values().to_vec(),
            Column::Date(c) => c.values().iter().map(|&d| d as i64 * MS_PER_DAY).collect(),
            other => {
                return Err(Error::TypeMismatch(format!(
                    "index column '{}' has type {}",
                    name,
                    other.dtype()
                )))
            }
        };

        Ok(Self {
            name: name.to_string(),
            dtype,
            kind,
            values,
        })
    }

    /// Fail with `UnsortedIndex` unless the values at `rows` never decrease
    pub fn check_sorted<I: IntoIterator<Item = usize>>(&self, rows: I) -> Result<()> {
        let mut previous: Option<i64> = None;
        for row in rows {
            let v = self.values[row];
            if previous.map_or(false, |p| v < p) {
                return Err(Error::UnsortedIndex {
                    column: self.name.clone(),
                    row,
                });
            }
            previous = Some(v);
        }
        Ok(())
    }

    /// Convert ticks back to a value of the index column's type
    pub fn to_value(&self, ticks: i64) -> DataValue {
        match &self.dtype {
            DataType::Date => DataValue::Date(ticks.div_euclid(MS_PER_DAY) as i32),
            DataType::Datetime(tu) => DataValue::Datetime(ticks, *tu),
            _ => DataValue::Int64(ticks),
        }
    }

    /// Build a column of the index type from optional ticks
    pub fn column_from(&self, ticks: &[Option<i64>]) -> Result<Column> {
        let values = ticks
            .iter()
            .map(|t| t.map_or(DataValue::Null, |t| self.to_value(t)))
            .collect();
        Column::from_values(&self.dtype, values)
    }
}
