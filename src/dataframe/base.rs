use std::collections::HashMap;

use crate::column::Column;
use crate::core::column::DataType;
use crate::core::data_value::DataValue;
use crate::core::error::{Error, Result};
use crate::IdxSize;

/// DataFrame struct: Column-oriented 2D data structure
///
/// Columns are immutable and reference counted, so cloning a DataFrame or
/// selecting columns out of it never copies the values.
#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    columns: Vec<Column>,
    column_names: Vec<String>,
    column_indices: HashMap<String, usize>,
    row_count: usize,
}

impl DataFrame {
    /// Create a new empty DataFrame
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a DataFrame from named columns
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Column)>) -> Result<Self> {
        let mut df = Self::new();
        for (name, column) in columns {
            df.add_column(name, column)?;
        }
        Ok(df)
    }

    /// Add a column to the DataFrame
    pub fn add_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if self.column_indices.contains_key(&name) {
            return Err(Error::DuplicateColumnName(name));
        }

        if !self.columns.is_empty() && column.len() != self.row_count {
            return Err(Error::InconsistentRowCount {
                expected: self.row_count,
                found: column.len(),
            });
        }

        self.row_count = column.len();
        self.column_indices.insert(name.clone(), self.columns.len());
        self.column_names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Check if the DataFrame contains a column with the given name
    pub fn contains_column(&self, name: &str) -> bool {
        self.column_indices.contains_key(name)
    }

    /// Get a column by name
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.column_indices
            .get(name)
            .map(|&i| &self.columns[i])
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    pub fn column_dtype(&self, name: &str) -> Result<DataType> {
        self.column(name).map(Column::dtype)
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Named columns in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter())
    }

    /// Get the number of rows in the DataFrame
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Values of one row, in column order
    pub fn get_row(&self, row: usize) -> Result<Vec<DataValue>> {
        if row >= self.row_count {
            return Err(Error::IndexOutOfBounds {
                index: row,
                size: self.row_count,
            });
        }
        Ok(self.columns.iter().map(|c| c.value(row)).collect())
    }

    /// Gather rows by position into a new DataFrame
    pub fn take(&self, indices: &[IdxSize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= self.row_count) {
            return Err(Error::IndexOutOfBounds {
                index: bad as usize,
                size: self.row_count,
            });
        }
        Ok(self.map_columns(indices.len(), |c| c.take(indices)))
    }

    /// Contiguous row range
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        let end = (offset + length).min(self.row_count);
        let offset = offset.min(end);
        self.map_columns(end - offset, |c| c.slice(offset, end - offset))
    }

    fn map_columns<F: Fn(&Column) -> Column>(&self, row_count: usize, f: F) -> Self {
        Self {
            columns: self.columns.iter().map(f).collect(),
            column_names: self.column_names.clone(),
            column_indices: self.column_indices.clone(),
            row_count,
        }
    }

    /// Keep only the named columns, in the given order
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let mut df = Self::new();
        for name in names {
            let name = name.as_ref();
            df.add_column(name, self.column(name)?.clone())?;
        }
        Ok(df)
    }

    /// Append the rows of several DataFrames with identical schemas
    pub fn vstack(frames: &[DataFrame]) -> Result<Self> {
        let first = match frames.first() {
            Some(first) => first,
            None => return Ok(Self::new()),
        };

        let mut result = Self::new();
        for (i, name) in first.column_names.iter().enumerate() {
            let mut parts = Vec::with_capacity(frames.len());
            for frame in frames {
                if frame.column_names != first.column_names {
                    return Err(Error::TypeMismatch(format!(
                        "cannot stack frames with columns {:?} and {:?}",
                        first.column_names, frame.column_names
                    )));
                }
                parts.push(&frame.columns[i]);
            }
            result.add_column(name.clone(), Column::concat(&parts)?)?;
        }
        Ok(result)
    }

    /// Schema as (name, type) pairs
    pub fn schema(&self) -> Vec<(String, DataType)> {
        self.iter()
            .map(|(name, col)| (name.to_string(), col.dtype()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        DataFrame::from_columns(vec![
            ("a", Column::from_strs(&["x", "y", "x"])),
            ("b", Column::from_i64(vec![1, 2, 3])),
        ])
        .unwrap()
    }

    #[test]
    fn test_add_column_checks() {
        let mut df = sample();
        assert!(matches!(
            df.add_column("a", Column::from_i64(vec![0, 0, 0])),
            Err(Error::DuplicateColumnName(_))
        ));
        assert!(matches!(
            df.add_column("c", Column::from_i64(vec![0])),
            Err(Error::InconsistentRowCount { expected: 3, found: 1 })
        ));
    }

    #[test]
    fn test_take_and_vstack() {
        let df = sample();
        let picked = df.take(&[2, 0]).unwrap();
        assert_eq!(picked.row_count(), 2);
        assert_eq!(picked.get_row(0).unwrap(), vec!["x".into(), 3.into()]);

        let stacked = DataFrame::vstack(&[df.clone(), picked]).unwrap();
        assert_eq!(stacked.row_count(), 5);
        assert!(df.take(&[3]).is_err());
    }

    #[test]
    fn test_unknown_column() {
        let df = sample();
        assert!(matches!(df.column("zzz"), Err(Error::UnknownColumn(_))));
    }
}
