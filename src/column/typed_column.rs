use std::sync::Arc;

use crate::core::column::BitMask;
use crate::core::error::{Error, Result};
use crate::IdxSize;

/// Fixed-type column storage shared by every scalar logical type.
///
/// Null slots hold `T::default()` and are flagged in `null_mask`.
#[derive(Debug, Clone)]
pub struct TypedColumn<T> {
    pub(crate) data: Arc<[T]>,
    pub(crate) null_mask: Option<BitMask>,
}

/// Structure representing an Int64 column
pub type Int64Column = TypedColumn<i64>;
/// Structure representing a Float64 column
pub type Float64Column = TypedColumn<f64>;
/// Structure representing a Boolean column
pub type BooleanColumn = TypedColumn<bool>;
/// Structure representing a String column
pub type StringColumn = TypedColumn<String>;
/// Days since 1970-01-01
pub type DateColumn = TypedColumn<i32>;

impl<T: Clone + Default> TypedColumn<T> {
    /// Create a new column without NULL values
    pub fn new(data: Vec<T>) -> Self {
        Self {
            data: data.into(),
            null_mask: None,
        }
    }

    /// Create a column from optional values, `None` becomes NULL
    pub fn from_options(values: Vec<Option<T>>) -> Self {
        let mut nulls = Vec::with_capacity(values.len());
        let data: Vec<T> = values
            .into_iter()
            .map(|v| {
                nulls.push(v.is_none());
                v.unwrap_or_default()
            })
            .collect();

        Self {
            data: data.into(),
            null_mask: BitMask::from_bools_opt(&nulls),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn is_null(&self, index: usize) -> bool {
        match &self.null_mask {
            Some(mask) => mask.get_unchecked(index),
            None => false,
        }
    }

    pub fn null_count(&self) -> usize {
        self.null_mask.as_ref().map_or(0, |m| m.count_ones())
    }

    /// Get data at the specified index
    pub fn get(&self, index: usize) -> Result<Option<&T>> {
        if index >= self.data.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                size: self.data.len(),
            });
        }
        Ok(self.get_unchecked(index))
    }

    #[inline]
    pub(crate) fn get_unchecked(&self, index: usize) -> Option<&T> {
        if self.is_null(index) {
            None
        } else {
            Some(&self.data[index])
        }
    }

    /// Raw value slice; NULL slots contain the default value
    pub fn values(&self) -> &[T] {
        &self.data
    }

    /// Gather rows by position
    pub fn take(&self, indices: &[IdxSize]) -> Self {
        let data: Vec<T> = indices
            .iter()
            .map(|&i| self.data[i as usize].clone())
            .collect();
        let null_mask = self.null_mask.as_ref().and_then(|mask| {
            let nulls: Vec<bool> = indices
                .iter()
                .map(|&i| mask.get_unchecked(i as usize))
                .collect();
            BitMask::from_bools_opt(&nulls)
        });
        Self {
            data: data.into(),
            null_mask,
        }
    }

    /// Contiguous sub-range of the column
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        let end = (offset + length).min(self.data.len());
        let offset = offset.min(end);
        let data: Vec<T> = self.data[offset..end].to_vec();
        let null_mask = self.null_mask.as_ref().and_then(|mask| {
            let nulls: Vec<bool> = (offset..end).map(|i| mask.get_unchecked(i)).collect();
            BitMask::from_bools_opt(&nulls)
        });
        Self {
            data: data.into(),
            null_mask,
        }
    }

    /// Appends the rows of `others` after the rows of `self`
    pub fn concat<'a, I>(&self, others: I) -> Self
    where
        T: 'a,
        I: IntoIterator<Item = &'a TypedColumn<T>>,
    {
        let mut data: Vec<T> = self.data.to_vec();
        let mut nulls: Vec<bool> = (0..self.len()).map(|i| self.is_null(i)).collect();
        for other in others {
            data.extend(other.data.iter().cloned());
            nulls.extend((0..other.len()).map(|i| other.is_null(i)));
        }
        Self {
            data: data.into(),
            null_mask: BitMask::from_bools_opt(&nulls),
        }
    }

    /// Iterate over the values with NULL as `None`
    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        (0..self.len()).map(move |i| self.get_unchecked(i))
    }
}
