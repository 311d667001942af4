use std::sync::Arc;

use crate::column::common::Column;
use crate::core::column::{BitMask, DataType};
use crate::IdxSize;

/// Variable-length lists stored as offsets into one flat child column.
///
/// Row `i` spans `values[offsets[i]..offsets[i + 1]]`.
#[derive(Debug, Clone)]
pub struct ListColumn {
    pub(crate) offsets: Arc<[usize]>,
    pub(crate) values: Box<Column>,
    pub(crate) null_mask: Option<BitMask>,
}

impl ListColumn {
    pub fn new(offsets: Vec<usize>, values: Column, null_mask: Option<BitMask>) -> Self {
        debug_assert!(!offsets.is_empty());
        Self {
            offsets: offsets.into(),
            values: Box::new(values),
            null_mask,
        }
    }

    /// An empty list column of the given inner type
    pub fn empty(inner: &DataType) -> Self {
        Self::new(vec![0], Column::empty(inner), None)
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn inner_dtype(&self) -> DataType {
        self.values.dtype()
    }

    pub fn is_null(&self, index: usize) -> bool {
        self.null_mask
            .as_ref()
            .map_or(false, |m| m.get_unchecked(index))
    }

    pub fn null_count(&self) -> usize {
        self.null_mask.as_ref().map_or(0, |m| m.count_ones())
    }

    /// Flat child column holding every list element
    pub fn values(&self) -> &Column {
        &self.values
    }

    /// Child column for one row
    pub fn row(&self, index: usize) -> Column {
        let start = self.offsets[index];
        let end = self.offsets[index + 1];
        self.values.slice(start, end - start)
    }

    pub fn take(&self, indices: &[IdxSize]) -> Self {
        let mut offsets = Vec::with_capacity(indices.len() + 1);
        let mut child: Vec<IdxSize> = Vec::new();
        let mut nulls = Vec::with_capacity(indices.len());
        offsets.push(0);

        for &i in indices {
            let i = i as usize;
            let (start, end) = (self.offsets[i], self.offsets[i + 1]);
            child.extend((start..end).map(|c| c as IdxSize));
            offsets.push(child.len());
            nulls.push(self.is_null(i));
        }

        Self::new(
            offsets,
            self.values.take(&child),
            BitMask::from_bools_opt(&nulls),
        )
    }
}
