use std::ops::Range;

use crate::dataframe::DataFrame;
use crate::IdxSize;

/// Per-group row positions.
///
/// Key grouping produces explicit index lists; windows over a contiguous sorted
/// index are stored as `[first, len]` slices of the source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupsProxy {
    Idx(Vec<Vec<IdxSize>>),
    Slice(Vec<[IdxSize; 2]>),
}

/// Row positions of one group
#[derive(Debug, Clone, Copy)]
pub enum GroupRows<'a> {
    Idx(&'a [IdxSize]),
    Slice { first: IdxSize, len: IdxSize },
}

impl<'a> GroupRows<'a> {
    pub fn len(&self) -> usize {
        match self {
            GroupRows::Idx(idx) => idx.len(),
            GroupRows::Slice { len, .. } => *len as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn first(&self) -> Option<IdxSize> {
        match self {
            GroupRows::Idx(idx) => idx.first().copied(),
            GroupRows::Slice { first, len } => (*len > 0).then_some(*first),
        }
    }

    pub fn last(&self) -> Option<IdxSize> {
        match self {
            GroupRows::Idx(idx) => idx.last().copied(),
            GroupRows::Slice { first, len } => (*len > 0).then(|| first + len - 1),
        }
    }

    pub fn iter(&self) -> GroupRowsIter<'a> {
        match *self {
            GroupRows::Idx(idx) => GroupRowsIter::Idx(idx.iter()),
            GroupRows::Slice { first, len } => GroupRowsIter::Slice(first..first + len),
        }
    }

    pub fn to_vec(&self) -> Vec<IdxSize> {
        self.iter().collect()
    }
}

pub enum GroupRowsIter<'a> {
    Idx(std::slice::Iter<'a, IdxSize>),
    Slice(Range<IdxSize>),
}

impl Iterator for GroupRowsIter<'_> {
    type Item = IdxSize;

    fn next(&mut self) -> Option<IdxSize> {
        match self {
            GroupRowsIter::Idx(it) => it.next().copied(),
            GroupRowsIter::Slice(range) => range.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            GroupRowsIter::Idx(it) => it.size_hint(),
            GroupRowsIter::Slice(range) => range.size_hint(),
        }
    }
}

impl GroupsProxy {
    pub fn len(&self) -> usize {
        match self {
            GroupsProxy::Idx(groups) => groups.len(),
            GroupsProxy::Slice(groups) => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows of group `i`; the caller guarantees `i < len()`
    pub fn get(&self, i: usize) -> GroupRows<'_> {
        match self {
            GroupsProxy::Idx(groups) => GroupRows::Idx(&groups[i]),
            GroupsProxy::Slice(groups) => GroupRows::Slice {
                first: groups[i][0],
                len: groups[i][1],
            },
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = GroupRows<'_>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// Group sizes in group order
    pub fn sizes(&self) -> Vec<usize> {
        self.iter().map(|g| g.len()).collect()
    }

    /// Every group cut down to its first `n` rows
    pub fn head(&self, n: usize) -> GroupsProxy {
        self.cut(n, true)
    }

    /// Every group cut down to its last `n` rows
    pub fn tail(&self, n: usize) -> GroupsProxy {
        self.cut(n, false)
    }

    fn cut(&self, n: usize, from_front: bool) -> GroupsProxy {
        match self {
            GroupsProxy::Idx(groups) => GroupsProxy::Idx(
                groups
                    .iter()
                    .map(|g| {
                        let keep = n.min(g.len());
                        if from_front {
                            g[..keep].to_vec()
                        } else {
                            g[g.len() - keep..].to_vec()
                        }
                    })
                    .collect(),
            ),
            GroupsProxy::Slice(groups) => GroupsProxy::Slice(
                groups
                    .iter()
                    .map(|&[first, len]| {
                        let keep = n.min(len as usize) as IdxSize;
                        if from_front {
                            [first, keep]
                        } else {
                            [first + len - keep, keep]
                        }
                    })
                    .collect(),
            ),
        }
    }
}

/// Materialized groups: one key row per group plus that group's row positions.
///
/// `keys` has exactly `groups.len()` rows and the two are aligned by position.
#[derive(Debug, Clone)]
pub struct GroupIndexTable {
    pub keys: DataFrame,
    pub groups: GroupsProxy,
}

impl GroupIndexTable {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn key_names(&self) -> &[String] {
        self.keys.column_names()
    }
}
