//! Iteration over `(key, sub-table)` pairs

use std::fmt;

use crate::core::data_value::DataValue;
use crate::core::error::Result;
use crate::dataframe::DataFrame;
use crate::groupby::groups::GroupIndexTable;
use crate::groupby::GroupBy;

/// Key of one group: a bare value for single-column keys, a tuple otherwise
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Single(DataValue),
    Tuple(Vec<DataValue>),
}

impl GroupKey {
    pub fn values(&self) -> Vec<DataValue> {
        match self {
            GroupKey::Single(v) => vec![v.clone()],
            GroupKey::Tuple(vs) => vs.clone(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Single(v) => write!(f, "{}", v),
            GroupKey::Tuple(vs) => {
                write!(f, "(")?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
        }
    }
}

enum IterState {
    Uninitialized,
    Ready {
        table: GroupIndexTable,
        /// Positions of the key columns that form the iteration key
        key_columns: Vec<usize>,
        cursor: usize,
    },
    Exhausted,
}

/// Single-pass cursor over the groups of a [`GroupBy`].
///
/// Groups are materialized on the first step (or by [`GroupIter::init`]) and
/// yielded in the same order `agg` emits its rows.
pub struct GroupIter<'a> {
    groupby: &'a GroupBy<'a>,
    state: IterState,
}

impl<'a> GroupIter<'a> {
    /// A cursor that has not computed its groups yet
    pub fn new(groupby: &'a GroupBy<'a>) -> Self {
        Self {
            groupby,
            state: IterState::Uninitialized,
        }
    }

    /// Materialize the groups; a no-op unless the cursor is uninitialized
    pub fn init(&mut self) -> Result<()> {
        if let IterState::Uninitialized = self.state {
            match self.groupby.materialize() {
                Ok(table) => {
                    let key_columns = self.groupby.iteration_key_positions(&table);
                    self.state = IterState::Ready {
                        table,
                        key_columns,
                        cursor: 0,
                    };
                }
                Err(e) => {
                    self.state = IterState::Exhausted;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        !matches!(self.state, IterState::Uninitialized)
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, IterState::Exhausted)
    }
}

impl Iterator for GroupIter<'_> {
    type Item = Result<(GroupKey, DataFrame)>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Err(e) = self.init() {
            return Some(Err(e));
        }

        let (table, key_columns, cursor) = match &mut self.state {
            IterState::Ready {
                table,
                key_columns,
                cursor,
            } => (table, key_columns, cursor),
            _ => return None,
        };

        if *cursor >= table.len() {
            self.state = IterState::Exhausted;
            return None;
        }

        let g = *cursor;
        *cursor += 1;

        let mut values: Vec<DataValue> = key_columns
            .iter()
            .map(|&c| table.keys.columns()[c].value(g))
            .collect();
        let key = if values.len() == 1 {
            GroupKey::Single(values.remove(0))
        } else {
            GroupKey::Tuple(values)
        };

        let rows = table.groups.get(g).to_vec();
        Some(self.groupby.source().take(&rows).map(|sub| (key, sub)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.state {
            IterState::Ready { table, cursor, .. } => {
                let remaining = table.len().saturating_sub(*cursor);
                (remaining, Some(remaining))
            }
            IterState::Uninitialized => (0, None),
            IterState::Exhausted => (0, Some(0)),
        }
    }
}
