use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// Resolution of a `Datetime` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
}

impl TimeUnit {
    /// Number of nanoseconds in one tick of this unit
    pub fn nanos_per_tick(&self) -> i64 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUnit::Nanoseconds => write!(f, "ns"),
            TimeUnit::Microseconds => write!(f, "us"),
            TimeUnit::Milliseconds => write!(f, "ms"),
        }
    }
}

/// Logical type of a column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int64,
    Float64,
    Boolean,
    String,
    /// Days since 1970-01-01
    Date,
    /// Ticks since the unix epoch
    Datetime(TimeUnit),
    List(Box<DataType>),
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::Datetime(_))
    }

    /// Whether values of this type can be compared for equality when used as a key
    pub fn is_hashable(&self) -> bool {
        !matches!(self, DataType::List(_))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int64 => write!(f, "i64"),
            DataType::Float64 => write!(f, "f64"),
            DataType::Boolean => write!(f, "bool"),
            DataType::String => write!(f, "str"),
            DataType::Date => write!(f, "date"),
            DataType::Datetime(tu) => write!(f, "datetime[{}]", tu),
            DataType::List(inner) => write!(f, "list[{}]", inner),
        }
    }
}

/// Bitmask to track NULL values. A set bit marks a null slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMask {
    pub(crate) data: Arc<[u8]>,
    pub(crate) len: usize,
}

impl BitMask {
    /// Creates a bitmask from a vector of boolean values
    pub fn from_bools(bools: &[bool]) -> Self {
        let length = bools.len();
        let bytes_needed = (length + 7) / 8;
        let mut data = vec![0u8; bytes_needed];

        for (i, &is_set) in bools.iter().enumerate() {
            if is_set {
                data[i / 8] |= 1 << (i % 8);
            }
        }

        Self {
            data: data.into(),
            len: length,
        }
    }

    /// Builds a mask only when at least one slot is set
    pub fn from_bools_opt(bools: &[bool]) -> Option<Self> {
        if bools.iter().any(|&b| b) {
            Some(Self::from_bools(bools))
        } else {
            None
        }
    }

    /// Checks if a bit is set
    pub fn get(&self, index: usize) -> Result<bool> {
        if index >= self.len {
            return Err(Error::IndexOutOfBounds {
                index,
                size: self.len,
            });
        }
        Ok(self.get_unchecked(index))
    }

    #[inline]
    pub(crate) fn get_unchecked(&self, index: usize) -> bool {
        (self.data[index / 8] & (1 << (index % 8))) != 0
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        (0..self.len).filter(|&i| self.get_unchecked(i)).count()
    }

    /// Returns the length of the bitmask
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
