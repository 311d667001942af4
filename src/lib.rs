#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_lifetimes)]

// Core data structures and the crate-wide error type
pub mod core;

// Column storage
pub mod column;
pub mod dataframe;

// Expressions evaluated against tables and groups
pub mod expr;

// Grouping engine
pub mod groupby;

// Durations and window boundaries
pub mod temporal;

// Runtime configuration
pub mod config;

// Indexed parallel helpers
pub mod parallel;

/// Row position inside a table
pub type IdxSize = u32;

// Re-export core types
pub use crate::core::column::{DataType, TimeUnit};
pub use crate::core::data_value::DataValue;
pub use crate::core::error::{Error, Result};

pub use column::Column;
pub use dataframe::DataFrame;

pub use expr::{all, col, count, lit, AggFunc, Expr, QuantileInterpolation};

pub use groupby::{
    DynamicOptions, GroupBy, GroupIndexTable, GroupIter, GroupKey, GroupsProxy, RollingOptions,
};

pub use temporal::{Duration, StartBy, WindowClosed};

pub use config::{global_config, set_global_config, GroupwiseConfig};
