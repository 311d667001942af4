// Core data structures shared by the column layer and the grouping engine
pub mod column;
pub mod data_value;
pub mod error;

// Re-exports for convenience
pub use column::{BitMask, DataType, TimeUnit};
pub use data_value::DataValue;
pub use error::{Error, Result};
