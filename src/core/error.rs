use thiserror::Error;

/// Error type definitions
#[derive(Error, Debug)]
pub enum Error {
    /// A key expression does not resolve to a column or a computable expression
    #[error("Invalid grouping key: {0}")]
    InvalidGroupingKey(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Index column '{column}' is not sorted in ascending order (row {row})")]
    UnsortedIndex { column: String, row: usize },

    #[error("Index column '{0}' contains null values")]
    NullIndex(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid start_by rule: {0}")]
    InvalidStartBy(String),

    #[error("Column not found: {0}")]
    UnknownColumn(String),

    #[error("Cannot apply '{func}' to column '{column}' of type {dtype}")]
    AggregationTypeError {
        func: &'static str,
        column: String,
        dtype: String,
    },

    /// `apply` was requested on a grouping that cannot hand out sub-tables by name
    #[error("Callback signature error: {0}")]
    CallbackSignatureError(String),

    #[error("Duplicate column name: {0}")]
    DuplicateColumnName(String),

    #[error("Inconsistent row count: expected {expected}, found {found}")]
    InconsistentRowCount { expected: usize, found: usize },

    #[error("Index out of bounds: index {index}, size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("IO error")]
    Io(#[source] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::ConfigurationError(format!("YAML: {}", err))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigurationError(format!("TOML: {}", err))
    }
}

impl Error {
    /// Shorthand for an aggregation type error
    pub(crate) fn agg_type(func: &'static str, column: &str, dtype: impl ToString) -> Self {
        Error::AggregationTypeError {
            func,
            column: column.to_string(),
            dtype: dtype.to_string(),
        }
    }
}
