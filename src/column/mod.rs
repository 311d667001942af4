mod common;
mod list_column;
mod typed_column;

pub use common::{Column, ColumnBuilder};
pub use list_column::ListColumn;
pub use typed_column::{
    BooleanColumn, DateColumn, Float64Column, Int64Column, StringColumn, TypedColumn,
};
