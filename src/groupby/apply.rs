//! User callbacks over whole sub-tables

use crate::config::GroupwiseConfig;
use crate::core::error::Result;
use crate::dataframe::DataFrame;
use crate::groupby::groups::GroupIndexTable;

/// Call `f` once per group, in group order, and stack the returned tables.
///
/// The callback runs on the caller's thread. With no groups the result is the
/// source schema with zero rows.
pub(crate) fn apply<F>(
    df: &DataFrame,
    table: &GroupIndexTable,
    config: &GroupwiseConfig,
    mut f: F,
) -> Result<DataFrame>
where
    F: FnMut(DataFrame) -> Result<DataFrame>,
{
    if config.logging.enabled(log::Level::Debug) {
        log::debug!("applying callback to {} groups", table.len());
    }

    let mut parts = Vec::with_capacity(table.len());
    for group in table.groups.iter() {
        let sub = df.take(&group.to_vec())?;
        parts.push(f(sub)?);
    }

    if parts.is_empty() {
        return Ok(df.slice(0, 0));
    }
    DataFrame::vstack(&parts)
}
