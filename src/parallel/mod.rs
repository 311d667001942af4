//! Module providing parallel processing functionality
//!
//! Every helper here fans work out over the rayon pool and fans results back
//! in by position, so output order never depends on completion order.

use rayon::prelude::*;

use crate::core::error::Result;

/// Evaluate `f(i)` for every `i` in `0..n`, in parallel when `parallel` is set.
///
/// Results are returned in index order. Any error aborts the whole map.
pub fn map_indexed<R, F>(n: usize, parallel: bool, f: F) -> Result<Vec<R>>
where
    R: Send,
    F: Fn(usize) -> Result<R> + Send + Sync,
{
    if parallel && n > 1 {
        (0..n).into_par_iter().map(f).collect()
    } else {
        (0..n).map(f).collect()
    }
}

/// Infallible variant of [`map_indexed`]
pub fn collect_indexed<R, F>(n: usize, parallel: bool, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Send + Sync,
{
    if parallel && n > 1 {
        (0..n).into_par_iter().map(f).collect()
    } else {
        (0..n).map(f).collect()
    }
}
