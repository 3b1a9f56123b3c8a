//! Sequential policies: one item in flight, in input order, abort on first error.

use std::fmt::Display;

use futures::stream::{self, TryStreamExt};

use crate::error::BatchError;
use crate::fetcher::Fetcher;

use super::context::RunContext;

/// Await each item before dispatching the next.
pub(super) async fn run_sequential<I, F>(
    ctx: &RunContext<'_, F>,
    ids: &[I],
) -> Result<Vec<F::Output>, BatchError<F::Error>>
where
    I: Display + Send + Sync,
    F: Fetcher<I>,
    F::Error: Display,
{
    let total = ids.len();
    let mut results = Vec::with_capacity(total);

    for (index, id) in ids.iter().enumerate() {
        let value = ctx.execute_or_abort(index, id, total).await?;
        results.push(value);
    }

    Ok(results)
}

/// Same contract as [`run_sequential`], expressed as a left fold: each step first
/// waits for the accumulated chain, then fetches its own item.
pub(super) async fn run_fold_sequential<I, F>(
    ctx: &RunContext<'_, F>,
    ids: &[I],
) -> Result<Vec<F::Output>, BatchError<F::Error>>
where
    I: Display + Send + Sync,
    F: Fetcher<I>,
    F::Error: Display,
{
    let total = ids.len();

    stream::iter(ids.iter().enumerate().map(Ok::<_, BatchError<F::Error>>))
        .try_fold(Vec::with_capacity(total), |mut acc, (index, id)| async move {
            let value = ctx.execute_or_abort(index, id, total).await?;
            acc.push(value);
            Ok::<_, BatchError<F::Error>>(acc)
        })
        .await
}
