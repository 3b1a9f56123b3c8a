//! Concurrent policies: all items in flight, results slotted back by input position.

use std::fmt::Display;

use futures::stream::{self, StreamExt};

use crate::error::BatchError;
use crate::fetcher::Fetcher;
use crate::types::Outcome;

use super::context::RunContext;

/// Dispatch every item at once and fail on the first error.
///
/// Items still in flight when an error arrives are dropped with the stream, so
/// their collaborator futures stop at their next suspension point.
pub(super) async fn run_concurrent<I, F>(
    ctx: &RunContext<'_, F>,
    ids: &[I],
) -> Result<Vec<F::Output>, BatchError<F::Error>>
where
    I: Display + Send + Sync,
    F: Fetcher<I>,
    F::Error: Display,
{
    let total = ids.len();
    let mut slots: Vec<Option<F::Output>> = std::iter::repeat_with(|| None).take(total).collect();
    let mut completed = 0;

    let mut in_flight = stream::iter(ids.iter().enumerate())
        .map(|(index, id)| async move { (index, ctx.execute_item(index, id).await) })
        .buffer_unordered(ctx.concurrency_limit(total));

    loop {
        let next = tokio::select! {
            biased;
            _ = ctx.cancel_token.cancelled() => return Err(ctx.cancelled(completed, total)),
            next = in_flight.next() => next,
        };
        let Some((index, result)) = next else { break };
        completed += 1;

        match result {
            Ok(value) => slots[index] = Some(value),
            Err(source) => {
                let in_flight_count = ctx.dispatched().saturating_sub(completed);
                if in_flight_count > 0 {
                    tracing::debug!(
                        index,
                        in_flight = in_flight_count,
                        "Dropping in-flight items after failure"
                    );
                }
                return Err(BatchError::Aborted {
                    index,
                    id: ids[index].to_string(),
                    attempted: ctx.dispatched(),
                    source,
                });
            }
        }
    }

    debug_assert!(slots.iter().all(Option::is_some));
    Ok(slots.into_iter().flatten().collect())
}

/// Dispatch every item at once and collect every outcome.
///
/// Item failures never fail the batch; only cancellation does.
pub(super) async fn run_concurrent_settled<I, F>(
    ctx: &RunContext<'_, F>,
    ids: &[I],
) -> Result<Vec<Outcome<F::Output, F::Error>>, BatchError<F::Error>>
where
    I: Display + Send + Sync,
    F: Fetcher<I>,
    F::Error: Display,
{
    let total = ids.len();
    let mut slots: Vec<Option<Outcome<F::Output, F::Error>>> =
        std::iter::repeat_with(|| None).take(total).collect();
    let mut completed = 0;

    let mut in_flight = stream::iter(ids.iter().enumerate())
        .map(|(index, id)| async move { (index, ctx.execute_item(index, id).await) })
        .buffer_unordered(ctx.concurrency_limit(total));

    loop {
        let next = tokio::select! {
            biased;
            _ = ctx.cancel_token.cancelled() => return Err(ctx.cancelled(completed, total)),
            next = in_flight.next() => next,
        };
        let Some((index, result)) = next else { break };
        completed += 1;
        slots[index] = Some(Outcome::from(result));
    }

    debug_assert!(slots.iter().all(Option::is_some));
    Ok(slots.into_iter().flatten().collect())
}
