//! Per-run shared state, item execution and event publishing.

use std::fmt::Display;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::RunnerConfig;
use crate::error::BatchError;
use crate::fetcher::Fetcher;
use crate::retry::Backoff;
use crate::types::Event;

/// Shared context for a single batch run, reducing parameter passing between policies.
pub(super) struct RunContext<'a, F> {
    pub(super) fetcher: &'a F,
    pub(super) config: &'a RunnerConfig,
    pub(super) event_tx: &'a broadcast::Sender<Event>,
    pub(super) cancel_token: &'a CancellationToken,
    /// Items handed to the collaborator so far
    dispatched: AtomicUsize,
}

impl<'a, F> RunContext<'a, F> {
    pub(super) fn new(
        fetcher: &'a F,
        config: &'a RunnerConfig,
        event_tx: &'a broadcast::Sender<Event>,
        cancel_token: &'a CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            config,
            event_tx,
            cancel_token,
            dispatched: AtomicUsize::new(0),
        }
    }

    /// Publish an event; having no subscribers is not an error
    pub(super) fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    pub(super) fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }

    /// Items allowed in flight for concurrent policies
    pub(super) fn concurrency_limit(&self, total: usize) -> usize {
        self.config
            .max_in_flight
            .map_or(total, |limit| limit.min(total))
            .max(1)
    }

    pub(super) fn cancelled<E>(&self, completed: usize, total: usize) -> BatchError<E> {
        BatchError::Cancelled { completed, total }
    }

    /// Fetch one item, applying the retry policy and publishing per-item events.
    ///
    /// Backoff sleeps happen inside this future, so racing it against the cancel
    /// token interrupts them.
    pub(super) async fn execute_item<I>(
        &self,
        index: usize,
        id: &I,
    ) -> Result<F::Output, F::Error>
    where
        I: Display + Send + Sync,
        F: Fetcher<I>,
        F::Error: Display,
    {
        self.dispatched.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(index, id = %id, "Dispatching item");
        self.emit(Event::ItemDispatched {
            index,
            id: id.to_string(),
        });

        let mut backoff = Backoff::new(&self.config.retry);
        let result = loop {
            let error = match self.fetcher.fetch_one(id).await {
                Ok(value) => break Ok(value),
                Err(error) => error,
            };
            if !self.fetcher.is_retryable(&error) {
                break Err(error);
            }
            let Some(delay) = backoff.next_delay() else {
                break Err(error);
            };

            let attempt = backoff.attempt();
            tracing::warn!(
                index,
                id = %id,
                error = %error,
                attempt,
                max_attempts = self.config.retry.max_attempts,
                delay_ms = delay.as_millis(),
                "Item failed, retrying"
            );
            self.emit(Event::ItemRetrying {
                index,
                id: id.to_string(),
                attempt,
            });
            tokio::time::sleep(delay).await;
        };

        match &result {
            Ok(_) => {
                self.emit(Event::ItemSucceeded {
                    index,
                    id: id.to_string(),
                });
            }
            Err(e) => {
                tracing::debug!(index, id = %id, error = %e, "Item failed");
                self.emit(Event::ItemFailed {
                    index,
                    id: id.to_string(),
                    error: e.to_string(),
                });
            }
        }

        result
    }

    /// Fetch one item of a sequential run, racing it against cancellation and
    /// turning a collaborator error into an abort.
    pub(super) async fn execute_or_abort<I>(
        &self,
        index: usize,
        id: &I,
        total: usize,
    ) -> Result<F::Output, BatchError<F::Error>>
    where
        I: Display + Send + Sync,
        F: Fetcher<I>,
        F::Error: Display,
    {
        let result = tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => return Err(self.cancelled(index, total)),
            result = self.execute_item(index, id) => result,
        };

        result.map_err(|source| BatchError::Aborted {
            index,
            id: id.to_string(),
            attempted: self.dispatched(),
            source,
        })
    }
}
