//! Batch task runner: executes one fetch per id under a selectable policy.
//!
//! Split into focused submodules:
//! - [`context`] - Per-run shared state, item execution, event publishing
//! - [`sequential`] - `Sequential` (explicit loop) and `FoldSequential` (left fold)
//! - [`concurrent`] - `Concurrent` (abort on first error) and `ConcurrentSettled`

mod concurrent;
mod context;
mod sequential;


use std::fmt::Display;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::RunnerConfig;
use crate::error::{BatchError, Result};
use crate::fetcher::Fetcher;
use crate::types::{BatchReport, Event, ExecutionPolicy};

use context::RunContext;

/// Report or error produced by one batch run
pub type BatchResult<T, E> = std::result::Result<BatchReport<T, E>, BatchError<E>>;

/// Runs batches of fetches against one collaborator.
///
/// A runner holds its collaborator, configuration, event channel and cancellation
/// token; it keeps nothing between runs, so each [`BatchRunner::run`] produces a
/// fresh report.
///
/// ```no_run
/// use batch_fetch::{BatchRunner, ExecutionPolicy, fetcher::fn_fetcher};
///
/// # async fn example() {
/// let runner = BatchRunner::new(fn_fetcher(|id: u32| async move { Ok::<_, String>(id) }));
/// let report = runner.run(&[1, 2, 3], ExecutionPolicy::ConcurrentSettled).await;
/// # }
/// ```
pub struct BatchRunner<F> {
    fetcher: F,
    config: RunnerConfig,
    event_tx: broadcast::Sender<Event>,
    cancel_token: CancellationToken,
}

impl<F> BatchRunner<F> {
    /// Create a runner with the default configuration (no retries, unbounded concurrency)
    pub fn new(fetcher: F) -> Self {
        Self::build(fetcher, RunnerConfig::default())
    }

    /// Create a runner with a validated configuration
    pub fn with_config(fetcher: F, config: RunnerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(fetcher, config))
    }

    fn build(fetcher: F, config: RunnerConfig) -> Self {
        let (event_tx, _rx) = broadcast::channel(config.event_capacity.max(1));
        Self {
            fetcher,
            config,
            event_tx,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Replace the runner's cancellation token, e.g. with a child of an application-wide one
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Token that cancels in-progress and future runs of this runner
    ///
    /// Cancellation is permanent for the token; install a fresh one with
    /// [`BatchRunner::with_cancel_token`] to run again.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Subscribe to lifecycle events of subsequent runs
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Active configuration
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// The wrapped collaborator
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Run a batch under the configured default policy
    pub async fn run_default<I>(&self, ids: &[I]) -> BatchResult<F::Output, F::Error>
    where
        I: Display + Send + Sync,
        F: Fetcher<I>,
        F::Error: Display,
    {
        self.run(ids, self.config.policy).await
    }

    /// Fetch every id under `policy`, returning results in input order.
    ///
    /// `Sequential`, `FoldSequential` and `Concurrent` fail with
    /// [`BatchError::Aborted`] on the first collaborator error. `ConcurrentSettled`
    /// only fails when cancelled. Any policy fails with [`BatchError::Cancelled`]
    /// once the runner's token is cancelled.
    pub async fn run<I>(
        &self,
        ids: &[I],
        policy: ExecutionPolicy,
    ) -> BatchResult<F::Output, F::Error>
    where
        I: Display + Send + Sync,
        F: Fetcher<I>,
        F::Error: Display,
    {
        let total = ids.len();
        let ctx = RunContext::new(
            &self.fetcher,
            &self.config,
            &self.event_tx,
            &self.cancel_token,
        );

        tracing::debug!(policy = %policy, total, "Starting batch");
        ctx.emit(Event::BatchStarted { policy, total });

        if ids.is_empty() {
            ctx.emit(Event::BatchFinished {
                total: 0,
                succeeded: 0,
                failed: 0,
            });
            return Ok(BatchReport::empty(policy));
        }

        let result = match policy {
            ExecutionPolicy::Sequential => sequential::run_sequential(&ctx, ids)
                .await
                .map(BatchReport::Completed),
            ExecutionPolicy::FoldSequential => sequential::run_fold_sequential(&ctx, ids)
                .await
                .map(BatchReport::Completed),
            ExecutionPolicy::Concurrent => concurrent::run_concurrent(&ctx, ids)
                .await
                .map(BatchReport::Completed),
            ExecutionPolicy::ConcurrentSettled => concurrent::run_concurrent_settled(&ctx, ids)
                .await
                .map(BatchReport::Settled),
        };

        match &result {
            Ok(report) => {
                let summary = report.summary();
                tracing::info!(
                    policy = %policy,
                    total = summary.total,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    "Batch finished"
                );
                ctx.emit(Event::BatchFinished {
                    total: summary.total,
                    succeeded: summary.succeeded,
                    failed: summary.failed,
                });
            }
            Err(BatchError::Aborted {
                index, id, source, ..
            }) => {
                tracing::warn!(policy = %policy, index, id = %id, error = %source, "Batch aborted");
                ctx.emit(Event::BatchAborted {
                    index: *index,
                    id: id.clone(),
                    error: source.to_string(),
                });
            }
            Err(BatchError::Cancelled { completed, total }) => {
                tracing::info!(policy = %policy, completed, total, "Batch cancelled");
                ctx.emit(Event::BatchCancelled {
                    completed: *completed,
                    total: *total,
                });
            }
        }

        result
    }
}

/// Fetch every id under `policy` with reference semantics: no retries, no bound
/// on concurrency, no cancellation and no event subscribers.
pub async fn run<I, F>(
    ids: &[I],
    fetcher: F,
    policy: ExecutionPolicy,
) -> BatchResult<F::Output, F::Error>
where
    I: Display + Send + Sync,
    F: Fetcher<I>,
    F::Error: Display,
{
    BatchRunner::new(fetcher).run(ids, policy).await
}
