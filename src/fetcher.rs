//! The single-item fetch operation the runner depends on.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Abstraction over fetching one item, enabling testability.
///
/// The runner calls [`Fetcher::fetch_one`] once per id and never inspects `Output`.
/// When retries are enabled it asks [`Fetcher::is_retryable`] whether a failed call
/// is worth repeating; by default no error is.
#[async_trait::async_trait]
pub trait Fetcher<I>: Send + Sync
where
    I: Send + Sync,
{
    /// Decoded result of one successful fetch
    type Output: Send;
    /// Collaborator failure for one id
    type Error: Send;

    /// Fetch the item identified by `id`
    async fn fetch_one(&self, id: &I) -> Result<Self::Output, Self::Error>;

    /// Whether `error` is transient, so the same id may be fetched again
    fn is_retryable(&self, _error: &Self::Error) -> bool {
        false
    }
}

#[async_trait::async_trait]
impl<I, F> Fetcher<I> for Arc<F>
where
    I: Send + Sync,
    F: Fetcher<I> + ?Sized,
{
    type Output = F::Output;
    type Error = F::Error;

    async fn fetch_one(&self, id: &I) -> Result<Self::Output, Self::Error> {
        (**self).fetch_one(id).await
    }

    fn is_retryable(&self, error: &Self::Error) -> bool {
        (**self).is_retryable(error)
    }
}

#[async_trait::async_trait]
impl<I, F> Fetcher<I> for &F
where
    I: Send + Sync,
    F: Fetcher<I> + ?Sized,
{
    type Output = F::Output;
    type Error = F::Error;

    async fn fetch_one(&self, id: &I) -> Result<Self::Output, Self::Error> {
        (**self).fetch_one(id).await
    }

    fn is_retryable(&self, error: &Self::Error) -> bool {
        (**self).is_retryable(error)
    }
}

/// [`Fetcher`] backed by an async closure taking the id by value.
///
/// Built with [`fn_fetcher`]. Errors are never retried unless a classifier is
/// installed with [`FnFetcher::retry_if`].
pub struct FnFetcher<F, I, R> {
    f: F,
    retryable: R,
    _id: PhantomData<fn(I)>,
}

fn never_retry<E>(_: &E) -> bool {
    false
}

/// Wrap `f` so it can be used as a [`Fetcher`]
///
/// ```no_run
/// use batch_fetch::fetcher::fn_fetcher;
///
/// let fetcher = fn_fetcher(|id: u32| async move { Ok::<_, String>(id * 2) });
/// ```
pub fn fn_fetcher<F, I, Fut, T, E>(f: F) -> FnFetcher<F, I, fn(&E) -> bool>
where
    F: Fn(I) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
{
    FnFetcher {
        f,
        retryable: never_retry::<E>,
        _id: PhantomData,
    }
}

impl<F, I, R> FnFetcher<F, I, R> {
    /// Classify errors as transient with `retryable`
    ///
    /// ```no_run
    /// use batch_fetch::fetcher::fn_fetcher;
    /// use batch_fetch::{FetchError, IsRetryable};
    ///
    /// let fetcher = fn_fetcher(|id: u32| async move { Ok::<_, FetchError>(id) })
    ///     .retry_if(FetchError::is_retryable);
    /// ```
    pub fn retry_if<R2>(self, retryable: R2) -> FnFetcher<F, I, R2> {
        FnFetcher {
            f: self.f,
            retryable,
            _id: PhantomData,
        }
    }
}

#[async_trait::async_trait]
impl<F, I, Fut, T, E, R> Fetcher<I> for FnFetcher<F, I, R>
where
    I: Clone + Send + Sync,
    F: Fn(I) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: Send,
    R: Fn(&E) -> bool + Send + Sync,
{
    type Output = T;
    type Error = E;

    async fn fetch_one(&self, id: &I) -> Result<T, E> {
        (self.f)(id.clone()).await
    }

    fn is_retryable(&self, error: &E) -> bool {
        (self.retryable)(error)
    }
}
