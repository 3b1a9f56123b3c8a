//! HTTP JSON collaborator: `GET {base_url}/{id}` and decode the body.

use std::fmt::Display;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use url::Url;

use crate::config::HttpConfig;
use crate::error::{FetchError, Result};
use crate::fetcher::Fetcher;
use crate::retry::IsRetryable;

/// Production [`Fetcher`] that requests one REST resource per id.
///
/// The id's `Display` form is percent-encoded and appended to the base URL's path
/// as its last segment; any query string on the base URL is kept. A non-2xx status becomes [`FetchError::Status`]; a body that
/// does not decode as `T` becomes [`FetchError::Decode`].
pub struct HttpJsonFetcher<T = serde_json::Value> {
    client: reqwest::Client,
    base_url: Url,
    _output: PhantomData<fn() -> T>,
}

impl<T> HttpJsonFetcher<T> {
    /// Build a fetcher from configuration
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Self::with_client(client, &config.base_url)
    }

    /// Build a fetcher around an existing client
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(crate::error::Error::config(
                "base_url",
                format!("{} cannot be used as a base URL", base_url),
            ));
        }
        Ok(Self {
            client,
            base_url,
            _output: PhantomData,
        })
    }

    /// URL requested for `id`
    pub fn url_for(&self, id: &impl Display) -> String {
        self.request_url(id).into()
    }

    fn request_url(&self, id: &impl Display) -> Url {
        let mut url = self.base_url.clone();
        // Only fails for cannot-be-a-base URLs, which `with_client` rejects
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&id.to_string());
        }
        url
    }
}

#[async_trait::async_trait]
impl<I, T> Fetcher<I> for HttpJsonFetcher<T>
where
    I: Display + Send + Sync,
    T: DeserializeOwned + Send,
{
    type Output = T;
    type Error = FetchError;

    async fn fetch_one(&self, id: &I) -> std::result::Result<T, FetchError> {
        let url = self.request_url(id);
        tracing::debug!(id = %id, url = %url, "Fetching resource");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(id = %id, status = status.as_u16(), "Resource request failed");
            return Err(FetchError::Status {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            id: id.to_string(),
            source,
        })
    }

    fn is_retryable(&self, error: &FetchError) -> bool {
        IsRetryable::is_retryable(error)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_appends_id_as_last_segment() {
        let fetcher: HttpJsonFetcher =
            HttpJsonFetcher::with_client(reqwest::Client::new(), "https://example.com/posts/")
                .unwrap();

        assert_eq!(fetcher.url_for(&7), "https://example.com/posts/7");
    }

    #[test]
    fn url_encodes_string_ids() {
        let fetcher: HttpJsonFetcher =
            HttpJsonFetcher::with_client(reqwest::Client::new(), "https://example.com/items")
                .unwrap();

        assert_eq!(
            fetcher.url_for(&"a b/c"),
            "https://example.com/items/a%20b%2Fc"
        );
    }

    #[test]
    fn url_keeps_base_query_after_id() {
        let fetcher: HttpJsonFetcher = HttpJsonFetcher::with_client(
            reqwest::Client::new(),
            "https://example.com/posts?api_key=abc",
        )
        .unwrap();

        assert_eq!(fetcher.url_for(&7), "https://example.com/posts/7?api_key=abc");
        assert_eq!(
            fetcher.url_for(&"a b"),
            "https://example.com/posts/a%20b?api_key=abc"
        );
    }

    #[test]
    fn url_on_bare_host_has_single_slash() {
        let fetcher: HttpJsonFetcher =
            HttpJsonFetcher::with_client(reqwest::Client::new(), "https://example.com").unwrap();

        assert_eq!(fetcher.url_for(&3), "https://example.com/3");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result: Result<HttpJsonFetcher> =
            HttpJsonFetcher::with_client(reqwest::Client::new(), "not a url");
        assert!(matches!(result, Err(crate::error::Error::InvalidUrl(_))));
    }

    #[test]
    fn non_hierarchical_base_url_is_rejected() {
        let result: Result<HttpJsonFetcher> =
            HttpJsonFetcher::with_client(reqwest::Client::new(), "mailto:someone@example.com");
        assert!(matches!(
            result,
            Err(crate::error::Error::Config { .. })
        ));
    }

    #[test]
    fn builds_from_default_config() {
        let fetcher: HttpJsonFetcher = HttpJsonFetcher::new(&HttpConfig::default()).unwrap();
        assert_eq!(
            fetcher.url_for(&1),
            "https://jsonplaceholder.typicode.com/posts/1"
        );
    }
}
