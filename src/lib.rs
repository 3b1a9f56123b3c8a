//! # batch-fetch
//!
//! Ordered asynchronous batch execution: fetch N independent items through one
//! injected collaborator under a selectable policy.
//!
//! ## Policies
//!
//! - **Sequential** - one item in flight, abort on the first error
//! - **FoldSequential** - the same contract, built as a left fold over the ids
//! - **Concurrent** - every item in flight, abort on the first error
//! - **ConcurrentSettled** - every item in flight, every outcome collected
//!
//! Whatever the policy, results come back in input order.
//!
//! ## Quick Start
//!
//! ```no_run
//! use batch_fetch::{BatchReport, ExecutionPolicy, HttpConfig, HttpJsonFetcher, run};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher: HttpJsonFetcher = HttpJsonFetcher::new(&HttpConfig::default())?;
//!     let ids: Vec<u32> = (1..=10).collect();
//!
//!     match run(&ids, fetcher, ExecutionPolicy::ConcurrentSettled).await? {
//!         BatchReport::Settled(outcomes) => println!("{} outcomes", outcomes.len()),
//!         BatchReport::Completed(posts) => println!("{} posts", posts.len()),
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Collaborator seam
pub mod fetcher;
/// HTTP JSON collaborator
pub mod http;
/// Retry logic with exponential backoff
pub mod retry;
/// Batch runner and execution policies
pub mod runner;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{HttpConfig, RetryConfig, RunnerConfig};
pub use error::{BatchError, Error, FetchError, Result};
pub use fetcher::{FnFetcher, Fetcher, fn_fetcher};
pub use http::HttpJsonFetcher;
pub use retry::{IsRetryable, fetch_with_retry};
pub use runner::{BatchResult, BatchRunner, run};
pub use types::{BatchReport, BatchSummary, Event, ExecutionPolicy, Outcome, TaskId};
