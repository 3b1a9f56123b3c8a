//! Core types for batch-fetch

use serde::{Deserialize, Serialize};

/// Opaque identifier for one unit of batched work
///
/// The runner is generic over its id type; `TaskId` is a ready-made one for
/// callers whose ids are either integers or strings.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    /// Numeric id
    Int(i64),
    /// String id
    Str(String),
}

impl From<i64> for TaskId {
    fn from(id: i64) -> Self {
        TaskId::Int(id)
    }
}

impl From<i32> for TaskId {
    fn from(id: i32) -> Self {
        TaskId::Int(i64::from(id))
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        TaskId::Str(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        TaskId::Str(id.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskId::Int(id) => write!(f, "{}", id),
            TaskId::Str(id) => write!(f, "{}", id),
        }
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::convert::Infallible;

    /// Numeric strings become [`TaskId::Int`], everything else [`TaskId::Str`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            Ok(n) => TaskId::Int(n),
            Err(_) => TaskId::Str(s.to_string()),
        })
    }
}

/// How a batch is dispatched and how failures are handled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPolicy {
    /// One item in flight; item i+1 starts after item i resolves; first failure aborts
    #[default]
    Sequential,
    /// All items in flight at once; first failure aborts the batch
    Concurrent,
    /// All items in flight at once; every outcome is collected, the batch never fails
    ConcurrentSettled,
    /// Same contract as [`ExecutionPolicy::Sequential`], built as a left fold
    FoldSequential,
}

impl ExecutionPolicy {
    /// All policies, in declaration order
    pub const ALL: [ExecutionPolicy; 4] = [
        ExecutionPolicy::Sequential,
        ExecutionPolicy::Concurrent,
        ExecutionPolicy::ConcurrentSettled,
        ExecutionPolicy::FoldSequential,
    ];

    /// Returns true for policies that keep at most one item in flight
    pub fn is_sequential(&self) -> bool {
        matches!(
            self,
            ExecutionPolicy::Sequential | ExecutionPolicy::FoldSequential
        )
    }

    /// Returns true for policies that collect every outcome instead of aborting
    pub fn settles(&self) -> bool {
        matches!(self, ExecutionPolicy::ConcurrentSettled)
    }

    /// Snake-case name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionPolicy::Sequential => "sequential",
            ExecutionPolicy::Concurrent => "concurrent",
            ExecutionPolicy::ConcurrentSettled => "concurrent_settled",
            ExecutionPolicy::FoldSequential => "fold_sequential",
        }
    }
}

impl std::fmt::Display for ExecutionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExecutionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sequential" | "serial" => Ok(ExecutionPolicy::Sequential),
            "concurrent" => Ok(ExecutionPolicy::Concurrent),
            "concurrent_settled" | "settled" => Ok(ExecutionPolicy::ConcurrentSettled),
            "fold_sequential" | "fold" => Ok(ExecutionPolicy::FoldSequential),
            other => Err(format!("unknown execution policy: {}", other)),
        }
    }
}

/// Result of one item under a settling policy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Outcome<T, E> {
    /// The fetch succeeded
    Success(T),
    /// The fetch failed
    Failure(E),
}

impl<T, E> Outcome<T, E> {
    /// Returns true if this is a [`Outcome::Success`]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Returns true if this is a [`Outcome::Failure`]
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /// Borrow the success value
    pub fn success(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    /// Borrow the failure value
    pub fn failure(&self) -> Option<&E> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(error) => Some(error),
        }
    }

    /// Convert into a standard `Result`
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(error) => Err(error),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(error) => Outcome::Failure(error),
        }
    }
}

/// Counts over a finished batch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Items in the batch
    pub total: usize,
    /// Items that succeeded
    pub succeeded: usize,
    /// Items that failed
    pub failed: usize,
}

/// Result of running a batch, in input order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchReport<T, E> {
    /// Every item succeeded (abort-on-first-error policies)
    Completed(Vec<T>),
    /// Every item's outcome (settling policy)
    Settled(Vec<Outcome<T, E>>),
}

impl<T, E> BatchReport<T, E> {
    /// Empty report of the shape the given policy produces
    pub(crate) fn empty(policy: ExecutionPolicy) -> Self {
        if policy.settles() {
            BatchReport::Settled(Vec::new())
        } else {
            BatchReport::Completed(Vec::new())
        }
    }

    /// Number of items in the report
    pub fn len(&self) -> usize {
        match self {
            BatchReport::Completed(results) => results.len(),
            BatchReport::Settled(outcomes) => outcomes.len(),
        }
    }

    /// Returns true if the batch had no items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Success and failure counts
    pub fn summary(&self) -> BatchSummary {
        match self {
            BatchReport::Completed(results) => BatchSummary {
                total: results.len(),
                succeeded: results.len(),
                failed: 0,
            },
            BatchReport::Settled(outcomes) => {
                let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
                BatchSummary {
                    total: outcomes.len(),
                    succeeded,
                    failed: outcomes.len() - succeeded,
                }
            }
        }
    }

    /// The results of a [`BatchReport::Completed`] report
    pub fn into_results(self) -> Option<Vec<T>> {
        match self {
            BatchReport::Completed(results) => Some(results),
            BatchReport::Settled(_) => None,
        }
    }

    /// Per-item outcomes; a completed report becomes all successes
    pub fn into_outcomes(self) -> Vec<Outcome<T, E>> {
        match self {
            BatchReport::Completed(results) => {
                results.into_iter().map(Outcome::Success).collect()
            }
            BatchReport::Settled(outcomes) => outcomes,
        }
    }
}

/// Event emitted during a batch run
///
/// Published on the runner's broadcast channel; see
/// [`BatchRunner::subscribe`](crate::runner::BatchRunner::subscribe).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A batch started
    BatchStarted {
        /// Policy in use
        policy: ExecutionPolicy,
        /// Items in the batch
        total: usize,
    },

    /// An item was handed to the collaborator
    ItemDispatched {
        /// Input position
        index: usize,
        /// Display form of the id
        id: String,
    },

    /// An item is being retried after a transient failure
    ItemRetrying {
        /// Input position
        index: usize,
        /// Display form of the id
        id: String,
        /// Retry number, starting at 1
        attempt: u32,
    },

    /// An item succeeded
    ItemSucceeded {
        /// Input position
        index: usize,
        /// Display form of the id
        id: String,
    },

    /// An item failed
    ItemFailed {
        /// Input position
        index: usize,
        /// Display form of the id
        id: String,
        /// Error message
        error: String,
    },

    /// The batch stopped on an item failure
    BatchAborted {
        /// Input position of the failing item
        index: usize,
        /// Display form of the failing id
        id: String,
        /// Error message
        error: String,
    },

    /// The batch was cancelled
    BatchCancelled {
        /// Items finished before cancellation
        completed: usize,
        /// Items in the batch
        total: usize,
    },

    /// The batch finished without aborting
    BatchFinished {
        /// Items in the batch
        total: usize,
        /// Items that succeeded
        succeeded: usize,
        /// Items that failed (settling policy only)
        failed: usize,
    },
}
