//! Common test utilities for batch-fetch integration tests

#[allow(dead_code)]
pub mod fixtures;

pub use fixtures::*;
