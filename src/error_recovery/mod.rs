//! Error recovery helpers for flaky hardware and network reads

pub mod retry_policy;

pub use retry_policy::{BackoffStrategy, RetryPolicy};
