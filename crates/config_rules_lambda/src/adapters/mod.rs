//! SDK-backed implementations of the core client traits.
//!
//! The core is synchronous; every adapter runs its SDK future to completion on
//! the current tokio runtime. Callers must be on a multi-thread runtime.

use std::future::Future;

pub mod config_service;
pub mod elbv2;
pub mod evaluation_sink;
pub mod iam;

pub(crate) fn block_on_sdk<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

pub(crate) fn chrono_from_sdk(
    seconds: i64,
    subsec_nanos: u32,
) -> Result<chrono::DateTime<chrono::Utc>, String> {
    chrono::DateTime::from_timestamp(seconds, subsec_nanos)
        .ok_or_else(|| format!("timestamp out of range: {seconds}s"))
}
