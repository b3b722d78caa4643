//! Bounded deadlines for storage calls
//!
//! Every storage round-trip runs under a deadline so a hung backend surfaces
//! as [`DbError::Timeout`] instead of stalling the request.

use std::future::Future;
use std::time::Duration;

use crate::error::{DbError, DbResult};

/// Run `fut` under `timeout`, mapping expiry to [`DbError::Timeout`].
pub async fn with_deadline<T, F>(timeout: Duration, op: &'static str, fut: F) -> DbResult<T>
where
    F: Future<Output = DbResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(op, timeout_ms = timeout.as_millis() as u64, "Storage deadline exceeded");
            Err(DbError::Timeout(op.to_string()))
        }
    }
}
