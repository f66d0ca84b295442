//! Deadlines for store operations

use std::future::Future;
use std::time::Duration;

use crate::error::{DbError, DbResult};

/// Run a store operation under a deadline.
///
/// An elapsed deadline is reported as [`DbError::Timeout`], never as
/// [`DbError::NotFound`]. The operation's future is dropped on timeout, which
/// releases any connection or transaction it was holding.
pub async fn with_timeout<T, E, F>(limit: Duration, operation: &'static str, fut: F) -> DbResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<DbError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            tracing::warn!(
                operation,
                timeout_ms = limit.as_millis() as u64,
                "store operation timed out"
            );
            Err(DbError::Timeout(operation))
        }
    }
}
