//! Bounded retry combinator
//!
//! Retries an async operation while a predicate classifies its error as
//! recoverable, up to a fixed number of attempts. There is no backoff: every
//! retry in this crate changes its input (a new username, a fresh lookup),
//! so waiting buys nothing.
//!
//! # Example
//!
//! ```ignore
//! use cinelog_auth_core::retry::{retry, RetryPolicy};
//!
//! let user = retry(
//!     &RetryPolicy::new(3),
//!     AuthError::is_provisioning_race,
//!     |_attempt| directory.read_or_create_once(&identity),
//! )
//! .await;
//! ```

use std::future::Future;

use thiserror::Error;
use tracing::debug;

/// How many times an operation may run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Check if another attempt is allowed after `attempt` (zero-based) failed
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }
}

/// Why a retried operation gave up
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt failed with a recoverable error
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    /// An attempt failed with an error the predicate does not recover from
    #[error(transparent)]
    Fatal(E),
}

impl<E> RetryError<E> {
    /// Get the underlying error
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::Fatal(err) => err,
        }
    }
}

/// Run `operation` until it succeeds, fails with an error `is_recoverable`
/// rejects, or the policy runs out of attempts.
///
/// The operation receives the zero-based attempt number.
pub async fn retry<T, E, P, F, Fut>(
    policy: &RetryPolicy,
    is_recoverable: P,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    P: Fn(&E) -> bool,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let ((), result) = retry_with(policy, (), is_recoverable, |(), attempt| {
        let fut = operation(attempt);
        async move { ((), fut.await) }
    })
    .await;
    result
}

/// Like [`retry`], threading an owned `state` through every attempt.
///
/// Useful when each attempt needs exclusive access to the same resource,
/// such as an open transaction. The state is handed back together with the
/// outcome so the caller can finish with it (commit, roll back).
pub async fn retry_with<S, T, E, P, F, Fut>(
    policy: &RetryPolicy,
    mut state: S,
    is_recoverable: P,
    mut operation: F,
) -> (S, Result<T, RetryError<E>>)
where
    P: Fn(&E) -> bool,
    F: FnMut(S, u32) -> Fut,
    Fut: Future<Output = (S, Result<T, E>)>,
{
    let mut attempt = 0;

    loop {
        let (next, result) = operation(state, attempt).await;
        state = next;

        match result {
            Ok(value) => return (state, Ok(value)),
            Err(err) if !is_recoverable(&err) => return (state, Err(RetryError::Fatal(err))),
            Err(err) if !policy.can_retry(attempt) => {
                return (
                    state,
                    Err(RetryError::Exhausted {
                        attempts: attempt + 1,
                        last: err,
                    }),
                )
            }
            Err(_) => {
                debug!(
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    "retrying after recoverable error"
                );
                attempt += 1;
            }
        }
    }
}
