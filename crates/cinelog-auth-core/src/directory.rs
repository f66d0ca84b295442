//! User directory
//!
//! Finds or provisions the local user for a canonical identity. Two kinds of
//! unique violation are handled, told apart by constraint name:
//!
//! - a taken **username** is retried inside the same transaction with a
//!   freshly generated candidate, up to the username attempt budget
//! - a taken **email** means another request provisioned the same person
//!   first; the whole lookup-or-insert is re-run and finds their row

use std::sync::Arc;
use std::time::Duration;

use cinelog_db::{CreateUser, DbError, UniqueConstraint, UserRepository, UserTransaction};
use cinelog_types::{Identity, User, UserId, Username};

use crate::config::AuthConfig;
use crate::retry::{retry, retry_with, RetryError, RetryPolicy};
use crate::telemetry;
use crate::username::UsernameGenerator;
use crate::AuthError;

fn is_username_collision(err: &DbError) -> bool {
    err.is_unique_violation_on(&UniqueConstraint::Username)
}

/// Finds or atomically creates users
pub struct UserDirectory<U: UserRepository + ?Sized> {
    repo: Arc<U>,
    usernames: UsernameGenerator,
    username_policy: RetryPolicy,
    provisioning_policy: RetryPolicy,
    timeout: Duration,
}

impl<U: UserRepository + ?Sized> UserDirectory<U> {
    /// Create a user directory
    pub fn new(repo: Arc<U>, config: &AuthConfig) -> Self {
        Self {
            repo,
            usernames: UsernameGenerator::new(),
            username_policy: RetryPolicy::new(config.username_attempts),
            provisioning_policy: RetryPolicy::new(config.provisioning_attempts),
            timeout: config.db_timeout,
        }
    }

    /// Return the user owning `identity.email`, creating it if needed.
    ///
    /// The flag is `true` only when this call committed the row.
    pub async fn read_or_create(&self, identity: &Identity) -> Result<(User, bool), AuthError> {
        if identity.email.is_empty() {
            return Err(AuthError::InvalidIdentity("email is required".to_string()));
        }

        retry(
            &self.provisioning_policy,
            AuthError::is_provisioning_race,
            |attempt| {
                if attempt > 0 {
                    telemetry::record_provisioning_retry();
                    tracing::info!(attempt, "Email provisioned concurrently, retrying lookup");
                }
                self.read_or_create_bounded(identity)
            },
        )
        .await
        .map_err(RetryError::into_inner)
    }

    /// Look up a user by id
    pub async fn find(&self, id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.repo.find_by_id(id).await?)
    }

    async fn read_or_create_bounded(&self, identity: &Identity) -> Result<(User, bool), AuthError> {
        // Dropping the attempt on timeout drops its transaction, which rolls it back
        match tokio::time::timeout(self.timeout, self.read_or_create_once(identity)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "User provisioning timed out"
                );
                Err(AuthError::Infrastructure(
                    "user provisioning timed out".to_string(),
                ))
            }
        }
    }

    async fn read_or_create_once(&self, identity: &Identity) -> Result<(User, bool), AuthError> {
        let mut tx = self.repo.begin().await?;

        let existing = match tx.find_by_email(&identity.email).await {
            Ok(existing) => existing,
            Err(e) => {
                discard(tx).await;
                return Err(e.into());
            }
        };

        if let Some(user) = existing {
            tx.commit().await?;
            return Ok((user, false));
        }

        let preferred = self.preferred_username(identity);

        let (tx, inserted) = retry_with(
            &self.username_policy,
            tx,
            is_username_collision,
            |mut tx: Box<dyn UserTransaction>, attempt| {
                let username = match (&preferred, attempt) {
                    (Some(name), 0) => name.clone(),
                    _ => self.usernames.generate(),
                };
                let new_user = CreateUser {
                    email: identity.email.clone(),
                    username,
                    avatar_url: identity.avatar_url.clone(),
                };

                async move {
                    let result = tx.insert(&new_user).await;
                    if result.as_ref().is_err_and(is_username_collision) {
                        telemetry::record_username_collision();
                        tracing::debug!(username = %new_user.username, "Username taken");
                    }
                    (tx, result)
                }
            },
        )
        .await;

        match inserted {
            Ok(user) => {
                tx.commit().await?;
                tracing::info!(user_id = %user.id, username = %user.username, "Provisioned user");
                Ok((user, true))
            }
            Err(RetryError::Exhausted { attempts, .. }) => {
                discard(tx).await;
                tracing::error!(attempts, "No unique username found");
                Err(AuthError::ProvisioningExhausted { attempts })
            }
            Err(RetryError::Fatal(e)) => {
                discard(tx).await;
                Err(e.into())
            }
        }
    }

    /// Username to try first, if the identity brings a usable one
    fn preferred_username(&self, identity: &Identity) -> Option<Username> {
        if identity.needs_generated_username() {
            return None;
        }

        match Username::parse(identity.display_name.as_str()) {
            Ok(username) => Some(username),
            Err(e) => {
                tracing::debug!("Display name unusable as username: {}", e);
                None
            }
        }
    }
}

async fn discard(tx: Box<dyn UserTransaction>) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!("Failed to roll back provisioning transaction: {}", e);
    }
}

impl<U: UserRepository + ?Sized> std::fmt::Debug for UserDirectory<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDirectory")
            .field("username_policy", &self.username_policy)
            .field("provisioning_policy", &self.provisioning_policy)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
