//! Auth errors

use cinelog_db::{DbError, UniqueConstraint};
use thiserror::Error;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// No usable credential was presented
    #[error("not authenticated")]
    Unauthenticated,

    /// Expected absence of a session, refresh token or user
    #[error("not found")]
    NotFound,

    /// No free username was found within the attempt budget
    #[error("could not provision a unique username after {attempts} attempts")]
    ProvisioningExhausted { attempts: u32 },

    /// Another request provisioned the same email concurrently
    #[error("email was provisioned concurrently")]
    EmailConflict,

    /// Identity supplied by the provider is unusable
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// Cache or database unreachable, timed out or failed
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::NotFound => 404,
            Self::InvalidIdentity(_) => 400,
            Self::EmailConflict => 409,
            Self::Infrastructure(_) => 503,
            Self::ProvisioningExhausted { .. } | Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::NotFound => "NOT_FOUND",
            Self::ProvisioningExhausted { .. } => "PROVISIONING_EXHAUSTED",
            Self::EmailConflict => "EMAIL_CONFLICT",
            Self::InvalidIdentity(_) => "INVALID_IDENTITY",
            Self::Infrastructure(_) => "INFRASTRUCTURE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether re-running provisioning from the email lookup can succeed
    pub fn is_provisioning_race(&self) -> bool {
        matches!(self, Self::EmailConflict)
    }
}

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => Self::NotFound,
            DbError::UniqueViolation(UniqueConstraint::Email) => Self::EmailConflict,
            other => {
                tracing::error!("Store error: {}", other);
                Self::Infrastructure(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        assert!(matches!(AuthError::from(DbError::NotFound), AuthError::NotFound));
        assert!(AuthError::from(DbError::UniqueViolation(UniqueConstraint::Email))
            .is_provisioning_race());
        assert!(matches!(
            AuthError::from(DbError::Timeout("session read")),
            AuthError::Infrastructure(_)
        ));
        assert!(matches!(
            AuthError::from(DbError::UniqueViolation(UniqueConstraint::Username)),
            AuthError::Infrastructure(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::Unauthenticated.status_code(), 401);
        assert_eq!(AuthError::ProvisioningExhausted { attempts: 10 }.status_code(), 500);
        assert_eq!(AuthError::InvalidIdentity("empty email".into()).status_code(), 400);
        assert_eq!(
            AuthError::ProvisioningExhausted { attempts: 10 }.error_code(),
            "PROVISIONING_EXHAUSTED"
        );
    }
}
