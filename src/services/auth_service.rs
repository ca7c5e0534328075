//! Domain service for authentication: credential check, token issuance,
//! session persistence, and logout.

use thiserror::Error;

use crate::db::User;
use crate::services::user_service::{RegisterUser, UserError};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Deliberately identical for an unknown user and a wrong password so
    /// responses cannot be used to enumerate accounts.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Your account is not active")]
    UserNotActive,

    #[error("Failed to create user session.")]
    SessionCreationFailed,

    #[error(transparent)]
    User(#[from] UserError),

    #[error("Failed to issue token: {0}")]
    Token(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_USERNAME_OR_PASSWORD",
            Self::UserNotActive => "USER_IS_NOT_ACTIVE",
            Self::SessionCreationFailed => "USER_SESSION_CREATION_FAILED",
            Self::User(inner) => inner.code(),
            Self::Token(_) | Self::Internal(_) => "INTERNAL_SERVER_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Login result: public user projection plus the signed bearer token.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: User,
    pub access_token: String,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Validates credentials, issues a token, and persists the backing
    /// session with a fixed 30-day expiry.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] for unknown user or wrong
    /// password, [`AuthError::UserNotActive`] for a deactivated account.
    async fn authenticate(
        &self,
        username_or_email: &str,
        password: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<LoginResult, AuthError>;

    /// Registers a new credential-based account with the given role.
    async fn register(&self, data: RegisterUser, role_name: &str) -> Result<User, AuthError>;

    /// Deletes the backing session. Succeeds whether or not a session
    /// existed, so repeated logouts are harmless.
    async fn logout(&self, user_id: &str, token: &str) -> Result<(), AuthError>;
}
