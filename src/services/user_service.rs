//! Domain service for user records: lookups, creation with role
//! assignment, the password-change pipeline, and session/token plumbing.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db::{Role, Session, UniqueViolation, User, UserToken, UserTokenType};

/// Errors specific to user operations. Each variant carries a stable
/// machine-readable code, distinct from the human message.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User with ID '{0}' not found.")]
    UserNotFound(String),

    #[error("Invalid role.")]
    InvalidRole,

    #[error("Failed to create user.")]
    CreationFailed,

    #[error("Email or username is already taken.")]
    Conflict,

    #[error("Current password is incorrect.")]
    IncorrectCurrentPassword,

    #[error("New password cannot be the same as the old password.")]
    PasswordSameAsOld,

    #[error("New password is not strong enough.")]
    WeakPassword,

    #[error("Your new password must be different from your 5 most recent passwords")]
    PasswordRecentlyUsed,

    #[error("Invalid or expired token.")]
    TokenInvalidOrExpired,

    #[error("Failed to create user session.")]
    SessionCreationFailed,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UserError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::InvalidRole => "INVALID_ROLE",
            Self::CreationFailed => "USER_CREATION_FAILED",
            Self::Conflict => "EMAIL_OR_USERNAME_TAKEN",
            Self::IncorrectCurrentPassword => "INCORRECT_CURRENT_PASSWORD",
            Self::PasswordSameAsOld => "PASSWORD_SAME_AS_OLD",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::PasswordRecentlyUsed => "PASSWORD_USED_IN_LAST_5_PASSWORDS",
            Self::TokenInvalidOrExpired => "TOKEN_INVALID_OR_EXPIRED",
            Self::SessionCreationFailed => "USER_SESSION_CREATION_FAILED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        if err.downcast_ref::<UniqueViolation>().is_some() {
            Self::Conflict
        } else {
            Self::Database(err.to_string())
        }
    }
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

/// Registration input. The username is generated, never client-supplied.
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub is_email_verified: bool,
    pub is_phone_verified: bool,
    pub is_active: bool,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, UserError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError>;

    /// Hashes the password, generates a unique username, resolves the role
    /// by name, and creates user + role mapping atomically.
    ///
    /// # Errors
    ///
    /// [`UserError::InvalidRole`] for an unknown role name,
    /// [`UserError::Conflict`] when email or username is already taken,
    /// [`UserError::CreationFailed`] if the post-create re-read misses.
    async fn create(&self, data: RegisterUser, role_name: &str) -> Result<User, UserError>;

    /// The five ordered checks of the password-change pipeline; the first
    /// failure short-circuits. On success the new hash is persisted and
    /// appended to history in one transaction.
    async fn change_password(
        &self,
        user_id: &str,
        new_password: &str,
        current_password: Option<&str>,
    ) -> Result<(), UserError>;

    async fn find_roles_by_user_id(&self, user_id: &str) -> Result<Vec<Role>, UserError>;

    /// Candidate from first/last name or the email local part, with random
    /// numeric suffixes on collision and a timestamp fallback.
    async fn generate_unique_username(
        &self,
        first_name: Option<&str>,
        last_name: Option<&str>,
        email: &str,
    ) -> Result<String, UserError>;

    // ===== Sessions =====

    async fn get_live_session(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<Option<Session>, UserError>;

    async fn save_session(
        &self,
        user_id: &str,
        token: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, UserError>;

    /// Idempotent: returns `None` when there was no session to delete.
    async fn delete_session(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<Option<Session>, UserError>;

    async fn touch_session(&self, user_id: &str, token: &str) -> Result<(), UserError>;

    // ===== Single-use tokens (verification / reset) =====

    async fn create_user_token(
        &self,
        user_id: &str,
        token_type: UserTokenType,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<UserToken, UserError>;

    /// Fails with [`UserError::TokenInvalidOrExpired`] for unknown, used,
    /// or expired tokens.
    async fn validate_user_token(
        &self,
        user_id: &str,
        token: &str,
        token_type: UserTokenType,
    ) -> Result<UserToken, UserError>;

    async fn consume_user_token(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<Option<UserToken>, UserError>;
}
