//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::auth::TokenIssuer;
use crate::auth::password::verify_password_blocking;
use crate::db::{Store, User};
use crate::services::auth_service::{AuthError, AuthService, LoginResult};
use crate::services::user_service::{RegisterUser, UserService};

pub struct SeaOrmAuthService {
    store: Store,
    users: Arc<dyn UserService>,
    issuer: TokenIssuer,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, users: Arc<dyn UserService>, issuer: TokenIssuer) -> Self {
        Self {
            store,
            users,
            issuer,
        }
    }

    async fn validate_credentials(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let Some((user, password_hash)) = self.store.find_user_for_login(username_or_email).await?
        else {
            return Err(AuthError::InvalidCredentials);
        };

        // A missing hash (federated account) compares as a mismatch, which
        // keeps the failure indistinguishable from a wrong password.
        let matches = verify_password_blocking(password, &password_hash.unwrap_or_default())
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AuthError::UserNotActive);
        }

        Ok(user)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn authenticate(
        &self,
        username_or_email: &str,
        password: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<LoginResult, AuthError> {
        let user = self.validate_credentials(username_or_email, password).await?;

        let token = self
            .issuer
            .issue(&user)
            .map_err(|e| AuthError::Token(e.to_string()))?;

        let expires_at = Utc::now() + self.issuer.validity();
        self.store
            .create_session(&user.id, &token, ip, user_agent, expires_at)
            .await
            .map_err(|_| AuthError::SessionCreationFailed)?;

        info!(user_id = %user.id, "User authenticated");

        Ok(LoginResult {
            user,
            access_token: token,
        })
    }

    async fn register(&self, data: RegisterUser, role_name: &str) -> Result<User, AuthError> {
        Ok(self.users.create(data, role_name).await?)
    }

    async fn logout(&self, user_id: &str, token: &str) -> Result<(), AuthError> {
        let deleted = self.store.delete_session(user_id, token).await?;

        if deleted.is_some() {
            info!(user_id = %user_id, "User logged out");
        } else {
            info!(user_id = %user_id, "Logout with no live session");
        }

        Ok(())
    }
}
