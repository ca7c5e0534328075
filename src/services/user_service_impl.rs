//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{error, info};

use crate::auth::password::{
    hash_password_blocking, is_strong_password, verify_password_blocking,
};
use crate::config::SecurityConfig;
use crate::db::{AuthProvider, NewUser, Role, Session, Store, User, UserToken, UserTokenType};
use crate::services::user_service::{RegisterUser, UserError, UserService};

/// Default lifetime for verification/reset tokens.
const USER_TOKEN_EXPIRY_HOURS: i64 = 24;

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

/// Lowercase and strip everything outside [a-z0-9].
fn sanitize(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Random 4-digit suffix for username collision retries.
fn generate_suffix() -> String {
    use rand::Rng;
    rand::rng().random_range(1000..10000).to_string()
}

/// Random opaque token value (64-char hex string).
#[must_use]
pub fn generate_token_value() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

impl SeaOrmUserService {
    fn base_username(first_name: Option<&str>, last_name: Option<&str>, email: &str) -> String {
        match (first_name, last_name) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                format!("{}.{}", sanitize(first), sanitize(last))
            }
            (Some(name), _) | (_, Some(name)) if !name.is_empty() => sanitize(name),
            _ => sanitize(email.split('@').next().unwrap_or_default()),
        }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, UserError> {
        Ok(self.store.find_user_by_id(id).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        Ok(self.store.find_user_by_email(email).await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        Ok(self.store.find_user_by_username(username).await?)
    }

    async fn create(&self, data: RegisterUser, role_name: &str) -> Result<User, UserError> {
        let password_hash = hash_password_blocking(&data.password, Some(&self.security))
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;

        let username = self
            .generate_unique_username(
                Some(&data.first_name),
                data.last_name.as_deref(),
                &data.email,
            )
            .await?;

        let role = self
            .store
            .find_role_by_name(role_name)
            .await?
            .ok_or(UserError::InvalidRole)?;

        let new_user = NewUser {
            email: Some(data.email),
            first_name: Some(data.first_name),
            last_name: data.last_name,
            phone_number: data.phone_number,
            gender: data.gender,
            is_email_verified: data.is_email_verified,
            is_phone_verified: data.is_phone_verified,
            is_active: data.is_active,
        };

        let created = self
            .store
            .create_user_with_role(
                &new_user,
                &username,
                &password_hash,
                role.id,
                AuthProvider::Credentials,
            )
            .await?;

        // Re-read through the normal projection path; missing here means
        // the write did not land.
        let user = self
            .store
            .find_user_by_id(&created.id)
            .await?
            .ok_or(UserError::CreationFailed)?;

        info!(user_id = %user.id, username = %username, "User created");
        Ok(user)
    }

    async fn change_password(
        &self,
        user_id: &str,
        new_password: &str,
        current_password: Option<&str>,
    ) -> Result<(), UserError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| UserError::UserNotFound(user_id.to_string()))?;

        let stored_hash = self
            .store
            .user_password_hash(&user.id)
            .await?
            .unwrap_or_default();

        if let Some(current) = current_password {
            let matches = verify_password_blocking(current, &stored_hash)
                .await
                .map_err(|e| UserError::Internal(e.to_string()))?;
            if !matches {
                return Err(UserError::IncorrectCurrentPassword);
            }
        }

        let same_as_old = verify_password_blocking(new_password, &stored_hash)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;
        if same_as_old {
            return Err(UserError::PasswordSameAsOld);
        }

        if !is_strong_password(new_password) {
            return Err(UserError::WeakPassword);
        }

        let recent_hashes = self
            .store
            .recent_password_hashes(&user.id, self.security.password_history_limit)
            .await?;

        let checks = futures::future::join_all(
            recent_hashes
                .iter()
                .map(|hash| verify_password_blocking(new_password, hash)),
        )
        .await;

        for check in checks {
            if check.map_err(|e| UserError::Internal(e.to_string()))? {
                return Err(UserError::PasswordRecentlyUsed);
            }
        }

        let new_hash = hash_password_blocking(new_password, Some(&self.security))
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;

        self.store
            .update_password_with_history(&user.id, &new_hash)
            .await?;

        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    async fn find_roles_by_user_id(&self, user_id: &str) -> Result<Vec<Role>, UserError> {
        Ok(self.store.find_roles_by_user_id(user_id).await?)
    }

    async fn generate_unique_username(
        &self,
        first_name: Option<&str>,
        last_name: Option<&str>,
        email: &str,
    ) -> Result<String, UserError> {
        let base = Self::base_username(first_name, last_name, email);

        let mut attempt = 0;
        while attempt < self.security.username_max_retries {
            let candidate = if attempt == 0 {
                base.clone()
            } else {
                format!("{base}{}", generate_suffix())
            };

            match self.store.is_username_available(&candidate).await {
                Ok(true) => return Ok(candidate),
                Ok(false) => attempt += 1,
                Err(e) => {
                    // Break out rather than loop on a failing store; the
                    // timestamp fallback below still yields a value.
                    error!("Error generating username: {e}");
                    break;
                }
            }
        }

        // Practically collision-free; not re-checked by design.
        Ok(format!("{base}{}", Utc::now().timestamp_millis()))
    }

    async fn get_live_session(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<Option<Session>, UserError> {
        Ok(self.store.get_live_session(user_id, token).await?)
    }

    async fn save_session(
        &self,
        user_id: &str,
        token: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, UserError> {
        self.store
            .create_session(user_id, token, ip, user_agent, expires_at)
            .await
            .map_err(|_| UserError::SessionCreationFailed)
    }

    async fn delete_session(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<Option<Session>, UserError> {
        Ok(self.store.delete_session(user_id, token).await?)
    }

    async fn touch_session(&self, user_id: &str, token: &str) -> Result<(), UserError> {
        Ok(self.store.touch_session(user_id, token).await?)
    }

    async fn create_user_token(
        &self,
        user_id: &str,
        token_type: UserTokenType,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<UserToken, UserError> {
        let token = generate_token_value();
        let expires_at = Utc::now() + Duration::hours(USER_TOKEN_EXPIRY_HOURS);

        Ok(self
            .store
            .create_user_token(user_id, &token, token_type, expires_at, ip, user_agent)
            .await?)
    }

    async fn validate_user_token(
        &self,
        user_id: &str,
        token: &str,
        token_type: UserTokenType,
    ) -> Result<UserToken, UserError> {
        self.store
            .validate_user_token(user_id, token, token_type)
            .await?
            .ok_or(UserError::TokenInvalidOrExpired)
    }

    async fn consume_user_token(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<Option<UserToken>, UserError> {
        Ok(self.store.consume_user_token(user_id, token).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_and_lowercases() {
        assert_eq!(sanitize("John"), "john");
        assert_eq!(sanitize("O'Brien"), "obrien");
        assert_eq!(sanitize("Anne-Marie 2"), "annemarie2");
        assert_eq!(sanitize("日本"), "");
    }

    #[test]
    fn base_username_prefers_both_names() {
        assert_eq!(
            SeaOrmUserService::base_username(Some("John"), Some("Doe"), "x@y.com"),
            "john.doe"
        );
    }

    #[test]
    fn base_username_falls_back_to_single_name() {
        assert_eq!(
            SeaOrmUserService::base_username(Some("John"), None, "x@y.com"),
            "john"
        );
        assert_eq!(
            SeaOrmUserService::base_username(None, Some("Doe"), "x@y.com"),
            "doe"
        );
    }

    #[test]
    fn base_username_falls_back_to_email_local_part() {
        assert_eq!(
            SeaOrmUserService::base_username(None, None, "Jane.Roe+1@example.com"),
            "janeroe1"
        );
    }

    #[test]
    fn suffix_is_four_digits() {
        for _ in 0..50 {
            let suffix = generate_suffix();
            assert_eq!(suffix.len(), 4);
            assert!(suffix.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn token_value_is_64_hex_chars() {
        let token = generate_token_value();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token_value());
    }
}
