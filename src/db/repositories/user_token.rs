use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::entities::{prelude::*, user_tokens};

/// Kinds of single-use tokens handed to users out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserTokenType {
    EmailVerification,
    PasswordReset,
}

impl UserTokenType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmailVerification => "email_verification",
            Self::PasswordReset => "password_reset",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserToken {
    pub id: i32,
    pub user_id: String,
    pub token: String,
    pub token_type: String,
    pub is_used: bool,
    pub used_at: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub expires_at: String,
    pub created_at: String,
}

impl From<user_tokens::Model> for UserToken {
    fn from(model: user_tokens::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            token: model.token,
            token_type: model.token_type,
            is_used: model.is_used,
            used_at: model.used_at,
            ip_address: model.ip_address,
            user_agent: model.user_agent,
            expires_at: model.expires_at,
            created_at: model.created_at,
        }
    }
}

pub struct UserTokenRepository {
    conn: DatabaseConnection,
}

impl UserTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: &str,
        token: &str,
        token_type: UserTokenType,
        expires_at: DateTime<Utc>,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<UserToken> {
        let active = user_tokens::ActiveModel {
            user_id: Set(user_id.to_string()),
            token: Set(token.to_string()),
            token_type: Set(token_type.as_str().to_string()),
            is_used: Set(false),
            used_at: Set(None),
            ip_address: Set(ip.map(str::to_string)),
            user_agent: Set(user_agent.map(str::to_string)),
            expires_at: Set(expires_at.to_rfc3339()),
            created_at: Set(Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to create user token")?;

        Ok(UserToken::from(model))
    }

    /// Valid means: matching type, never consumed, not yet expired.
    pub async fn validate(
        &self,
        user_id: &str,
        token: &str,
        token_type: UserTokenType,
    ) -> Result<Option<UserToken>> {
        let now = Utc::now().to_rfc3339();

        let user_token = UserTokens::find()
            .filter(user_tokens::Column::UserId.eq(user_id))
            .filter(user_tokens::Column::Token.eq(token))
            .filter(user_tokens::Column::TokenType.eq(token_type.as_str()))
            .filter(user_tokens::Column::IsUsed.eq(false))
            .filter(user_tokens::Column::ExpiresAt.gt(now))
            .one(&self.conn)
            .await
            .context("Failed to validate user token")?;

        Ok(user_token.map(UserToken::from))
    }

    /// Consumes the token. A consumed token never validates again.
    pub async fn mark_used(&self, user_id: &str, token: &str) -> Result<Option<UserToken>> {
        let user_token = UserTokens::find()
            .filter(user_tokens::Column::UserId.eq(user_id))
            .filter(user_tokens::Column::Token.eq(token))
            .filter(user_tokens::Column::IsUsed.eq(false))
            .one(&self.conn)
            .await
            .context("Failed to query user token")?;

        let Some(model) = user_token else {
            return Ok(None);
        };

        let mut active: user_tokens::ActiveModel = model.into();
        active.is_used = Set(true);
        active.used_at = Set(Some(Utc::now().to_rfc3339()));

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to mark user token used")?;

        Ok(Some(UserToken::from(updated)))
    }
}
