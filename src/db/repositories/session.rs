use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
};

use crate::entities::{prelude::*, user_sessions};

#[derive(Debug, Clone)]
pub struct Session {
    pub id: i32,
    pub user_id: String,
    pub token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub expires_at: String,
    pub is_active: bool,
    pub created_at: String,
    pub last_used_at: Option<String>,
}

impl From<user_sessions::Model> for Session {
    fn from(model: user_sessions::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            token: model.token,
            ip_address: model.ip_address,
            user_agent: model.user_agent,
            expires_at: model.expires_at,
            is_active: model.is_active,
            created_at: model.created_at,
            last_used_at: model.last_used_at,
        }
    }
}

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns the session only while it is live: active flag set and expiry
    /// in the future. Expired or deactivated rows read as absent.
    pub async fn get_live(&self, user_id: &str, token: &str) -> Result<Option<Session>> {
        let now = Utc::now().to_rfc3339();

        let session = UserSessions::find()
            .filter(user_sessions::Column::UserId.eq(user_id))
            .filter(user_sessions::Column::Token.eq(token))
            .filter(user_sessions::Column::IsActive.eq(true))
            .filter(user_sessions::Column::ExpiresAt.gt(now))
            .one(&self.conn)
            .await
            .context("Failed to query live session")?;

        Ok(session.map(Session::from))
    }

    pub async fn create(
        &self,
        user_id: &str,
        token: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<Session> {
        let now = Utc::now().to_rfc3339();

        let active = user_sessions::ActiveModel {
            user_id: Set(user_id.to_string()),
            token: Set(token.to_string()),
            ip_address: Set(ip.map(str::to_string)),
            user_agent: Set(user_agent.map(str::to_string)),
            expires_at: Set(expires_at.to_rfc3339()),
            is_active: Set(true),
            created_at: Set(now.clone()),
            last_used_at: Set(Some(now)),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to create session")?;

        Ok(Session::from(model))
    }

    /// Idempotent delete: a missing row is a normal outcome (double logout,
    /// logout after expiry cleanup), not an error.
    pub async fn delete(&self, user_id: &str, token: &str) -> Result<Option<Session>> {
        let session = UserSessions::find()
            .filter(user_sessions::Column::UserId.eq(user_id))
            .filter(user_sessions::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query session for deletion")?;

        let Some(model) = session else {
            return Ok(None);
        };

        let deleted = Session::from(model.clone());
        model
            .delete(&self.conn)
            .await
            .context("Failed to delete session")?;

        Ok(Some(deleted))
    }

    /// Stamps `last_used_at`. Informational only; expiry never slides.
    pub async fn touch(&self, user_id: &str, token: &str) -> Result<()> {
        let session = UserSessions::find()
            .filter(user_sessions::Column::UserId.eq(user_id))
            .filter(user_sessions::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query session for touch")?;

        if let Some(model) = session {
            let mut active: user_sessions::ActiveModel = model.into();
            active.last_used_at = Set(Some(Utc::now().to_rfc3339()));
            active
                .update(&self.conn)
                .await
                .context("Failed to update session last_used_at")?;
        }

        Ok(())
    }
}
