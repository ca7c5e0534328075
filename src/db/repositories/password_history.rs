use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::{prelude::*, user_password_history};

pub struct PasswordHistoryRepository {
    conn: DatabaseConnection,
}

impl PasswordHistoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Most recent hashes first. The retention cap is this read window; the
    /// table itself is append-only.
    pub async fn recent_hashes(&self, user_id: &str, limit: u64) -> Result<Vec<String>> {
        let hashes = UserPasswordHistory::find()
            .filter(user_password_history::Column::UserId.eq(user_id))
            .order_by_desc(user_password_history::Column::CreatedAt)
            .order_by_desc(user_password_history::Column::Id)
            .limit(limit)
            .select_only()
            .column(user_password_history::Column::PasswordHash)
            .into_tuple::<String>()
            .all(&self.conn)
            .await
            .context("Failed to query password history")?;

        Ok(hashes)
    }

    /// Runs on the caller's connection so the append commits together with
    /// the password overwrite.
    pub async fn append<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        password_hash: &str,
    ) -> Result<()> {
        let active = user_password_history::ActiveModel {
            user_id: Set(user_id.to_string()),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active
            .insert(db)
            .await
            .context("Failed to append password history")?;

        Ok(())
    }
}
