use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
    TransactionTrait,
};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::country::Country;
pub use repositories::role::{Role, RoleName};
pub use repositories::session::Session;
pub use repositories::user::{AuthProvider, NewUser, User};
pub use repositories::user_token::{UserToken, UserTokenType};

use crate::entities::users;

/// Typed marker for unique-constraint failures so the service layer can turn
/// them into a conflict response instead of a generic storage error.
#[derive(Debug)]
pub struct UniqueViolation {
    table: &'static str,
    source: DbErr,
}

impl UniqueViolation {
    #[must_use]
    pub const fn new(table: &'static str, source: DbErr) -> Self {
        Self { table, source }
    }

    #[must_use]
    pub fn matches(err: &DbErr) -> bool {
        matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
    }
}

impl fmt::Display for UniqueViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unique constraint violated on {}: {}", self.table, self.source)
    }
}

impl std::error::Error for UniqueViolation {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") && !db_url.contains("memory") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn role_repo(&self) -> repositories::role::RoleRepository {
        repositories::role::RoleRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    fn password_history_repo(&self) -> repositories::password_history::PasswordHistoryRepository {
        repositories::password_history::PasswordHistoryRepository::new(self.conn.clone())
    }

    fn user_token_repo(&self) -> repositories::user_token::UserTokenRepository {
        repositories::user_token::UserTokenRepository::new(self.conn.clone())
    }

    fn country_repo(&self) -> repositories::country::CountryRepository {
        repositories::country::CountryRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        self.user_repo().find_by_id(id).await
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().find_by_email(email).await
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().find_by_username(username).await
    }

    pub async fn find_user_for_login(
        &self,
        email_or_username: &str,
    ) -> Result<Option<(User, Option<String>)>> {
        self.user_repo()
            .find_by_email_or_username_with_password(email_or_username)
            .await
    }

    pub async fn user_password_hash(&self, id: &str) -> Result<Option<String>> {
        self.user_repo().password_hash(id).await
    }

    pub async fn is_username_available(&self, username: &str) -> Result<bool> {
        self.user_repo().is_username_available(username).await
    }

    /// User insert and role mapping in one transaction. A user row without
    /// its role mapping is an invariant violation, so either both writes
    /// commit or neither does.
    pub async fn create_user_with_role(
        &self,
        data: &NewUser,
        username: &str,
        password_hash: &str,
        role_id: i32,
        provider: AuthProvider,
    ) -> Result<users::Model> {
        let txn = self.conn.begin().await?;

        let user = self
            .user_repo()
            .create(&txn, data, username, password_hash, provider)
            .await?;
        self.role_repo()
            .map_role_to_user(&txn, role_id, &user.id)
            .await?;

        txn.commit().await?;
        Ok(user)
    }

    /// Password overwrite and history append in one transaction. The new
    /// hash is what gets appended, so it is already history for the next
    /// change.
    pub async fn update_password_with_history(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<()> {
        let txn = self.conn.begin().await?;

        self.user_repo()
            .update_password(&txn, user_id, password_hash)
            .await?;
        self.password_history_repo()
            .append(&txn, user_id, password_hash)
            .await?;

        txn.commit().await?;
        Ok(())
    }

    // ========== Roles ==========

    pub async fn find_all_roles(&self) -> Result<Vec<Role>> {
        self.role_repo().find_all().await
    }

    pub async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        self.role_repo().find_by_name(name).await
    }

    pub async fn find_roles_by_user_id(&self, user_id: &str) -> Result<Vec<Role>> {
        self.role_repo().find_roles_by_user_id(user_id).await
    }

    // ========== Sessions ==========

    pub async fn get_live_session(&self, user_id: &str, token: &str) -> Result<Option<Session>> {
        self.session_repo().get_live(user_id, token).await
    }

    pub async fn create_session(
        &self,
        user_id: &str,
        token: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<Session> {
        self.session_repo()
            .create(user_id, token, ip, user_agent, expires_at)
            .await
    }

    pub async fn delete_session(&self, user_id: &str, token: &str) -> Result<Option<Session>> {
        self.session_repo().delete(user_id, token).await
    }

    pub async fn touch_session(&self, user_id: &str, token: &str) -> Result<()> {
        self.session_repo().touch(user_id, token).await
    }

    // ========== Password history ==========

    pub async fn recent_password_hashes(&self, user_id: &str, limit: u64) -> Result<Vec<String>> {
        self.password_history_repo()
            .recent_hashes(user_id, limit)
            .await
    }

    // ========== User tokens ==========

    pub async fn create_user_token(
        &self,
        user_id: &str,
        token: &str,
        token_type: UserTokenType,
        expires_at: DateTime<Utc>,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<UserToken> {
        self.user_token_repo()
            .create(user_id, token, token_type, expires_at, ip, user_agent)
            .await
    }

    pub async fn validate_user_token(
        &self,
        user_id: &str,
        token: &str,
        token_type: UserTokenType,
    ) -> Result<Option<UserToken>> {
        self.user_token_repo()
            .validate(user_id, token, token_type)
            .await
    }

    pub async fn consume_user_token(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<Option<UserToken>> {
        self.user_token_repo().mark_used(user_id, token).await
    }

    // ========== Countries ==========

    pub async fn list_countries(&self) -> Result<Vec<Country>> {
        self.country_repo().find_all().await
    }

    pub async fn find_country_by_code(&self, code: &str) -> Result<Option<Country>> {
        self.country_repo().find_by_code(code).await
    }

    pub async fn find_country_by_code_iso3(&self, code_iso3: &str) -> Result<Option<Country>> {
        self.country_repo().find_by_code_iso3(code_iso3).await
    }
}
