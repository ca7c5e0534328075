use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, QueryFilter, QuerySelect, Set,
};

use crate::db::UniqueViolation;
use crate::db::repositories::role::Role;
use crate::entities::{prelude::*, users};

/// Identity provider for an account. Only credential-based accounts are
/// issued today; the variant set mirrors the schema's provider column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProvider {
    Credentials,
}

impl AuthProvider {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credentials => "credentials",
        }
    }
}

/// User projection handed out of the repository. The password hash is never
/// part of this struct; login-path reads get it as a separate value.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub provider: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image_url: Option<String>,
    pub gender: Option<String>,
    pub bio: Option<String>,
    pub dob: Option<String>,
    pub tagline: Option<String>,
    pub website: Option<String>,
    pub timezone: Option<String>,
    pub locale: Option<String>,
    pub country_code_iso3: Option<String>,
    pub is_email_verified: bool,
    pub is_phone_verified: bool,
    pub is_active: bool,
    pub roles: Vec<Role>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    fn from_model(model: users::Model, roles: Vec<Role>) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            provider: model.provider,
            first_name: model.first_name,
            last_name: model.last_name,
            display_name: model.display_name,
            phone_number: model.phone_number,
            profile_image_url: model.profile_image_url,
            gender: model.gender,
            bio: model.bio,
            dob: model.dob,
            tagline: model.tagline,
            website: model.website,
            timezone: model.timezone,
            locale: model.locale,
            country_code_iso3: model.country_code_iso3,
            is_email_verified: model.is_email_verified,
            is_phone_verified: model.is_phone_verified,
            is_active: model.is_active,
            roles,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Profile fields accepted at creation time. Identity fields (id, username,
/// password hash, provider) are supplied separately by the caller.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub is_email_verified: bool,
    pub is_phone_verified: bool,
    pub is_active: bool,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn roles_for(&self, model: &users::Model) -> Result<Vec<Role>> {
        let roles = model
            .find_related(Roles)
            .all(&self.conn)
            .await
            .context("Failed to load roles for user")?;

        Ok(roles.into_iter().map(Role::from).collect())
    }

    async fn hydrate(&self, model: users::Model) -> Result<User> {
        let roles = self.roles_for(&model).await?;
        Ok(User::from_model(model, roles))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by id")?;

        match user {
            Some(model) => Ok(Some(self.hydrate(model).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        match user {
            Some(model) => Ok(Some(self.hydrate(model).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        match user {
            Some(model) => Ok(Some(self.hydrate(model).await?)),
            None => Ok(None),
        }
    }

    /// Login-path lookup: matches either column and hands back the stored
    /// hash next to the public projection.
    pub async fn find_by_email_or_username_with_password(
        &self,
        email_or_username: &str,
    ) -> Result<Option<(User, Option<String>)>> {
        let user = Users::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(email_or_username))
                    .add(users::Column::Email.eq(email_or_username)),
            )
            .one(&self.conn)
            .await
            .context("Failed to query user by email or username")?;

        match user {
            Some(model) => {
                let password_hash = model.password_hash.clone();
                Ok(Some((self.hydrate(model).await?, password_hash)))
            }
            None => Ok(None),
        }
    }

    /// Password hash for one user, without the projection roundtrip.
    pub async fn password_hash(&self, id: &str) -> Result<Option<String>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password hash")?;

        Ok(user.and_then(|u| u.password_hash))
    }

    pub async fn is_username_available(&self, username: &str) -> Result<bool> {
        let existing = Users::find()
            .filter(users::Column::Username.eq(username))
            .select_only()
            .column(users::Column::Id)
            .into_tuple::<String>()
            .one(&self.conn)
            .await
            .context("Failed to check username availability")?;

        Ok(existing.is_none())
    }

    /// Inserts the user row. Runs on the caller's connection so it can share
    /// a transaction with the role mapping; a partial create must roll back.
    pub async fn create<C: ConnectionTrait>(
        &self,
        db: &C,
        data: &NewUser,
        username: &str,
        password_hash: &str,
        provider: AuthProvider,
    ) -> Result<users::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            email: Set(data.email.clone()),
            username: Set(Some(username.to_string())),
            password_hash: Set(Some(password_hash.to_string())),
            provider: Set(provider.as_str().to_string()),
            provider_id: Set(None),
            first_name: Set(data.first_name.clone()),
            last_name: Set(data.last_name.clone()),
            display_name: Set(None),
            phone_number: Set(data.phone_number.clone()),
            profile_image_url: Set(None),
            gender: Set(data.gender.clone()),
            bio: Set(None),
            dob: Set(None),
            tagline: Set(None),
            website: Set(None),
            timezone: Set(None),
            locale: Set(None),
            country_code_iso3: Set(None),
            is_email_verified: Set(data.is_email_verified),
            is_phone_verified: Set(data.is_phone_verified),
            is_active: Set(data.is_active),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        active.insert(db).await.map_err(|e| {
            if UniqueViolation::matches(&e) {
                anyhow::Error::new(UniqueViolation::new("users", e))
            } else {
                anyhow::Error::new(e).context("Failed to insert user")
            }
        })
    }

    /// Overwrites the stored hash. Shares a transaction with the history
    /// append; see `Store::update_password_with_history`.
    pub async fn update_password<C: ConnectionTrait>(
        &self,
        db: &C,
        id: &str,
        password_hash: &str,
    ) -> Result<()> {
        let user = Users::find_by_id(id)
            .one(db)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(Some(password_hash.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(db).await.context("Failed to update password")?;

        Ok(())
    }
}
