use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};

use crate::entities::{prelude::*, roles, user_roles};

/// Role names seeded by migration. Registration may assign any of these
/// except `Administrator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleName {
    Administrator,
    Teacher,
    Student,
}

impl RoleName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Administrator => "Administrator",
            Self::Teacher => "Teacher",
            Self::Student => "Student",
        }
    }

    /// Roles a self-service registration is allowed to request.
    #[must_use]
    pub const fn assignable() -> &'static [Self] {
        &[Self::Teacher, Self::Student]
    }
}

#[derive(Debug, Clone)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl From<roles::Model> for Role {
    fn from(model: roles::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
        }
    }
}

pub struct RoleRepository {
    conn: DatabaseConnection,
}

impl RoleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_all(&self) -> Result<Vec<Role>> {
        let roles = Roles::find()
            .all(&self.conn)
            .await
            .context("Failed to list roles")?;

        Ok(roles.into_iter().map(Role::from).collect())
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Role>> {
        let role = Roles::find()
            .filter(roles::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query role by name")?;

        Ok(role.map(Role::from))
    }

    pub async fn find_roles_by_user_id(&self, user_id: &str) -> Result<Vec<Role>> {
        let mappings = UserRoles::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .find_also_related(Roles)
            .all(&self.conn)
            .await
            .context("Failed to query roles for user")?;

        Ok(mappings
            .into_iter()
            .filter_map(|(_, role)| role.map(Role::from))
            .collect())
    }

    /// Writes the user↔role mapping. Runs on the caller's connection so user
    /// creation and role assignment commit or roll back together.
    pub async fn map_role_to_user<C: ConnectionTrait>(
        &self,
        db: &C,
        role_id: i32,
        user_id: &str,
    ) -> Result<()> {
        let active = user_roles::ActiveModel {
            user_id: Set(user_id.to_string()),
            role_id: Set(role_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active
            .insert(db)
            .await
            .context("Failed to map role to user")?;

        Ok(())
    }
}
