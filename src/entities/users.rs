use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// UUID v4, generated at creation time
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub email: Option<String>,

    #[sea_orm(unique)]
    pub username: Option<String>,

    /// Argon2id PHC hash. Absent for accounts from non-credential providers.
    pub password_hash: Option<String>,

    /// Identity provider (`credentials` is the only one issued today).
    pub provider: String,

    pub provider_id: Option<String>,

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

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_roles::Entity")]
    UserRoles,

    #[sea_orm(has_many = "super::user_sessions::Entity")]
    UserSessions,

    #[sea_orm(has_many = "super::user_tokens::Entity")]
    UserTokens,

    #[sea_orm(has_many = "super::user_password_history::Entity")]
    UserPasswordHistory,
}

impl Related<super::user_roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserRoles.def()
    }
}

impl Related<super::user_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserSessions.def()
    }
}

impl Related<super::user_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserTokens.def()
    }
}

impl Related<super::user_password_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserPasswordHistory.def()
    }
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_roles::Relation::Roles.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_roles::Relation::Users.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
