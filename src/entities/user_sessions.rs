use sea_orm::entity::prelude::*;

/// One row per issued bearer token. A session is live while `is_active`
/// is set and `expires_at` is in the future; revocation is row deletion.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: String,

    pub token: String,

    pub ip_address: Option<String>,

    pub user_agent: Option<String>,

    /// RFC 3339, UTC
    pub expires_at: String,

    pub is_active: bool,

    pub created_at: String,

    pub last_used_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
