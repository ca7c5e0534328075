use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Roles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(UserRoles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(UserSessions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(UserTokens)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(UserPasswordHistory)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Countries)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // One session row per (user, token); lookups during the access guard
        // hit this index on every authenticated request.
        manager
            .create_index(
                Index::create()
                    .name("idx_user_sessions_user_token")
                    .table(UserSessions)
                    .col(crate::entities::user_sessions::Column::UserId)
                    .col(crate::entities::user_sessions::Column::Token)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_password_history_user")
                    .table(UserPasswordHistory)
                    .col(crate::entities::user_password_history::Column::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_tokens_user_token")
                    .table(UserTokens)
                    .col(crate::entities::user_tokens::Column::UserId)
                    .col(crate::entities::user_tokens::Column::Token)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Countries).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserPasswordHistory).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserTokens).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserSessions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserRoles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
