use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const ROLES: &[(&str, &str)] = &[
    ("Administrator", "Full access to every resource"),
    ("Teacher", "Course management and student lookups"),
    ("Student", "Default role for registered users"),
];

const COUNTRIES: &[(&str, &str, &str)] = &[
    ("Australia", "AU", "AUS"),
    ("Bangladesh", "BD", "BGD"),
    ("Brazil", "BR", "BRA"),
    ("Canada", "CA", "CAN"),
    ("China", "CN", "CHN"),
    ("France", "FR", "FRA"),
    ("Germany", "DE", "DEU"),
    ("India", "IN", "IND"),
    ("Indonesia", "ID", "IDN"),
    ("Italy", "IT", "ITA"),
    ("Japan", "JP", "JPN"),
    ("Mexico", "MX", "MEX"),
    ("Netherlands", "NL", "NLD"),
    ("Nigeria", "NG", "NGA"),
    ("Pakistan", "PK", "PAK"),
    ("Singapore", "SG", "SGP"),
    ("Spain", "ES", "ESP"),
    ("United Arab Emirates", "AE", "ARE"),
    ("United Kingdom", "GB", "GBR"),
    ("United States", "US", "USA"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let now = chrono::Utc::now().to_rfc3339();

        for (name, description) in ROLES {
            let insert = Query::insert()
                .into_table(Roles)
                .columns([
                    crate::entities::roles::Column::Name,
                    crate::entities::roles::Column::Description,
                    crate::entities::roles::Column::CreatedAt,
                ])
                .values_panic([(*name).into(), (*description).into(), now.clone().into()])
                .to_owned();

            manager.exec_stmt(insert).await?;
        }

        for (name, code, code_iso3) in COUNTRIES {
            let insert = Query::insert()
                .into_table(Countries)
                .columns([
                    crate::entities::countries::Column::Name,
                    crate::entities::countries::Column::Code,
                    crate::entities::countries::Column::CodeIso3,
                    crate::entities::countries::Column::CreatedAt,
                    crate::entities::countries::Column::UpdatedAt,
                ])
                .values_panic([
                    (*name).into(),
                    (*code).into(),
                    (*code_iso3).into(),
                    now.clone().into(),
                    now.clone().into(),
                ])
                .to_owned();

            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(Query::delete().from_table(Countries).to_owned())
            .await?;
        manager
            .exec_stmt(Query::delete().from_table(Roles).to_owned())
            .await?;

        Ok(())
    }
}
