use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::{countries, prelude::*};

#[derive(Debug, Clone)]
pub struct Country {
    pub name: String,
    pub code: String,
    pub code_iso3: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<countries::Model> for Country {
    fn from(model: countries::Model) -> Self {
        Self {
            name: model.name,
            code: model.code,
            code_iso3: model.code_iso3,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct CountryRepository {
    conn: DatabaseConnection,
}

impl CountryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_all(&self) -> Result<Vec<Country>> {
        let countries = Countries::find()
            .order_by_asc(countries::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list countries")?;

        Ok(countries.into_iter().map(Country::from).collect())
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<Country>> {
        let country = Countries::find()
            .filter(countries::Column::Code.eq(code))
            .one(&self.conn)
            .await
            .context("Failed to query country by code")?;

        Ok(country.map(Country::from))
    }

    pub async fn find_by_code_iso3(&self, code_iso3: &str) -> Result<Option<Country>> {
        let country = Countries::find()
            .filter(countries::Column::CodeIso3.eq(code_iso3))
            .one(&self.conn)
            .await
            .context("Failed to query country by ISO3 code")?;

        Ok(country.map(Country::from))
    }
}
