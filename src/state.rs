use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, LocalStorageService, SeaOrmAuthService, SeaOrmUserService, StorageService,
    UserService,
};

/// Process-wide dependency graph, assembled once at startup. Services are
/// stateless; everything mutable lives in the database.
#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub token_issuer: TokenIssuer,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<dyn UserService>,

    pub storage: Arc<dyn StorageService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let token_issuer = TokenIssuer::new(&config.jwt);

        let user_service: Arc<dyn UserService> = Arc::new(SeaOrmUserService::new(
            store.clone(),
            config.security.clone(),
        ));

        let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            user_service.clone(),
            token_issuer.clone(),
        ));

        let storage: Arc<dyn StorageService> =
            Arc::new(LocalStorageService::new(config.storage.clone()));

        Ok(Self {
            config,
            store,
            token_issuer,
            auth_service,
            user_service,
            storage,
        })
    }
}
