use std::sync::Arc;

use tower_sessions_sqlx_store::SqliteStore;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, GiftService, SeaOrmAuthService, SeaOrmGiftService, UploadStore,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub uploads: UploadStore,

    /// Session rows live in the same database as users and gifts.
    pub session_store: SqliteStore,

    pub auth_service: Arc<dyn AuthService>,

    pub gift_service: Arc<dyn GiftService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let session_store = SqliteStore::new(store.conn.get_sqlite_connection_pool().clone());
        session_store
            .migrate()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to prepare session table: {e}"))?;

        let uploads = UploadStore::new(&config.general.uploads_path);

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        let gift_service = Arc::new(SeaOrmGiftService::new(store.clone(), uploads.clone()))
            as Arc<dyn GiftService + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(config),
            store,
            uploads,
            session_store,
            auth_service,
            gift_service,
        })
    }
}
