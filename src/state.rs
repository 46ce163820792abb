use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::repo::{PgUserRepo, UserRepo};
use crate::config::AppConfig;
use crate::db;
use crate::shifts::repo::{PgShiftRepo, ShiftRepo};
use crate::storage::{LocalStorage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub shifts: Arc<dyn ShiftRepo>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    /// Reads config, connects to Postgres and prepares the upload directory.
    /// Returns the pool too so the caller can run migrations.
    pub async fn init() -> anyhow::Result<(Self, PgPool)> {
        let config = Arc::new(AppConfig::from_env()?);
        let pool = db::connect(&config.database_url).await?;

        let storage = Arc::new(LocalStorage::new(config.upload_dir.clone()).await?)
            as Arc<dyn StorageClient>;

        let state = Self::from_parts(
            config,
            Arc::new(PgUserRepo::new(pool.clone())),
            Arc::new(PgShiftRepo::new(pool.clone())),
            storage,
        );
        Ok((state, pool))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepo>,
        shifts: Arc<dyn ShiftRepo>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        Self {
            config,
            users,
            shifts,
            storage,
        }
    }
}
