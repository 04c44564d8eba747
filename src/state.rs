use crate::config::AppConfig;
use crate::{db, users};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Open the store, apply migrations and make sure the bootstrap admin exists.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        Self::bootstrap(config).await
    }

    pub async fn bootstrap(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let db = db::connect(&config.database_url).await?;
        db::migrate(&db).await?;
        users::services::ensure_admin(&db, &config.admin).await?;
        Ok(Self { db, config })
    }

    #[cfg(test)]
    pub async fn for_tests() -> Self {
        Self::bootstrap(Arc::new(AppConfig::for_tests()))
            .await
            .expect("test state bootstraps")
    }
}
