use std::sync::Arc;

use diesel::{
    r2d2::{ConnectionManager, PooledConnection},
    sqlite::SqliteConnection,
};

use crate::{
    backup::BackupService,
    config::AppConfig,
    db::DbPool,
    error::{AppError, AppResult},
};

pub type SqlitePooledConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Process-wide handles. Built once at startup and shared by clone; the pool
/// is never rebuilt while the process runs.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<AppConfig>,
    pub backups: BackupService,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        let backups = BackupService::from_config(&config);
        Self {
            pool,
            config: Arc::new(config),
            backups,
        }
    }

    pub fn db(&self) -> AppResult<SqlitePooledConnection> {
        self.pool
            .get()
            .map_err(|err| AppError::internal(format!("database pool error: {err}")))
    }
}
