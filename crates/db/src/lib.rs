use std::time::Duration;

use sqlx::{
    PgPool,
    migrate::{MigrateError, Migrator},
    postgres::PgPoolOptions,
};
use thiserror::Error;
use tracing::info;

pub mod models;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Error)]
pub enum DBServiceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] MigrateError),
}

#[derive(Clone)]
pub struct DBService {
    pub pool: PgPool,
}

impl DBService {
    const MAX_CONNECTIONS: u32 = 10;
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connect and bring the schema up to date.
    pub async fn connect(database_url: &str) -> Result<Self, DBServiceError> {
        let pool = Self::pool_options().connect(database_url).await?;
        MIGRATOR.run(&pool).await?;
        info!(
            migrations = MIGRATOR.iter().count(),
            "Database connected and migrations applied"
        );
        Ok(Self { pool })
    }

    /// Build a pool without opening a connection; used by tooling and tests.
    pub fn connect_lazy(database_url: &str) -> Result<Self, DBServiceError> {
        let pool = Self::pool_options().connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    fn pool_options() -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(Self::MAX_CONNECTIONS)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
    }
}
