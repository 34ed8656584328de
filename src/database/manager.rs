use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::store::StoreError;

/// Builds and prepares the PostgreSQL pool behind `PgStore`
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connect using `DATABASE_URL` (via config) and optionally apply migrations
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
        let redacted_url = Self::redacted(url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;
        info!("Created database pool for: {}", redacted_url);

        if config.run_migrations {
            Self::migrate(&pool).await?;
        }

        Ok(pool)
    }

    /// Apply the bundled schema in `migrations/`
    pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Connection string with the password stripped, for logs
    fn redacted(url: &str) -> Result<String, StoreError> {
        let mut parsed = url::Url::parse(url).map_err(|_| StoreError::InvalidDatabaseUrl)?;
        if parsed.password().is_some() {
            parsed
                .set_password(Some("****"))
                .map_err(|_| StoreError::InvalidDatabaseUrl)?;
        }
        Ok(parsed.into())
    }
}
