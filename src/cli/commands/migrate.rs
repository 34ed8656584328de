use anyhow::Context;

use crate::config::config;
use crate::database::DatabaseManager;

/// Apply the bundled migrations and exit
pub async fn handle() -> anyhow::Result<()> {
    let mut database = config().database.clone();
    // connect() would migrate too when enabled; do it explicitly either way
    database.run_migrations = false;

    let pool = DatabaseManager::connect(&database)
        .await
        .context("failed to connect to database")?;
    DatabaseManager::migrate(&pool).await?;
    pool.close().await;
    Ok(())
}
