use std::sync::Arc;

use anyhow::Context;
use clap::Args;

use crate::app::{cors_layer, router, AppState};
use crate::auth::SessionKeys;
use crate::config::config;
use crate::database::{DatabaseManager, MemoryStore, PgStore, Store};
use crate::views::renderer_for;

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (overrides TASKBOARD_PORT / PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Keep data in memory instead of PostgreSQL")]
    pub memory: bool,
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    let config = config();
    tracing::info!("Starting taskboard in {:?} mode", config.environment);

    let store: Arc<dyn Store> = if args.memory {
        tracing::warn!("Using in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to database")?;
        Arc::new(PgStore::new(pool))
    };

    let sessions = SessionKeys::from_config(&config.session).context("SESSION_SECRET must be set")?;
    let state = AppState::new(store, renderer_for(config.views.renderer), sessions);

    let mut app = router(state);
    if let Some(cors) = cors_layer(&config.security) {
        app = app.layer(cors);
    }

    let port = args.port.unwrap_or(config.server.port);
    let bind_addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("taskboard listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
