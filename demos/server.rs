//! Demo server: serves the entities declared in `ENTITIES_PATH` (default `demos/entities.yaml`).
//!
//! Run from repo root: `cargo run --example server`

use entity_rest::{app, connect, ensure_tables, load_registry, AppState, Settings};
use std::path::PathBuf;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("entity_rest=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let entities_path = settings
        .entities_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("demos/entities.yaml"));
    let registry = load_registry(&entities_path).await?;
    let pool = connect(&settings).await?;
    if settings.create_tables {
        ensure_tables(&pool, &registry).await?;
    }

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("entity-rest listening on http://{}", listener.local_addr()?);
    let state = AppState::new(pool, registry, settings);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
