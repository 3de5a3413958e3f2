// Asset Flow - Web Server
// REST API with Axum over the snapshot store

use anyhow::{Context, Result};
use asset_flow::api::{router, AppState};
use asset_flow::{init_tracing, Config, Dashboard, SqliteSnapshotStore};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    println!("🌐 Asset Flow - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::from_env();

    let store = SqliteSnapshotStore::open(&config.database_path)
        .with_context(|| format!("failed to open database at {}", config.database_path.display()))?
        .with_actor("api");
    info!(path = %config.database_path.display(), "database opened");

    let mut dashboard = Dashboard::new(store);
    dashboard.load();

    let addr = config.bind_addr.clone();
    let app = router(AppState::new(dashboard, config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    println!("\n🚀 Server running on http://{addr}");
    println!("   API: http://{addr}/api/summary");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("server stopped unexpectedly")?;

    Ok(())
}
