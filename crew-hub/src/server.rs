//! HTTP server for crew-hub

use crate::api;
use crate::state::AppState;
use tracing::info;

/// Start the HTTP server
pub async fn start(bind_addr: &str, state: AppState) -> anyhow::Result<()> {
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("HTTP server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
