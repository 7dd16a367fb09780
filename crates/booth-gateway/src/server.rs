use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use crate::routes::build_router;
use crate::state::AppState;

/// Binds the gateway and serves it until ctrl-c.
pub async fn run_server(bind: &str, state: AppState) -> Result<()> {
    let bind_addr = bind
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid --bind '{bind}'"))?;
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind gateway on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound gateway address")?;
    tracing::info!(addr = %local_addr, "photo booth gateway listening");

    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("gateway server exited unexpectedly")?;
    Ok(())
}
