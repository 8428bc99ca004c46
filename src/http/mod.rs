//! HTTP surface, built only when the `http` feature is enabled.
//!
//! Specified in the external interfaces only "for interface
//! compatibility" — a thin Axum router over [`crate::director::Director`],
//! no authentication scheme (the collaborator this mirrors has none).

mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use log::info;

use crate::director::Director;

pub use routes::build_router;

/// Bind and serve the HTTP surface until the process exits or the
/// listener fails.
pub async fn run_http_server(director: Arc<Director>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("binding HTTP listener")?;
    info!("[http] listening on {}", addr);

    let router = build_router(director);
    axum::serve(listener, router)
        .await
        .context("serving HTTP router")?;
    Ok(())
}
