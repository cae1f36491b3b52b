//! user-nl HTTP 接口
//!
//! 启动: cargo run --bin user-nl-web --features web

#![cfg(feature = "web")]

use std::sync::Arc;

use anyhow::Context;
use tower_http::trace::TraceLayer;

use user_nl::config::load_config;
use user_nl::core::ServiceBuilder;
use user_nl::http::{cors_layer, router, AppState};
use user_nl::observability;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config = load_config(None).context("Failed to load configuration")?;
    let chain = ServiceBuilder::new(config.clone())
        .build()
        .context("Failed to create LLM backend")?;
    let bind = config.server.bind.clone();
    let cors = cors_layer(&config.server.frontend_origin)?;

    let app = router(Arc::new(AppState { config, chain })).layer(
        tower::ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!("user-nl-web listening on http://{}", bind);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
