// CAT token service entry point.

use anyhow::{Context, Result};
use cat_token_service::config::ServiceConfig;
use cat_token_service::keys::KeyRegistry;
use cat_token_service::server::{build_router, AppState};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env().context("read service configuration")?;
    if config.using_default_key {
        tracing::warn!(
            "HS256_KEY not set; using the built-in default signing key, which is unsafe outside development"
        );
    }

    let registry =
        Arc::new(KeyRegistry::from_hex(&config.hs256_key_hex).context("initialize key registry")?);
    let router = build_router(AppState { registry });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .context("bind HTTP listener")?;
    tracing::info!(addr = %listener.local_addr()?, "token service listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("serve HTTP")?;

    Ok(())
}
