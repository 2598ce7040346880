use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use docflow::{
    auth::jwt::JwtService, config::AppConfig, routes, state::AppState, store::MemoryStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        host = %config.server_host,
        port = config.server_port,
        notify_document_owner = config.notify_document_owner,
        "loaded docflow configuration"
    );

    let store = Arc::new(MemoryStore::new());
    let jwt = JwtService::from_config(&config)?;
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let state = AppState::new(config, store, jwt);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "docflow listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
