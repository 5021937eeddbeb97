use discourse::{app, config::Config, db::Store, logging, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let config = Config::from_env()?;
    if config.guest_host_user_id.is_none() {
        tracing::warn!("GUEST_HOST_USER_ID is not set, guest creation will fail");
    }

    let store = Store::open(&config.database_url, config.db_max_connections).await?;
    let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str()).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    let app = app(AppState::new(store.clone(), config));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "could not listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
