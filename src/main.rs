use todo_api::app::{app, AppState};
use todo_api::config;
use todo_api::database::MySqlDatabase;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up MYSQLDB_* etc.
    let _ = dotenvy::dotenv();

    let config = config::config();
    todo_api::logging::init(&config.logging)?;
    tracing::info!("Starting to-do API in {:?} mode", config.environment);
    tracing::debug!(
        host = %config.database.host,
        port = config.database.port,
        database = %config.database.database,
        "Database settings"
    );

    let state = AppState::new(MySqlDatabase::new(&config.database));

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
