use scientia::{AppState, Config, auth::SessionStore, router, storage};
use std::net::SocketAddr;
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    if !config.is_in_memory() {
        if let Some(parent) = config.database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut conn = storage::open(&config.database_path)?;
    storage::init_schema(&conn)?;
    if config.seed_sample_data {
        storage::seed_sample_data(&mut conn)?;
    }
    info!(database = %config.database_path.display(), "database opened");

    let app = router(AppState::new(conn, SessionStore::new(config.session_idle)));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
