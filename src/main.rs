use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use ecoconnect::config::AppConfig;
use ecoconnect::db;
use ecoconnect::routes;
use ecoconnect::state::AppState;
use ecoconnect::store::{MemoryStorage, PgStorage, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        server_host = %config.server_host,
        server_port = config.server_port,
        environment = %config.environment,
        session_ttl_days = config.session_ttl_days,
        rate_limit_max_requests = config.rate_limit_max_requests,
        rate_limit_window_secs = config.rate_limit_window_secs,
        static_dir = config.static_dir.as_deref().unwrap_or("<none>"),
        "loaded server configuration"
    );

    let store: Arc<dyn Storage> = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = db::init_pool(database_url, config.database_max_pool_size)?;
            let storage = PgStorage::new(pool);
            storage.run_migrations()?;
            let swept = storage.delete_expired_sessions().await?;
            if swept > 0 {
                tracing::info!(swept, "removed expired sessions");
            }
            Arc::new(storage)
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set; serving demo data from memory, state is lost on restart"
            );
            Arc::new(MemoryStorage::with_demo_data()?)
        }
    };

    let state = AppState::new(config, store);
    let listen_addr: SocketAddr =
        format!("{}:{}", state.config.server_host, state.config.server_port).parse()?;
    let router = routes::create_router(state);

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
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
