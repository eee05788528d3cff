use std::net::SocketAddr;

use tracing::{info, Level};

use attendance_tracker_server::backend::config::AppConfig;
use attendance_tracker_server::backend::{create_router, initialize_backend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let config = AppConfig::load();

    info!("Setting up backend");
    let app_state = initialize_backend(&config).await?;

    let app = create_router(app_state);

    let addr: SocketAddr = config.bind_address.parse()?;
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
