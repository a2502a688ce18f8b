//! Gateway server: loads the config, wires both tenant pools and the cache, and serves.
//!
//! Run from repo root: `cargo run -p gateway-server`

use fishbase_gateway::{app, config_path_from_env, load_from_path, AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fishbase_gateway=info")),
        )
        .init();

    let path = config_path_from_env();
    tracing::info!(path = %path.display(), "loading config");
    let config = load_from_path(&path).await?;
    let bind = config.bind.clone();
    let state = AppState::from_config(config)?;

    let listener = TcpListener::bind(&bind).await?;
    tracing::info!("Gateway listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
