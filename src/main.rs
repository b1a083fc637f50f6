use std::net::SocketAddr;
use std::sync::Arc;

use botica::{AppConfig, AppState, LogMailer, MemoryStore};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "botica=info".into()),
        )
        .init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load configuration, using defaults");
            AppConfig::default()
        }
    };

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let state = AppState::from_config(&config, MemoryStore::new(), Arc::new(LogMailer));
    botica::serve(state, addr).await
}
