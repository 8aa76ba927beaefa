//! Entry point: load config (env + `.env`), run startup hooks, then serve.

use order_backend::{build, HostConfig};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("order_backend=info,tower_http=info")),
        )
        .init();

    let config = HostConfig::from_env()?;
    let host = build(&config).await?;
    let ready = host.start().await?;

    let listener = TcpListener::bind(config.bind).await?;
    ready.serve(listener).await?;
    Ok(())
}
