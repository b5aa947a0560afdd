//! Line chat server - Entry Point
//!
//! Loads configuration, binds the listener and serves until ctrl-c.

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use line_chat::{ChatServer, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=line_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("line_chat=info")),
        )
        .init();

    let config = Config::from_env()?;
    let server = ChatServer::bind(config).await?;
    info!("Bound to {}", server.local_addr()?);

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}
