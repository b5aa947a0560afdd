//! ChatServer accept loop
//!
//! Owns the listening socket and the shared [`Registry`], spawning one
//! handler task per accepted connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Config;
use crate::error::AppError;
use crate::handler::handle_connection;
use crate::registry::Registry;

/// The chat server: listener plus process-wide registry
pub struct ChatServer {
    listener: TcpListener,
    registry: Arc<Registry>,
    config: Arc<Config>,
}

impl ChatServer {
    /// Bind the listener described by `config`
    pub async fn bind(config: Config) -> Result<Self, AppError> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        Ok(Self {
            listener,
            registry: Arc::new(Registry::with_write_timeout(config.write_timeout)),
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, AppError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared handle to the session registry
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Accept connections forever
    pub async fn run(self) {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Accept connections until `shutdown` resolves
    ///
    /// Handlers already running are left to finish on their own.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!("Chat server listening on {}", self.config.bind_addr);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Chat server shutting down");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        info!("New connection from {}", addr);
                        let registry = Arc::clone(&self.registry);
                        let config = Arc::clone(&self.config);

                        // Spawn handler task for each connection
                        tokio::spawn(async move {
                            if let Err(e) =
                                handle_connection(stream, addr.to_string(), registry, config).await
                            {
                                error!("Connection handler error: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                },
            }
        }
    }
}
