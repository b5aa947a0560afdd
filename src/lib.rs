//! Line-based TCP Chat Server Library
//!
//! A minimal chat service: clients authenticate with a username, then
//! exchange broadcast and private messages over a newline-delimited text
//! protocol.
//!
//! # Features
//! - `JOIN:<username>` handshake with unique names
//! - `MSG:<text>` broadcast to every other session
//! - `P_MSG:<recipient>:<text>` private messages (payload shift-encoded)
//! - `QUIT` and disconnect handling with join/leave announcements
//!
//! # Architecture
//! - `Registry` is the only shared state: a username → `Session` map
//!   behind a read/write lock, injected into every handler
//! - Each connection runs `handle_connection` as its own task, plus a
//!   writer task draining that connection's outbox
//! - Handlers never talk to each other directly, only through the registry
//!
//! # Example
//! ```ignore
//! use line_chat::{ChatServer, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = ChatServer::bind(Config::default()).await.unwrap();
//!     server.run().await;
//! }
//! ```

pub mod cipher;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use cipher::ShiftCipher;
pub use config::Config;
pub use error::{AppError, SendError};
pub use handler::{handle_connection, ConnectionState};
pub use message::{Command, ServerMessage};
pub use registry::Registry;
pub use server::ChatServer;
pub use session::Session;
pub use types::ConnectionId;
