//! Line protocol connection handler
//!
//! Drives one connection through
//! `Connecting → Authenticating → Active → Closing → Closed`:
//! the `JOIN` handshake, the command loop, and registry cleanup.

use std::sync::Arc;

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

use crate::cipher::ShiftCipher;
use crate::config::Config;
use crate::error::{AppError, SendError};
use crate::message::{Command, ServerMessage};
use crate::registry::Registry;
use crate::session::Session;
use crate::types::ConnectionId;

/// Protocol state of one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Authenticating,
    Active,
    Closing,
    Closed,
}

/// Handle a new connection
///
/// Runs the protocol to completion. Registry cleanup happens on every exit
/// path. The transport is closed once the writer task drains, or dropped
/// if the peer does not take its pending lines within `write_timeout`.
/// A read failure other than a clean disconnect is returned after cleanup.
pub async fn handle_connection<S>(
    stream: S,
    peer: String,
    registry: Arc<Registry>,
    config: Arc<Config>,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let id = ConnectionId::new();
    debug!("Connection {} accepted from {}", id, peer);

    let framed = Framed::new(stream, LinesCodec::new_with_max_length(config.max_line_length));
    let (mut sink, lines) = framed.split();

    // Every line for this client goes through the outbox, replies included
    let (outbox, mut outbox_rx) = mpsc::channel::<ServerMessage>(config.outbox_capacity);

    let mut writer = tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            sink.send(msg.to_string()).await?;
        }
        sink.close().await?;
        Ok::<_, LinesCodecError>(())
    });

    let mut connection = Connection {
        id,
        registry,
        cipher: ShiftCipher::new(config.cipher_key),
        outbox,
        lines,
        state: ConnectionState::Connecting,
        username: None,
        announced: false,
        read_error: None,
    };
    connection.run().await;
    let read_error = connection.read_error.take();
    drop(connection);

    // Finishes once the registry and in-flight broadcasts release the outbox
    match timeout(config.write_timeout, &mut writer).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => debug!("Write side of {} failed: {}", id, e),
        Ok(Err(e)) => error!("Writer task for {} panicked: {}", id, e),
        Err(_) => {
            warn!("Connection {} did not drain its output in time, dropping it", id);
            writer.abort();
        }
    }

    debug!("Connection {} closed", id);

    match read_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct Connection<R> {
    id: ConnectionId,
    registry: Arc<Registry>,
    cipher: ShiftCipher,
    outbox: mpsc::Sender<ServerMessage>,
    lines: R,
    state: ConnectionState,
    /// Set once the registry accepted the JOIN
    username: Option<String>,
    /// Set once the session reached Active and its join was announced
    announced: bool,
    read_error: Option<AppError>,
}

impl<R> Connection<R>
where
    R: Stream<Item = Result<String, LinesCodecError>> + Unpin,
{
    async fn run(&mut self) {
        loop {
            let next = match self.state {
                ConnectionState::Connecting => ConnectionState::Authenticating,
                ConnectionState::Authenticating => self.authenticate().await,
                ConnectionState::Active => self.serve_next().await,
                ConnectionState::Closing => {
                    self.close().await;
                    ConnectionState::Closed
                }
                ConnectionState::Closed => return,
            };

            if next != self.state {
                debug!("Connection {}: {:?} -> {:?}", self.id, self.state, next);
                self.state = next;
            }
        }
    }

    /// Read the next trimmed line; `None` on disconnect or read failure
    async fn read_line(&mut self) -> Option<String> {
        match self.lines.next().await {
            Some(Ok(line)) => Some(line.trim().to_string()),
            Some(Err(e)) => {
                warn!("Read error on {}: {}", self.id, e);
                self.read_error = Some(e.into());
                None
            }
            None => {
                debug!("Connection {} closed by peer", self.id);
                None
            }
        }
    }

    async fn reply(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.outbox
            .send(msg)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    async fn authenticate(&mut self) -> ConnectionState {
        let Some(line) = self.read_line().await else {
            return ConnectionState::Closing;
        };

        let name = match Command::parse_join(&line) {
            Ok(name) => name,
            Err(e) => {
                warn!("Connection {} sent invalid handshake '{}'", self.id, line);
                let _ = self.reply(e.into()).await;
                return ConnectionState::Closing;
            }
        };

        let session = Session::new(name.clone(), self.outbox.clone());
        if let Err(e) = self.registry.add(session).await {
            info!("Connection {} rejected: {}", self.id, e);
            let _ = self.reply(e.into()).await;
            return ConnectionState::Closing;
        }

        info!("Connection {} joined as '{}'", self.id, name);
        self.username = Some(name.clone());

        if self
            .reply(ServerMessage::Welcome {
                username: name.clone(),
            })
            .await
            .is_err()
        {
            return ConnectionState::Closing;
        }

        self.registry
            .broadcast(Some(&name), ServerMessage::Joined { username: name.clone() })
            .await;
        self.announced = true;

        ConnectionState::Active
    }

    /// Read and dispatch one command
    async fn serve_next(&mut self) -> ConnectionState {
        let Some(line) = self.read_line().await else {
            return ConnectionState::Closing;
        };
        if line.is_empty() {
            return ConnectionState::Active;
        }

        let Some(name) = self.username.clone() else {
            return ConnectionState::Closing;
        };

        let outcome = match Command::parse(&line) {
            Command::Message(body) if body.is_empty() => {
                self.reply(malformed("invalid format, use MSG:<message>"))
                    .await
            }
            Command::Message(body) => {
                self.registry
                    .broadcast(
                        Some(&name),
                        ServerMessage::Chat {
                            from: name.clone(),
                            content: body,
                        },
                    )
                    .await;
                Ok(())
            }
            Command::PrivateMessage { recipient, body }
                if recipient.is_empty() || body.is_empty() =>
            {
                self.reply(malformed(
                    "invalid format, use P_MSG:<recipient>:<message>",
                ))
                .await
            }
            Command::PrivateMessage { recipient, body } => {
                let msg = ServerMessage::Private {
                    from: name.clone(),
                    payload: self.cipher.encode(&body),
                };
                match self.registry.unicast(&recipient, msg).await {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        debug!("Private message from '{}' undelivered: {}", name, e);
                        self.reply(e.into()).await
                    }
                }
            }
            Command::Quit => return ConnectionState::Closing,
            Command::Join(_) => {
                self.reply(ServerMessage::error(format!("already joined as {}", name)))
                    .await
            }
            Command::Unknown(word) => {
                warn!("Unknown command '{}' from '{}'", word, name);
                self.reply(ServerMessage::error(format!("unknown command '{}'", word)))
                    .await
            }
        };

        match outcome {
            Ok(()) => ConnectionState::Active,
            // Our own writer is gone: the transport is dead
            Err(_) => ConnectionState::Closing,
        }
    }

    async fn close(&mut self) {
        let Some(name) = self.username.as_deref() else {
            return;
        };

        self.registry.remove(name).await;
        if !self.announced {
            debug!("'{}' never became active, leaving silently", name);
            return;
        }

        self.registry
            .broadcast(
                Some(name),
                ServerMessage::Left {
                    username: name.to_string(),
                },
            )
            .await;

        info!("'{}' left the chat", name);
    }
}

fn malformed(reason: &str) -> ServerMessage {
    AppError::MalformedCommand(reason.to_string()).into()
}
