//! Session struct definition
//!
//! Represents an authenticated client: its username and the outbox feeding
//! its connection's writer task.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;

use crate::error::SendError;
use crate::message::ServerMessage;

/// Authenticated client
///
/// Cloning a session clones the outbox handle, not the connection.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique (within the registry) username
    pub name: String,
    /// Server → Client message channel
    pub sender: mpsc::Sender<ServerMessage>,
}

impl Session {
    /// Create a new session with the given name and sender channel
    pub fn new(name: impl Into<String>, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }

    /// Send a message to this session, waiting for outbox space
    ///
    /// Returns an error if the channel is closed (client disconnected).
    pub async fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Send a message, waiting at most `limit` for outbox space
    pub async fn send_timeout(&self, msg: ServerMessage, limit: Duration) -> Result<(), SendError> {
        self.sender.send_timeout(msg, limit).await.map_err(|e| match e {
            SendTimeoutError::Timeout(_) => SendError::Timeout,
            SendTimeoutError::Closed(_) => SendError::ChannelClosed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(name: &str) -> ServerMessage {
        ServerMessage::Joined {
            username: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_session_send() {
        let (tx, mut rx) = mpsc::channel(4);
        let session = Session::new("alice", tx);

        session.send(joined("bob")).await.unwrap();
        assert_eq!(rx.recv().await, Some(joined("bob")));
    }

    #[tokio::test]
    async fn test_session_send_after_disconnect() {
        let (tx, rx) = mpsc::channel(4);
        let session = Session::new("alice", tx);
        drop(rx);

        assert_eq!(session.send(joined("bob")).await, Err(SendError::ChannelClosed));
        assert_eq!(
            session
                .send_timeout(joined("bob"), Duration::from_millis(10))
                .await,
            Err(SendError::ChannelClosed)
        );
    }

    #[tokio::test]
    async fn test_send_timeout_waits_for_reader() {
        let (tx, mut rx) = mpsc::channel(1);
        let session = Session::new("alice", tx);
        session.send(joined("bob")).await.unwrap();

        let reader = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let first = rx.recv().await;
            let second = rx.recv().await;
            (first, second)
        });

        session
            .send_timeout(joined("carol"), Duration::from_secs(2))
            .await
            .unwrap();
        let (first, second) = reader.await.unwrap();
        assert_eq!(first, Some(joined("bob")));
        assert_eq!(second, Some(joined("carol")));
    }

    #[tokio::test]
    async fn test_send_timeout_gives_up_on_stalled_reader() {
        let (tx, _rx) = mpsc::channel(1);
        let session = Session::new("alice", tx);
        session.send(joined("bob")).await.unwrap();

        assert_eq!(
            session
                .send_timeout(joined("carol"), Duration::from_millis(20))
                .await,
            Err(SendError::Timeout)
        );
    }
}
