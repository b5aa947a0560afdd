//! Session registry
//!
//! Concurrent map of username → [`Session`] shared by every connection
//! handler. Membership changes take the write lock; fan-out takes the read
//! lock only long enough to snapshot recipients, so no delivery ever
//! happens while the lock is held.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::DEFAULT_WRITE_TIMEOUT;
use crate::error::{AppError, SendError};
use crate::message::ServerMessage;
use crate::session::Session;

/// Directory of active sessions
#[derive(Debug)]
pub struct Registry {
    /// All joined sessions: username -> Session
    sessions: RwLock<HashMap<String, Session>>,
    /// How long one recipient may keep a delivery waiting
    write_timeout: Duration,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_write_timeout(DEFAULT_WRITE_TIMEOUT)
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_write_timeout(write_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            write_timeout,
        }
    }

    /// Register a session under its name
    ///
    /// Fails with `NameTaken` if the name is already present; the existing
    /// entry is never replaced.
    pub async fn add(&self, session: Session) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(&session.name) {
            return Err(AppError::NameTaken(session.name));
        }

        debug!("Registered '{}' (total sessions: {})", session.name, sessions.len() + 1);
        sessions.insert(session.name.clone(), session);
        Ok(())
    }

    /// Drop the session registered under `name`, if any
    pub async fn remove(&self, name: &str) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(name).is_some() {
            debug!("Unregistered '{}' (total sessions: {})", name, sessions.len());
        }
    }

    /// Deliver `msg` to every session except `exclude`
    ///
    /// Recipients are served concurrently, each waiting for outbox space
    /// up to the write timeout. A closed outbox or a peer stalled past the
    /// timeout is logged and skipped; the session stays registered until
    /// its own handler removes it. Returns how many sessions received the
    /// message.
    pub async fn broadcast(&self, exclude: Option<&str>, msg: ServerMessage) -> usize {
        let recipients: Vec<Session> = {
            let sessions = self.sessions.read().await;
            sessions
                .values()
                .filter(|s| Some(s.name.as_str()) != exclude)
                .cloned()
                .collect()
        };

        let deliveries = recipients.iter().map(|session| {
            let msg = msg.clone();
            async move {
                match session.send_timeout(msg, self.write_timeout).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Failed to deliver to '{}': {}", session.name, e);
                        false
                    }
                }
            }
        });

        join_all(deliveries)
            .await
            .into_iter()
            .filter(|delivered| *delivered)
            .count()
    }

    /// Deliver `msg` to exactly one named session
    ///
    /// A recipient whose connection is already shutting down counts as
    /// not found; one stalled past the write timeout is `DeliveryTimeout`.
    pub async fn unicast(&self, recipient: &str, msg: ServerMessage) -> Result<(), AppError> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions.get(recipient).cloned()
        };

        let Some(session) = session else {
            return Err(AppError::RecipientNotFound(recipient.to_string()));
        };

        session
            .send_timeout(msg, self.write_timeout)
            .await
            .map_err(|e| {
                warn!("Failed to deliver to '{}': {}", recipient, e);
                match e {
                    SendError::Timeout => AppError::DeliveryTimeout(recipient.to_string()),
                    SendError::ChannelClosed => AppError::RecipientNotFound(recipient.to_string()),
                }
            })
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.sessions.read().await.contains_key(name)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Registered usernames, sorted
    pub async fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}
