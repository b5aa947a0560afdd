//! Message protocol definitions
//!
//! Newline-delimited text protocol. Each client line is parsed into a
//! [`Command`] before dispatch; each [`ServerMessage`] renders to exactly
//! one line via `Display`.

use std::fmt;

use crate::error::AppError;

/// Client → Server command
///
/// Constructed per received line and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `JOIN:<username>`
    Join(String),
    /// `MSG:<text>`, body may be empty
    Message(String),
    /// `P_MSG:<recipient>:<text>`, either part may be empty
    PrivateMessage { recipient: String, body: String },
    /// `QUIT`
    Quit,
    /// Any other command word
    Unknown(String),
}

impl Command {
    /// Parse one (already trimmed) line
    ///
    /// The command word is everything before the first `:`.
    pub fn parse(line: &str) -> Self {
        let (word, payload) = match line.split_once(':') {
            Some((word, payload)) => (word, Some(payload)),
            None => (line, None),
        };

        match (word, payload) {
            ("JOIN", Some(name)) => Command::Join(name.to_string()),
            ("MSG", body) => Command::Message(body.unwrap_or_default().to_string()),
            ("P_MSG", rest) => {
                let rest = rest.unwrap_or_default();
                let (recipient, body) = rest.split_once(':').unwrap_or((rest, ""));
                Command::PrivateMessage {
                    recipient: recipient.to_string(),
                    body: body.to_string(),
                }
            }
            ("QUIT", None) => Command::Quit,
            _ => Command::Unknown(word.to_string()),
        }
    }

    /// Extract the username from a handshake line
    ///
    /// Anything other than `JOIN:<non-empty name>` is malformed.
    pub fn parse_join(line: &str) -> Result<String, AppError> {
        match Self::parse(line) {
            Command::Join(name) if !name.is_empty() => Ok(name),
            _ => Err(AppError::MalformedCommand(
                "first command must be JOIN:<username>".to_string(),
            )),
        }
    }
}

/// Server → Client message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Join acknowledged
    Welcome { username: String },
    /// Rejected join or malformed command
    Error { reason: String },
    /// Another session joined
    Joined { username: String },
    /// A session left
    Left { username: String },
    /// Broadcast chat line
    Chat { from: String, content: String },
    /// Private message; `payload` is already cipher-encoded
    Private { from: String, payload: String },
}

impl ServerMessage {
    pub fn error(reason: impl Into<String>) -> Self {
        ServerMessage::Error {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Welcome { username } => {
                write!(f, "Welcome to the chat, {}!", username)
            }
            ServerMessage::Error { reason } => write!(f, "ERROR: {}", reason),
            ServerMessage::Joined { username } => write!(f, "SERVER: {} joined", username),
            ServerMessage::Left { username } => write!(f, "SERVER: {} left", username),
            ServerMessage::Chat { from, content } => write!(f, "{}: {}", from, content),
            ServerMessage::Private { from, payload } => {
                write!(f, "[private from {}]:{}", from, payload)
            }
        }
    }
}

/// Convert AppError to ServerMessage for client notification
impl From<AppError> for ServerMessage {
    fn from(err: AppError) -> Self {
        let reason = match err {
            AppError::NameTaken(name) => format!("username '{}' is already taken", name),
            AppError::RecipientNotFound(name) => format!("user '{}' not found", name),
            AppError::DeliveryTimeout(name) => format!("delivery to '{}' timed out", name),
            AppError::MalformedCommand(reason) => reason,
            // Fatal errors are not typically converted (connection closes)
            _ => "internal error".to_string(),
        };
        ServerMessage::Error { reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join() {
        assert_eq!(Command::parse("JOIN:alice"), Command::Join("alice".to_string()));
        assert_eq!(Command::parse("JOIN:"), Command::Join(String::new()));
        assert_eq!(Command::parse("JOIN"), Command::Unknown("JOIN".to_string()));
    }

    #[test]
    fn test_parse_message_keeps_colons_in_body() {
        assert_eq!(
            Command::parse("MSG:time is 10:30"),
            Command::Message("time is 10:30".to_string())
        );
        assert_eq!(Command::parse("MSG:"), Command::Message(String::new()));
        assert_eq!(Command::parse("MSG"), Command::Message(String::new()));
    }

    #[test]
    fn test_parse_private_message() {
        assert_eq!(
            Command::parse("P_MSG:bob:see you at 5:00"),
            Command::PrivateMessage {
                recipient: "bob".to_string(),
                body: "see you at 5:00".to_string(),
            }
        );
        assert_eq!(
            Command::parse("P_MSG:bob"),
            Command::PrivateMessage {
                recipient: "bob".to_string(),
                body: String::new(),
            }
        );
        assert_eq!(
            Command::parse("P_MSG"),
            Command::PrivateMessage {
                recipient: String::new(),
                body: String::new(),
            }
        );
    }

    #[test]
    fn test_parse_quit_and_unknown() {
        assert_eq!(Command::parse("QUIT"), Command::Quit);
        assert_eq!(Command::parse("QUIT:now"), Command::Unknown("QUIT".to_string()));
        assert_eq!(Command::parse("quit"), Command::Unknown("quit".to_string()));
        assert_eq!(Command::parse("HELLO:x"), Command::Unknown("HELLO".to_string()));
    }

    #[test]
    fn test_parse_join_rejects_everything_else() {
        assert_eq!(Command::parse_join("JOIN:bob").unwrap(), "bob");
        for line in ["", "JOIN:", "MSG:hi", "QUIT", "join:bob"] {
            assert!(matches!(
                Command::parse_join(line),
                Err(AppError::MalformedCommand(_))
            ));
        }
    }

    #[test]
    fn test_server_message_lines() {
        let chat = ServerMessage::Chat {
            from: "alice".to_string(),
            content: "hi".to_string(),
        };
        assert_eq!(chat.to_string(), "alice: hi");

        let private = ServerMessage::Private {
            from: "alice".to_string(),
            payload: "vhfuhw".to_string(),
        };
        assert_eq!(private.to_string(), "[private from alice]:vhfuhw");

        let left = ServerMessage::Left {
            username: "alice".to_string(),
        };
        assert_eq!(left.to_string(), "SERVER: alice left");
    }

    #[test]
    fn test_error_conversion() {
        let msg: ServerMessage = AppError::NameTaken("alice".to_string()).into();
        assert_eq!(msg.to_string(), "ERROR: username 'alice' is already taken");

        let msg: ServerMessage = AppError::RecipientNotFound("carol".to_string()).into();
        assert_eq!(msg.to_string(), "ERROR: user 'carol' not found");

        let msg: ServerMessage = AppError::DeliveryTimeout("slow".to_string()).into();
        assert_eq!(msg.to_string(), "ERROR: delivery to 'slow' timed out");

        let msg: ServerMessage = AppError::Config("bad".to_string()).into();
        assert_eq!(msg.to_string(), "ERROR: internal error");
    }
}
