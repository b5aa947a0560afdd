//! Console client helpers
//!
//! The cipher is applied here, at the display boundary: outgoing `MSG`
//! bodies are encoded before sending and received chat payloads are
//! decoded before printing. Private bodies are encoded by the server.

use crate::cipher::ShiftCipher;

pub const USAGE: &str = "Use MSG:<message>, P_MSG:<recipient>:<message> or QUIT.";

/// What to do with one line typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// Send this line to the server
    Send(String),
    /// Send `QUIT` and exit
    Quit,
    /// Print the usage hint
    Usage,
    /// Blank input
    Ignore,
}

/// Validate the handshake line typed by the user
pub fn join_line(input: &str) -> Option<String> {
    let input = input.trim();
    match input.strip_prefix("JOIN:") {
        Some(name) if !name.trim().is_empty() => Some(input.to_string()),
        _ => None,
    }
}

/// Translate a typed line into a wire line
pub fn prepare_outgoing(input: &str, cipher: &ShiftCipher) -> Outgoing {
    let input = input.trim();
    if input.is_empty() {
        return Outgoing::Ignore;
    }
    if input.eq_ignore_ascii_case("QUIT") {
        return Outgoing::Quit;
    }

    if let Some(body) = input.strip_prefix("MSG:") {
        return Outgoing::Send(format!("MSG:{}", cipher.encode(body)));
    }

    if let Some(rest) = input.strip_prefix("P_MSG:") {
        return match rest.split_once(':') {
            Some((recipient, body)) if !recipient.is_empty() && !body.is_empty() => {
                Outgoing::Send(input.to_string())
            }
            _ => Outgoing::Usage,
        };
    }

    Outgoing::Usage
}

/// Turn a server line into display text
pub fn render_incoming(line: &str, cipher: &ShiftCipher) -> String {
    if line.starts_with("[private from") {
        if let Some(idx) = line.find("]:") {
            let (prefix, payload) = line.split_at(idx + 2);
            return format!("{}{}", prefix, cipher.decode(payload));
        }
        return line.to_string();
    }

    if line.starts_with("SERVER:") || line.starts_with("ERROR:") {
        return line.to_string();
    }

    match line.split_once(": ") {
        Some((sender, text)) => format!("{}: {}", sender, cipher.decode(text)),
        None => line.to_string(),
    }
}
