//! Runtime configuration
//!
//! Settings come from the command line and `CHAT_*` environment variables,
//! falling back to defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cipher::DEFAULT_KEY;
use crate::error::AppError;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Default maximum accepted line length in bytes
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;

/// Default per-connection outbox capacity
pub const DEFAULT_OUTBOX_CAPACITY: usize = 32;

/// Default time a peer gets to make room in its outbox or drain its socket
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address the listener binds to
    pub bind_addr: String,
    /// Shift applied to private message payloads
    pub cipher_key: u32,
    /// Lines longer than this terminate the connection
    pub max_line_length: usize,
    /// Messages buffered per connection before senders have to wait
    pub outbox_capacity: usize,
    /// Longest wait on a stalled peer, for delivery and for the final drain
    pub write_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            cipher_key: DEFAULT_KEY,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl Config {
    /// Build configuration from process arguments and environment
    ///
    /// The first CLI argument wins over `CHAT_ADDR` for the bind address.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(env::args().nth(1), |key| env::var(key).ok())
    }

    /// Build configuration from an explicit address argument and variable lookup
    pub fn from_lookup<F>(addr_arg: Option<String>, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = addr_arg
            .or_else(|| lookup("CHAT_ADDR"))
            .unwrap_or(defaults.bind_addr);

        let config = Self {
            bind_addr,
            cipher_key: parse_var(&lookup, "CHAT_CIPHER_KEY")?.unwrap_or(defaults.cipher_key),
            max_line_length: parse_var(&lookup, "CHAT_MAX_LINE")?
                .unwrap_or(defaults.max_line_length),
            outbox_capacity: parse_var(&lookup, "CHAT_OUTBOX")?
                .unwrap_or(defaults.outbox_capacity),
            write_timeout: parse_var(&lookup, "CHAT_WRITE_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.write_timeout),
        };

        if config.max_line_length == 0 {
            return Err(AppError::Config("CHAT_MAX_LINE must be positive".to_string()));
        }
        // mpsc::channel panics on a zero capacity
        if config.outbox_capacity == 0 {
            return Err(AppError::Config("CHAT_OUTBOX must be positive".to_string()));
        }

        if config.write_timeout.is_zero() {
            return Err(AppError::Config(
                "CHAT_WRITE_TIMEOUT_MS must be positive".to_string(),
            ));
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{} has invalid value '{}'", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_lookup(None, lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.cipher_key, 3);
    }

    #[test]
    fn test_argument_overrides_env_addr() {
        let lookup = lookup_from(&[("CHAT_ADDR", "0.0.0.0:9000")]);
        let config = Config::from_lookup(Some("127.0.0.1:7000".to_string()), lookup).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:7000");

        let lookup = lookup_from(&[("CHAT_ADDR", "0.0.0.0:9000")]);
        let config = Config::from_lookup(None, lookup).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
    }

    #[test]
    fn test_numeric_overrides() {
        let lookup = lookup_from(&[
            ("CHAT_CIPHER_KEY", "7"),
            ("CHAT_MAX_LINE", "128"),
            ("CHAT_OUTBOX", " 4 "),
            ("CHAT_WRITE_TIMEOUT_MS", "250"),
        ]);
        let config = Config::from_lookup(None, lookup).unwrap();
        assert_eq!(config.cipher_key, 7);
        assert_eq!(config.max_line_length, 128);
        assert_eq!(config.outbox_capacity, 4);
        assert_eq!(config.write_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let lookup = lookup_from(&[("CHAT_CIPHER_KEY", "three")]);
        let err = Config::from_lookup(None, lookup).unwrap_err();
        assert!(matches!(err, AppError::Config(ref msg) if msg.contains("CHAT_CIPHER_KEY")));
    }

    #[test]
    fn test_zero_write_timeout_rejected() {
        let lookup = lookup_from(&[("CHAT_WRITE_TIMEOUT_MS", "0")]);
        assert!(matches!(
            Config::from_lookup(None, lookup),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_zero_outbox_rejected() {
        let lookup = lookup_from(&[("CHAT_OUTBOX", "0")]);
        assert!(matches!(
            Config::from_lookup(None, lookup),
            Err(AppError::Config(_))
        ));
    }
}
