//! Client configuration.

use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::address::DEFAULT_SANDBOX;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Playground client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaygroundConfig {
    /// Sandbox used when the page path does not name one.
    #[serde(default = "default_sandbox")]
    pub default_sandbox: String,

    /// Path of the backend socket endpoint, rooted at `/`.
    #[serde(default = "default_socket_path")]
    pub socket_path: String,

    /// Maximum transcript size in bytes; unbounded when unset.
    #[serde(default)]
    pub transcript_limit: Option<usize>,

    /// Reconnection attempts after the connection drops (0 disables reconnection).
    #[serde(default)]
    pub reconnect_attempts: u32,

    /// Initial reconnection delay in milliseconds
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Maximum reconnection delay in milliseconds
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
}

fn default_sandbox() -> String {
    DEFAULT_SANDBOX.to_string()
}

fn default_socket_path() -> String {
    "/socket".to_string()
}

const fn default_reconnect_delay_ms() -> u64 {
    1000
}

const fn default_reconnect_max_delay_ms() -> u64 {
    30_000
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            default_sandbox: default_sandbox(),
            socket_path: default_socket_path(),
            transcript_limit: None,
            reconnect_attempts: 0,
            reconnect_delay_ms: default_reconnect_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
        }
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    let parsed = value.trim().parse();
    parsed.map_err(|_| ConfigError::Invalid { key, value })
}

impl PlaygroundConfig {
    /// Load configuration from `PLAYGROUND_*` environment variables.
    ///
    /// # Errors
    /// Returns error if a numeric variable does not parse.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns error if a numeric variable does not parse.
    pub fn load_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("PLAYGROUND_DEFAULT_SANDBOX") {
            if !val.is_empty() {
                config.default_sandbox = val;
            }
        }
        if let Some(val) = lookup("PLAYGROUND_SOCKET_PATH") {
            config.socket_path = if val.starts_with('/') { val } else { format!("/{val}") };
        }
        if let Some(val) = lookup("PLAYGROUND_TRANSCRIPT_LIMIT") {
            config.transcript_limit = Some(parse("PLAYGROUND_TRANSCRIPT_LIMIT", val)?);
        }
        if let Some(val) = lookup("PLAYGROUND_RECONNECT_ATTEMPTS") {
            config.reconnect_attempts = parse("PLAYGROUND_RECONNECT_ATTEMPTS", val)?;
        }
        if let Some(val) = lookup("PLAYGROUND_RECONNECT_DELAY_MS") {
            config.reconnect_delay_ms = parse("PLAYGROUND_RECONNECT_DELAY_MS", val)?;
        }
        if let Some(val) = lookup("PLAYGROUND_RECONNECT_MAX_DELAY_MS") {
            config.reconnect_max_delay_ms = parse("PLAYGROUND_RECONNECT_MAX_DELAY_MS", val)?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PlaygroundConfig::load_from(lookup(&[])).unwrap();
        assert_eq!(config, PlaygroundConfig::default());
        assert_eq!(config.default_sandbox, "ocaml");
        assert_eq!(config.socket_path, "/socket");
        assert_eq!(config.transcript_limit, None);
        assert_eq!(config.reconnect_attempts, 0);
    }

    #[test]
    fn test_overrides() {
        let config = PlaygroundConfig::load_from(lookup(&[
            ("PLAYGROUND_DEFAULT_SANDBOX", "reason"),
            ("PLAYGROUND_TRANSCRIPT_LIMIT", "65536"),
            ("PLAYGROUND_RECONNECT_ATTEMPTS", " 5 "),
            ("PLAYGROUND_RECONNECT_DELAY_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.default_sandbox, "reason");
        assert_eq!(config.transcript_limit, Some(65536));
        assert_eq!(config.reconnect_attempts, 5);
        assert_eq!(config.reconnect_delay_ms, 250);
        assert_eq!(config.reconnect_max_delay_ms, 30_000);
    }

    #[test]
    fn test_socket_path_is_rooted() {
        let config = PlaygroundConfig::load_from(lookup(&[("PLAYGROUND_SOCKET_PATH", "ws/play")]))
            .unwrap();
        assert_eq!(config.socket_path, "/ws/play");

        let config = PlaygroundConfig::load_from(lookup(&[("PLAYGROUND_SOCKET_PATH", "/ws")]))
            .unwrap();
        assert_eq!(config.socket_path, "/ws");
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = PlaygroundConfig::load_from(lookup(&[("PLAYGROUND_RECONNECT_ATTEMPTS", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("PLAYGROUND_RECONNECT_ATTEMPTS"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: PlaygroundConfig =
            serde_json::from_str(r#"{"default_sandbox":"h-hello"}"#).unwrap();
        assert_eq!(config.default_sandbox, "h-hello");
        assert_eq!(config.socket_path, "/socket");
    }
}
