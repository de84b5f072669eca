//! Client configuration.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration.

use std::fmt;
use std::time::Duration;

use trivia_session::SessionConfig;

/// Endpoint used when neither a flag nor `TRIVIA_ENDPOINT` names one.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8080";

/// Complete client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// WebSocket URL of the game server.
    pub endpoint: String,
    /// Shared key sent in `HELO`.
    credential: String,
    /// How long to wait for the server's reply to `HELO`.
    pub handshake_timeout: Duration,
    /// How long to wait for each response; `None` waits indefinitely.
    pub response_timeout: Option<Duration>,
}

/// Values from the command line that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub key: Option<String>,
}

impl ClientConfig {
    /// Builds a configuration directly, validating it.
    pub fn new(
        endpoint: impl Into<String>,
        credential: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            endpoint: endpoint.into(),
            credential: credential.into(),
            handshake_timeout: SessionConfig::default().handshake_timeout,
            response_timeout: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the process environment.
    ///
    /// | Variable                       | Default               |
    /// |--------------------------------|-----------------------|
    /// | `TRIVIA_ENDPOINT`              | `ws://localhost:8080` |
    /// | `TRIVIA_KEY`                   | required              |
    /// | `TRIVIA_HANDSHAKE_TIMEOUT_SECS`| 3                     |
    /// | `TRIVIA_RESPONSE_TIMEOUT_SECS` | unset (no limit)      |
    ///
    /// # Errors
    ///
    /// Returns error if the key is missing or any value is invalid.
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    pub fn from_lookup<F>(overrides: Overrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = overrides
            .endpoint
            .or_else(|| lookup("TRIVIA_ENDPOINT"))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let credential = overrides.key.or_else(|| lookup("TRIVIA_KEY")).ok_or_else(|| {
            ConfigError::MissingRequired {
                var: "TRIVIA_KEY".to_string(),
                hint: "Set it to the server's shared key, or pass --key".to_string(),
            }
        })?;

        let handshake_timeout = parse_secs(&lookup, "TRIVIA_HANDSHAKE_TIMEOUT_SECS")?
            .unwrap_or(SessionConfig::default().handshake_timeout);
        let response_timeout = parse_secs(&lookup, "TRIVIA_RESPONSE_TIMEOUT_SECS")?;

        let config = Self {
            endpoint,
            credential,
            handshake_timeout,
            response_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.endpoint.starts_with("ws://") || self.endpoint.starts_with("wss://")) {
            return Err(ConfigError::Invalid {
                var: "TRIVIA_ENDPOINT".to_string(),
                reason: format!("Must be a ws:// or wss:// URL, got {:?}", self.endpoint),
            });
        }

        if self.credential.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "TRIVIA_KEY".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        Ok(())
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// The session timeouts this configuration asks for.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            handshake_timeout: self.handshake_timeout,
            response_timeout: self.response_timeout,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("credential", &"<redacted>")
            .field("handshake_timeout", &self.handshake_timeout)
            .field("response_timeout", &self.response_timeout)
            .finish()
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Reads a whole number of seconds. Unset is `None`; zero or garbage is an
/// error.
fn parse_secs<F>(lookup: &F, var: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            var: var.to_string(),
            reason: "Must be greater than 0".to_string(),
        }),
        Ok(secs) => Ok(Some(Duration::from_secs(secs))),
        Err(e) => Err(ConfigError::Invalid {
            var: var.to_string(),
            reason: format!("{raw:?} is not a number of seconds: {e}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config =
            ClientConfig::from_lookup(Overrides::default(), vars(&[("TRIVIA_KEY", "k")]))
                .unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.credential(), "k");
        assert_eq!(config.handshake_timeout, Duration::from_secs(3));
        assert_eq!(config.response_timeout, None);
    }

    #[test]
    fn test_from_lookup_missing_key_is_required() {
        let err = ClientConfig::from_lookup(Overrides::default(), vars(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref var, .. } if var == "TRIVIA_KEY"));
        assert!(err.to_string().contains("--key"));
    }

    #[test]
    fn test_from_lookup_overrides_win() {
        let overrides = Overrides {
            endpoint: Some("wss://trivia.example:443/ws".to_string()),
            key: Some("from-flag".to_string()),
        };
        let config = ClientConfig::from_lookup(
            overrides,
            vars(&[
                ("TRIVIA_ENDPOINT", "ws://env:1"),
                ("TRIVIA_KEY", "from-env"),
            ]),
        )
        .unwrap();
        assert_eq!(config.endpoint, "wss://trivia.example:443/ws");
        assert_eq!(config.credential(), "from-flag");
    }

    #[test]
    fn test_from_lookup_rejects_http_scheme() {
        let err = ClientConfig::from_lookup(
            Overrides::default(),
            vars(&[("TRIVIA_KEY", "k"), ("TRIVIA_ENDPOINT", "http://localhost:8080")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "TRIVIA_ENDPOINT"));
    }

    #[test]
    fn test_from_lookup_timeouts() {
        let config = ClientConfig::from_lookup(
            Overrides::default(),
            vars(&[
                ("TRIVIA_KEY", "k"),
                ("TRIVIA_HANDSHAKE_TIMEOUT_SECS", "10"),
                ("TRIVIA_RESPONSE_TIMEOUT_SECS", "30"),
            ]),
        )
        .unwrap();
        let session = config.session_config();
        assert_eq!(session.handshake_timeout, Duration::from_secs(10));
        assert_eq!(session.response_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_from_lookup_zero_or_garbage_timeout_is_invalid() {
        for value in ["0", "soon"] {
            let err = ClientConfig::from_lookup(
                Overrides::default(),
                vars(&[("TRIVIA_KEY", "k"), ("TRIVIA_RESPONSE_TIMEOUT_SECS", value)]),
            )
            .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "value {value}");
        }
    }

    #[test]
    fn test_blank_key_is_invalid() {
        let err = ClientConfig::new(DEFAULT_ENDPOINT, "   ").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "TRIVIA_KEY"));
    }

    #[test]
    fn test_debug_redacts_credential() {
        let config = ClientConfig::new(DEFAULT_ENDPOINT, "hunter2").unwrap();
        let shown = format!("{config:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("ws://localhost:8080"));
    }
}
