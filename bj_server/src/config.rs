//! Server configuration management.
//!
//! Consolidates the CLI-flag and environment-variable reads and
//! validates the result before anything binds a socket.

use std::{net::SocketAddr, time::Duration};

use blackjack::{DiscoveryConfig, ServerConfig, codec::NAME_LEN};

/// CLI overrides; anything unset falls back to the environment, then to
/// the defaults.
#[derive(Debug, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub name: Option<String>,
    pub discovery_port: Option<u16>,
    pub broadcast_interval_ms: Option<u64>,
    pub no_discovery: bool,
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Build the server configuration from overrides and the environment.
///
/// # Errors
///
/// Returns an error when a value is present but unusable.
pub fn load(overrides: Overrides) -> Result<ServerConfig, ConfigError> {
    let bind = match overrides.bind {
        Some(bind) => bind,
        None => parse_env_or("SERVER_BIND", SocketAddr::from(([0, 0, 0, 0], 0)))?,
    };

    let name = overrides
        .name
        .or_else(|| std::env::var("SERVER_NAME").ok())
        .unwrap_or_else(|| "Dealer".to_string());

    let discovery = if overrides.no_discovery {
        None
    } else {
        let port = match overrides.discovery_port {
            Some(port) => port,
            None => parse_env_or(
                "DISCOVERY_PORT",
                blackjack::net::discovery::DEFAULT_DISCOVERY_PORT,
            )?,
        };
        let interval_ms = match overrides.broadcast_interval_ms {
            Some(ms) => ms,
            None => parse_env_or("BROADCAST_INTERVAL_MS", 1000u64)?,
        };
        Some(DiscoveryConfig {
            port,
            interval: Duration::from_millis(interval_ms),
        })
    };

    let config = ServerConfig {
        bind,
        name,
        discovery,
    };
    validate(&config)?;
    Ok(config)
}

/// Reject configurations the wire or the broadcaster cannot carry.
pub fn validate(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Invalid {
            var: "SERVER_NAME".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    if config.name.len() > NAME_LEN {
        return Err(ConfigError::Invalid {
            var: "SERVER_NAME".to_string(),
            reason: format!("must fit in {NAME_LEN} bytes"),
        });
    }
    if let Some(discovery) = &config.discovery {
        if discovery.port == 0 {
            return Err(ConfigError::Invalid {
                var: "DISCOVERY_PORT".to_string(),
                reason: "must be nonzero".to_string(),
            });
        }
        if discovery.interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "BROADCAST_INTERVAL_MS".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
    }
    Ok(())
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("could not parse '{value}'"),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            name: "Dealer".to_string(),
            discovery: Some(DiscoveryConfig::default()),
        }
    }

    #[test]
    fn test_validation_accepts_the_defaults() {
        assert!(validate(&base()).is_ok());
    }

    #[test]
    fn test_validation_rejects_unusable_names() {
        let mut config = base();
        config.name = String::new();
        assert!(validate(&config).is_err());

        config.name = "x".repeat(NAME_LEN + 1);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validation_rejects_zero_interval() {
        let mut config = base();
        config.discovery = Some(DiscoveryConfig {
            port: 13122,
            interval: Duration::ZERO,
        });
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_no_discovery_is_fine() {
        let mut config = base();
        config.discovery = None;
        assert!(validate(&config).is_ok());
    }
}
