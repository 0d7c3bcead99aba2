//! Runtime configuration
//!
//! Read from `CHAT_RELAY_*` environment variables; the listen address can
//! also be given as the first command line argument.

use std::env;

use crate::error::ConfigError;
use crate::history::MAX_HISTORY_SIZE;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Default per-subscriber backlog of the broadcast channel
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address the WebSocket listener binds to
    pub addr: String,
    /// Messages kept in recent history
    pub history_capacity: usize,
    /// Broadcast frames buffered per session before it starts lagging
    pub broadcast_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            history_capacity: MAX_HISTORY_SIZE,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl Config {
    /// Load from the process environment and arguments
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok(), env::args().nth(1))
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        addr_arg: Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            addr: addr_arg
                .or_else(|| lookup("CHAT_RELAY_ADDR"))
                .unwrap_or(defaults.addr),
            history_capacity: positive(
                "CHAT_RELAY_HISTORY_CAPACITY",
                lookup("CHAT_RELAY_HISTORY_CAPACITY"),
                defaults.history_capacity,
            )?,
            broadcast_capacity: positive(
                "CHAT_RELAY_BROADCAST_CAPACITY",
                lookup("CHAT_RELAY_BROADCAST_CAPACITY"),
                defaults.broadcast_capacity,
            )?,
        })
    }
}

fn positive(
    name: &'static str,
    value: Option<String>,
    default: usize,
) -> Result<usize, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)], arg: Option<&str>) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned(), arg.map(str::to_string))
    }

    #[test]
    fn test_defaults() {
        assert_eq!(load(&[], None).unwrap(), Config::default());
        assert_eq!(Config::default().history_capacity, 100);
    }

    #[test]
    fn test_env_overrides() {
        let config = load(
            &[
                ("CHAT_RELAY_ADDR", "0.0.0.0:9000"),
                ("CHAT_RELAY_HISTORY_CAPACITY", "20"),
                ("CHAT_RELAY_BROADCAST_CAPACITY", "8"),
            ],
            None,
        )
        .unwrap();
        assert_eq!(config.addr, "0.0.0.0:9000");
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.broadcast_capacity, 8);
    }

    #[test]
    fn test_argument_wins_over_env() {
        let config = load(&[("CHAT_RELAY_ADDR", "0.0.0.0:9000")], Some("127.0.0.1:1234")).unwrap();
        assert_eq!(config.addr, "127.0.0.1:1234");
    }

    #[test]
    fn test_invalid_capacity() {
        let err = load(&[("CHAT_RELAY_HISTORY_CAPACITY", "0")], None).unwrap_err();
        assert!(err.to_string().contains("CHAT_RELAY_HISTORY_CAPACITY"));
        assert!(load(&[("CHAT_RELAY_BROADCAST_CAPACITY", "lots")], None).is_err());
    }
}
